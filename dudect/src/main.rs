use dudect_bencher::{ctbench_main, BenchRng, Class, CtRunner};
use rand_core::{CryptoRng, RngCore};
use sessionbox::{SessionBox, Value};


// Simplistic RNG to regurgitate incremented values when 'asked'
struct TestRng {
    value: u32,
}

impl RngCore for TestRng {
    fn next_u32(&mut self) -> u32 {
        self.value = self.value.wrapping_add(1);
        self.value
    }

    fn next_u64(&mut self) -> u64 { unimplemented!() }

    fn fill_bytes(&mut self, out: &mut [u8]) {
        out.iter_mut().for_each(|b| *b = 0);
        out[0..4].copy_from_slice(&self.value.to_be_bytes());
        self.value = self.value.wrapping_add(1);
    }

    fn try_fill_bytes(&mut self, out: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(out);
        Ok(())
    }
}

impl CryptoRng for TestRng {}


fn fixed_clock() -> u64 { 1_700_000_000 }

fn with_flipped_mac_char(token: &str, index: usize) -> String {
    let (body, mac) = token.rsplit_once('~').expect("token has a MAC field");
    let mut mac: Vec<u8> = mac.bytes().collect();
    mac[index] = if mac[index] == b'A' { b'B' } else { b'A' };
    format!("{body}~{}", String::from_utf8(mac).expect("MAC stays ASCII"))
}


// Left decodes a token whose forged MAC is wrong in its first character,
// Right one wrong in its last. A comparison that exits at the first
// differing byte would separate the two timing distributions.
fn mac_rejection(runner: &mut CtRunner, mut _rng: &mut BenchRng) {
    const ITERATIONS_INNER: usize = 5;
    const ITERATIONS_OUTER: usize = 200_000;

    let mut rng = TestRng { value: 111 };
    let sbox = SessionBox::new("serenade viscount secretary frail")
        .expect("secret is not empty")
        .with_clock(fixed_clock);
    let data = Value::Map(vec![(Value::Text("user".into()), Value::Text("alice".into()))]);
    let token = sbox
        .encode_with_rng(&mut rng, Some(&data), Some(1_700_003_600))
        .expect("sealing plain data succeeds");

    let wrong_at_front = with_flipped_mac_char(&token, 0);
    let wrong_at_back = with_flipped_mac_char(&token, 42);

    let mut classes = [Class::Right; ITERATIONS_OUTER];
    let mut token_refs = [&wrong_at_back; ITERATIONS_OUTER];

    // Interleave left and right
    for i in (0..ITERATIONS_OUTER).step_by(2) {
        classes[i] = Class::Left;
        token_refs[i] = &wrong_at_front;
    }

    for (class, &token_ref) in classes.into_iter().zip(token_refs.iter()) {
        runner.run_one(class, || {
            for _ in 0..ITERATIONS_INNER {
                assert!(sbox.decode(token_ref).expect("rejection is silent").is_none());
            }
        })
    }
}

ctbench_main!(mac_rejection);
