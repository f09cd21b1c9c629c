#![no_main]

use libfuzzer_sys::fuzz_target;
use rand_core::{CryptoRng, RngCore};
use sessionbox::{SessionBox, Value};

// This is a 'fake' random number generator, that will regurgitate fuzz input
struct TestRng {
    data: Vec<u8>,
    index: usize,
}

impl TestRng {
    fn byte(&mut self) -> u8 {
        let b = self.data[self.index % self.data.len()];
        self.index = self.index.wrapping_add(1);
        b
    }
}

impl RngCore for TestRng {
    fn next_u32(&mut self) -> u32 {
        let mut word = [0u8; 4];
        word.iter_mut().for_each(|b| *b = self.byte());
        u32::from_be_bytes(word)
    }

    fn next_u64(&mut self) -> u64 { unimplemented!() }

    fn fill_bytes(&mut self, out: &mut [u8]) { out.iter_mut().for_each(|b| *b = self.byte()) }

    fn try_fill_bytes(&mut self, out: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(out);
        Ok(())
    }
}

impl CryptoRng for TestRng {}


fuzz_target!(|data: &[u8]| {
    let sbox = SessionBox::new("fuzz corpus secret").unwrap();

    // Arbitrary bytes -> `decode()` directly: never a panic, never an error,
    // never an acceptance
    if let Ok(input) = core::str::from_utf8(data) {
        assert!(matches!(sbox.decode(input), Ok(None)));
    }

    if data.len() < 24 {
        return;
    }
    let (head, tail) = data.split_at(24);

    // Fuzz input -> salt and IV via the rng, and into the payload itself
    let mut rng = TestRng { data: head.to_vec(), index: 0 };
    let payload = Value::Map(vec![
        (Value::Text("blob".into()), Value::Bytes(tail.to_vec())),
        (Value::Text("len".into()), Value::Integer((tail.len() as u64).into())),
    ]);
    let token = sbox.encode_with_rng(&mut rng, Some(&payload), None).unwrap();
    assert_eq!(sbox.decode(&token).unwrap(), Some(payload));

    // Corrupt one fuzz-chosen byte of the valid token; if the string actually
    // changed, the decoder must turn it away silently
    let mut corrupted = token.clone().into_bytes();
    let position = usize::from(head[0]) % corrupted.len();
    corrupted[position] ^= head[1];
    if let Ok(corrupted) = String::from_utf8(corrupted) {
        match sbox.decode(&corrupted) {
            Ok(Some(value)) => {
                assert_eq!(corrupted, token);
                assert_eq!(value, sbox.decode(&token).unwrap().unwrap());
            }
            Ok(None) => assert_ne!(corrupted, token),
            Err(e) => panic!("tampering must stay silent: {e}"),
        }
    }
});
