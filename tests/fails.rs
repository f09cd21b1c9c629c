use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use sessionbox::{SessionBox, Value};

const SECRET: &str = "serenade viscount secretary frail";

fn sealed_sample(seed: u64, expires: Option<u64>) -> (SessionBox, String) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    let data = Value::Map(vec![
        (Value::Text("foo".into()), Value::Text("bar".into())),
        (Value::Text("baz".into()), Value::Text("bam".into())),
    ]);
    let sbox = SessionBox::new(SECRET).unwrap();
    let token = sbox.encode_with_rng(&mut rng, Some(&data), expires).unwrap();
    (sbox, token)
}


// Whatever a non-token looks like, decoding it is quiet: no panic, no error,
// just nothing.
#[test]
fn garbage_is_silently_nothing() {
    let sbox = SessionBox::new(SECRET).unwrap();
    for input in [
        "",
        "x",
        "not a token",
        "~",
        "~~",
        "~~~",
        "~~~~",
        "1~2~3",
        "1~2~3~", // empty MAC
        "1~2~~4", // empty ciphertext
        "~2~3~4", // empty salt
        "abc~2~3~4",
        "-1~2~3~4",
        "1e3~2~3~4",
        "18446744073709551616~2~3~4",
        "1~xyz~3~4",
        "1~-5~3~4",
        "salt~exp~ct~mac",
        "🦀~🦀~🦀~🦀",
        "1~2~3~4~5~6~7~8",
    ] {
        assert_eq!(sbox.decode(input).unwrap(), None, "accepted {input:?}");
    }
}


#[test]
fn random_strings_are_silently_nothing() {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(321);
    let sbox = SessionBox::new(SECRET).unwrap();
    for _i in 0..1000 {
        let len = rng.gen_range(0..200);
        let input = Alphanumeric.sample_string(&mut rng, len);
        assert_eq!(sbox.decode(&input).unwrap(), None);
    }
}


// Flipping any single character of a valid token — any field, separators
// included — must turn it away, silently.
#[test]
fn single_character_tampering_is_rejected() {
    let (sbox, token) = sealed_sample(11, Some(u64::MAX));
    assert!(sbox.decode(&token).unwrap().is_some());

    for i in 0..token.len() {
        let mut bytes = token.clone().into_bytes();
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert_eq!(sbox.decode(&tampered).unwrap(), None, "accepted flip at {i}");
    }
}


#[test]
fn every_truncation_is_rejected() {
    let (sbox, token) = sealed_sample(12, None);
    for len in 0..token.len() {
        assert_eq!(sbox.decode(&token[..len]).unwrap(), None);
    }
}


#[test]
fn trailing_junk_is_rejected() {
    let (sbox, token) = sealed_sample(13, None);
    for suffix in ["x", "~", "~more"] {
        let extended = format!("{token}{suffix}");
        assert_eq!(sbox.decode(&extended).unwrap(), None);
    }
}


// Fields from two genuine tokens cannot be recombined: the MAC is keyed
// through the salt, and it covers the expiration and ciphertext together.
#[test]
fn spliced_tokens_are_rejected() {
    let (sbox, first) = sealed_sample(14, None);
    let (_, second) = sealed_sample(15, Some(u64::MAX));

    let a: Vec<&str> = first.split('~').collect();
    let b: Vec<&str> = second.split('~').collect();

    let salt_swapped = format!("{}~{}~{}~{}", b[0], a[1], a[2], a[3]);
    assert_eq!(sbox.decode(&salt_swapped).unwrap(), None);

    let expiry_swapped = format!("{}~{}~{}~{}", a[0], b[1], a[2], a[3]);
    assert_eq!(sbox.decode(&expiry_swapped).unwrap(), None);

    let payload_swapped = format!("{}~{}~{}~{}", a[0], a[1], b[2], b[3]);
    assert_eq!(sbox.decode(&payload_swapped).unwrap(), None);

    let mac_swapped = format!("{}~{}~{}~{}", a[0], a[1], a[2], b[3]);
    assert_eq!(sbox.decode(&mac_swapped).unwrap(), None);
}


// Expiry rejections are indistinguishable from any other rejection.
#[test]
fn expired_tokens_are_silently_nothing() {
    let (sbox, token) = sealed_sample(16, Some(1));
    assert_eq!(sbox.decode(&token).unwrap(), None);
}


#[test]
fn foreign_secrets_open_nothing() {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(17);
    let (_, token) = sealed_sample(18, None);
    for _i in 0..50 {
        let guess = Alphanumeric.sample_string(&mut rng, 32);
        let intruder = SessionBox::new(&guess).unwrap();
        assert_eq!(intruder.decode(&token).unwrap(), None);
    }
}


// A forged MAC of the right shape still has to match bit-for-bit.
#[test]
fn well_formed_forgeries_are_rejected() {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(19);
    let (sbox, token) = sealed_sample(20, None);
    let body = token.rsplit_once('~').unwrap().0;

    for _i in 0..100 {
        let mut forged_mac = [0u8; 32];
        rng.fill(&mut forged_mac[..]);
        let forged = format!(
            "{body}~{}",
            base64_url(&forged_mac)
        );
        assert_eq!(sbox.decode(&forged).unwrap(), None);
    }
}

// Minimal local base64url, so the forgery test does not depend on internals.
fn base64_url(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut out = String::new();
    for chunk in bytes.chunks(3) {
        let mut buf = [0u8; 3];
        buf[..chunk.len()].copy_from_slice(chunk);
        let n = (u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]);
        let quads = [(n >> 18) & 63, (n >> 12) & 63, (n >> 6) & 63, n & 63];
        let keep = match chunk.len() {
            1 => 2,
            2 => 3,
            _ => 4,
        };
        for &q in &quads[..keep] {
            out.push(char::from(ALPHABET[q as usize]));
        }
    }
    out
}
