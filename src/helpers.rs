use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::Error;
use crate::types::{DerivedKey, Secret};
use crate::MAC_LEN;


/// If the condition is not met, return the given error. Borrowed from the `anyhow` crate.
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err);
        }
    };
}

pub(crate) use ensure; // make available throughout crate


type HmacSha256 = Hmac<Sha256>;


/// HMAC-SHA-256 over a multi-part message. The single signature has
/// sufficient flexibility for both the key derivation (one part) and the
/// token MAC (three parts) while avoiding a prior concatenation.
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; MAC_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key size");
    parts.iter().for_each(|p| mac.update(p));
    mac.finalize().into_bytes().into()
}


/// The per-token key is keyed by the secret over the salt digits exactly as
/// they appear on the wire, so an odd-but-parseable spelling still verifies.
pub(crate) fn derive_key(salt_ascii: &str, secret: &Secret) -> DerivedKey {
    DerivedKey(hmac_sha256(secret.as_bytes(), &[salt_ascii.as_bytes()]))
}


/// URL-safe unpadded base64, the wire form of every binary field.
pub(crate) fn b64_encode(bytes: &[u8]) -> String { URL_SAFE_NO_PAD.encode(bytes) }


/// The ciphertext field is only ever decoded after its MAC has been
/// verified, so a decoding failure here is fatal rather than silent.
pub(crate) fn b64_decode(text: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|_| Error::Decrypt("ciphertext field is not valid base64"))
}


/// Constant-time equality over encoded MAC fields. A length mismatch is an
/// ordinary mismatch; the comparison never exits early on content.
pub(crate) fn ct_eq(a: &[u8], b: &[u8]) -> bool { a.ct_eq(b).into() }


/// Wall-clock seconds since the Unix epoch; a pre-epoch clock reads as zero.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}
