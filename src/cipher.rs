use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;

use crate::error::Error;
use crate::helpers::ensure;
use crate::types::DerivedKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes, which is also the length of the prepended IV.
pub(crate) const BLOCK_LEN: usize = 16;


/// CBC encryption with PKCS#7 padding; the IV rides in front of the
/// ciphertext so the envelope is self-contained.
pub(crate) fn seal(key: &DerivedKey, iv: &[u8; BLOCK_LEN], plaintext: &[u8]) -> Vec<u8> {
    let body =
        Aes256CbcEnc::new(&key.0.into(), &(*iv).into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mut envelope = Vec::with_capacity(BLOCK_LEN + body.len());
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(&body);
    envelope
}


/// Splits and decrypts an `IV ‖ ciphertext` envelope. Runs only after the MAC
/// has authenticated the field, so every failure here is fatal.
pub(crate) fn open(key: &DerivedKey, envelope: &[u8]) -> Result<Vec<u8>, Error> {
    ensure!(
        envelope.len() >= 2 * BLOCK_LEN,
        Error::Decrypt("envelope shorter than an IV plus one block")
    );
    let (iv, body) = envelope.split_at(BLOCK_LEN);
    ensure!(body.len() % BLOCK_LEN == 0, Error::Decrypt("ciphertext is not block-aligned"));
    Aes256CbcDec::new_from_slices(&key.0, iv)
        .map_err(|_| Error::Decrypt("bad key or IV length"))?
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| Error::Decrypt("bad padding"))
}
