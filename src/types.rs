use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Error;
use crate::helpers::ensure;
use crate::KEY_LEN;

/// A long-lived master secret, held as bytes for the lifetime of the box.
/// Deliberately opaque: no `Debug`, no comparison, no way back to the text.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct Secret(Vec<u8>);

impl Secret {
    pub(crate) fn new(text: &str) -> Result<Self, Error> {
        ensure!(!text.is_empty(), Error::EmptySecret);
        Ok(Self(text.as_bytes().to_vec()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] { &self.0 }
}

/// The per-token key: one HMAC-SHA-256 output keying both the cipher and the
/// MAC. Recomputed for every encode and for every decode attempt, never
/// persisted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct DerivedKey(pub(crate) [u8; KEY_LEN]);
