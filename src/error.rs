use std::io;

use thiserror::Error as ThisError;

/// Failures that indicate a bug or a deployment problem rather than hostile
/// input. Hostile or merely malformed tokens never surface here; they come
/// back from [`crate::SessionBox::decode`] as `Ok(None)` with no hint of
/// which check turned them away.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A secret was constructed from an empty string.
    #[error("secret must not be empty")]
    EmptySecret,

    /// The OS entropy source could not be read while seeding the box
    /// generator.
    #[error("entropy source unavailable: {0}")]
    Entropy(rand_core::Error),

    /// The data contains a tagged value. Tags can smuggle reconstruction
    /// semantics, so the codec refuses to carry them in either direction.
    #[error("tagged values cannot be sealed or reconstructed")]
    TaggedValue,

    /// Serializing or compressing the session data failed.
    #[error("failed to serialize session data: {0}")]
    Freeze(ciborium::ser::Error<io::Error>),

    /// An authenticated ciphertext failed to decode or decrypt. A valid MAC
    /// means the payload came from a holder of the secret, so this is
    /// corruption, not an attack.
    #[error("failed to decrypt an authenticated payload: {0}")]
    Decrypt(&'static str),

    /// An authenticated payload failed to decompress or deserialize.
    #[error("failed to deserialize an authenticated payload: {0}")]
    Thaw(ciborium::de::Error<io::Error>),
}
