#![deny(clippy::pedantic, warnings, missing_docs, unsafe_code)]
// Most of the 'allow' category...
#![deny(absolute_paths_not_starting_with_crate, dead_code)]
#![deny(elided_lifetimes_in_paths, explicit_outlives_requirements, keyword_idents)]
#![deny(let_underscore_drop, macro_use_extern_crate, meta_variable_misuse, missing_abi)]
#![deny(non_ascii_idents, rust_2021_incompatible_closure_captures)]
#![deny(rust_2021_incompatible_or_patterns, rust_2021_prefixes_incompatible_syntax)]
#![deny(rust_2021_prelude_collisions, single_use_lifetimes, trivial_casts)]
#![deny(trivial_numeric_casts, unreachable_pub, unsafe_op_in_unsafe_fn, unstable_features)]
#![deny(unused_extern_crates, unused_import_braces, unused_lifetimes, unused_macro_rules)]
#![deny(unused_qualifications, unused_results, variant_size_differences)]
//
#![doc = include_str!("../README.md")]

// Token construction map
//
//   SALT ~ EXP ~ CT ~ MAC          field framing and validation --> token.rs
//   key = HMAC-SHA-256(secret, SALT)                            --> helpers.rs
//   CT  = b64url(IV ‖ AES-256-CBC(key, zlib(cbor(data))))       --> cipher.rs, freezer.rs
//   MAC = b64url(HMAC-SHA-256(key, EXP ~ CT))                   --> helpers.rs
//   orchestration, multi-secret verify loop, expiration gate    --> lib.rs (below)
//
// Decoding walks the fields in authentication order: frame, MAC under each
// configured secret (constant-time comparison), freshness, and only then
// decrypt + thaw. Everything before the MAC verdict fails silently as None;
// everything after it fails loudly, because a valid MAC proves the payload
// was produced by a holder of the secret.

use std::fmt;
#[cfg(feature = "default-rng")]
use std::sync::Mutex;

#[cfg(feature = "default-rng")]
use rand_chacha::ChaCha20Rng;
#[cfg(feature = "default-rng")]
use rand_core::{OsRng, SeedableRng};
#[cfg(feature = "default-rng")]
use sha2::{Digest, Sha256};

use crate::types::Secret;

/// The `rand_core` types are re-exported so that users of sessionbox do not
/// have to worry about using the exact correct version of `rand_core`.
pub use rand_core::{CryptoRng, CryptoRngCore, Error as RngError, RngCore};

/// The CBOR value type is re-exported for the same reason; session data is
/// supplied to `encode` and returned from `decode` as this type.
pub use ciborium::value::Value;

pub use crate::error::Error;

mod cipher;
mod error;
mod freezer;
mod helpers;
mod token;
mod types;


/// Derived-key length in bytes: one HMAC-SHA-256 output, used whole as the
/// AES-256 key and the MAC key.
pub const KEY_LEN: usize = 32;

/// MAC length in bytes before its base64 wire encoding.
pub const MAC_LEN: usize = 32;

/// Bytes drawn from the OS entropy source to seed a box's salt generator.
#[cfg(feature = "default-rng")]
const SEED_POOL_LEN: usize = 1024;


/// Seals session data into a self-contained token string and opens such
/// tokens back into data, enforcing integrity and freshness.
///
/// A box is a stateless value: it owns its secret material and (behind a
/// short-lived lock) a salt generator, but every token carries everything
/// needed to open it. Concurrent `encode` and `decode` calls on a shared box
/// are safe; `decode` takes no lock at all.
///
/// ```rust
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use sessionbox::{SessionBox, Value};
///
/// let sbox = SessionBox::new("serenade viscount secretary frail")?;
///
/// let data = Value::Map(vec![(Value::Text("user".into()), Value::Text("alice".into()))]);
/// let token = sbox.encode(Some(&data), None)?;       // opaque ASCII, cookie-safe
/// assert_eq!(sbox.decode(&token)?, Some(data));      // round-trips exactly
///
/// assert_eq!(sbox.decode("not a token")?, None);     // garbage is silently None
/// # Ok(())}
/// ```
pub struct SessionBox {
    secret: Secret,
    old_secrets: Vec<Secret>,
    default_duration: Option<u64>,
    clock: fn() -> u64,
    #[cfg(feature = "default-rng")]
    rng: Mutex<Option<ChaCha20Rng>>,
}


impl SessionBox {
    /// Builds a box around the primary secret, with no legacy secrets, no
    /// default validity window, and the system clock.
    ///
    /// # Errors
    /// Returns an error when the secret is empty.
    pub fn new(secret: &str) -> Result<Self, Error> {
        Ok(Self {
            secret: Secret::new(secret)?,
            old_secrets: Vec::new(),
            default_duration: None,
            clock: helpers::unix_now,
            #[cfg(feature = "default-rng")]
            rng: Mutex::new(None),
        })
    }

    /// Adds previously deployed secrets, most recent first. Tokens sealed
    /// under any of them still open; new tokens are sealed under the primary
    /// secret only, so rotation is a one-way door.
    ///
    /// # Errors
    /// Returns an error when any of the secrets is empty.
    ///
    /// ```rust
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use sessionbox::SessionBox;
    ///
    /// let retiring = SessionBox::new("old deployment secret")?;
    /// let current = SessionBox::new("new deployment secret")?
    ///     .with_old_secrets(&["old deployment secret"])?;
    ///
    /// let token = retiring.encode(None, None)?;
    /// assert!(current.decode(&token)?.is_some());    // old tokens still open
    ///
    /// let token = current.encode(None, None)?;
    /// assert_eq!(retiring.decode(&token)?, None);    // but not the reverse
    /// # Ok(())}
    /// ```
    pub fn with_old_secrets(mut self, old: &[&str]) -> Result<Self, Error> {
        self.old_secrets = old.iter().map(|s| Secret::new(s)).collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Tokens sealed without an explicit expiration will expire this many
    /// seconds after they are created. Without this, such tokens never
    /// expire.
    #[must_use]
    pub fn with_default_duration(mut self, seconds: u64) -> Self {
        self.default_duration = Some(seconds);
        self
    }

    /// Replaces the wall clock with an arbitrary source of epoch seconds.
    /// Useful for deterministic tests and for servers that want one
    /// consistent timestamp across a batch of calls.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Seals `data` into a token using the box's own generator, seeding it
    /// from the OS on first use. `None` data seals an empty mapping.
    /// `expires` is in epoch seconds; an `expires` already in the past still
    /// yields a well-formed token, but one sealing an empty mapping, so a
    /// consumer with a skewed clock can accept it yet learn nothing.
    ///
    /// # Errors
    /// Returns an error when the OS entropy source fails or the data cannot
    /// be serialized (for example, it contains a tagged value).
    ///
    /// ```rust
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use sessionbox::{SessionBox, Value};
    ///
    /// let sbox = SessionBox::new("serenade viscount secretary frail")?;
    /// let token = sbox.encode(None, None)?;
    /// assert_eq!(sbox.decode(&token)?, Some(Value::Map(vec![])));
    /// # Ok(())}
    /// ```
    #[cfg(feature = "default-rng")]
    pub fn encode(&self, data: Option<&Value>, expires: Option<u64>) -> Result<String, Error> {
        // A poisoned lock only means another thread panicked mid-draw; the
        // generator state is still usable.
        let mut guard = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let rng = match &mut *guard {
            Some(rng) => rng,
            unseeded => unseeded.insert(seed_generator()?),
        };
        self.encode_with_rng(rng, data, expires)
    }

    /// Seals `data` into a token drawing the salt and IV from the supplied
    /// generator instead of the box's own. Semantics otherwise match
    /// [`Self::encode`].
    ///
    /// # Errors
    /// Returns an error when the data cannot be serialized (for example, it
    /// contains a tagged value).
    ///
    /// ```rust
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use rand_chacha::rand_core::SeedableRng;
    /// use sessionbox::{SessionBox, Value};
    ///
    /// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(123);
    /// let sbox = SessionBox::new("serenade viscount secretary frail")?;
    /// let token = sbox.encode_with_rng(&mut rng, None, None)?;
    /// assert_eq!(sbox.decode(&token)?, Some(Value::Map(vec![])));
    /// # Ok(())}
    /// ```
    pub fn encode_with_rng(
        &self, rng: &mut impl CryptoRngCore, data: Option<&Value>, expires: Option<u64>,
    ) -> Result<String, Error> {
        let now = (self.clock)();
        let empty = Value::Map(Vec::new());
        let (payload, expires_field) = match expires {
            // Pre-expired on the wire: keep the caller's timestamp, drop the data.
            Some(e) if e < now => (&empty, e.to_string()),
            Some(e) => (data.unwrap_or(&empty), e.to_string()),
            None => match self.default_duration {
                Some(d) => (data.unwrap_or(&empty), now.saturating_add(d).to_string()),
                None => (data.unwrap_or(&empty), String::new()),
            },
        };

        let salt = rng.next_u32().to_string();
        let key = helpers::derive_key(&salt, &self.secret);
        let frozen = freezer::freeze(payload)?;
        let mut iv = [0u8; cipher::BLOCK_LEN];
        rng.fill_bytes(&mut iv);
        let ciphertext = helpers::b64_encode(&cipher::seal(&key, &iv, &frozen));
        let mac = helpers::b64_encode(&helpers::hmac_sha256(
            &key.0,
            &[expires_field.as_bytes(), token::SEPARATOR.as_bytes(), ciphertext.as_bytes()],
        ));
        Ok(token::join(&salt, &expires_field, &ciphertext, &mac))
    }

    /// Opens a token back into its data. `Ok(None)` covers every way a token
    /// can be unacceptable — malformed framing, a MAC that matches no
    /// configured secret, or a lapsed expiration — without revealing which.
    ///
    /// # Errors
    /// Returns an error only when a payload that passed authentication fails
    /// to decrypt or deserialize; that is corruption or a bug on the sealing
    /// side, not attacker input.
    pub fn decode(&self, token: &str) -> Result<Option<Value>, Error> {
        let now = (self.clock)();
        let Some(raw) = token::split(token) else {
            return Ok(None);
        };

        // Primary first, then retired secrets in order. Stopping at the first
        // matching secret is fine; the comparison under each one is not.
        let mut key = None;
        for secret in std::iter::once(&self.secret).chain(self.old_secrets.iter()) {
            let candidate = helpers::derive_key(raw.salt, secret);
            let expected = helpers::b64_encode(&helpers::hmac_sha256(
                &candidate.0,
                &[raw.expires_str.as_bytes(), token::SEPARATOR.as_bytes(), raw.ciphertext.as_bytes()],
            ));
            if helpers::ct_eq(expected.as_bytes(), raw.mac.as_bytes()) {
                key = Some(candidate);
                break;
            }
        }
        let Some(key) = key else {
            return Ok(None);
        };

        if raw.expires.is_some_and(|e| e < now) {
            return Ok(None);
        }

        let envelope = helpers::b64_decode(raw.ciphertext)?;
        let plaintext = cipher::open(&key, &envelope)?;
        freezer::thaw(&plaintext).map(Some)
    }
}


// Secrets never reach logs; only the shape of the configuration does.
impl fmt::Debug for SessionBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBox")
            .field("old_secrets", &self.old_secrets.len())
            .field("default_duration", &self.default_duration)
            .finish_non_exhaustive()
    }
}


/// One large draw from the OS source seeds a fast per-box generator. Salts
/// need uniqueness across a deployment, not key-grade secrecy, so a strongly
/// seeded stream cipher generator is plenty.
#[cfg(feature = "default-rng")]
fn seed_generator() -> Result<ChaCha20Rng, Error> {
    let mut pool = [0u8; SEED_POOL_LEN];
    OsRng.try_fill_bytes(&mut pool).map_err(Error::Entropy)?;
    let seed: [u8; 32] = Sha256::digest(pool).into();
    Ok(ChaCha20Rng::from_seed(seed))
}
