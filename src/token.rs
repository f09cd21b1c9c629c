/// Field separator for the wire format.
pub(crate) const SEPARATOR: &str = "~";

// Longest decimal spelling of a u32 salt.
const SALT_MAX_DIGITS: usize = 10;


/// A token's four fields, split but not yet trusted.
pub(crate) struct RawToken<'a> {
    /// Salt digits exactly as they appear on the wire. The KDF consumes this
    /// form, so it is never reformatted through an integer.
    pub(crate) salt: &'a str,
    /// Parsed expiration; `None` when the wire field is empty.
    pub(crate) expires: Option<u64>,
    /// Expiration field in wire form, the first half of the MAC input.
    pub(crate) expires_str: &'a str,
    pub(crate) ciphertext: &'a str,
    pub(crate) mac: &'a str,
}


/// Splits `SALT~EXP~CT~MAC` into an untrusted view. Splitting never fails
/// loudly; a string that does not frame correctly is simply not a token.
pub(crate) fn split(token: &str) -> Option<RawToken<'_>> {
    let mut fields = token.splitn(4, SEPARATOR);
    let salt = fields.next()?;
    let expires_str = fields.next()?;
    let ciphertext = fields.next()?;
    let mac = fields.next()?;

    if !is_decimal(salt) || salt.len() > SALT_MAX_DIGITS || salt.parse::<u32>().is_err() {
        return None;
    }
    let expires = if expires_str.is_empty() {
        None
    } else if is_decimal(expires_str) {
        Some(expires_str.parse::<u64>().ok()?)
    } else {
        return None;
    };
    if ciphertext.is_empty() || mac.is_empty() {
        return None;
    }
    Some(RawToken { salt, expires, expires_str, ciphertext, mac })
}


/// The four-field join, the only place the wire shape is spelled out.
pub(crate) fn join(salt: &str, expires: &str, ciphertext: &str, mac: &str) -> String {
    [salt, expires, ciphertext, mac].join(SEPARATOR)
}


// `str::parse` would accept a leading `+`; the wire format is digits only.
fn is_decimal(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}
