use ciborium::value::Value;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::Error;
use crate::helpers::ensure;


/// Serializes and compresses in one pass: CBOR written straight through a
/// zlib encoder tuned for speed over ratio, since tokens are small and hot.
pub(crate) fn freeze(data: &Value) -> Result<Vec<u8>, Error> {
    ensure!(!contains_tag(data), Error::TaggedValue);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    ciborium::ser::into_writer(data, &mut encoder).map_err(Error::Freeze)?;
    encoder.finish().map_err(|e| Error::Freeze(ciborium::ser::Error::Io(e)))
}


/// Decompresses and deserializes an authenticated payload. Failures are
/// fatal: a valid MAC means this payload came from a holder of the secret.
pub(crate) fn thaw(bytes: &[u8]) -> Result<Value, Error> {
    let value: Value = ciborium::de::from_reader(ZlibDecoder::new(bytes)).map_err(Error::Thaw)?;
    ensure!(!contains_tag(&value), Error::TaggedValue);
    Ok(value)
}


// Tags can carry reconstruction semantics for foreign decoders; this codec
// hands the caller plain aggregate data only, in both directions.
fn contains_tag(value: &Value) -> bool {
    match value {
        Value::Tag(..) => true,
        Value::Array(items) => items.iter().any(contains_tag),
        Value::Map(entries) => entries.iter().any(|(k, v)| contains_tag(k) || contains_tag(v)),
        _ => false,
    }
}
