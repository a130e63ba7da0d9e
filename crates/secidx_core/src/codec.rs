//! CBOR encoding for records and index entries.
//!
//! Records are stored in the key-value store exactly as the caller's type
//! serializes; no index metadata is ever embedded in them. Index entries
//! are stored as a CBOR array of primary keys.

use crate::error::{CoreError, CoreResult};
use ciborium::Value as CborValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value to CBOR bytes.
pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> CoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| CoreError::codec(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a value from CBOR bytes.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))
}

/// Decodes optional bytes, passing absence through.
pub(crate) fn decode_opt<T: DeserializeOwned>(bytes: Option<Vec<u8>>) -> CoreResult<Option<T>> {
    bytes.map(|b| decode(&b)).transpose()
}

/// Converts a record into a CBOR value tree for field projection.
pub(crate) fn to_value<T: Serialize + ?Sized>(value: &T) -> CoreResult<CborValue> {
    CborValue::serialized(value).map_err(|e| CoreError::codec(e.to_string()))
}

/// Encodes an index entry's member list.
pub(crate) fn encode_members(members: &[String]) -> CoreResult<Vec<u8>> {
    encode(members)
}

/// Decodes an index entry's member list.
pub(crate) fn decode_members(bytes: Option<Vec<u8>>) -> CoreResult<Option<Vec<String>>> {
    decode_opt(bytes)
}
