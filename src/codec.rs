//! Field codec: logical field value ⇄ plaintext bytes fed to the field cipher.
//!
//! Scalar      → UTF-8 bytes of the string, as is
//! StringList  → canonical encoding of the list
//! RecordList  → canonical encoding of the list of sub-records
//!
//! The kind comes from the static field table on both paths, never from the
//! payload.

use crate::canonical::CanonicalEncoder;
use crate::error::{Error, Result, Scope};
use crate::types::{FieldKind, FieldValue, SubRecord};

pub fn encode<E: CanonicalEncoder>(encoder: &E, field: &str, value: &FieldValue) -> Result<Vec<u8>> {
    let kind = FieldKind::of(field);
    if !value.conforms_to(kind) {
        return Err(Error::WrongShape { field: field.to_string(), expected: kind });
    }
    match value {
        FieldValue::Scalar(s) => Ok(s.as_bytes().to_vec()),
        FieldValue::StringList(items) => encoder.encode(items),
        FieldValue::RecordList(entries) => encoder.encode(entries),
    }
}

pub fn decode<E: CanonicalEncoder>(encoder: &E, field: &str, bytes: &[u8]) -> Result<FieldValue> {
    decode_as(encoder, field, FieldKind::of(field), bytes)
}

/// Decode a payload as `kind`. A payload that does not have that shape is a
/// format error; a scalar payload that is not UTF-8 is a decoding error.
pub fn decode_as<E: CanonicalEncoder>(
    encoder: &E,
    field: &str,
    kind: FieldKind,
    bytes: &[u8],
) -> Result<FieldValue> {
    let wrong_shape = |_| Error::WrongShape { field: field.to_string(), expected: kind };
    match kind {
        FieldKind::Scalar => String::from_utf8(bytes.to_vec())
            .map(FieldValue::Scalar)
            .map_err(|_| Error::Decoding { scope: Scope::field(field) }),
        FieldKind::StringList => encoder
            .decode::<Vec<String>>(bytes)
            .map(FieldValue::StringList)
            .map_err(wrong_shape),
        FieldKind::RecordList => encoder
            .decode::<Vec<SubRecord>>(bytes)
            .map(FieldValue::RecordList)
            .map_err(wrong_shape),
    }
}
