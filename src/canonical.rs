//! Canonical encoding of structured values for digesting, signing and
//! list-valued field payloads.
//!
//! Determinism is the contract: the same logical value must always yield the
//! same bytes. Map-valued data is held in `BTreeMap`s (name order) and structs
//! serialize in declaration order, so a compact serializer is sufficient.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Capability injected into every operation that digests, signs or encodes
/// list-valued fields.
pub trait CanonicalEncoder {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// Compact JSON: no whitespace, keys in the order the value provides.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl CanonicalEncoder for JsonEncoder {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Format(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::Format(e.to_string()))
    }
}
