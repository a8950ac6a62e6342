//! Record unprotection: unwrap field keys, decrypt, decode.
//!
//! The result always holds every known field; fields that were never
//! protected (no IV or no key for them) stay empty strings. Any failure on a
//! field that *is* protected aborts the whole call.

use rsa::RsaPrivateKey;
use tracing::debug;
use zeroize::Zeroizing;

use crate::asymmetric;
use crate::canonical::CanonicalEncoder;
use crate::codec;
use crate::error::{Error, Result, Scope};
use crate::symmetric;
use crate::types::{known_fields, ProtectedRecord, RawKeys, StructuredRecord, WrappedKeys};
use crate::wire::decode_b64;

/// Where the field keys come from.
enum KeySource<'a> {
    /// A key map wrapped for the holder of `private`.
    Wrapped {
        keys: &'a WrappedKeys,
        private: &'a RsaPrivateKey,
    },
    /// Already-unwrapped keys.
    Raw(&'a RawKeys),
}

impl KeySource<'_> {
    fn field_key(&self, field: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let scope = Scope::field(field);
        match self {
            KeySource::Wrapped { keys, private } => match keys.get(field) {
                Some(wrapped) => {
                    let wrapped = decode_b64(wrapped, scope.clone())?;
                    asymmetric::unwrap(private, &wrapped, &scope).map(Some)
                }
                None => Ok(None),
            },
            KeySource::Raw(keys) => match keys.get(field) {
                Some(raw) => decode_b64(raw, scope).map(|k| Some(Zeroizing::new(k))),
                None => Ok(None),
            },
        }
    }
}

/// Decrypt with the primary recipient's key map (`metadata.keys`).
pub fn unprotect<E: CanonicalEncoder>(
    encoder: &E,
    protected: &ProtectedRecord,
    recipient: &RsaPrivateKey,
    fields: &[&str],
) -> Result<StructuredRecord> {
    let source = KeySource::Wrapped {
        keys: &protected.metadata.keys,
        private: recipient,
    };
    decrypt_fields(encoder, protected, &source, fields)
}

/// Decrypt with a key map wrapped for a delegate instead of `metadata.keys`.
pub fn unprotect_with_custom_keys<E: CanonicalEncoder>(
    encoder: &E,
    protected: &ProtectedRecord,
    delegate_keys: &WrappedKeys,
    delegate: &RsaPrivateKey,
    fields: &[&str],
) -> Result<StructuredRecord> {
    let source = KeySource::Wrapped {
        keys: delegate_keys,
        private: delegate,
    };
    decrypt_fields(encoder, protected, &source, fields)
}

/// Decrypt with already-unwrapped field keys.
pub fn unprotect_with_raw_keys<E: CanonicalEncoder>(
    encoder: &E,
    protected: &ProtectedRecord,
    keys: &RawKeys,
    fields: &[&str],
) -> Result<StructuredRecord> {
    decrypt_fields(encoder, protected, &KeySource::Raw(keys), fields)
}

fn decrypt_fields<E: CanonicalEncoder>(
    encoder: &E,
    protected: &ProtectedRecord,
    source: &KeySource<'_>,
    fields: &[&str],
) -> Result<StructuredRecord> {
    let mut out = StructuredRecord::with_empty_known_fields();
    let selected: Vec<&str> = if fields.is_empty() {
        known_fields().collect()
    } else {
        fields.to_vec()
    };

    for field in selected {
        let Some(iv) = protected.metadata.iv.get(field) else {
            debug!(field, "no IV, field was not protected");
            continue;
        };
        let Some(key) = source.field_key(field)? else {
            debug!(field, "no key available for field");
            continue;
        };

        let scope = Scope::field(field);
        let ciphertext = protected
            .record
            .get(field)
            .ok_or_else(|| Error::MissingField(field.to_string()))?;
        let ciphertext = decode_b64(ciphertext, scope.clone())?;
        let iv = decode_b64(iv, scope.clone())?;

        let plaintext = Zeroizing::new(symmetric::decrypt(&key, &iv, &ciphertext, &scope)?);
        out.insert(field, codec::decode(encoder, field, &plaintext)?);
        debug!(field, "field unprotected");
    }

    Ok(out)
}
