//! Delegated access: re-wrap existing field keys for another recipient
//! without touching ciphertexts or IVs.
//!
//! unprotect_keys(metadata.keys, primary_sk)  -> RawKeys
//! protect_keys(RawKeys, delegate_pk, fields) -> WrappedKeys (for the delegate)

use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;
use zeroize::Zeroizing;

use crate::asymmetric;
use crate::error::{Result, Scope};
use crate::types::{RawKeys, WrappedKeys};
use crate::wire::{decode_b64, encode_b64};

/// Wrap raw field keys for `delegate`. Empty `fields` means every field in
/// `raw`; named fields without a raw key are skipped.
pub fn protect_keys(raw: &RawKeys, delegate: &RsaPublicKey, fields: &[&str]) -> Result<WrappedKeys> {
    let selected: Vec<&str> = if fields.is_empty() {
        raw.fields().collect()
    } else {
        fields.to_vec()
    };

    let mut wrapped = WrappedKeys::new();
    for field in selected {
        let Some(key_b64) = raw.get(field) else {
            debug!(field, "no raw key for field, not granted");
            continue;
        };
        let scope = Scope::field(field);
        let key = Zeroizing::new(decode_b64(key_b64, scope.clone())?);
        let rewrapped = asymmetric::wrap(delegate, &key, &scope)?;
        wrapped.insert(field.to_string(), encode_b64(&rewrapped));
        debug!(field, "field key re-wrapped");
    }
    Ok(wrapped)
}

/// Unwrap every entry of a recipient's key map.
pub fn unprotect_keys(wrapped: &WrappedKeys, recipient: &RsaPrivateKey) -> Result<RawKeys> {
    let mut raw = RawKeys::new();
    for (field, key_b64) in wrapped {
        let scope = Scope::field(field.as_str());
        let ciphertext = decode_b64(key_b64, scope.clone())?;
        let key = asymmetric::unwrap(recipient, &ciphertext, &scope)?;
        raw.insert(field.clone(), encode_b64(&*key));
    }
    Ok(raw)
}

/// Grant `delegate` access to `fields` of a record whose keys are wrapped for
/// `recipient` in `wrapped`.
pub fn grant_access(
    wrapped: &WrappedKeys,
    recipient: &RsaPrivateKey,
    delegate: &RsaPublicKey,
    fields: &[&str],
) -> Result<WrappedKeys> {
    let raw = unprotect_keys(wrapped, recipient)?;
    protect_keys(&raw, delegate, fields)
}
