//! Record protection: per-field hybrid encryption and issuer attestation.

use chrono::{DateTime, SecondsFormat, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::asymmetric;
use crate::canonical::CanonicalEncoder;
use crate::codec;
use crate::error::{Error, Result, Scope};
use crate::symmetric::{self, FieldKeyMaterial};
use crate::types::{known_fields, FieldMap, Metadata, ProtectedRecord, StructuredRecord};
use crate::wire::{encode_b64, DIGEST_BYTES};

/// Public keys every protected field is wrapped for.
#[derive(Clone, Copy, Debug)]
pub struct Recipients<'a> {
    pub primary: &'a RsaPublicKey,
    /// Emergency-access recipient.
    pub sos: &'a RsaPublicKey,
}

/// Encrypt `fields` of `record` (every known field present when `fields` is
/// empty) and, if `issuer` is given, attest the result as of `now`.
pub fn protect<E: CanonicalEncoder>(
    encoder: &E,
    record: &StructuredRecord,
    fields: &[&str],
    recipients: Recipients<'_>,
    issuer: Option<&RsaPrivateKey>,
    now: DateTime<Utc>,
) -> Result<ProtectedRecord> {
    let explicit = !fields.is_empty();
    let selected: Vec<&str> = if explicit {
        fields.to_vec()
    } else {
        known_fields().collect()
    };

    let mut ciphertexts = FieldMap::new();
    let mut metadata = Metadata::default();

    for field in selected {
        let value = match record.get(field) {
            Some(value) => value,
            None if explicit => return Err(Error::MissingField(field.to_string())),
            None => {
                debug!(field, "field absent from record, not protected");
                continue;
            }
        };

        let scope = Scope::field(field);
        let plaintext = Zeroizing::new(codec::encode(encoder, field, value)?);
        let material = FieldKeyMaterial::generate(&scope)?;
        let ciphertext = symmetric::encrypt(&material, &plaintext, &scope)?;

        let primary = asymmetric::wrap(recipients.primary, material.key(), &scope)?;
        let sos = asymmetric::wrap(recipients.sos, material.key(), &scope)?;

        ciphertexts.insert(field.to_string(), encode_b64(&ciphertext));
        metadata.iv.insert(field.to_string(), encode_b64(material.iv()));
        metadata.keys.insert(field.to_string(), encode_b64(&primary));
        metadata.sos.insert(field.to_string(), encode_b64(&sos));
        debug!(field, "field protected");
    }

    let mut protected = ProtectedRecord { record: ciphertexts, metadata };
    if let Some(issuer) = issuer {
        add_freshness(&mut protected, issuer, now)?;
        add_digest(encoder, &mut protected, issuer)?;
    }
    Ok(protected)
}

/// SHA-256 over the canonical encoding of the ciphertext map.
pub fn record_digest<E: CanonicalEncoder>(encoder: &E, record: &FieldMap) -> Result<[u8; DIGEST_BYTES]> {
    let bytes = encoder.encode(record)?;
    let h = Sha256::digest(&bytes);
    let mut out = [0u8; DIGEST_BYTES];
    out.copy_from_slice(&h);
    Ok(out)
}

/// Seal the digest of `protected.record` into `metadata.hash`, replacing any
/// previous value.
pub fn add_digest<E: CanonicalEncoder>(
    encoder: &E,
    protected: &mut ProtectedRecord,
    issuer: &RsaPrivateKey,
) -> Result<()> {
    let digest = record_digest(encoder, &protected.record)?;
    let sealed = asymmetric::seal(issuer, &digest, &Scope::Digest)?;
    protected.metadata.hash = Some(encode_b64(&sealed));
    info!(fields = protected.record.len(), "integrity digest attached");
    Ok(())
}

/// Seal `now` into `metadata.refreshToken`, replacing any previous value.
pub fn add_freshness(protected: &mut ProtectedRecord, issuer: &RsaPrivateKey, now: DateTime<Utc>) -> Result<()> {
    let token = freshness_payload(now);
    let sealed = asymmetric::seal(issuer, token.as_bytes(), &Scope::FreshnessToken)?;
    protected.metadata.refresh_token = Some(encode_b64(&sealed));
    info!(issued_at = %token, "freshness token attached");
    Ok(())
}

pub(crate) fn freshness_payload(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
