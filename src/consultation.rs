//! Physician signatures over single consultation entries (SHA256withRSA).
//!
//! Signed bytes = canonical(ConsultationRecord), i.e. the five fields in
//! declaration order. Any other field of the entry is not covered.

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::info;

use crate::canonical::CanonicalEncoder;
use crate::error::{CryptoOp, Error, Result, Scope};
use crate::types::{ConsultationRecord, SignedConsultationRecord, SubRecord};
use crate::wire::{decode_b64, encode_b64};

/// Project `entry` onto the signed fields and sign it.
pub fn sign<E: CanonicalEncoder>(
    encoder: &E,
    entry: &SubRecord,
    physician: &RsaPrivateKey,
) -> Result<SignedConsultationRecord> {
    sign_record(encoder, ConsultationRecord::project(entry)?, physician)
}

pub fn sign_record<E: CanonicalEncoder>(
    encoder: &E,
    record: ConsultationRecord,
    physician: &RsaPrivateKey,
) -> Result<SignedConsultationRecord> {
    let bytes = encoder.encode(&record)?;
    let signing_key = SigningKey::<Sha256>::new(physician.clone());
    let signature = signing_key
        .try_sign(&bytes)
        .map_err(|_| Error::crypto(CryptoOp::Sign, Scope::Signature))?;

    Ok(SignedConsultationRecord {
        record,
        digital_signature: encode_b64(signature.to_bytes()),
    })
}

/// `Ok(false)` when the signature does not match the five fields under
/// `physician`; `Err` only when the signature is not valid base64.
pub fn verify<E: CanonicalEncoder>(
    encoder: &E,
    signed: &SignedConsultationRecord,
    physician: &RsaPublicKey,
) -> Result<bool> {
    let bytes = encoder.encode(&signed.record)?;
    let raw = decode_b64(&signed.digital_signature, Scope::Signature)?;

    let valid = match Signature::try_from(raw.as_slice()) {
        Ok(signature) => VerifyingKey::<Sha256>::new(physician.clone())
            .verify(&bytes, &signature)
            .is_ok(),
        Err(_) => false,
    };

    if valid {
        info!("consultation signature verified: the physician cannot deny signing");
    } else {
        info!("consultation signature rejected: the physician can deny signing");
    }
    Ok(valid)
}
