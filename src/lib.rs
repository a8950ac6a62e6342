//! # MediTrack Envelope
//!
//! Field-level hybrid protection for structured medical records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meditrack_envelope::{MediTrack, Recipients, StructuredRecord};
//! use rsa::{RsaPrivateKey, RsaPublicKey};
//!
//! let mut rng = rand_core::OsRng;
//! let patient = RsaPrivateKey::new(&mut rng, 2048).unwrap();
//! let sos = RsaPrivateKey::new(&mut rng, 2048).unwrap();
//! let server = RsaPrivateKey::new(&mut rng, 2048).unwrap();
//! let (patient_pk, sos_pk) = (RsaPublicKey::from(&patient), RsaPublicKey::from(&sos));
//!
//! let mt = MediTrack::new();
//! let record = StructuredRecord::new().with("name", "Alice").with("bloodType", "O+");
//! let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
//!
//! let protected = mt.protect(&record, &["name", "bloodType"], recipients, Some(&server)).unwrap();
//! assert!(mt.check(&protected, &RsaPublicKey::from(&server)).is_ok());
//!
//! let plain = mt.unprotect(&protected, &patient, &[]).unwrap();
//! assert_eq!(plain.get("name"), record.get("name"));
//! ```
//!
//! ## Protocol
//!
//! - **Per-field keys**: every field is AES-128-CBC encrypted under its own
//!   one-time key and IV; the key is RSA-wrapped for the primary recipient
//!   and for the emergency (SOS) recipient
//! - **Integrity**: SHA-256 over the canonical ciphertext map, sealed with the
//!   issuer's private key
//! - **Freshness**: the attestation instant, sealed with the issuer's private
//!   key; accepted within a symmetric window (default 60 s)
//! - **Delegation**: field keys can be re-wrapped for another party without
//!   touching any ciphertext
//! - **Authorship**: physicians sign individual consultation entries
//!
//! ## What's NOT Provided
//!
//! - Key management (rotation, revocation, PKI)
//! - Key file loading, record storage, transport

#![deny(unsafe_code)]

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

mod asymmetric;
mod codec;
mod error;
mod symmetric;

pub mod canonical;
pub mod config;
pub mod consultation;
pub mod protect;
pub mod rewrap;
pub mod types;
pub mod unprotect;
pub mod verify;

#[doc(hidden)]
pub mod wire;

pub use canonical::{CanonicalEncoder, JsonEncoder};
pub use config::ProtectionConfig;
pub use error::{CryptoOp, Error, ErrorKind, Result, Scope};
pub use protect::Recipients;
pub use types::{
    ConsultationRecord, FieldKind, FieldMap, FieldValue, Metadata, ProtectedRecord, RawKeys,
    SignedConsultationRecord, StructuredRecord, SubRecord, WrappedKeys, CONSULTATION_FIELDS,
    KNOWN_FIELDS,
};
pub use verify::CheckReport;

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Binds a canonical encoder and configuration to the protocol operations.
///
/// Holds no key material and no mutable state.
#[derive(Clone, Debug, Default)]
pub struct MediTrack<E: CanonicalEncoder = JsonEncoder> {
    encoder: E,
    config: ProtectionConfig,
}

impl MediTrack<JsonEncoder> {
    pub fn new() -> Self {
        Self::with_encoder(JsonEncoder)
    }

    /// JSON encoding with [`ProtectionConfig::from_env`].
    pub fn from_env() -> Self {
        Self::new().with_config(ProtectionConfig::from_env())
    }
}

impl<E: CanonicalEncoder> MediTrack<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self {
            encoder,
            config: ProtectionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProtectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    // -----------------------------------------------------------------------
    // Protection
    // -----------------------------------------------------------------------

    /// Protect `fields` of `record` (all known fields present when empty).
    /// With `issuer`, the result also carries a digest and freshness token.
    pub fn protect(
        &self,
        record: &StructuredRecord,
        fields: &[&str],
        recipients: Recipients<'_>,
        issuer: Option<&RsaPrivateKey>,
    ) -> Result<ProtectedRecord> {
        self.protect_at(record, fields, recipients, issuer, Utc::now())
    }

    pub fn protect_at(
        &self,
        record: &StructuredRecord,
        fields: &[&str],
        recipients: Recipients<'_>,
        issuer: Option<&RsaPrivateKey>,
        now: DateTime<Utc>,
    ) -> Result<ProtectedRecord> {
        protect::protect(&self.encoder, record, fields, recipients, issuer, now)
    }

    pub fn add_digest(&self, protected: &mut ProtectedRecord, issuer: &RsaPrivateKey) -> Result<()> {
        protect::add_digest(&self.encoder, protected, issuer)
    }

    pub fn add_freshness(&self, protected: &mut ProtectedRecord, issuer: &RsaPrivateKey) -> Result<()> {
        self.add_freshness_at(protected, issuer, Utc::now())
    }

    pub fn add_freshness_at(
        &self,
        protected: &mut ProtectedRecord,
        issuer: &RsaPrivateKey,
        now: DateTime<Utc>,
    ) -> Result<()> {
        protect::add_freshness(protected, issuer, now)
    }

    // -----------------------------------------------------------------------
    // Unprotection
    // -----------------------------------------------------------------------

    pub fn unprotect(
        &self,
        protected: &ProtectedRecord,
        recipient: &RsaPrivateKey,
        fields: &[&str],
    ) -> Result<StructuredRecord> {
        unprotect::unprotect(&self.encoder, protected, recipient, fields)
    }

    pub fn unprotect_with_custom_keys(
        &self,
        protected: &ProtectedRecord,
        delegate_keys: &WrappedKeys,
        delegate: &RsaPrivateKey,
        fields: &[&str],
    ) -> Result<StructuredRecord> {
        unprotect::unprotect_with_custom_keys(&self.encoder, protected, delegate_keys, delegate, fields)
    }

    pub fn unprotect_with_raw_keys(
        &self,
        protected: &ProtectedRecord,
        keys: &RawKeys,
        fields: &[&str],
    ) -> Result<StructuredRecord> {
        unprotect::unprotect_with_raw_keys(&self.encoder, protected, keys, fields)
    }

    // -----------------------------------------------------------------------
    // Delegation
    // -----------------------------------------------------------------------

    pub fn protect_keys(&self, raw: &RawKeys, delegate: &RsaPublicKey, fields: &[&str]) -> Result<WrappedKeys> {
        rewrap::protect_keys(raw, delegate, fields)
    }

    pub fn unprotect_keys(&self, wrapped: &WrappedKeys, recipient: &RsaPrivateKey) -> Result<RawKeys> {
        rewrap::unprotect_keys(wrapped, recipient)
    }

    pub fn grant_access(
        &self,
        wrapped: &WrappedKeys,
        recipient: &RsaPrivateKey,
        delegate: &RsaPublicKey,
        fields: &[&str],
    ) -> Result<WrappedKeys> {
        rewrap::grant_access(wrapped, recipient, delegate, fields)
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    pub fn verify_integrity(&self, protected: &ProtectedRecord, issuer: &RsaPublicKey) -> bool {
        verify::verify_integrity(&self.encoder, protected, issuer)
    }

    /// Freshness against the configured window, as of now.
    pub fn verify_freshness(&self, protected: &ProtectedRecord, issuer: &RsaPublicKey) -> bool {
        self.verify_freshness_at(protected, issuer, Utc::now())
    }

    pub fn verify_freshness_at(&self, protected: &ProtectedRecord, issuer: &RsaPublicKey, now: DateTime<Utc>) -> bool {
        verify::verify_freshness(protected, issuer, self.config.freshness_window(), now)
    }

    pub fn check(&self, protected: &ProtectedRecord, issuer: &RsaPublicKey) -> CheckReport {
        self.check_at(protected, issuer, Utc::now())
    }

    pub fn check_at(&self, protected: &ProtectedRecord, issuer: &RsaPublicKey, now: DateTime<Utc>) -> CheckReport {
        verify::check(&self.encoder, protected, issuer, self.config.freshness_window(), now)
    }

    // -----------------------------------------------------------------------
    // Consultation signatures
    // -----------------------------------------------------------------------

    pub fn sign_consultation(&self, entry: &SubRecord, physician: &RsaPrivateKey) -> Result<SignedConsultationRecord> {
        consultation::sign(&self.encoder, entry, physician)
    }

    pub fn verify_consultation(&self, signed: &SignedConsultationRecord, physician: &RsaPublicKey) -> Result<bool> {
        consultation::verify(&self.encoder, signed, physician)
    }
}
