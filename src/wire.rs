//! Wire format (tree-structured, JSON-compatible)
//!
//! ProtectedRecord:
//!   { "record":   { <field>: b64(aes_cbc_ct) },
//!     "metadata": { "iv":   { <field>: b64(iv[16]) },
//!                   "keys": { <field>: b64(rsa_pkcs1(key[16], primary_pk)) },
//!                   "sos":  { <field>: b64(rsa_pkcs1(key[16], sos_pk)) },
//!                   "hash"?:         b64(rsa_seal(sha256(canonical(record)), issuer_sk)),
//!                   "refreshToken"?: b64(rsa_seal(rfc3339_utc, issuer_sk)) } }
//!
//! SignedConsultationRecord:
//!   { date, medicalSpeciality, doctorName, practice, treatmentSummary,
//!     "digitalSignature": b64(rsassa_pkcs1_sha256(canonical(5 fields), physician_sk)) }

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result, Scope};

// ---------------------------------------------------------------------------
// Component sizes
// ---------------------------------------------------------------------------

/// AES-128 field key size
pub const FIELD_KEY_BYTES: usize = 16;

/// CBC initialization vector size (one AES block)
pub const IV_BYTES: usize = 16;

/// SHA-256 output size
pub const DIGEST_BYTES: usize = 32;

/// Minimum PKCS#1 v1.5 padding string length
pub const PKCS1_MIN_PS_BYTES: usize = 8;

/// Default freshness tolerance, applied in both directions.
pub const DEFAULT_FRESHNESS_WINDOW_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Base64 helpers
// ---------------------------------------------------------------------------

pub fn encode_b64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_b64(encoded: &str, scope: Scope) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|_| Error::Decoding { scope })
}
