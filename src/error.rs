//! Unified error types for record protection.
//!
//! Verification outcomes (tampered digest, stale token, forged signature) are
//! not errors; they are reported as `false` by the verifiers.

use core::fmt;

use crate::types::FieldKind;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Document missing an expected field or holding the wrong shape.
    Format,
    /// Cipher or signature operation failed.
    Crypto,
    /// Base64 or canonical-encoding decode failure.
    Decoding,
}

/// Cryptographic step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoOp {
    Randomness,
    Encrypt,
    Decrypt,
    Wrap,
    Unwrap,
    Seal,
    Unseal,
    Sign,
}

impl fmt::Display for CryptoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoOp::Randomness => write!(f, "random generation"),
            CryptoOp::Encrypt => write!(f, "encryption"),
            CryptoOp::Decrypt => write!(f, "decryption"),
            CryptoOp::Wrap => write!(f, "key wrap"),
            CryptoOp::Unwrap => write!(f, "key unwrap"),
            CryptoOp::Seal => write!(f, "seal"),
            CryptoOp::Unseal => write!(f, "unseal"),
            CryptoOp::Sign => write!(f, "signing"),
        }
    }
}

/// What an operation was working on when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Field(String),
    Digest,
    FreshnessToken,
    Signature,
}

impl Scope {
    pub fn field(name: impl Into<String>) -> Self {
        Scope::Field(name.into())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Field(name) => write!(f, "field `{}`", name),
            Scope::Digest => write!(f, "digest"),
            Scope::FreshnessToken => write!(f, "freshness token"),
            Scope::Signature => write!(f, "signature"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` does not hold a {expected}")]
    WrongShape { field: String, expected: FieldKind },

    #[error("malformed document: {0}")]
    Format(String),

    #[error("{operation} failed on {scope}")]
    Crypto { operation: CryptoOp, scope: Scope },

    #[error("invalid encoding of {scope}")]
    Decoding { scope: Scope },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_) | Error::WrongShape { .. } | Error::Format(_) => ErrorKind::Format,
            Error::Crypto { .. } => ErrorKind::Crypto,
            Error::Decoding { .. } => ErrorKind::Decoding,
        }
    }

    pub(crate) fn crypto(operation: CryptoOp, scope: Scope) -> Self {
        Error::Crypto { operation, scope }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
