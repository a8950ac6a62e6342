//! Integrity and freshness verification of protected records.
//!
//! Both verifiers answer with a boolean: a failed check is an expected
//! outcome, not an error. Neither mutates the artifact.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rsa::RsaPublicKey;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::asymmetric;
use crate::canonical::CanonicalEncoder;
use crate::error::{Result, Scope};
use crate::protect::record_digest;
use crate::types::ProtectedRecord;
use crate::wire::decode_b64;

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

/// Whether `metadata.hash` was sealed by `issuer` over exactly the current
/// ciphertext map. Missing, undecodable or unsealable digests count as tampered.
pub fn verify_integrity<E: CanonicalEncoder>(encoder: &E, protected: &ProtectedRecord, issuer: &RsaPublicKey) -> bool {
    let Some(sealed) = protected.metadata.hash.as_deref() else {
        info!("record carries no integrity digest");
        return false;
    };

    let compare = || -> Result<bool> {
        let sealed = decode_b64(sealed, Scope::Digest)?;
        let expected = asymmetric::unseal(issuer, &sealed, &Scope::Digest)?;
        let actual = record_digest(encoder, &protected.record)?;
        Ok(bool::from(expected.as_slice().ct_eq(&actual[..])))
    };

    match compare() {
        Ok(intact) => intact,
        Err(e) => {
            warn!(error = %e, "integrity digest could not be recovered");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// Whether `metadata.refreshToken` names an instant within `window` of `now`,
/// in either direction, bounds included. Anything unreadable is stale.
pub fn verify_freshness(protected: &ProtectedRecord, issuer: &RsaPublicKey, window: Duration, now: DateTime<Utc>) -> bool {
    let Some(sealed) = protected.metadata.refresh_token.as_deref() else {
        info!("record carries no freshness token");
        return false;
    };

    match token_instant(sealed, issuer) {
        Ok(Some(issued_at)) => within_window(issued_at, window, now),
        Ok(None) => {
            warn!("freshness token is not a valid instant");
            false
        }
        Err(e) => {
            warn!(error = %e, "freshness token could not be recovered");
            false
        }
    }
}

fn token_instant(sealed: &str, issuer: &RsaPublicKey) -> Result<Option<DateTime<Utc>>> {
    let sealed = decode_b64(sealed, Scope::FreshnessToken)?;
    let payload = asymmetric::unseal(issuer, &sealed, &Scope::FreshnessToken)?;
    Ok(std::str::from_utf8(&payload)
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

pub(crate) fn within_window(issued_at: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
    // Bounds that fall outside the representable range do not constrain.
    let after_lower = now.checked_sub_signed(window).map_or(true, |lower| lower <= issued_at);
    let before_upper = now.checked_add_signed(window).map_or(true, |upper| issued_at <= upper);
    after_lower && before_upper
}

// ---------------------------------------------------------------------------
// Combined check
// ---------------------------------------------------------------------------

/// Outcome of [`check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub integrity_ok: bool,
    pub freshness_ok: bool,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.integrity_ok && self.freshness_ok
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status= `{}` - `{}`",
            if self.integrity_ok { "unaltered" } else { "altered" },
            if self.freshness_ok { "fresh" } else { "stale" }
        )
    }
}

pub fn check<E: CanonicalEncoder>(
    encoder: &E,
    protected: &ProtectedRecord,
    issuer: &RsaPublicKey,
    window: Duration,
    now: DateTime<Utc>,
) -> CheckReport {
    let report = CheckReport {
        integrity_ok: verify_integrity(encoder, protected, issuer),
        freshness_ok: verify_freshness(protected, issuer, window, now),
    };
    info!(
        integrity_ok = report.integrity_ok,
        freshness_ok = report.freshness_ok,
        "{}",
        report
    );
    report
}
