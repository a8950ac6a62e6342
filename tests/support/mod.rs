#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use meditrack_envelope::{StructuredRecord, SubRecord};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Key pairs shared across a test binary; generation dominates test time.
pub struct Parties {
    pub patient: RsaPrivateKey,
    pub sos: RsaPrivateKey,
    pub issuer: RsaPrivateKey,
    pub delegate: RsaPrivateKey,
    pub physician: RsaPrivateKey,
    pub stranger: RsaPrivateKey,
}

pub fn parties() -> &'static Parties {
    static PARTIES: OnceLock<Parties> = OnceLock::new();
    PARTIES.get_or_init(|| {
        let mut rng = rand_core::OsRng;
        let mut keygen = || RsaPrivateKey::new(&mut rng, 1024).unwrap();
        Parties {
            patient: keygen(),
            sos: keygen(),
            issuer: keygen(),
            delegate: keygen(),
            physician: keygen(),
            stranger: keygen(),
        }
    })
}

pub fn public(sk: &RsaPrivateKey) -> RsaPublicKey {
    RsaPublicKey::from(sk)
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap()
}

pub fn consultation() -> SubRecord {
    [
        ("date", "2024-03-01"),
        ("medicalSpeciality", "Cardiology"),
        ("doctorName", "Dr. Rao"),
        ("practice", "Hospital São João"),
        ("treatmentSummary", "Routine check, no findings."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn sample_record() -> StructuredRecord {
    StructuredRecord::new()
        .with("name", "Alice")
        .with("sex", "Female")
        .with("dateOfBirth", "1990-05-17")
        .with("bloodType", "O+")
        .with("knownAllergies", vec!["penicillin".to_string(), "pollen".to_string()])
        .with("consultationRecords", vec![consultation()])
}
