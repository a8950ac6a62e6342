mod support;

use chrono::Duration;
use meditrack_envelope::wire::{decode_b64, encode_b64};
use meditrack_envelope::{CheckReport, MediTrack, ProtectedRecord, ProtectionConfig, Recipients, Scope};
use support::{parties, public, sample_record, t0};

fn attested(mt: &MediTrack) -> ProtectedRecord {
    let p = parties();
    let (patient_pk, sos_pk) = (public(&p.patient), public(&p.sos));
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    mt.protect_at(&sample_record(), &[], recipients, Some(&p.issuer), t0())
        .unwrap()
}

fn flip_first_byte(value: &str, scope: Scope) -> String {
    let mut bytes = decode_b64(value, scope).unwrap();
    bytes[0] ^= 0x01;
    encode_b64(&bytes)
}

#[test]
fn fresh_and_unaltered_record_passes() {
    let mt = MediTrack::new();
    let protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);

    let report = mt.check_at(&protected, &issuer_pk, t0());
    assert_eq!(report, CheckReport { integrity_ok: true, freshness_ok: true });
    assert_eq!(report.to_string(), "status= `unaltered` - `fresh`");
}

#[test]
fn tampered_ciphertext_is_altered() {
    let mt = MediTrack::new();
    let mut protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);

    let tampered = flip_first_byte(&protected.record["bloodType"], Scope::field("bloodType"));
    protected.record.insert("bloodType".into(), tampered);

    let report = mt.check_at(&protected, &issuer_pk, t0());
    assert!(!report.integrity_ok);
    assert!(report.freshness_ok);
    assert_eq!(report.to_string(), "status= `altered` - `fresh`");
}

#[test]
fn removed_or_added_field_is_altered() {
    let mt = MediTrack::new();
    let issuer_pk = public(&parties().issuer);

    let mut protected = attested(&mt);
    protected.record.remove("sex");
    assert!(!mt.verify_integrity(&protected, &issuer_pk));

    let mut protected = attested(&mt);
    protected.record.insert("extra".into(), "AAAA".into());
    assert!(!mt.verify_integrity(&protected, &issuer_pk));
}

#[test]
fn metadata_changes_do_not_affect_integrity() {
    let mt = MediTrack::new();
    let mut protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);

    protected.metadata.sos.clear();
    assert!(mt.verify_integrity(&protected, &issuer_pk));
}

#[test]
fn tampered_digest_is_altered() {
    let mt = MediTrack::new();
    let mut protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);

    let hash = protected.metadata.hash.take().unwrap();
    protected.metadata.hash = Some(flip_first_byte(&hash, Scope::Digest));
    assert!(!mt.verify_integrity(&protected, &issuer_pk));

    protected.metadata.hash = Some("***".into());
    assert!(!mt.verify_integrity(&protected, &issuer_pk));
}

#[test]
fn freshness_window_bounds_are_inclusive() {
    let mt = MediTrack::new();
    let protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);
    let w = Duration::milliseconds(60_000);
    let ms = Duration::milliseconds(1);

    assert!(mt.verify_freshness_at(&protected, &issuer_pk, t0() + w));
    assert!(mt.verify_freshness_at(&protected, &issuer_pk, t0() - w));
    assert!(!mt.verify_freshness_at(&protected, &issuer_pk, t0() + w + ms));
    assert!(!mt.verify_freshness_at(&protected, &issuer_pk, t0() - w - ms));
}

#[test]
fn stale_after_two_minutes() {
    let mt = MediTrack::new();
    let protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);

    let report = mt.check_at(&protected, &issuer_pk, t0() + Duration::minutes(2));
    assert!(report.integrity_ok);
    assert!(!report.freshness_ok);
    assert_eq!(report.to_string(), "status= `unaltered` - `stale`");
}

#[test]
fn configured_window_is_honoured() {
    let config = ProtectionConfig::default().with_freshness_window_ms(5 * 60_000);
    let mt = MediTrack::new().with_config(config);
    let protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);

    assert!(mt.verify_freshness_at(&protected, &issuer_pk, t0() + Duration::minutes(2)));
    assert!(!mt.verify_freshness_at(&protected, &issuer_pk, t0() + Duration::minutes(6)));
}

#[test]
fn unattested_record_fails_both_checks() {
    let mt = MediTrack::new();
    let p = parties();
    let (patient_pk, sos_pk) = (public(&p.patient), public(&p.sos));
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    let protected = mt.protect_at(&sample_record(), &[], recipients, None, t0()).unwrap();

    let report = mt.check_at(&protected, &public(&p.issuer), t0());
    assert_eq!(report, CheckReport { integrity_ok: false, freshness_ok: false });
}

#[test]
fn attestation_can_be_added_later() {
    let mt = MediTrack::new();
    let p = parties();
    let (patient_pk, sos_pk) = (public(&p.patient), public(&p.sos));
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    let mut protected = mt.protect_at(&sample_record(), &[], recipients, None, t0()).unwrap();

    mt.add_digest(&mut protected, &p.issuer).unwrap();
    assert!(mt.verify_integrity(&protected, &public(&p.issuer)));
    assert!(!mt.verify_freshness_at(&protected, &public(&p.issuer), t0()));

    let later = t0() + Duration::hours(1);
    mt.add_freshness_at(&mut protected, &p.issuer, later).unwrap();
    assert!(mt.check_at(&protected, &public(&p.issuer), later).is_ok());
}

#[test]
fn refreshing_replaces_the_token() {
    let mt = MediTrack::new();
    let mut protected = attested(&mt);
    let issuer_pk = public(&parties().issuer);
    let later = t0() + Duration::hours(1);

    assert!(!mt.verify_freshness_at(&protected, &issuer_pk, later));
    mt.add_freshness_at(&mut protected, &parties().issuer, later).unwrap();
    assert!(mt.verify_freshness_at(&protected, &issuer_pk, later));
    assert!(mt.verify_integrity(&protected, &issuer_pk));
}

#[test]
fn wrong_issuer_key_fails_both_checks() {
    let mt = MediTrack::new();
    let protected = attested(&mt);

    let report = mt.check_at(&protected, &public(&parties().stranger), t0());
    assert_eq!(report, CheckReport { integrity_ok: false, freshness_ok: false });
}

#[test]
fn token_from_another_record_still_verifies_freshness() {
    let mt = MediTrack::new();
    let a = attested(&mt);
    let mut b = attested(&mt);
    b.metadata.refresh_token = a.metadata.refresh_token.clone();

    assert!(mt.verify_freshness_at(&b, &public(&parties().issuer), t0()));
}

#[test]
fn verification_does_not_mutate() {
    let mt = MediTrack::new();
    let protected = attested(&mt);
    let before = protected.clone();

    let _ = mt.check_at(&protected, &public(&parties().issuer), t0());
    assert_eq!(protected, before);
}

#[test]
fn window_from_environment() {
    std::env::set_var(meditrack_envelope::config::ENV_FRESHNESS_WINDOW_MS, "300000");
    let mt = MediTrack::from_env();
    std::env::remove_var(meditrack_envelope::config::ENV_FRESHNESS_WINDOW_MS);

    assert_eq!(mt.config().freshness_window_ms, 300_000);
    let protected = attested(&mt);
    assert!(mt.verify_freshness_at(&protected, &public(&parties().issuer), t0() + Duration::minutes(4)));
}
