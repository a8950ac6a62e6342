mod support;

use meditrack_envelope::{Error, ErrorKind, FieldValue, MediTrack, ProtectedRecord, Recipients, StructuredRecord};
use support::{parties, public, sample_record, t0};

fn setup() -> (MediTrack, rsa::RsaPublicKey, rsa::RsaPublicKey) {
    let p = parties();
    (MediTrack::new(), public(&p.patient), public(&p.sos))
}

fn protect_all(mt: &MediTrack, record: &StructuredRecord) -> ProtectedRecord {
    let (_, patient_pk, sos_pk) = setup();
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    mt.protect_at(record, &[], recipients, Some(&parties().issuer), t0())
        .unwrap()
}

#[test]
fn roundtrip_full_record() {
    let (mt, _, _) = setup();
    let record = sample_record();
    let protected = protect_all(&mt, &record);

    assert_eq!(protected.record.len(), 6);
    assert_eq!(protected.metadata.iv.len(), 6);
    assert_eq!(protected.metadata.keys.len(), 6);
    assert_eq!(protected.metadata.sos.len(), 6);
    assert!(protected.metadata.is_attested());

    let plain = mt.unprotect(&protected, &parties().patient, &[]).unwrap();
    assert_eq!(plain, record);
}

#[test]
fn roundtrip_through_json_document() {
    let (mt, _, _) = setup();
    let record = sample_record();
    let protected = protect_all(&mt, &record);

    let json = serde_json::to_string(&protected).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(doc["metadata"]["refreshToken"].is_string());
    assert!(doc["metadata"]["hash"].is_string());

    let parsed: ProtectedRecord = serde_json::from_str(&json).unwrap();
    let plain = mt.unprotect(&parsed, &parties().patient, &[]).unwrap();
    assert_eq!(plain, record);
}

#[test]
fn sos_recipient_reads_every_field() {
    let (mt, _, _) = setup();
    let record = sample_record();
    let protected = protect_all(&mt, &record);

    let plain = mt
        .unprotect_with_custom_keys(&protected, &protected.metadata.sos, &parties().sos, &[])
        .unwrap();
    assert_eq!(plain, record);
}

#[test]
fn partial_protection_leaves_other_fields_empty() {
    let (mt, patient_pk, sos_pk) = setup();
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    let protected = mt
        .protect(&sample_record(), &["name", "knownAllergies"], recipients, None)
        .unwrap();

    assert_eq!(protected.record.len(), 2);
    assert!(!protected.metadata.is_attested());

    let plain = mt.unprotect(&protected, &parties().patient, &[]).unwrap();
    assert_eq!(plain.get("name"), Some(&FieldValue::from("Alice")));
    assert_eq!(
        plain.get("knownAllergies"),
        Some(&FieldValue::from(vec!["penicillin".to_string(), "pollen".to_string()]))
    );
    assert_eq!(plain.get("bloodType"), Some(&FieldValue::empty()));
    assert_eq!(plain.len(), 6);
}

#[test]
fn unprotect_selected_fields_only() {
    let (mt, _, _) = setup();
    let protected = protect_all(&mt, &sample_record());

    let plain = mt.unprotect(&protected, &parties().patient, &["bloodType"]).unwrap();
    assert_eq!(plain.get("bloodType"), Some(&FieldValue::from("O+")));
    assert_eq!(plain.get("name"), Some(&FieldValue::empty()));
}

#[test]
fn absent_known_fields_are_skipped_by_default() {
    let (mt, _, _) = setup();
    let record = StructuredRecord::new().with("name", "Bob");
    let protected = protect_all(&mt, &record);

    assert_eq!(protected.record.keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn explicitly_named_missing_field_fails() {
    let (mt, patient_pk, sos_pk) = setup();
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    let record = StructuredRecord::new().with("name", "Bob");

    let err = mt.protect(&record, &["name", "bloodType"], recipients, None).unwrap_err();
    assert!(matches!(err, Error::MissingField(ref f) if f == "bloodType"));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn wrong_shape_is_rejected() {
    let (mt, patient_pk, sos_pk) = setup();
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    let record = StructuredRecord::new().with("knownAllergies", "penicillin");

    let err = mt.protect(&record, &["knownAllergies"], recipients, None).unwrap_err();
    assert!(matches!(err, Error::WrongShape { .. }));
}

#[test]
fn empty_lists_roundtrip() {
    let (mt, _, _) = setup();
    let record = StructuredRecord::new()
        .with("name", "")
        .with("knownAllergies", Vec::<String>::new())
        .with("consultationRecords", Vec::<meditrack_envelope::SubRecord>::new());
    let protected = protect_all(&mt, &record);

    let plain = mt.unprotect(&protected, &parties().patient, &[]).unwrap();
    assert_eq!(plain.get("name"), Some(&FieldValue::empty()));
    assert_eq!(
        plain.get("knownAllergies").map(FieldValue::kind),
        Some(meditrack_envelope::FieldKind::StringList)
    );
    assert_eq!(
        plain.get("consultationRecords").map(FieldValue::kind),
        Some(meditrack_envelope::FieldKind::RecordList)
    );
}

#[test]
fn field_keys_and_ivs_are_fresh_per_field_and_call() {
    let (mt, _, _) = setup();
    let record = StructuredRecord::new().with("name", "Alice").with("sex", "Alice");
    let a = protect_all(&mt, &record);
    let b = protect_all(&mt, &record);

    assert_ne!(a.record["name"], a.record["sex"]);
    assert_ne!(a.metadata.iv["name"], a.metadata.iv["sex"]);
    assert_ne!(a.record["name"], b.record["name"]);
    assert_ne!(a.metadata.iv["name"], b.metadata.iv["name"]);
}

#[test]
fn wrong_private_key_fails() {
    let (mt, _, _) = setup();
    let protected = protect_all(&mt, &sample_record());

    let err = mt.unprotect(&protected, &parties().stranger, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
}

#[test]
fn corrupted_ciphertext_fails() {
    let (mt, _, _) = setup();
    let mut protected = protect_all(&mt, &sample_record());
    protected.record.insert("name".into(), "not base64!".into());

    let err = mt.unprotect(&protected, &parties().patient, &["name"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);
}

#[test]
fn protected_field_without_ciphertext_fails() {
    let (mt, _, _) = setup();
    let mut protected = protect_all(&mt, &sample_record());
    protected.record.remove("sex");

    let err = mt.unprotect(&protected, &parties().patient, &[]).unwrap_err();
    assert!(matches!(err, Error::MissingField(ref f) if f == "sex"));
}

#[test]
fn unicode_scalar_roundtrip() {
    let (mt, _, _) = setup();
    let record = StructuredRecord::new().with("name", "Zoë Ødegård 山田");
    let protected = protect_all(&mt, &record);

    let plain = mt.unprotect(&protected, &parties().patient, &["name"]).unwrap();
    assert_eq!(plain.get("name"), record.get("name"));
}

#[test]
fn record_parsed_from_json_roundtrips_with_empty_lists() {
    let (mt, patient_pk, sos_pk) = setup();
    let recipients = Recipients { primary: &patient_pk, sos: &sos_pk };
    let record: StructuredRecord =
        serde_json::from_str(r#"{"name":"Alice","knownAllergies":[],"consultationRecords":[]}"#).unwrap();
    let fields = ["name", "knownAllergies", "consultationRecords"];

    let protected = mt.protect(&record, &fields, recipients, None).unwrap();
    let plain = mt.unprotect(&protected, &parties().patient, &fields).unwrap();
    assert_eq!(plain.restricted_to(&fields), record);
}
