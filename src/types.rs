//! Core types: records, field kinds, protected artifacts, key maps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroize;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Field classification
// ---------------------------------------------------------------------------

/// Shape of a top-level record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single string.
    Scalar,
    /// An ordered list of strings (e.g. allergies).
    StringList,
    /// An ordered list of scalar-valued sub-records (e.g. consultations).
    RecordList,
}

/// Known top-level fields and their fixed kinds.
pub const KNOWN_FIELDS: [(&str, FieldKind); 6] = [
    ("name", FieldKind::Scalar),
    ("sex", FieldKind::Scalar),
    ("dateOfBirth", FieldKind::Scalar),
    ("bloodType", FieldKind::Scalar),
    ("knownAllergies", FieldKind::StringList),
    ("consultationRecords", FieldKind::RecordList),
];

/// Fields of a consultation entry covered by a physician's signature.
pub const CONSULTATION_FIELDS: [&str; 5] =
    ["date", "medicalSpeciality", "doctorName", "practice", "treatmentSummary"];

impl FieldKind {
    /// Kind of the named field. Names outside [`KNOWN_FIELDS`] are scalars.
    pub fn of(field: &str) -> Self {
        KNOWN_FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
            .unwrap_or(FieldKind::Scalar)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "string"),
            FieldKind::StringList => write!(f, "list of strings"),
            FieldKind::RecordList => write!(f, "list of sub-records"),
        }
    }
}

/// Names of all known top-level fields, in table order.
pub fn known_fields() -> impl Iterator<Item = &'static str> {
    KNOWN_FIELDS.iter().map(|(name, _)| *name)
}

// ---------------------------------------------------------------------------
// Structured record
// ---------------------------------------------------------------------------

/// A sub-record: scalar-valued mapping (one consultation entry).
pub type SubRecord = BTreeMap<String, String>;

/// Logical value of one record field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    StringList(Vec<String>),
    RecordList(Vec<SubRecord>),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Scalar(String::new())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Scalar(_) => FieldKind::Scalar,
            FieldValue::StringList(_) => FieldKind::StringList,
            FieldValue::RecordList(_) => FieldKind::RecordList,
        }
    }

    /// Whether this value may be stored in a field of `kind`.
    ///
    /// An empty list has no element type and conforms to either list kind.
    pub fn conforms_to(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (FieldValue::StringList(items), FieldKind::RecordList) => items.is_empty(),
            (FieldValue::RecordList(items), FieldKind::StringList) => items.is_empty(),
            (value, kind) => value.kind() == kind,
        }
    }

    /// Re-tag an empty list as the list kind `kind` expects; anything else
    /// is returned unchanged.
    pub fn settled_as(self, kind: FieldKind) -> Self {
        match (self, kind) {
            (FieldValue::StringList(items), FieldKind::RecordList) if items.is_empty() => {
                FieldValue::RecordList(Vec::new())
            }
            (FieldValue::RecordList(items), FieldKind::StringList) if items.is_empty() => {
                FieldValue::StringList(Vec::new())
            }
            (value, _) => value,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::StringList(items)
    }
}

impl From<Vec<SubRecord>> for FieldValue {
    fn from(items: Vec<SubRecord>) -> Self {
        FieldValue::RecordList(items)
    }
}

/// Plaintext medical record: field name → value, ordered by name.
///
/// Empty lists are stored with the list kind of their field, so a record
/// parsed from a document compares equal to the same record after a
/// protect/unprotect round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StructuredRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl<'de> Deserialize<'de> for StructuredRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, FieldValue>::deserialize(deserializer)?;
        let mut record = Self::new();
        for (field, value) in raw {
            record.insert(field, value);
        }
        Ok(record)
    }
}

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record holding every known field as an empty string.
    pub fn with_empty_known_fields() -> Self {
        let fields = known_fields()
            .map(|name| (name.to_string(), FieldValue::empty()))
            .collect();
        Self { fields }
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        let field = field.into();
        let value = value.into().settled_as(FieldKind::of(&field));
        self.fields.insert(field, value)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this record keeping only `fields`.
    pub fn restricted_to(&self, fields: &[&str]) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| fields.contains(&name.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { fields }
    }
}

// ---------------------------------------------------------------------------
// Protected artifact
// ---------------------------------------------------------------------------

/// field → base64 value (ciphertext, IV, or wrapped key).
pub type FieldMap = BTreeMap<String, String>;

/// field → base64 RSA-wrapped field key for one recipient.
pub type WrappedKeys = FieldMap;

/// Attestation and key material attached to a protected record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// field → base64 IV.
    pub iv: FieldMap,
    /// Field keys wrapped for the primary recipient.
    pub keys: WrappedKeys,
    /// Field keys wrapped for the emergency recipient.
    #[serde(default)]
    pub sos: WrappedKeys,
    /// Issuer-sealed SHA-256 digest of the canonical `record`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Issuer-sealed RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Metadata {
    pub fn is_attested(&self) -> bool {
        self.hash.is_some() && self.refresh_token.is_some()
    }
}

/// Output of `protect`: per-field ciphertexts plus metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedRecord {
    /// field → base64 AES-CBC ciphertext.
    pub record: FieldMap,
    pub metadata: Metadata,
}

// ---------------------------------------------------------------------------
// Raw (unwrapped) key map
// ---------------------------------------------------------------------------

/// field → base64 raw field key.
///
/// Only produced by unwrapping and only accepted by re-wrapping, so a map of
/// wrapped keys can never be wrapped a second time by mistake. Values are
/// zeroized on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawKeys {
    keys: BTreeMap<String, String>,
}

impl RawKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, key_b64: String) {
        if let Some(mut old) = self.keys.insert(field.into(), key_b64) {
            old.zeroize();
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.keys.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for RawKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKeys")
            .field("fields", &self.keys.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Drop for RawKeys {
    fn drop(&mut self) {
        for key in self.keys.values_mut() {
            key.zeroize();
        }
    }
}

// ---------------------------------------------------------------------------
// Consultation entries
// ---------------------------------------------------------------------------

/// The signed projection of one consultation entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRecord {
    pub date: String,
    pub medical_speciality: String,
    pub doctor_name: String,
    pub practice: String,
    pub treatment_summary: String,
}

impl ConsultationRecord {
    /// Project a sub-record onto the five signed fields; extra entries are ignored.
    pub fn project(entry: &SubRecord) -> Result<Self> {
        let take = |field: &str| {
            entry
                .get(field)
                .cloned()
                .ok_or_else(|| Error::MissingField(field.to_string()))
        };
        Ok(Self {
            date: take("date")?,
            medical_speciality: take("medicalSpeciality")?,
            doctor_name: take("doctorName")?,
            practice: take("practice")?,
            treatment_summary: take("treatmentSummary")?,
        })
    }

    pub fn to_sub_record(&self) -> SubRecord {
        CONSULTATION_FIELDS
            .iter()
            .zip([
                &self.date,
                &self.medical_speciality,
                &self.doctor_name,
                &self.practice,
                &self.treatment_summary,
            ])
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A consultation entry plus the physician's signature over its projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedConsultationRecord {
    #[serde(flatten)]
    pub record: ConsultationRecord,
    /// Base64 RSASSA-PKCS1-v1_5 / SHA-256 signature.
    pub digital_signature: String,
}
