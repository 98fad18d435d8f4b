use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{FieldMap, RecordId};

/// Kind of visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PilgrimType {
    /// Serialized as `حج`.
    #[serde(rename = "حج")]
    Hajj,
    /// Serialized as `عمرة`.
    #[serde(rename = "عمرة")]
    Umrah,
}

impl PilgrimType {
    /// Every variant, in declaration order.
    pub const ALL: [PilgrimType; 2] = [PilgrimType::Hajj, PilgrimType::Umrah];

    /// Display label used in reports and distributions.
    pub const fn label(&self) -> &'static str {
        match self {
            PilgrimType::Hajj => "حج",
            PilgrimType::Umrah => "عمرة",
        }
    }
}

/// Common nationalities, with a catch-all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nationality {
    /// Serialized as `سعودي`.
    #[serde(rename = "سعودي")]
    Saudi,
    /// Serialized as `مصري`.
    #[serde(rename = "مصري")]
    Egyptian,
    /// Serialized as `باكستاني`.
    #[serde(rename = "باكستاني")]
    Pakistani,
    /// Serialized as `إندونيسي`.
    #[serde(rename = "إندونيسي")]
    Indonesian,
    /// Serialized as `هندي`.
    #[serde(rename = "هندي")]
    Indian,
    /// Serialized as `بنجلاديشي`.
    #[serde(rename = "بنجلاديشي")]
    Bangladeshi,
    /// Serialized as `تركي`.
    #[serde(rename = "تركي")]
    Turkish,
    /// Any other nationality, serialized as `أخرى`.
    #[serde(rename = "أخرى")]
    Other,
}

impl Nationality {
    /// Every variant, in declaration order.
    pub const ALL: [Nationality; 8] = [
        Nationality::Saudi,
        Nationality::Egyptian,
        Nationality::Pakistani,
        Nationality::Indonesian,
        Nationality::Indian,
        Nationality::Bangladeshi,
        Nationality::Turkish,
        Nationality::Other,
    ];

    /// Display label used in reports and distributions.
    pub const fn label(&self) -> &'static str {
        match self {
            Nationality::Saudi => "سعودي",
            Nationality::Egyptian => "مصري",
            Nationality::Pakistani => "باكستاني",
            Nationality::Indonesian => "إندونيسي",
            Nationality::Indian => "هندي",
            Nationality::Bangladeshi => "بنجلاديشي",
            Nationality::Turkish => "تركي",
            Nationality::Other => "أخرى",
        }
    }
}

/// Recorded gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Serialized as `ذكر`.
    #[serde(rename = "ذكر")]
    Male,
    /// Serialized as `أنثى`.
    #[serde(rename = "أنثى")]
    Female,
}

impl Gender {
    /// Every variant, in declaration order.
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Display label used in reports.
    pub const fn label(&self) -> &'static str {
        match self {
            Gender::Male => "ذكر",
            Gender::Female => "أنثى",
        }
    }
}

/// Health status captured at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Serialized as `جيد`.
    #[serde(rename = "جيد")]
    Good,
    /// Serialized as `ممتاز`.
    #[serde(rename = "ممتاز")]
    Excellent,
    /// Serialized as `يحتاج متابعة`.
    #[serde(rename = "يحتاج متابعة")]
    NeedsFollowUp,
}

impl HealthStatus {
    /// Every variant, in declaration order.
    pub const ALL: [HealthStatus; 3] = [
        HealthStatus::Good,
        HealthStatus::Excellent,
        HealthStatus::NeedsFollowUp,
    ];

    /// Display label used in reports and field mappings.
    pub const fn label(&self) -> &'static str {
        match self {
            HealthStatus::Good => "جيد",
            HealthStatus::Excellent => "ممتاز",
            HealthStatus::NeedsFollowUp => "يحتاج متابعة",
        }
    }
}

/// A single pilgrim record.
///
/// Records are produced by the generator and never mutated afterwards.
/// `departure_date` is always later than `arrival_date`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PilgrimRecord {
    /// Unique, monotonically assigned identifier (`PIL` + 8 digits).
    pub id: RecordId,
    /// Sensitive: national identity number.
    pub national_id: String,
    /// Sensitive: passport number.
    pub passport_number: String,
    /// Full display name.
    pub name: String,
    /// Age in years.
    pub age: u8,
    /// Recorded gender.
    pub gender: Gender,
    /// Nationality category.
    pub nationality: Nationality,
    /// Sensitive: contact phone number.
    pub phone: String,
    /// Hajj or Umrah.
    pub pilgrim_type: PilgrimType,
    /// Arrival timestamp.
    pub arrival_date: DateTime<Utc>,
    /// Departure timestamp, strictly after arrival.
    pub departure_date: DateTime<Utc>,
    /// Assigned lodging (`ACC` + 4 digits).
    pub accommodation_id: String,
    /// Assigned transport (`TRN` + 3 digits).
    pub transport_id: String,
    /// Health status at registration.
    pub health_status: HealthStatus,
}

impl PilgrimRecord {
    /// Flatten the record into a field mapping with display labels and RFC 3339 timestamps.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::with_capacity(14);
        fields.insert("id".into(), Value::from(self.id.as_str()));
        fields.insert("national_id".into(), Value::from(self.national_id.as_str()));
        fields.insert(
            "passport_number".into(),
            Value::from(self.passport_number.as_str()),
        );
        fields.insert("name".into(), Value::from(self.name.as_str()));
        fields.insert("age".into(), Value::from(self.age));
        fields.insert("gender".into(), Value::from(self.gender.label()));
        fields.insert("nationality".into(), Value::from(self.nationality.label()));
        fields.insert("phone".into(), Value::from(self.phone.as_str()));
        fields.insert(
            "pilgrim_type".into(),
            Value::from(self.pilgrim_type.label()),
        );
        fields.insert(
            "arrival_date".into(),
            Value::from(self.arrival_date.to_rfc3339()),
        );
        fields.insert(
            "departure_date".into(),
            Value::from(self.departure_date.to_rfc3339()),
        );
        fields.insert(
            "accommodation_id".into(),
            Value::from(self.accommodation_id.as_str()),
        );
        fields.insert(
            "transport_id".into(),
            Value::from(self.transport_id.as_str()),
        );
        fields.insert(
            "health_status".into(),
            Value::from(self.health_status.label()),
        );
        fields
    }

    /// Length of stay in whole days.
    pub fn stay_days(&self) -> i64 {
        (self.departure_date - self.arrival_date).num_days()
    }
}
