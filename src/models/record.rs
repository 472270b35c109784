use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, EntityRef, ValidationError};

/// An insurance record for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub vehicle_number: String,
    #[serde(default)]
    pub vehicle_name: String,
    #[serde(default)]
    pub policy: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub insurance_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ins_type: String,
    #[serde(default)]
    pub ins_price: f64,
    /// The insuring company; a bare id or a populated company object.
    #[serde(default)]
    pub company: Option<EntityRef>,
}

/// Payload for `POST /records`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordInput {
    pub vehicle_number: String,
    pub vehicle_name: String,
    pub policy: String,
    pub owner_name: String,
    pub insurance_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub ins_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ins_price: Option<f64>,
    /// Company identifier.
    pub company: String,
}

impl CreateRecordInput {
    /// Check the required fields. The price is optional.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if is_blank(&self.vehicle_number) {
            missing.push("Please enter the vehicle number!");
        }
        if is_blank(&self.vehicle_name) {
            missing.push("Please enter the vehicle name!");
        }
        if is_blank(&self.policy) {
            missing.push("Please enter the policy!");
        }
        if is_blank(&self.owner_name) {
            missing.push("Please enter the owner's name!");
        }
        if self.insurance_date.is_none() {
            missing.push("Please select the insurance date!");
        }
        if self.expiry_date.is_none() {
            missing.push("Please select the expiry date!");
        }
        if is_blank(&self.ins_type) {
            missing.push("Please enter the insurance type!");
        }
        if is_blank(&self.company) {
            missing.push("Please select a company!");
        }
        ValidationError::check(missing)
    }
}

/// Payload for `PUT /records/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ins_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ins_price: Option<f64>,
}

impl UpdateRecordInput {
    /// Vehicle number and name may be changed but not blanked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.vehicle_number.as_deref().is_some_and(is_blank) {
            missing.push("Please enter vehicle number");
        }
        if self.vehicle_name.as_deref().is_some_and(is_blank) {
            missing.push("Please enter vehicle name");
        }
        ValidationError::check(missing)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A record as listed, with its display number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub rno: String,
    #[serde(flatten)]
    pub record: Record,
}

impl RecordRow {
    /// Case-insensitive match of `needle` (already lowercased) against the
    /// searchable columns.
    pub fn matches(&self, needle: &str) -> bool {
        [
            self.rno.as_str(),
            self.record.vehicle_number.as_str(),
            self.record.vehicle_name.as_str(),
            self.record.policy.as_str(),
            self.record.owner_name.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}
