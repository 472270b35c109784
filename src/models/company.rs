use serde::{Deserialize, Serialize};

use super::{is_blank, EntityRef, ValidationError};

/// An insuring company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub licence: Option<String>,
    #[serde(default)]
    pub records: Vec<EntityRef>,
}

impl Company {
    pub fn record_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id().to_string()).collect()
    }
}

/// Payload for `POST /companies`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyInput {
    pub name: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub licence: String,
}

impl CreateCompanyInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("Please input the company name!");
        }
        ValidationError::check(missing)
    }
}

/// Payload for `PUT /companies/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyInput {
    pub name: String,
    pub agent_name: Option<String>,
    pub licence: Option<String>,
    /// Record identifiers insured by the company.
    pub records: Vec<String>,
}

impl UpdateCompanyInput {
    /// Start an edit from the company's current values.
    pub fn from_company(company: &Company) -> Self {
        Self {
            name: company.name.clone().unwrap_or_default(),
            agent_name: company.agent_name.clone(),
            licence: company.licence.clone(),
            records: company.record_ids(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("Please input the company name!");
        }
        ValidationError::check(missing)
    }
}

/// A company as listed, with its display number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRow {
    pub cno: String,
    #[serde(flatten)]
    pub company: Company,
}

impl CompanyRow {
    /// Case-insensitive match of `needle` (already lowercased). Missing
    /// fields never match.
    pub fn matches(&self, needle: &str) -> bool {
        let optional = [
            self.company.name.as_deref(),
            self.company.agent_name.as_deref(),
            self.company.licence.as_deref(),
        ];
        self.cno.to_lowercase().contains(needle)
            || optional
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle))
    }
}
