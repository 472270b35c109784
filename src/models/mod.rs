//! Wire types for the remote records API.
//!
//! # Entities
//!
//! - [`Record`]: An insurance record for one vehicle, linked to the company that
//!   insures it.
//! - [`Company`]: An insuring company with its agent, licence and records.
//!
//! Both are owned by the remote API. The console only reads them, sends
//! create/update payloads, and numbers list rows for display.

mod company;
mod record;

pub use company::*;
pub use record::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// List responses wrap their payload in `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// A reference to another entity: either a bare id or a populated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated { name, .. } => name.as_deref(),
        }
    }
}

/// Form validation failures, one message per missing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub(crate) fn check(messages: Vec<&str>) -> Result<(), Self> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self {
                messages: messages.into_iter().map(String::from).collect(),
            })
        }
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Display number for the row at `index`: `001`, `002`, ...
pub fn row_number(index: usize) -> String {
    format!("{:03}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_numbers_are_one_based_and_padded() {
        assert_eq!(row_number(0), "001");
        assert_eq!(row_number(41), "042");
        assert_eq!(row_number(999), "1000");
    }

    #[test]
    fn entity_ref_accepts_ids_and_objects() {
        let refs: Vec<EntityRef> =
            serde_json::from_str(r#"["abc", {"_id": "def", "name": "Acme"}, {"_id": "ghi"}]"#)
                .unwrap();
        assert_eq!(refs[0].id(), "abc");
        assert_eq!(refs[1].id(), "def");
        assert_eq!(refs[1].name(), Some("Acme"));
        assert_eq!(refs[2].name(), None);
    }

    #[test]
    fn validation_error_joins_messages() {
        let err = ValidationError::check(vec!["a", "b"]).unwrap_err();
        assert_eq!(err.to_string(), "a; b");
        assert!(ValidationError::check(vec![]).is_ok());
    }
}
