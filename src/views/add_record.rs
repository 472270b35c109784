use crate::api::AgentaClient;
use crate::models::{Company, CreateRecordInput};
use crate::routes::Route;

use super::{Notice, ViewError};

/// The add-record form (`/addRecord`).
#[derive(Debug, Clone, Default)]
pub struct AddRecordView {
    companies: Vec<Company>,
}

/// A record that was created, and where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub notice: Notice,
    pub navigate: Route,
}

impl AddRecordView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the companies offered for selection. On failure the list is empty.
    pub async fn load_companies(&mut self, client: &AgentaClient) -> Result<(), ViewError> {
        let result = client
            .list_companies()
            .await
            .map_err(ViewError::remote("Failed to load companies."));

        match result {
            Ok(companies) => {
                self.companies = companies;
                Ok(())
            }
            Err(e) => {
                self.companies.clear();
                Err(e)
            }
        }
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// Resolve a company by id or by name, ignoring case.
    pub fn resolve_company(&self, key: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == key).or_else(|| {
            self.companies.iter().find(|c| {
                c.name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(key))
            })
        })
    }

    /// Validate and create the record. On success the console goes back to
    /// the record list; on failure it stays on the form.
    pub async fn submit(
        &self,
        client: &AgentaClient,
        input: &CreateRecordInput,
    ) -> Result<Submitted, ViewError> {
        input.validate()?;

        client
            .create_record(input)
            .await
            .map_err(ViewError::remote("Failed to add record. Please try again."))?;

        tracing::info!("Created record for vehicle {}", input.vehicle_number);
        Ok(Submitted {
            notice: Notice("Record added successfully!"),
            navigate: Route::Records,
        })
    }
}
