use crate::api::AgentaClient;
use crate::models::{row_number, Company, CompanyRow, CreateCompanyInput, UpdateCompanyInput};

use super::{Notice, Pagination, ViewError};

/// The company list (`/company`).
#[derive(Debug, Clone, Default)]
pub struct CompaniesView {
    rows: Vec<CompanyRow>,
    displayed: Vec<CompanyRow>,
    query: String,
    pagination: Pagination,
}

impl CompaniesView {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    pub fn from_companies(companies: Vec<Company>, pagination: Pagination) -> Self {
        let mut view = Self::new(pagination);
        view.set_companies(companies);
        view
    }

    /// Fetch all companies. On failure the loaded rows are kept.
    pub async fn load(&mut self, client: &AgentaClient) -> Result<(), ViewError> {
        let companies = client
            .list_companies()
            .await
            .map_err(ViewError::remote("Failed to fetch companies"))?;
        self.set_companies(companies);
        tracing::debug!("Loaded {} companies", self.rows.len());
        Ok(())
    }

    fn set_companies(&mut self, companies: Vec<Company>) {
        self.rows = companies
            .into_iter()
            .enumerate()
            .map(|(i, company)| CompanyRow {
                cno: row_number(i),
                company,
            })
            .collect();
        self.apply_search();
    }

    /// Filter by company number, name, agent name or licence, ignoring case.
    pub fn search(&mut self, query: &str) {
        self.query = query.to_lowercase();
        self.apply_search();
    }

    fn apply_search(&mut self) {
        let needle = self.query.as_str();
        self.displayed = self
            .rows
            .iter()
            .filter(|row| row.matches(needle))
            .cloned()
            .collect();
        let total = self.displayed.len();
        self.pagination.set_page(self.pagination.page, total);
    }

    pub fn rows(&self) -> &[CompanyRow] {
        &self.rows
    }

    pub fn displayed(&self) -> &[CompanyRow] {
        &self.displayed
    }

    pub fn page_rows(&self) -> &[CompanyRow] {
        self.pagination.slice(&self.displayed)
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.displayed.len())
    }

    pub fn set_page(&mut self, page: usize) {
        self.pagination.set_page(page, self.displayed.len());
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        self.pagination.set_page_size(page_size)
    }

    /// Find a row by company id, display number or exact name (ignoring case).
    pub fn find(&self, key: &str) -> Option<&CompanyRow> {
        self.rows.iter().find(|row| {
            row.company.id == key
                || row.cno == key
                || row
                    .company
                    .name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(key))
        })
    }

    fn require(&self, key: &str) -> Result<&CompanyRow, ViewError> {
        self.find(key)
            .filter(|row| !row.company.id.is_empty())
            .ok_or(ViewError::NotFound("Company not found"))
    }

    /// Fetch the current details of a listed company.
    pub async fn details(&self, client: &AgentaClient, key: &str) -> Result<Company, ViewError> {
        let id = self.require(key)?.company.id.clone();
        client
            .get_company(&id)
            .await
            .map_err(ViewError::remote("Failed to fetch company"))
    }

    pub async fn add(
        &mut self,
        client: &AgentaClient,
        input: &CreateCompanyInput,
    ) -> Result<Notice, ViewError> {
        input.validate()?;
        client
            .create_company(input)
            .await
            .map_err(ViewError::remote("Failed to add company"))?;
        self.reload(client).await;
        Ok(Notice("Company added successfully"))
    }

    /// Start an edit from the company's current values.
    pub fn edit_form(&self, key: &str) -> Result<UpdateCompanyInput, ViewError> {
        Ok(UpdateCompanyInput::from_company(&self.require(key)?.company))
    }

    pub async fn update(
        &mut self,
        client: &AgentaClient,
        key: &str,
        input: &UpdateCompanyInput,
    ) -> Result<Notice, ViewError> {
        let id = self.require(key)?.company.id.clone();
        input.validate()?;
        client
            .update_company(&id, input)
            .await
            .map_err(ViewError::remote("Failed to update company"))?;
        self.reload(client).await;
        Ok(Notice("Company updated successfully"))
    }

    pub async fn delete(&mut self, client: &AgentaClient, key: &str) -> Result<Notice, ViewError> {
        let id = self.require(key)?.company.id.clone();
        client
            .delete_company(&id)
            .await
            .map_err(ViewError::remote("Failed to delete company"))?;
        self.reload(client).await;
        Ok(Notice("Company deleted successfully"))
    }

    async fn reload(&mut self, client: &AgentaClient) {
        if let Err(e) = self.load(client).await {
            tracing::warn!("Refresh after change failed: {}", e);
        }
    }
}
