use crate::api::AgentaClient;
use crate::models::{row_number, Record, RecordRow, UpdateRecordInput};

use super::{Notice, Pagination, ViewError};

/// The record list (`/`).
#[derive(Debug, Clone, Default)]
pub struct RecordsView {
    rows: Vec<RecordRow>,
    displayed: Vec<RecordRow>,
    query: String,
    pagination: Pagination,
}

impl RecordsView {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    /// Build a view from already-fetched records.
    pub fn from_records(records: Vec<Record>, pagination: Pagination) -> Self {
        let mut view = Self::new(pagination);
        view.set_records(records);
        view
    }

    /// Fetch all records. On failure the loaded rows are kept.
    pub async fn load(&mut self, client: &AgentaClient) -> Result<(), ViewError> {
        let records = client
            .list_records()
            .await
            .map_err(ViewError::remote("Failed to fetch records"))?;
        self.set_records(records);
        tracing::debug!("Loaded {} records", self.rows.len());
        Ok(())
    }

    fn set_records(&mut self, records: Vec<Record>) {
        self.rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| RecordRow {
                rno: row_number(i),
                record,
            })
            .collect();
        self.apply_search();
    }

    /// Filter the displayed rows by record number, vehicle number, vehicle
    /// name, policy or owner name, ignoring case.
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

    pub fn rows(&self) -> &[RecordRow] {
        &self.rows
    }

    /// Rows matching the current search.
    pub fn displayed(&self) -> &[RecordRow] {
        &self.displayed
    }

    pub fn page_rows(&self) -> &[RecordRow] {
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

    /// Find a row by record id or display number.
    pub fn find(&self, key: &str) -> Option<&RecordRow> {
        self.rows
            .iter()
            .find(|row| row.record.id == key || row.rno == key)
    }

    fn require(&self, key: &str) -> Result<String, ViewError> {
        self.find(key)
            .map(|row| row.record.id.clone())
            .filter(|id| !id.is_empty())
            .ok_or(ViewError::NotFound("Record not found"))
    }

    /// Update the editable fields of a record, then reload.
    pub async fn update(
        &mut self,
        client: &AgentaClient,
        key: &str,
        input: &UpdateRecordInput,
    ) -> Result<Notice, ViewError> {
        let id = self.require(key)?;
        input.validate()?;
        client
            .update_record(&id, input)
            .await
            .map_err(ViewError::remote("Failed to update record"))?;
        self.reload(client).await;
        Ok(Notice("Record updated successfully"))
    }

    /// Delete a record, then reload.
    pub async fn delete(&mut self, client: &AgentaClient, key: &str) -> Result<Notice, ViewError> {
        let id = self.require(key)?;
        client
            .delete_record(&id)
            .await
            .map_err(ViewError::remote("Failed to delete record"))?;
        self.reload(client).await;
        Ok(Notice("Record deleted successfully"))
    }

    /// Refresh after a mutation. A failed refresh keeps the stale rows.
    async fn reload(&mut self, client: &AgentaClient) {
        if let Err(e) = self.load(client).await {
            tracing::warn!("Refresh after change failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vehicle: &str, owner: &str) -> Record {
        Record {
            id: id.to_string(),
            vehicle_number: vehicle.to_string(),
            vehicle_name: "Swift".to_string(),
            policy: format!("POL-{id}"),
            owner_name: owner.to_string(),
            insurance_date: None,
            expiry_date: None,
            ins_type: "Third party".to_string(),
            ins_price: 1000.0,
            company: None,
        }
    }

    fn view() -> RecordsView {
        RecordsView::from_records(
            vec![
                record("a", "KA-01-1111", "Asha"),
                record("b", "MH-12-2222", "Bilal"),
                record("c", "KA-05-3333", "Chen"),
            ],
            Pagination::default(),
        )
    }

    #[test]
    fn rows_are_numbered_in_order() {
        let view = view();
        let numbers: Vec<_> = view.rows().iter().map(|r| r.rno.as_str()).collect();
        assert_eq!(numbers, vec!["001", "002", "003"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let mut view = view();
        view.search("ka-");
        assert_eq!(view.displayed().len(), 2);

        view.search("BILAL");
        assert_eq!(view.displayed()[0].record.id, "b");

        view.search("003");
        assert_eq!(view.displayed()[0].record.id, "c");

        view.search("");
        assert_eq!(view.displayed().len(), 3);
    }

    #[test]
    fn find_accepts_id_or_number() {
        let view = view();
        assert_eq!(view.find("b").map(|r| r.rno.as_str()), Some("002"));
        assert_eq!(view.find("003").map(|r| r.record.id.as_str()), Some("c"));
        assert!(view.find("zzz").is_none());
    }

    #[test]
    fn missing_record_cannot_be_deleted() {
        let view = view();
        assert!(matches!(
            view.require("zzz"),
            Err(ViewError::NotFound("Record not found"))
        ));
    }
}
