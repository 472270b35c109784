use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::api::AgentaClient;
use crate::models::{row_number, Company, Record, RecordRow};

use super::ViewError;

/// How far ahead the dashboard looks for expiring policies.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Totals shown on `/dashboard`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub record_count: usize,
    pub company_count: usize,
    pub total_premium: f64,
    /// Records expiring between now and the end of the window, soonest first.
    pub expiring_soon: Vec<RecordRow>,
}

impl DashboardSummary {
    pub fn build(records: Vec<Record>, companies: &[Company], now: DateTime<Utc>) -> Self {
        let horizon = now + Duration::days(EXPIRY_WINDOW_DAYS);
        let total_premium: f64 = records.iter().map(|r| r.ins_price).sum();
        let record_count = records.len();

        let mut expiring_soon: Vec<RecordRow> = records
            .into_iter()
            .enumerate()
            .filter(|(_, r)| r.expiry_date.is_some_and(|d| d >= now && d <= horizon))
            .map(|(i, record)| RecordRow {
                rno: row_number(i),
                record,
            })
            .collect();
        expiring_soon.sort_by_key(|row| row.record.expiry_date);

        Self {
            record_count,
            company_count: companies.len(),
            total_premium,
            expiring_soon,
        }
    }
}

/// Fetch records and companies and summarize them.
pub async fn load_dashboard(
    client: &AgentaClient,
    now: DateTime<Utc>,
) -> Result<DashboardSummary, ViewError> {
    let records = client
        .list_records()
        .await
        .map_err(ViewError::remote("Failed to fetch records"))?;
    let companies = client
        .list_companies()
        .await
        .map_err(ViewError::remote("Failed to fetch companies"))?;
    Ok(DashboardSummary::build(records, &companies, now))
}
