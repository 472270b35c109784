//! Export of displayed rows to a file, and the table rendering shared with
//! the terminal list views.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use comfy_table::{presets, ContentArrangement, Table};
use serde::Serialize;
use thiserror::Error;

use crate::models::{CompanyRow, RecordRow};
use crate::views::format_price;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize rows: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Pretty-printed JSON array
    Json,
    /// Plain-text table report
    Report,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Report => "txt",
        }
    }
}

/// Rows that can be shown as a table.
pub trait Tabular {
    /// Report heading.
    const TITLE: &'static str;
    /// Default export file name without extension.
    const FILE_STEM: &'static str;

    fn headers() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

impl Tabular for RecordRow {
    const TITLE: &'static str = "Records Report";
    const FILE_STEM: &'static str = "Records";

    fn headers() -> Vec<&'static str> {
        vec![
            "R.No",
            "Vehicle No.",
            "Vehicle Name",
            "Policy",
            "Owner Name",
            "Insurance Type",
            "Insurance Price",
        ]
    }

    fn cells(&self) -> Vec<String> {
        let r = &self.record;
        vec![
            self.rno.clone(),
            r.vehicle_number.clone(),
            r.vehicle_name.clone(),
            r.policy.clone(),
            r.owner_name.clone(),
            r.ins_type.clone(),
            format_price(r.ins_price),
        ]
    }
}

impl Tabular for CompanyRow {
    const TITLE: &'static str = "Companies Report";
    const FILE_STEM: &'static str = "Companies";

    fn headers() -> Vec<&'static str> {
        vec!["C.No", "Name", "Agent Name", "Licence"]
    }

    fn cells(&self) -> Vec<String> {
        let c = &self.company;
        vec![
            self.cno.clone(),
            or_dash(c.name.as_deref()),
            or_dash(c.agent_name.as_deref()),
            or_dash(c.licence.as_deref()),
        ]
    }
}

/// Render rows as a table. `width` bounds the table for terminal output;
/// `None` never wraps.
pub fn render_table<T: Tabular>(rows: &[T], width: Option<u16>) -> String {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    match width {
        Some(width) => {
            table
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(width);
        }
        None => {
            table.set_content_arrangement(ContentArrangement::Disabled);
        }
    }
    table.set_header(T::headers());
    for row in rows {
        table.add_row(row.cells());
    }
    table.to_string()
}

/// Title, table, and a row count.
pub fn render_report<T: Tabular>(rows: &[T]) -> String {
    format!(
        "{}\n\n{}\n{} row(s)\n",
        T::TITLE,
        render_table(rows, None),
        rows.len()
    )
}

/// Render `rows` in `format`.
pub fn render<T: Tabular + Serialize>(rows: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ExportFormat::Report => Ok(render_report(rows)),
    }
}

/// Default file name for an export, e.g. `Records.json`.
pub fn default_file_name<T: Tabular>(format: ExportFormat) -> String {
    format!("{}.{}", T::FILE_STEM, format.extension())
}

/// Write `rows` to `out`, or to the default file name in `dir`.
pub fn export_rows<T: Tabular + Serialize>(
    rows: &[T],
    format: ExportFormat,
    out: Option<&Path>,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => dir.join(default_file_name::<T>(format)),
    };
    let content = render(rows, format)?;
    fs::write(&path, content).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Exported {} row(s) to {}", rows.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, Record};

    fn record_row(i: usize, vehicle: &str) -> RecordRow {
        RecordRow {
            rno: crate::models::row_number(i),
            record: Record {
                id: format!("r{i}"),
                vehicle_number: vehicle.to_string(),
                vehicle_name: "Swift".to_string(),
                policy: "POL".to_string(),
                owner_name: "Asha".to_string(),
                insurance_date: None,
                expiry_date: None,
                ins_type: "Full".to_string(),
                ins_price: 12500.0,
                company: None,
            },
        }
    }

    #[test]
    fn report_contains_every_row() {
        let rows = vec![record_row(0, "KA-01-1111"), record_row(1, "MH-12-2222")];
        let report = render_report(&rows);

        assert!(report.starts_with("Records Report"));
        assert!(report.contains("KA-01-1111"));
        assert!(report.contains("MH-12-2222"));
        assert!(report.contains("₹12,500"));
        assert!(report.contains("2 row(s)"));
    }

    #[test]
    fn company_report_dashes_missing_fields() {
        let rows = vec![CompanyRow {
            cno: "001".to_string(),
            company: Company {
                id: "c1".to_string(),
                name: Some("Acme".to_string()),
                agent_name: None,
                licence: Some(String::new()),
                records: vec![],
            },
        }];
        assert_eq!(rows[0].cells(), vec!["001", "Acme", "-", "-"]);
        assert!(render_report(&rows).starts_with("Companies Report"));
    }

    #[test]
    fn json_export_writes_displayed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![record_row(0, "KA-01-1111")];

        let path = export_rows(&rows, ExportFormat::Json, None, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("Records.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let written = written.as_array().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["rno"], "001");
        assert_eq!(written[0]["vehicleNumber"], "KA-01-1111");
        assert_eq!(written[0]["_id"], "r0");
    }

    #[test]
    fn default_names_follow_format() {
        assert_eq!(default_file_name::<CompanyRow>(ExportFormat::Report), "Companies.txt");
        assert_eq!(default_file_name::<RecordRow>(ExportFormat::Json), "Records.json");
    }
}
