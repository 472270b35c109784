//! Data views behind the route guard.
//!
//! Each view owns the state a page of the console shows (loaded rows, search
//! text, pagination) and talks to the remote API directly. A failed remote
//! call never changes the view's state; it comes back as
//! [`ViewError::RemoteRequestFailed`] carrying the notice to show. There is
//! no automatic retry.

mod add_record;
mod companies;
mod dashboard;
mod records;

pub use add_record::*;
pub use companies::*;
pub use dashboard::*;
pub use records::*;

use thiserror::Error;

use crate::api::ClientError;
use crate::config::PAGE_SIZE_OPTIONS;
use crate::models::ValidationError;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("{message}")]
    RemoteRequestFailed {
        message: &'static str,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Page size must be one of 5, 10 or 20 (got {0})")]
    InvalidPageSize(usize),
}

impl ViewError {
    pub(crate) fn remote(message: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |source| {
            tracing::error!("{}: {}", message, source);
            Self::RemoteRequestFailed { message, source }
        }
    }
}

/// A transient success message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub &'static str);

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// 1-based pagination over the displayed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZE_OPTIONS[0],
        }
    }
}

impl Pagination {
    /// Change the page size and go back to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(ViewError::InvalidPageSize(page_size));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Move to `page`, clamped to the available pages.
    pub fn set_page(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.total_pages(total));
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size).min(rows.len());
        let end = start.saturating_add(self.page_size).min(rows.len());
        &rows[start..end]
    }
}

/// Format a premium with the rupee sign and thousands separators.
pub fn format_price(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let whole = rounded.abs().trunc() as u64;
    let cents = ((rounded.abs() - rounded.abs().trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if cents == 0 {
        format!("{sign}₹{grouped}")
    } else {
        format!("{sign}₹{grouped}.{cents:02}")
    }
}
