//! Row selection (pagination and fetch hints) for one query execution.

use std::time::Duration;

/// Pagination and fetch parameters supplied per execution.
///
/// Not part of a query plan: one plan serves many selections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowSelection {
    /// Zero-based index of the first row to return.
    pub first_row: Option<u32>,
    /// Maximum number of rows to return.
    pub max_rows: Option<u32>,
    /// JDBC-style fetch size hint.
    pub fetch_size: Option<u32>,
    /// Statement timeout.
    pub timeout: Option<Duration>,
}

impl RowSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first row.
    pub fn with_first_row(mut self, first_row: u32) -> Self {
        self.first_row = Some(first_row);
        self
    }

    /// Set the maximum number of rows.
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Set the fetch size.
    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check if this selection restricts which rows are returned.
    pub fn defines_limits(&self) -> bool {
        self.max_rows.is_some() || self.first_row.is_some_and(|first| first > 0)
    }

    /// A copy keeping only the fetch size and timeout.
    pub fn without_limits(&self) -> Self {
        Self {
            first_row: None,
            max_rows: None,
            fetch_size: self.fetch_size,
            timeout: self.timeout,
        }
    }
}
