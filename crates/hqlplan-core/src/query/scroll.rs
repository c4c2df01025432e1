//! Scrollable result cursors.

use std::fmt;

use crate::error::{QueryError, Result};
use crate::value::ResultRow;

/// A bidirectional cursor over query results.
///
/// A fresh cursor is positioned before the first row. Movement methods
/// return whether the cursor now rests on a row.
pub trait ScrollableResults: Send + fmt::Debug {
    /// Advance to the next row.
    fn next(&mut self) -> Result<bool>;

    /// Move back to the previous row.
    fn previous(&mut self) -> Result<bool>;

    /// Move by a relative number of rows.
    fn scroll(&mut self, offset: i64) -> Result<bool>;

    /// Move to the first row.
    fn first(&mut self) -> Result<bool>;

    /// Move to the last row.
    fn last(&mut self) -> Result<bool>;

    /// The row under the cursor.
    fn get(&self) -> Option<&ResultRow>;

    /// Zero-based index of the row under the cursor.
    fn row_number(&self) -> Option<usize>;

    /// Release the cursor.
    fn close(&mut self);

    /// Check if the cursor was closed.
    fn is_closed(&self) -> bool;
}

/// Cursor over a fully buffered result list.
#[derive(Debug)]
pub struct VecScrollableResults {
    rows: Vec<ResultRow>,
    /// -1 before the first row, `rows.len()` after the last.
    position: i64,
    closed: bool,
}

impl VecScrollableResults {
    /// Create a cursor positioned before the first row.
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self {
            rows,
            position: -1,
            closed: false,
        }
    }

    fn move_to(&mut self, position: i64) -> Result<bool> {
        if self.closed {
            return Err(QueryError::ResultsClosed.into());
        }
        self.position = position.clamp(-1, self.rows.len() as i64);
        Ok(self.on_row())
    }

    fn on_row(&self) -> bool {
        self.position >= 0 && (self.position as usize) < self.rows.len()
    }
}

impl ScrollableResults for VecScrollableResults {
    fn next(&mut self) -> Result<bool> {
        self.move_to(self.position + 1)
    }

    fn previous(&mut self) -> Result<bool> {
        self.move_to(self.position - 1)
    }

    fn scroll(&mut self, offset: i64) -> Result<bool> {
        self.move_to(self.position.saturating_add(offset))
    }

    fn first(&mut self) -> Result<bool> {
        self.move_to(0)
    }

    fn last(&mut self) -> Result<bool> {
        self.move_to(self.rows.len() as i64 - 1)
    }

    fn get(&self) -> Option<&ResultRow> {
        if self.closed || !self.on_row() {
            return None;
        }
        self.rows.get(self.position as usize)
    }

    fn row_number(&self) -> Option<usize> {
        self.get().map(|_| self.position as usize)
    }

    fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
