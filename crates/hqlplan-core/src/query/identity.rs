//! Identity-based set of result rows.

use std::collections::HashSet;

use crate::value::{ResultRow, RowIdentity};

/// Tracks which row allocations have been seen.
///
/// Rows without identity (scalars) are never considered duplicates.
#[derive(Debug, Default)]
pub struct IdentitySet {
    seen: HashSet<RowIdentity>,
}

impl IdentitySet {
    /// Create a set sized for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record a row; returns `false` if the same allocation was seen before.
    pub fn insert(&mut self, row: &ResultRow) -> bool {
        match row.identity() {
            Some(identity) => self.seen.insert(identity),
            None => true,
        }
    }

    /// Number of distinct identities recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
