//! Superseded snapshot rows kept for the lifetime of one tracking view.
//!
//! Only the latest shipment state is persisted as "current", so the states a
//! watcher saw in between would vanish on the next refresh. The buffer keeps
//! them, newest first, until the next lookup clears it.

use crate::timeline::ActivityRow;

pub const MAX_EPHEMERAL_ROWS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralBuffer {
    rows: Vec<ActivityRow>,
    capacity: usize,
}

impl Default for EphemeralBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemeralBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_EPHEMERAL_ROWS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Inserts `row` at the front unless an entry with the same key is
    /// already buffered. Returns whether the row was inserted.
    pub fn push(&mut self, row: ActivityRow) -> bool {
        let key = row.key();
        if self.rows.iter().any(|existing| existing.key() == key) {
            return false;
        }
        self.rows.insert(0, row);
        self.rows.truncate(self.capacity);
        true
    }

    /// Buffered rows, newest first.
    pub fn rows(&self) -> &[ActivityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
