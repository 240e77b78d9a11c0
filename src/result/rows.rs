use std::collections::HashMap;

use crate::core::{DbError, Result, Row, Value};

/// Scan destination for one column of the current row.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Slot {
    /// The column's value is read and dropped.
    #[default]
    Discard,
    /// Placeholder waiting for a value.
    Empty,
    Filled(Value),
}

impl Slot {
    /// Takes the scanned value out, leaving the slot empty.
    pub fn take(&mut self) -> Option<Value> {
        match std::mem::replace(self, Slot::Empty) {
            Slot::Filled(value) => Some(value),
            Slot::Discard => {
                *self = Slot::Discard;
                None
            }
            Slot::Empty => None,
        }
    }
}

/// Result set of a query: ordered column names and rows consumed once, in
/// order, through [`Rows::advance`] and [`Rows::scan`].
#[derive(Debug)]
pub struct Rows {
    columns: Vec<String>,
    pending: std::vec::IntoIter<Row>,
    current: Option<Row>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            pending: rows.into_iter(),
            current: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column name to index. Duplicate names resolve to the last column
    /// carrying that name.
    pub fn column_index(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect()
    }

    /// Rows not yet advanced to.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Moves to the next row. Returns `false` once the result set is exhausted.
    pub fn advance(&mut self) -> bool {
        self.current = self.pending.next();
        self.current.is_some()
    }

    /// Copies the current row into `slots`, one slot per column.
    pub fn scan(&mut self, slots: &mut [Slot]) -> Result<()> {
        if slots.len() != self.columns.len() {
            return Err(DbError::ScanError(format!(
                "expected {} destination arguments in scan, not {}",
                self.columns.len(),
                slots.len()
            )));
        }

        let row = self.current.take().ok_or_else(|| {
            DbError::ScanError("scan called without a current row".into())
        })?;

        if row.len() != slots.len() {
            return Err(DbError::ScanError(format!(
                "row has {} values for {} columns",
                row.len(),
                slots.len()
            )));
        }

        for (slot, value) in slots.iter_mut().zip(row) {
            if !matches!(slot, Slot::Discard) {
                *slot = Slot::Filled(value);
            }
        }

        Ok(())
    }
}
