//! A small columnar table and transformation stages over it.
//!
//! Stages take and return `Arc<Table>` and never modify the table they
//! receive: every transformation builds a new table, so a caller holding the
//! original still sees it untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{StageError, StageResult};
use crate::stages::Stage;

/// Named numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: BTreeMap<String, Vec<f64>>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    /// Returns a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Returns the column names in sorted order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }

    fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values.iter().copied().map(&f).collect()))
            .collect();
        Self { columns }
    }
}

/// Keeps only the listed columns.
#[derive(Debug, Clone)]
pub struct SelectColumns {
    columns: Vec<String>,
}

impl SelectColumns {
    /// Creates a selector for `columns`.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Stage<Arc<Table>> for SelectColumns {
    fn name(&self) -> &str {
        "select_columns"
    }

    fn execute(&self, input: Arc<Table>) -> StageResult<Arc<Table>> {
        let mut selected = Table::new();
        for name in &self.columns {
            let values = input
                .column(name)
                .ok_or_else(|| StageError::failed("select_columns", format!("unknown column '{name}'")))?;
            selected.columns.insert(name.clone(), values.to_vec());
        }
        Ok(Arc::new(selected))
    }
}

/// Multiplies every value by a constant factor.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    factor: f64,
}

impl Scale {
    /// Creates a scaling stage.
    #[must_use]
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Stage<Arc<Table>> for Scale {
    fn name(&self) -> &str {
        "scale"
    }

    fn execute(&self, input: Arc<Table>) -> StageResult<Arc<Table>> {
        Ok(Arc::new(input.map_values(|v| v * self.factor)))
    }
}

/// Appends a row holding each column's total.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddTotalsRow;

impl Stage<Arc<Table>> for AddTotalsRow {
    fn name(&self) -> &str {
        "add_totals_row"
    }

    fn execute(&self, input: Arc<Table>) -> StageResult<Arc<Table>> {
        let columns = input
            .columns
            .iter()
            .map(|(name, values)| {
                let mut with_total = values.clone();
                with_total.push(values.iter().sum());
                (name.clone(), with_total)
            })
            .collect();
        Ok(Arc::new(Table { columns }))
    }
}
