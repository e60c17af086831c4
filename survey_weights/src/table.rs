use std::collections::BTreeSet;

use crate::config::*;

/// The position of a categorical column in a table.
///
/// Only obtained through [`Table::column`], so it is always valid for the
/// table it came from and for every table filtered from it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ColumnId(pub(crate) usize);

/// The answers of one respondent.
#[derive(PartialEq, Debug, Clone)]
pub struct Response {
    pub(crate) answers: Vec<Answer>,
    // Always 0 for unweighted tables.
    pub(crate) weight: f64,
}

impl Response {
    /// The answer in the given column.
    ///
    /// # Panics
    ///
    /// If `column` was obtained from a table with more columns than the one
    /// holding this row. Use [`Response::get`] when that may happen.
    pub fn answer(&self, column: ColumnId) -> &Answer {
        &self.answers[column.0]
    }

    pub fn get(&self, column: ColumnId) -> Option<&Answer> {
        self.answers.get(column.0)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// A read-only table of respondents.
///
/// The schema (the categorical columns and the optional weight column) is
/// fixed when the table is built. Filtering produces new tables that share the
/// same schema.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) weight_column: Option<String>,
    pub(crate) rows: Vec<Response>,
}

impl Table {
    /// A table with the same schema and no rows.
    pub fn empty_like(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            weight_column: self.weight_column.clone(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn with_rows(&self, rows: Vec<Response>) -> Table {
        Table {
            columns: self.columns.clone(),
            weight_column: self.weight_column.clone(),
            rows,
        }
    }

    /// Looks up a categorical column. The weight column is not categorical.
    pub fn column(&self, name: &str) -> Option<ColumnId> {
        self.columns.iter().position(|c| c == name).map(ColumnId)
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<ColumnId, InsufficientData> {
        self.column(name)
            .ok_or_else(|| InsufficientData::AbsentColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn weight_column(&self) -> Option<&str> {
        self.weight_column.as_deref()
    }

    pub fn is_weighted(&self) -> bool {
        self.weight_column.is_some()
    }

    pub fn rows(&self) -> &[Response] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The sum of the weights of all the rows (0 for unweighted tables).
    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }

    /// The distinct texts found in a column, sorted.
    ///
    /// These are the options offered to a user building a filter selection.
    /// Blank cells are not listed.
    pub fn distinct_values(&self, name: &str) -> Option<Vec<String>> {
        let cid = self.column(name)?;
        let values: BTreeSet<&str> = self
            .rows
            .iter()
            .filter_map(|r| r.answer(cid).text())
            .collect();
        Some(values.into_iter().map(|s| s.to_string()).collect())
    }
}
