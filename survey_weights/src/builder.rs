use log::debug;

use std::collections::HashSet;

pub use crate::config::*;
use crate::table::{Response, Table};

/// A builder for assembling a table of respondents.
///
/// ```
/// use survey_weights::builder::TableBuilder;
/// # use survey_weights::TableError;
///
/// let mut builder = TableBuilder::weighted(&["cidade", "sexo"], "weight")?;
///
/// builder.add_row(&["Aracaju", "F"], Some(1.5))?;
/// builder.add_row(&["Lagarto", "."], Some(0.5))?;
///
/// let table = builder.build();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.total_weight(), 2.0);
///
/// # Ok::<(), TableError>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _weight_column: Option<String>,
    pub(crate) _rows: Vec<Response>,
}

pub type TableBuilder = Builder;

impl Builder {
    /// A builder for a table without sample weights.
    pub fn new(columns: &[&str]) -> Result<Builder, TableError> {
        Builder::create(columns, None)
    }

    /// A builder for a table whose rows carry a weight.
    /// The weight column must not be listed among the categorical columns.
    pub fn weighted(columns: &[&str], weight_column: &str) -> Result<Builder, TableError> {
        Builder::create(columns, Some(weight_column.to_string()))
    }

    fn create(columns: &[&str], weight_column: Option<String>) -> Result<Builder, TableError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for c in columns.iter().chain(weight_column.as_deref().iter()) {
            if !seen.insert(*c) {
                return Err(TableError::DuplicateColumn(c.to_string()));
            }
        }
        Ok(Builder {
            _columns: columns.iter().map(|c| c.to_string()).collect(),
            _weight_column: weight_column,
            _rows: Vec::new(),
        })
    }

    /// Adds a row from the raw text of its cells.
    ///
    /// Empty strings become blank answers and `.` becomes a skipped answer.
    /// A missing weight counts as zero. The weight is ignored for unweighted
    /// tables.
    pub fn add_row(&mut self, values: &[&str], weight: Option<f64>) -> Result<(), TableError> {
        let answers: Vec<Answer> = values.iter().map(|s| Answer::parse(s)).collect();
        self.add_answers(answers, weight)
    }

    pub fn add_answers(
        &mut self,
        answers: Vec<Answer>,
        weight: Option<f64>,
    ) -> Result<(), TableError> {
        if answers.len() != self._columns.len() {
            return Err(TableError::RowLength {
                expected: self._columns.len(),
                found: answers.len(),
            });
        }
        let weight = match (&self._weight_column, weight) {
            (None, Some(w)) => {
                debug!("add_answers: unweighted table, ignoring weight {}", w);
                0.0
            }
            (None, None) => 0.0,
            (Some(_), None) => 0.0,
            (Some(_), Some(w)) if w.is_finite() && w >= 0.0 => w,
            (Some(_), Some(w)) => {
                return Err(TableError::InvalidWeight {
                    row: self._rows.len(),
                    weight: w,
                });
            }
        };
        self._rows.push(Response { answers, weight });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self._rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self._rows.is_empty()
    }

    pub fn build(self) -> Table {
        Table {
            columns: self._columns,
            weight_column: self._weight_column,
            rows: self._rows,
        }
    }
}
