// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The marker used by the poll for "not answered" or "not applicable".
pub const SENTINEL: &str = ".";

/// The name of the weight column when none is given.
pub const DEFAULT_WEIGHT_COLUMN: &str = "weight";

/// All the possible states of a categorical cell.
///
/// In most cases, it is enough to use the higher-level builder API, which
/// maps raw strings to answers.
#[derive(Eq, PartialEq, Debug, Clone, Hash, PartialOrd, Ord)]
pub enum Answer {
    /// An actual answer given by the respondent.
    Value(String),
    /// The sentinel `.`: the question was not answered or did not apply.
    Skipped,
    /// An empty cell.
    Blank,
}

impl Answer {
    pub fn parse(s: &str) -> Answer {
        match s {
            "" => Answer::Blank,
            SENTINEL => Answer::Skipped,
            x => Answer::Value(x.to_string()),
        }
    }

    /// The category this answer counts toward, if any.
    pub fn category(&self) -> Option<&str> {
        match self {
            Answer::Value(s) => Some(s.as_str()),
            Answer::Skipped | Answer::Blank => None,
        }
    }

    /// The text of the cell as it appeared in the dataset.
    /// Blank cells have no text and never match a filter.
    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Value(s) => Some(s.as_str()),
            Answer::Skipped => Some(SENTINEL),
            Answer::Blank => None,
        }
    }
}

// ******** Output data structures *********

/// The order of the entries of a distribution.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DistributionOrder {
    /// Largest value first. Ties keep the lexical order of the categories.
    Descending,
    /// Order in which the categories first appear in the table.
    FirstSeen,
    /// Lexical order of the categories.
    Lexical,
}

/// A sequence of (category, value) pairs, ready to be charted.
///
/// The values are percentages or weighted sums depending on the function that
/// produced the distribution. An empty distribution means "insufficient data".
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Distribution {
    pub(crate) entries: Vec<(String, f64)>,
}

impl Distribution {
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, f64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| *v)
    }

    pub fn categories(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| c.clone()).collect()
    }

    /// The sum of all the values.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| *v).sum()
    }
}

impl<'a> IntoIterator for &'a Distribution {
    type Item = &'a (String, f64);
    type IntoIter = std::slice::Iter<'a, (String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One row of a cross-tabulation.
#[derive(PartialEq, Debug, Clone)]
pub struct CrossTabRow {
    pub value: String,
    /// The total weight (or count) behind this row.
    pub total: f64,
    /// One cell per column of the cross-tabulation, in the same order.
    /// `None` when the row has no weight at all.
    pub cells: Vec<Option<f64>>,
}

impl CrossTabRow {
    pub fn is_defined(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }
}

/// A row-normalized cross-tabulation between two categorical columns.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CrossTab {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<CrossTabRow>,
}

impl CrossTab {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[CrossTabRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, value: &str) -> Option<&CrossTabRow> {
        self.rows.iter().find(|r| r.value == value)
    }

    /// The percentage in a given cell.
    /// Returns None if the cell does not exist or if its row is undefined.
    pub fn percent(&self, row: &str, column: &str) -> Option<f64> {
        let col_idx = self.columns.iter().position(|c| c == column)?;
        self.row(row).and_then(|r| r.cells[col_idx])
    }

    /// The values of one column for every row, in row order.
    /// Returns None if the column was never observed.
    pub fn column_series(&self, column: &str) -> Option<Vec<(String, Option<f64>)>> {
        let col_idx = self.columns.iter().position(|c| c == column)?;
        Some(
            self.rows
                .iter()
                .map(|r| (r.value.clone(), r.cells[col_idx]))
                .collect(),
        )
    }
}

/// The outcome of asking for awareness of one item.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct AwarenessSplit {
    pub yes: f64,
    pub no: f64,
}

// ******** Errors *********

/// The reasons why an aggregation has nothing to show.
///
/// These are expected conditions, not faults: the plain aggregation functions
/// turn all of them into an empty result.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum InsufficientData {
    AbsentColumn(String),
    /// No row left after excluding missing answers, or no weight at all.
    EmptyPopulation,
}

impl Error for InsufficientData {}

impl Display for InsufficientData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsufficientData::AbsentColumn(c) => write!(f, "column {:?} not found", c),
            InsufficientData::EmptyPopulation => write!(f, "no respondents to tabulate"),
        }
    }
}

/// Errors while assembling a table.
#[derive(PartialEq, Debug, Clone)]
pub enum TableError {
    DuplicateColumn(String),
    RowLength { expected: usize, found: usize },
    InvalidWeight { row: usize, weight: f64 },
}

impl Error for TableError {}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::DuplicateColumn(c) => write!(f, "duplicate column {:?}", c),
            TableError::RowLength { expected, found } => {
                write!(f, "expected {} values in row, found {}", expected, found)
            }
            TableError::InvalidWeight { row, weight } => {
                write!(f, "row {}: invalid weight {}", row, weight)
            }
        }
    }
}
