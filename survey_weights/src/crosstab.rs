use log::debug;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::*;
use crate::round2;
use crate::table::Table;

/// Computes the distribution of `col_column` within each answer of
/// `row_column`, weighted by the sample weights.
///
/// Respondents missing either answer are left out. Every row of the result
/// adds up to 100, except the rows whose respondents have no weight at all:
/// their cells are undefined (`None`) rather than zero.
///
/// Tables without a weight column fall back to counting respondents.
pub fn try_weighted_crosstab(
    table: &Table,
    row_column: &str,
    col_column: &str,
) -> Result<CrossTab, InsufficientData> {
    let row_cid = table.lookup(row_column)?;
    let col_cid = table.lookup(col_column)?;

    // (row value, column value) -> weight
    let mut cells: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    let mut row_values: BTreeSet<&str> = BTreeSet::new();
    let mut col_values: BTreeSet<&str> = BTreeSet::new();
    for r in table.rows.iter() {
        let (rv, cv) = match (r.answer(row_cid).category(), r.answer(col_cid).category()) {
            (Some(rv), Some(cv)) => (rv, cv),
            _ => continue,
        };
        let w = if table.is_weighted() { r.weight } else { 1.0 };
        *cells.entry((rv, cv)).or_insert(0.0) += w;
        row_values.insert(rv);
        col_values.insert(cv);
    }

    if row_values.is_empty() {
        debug!(
            "try_weighted_crosstab: no respondent answered both {:?} and {:?}",
            row_column, col_column
        );
        return Err(InsufficientData::EmptyPopulation);
    }

    let mut rows: Vec<CrossTabRow> = Vec::new();
    for rv in row_values.iter() {
        let weights: Vec<f64> = col_values
            .iter()
            .map(|cv| cells.get(&(*rv, *cv)).cloned().unwrap_or(0.0))
            .collect();
        let total: f64 = weights.iter().sum();
        let row_cells: Vec<Option<f64>> = if total == 0.0 {
            debug!("try_weighted_crosstab: row {:?} has no weight", rv);
            weights.iter().map(|_| None).collect()
        } else {
            weights
                .iter()
                .map(|w| Some(round2(w / total * 100.0)))
                .collect()
        };
        rows.push(CrossTabRow {
            value: rv.to_string(),
            total,
            cells: row_cells,
        });
    }

    Ok(CrossTab {
        columns: col_values.iter().map(|s| s.to_string()).collect(),
        rows,
    })
}

/// Same as [`try_weighted_crosstab`], returning an empty cross-tabulation
/// when there is nothing to tabulate.
pub fn weighted_crosstab(table: &Table, row_column: &str, col_column: &str) -> CrossTab {
    try_weighted_crosstab(table, row_column, col_column).unwrap_or_default()
}
