// Primitives shared by the readers of respondent files.

use std::path::Path;

use survey_weights::builder::TableBuilder;

use crate::survey::*;

const MAX_LABEL_CHARS: usize = 30;
const SHORT_LABEL_CHARS: usize = 27;

/// The cells of a respondent file, before they are turned into a table.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Header cells, without the byte order mark that spreadsheet tools add at
/// the start of exported files.
pub fn clean_header(cell: &str) -> String {
    cell.trim_start_matches('\u{feff}').trim().to_string()
}

/// Reads a weight cell. Both `.` and `,` are accepted as decimal separator.
/// An empty cell has no weight.
pub fn parse_weight(cell: &str, lineno: usize) -> SurveyResult<Option<f64>> {
    let s = cell.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let normalized = s.replace(',', ".");
    let w = normalized
        .parse::<f64>()
        .ok()
        .context(InvalidWeightSnafu {
            lineno,
            content: cell,
        })?;
    Ok(Some(w))
}

/// Turns the raw cells into a table. The weight column, if present in the
/// header, provides the weights and is not an answer column.
pub fn build_table(raw: &RawTable, weight_column: &str, path: &str) -> SurveyResult<Table> {
    let file_name = simplify_file_name(path);
    let weight_idx = raw.header.iter().position(|h| h == weight_column);
    let answer_cols: Vec<&str> = raw
        .header
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != weight_idx)
        .map(|(_, h)| h.as_str())
        .collect();

    let mut builder = match weight_idx {
        Some(_) => TableBuilder::weighted(&answer_cols, weight_column),
        None => TableBuilder::new(&answer_cols),
    }
    .context(InvalidTableSnafu { path: &file_name })?;

    for (idx, row) in raw.rows.iter().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        if row.iter().all(|c| c.trim().is_empty()) {
            debug!("build_table: {}: skipping empty line {}", file_name, lineno);
            continue;
        }
        let cell = |i: usize| row.get(i).map(|s| s.as_str()).unwrap_or("");
        let weight = match weight_idx {
            Some(w_idx) => parse_weight(cell(w_idx), lineno)?,
            None => None,
        };
        let cells: Vec<&str> = (0..raw.header.len())
            .filter(|i| Some(*i) != weight_idx)
            .map(cell)
            .collect();
        builder
            .add_row(&cells, weight)
            .context(InvalidTableSnafu { path: &file_name })?;
    }
    Ok(builder.build())
}

/// A label for display: the part after the first `:` of a column name,
/// shortened when it is too long.
pub fn short_label(column: &str) -> String {
    let label = match column.split_once(':') {
        Some((_, rest)) => rest.trim(),
        None => column.trim(),
    };
    if label.chars().count() > MAX_LABEL_CHARS {
        let kept: String = label.chars().take(SHORT_LABEL_CHARS).collect();
        format!("{}...", kept)
    } else {
        label.to_string()
    }
}

/// The area of a column: the part before the first `:`, without the given
/// prefix. Column names without `:` are kept whole.
pub fn area_label(column: &str, strip_prefix: Option<&str>) -> String {
    let area = column.split(':').next().unwrap_or(column).trim();
    match strip_prefix {
        Some(prefix) => area.strip_prefix(prefix).unwrap_or(area).trim().to_string(),
        None => area.to_string(),
    }
}
