// Primitives for reading CSV files.

use crate::survey::{
    io_common::{build_table, clean_header, RawTable},
    *,
};

pub fn read_csv_table(path: &str, source: &DataSource) -> SurveyResult<Table> {
    let raw = read_csv_cells(path, source.delimiter()?)?;
    debug!(
        "read_csv_table: {:?}: header: {:?} ({} lines)",
        path,
        raw.header,
        raw.rows.len()
    );
    build_table(&raw, source.weight_column(), path)
}

fn read_csv_cells(path: &str, delimiter: u8) -> SurveyResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(clean_header)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        rows.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(RawTable { header, rows })
}
