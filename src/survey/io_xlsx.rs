use calamine::{open_workbook, DataType, Reader, Xlsx};
use chrono::Timelike;

use crate::survey::{
    io_common::{build_table, clean_header, RawTable},
    *,
};

pub fn read_excel_table(path: &str, source: &DataSource) -> SurveyResult<Table> {
    let wrange = get_range(path, source)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu {})?;
    let header: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, c)| header_name(&cell_text(c, 1), idx))
        .collect();
    debug!("read_excel_table: header: {:?}", header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        rows.push(row.iter().map(|c| cell_text(c, lineno)).collect());
    }
    build_table(&RawTable { header, rows }, source.weight_column(), path)
}

fn header_name(cell: &str, idx: usize) -> String {
    let name = clean_header(cell);
    if name.is_empty() {
        format!("column {}", idx + 1)
    } else {
        name
    }
}

fn number_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// The text of a spreadsheet cell. Numbers are written the way they would be
/// in a CSV export, dates as `YYYY-MM-DD` (with the time when there is one).
/// Error cells such as `#N/A` are blank.
fn cell_text(cell: &DataType, lineno: usize) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => number_text(*f),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(f) => match cell.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => number_text(*f),
        },
        DataType::Error(e) => {
            warn!("Line {}: error cell {:?} read as blank", lineno, e);
            String::new()
        }
    }
}

fn get_range(path: &str, source: &DataSource) -> SurveyResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, &source.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange_o = match &source.excel_worksheet_name {
        Some(worksheet_name) => workbook.worksheet_range(worksheet_name),
        None => workbook.worksheet_range_at(0),
    };
    let wrange = wrange_o
        .context(EmptyExcelSnafu {})?
        .context(OpeningExcelSnafu { path })?;
    Ok(wrange)
}
