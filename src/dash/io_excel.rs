// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::dash::{
    io_common::{find_columns, parse_record, LoadedTable},
    *,
};

pub fn read_excel_records(input: &InputSettings) -> DashResult<LoadedTable> {
    let wrange = get_range(input)?;

    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu {})?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_excel_records: header: {:?}", header);
    let cols = find_columns(&header, &input.sentiment_column, &input.path)?;

    let mut records: Vec<Record> = Vec::new();
    for (idx, row) in rows.enumerate() {
        // The header is line 1, as displayed by the spreadsheet programs.
        let lineno = idx + 2;
        let cells_s: Vec<String> = row.iter().map(cell_to_string).collect();
        let cells: Vec<&str> = cells_s.iter().map(|s| s.as_str()).collect();
        debug!("read_excel_records: lineno: {:?} row: {:?}", lineno, &cells);
        records.push(parse_record(lineno, &cells, &cols)?);
    }

    Ok(LoadedTable {
        records,
        column_count: header.len() as u64,
        has_representative_word: cols.has_representative_word(),
    })
}

fn get_range(input: &InputSettings) -> DashResult<Range<DataType>> {
    let path = input.path.as_str();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange_o = match &input.excel_worksheet_name {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    };
    let wrange = wrange_o
        .context(EmptyExcelSnafu {})?
        .context(OpeningExcelSnafu { path })?;
    Ok(wrange)
}

// The cells are turned back into text so that all the readers share the same parsing rules.
fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(f) => excel_serial_to_datetime(*f)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_else(|| f.to_string()),
        DataType::Empty => "".to_string(),
        _ => {
            warn!("read_excel_records: could not understand cell {:?}", cell);
            "".to_string()
        }
    }
}

/// Converts an Excel date (days since 1899-12-30, as used by the 1900 date system).
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    Some(epoch + Duration::milliseconds(millis))
}
