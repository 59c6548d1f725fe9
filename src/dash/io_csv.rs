// Primitives for reading CSV files.

use crate::dash::{
    io_common::{find_columns, parse_record, LoadedTable},
    *,
};

pub fn read_csv_records(input: &InputSettings) -> DashResult<LoadedTable> {
    let path = input.path.as_str();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.trim_start_matches('\u{feff}').to_string())
        .collect();
    debug!("read_csv_records: header: {:?}", header);
    let cols = find_columns(&header, &input.sentiment_column, path)?;

    let mut records: Vec<Record> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<&str> = line.iter().collect();
        debug!("read_csv_records: lineno: {:?} row: {:?}", lineno, &cells);
        records.push(parse_record(lineno, &cells, &cols)?);
    }

    Ok(LoadedTable {
        records,
        column_count: header.len() as u64,
        has_representative_word: cols.has_representative_word(),
    })
}
