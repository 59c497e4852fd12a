use crate::error::Result;
use crate::types::{Cell, MappingRecord, Row};
use crate::util::parse_f64_safe;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

fn to_row(headers: &StringRecord, record: &StringRecord) -> Row {
    let mut row = Row::new();
    for (header, raw) in headers.iter().zip(record.iter()) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let cell = match parse_f64_safe(Some(raw)) {
            Some(n) => Cell::Number(n),
            None => Cell::Text(raw.to_string()),
        };
        row.insert(header, cell);
    }
    row
}

/// Read a data sheet exported as CSV. Numeric-looking cells become numbers,
/// blank cells are left out of the row.
pub fn load_rows<R: Read>(reader: R) -> Result<(Vec<Row>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    for result in rdr.records() {
        report.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "unreadable record");
                report.parse_errors += 1;
                continue;
            }
        };
        rows.push(to_row(&headers, &record));
    }

    report.loaded_rows = rows.len();
    info!(rows = report.loaded_rows, errors = report.parse_errors, "loaded data sheet");
    Ok((rows, report))
}

pub fn load_rows_from_path(path: impl AsRef<Path>) -> Result<(Vec<Row>, LoadReport)> {
    load_rows(std::fs::File::open(path)?)
}

/// Read the mapping sheet (`variable`, `Channel`, `Sub_Category`,
/// `Category`). Unreadable lines are skipped.
pub fn load_mapping<R: Read>(reader: R) -> Result<Vec<MappingRecord>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize::<MappingRecord>() {
        match result {
            Ok(r) => records.push(r),
            Err(e) => debug!(error = %e, "skipping mapping line"),
        }
    }
    info!(entries = records.len(), "loaded mapping sheet");
    Ok(records)
}

pub fn load_mapping_from_path(path: impl AsRef<Path>) -> Result<Vec<MappingRecord>> {
    load_mapping(std::fs::File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_typed_cells() {
        let data = "Week,A,B,Segment\n2023-01-05,10,\"1,500\",Hi\n2023-02-10,20,,Lo\n";
        let (rows, report) = load_rows(data.as_bytes()).unwrap();
        assert_eq!(report, LoadReport { total_rows: 2, loaded_rows: 2, parse_errors: 0 });
        assert_eq!(rows[0].number("B"), Some(1500.0));
        assert_eq!(rows[0].get("Week"), Some(&Cell::from("2023-01-05")));
        assert!(rows[1].get("B").is_none());
        assert_eq!(rows[1].get("Segment"), Some(&Cell::from("Lo")));
    }

    #[test]
    fn reads_mapping_with_blank_targets() {
        let data = "variable,Channel,Sub_Category,Category\nA,X,,Paid\nB,,Sub,\n";
        let records = load_mapping(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel.as_deref(), Some("X"));
        assert_eq!(records[1].channel, None);
        assert_eq!(records[1].sub_category.as_deref(), Some("Sub"));
    }
}
