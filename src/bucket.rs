// Time bucketing: turns a row's date into the period key it aggregates under.
use crate::error::{PipelineError, Result};
use crate::types::{Cell, Granularity, Row};
use crate::util::{date_from_serial, parse_date_safe};
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Time bucket a row belongs to. Ordering follows the calendar, which for
/// a single granularity matches the lexical order of the rendered keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    /// Single bucket used when no time granularity is selected.
    All,
    Year(i32),
    Quarter { year: i32, quarter: u32 },
    /// `month` is 1-based.
    Month { year: i32, month: u32 },
}

impl BucketKey {
    pub fn from_date(date: NaiveDate, granularity: Granularity) -> Self {
        let year = date.year();
        let month0 = date.month0();
        match granularity {
            Granularity::All => BucketKey::All,
            Granularity::Year => BucketKey::Year(year),
            Granularity::Quarter => BucketKey::Quarter {
                year,
                quarter: month0 / 3 + 1,
            },
            Granularity::Month => BucketKey::Month {
                year,
                month: month0 + 1,
            },
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::All => f.write_str("All"),
            BucketKey::Year(y) => write!(f, "{}", y),
            BucketKey::Quarter { year, quarter } => write!(f, "{}Q{}", year, quarter),
            BucketKey::Month { year, month } => write!(f, "{}-{:02}", year, month),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BucketKey::Year(y) => serializer.serialize_i32(*y),
            other => serializer.collect_str(other),
        }
    }
}

/// Read the date of a row. Text goes through the date parser; numbers are
/// spreadsheet serial days.
pub fn row_date(row: &Row, date_field: &str) -> Result<NaiveDate> {
    let cell = row.get(date_field);
    let parsed = match cell {
        Some(Cell::Text(s)) => parse_date_safe(Some(s)),
        Some(Cell::Number(n)) => date_from_serial(*n),
        None => None,
    };
    parsed.ok_or_else(|| PipelineError::InvalidDate {
        field: date_field.to_string(),
        value: cell.map(|c| c.to_string()),
    })
}

/// Bucket key of a row, or `InvalidDate` when its date is missing or
/// unparsable. Callers skip such rows.
pub fn bucket_key(row: &Row, date_field: &str, granularity: Granularity) -> Result<BucketKey> {
    row_date(row, date_field).map(|d| BucketKey::from_date(d, granularity))
}

/// Sorted, de-duplicated bucket keys of every row with a valid date. This is
/// the list window indices refer to.
pub fn ordered_keys(rows: &[Row], date_field: &str, granularity: Granularity) -> Vec<BucketKey> {
    rows.iter()
        .filter_map(|r| bucket_key(r, date_field, granularity).ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
