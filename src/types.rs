use crate::error::PipelineError;
use crate::util::parse_f64_safe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// A single spreadsheet value. Loaders hand us either numbers or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric reading of the cell. Text counts as numeric only when it
    /// parses cleanly; non-finite numbers never do.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => parse_f64_safe(Some(s)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// One raw record: field name to value. Field names are kept exactly as the
/// loader produced them; trimming happens where names become metric keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Cell>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Cell>) {
        self.0.insert(field.into(), value.into());
    }

    /// Value of `field`. An exact name wins; otherwise a field whose name
    /// matches once surrounding whitespace is ignored.
    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.0.get(field).or_else(|| {
            let wanted = field.trim();
            self.0
                .iter()
                .find(|(name, _)| name.trim() == wanted)
                .map(|(_, cell)| cell)
        })
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Cell::as_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Cell)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Cell>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One line of the mapping sheet: a source variable and its target names
/// under each mapping dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    #[serde(rename = "variable")]
    pub variable: Option<String>,
    #[serde(rename = "Channel")]
    pub channel: Option<String>,
    #[serde(rename = "Sub_Category")]
    pub sub_category: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    All,
    Year,
    Quarter,
    #[serde(alias = "yyyymm")]
    Month,
}

impl FromStr for Granularity {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Granularity::All),
            "year" => Ok(Granularity::Year),
            "quarter" => Ok(Granularity::Quarter),
            "month" | "yyyymm" => Ok(Granularity::Month),
            _ => Err(PipelineError::UnknownGranularity(s.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::All => "all",
            Granularity::Year => "year",
            Granularity::Quarter => "quarter",
            Granularity::Month => "month",
        };
        f.write_str(s)
    }
}

/// Which mapping-sheet column re-keys metric columns before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingMode {
    #[serde(alias = "dev")]
    Identity,
    Channel,
    #[serde(alias = "sub_category")]
    SubCategory,
    Category,
}

impl MappingMode {
    /// Target column of a mapping record for this mode. `None` for identity.
    pub fn target<'a>(&self, record: &'a MappingRecord) -> Option<&'a str> {
        match self {
            MappingMode::Identity => None,
            MappingMode::Channel => record.channel.as_deref(),
            MappingMode::SubCategory => record.sub_category.as_deref(),
            MappingMode::Category => record.category.as_deref(),
        }
    }
}

impl FromStr for MappingMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "identity" | "dev" => Ok(MappingMode::Identity),
            "channel" => Ok(MappingMode::Channel),
            "subCategory" | "sub_category" => Ok(MappingMode::SubCategory),
            "category" => Ok(MappingMode::Category),
            _ => Err(PipelineError::UnknownMappingMode(s.to_string())),
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MappingMode::Identity => "identity",
            MappingMode::Channel => "channel",
            MappingMode::SubCategory => "subCategory",
            MappingMode::Category => "category",
        };
        f.write_str(s)
    }
}

/// Inclusive index range over the ordered bucket keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Window covering every key, or `None` when there are no keys.
    pub fn full(len: usize) -> Option<Self> {
        len.checked_sub(1).map(|end| Self { start: 0, end })
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

impl FromStr for Window {
    type Err = PipelineError;

    /// Accepts `start:end`, `start,end` or `start-end`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidWindow(s.to_string());
        let (a, b) = s
            .split_once([':', ',', '-'])
            .ok_or_else(invalid)?;
        let start = a.trim().parse::<usize>().map_err(|_| invalid())?;
        let end = b.trim().parse::<usize>().map_err(|_| invalid())?;
        Ok(Window { start, end })
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SliceRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OverviewRow {
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: String,
    #[serde(rename = "Bucket")]
    #[tabled(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "ActualRx")]
    #[tabled(rename = "ActualRx")]
    pub actual: String,
    #[serde(rename = "PredictedRx")]
    #[tabled(rename = "PredictedRx")]
    pub predicted: String,
}
