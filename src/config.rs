// Per-view pipeline configuration.
//
// Each consuming view differs only in which columns it ignores and whether
// it splits buckets by a secondary dimension. Those differences are data,
// passed into the one pipeline.
use crate::error::Result;
use crate::types::{Granularity, MappingMode, Window};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_date_field() -> String {
    "Week".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    #[serde(default = "default_date_field")]
    pub date_field: String,
    #[serde(default)]
    pub excluded_columns: Vec<String>,
    #[serde(default)]
    pub secondary_dimension: Option<String>,
    /// Overview only: column holding the observed series.
    #[serde(default)]
    pub actual_field: Option<String>,
    /// Overview only: column holding the predicted series.
    #[serde(default)]
    pub predicted_field: Option<String>,
}

impl ViewConfig {
    fn base(name: &str) -> Self {
        Self {
            name: name.to_string(),
            date_field: default_date_field(),
            excluded_columns: Vec::new(),
            secondary_dimension: None,
            actual_field: None,
            predicted_field: None,
        }
    }

    /// Share of each activity over the selected period.
    pub fn activity() -> Self {
        Self {
            excluded_columns: vec!["Actual Rx".into(), "Predicted Rx".into()],
            ..Self::base("activity")
        }
    }

    /// Activity totals per segment.
    pub fn segment() -> Self {
        Self {
            excluded_columns: vec!["Actual Rx".into(), "Predicted Rx".into(), "HCP".into()],
            secondary_dimension: Some("Segment".into()),
            ..Self::base("segment")
        }
    }

    /// Actual vs. predicted weekly series.
    pub fn overview() -> Self {
        Self {
            actual_field: Some("Actual Rx".into()),
            predicted_field: Some("Predicted Rx".into()),
            ..Self::base("overview")
        }
    }

    /// Column names compare with surrounding whitespace ignored, the same
    /// way metric names are trimmed before they become keys.
    pub fn is_excluded(&self, field: &str) -> bool {
        let field = field.trim();
        self.excluded_columns.iter().any(|c| c.trim() == field)
    }

    /// Fields that never become metrics: the date, the dimension and the
    /// excluded columns.
    pub fn is_structural(&self, field: &str) -> bool {
        let field = field.trim();
        field == self.date_field.trim()
            || self.secondary_dimension.as_deref().map(str::trim) == Some(field)
            || self.is_excluded(field)
    }
}

/// The three views the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Views {
    /// Granularity selected when the dataset is first loaded.
    #[serde(default = "Views::default_granularity")]
    pub default_granularity: Granularity,
    pub activity: ViewConfig,
    pub segment: ViewConfig,
    pub overview: ViewConfig,
}

impl Default for Views {
    fn default() -> Self {
        Self {
            default_granularity: Views::default_granularity(),
            activity: ViewConfig::activity(),
            segment: ViewConfig::segment(),
            overview: ViewConfig::overview(),
        }
    }
}

impl Views {
    fn default_granularity() -> Granularity {
        Granularity::All
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&s)?)
    }
}

/// What the user currently has selected. Any change triggers a full
/// recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub granularity: Granularity,
    pub mapping_mode: MappingMode,
    pub window: Option<Window>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            granularity: Granularity::All,
            mapping_mode: MappingMode::Identity,
            window: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_configuration() {
        let seg = ViewConfig::segment();
        assert!(seg.is_structural("Segment"));
        assert!(seg.is_structural("HCP"));
        assert!(seg.is_structural("Week"));
        let act = ViewConfig::activity();
        assert!(!act.is_structural("HCP"));
        assert!(act.is_structural("Actual Rx"));
    }

    #[test]
    fn padded_headers_match_configured_names() {
        let seg = ViewConfig::segment();
        assert!(seg.is_excluded("Actual Rx "));
        assert!(seg.is_structural(" HCP"));
        assert!(seg.is_structural("Segment "));
        assert!(seg.is_structural(" Week "));
        assert!(!seg.is_structural(" A "));
    }

    #[test]
    fn default_granularity_falls_back_to_all() {
        let json = r#"{
            "activity": {"name": "activity"},
            "segment": {"name": "segment"},
            "overview": {"name": "overview"}
        }"#;
        let views: Views = serde_json::from_str(json).unwrap();
        assert_eq!(views.default_granularity, Granularity::All);
    }

    #[test]
    fn views_deserialize_with_defaults() {
        let json = r#"{
            "default_granularity": "quarter",
            "activity": {"name": "activity", "excluded_columns": ["Actual Rx"]},
            "segment": {"name": "segment", "secondary_dimension": "Region"},
            "overview": {"name": "overview", "date_field": "Date", "actual_field": "Sales"}
        }"#;
        let views: Views = serde_json::from_str(json).unwrap();
        assert_eq!(views.activity.date_field, "Week");
        assert_eq!(views.default_granularity, Granularity::Quarter);
        assert_eq!(views.segment.secondary_dimension.as_deref(), Some("Region"));
        assert_eq!(views.overview.date_field, "Date");
        assert_eq!(views.overview.predicted_field, None);
    }
}
