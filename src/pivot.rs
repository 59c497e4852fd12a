// Reshape aggregated sums for the views: a bucket-by-metric pivot for the
// distribution view and flat per-bucket-per-group records for grouped views.
use crate::aggregate::{Aggregate, MetricSums};
use crate::bucket::BucketKey;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub row: String,
    pub data: Vec<f64>,
}

/// Columns are bucket keys in ascending order; each row holds one metric's
/// value per column, 0 where the bucket never saw it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    pub columns: Vec<BucketKey>,
    #[serde(rename = "pivotedData")]
    pub pivoted_data: Vec<PivotRow>,
}

impl PivotTable {
    pub fn column_index(&self, column: &BucketKey) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: &str, column: &BucketKey) -> f64 {
        let Some(idx) = self.column_index(column) else { return 0.0 };
        self.pivoted_data
            .iter()
            .find(|r| r.row == row)
            .and_then(|r| r.data.get(idx).copied())
            .unwrap_or(0.0)
    }

    /// Sum of each row across all columns, in row order.
    pub fn row_totals(&self) -> Vec<(String, f64)> {
        self.pivoted_data
            .iter()
            .map(|r| (r.row.clone(), r.data.iter().sum()))
            .collect()
    }
}

/// Pivot an aggregate. Grouped buckets are folded together per time bucket.
/// Row order is first appearance when walking the columns in order.
pub fn pivot(agg: &Aggregate) -> PivotTable {
    let mut by_bucket: BTreeMap<&BucketKey, MetricSums> = BTreeMap::new();
    for (key, sums) in &agg.buckets {
        let merged = by_bucket.entry(&key.bucket).or_default();
        for (metric, v) in sums {
            *merged.entry(metric.clone()).or_insert(0.0) += v;
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut rows: Vec<&str> = Vec::new();
    for sums in by_bucket.values() {
        for metric in sums.keys() {
            if seen.insert(metric.as_str()) {
                rows.push(metric.as_str());
            }
        }
    }

    let pivoted_data = rows
        .iter()
        .map(|row| PivotRow {
            row: row.to_string(),
            data: by_bucket
                .values()
                .map(|sums| sums.get(*row).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    PivotTable {
        columns: by_bucket.keys().map(|k| (*k).clone()).collect(),
        pivoted_data,
    }
}

/// One bucket/group cell of a grouped view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRecord {
    #[serde(rename = "Time")]
    pub time: BucketKey,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(flatten)]
    pub metrics: MetricSums,
}

/// Flatten an aggregate into records sorted by time, then group. Ungrouped
/// buckets get an empty group.
pub fn table_rows(agg: &Aggregate) -> Vec<GroupedRecord> {
    // BTreeMap iteration already yields (bucket, group) ascending.
    agg.buckets
        .iter()
        .map(|(key, sums)| GroupedRecord {
            time: key.bucket.clone(),
            group: key.group.clone().unwrap_or_default(),
            metrics: sums.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::config::ViewConfig;
    use crate::types::{Granularity, Row};

    fn q(year: i32, quarter: u32) -> BucketKey {
        BucketKey::Quarter { year, quarter }
    }

    #[test]
    fn pivot_unions_metrics_and_fills_zero() {
        let rows = vec![
            Row::new().with("Week", "2023-04-03").with("B", 2.0),
            Row::new().with("Week", "2023-01-05").with("A", 1.0),
            Row::new().with("Week", "2023-01-06").with("C", 3.0),
        ];
        let (agg, _) = aggregate(&rows, &ViewConfig::activity(), Granularity::Quarter);
        let p = pivot(&agg);
        assert_eq!(p.columns, vec![q(2023, 1), q(2023, 2)]);
        let names: Vec<&str> = p.pivoted_data.iter().map(|r| r.row.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
        assert_eq!(p.cell("B", &q(2023, 1)), 0.0);
        assert_eq!(p.cell("B", &q(2023, 2)), 2.0);
        assert_eq!(p.cell("Z", &q(2023, 2)), 0.0);
    }

    #[test]
    fn pivot_folds_groups_per_bucket() {
        let rows = vec![
            Row::new().with("Week", "2023-01-05").with("Segment", "Hi").with("A", 1.0),
            Row::new().with("Week", "2023-01-05").with("Segment", "Lo").with("A", 2.0),
        ];
        let (agg, _) = aggregate(&rows, &ViewConfig::segment(), Granularity::Year);
        let p = pivot(&agg);
        assert_eq!(p.columns, vec![BucketKey::Year(2023)]);
        assert_eq!(p.row_totals(), vec![("A".to_string(), 3.0)]);
    }

    #[test]
    fn table_rows_sort_by_time_then_group() {
        let rows = vec![
            Row::new().with("Week", "2023-04-05").with("Segment", "A").with("X", 1.0),
            Row::new().with("Week", "2023-01-05").with("Segment", "B").with("X", 2.0),
            Row::new().with("Week", "2023-01-05").with("Segment", "A").with("X", 3.0),
        ];
        let (agg, _) = aggregate(&rows, &ViewConfig::segment(), Granularity::Quarter);
        let order: Vec<(String, String)> = table_rows(&agg)
            .into_iter()
            .map(|r| (r.time.to_string(), r.group))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2023Q1".to_string(), "A".to_string()),
                ("2023Q1".to_string(), "B".to_string()),
                ("2023Q2".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn grouped_record_serializes_flat() {
        let rec = GroupedRecord {
            time: q(2023, 1),
            group: "Hi".into(),
            metrics: [("A".to_string(), 3.0)].into_iter().collect(),
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"Time":"2023Q1","Group":"Hi","A":3.0}"#);
    }
}
