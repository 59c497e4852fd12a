// Range filtering over the ordered bucket keys.
use crate::aggregate::MetricSums;
use crate::bucket::BucketKey;
use crate::pivot::{GroupedRecord, PivotRow, PivotTable};
use crate::types::{Granularity, Window};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// The set of buckets a window selects. `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowScope {
    keys: Option<HashSet<BucketKey>>,
}

impl WindowScope {
    pub fn everything() -> Self {
        Self { keys: None }
    }

    /// Resolve a window against `ordered_keys`. The `all` granularity and an
    /// absent window select everything; otherwise a key is selected when its
    /// index falls inside the inclusive window. An inverted or out-of-range
    /// window selects nothing.
    pub fn new(ordered_keys: &[BucketKey], granularity: Granularity, window: Option<Window>) -> Self {
        let Some(window) = window else { return Self::everything() };
        if granularity == Granularity::All {
            return Self::everything();
        }
        let keys = ordered_keys
            .iter()
            .enumerate()
            .filter(|(i, _)| window.contains(*i))
            .map(|(_, k)| k.clone())
            .collect();
        Self { keys: Some(keys) }
    }

    pub fn includes(&self, key: &BucketKey) -> bool {
        match &self.keys {
            None => true,
            Some(keys) => keys.contains(key),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.keys.is_none()
    }
}

/// Keep only the selected columns of a pivot table.
pub fn filter_pivot(pivot: &PivotTable, scope: &WindowScope) -> PivotTable {
    let keep: Vec<usize> = pivot
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| scope.includes(c))
        .map(|(i, _)| i)
        .collect();
    PivotTable {
        columns: keep.iter().map(|&i| pivot.columns[i].clone()).collect(),
        pivoted_data: pivot
            .pivoted_data
            .iter()
            .map(|r| PivotRow {
                row: r.row.clone(),
                data: keep.iter().map(|&i| r.data.get(i).copied().unwrap_or(0.0)).collect(),
            })
            .collect(),
    }
}

/// Per-metric totals over the selected columns. Every pivot row is kept,
/// even when its total is 0.
pub fn window_totals(pivot: &PivotTable, scope: &WindowScope) -> Vec<(String, f64)> {
    filter_pivot(pivot, scope).row_totals()
}

pub fn filter_records(records: &[GroupedRecord], scope: &WindowScope) -> Vec<GroupedRecord> {
    records
        .iter()
        .filter(|r| scope.includes(&r.time))
        .cloned()
        .collect()
}

/// Totals of one group across the selected period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotals {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(flatten)]
    pub metrics: MetricSums,
}

impl GroupTotals {
    pub fn total(&self) -> f64 {
        self.metrics.values().sum()
    }
}

/// Second aggregation pass: sum every metric per group across buckets.
/// Groups come out in ascending order.
pub fn regroup(records: &[GroupedRecord]) -> Vec<GroupTotals> {
    let mut by_group: BTreeMap<&str, MetricSums> = BTreeMap::new();
    for rec in records {
        let sums = by_group.entry(rec.group.as_str()).or_default();
        for (metric, v) in &rec.metrics {
            *sums.entry(metric.clone()).or_insert(0.0) += v;
        }
    }
    by_group
        .into_iter()
        .map(|(group, metrics)| GroupTotals {
            group: group.to_string(),
            metrics,
        })
        .collect()
}

pub fn filter_grouped(records: &[GroupedRecord], scope: &WindowScope) -> Vec<GroupTotals> {
    regroup(&filter_records(records, scope))
}
