use crate::bucket::{bucket_key, BucketKey};
use crate::config::ViewConfig;
use crate::types::{Cell, Granularity, Row};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Bucket identity: time bucket plus, for grouped views, the secondary
/// dimension value. Compared structurally, never flattened into a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub bucket: BucketKey,
    pub group: Option<String>,
}

pub type MetricSums = BTreeMap<String, f64>;

/// Per-bucket running sums, ordered by bucket then group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub buckets: BTreeMap<GroupKey, MetricSums>,
}

impl Aggregate {
    pub fn get(&self, bucket: &BucketKey, group: Option<&str>) -> Option<&MetricSums> {
        self.buckets.get(&GroupKey {
            bucket: bucket.clone(),
            group: group.map(str::to_string),
        })
    }

}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub total_rows: usize,
    pub aggregated_rows: usize,
    pub skipped_rows: usize,
}

/// Group value used when a row lacks the secondary dimension.
pub const UNKNOWN_GROUP: &str = "Unknown";

fn group_value(row: &Row, field: &str) -> String {
    match row.get(field) {
        Some(Cell::Text(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Cell::Number(n)) => n.to_string(),
        _ => UNKNOWN_GROUP.to_string(),
    }
}

/// Fold rows into per-bucket metric sums. Every call starts from scratch.
///
/// - Rows with a missing or unparsable date are skipped and counted.
/// - Metric names are trimmed, so `" A"` and `"A"` share one sum.
/// - Non-numeric values are ignored; a metric with no numeric contribution
///   in a bucket is absent from it.
pub fn aggregate(rows: &[Row], view: &ViewConfig, granularity: Granularity) -> (Aggregate, AggregateReport) {
    let mut out = Aggregate::default();
    let mut report = AggregateReport {
        total_rows: rows.len(),
        ..AggregateReport::default()
    };

    for row in rows {
        let bucket = match bucket_key(row, &view.date_field, granularity) {
            Ok(k) => k,
            Err(e) => {
                debug!(view = %view.name, error = %e, "skipping row");
                report.skipped_rows += 1;
                continue;
            }
        };
        let group = view
            .secondary_dimension
            .as_deref()
            .map(|field| group_value(row, field));
        let sums = out.buckets.entry(GroupKey { bucket, group }).or_default();
        for (field, value) in row.iter() {
            if view.is_structural(field) {
                continue;
            }
            let Some(v) = value.as_number() else { continue };
            *sums.entry(field.trim().to_string()).or_insert(0.0) += v;
        }
        report.aggregated_rows += 1;
    }

    info!(
        view = %view.name,
        %granularity,
        buckets = out.buckets.len(),
        rows = report.aggregated_rows,
        skipped = report.skipped_rows,
        "aggregated rows"
    );
    (out, report)
}
