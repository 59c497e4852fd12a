// The single remap -> aggregate -> reshape -> window pipeline every view runs
// through. Views only contribute their `ViewConfig`.
use crate::aggregate::{aggregate, Aggregate, AggregateReport};
use crate::bucket::BucketKey;
use crate::config::{Selection, ViewConfig};
use crate::filter::{filter_grouped, filter_pivot, window_totals, GroupTotals, WindowScope};
use crate::mapping::CategoryMapper;
use crate::percent::{to_percentages, Slice};
use crate::pivot::{pivot, table_rows, GroupedRecord, PivotTable};
use crate::types::Row;
use serde::Serialize;

/// Remap under the selected mode, then aggregate. Remapping always happens
/// first so merged columns share one running sum.
pub fn remap_and_aggregate(
    rows: &[Row],
    mapper: &CategoryMapper,
    view: &ViewConfig,
    selection: &Selection,
) -> (Aggregate, AggregateReport) {
    let remapped = mapper.remap(rows, selection.mapping_mode, view);
    aggregate(&remapped, view, selection.granularity)
}

/// Distribution view: every metric's share of the windowed total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub pivot: PivotTable,
    pub windowed: PivotTable,
    pub slices: Vec<Slice>,
    pub report: AggregateReport,
}

pub fn distribution(
    rows: &[Row],
    mapper: &CategoryMapper,
    view: &ViewConfig,
    selection: &Selection,
    ordered_keys: &[BucketKey],
) -> Distribution {
    let (agg, report) = remap_and_aggregate(rows, mapper, view, selection);
    let pivot = pivot(&agg);
    let scope = WindowScope::new(ordered_keys, selection.granularity, selection.window);
    let slices = to_percentages(&window_totals(&pivot, &scope));
    Distribution {
        windowed: filter_pivot(&pivot, &scope),
        pivot,
        slices,
        report,
    }
}

/// Grouped view: per-bucket records and their per-group totals over the
/// window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segments {
    pub records: Vec<GroupedRecord>,
    pub groups: Vec<GroupTotals>,
    pub report: AggregateReport,
}

pub fn segments(
    rows: &[Row],
    mapper: &CategoryMapper,
    view: &ViewConfig,
    selection: &Selection,
    ordered_keys: &[BucketKey],
) -> Segments {
    let (agg, report) = remap_and_aggregate(rows, mapper, view, selection);
    let records = table_rows(&agg);
    let scope = WindowScope::new(ordered_keys, selection.granularity, selection.window);
    Segments {
        groups: filter_grouped(&records, &scope),
        records,
        report,
    }
}

/// Share of each metric within one group's total.
pub fn group_shares(group: &GroupTotals) -> Vec<Slice> {
    let values: Vec<(&str, f64)> = group.metrics.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    to_percentages(&values)
}
