use crate::filter::GroupTotals;
use crate::overview::OverviewPoint;
use crate::percent::Slice;
use crate::pivot::PivotTable;
use crate::types::{OverviewRow, SliceRow};
use crate::util::format_number;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write string records with an explicit header, for tables whose columns
/// are only known at runtime.
pub fn write_records(path: &str, records: &[Vec<String>]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in records {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn slice_rows(slices: &[Slice]) -> Vec<SliceRow> {
    slices
        .iter()
        .map(|s| SliceRow {
            name: s.name.clone(),
            share: format_number(s.value, 2),
            label: s.label().unwrap_or_default(),
        })
        .collect()
}

pub fn overview_rows(points: &[OverviewPoint]) -> Vec<OverviewRow> {
    points
        .iter()
        .map(|p| OverviewRow {
            week: p.name.clone(),
            bucket: p.bucket.to_string(),
            actual: format_number(p.actual, 2),
            predicted: p.predicted.map(|v| format_number(v, 2)).unwrap_or_default(),
        })
        .collect()
}

/// Header plus one record per pivot row.
pub fn pivot_records(pivot: &PivotTable) -> Vec<Vec<String>> {
    let mut header = vec!["Metric".to_string()];
    header.extend(pivot.columns.iter().map(|c| c.to_string()));
    let mut out = vec![header];
    for r in &pivot.pivoted_data {
        let mut rec = vec![r.row.clone()];
        rec.extend(r.data.iter().map(|v| format_number(*v, 2)));
        out.push(rec);
    }
    out
}

/// Header plus one record per group; metrics a group never saw read 0.
pub fn group_records(groups: &[GroupTotals]) -> Vec<Vec<String>> {
    let metrics: BTreeSet<&str> = groups
        .iter()
        .flat_map(|g| g.metrics.keys().map(String::as_str))
        .collect();
    let mut header = vec!["Group".to_string()];
    header.extend(metrics.iter().map(|m| m.to_string()));
    let mut out = vec![header];
    for g in groups {
        let mut rec = vec![g.group.clone()];
        rec.extend(
            metrics
                .iter()
                .map(|m| format_number(g.metrics.get(*m).copied().unwrap_or(0.0), 2)),
        );
        out.push(rec);
    }
    out
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Preview of a header-first record list, like `preview_table_rows`.
pub fn preview_records(records: &[Vec<String>], max_rows: usize) {
    if records.len() < 2 {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    for r in records.iter().take(max_rows + 1) {
        builder.push_record(r.clone());
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
