// Actual vs. predicted series and their totals over the selected window.
use crate::bucket::{bucket_key, BucketKey};
use crate::config::ViewConfig;
use crate::filter::WindowScope;
use crate::types::{Granularity, Row};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewPoint {
    /// The raw date cell, as the chart's x-axis label.
    pub name: String,
    pub bucket: BucketKey,
    pub actual: f64,
    pub predicted: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverviewTotals {
    pub actual: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub points: Vec<OverviewPoint>,
    pub totals: OverviewTotals,
}

/// One point per row with a valid date, in input order. A missing actual
/// reads as 0; a missing prediction stays absent.
pub fn series(rows: &[Row], view: &ViewConfig, granularity: Granularity) -> Vec<OverviewPoint> {
    let number = |row: &Row, field: &Option<String>| field.as_deref().and_then(|f| row.number(f));
    rows.iter()
        .filter_map(|row| match bucket_key(row, &view.date_field, granularity) {
            Ok(bucket) => Some(OverviewPoint {
                name: row.get(&view.date_field).map(|c| c.to_string()).unwrap_or_default(),
                bucket,
                actual: number(row, &view.actual_field).unwrap_or(0.0),
                predicted: number(row, &view.predicted_field),
            }),
            Err(e) => {
                debug!(view = %view.name, error = %e, "skipping row");
                None
            }
        })
        .collect()
}

pub fn totals(points: &[OverviewPoint]) -> OverviewTotals {
    points.iter().fold(OverviewTotals::default(), |acc, p| OverviewTotals {
        actual: acc.actual + p.actual,
        predicted: acc.predicted + p.predicted.unwrap_or(0.0),
    })
}

pub fn overview(rows: &[Row], view: &ViewConfig, granularity: Granularity, scope: &WindowScope) -> Overview {
    let points: Vec<OverviewPoint> = series(rows, view, granularity)
        .into_iter()
        .filter(|p| scope.includes(&p.bucket))
        .collect();
    let totals = totals(&points);
    Overview { points, totals }
}
