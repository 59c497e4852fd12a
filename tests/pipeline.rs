use rx_overview::aggregate::aggregate;
use rx_overview::bucket::{ordered_keys, BucketKey};
use rx_overview::config::{Selection, ViewConfig};
use rx_overview::filter::{filter_grouped, filter_records, WindowScope};
use rx_overview::mapping::CategoryMapper;
use rx_overview::percent::to_percentages;
use rx_overview::pipeline::{remap_and_aggregate, segments};
use rx_overview::pivot::table_rows;
use rx_overview::types::{Granularity, MappingMode, MappingRecord, Row, Window};

fn two_week_rows() -> Vec<Row> {
    vec![
        Row::new().with("Week", "2023-01-05").with("A", 10.0).with("B", 5.0),
        Row::new().with("Week", "2023-02-10").with("A", 20.0).with("B", 0.0),
    ]
}

fn channel_table() -> Vec<MappingRecord> {
    vec![
        MappingRecord {
            variable: Some("A".into()),
            channel: Some("X".into()),
            ..MappingRecord::default()
        },
        MappingRecord {
            variable: Some("B".into()),
            channel: Some("X".into()),
            ..MappingRecord::default()
        },
    ]
}

fn selection(granularity: Granularity, mapping_mode: MappingMode) -> Selection {
    Selection {
        granularity,
        mapping_mode,
        window: None,
    }
}

fn q1() -> BucketKey {
    BucketKey::Quarter { year: 2023, quarter: 1 }
}

fn segment_rows() -> Vec<Row> {
    let seg = |week: &str, segment: &str, a: f64, b: f64| {
        Row::new()
            .with("Week", week)
            .with("Segment", segment)
            .with("A", a)
            .with("B", b)
            .with("HCP", 1.0)
    };
    vec![
        seg("2022-11-03", "Hi", 1.0, 1.0),
        seg("2022-12-01", "Mid", 2.0, 2.0),
        seg("2023-01-05", "Hi", 3.0, 0.0),
        seg("2023-02-09", "Lo", 4.0, 1.0),
        seg("2023-03-02", "Hi", 5.0, 5.0),
        seg("2023-04-06", "Lo", 6.0, 6.0),
        seg("2023-05-04", "Top", 7.0, 0.0),
    ]
}

#[test]
fn quarter_sums_two_weeks() {
    let (agg, _) = aggregate(&two_week_rows(), &ViewConfig::activity(), Granularity::Quarter);
    let bucket = agg.get(&q1(), None).unwrap();
    assert_eq!(bucket.get("A"), Some(&30.0));
    assert_eq!(bucket.get("B"), Some(&5.0));
    assert_eq!(agg.buckets.len(), 1);
}

#[test]
fn channel_mapping_collapses_sources() {
    let mapper = CategoryMapper::new(channel_table());
    let (agg, _) = remap_and_aggregate(
        &two_week_rows(),
        &mapper,
        &ViewConfig::activity(),
        &selection(Granularity::Quarter, MappingMode::Channel),
    );
    let bucket = agg.get(&q1(), None).unwrap();
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket.get("X"), Some(&35.0));
}

#[test]
fn zero_value_gets_zero_share() {
    let slices = to_percentages(&[("X", 35.0), ("Y", 0.0)]);
    assert_eq!(slices[0].name, "X");
    assert_eq!(slices[0].value, 100.0);
    assert_eq!(slices[1].value, 0.0);
}

#[test]
fn single_bucket_window_regroups_its_segments() {
    let rows = vec![
        Row::new().with("Week", "2022-11-03").with("Segment", "Old").with("A", 1.0),
        Row::new().with("Week", "2023-01-05").with("Segment", "Hi").with("A", 2.0),
        Row::new().with("Week", "2023-02-05").with("Segment", "Lo").with("A", 3.0),
        Row::new().with("Week", "2023-01-12").with("Segment", "Hi").with("A", 4.0),
        Row::new().with("Week", "2023-04-05").with("Segment", "New").with("A", 5.0),
    ];
    let keys = ordered_keys(&rows, "Week", Granularity::Quarter);
    let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    assert_eq!(rendered, vec!["2022Q4", "2023Q1", "2023Q2"]);

    let mut sel = selection(Granularity::Quarter, MappingMode::Identity);
    sel.window = Some(Window::new(1, 1));
    let seg = segments(&rows, &CategoryMapper::default(), &ViewConfig::segment(), &sel, &keys);
    let groups: Vec<(&str, Option<&f64>)> = seg
        .groups
        .iter()
        .map(|g| (g.group.as_str(), g.metrics.get("A")))
        .collect();
    assert_eq!(groups, vec![("Hi", Some(&6.0)), ("Lo", Some(&3.0))]);
}

#[test]
fn missing_week_is_skipped() {
    let mut rows = two_week_rows();
    rows.insert(1, Row::new().with("A", 1000.0).with("B", 1000.0));
    let (agg, report) = aggregate(&rows, &ViewConfig::activity(), Granularity::Quarter);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.aggregated_rows, 2);
    assert_eq!(agg.get(&q1(), None).unwrap().get("A"), Some(&30.0));
}

#[test]
fn aggregation_is_idempotent() {
    let rows = segment_rows();
    let view = ViewConfig::segment();
    let (first, _) = aggregate(&rows, &view, Granularity::Month);
    let (second, _) = aggregate(&rows, &view, Granularity::Month);
    assert_eq!(first, second);
}

#[test]
fn aggregation_ignores_row_order() {
    let rows = segment_rows();
    let view = ViewConfig::segment();
    let (expected, _) = aggregate(&rows, &view, Granularity::Quarter);

    let mut reversed = rows.clone();
    reversed.reverse();
    assert_eq!(aggregate(&reversed, &view, Granularity::Quarter).0, expected);

    for shift in 1..rows.len() {
        let mut rotated = rows.clone();
        rotated.rotate_left(shift);
        assert_eq!(aggregate(&rotated, &view, Granularity::Quarter).0, expected);
    }
}

#[test]
fn remapped_totals_equal_source_totals() {
    let rows = vec![
        Row::new().with("Week", "2023-01-05").with("A", 1.0).with("B", 2.0).with("C", 4.0),
        Row::new().with("Week", "2023-03-05").with(" A ", 8.0).with("B", 16.0).with("C", 32.0),
    ];
    let mapper = CategoryMapper::new(channel_table());
    let view = ViewConfig::activity();
    let (agg, _) = remap_and_aggregate(&rows, &mapper, &view, &selection(Granularity::Year, MappingMode::Channel));
    let year = agg.get(&BucketKey::Year(2023), None).unwrap();
    assert_eq!(year.get("X"), Some(&27.0));
    assert_eq!(year.get("C"), Some(&36.0));
    assert!(!year.contains_key("A") && !year.contains_key("B"));
}

#[test]
fn percentages_sum_to_hundred() {
    let rows = segment_rows();
    let (agg, _) = aggregate(&rows, &ViewConfig::activity(), Granularity::Year);
    let totals: Vec<(String, f64)> = rx_overview::pivot::pivot(&agg).row_totals();
    let slices = to_percentages(&totals);
    let sum: f64 = slices.iter().map(|s| s.value).sum();
    assert!((sum - 100.0).abs() < 1e-9);
}

#[test]
fn widening_window_never_drops_records() {
    let rows = segment_rows();
    let view = ViewConfig::segment();
    let keys = ordered_keys(&rows, &view.date_field, Granularity::Month);
    let (agg, _) = aggregate(&rows, &view, Granularity::Month);
    let records = table_rows(&agg);

    for start in 0..keys.len() {
        let mut previous = Vec::new();
        for end in start..keys.len() {
            let scope = WindowScope::new(&keys, Granularity::Month, Some(Window::new(start, end)));
            let current = filter_records(&records, &scope);
            assert!(current.len() >= previous.len());
            assert!(previous.iter().all(|r| current.contains(r)));
            previous = current;
        }
    }
}

#[test]
fn full_window_matches_unfiltered_totals() {
    let rows = segment_rows();
    let view = ViewConfig::segment();
    let keys = ordered_keys(&rows, &view.date_field, Granularity::Quarter);
    let (agg, _) = aggregate(&rows, &view, Granularity::Quarter);
    let records = table_rows(&agg);
    let full = WindowScope::new(&keys, Granularity::Quarter, Window::full(keys.len()));
    assert_eq!(
        filter_grouped(&records, &full),
        filter_grouped(&records, &WindowScope::everything())
    );
    let grouped = filter_grouped(&records, &full);
    let names: Vec<&str> = grouped.iter().map(|g| g.group.as_str()).collect();
    assert_eq!(names, vec!["Hi", "Lo", "Mid", "Top"]);
    assert!(grouped.iter().all(|g| !g.metrics.contains_key("HCP")));
}
