// Command-line front end: load the data and mapping sheets, run the three
// dashboard views for one selection, preview them and export them.
use anyhow::{Context, Result};
use clap::Parser;
use rx_overview::config::{Selection, Views};
use rx_overview::loader;
use rx_overview::output;
use rx_overview::pipeline::group_shares;
use rx_overview::session::Session;
use rx_overview::types::{Granularity, MappingMode, Window};
use rx_overview::util::{format_int, format_number};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rx_overview")]
#[command(about = "Aggregate weekly Rx activity data into dashboard views", long_about = None)]
struct Args {
    /// Data sheet exported as CSV (one row per week).
    #[arg(long)]
    data: PathBuf,

    /// Mapping sheet exported as CSV (variable, Channel, Sub_Category, Category).
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// JSON file overriding the built-in view configurations.
    #[arg(long)]
    views: Option<PathBuf>,

    /// all | year | quarter | month
    #[arg(long, default_value = "all")]
    granularity: Granularity,

    /// identity | channel | subCategory | category
    #[arg(long, default_value = "identity")]
    mode: MappingMode,

    /// Inclusive bucket index range, e.g. `0:3`. Defaults to every bucket.
    #[arg(long)]
    window: Option<Window>,

    /// Directory the CSV and JSON exports are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Rows shown per preview table.
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,
}

fn out_path(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

fn report_write(result: Result<(), Box<dyn std::error::Error>>) {
    if let Err(e) = result {
        eprintln!("Write error: {}", e);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (rows, load_report) = loader::load_rows_from_path(&args.data)
        .with_context(|| format!("Failed to load data sheet {}", args.data.display()))?;
    let mapping = match &args.mapping {
        Some(path) => loader::load_mapping_from_path(path)
            .with_context(|| format!("Failed to load mapping sheet {}", path.display()))?,
        None => Vec::new(),
    };
    let views = match &args.views {
        Some(path) => Views::from_json_path(path)
            .with_context(|| format!("Failed to read view configuration {}", path.display()))?,
        None => Views::default(),
    };

    println!(
        "Processing dataset... ({} rows loaded, {} mapping entries)",
        format_int(load_report.loaded_rows as u64),
        format_int(mapping.len() as u64)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(load_report.parse_errors as u64)
        );
    }
    println!();

    let mut session = Session::new(rows, mapping, views);
    session.select(Selection {
        granularity: args.granularity,
        mapping_mode: args.mode,
        window: args.window,
    });
    let snapshot = session
        .accept(session.refresh())
        .context("Selection changed while computing views")?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let timeline: Vec<String> = snapshot.timeline.iter().map(|k| k.to_string()).collect();
    println!(
        "Granularity: {}  Mapping: {}  Buckets: [{}]",
        snapshot.selection.granularity,
        snapshot.selection.mapping_mode,
        timeline.join(", ")
    );
    if let Some(w) = snapshot.selection.window {
        println!("Window: {}..={}", w.start, w.end);
    }
    println!();

    let totals = snapshot.overview.totals;
    println!("Rx Overview");
    println!(
        "Actual Rx: {}  Predicted Rx: {}\n",
        format_number(totals.actual, 0),
        format_number(totals.predicted, 0)
    );
    let overview_rows = output::overview_rows(&snapshot.overview.points);
    output::preview_table_rows(&overview_rows, args.preview_rows);
    let file = out_path(&args.out_dir, "overview_series.csv");
    report_write(output::write_csv(&file, &overview_rows));
    println!("(Full table exported to {})\n", file);

    println!("Activity Distribution\n");
    let slices = output::slice_rows(&snapshot.activity.slices);
    output::preview_table_rows(&slices, args.preview_rows);
    let file = out_path(&args.out_dir, "activity_distribution.csv");
    report_write(output::write_csv(&file, &slices));
    let pivot_file = out_path(&args.out_dir, "activity_pivot.csv");
    report_write(output::write_records(
        &pivot_file,
        &output::pivot_records(&snapshot.activity.windowed),
    ));
    println!("(Full tables exported to {} and {})\n", file, pivot_file);

    println!("Segment Distribution\n");
    let groups = output::group_records(&snapshot.segment.groups);
    output::preview_records(&groups, args.preview_rows);
    for g in &snapshot.segment.groups {
        let top = group_shares(g)
            .into_iter()
            .max_by(|a, b| a.value.total_cmp(&b.value));
        if let Some(top) = top {
            println!("{}: largest share {} ({}%)", g.group, top.name, format_number(top.value, 2));
        }
    }
    let file = out_path(&args.out_dir, "segment_distribution.csv");
    report_write(output::write_records(&file, &groups));
    println!("(Full table exported to {})\n", file);

    let file = out_path(&args.out_dir, "snapshot.json");
    report_write(output::write_json(&file, &snapshot));
    println!("Snapshot saved to {}", file);

    Ok(())
}
