// Category remapping: re-key metric columns through the mapping sheet before
// aggregation, merging columns that land on the same target.
use crate::config::ViewConfig;
use crate::types::{Cell, MappingMode, MappingRecord, Row};
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
use tracing::debug;

pub type Lookup = HashMap<String, String>;

/// Build the trimmed source -> target lookup for one mode. Records missing
/// either side (or blank after trimming) are skipped; later records win.
pub fn build_lookup(table: &[MappingRecord], mode: MappingMode) -> Lookup {
    let mut lookup = Lookup::new();
    for record in table {
        let (Some(source), Some(target)) = (record.variable.as_deref(), mode.target(record)) else {
            continue;
        };
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            continue;
        }
        lookup.insert(source.to_string(), target.to_string());
    }
    lookup
}

/// Owns the mapping table and memoizes one lookup per mode. The table is
/// fixed for the mapper's lifetime, so a cached lookup never goes stale.
#[derive(Debug, Default)]
pub struct CategoryMapper {
    table: Vec<MappingRecord>,
    channel: OnceCell<Lookup>,
    sub_category: OnceCell<Lookup>,
    category: OnceCell<Lookup>,
}

impl CategoryMapper {
    pub fn new(table: Vec<MappingRecord>) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    /// Cached lookup for `mode`; `None` for identity.
    pub fn lookup(&self, mode: MappingMode) -> Option<&Lookup> {
        let cell = match mode {
            MappingMode::Identity => return None,
            MappingMode::Channel => &self.channel,
            MappingMode::SubCategory => &self.sub_category,
            MappingMode::Category => &self.category,
        };
        Some(cell.get_or_init(|| {
            let lookup = build_lookup(&self.table, mode);
            debug!(%mode, entries = lookup.len(), "built category lookup");
            lookup
        }))
    }

    /// Remap every row under `mode`. Identity hands the rows back as-is.
    pub fn remap(&self, rows: &[Row], mode: MappingMode, view: &ViewConfig) -> Vec<Row> {
        match self.lookup(mode) {
            None => rows.to_vec(),
            Some(lookup) => rows.iter().map(|r| remap_row(r, lookup, view)).collect(),
        }
    }
}

/// Remap a single row. Structural fields (date, dimension, excluded) and
/// unmapped fields pass through under their own names; mapped fields are
/// summed into their target, with unparsable values counting as 0.
pub fn remap_row(row: &Row, lookup: &Lookup, view: &ViewConfig) -> Row {
    let mut mapped: HashMap<String, f64> = HashMap::new();
    let mut out = Row::new();
    for (field, value) in row.iter() {
        if view.is_structural(field) {
            out.insert(field.clone(), value.clone());
            continue;
        }
        match lookup.get(field.trim()) {
            Some(target) => {
                *mapped.entry(target.clone()).or_insert(0.0) += value.as_number().unwrap_or(0.0);
            }
            None => out.insert(field.clone(), value.clone()),
        }
    }
    for (target, sum) in mapped {
        // A pass-through column that already carries the target's name
        // shares its sum.
        let total = match out.get(&target).and_then(Cell::as_number) {
            Some(existing) => existing + sum,
            None => sum,
        };
        out.insert(target, total);
    }
    out
}
