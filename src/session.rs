// Holds the loaded dataset and the current selection, and guards against
// showing results computed for a selection that has since changed.
use crate::bucket::{ordered_keys, BucketKey};
use crate::config::{Selection, Views};
use crate::filter::WindowScope;
use crate::mapping::CategoryMapper;
use crate::overview::{overview, Overview};
use crate::pipeline::{distribution, segments, Distribution, Segments};
use crate::types::{Granularity, MappingMode, MappingRecord, Row, Window};
use serde::Serialize;
use tracing::{info, warn};

/// Everything the views render for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub generation: u64,
    pub selection: Selection,
    pub timeline: Vec<BucketKey>,
    pub activity: Distribution,
    pub segment: Segments,
    pub overview: Overview,
}

pub struct Session {
    rows: Vec<Row>,
    mapper: CategoryMapper,
    views: Views,
    selection: Selection,
    timeline: Vec<BucketKey>,
    generation: u64,
}

impl Session {
    pub fn new(rows: Vec<Row>, mapping: Vec<MappingRecord>, views: Views) -> Self {
        let mut session = Self {
            rows,
            mapper: CategoryMapper::new(mapping),
            views,
            selection: Selection::default(),
            timeline: Vec::new(),
            generation: 0,
        };
        session.set_granularity(session.views.default_granularity);
        session
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Sorted bucket keys of the active granularity; window indices point
    /// into this list.
    pub fn timeline(&self) -> &[BucketKey] {
        &self.timeline
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    /// Switch granularity. Rebuilds the timeline and resets the window to
    /// its full range (`all` has no window).
    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.timeline = ordered_keys(&self.rows, &self.views.overview.date_field, granularity);
        self.selection.granularity = granularity;
        self.selection.window = match granularity {
            Granularity::All => None,
            _ => Window::full(self.timeline.len()),
        };
        self.bump();
    }

    pub fn set_mapping_mode(&mut self, mode: MappingMode) {
        self.selection.mapping_mode = mode;
        self.bump();
    }

    pub fn set_window(&mut self, window: Window) {
        self.selection.window = Some(window);
        self.bump();
    }

    /// Apply a whole selection at once. An explicit window overrides the
    /// default full range.
    pub fn select(&mut self, selection: Selection) {
        self.set_granularity(selection.granularity);
        self.set_mapping_mode(selection.mapping_mode);
        if let Some(window) = selection.window {
            self.set_window(window);
        }
    }

    /// Recompute every view from scratch for the current selection.
    pub fn refresh(&self) -> Snapshot {
        let selection = self.selection;
        let scope = WindowScope::new(&self.timeline, selection.granularity, selection.window);
        let snapshot = Snapshot {
            generation: self.generation,
            selection,
            timeline: self.timeline.clone(),
            activity: distribution(&self.rows, &self.mapper, &self.views.activity, &selection, &self.timeline),
            segment: segments(&self.rows, &self.mapper, &self.views.segment, &selection, &self.timeline),
            overview: overview(&self.rows, &self.views.overview, selection.granularity, &scope),
        };
        info!(
            generation = snapshot.generation,
            granularity = %selection.granularity,
            mode = %selection.mapping_mode,
            "refreshed views"
        );
        snapshot
    }

    pub fn is_current(&self, snapshot: &Snapshot) -> bool {
        snapshot.generation == self.generation
    }

    /// Keep a snapshot only if no selection change happened since it was
    /// computed. Stale snapshots are dropped.
    pub fn accept(&self, snapshot: Snapshot) -> Option<Snapshot> {
        if self.is_current(&snapshot) {
            Some(snapshot)
        } else {
            warn!(
                stale = snapshot.generation,
                current = self.generation,
                "discarding stale snapshot"
            );
            None
        }
    }
}
