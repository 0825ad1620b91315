//! Time-series view adapter
//!
//! Maintains one line per entity of monthly incident counts over the
//! filtered rows, mirroring the dashboard's top chart. The month axis is
//! the sorted union of months present in the filtered data; missing
//! months read as zero so lines stay continuous.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use chrono::Datelike;
use tracing::debug;

use cv_core::{EntityId, FilteredView};
use cv_data::IncidentRow;

use crate::adapter::ViewAdapter;

/// One calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(row: &IncidentRow) -> Self {
        Self {
            year: row.date.year(),
            month: row.date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Totals for one entity in one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthBucket {
    pub count: u64,
    pub killed: u64,
    pub injured: u64,
}

/// Derived data behind the time-series chart.
#[derive(Default)]
pub struct TimeSeriesView {
    months: Vec<YearMonth>,
    series: BTreeMap<EntityId, BTreeMap<YearMonth, MonthBucket>>,
    highlighted: AHashSet<EntityId>,
}

impl TimeSeriesView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted month axis of the current filtered data.
    pub fn months(&self) -> &[YearMonth] {
        &self.months
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.series.keys()
    }

    /// One entity's line, zero-filled along the shared month axis.
    /// `None` when the entity has no rows in the current view.
    pub fn series_for(&self, entity: &EntityId) -> Option<Vec<(YearMonth, MonthBucket)>> {
        let buckets = self.series.get(entity)?;
        Some(
            self.months
                .iter()
                .map(|month| (*month, buckets.get(month).copied().unwrap_or_default()))
                .collect(),
        )
    }

    /// Largest monthly count across all entities, for the y scale.
    pub fn max_monthly_count(&self) -> u64 {
        self.series
            .values()
            .flat_map(|buckets| buckets.values())
            .map(|bucket| bucket.count)
            .max()
            .unwrap_or(0)
    }

    pub fn is_highlighted(&self, entity: &EntityId) -> bool {
        self.highlighted.contains(entity)
    }

    pub fn highlighted(&self) -> &AHashSet<EntityId> {
        &self.highlighted
    }
}

impl ViewAdapter<IncidentRow> for TimeSeriesView {
    fn on_state_changed(&mut self, view: &FilteredView<IncidentRow>) {
        self.series.clear();

        let mut months = BTreeSet::new();
        for row in &view.rows {
            let month = YearMonth::of(row);
            months.insert(month);

            let bucket = self
                .series
                .entry(row.entity.clone())
                .or_default()
                .entry(month)
                .or_default();
            bucket.count += 1;
            bucket.killed += u64::from(row.n_killed);
            bucket.injured += u64::from(row.n_injured);
        }
        self.months = months.into_iter().collect();
        debug!(
            entities = self.series.len(),
            months = self.months.len(),
            "time series rebuilt"
        );
    }

    fn on_hover(&mut self, entity: &EntityId) {
        self.highlighted.insert(entity.clone());
    }

    fn on_hover_end(&mut self, entity: &EntityId) {
        self.highlighted.remove(entity);
    }
}
