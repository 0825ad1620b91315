//! Geographic aggregate view adapter
//!
//! Per-region incident counts keyed by postal abbreviation, feeding the
//! hexagon-grid map. Boundary geometry and hexagon layout stay with the
//! embedding UI; this adapter only derives the counts.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use cv_core::{EntityId, FilteredView};
use cv_data::IncidentRow;

use crate::adapter::ViewAdapter;
use crate::regions;

/// Derived data behind the geographic map.
#[derive(Default)]
pub struct GeoAggregateView {
    counts: AHashMap<String, u64>,
    highlighted: AHashSet<EntityId>,
}

impl GeoAggregateView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incident count for a region key (postal abbreviation, or the raw
    /// entity id when no abbreviation is known). Zero for absent regions.
    pub fn count_for(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Largest per-region count, for the color scale.
    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    pub fn region_keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn is_highlighted(&self, entity: &EntityId) -> bool {
        self.highlighted.contains(entity)
    }

    /// Highlighted regions as abbreviations, for direct hexagon lookup.
    pub fn highlighted_keys(&self) -> Vec<&str> {
        self.highlighted
            .iter()
            .map(|entity| regions::abbreviation(entity.as_str()).unwrap_or(entity.as_str()))
            .collect()
    }
}

impl ViewAdapter<IncidentRow> for GeoAggregateView {
    fn on_state_changed(&mut self, view: &FilteredView<IncidentRow>) {
        self.counts.clear();
        for row in &view.rows {
            let key = regions::abbreviation(row.entity.as_str())
                .unwrap_or(row.entity.as_str())
                .to_owned();
            *self.counts.entry(key).or_insert(0) += 1;
        }
        debug!(regions = self.counts.len(), "geo aggregate rebuilt");
    }

    fn on_hover(&mut self, entity: &EntityId) {
        self.highlighted.insert(entity.clone());
    }

    fn on_hover_end(&mut self, entity: &EntityId) {
        self.highlighted.remove(entity);
    }
}
