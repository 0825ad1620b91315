//! Concrete row model for incident datasets

use chrono::{Datelike, NaiveDate};
use cv_core::{DatasetRow, EntityId};

/// One incident record. Immutable once loaded; the filter engine only
/// reads it and produces derived sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRow {
    pub entity: EntityId,
    pub date: NaiveDate,
    pub n_killed: u32,
    pub n_injured: u32,
}

impl IncidentRow {
    pub fn new(
        entity: impl Into<EntityId>,
        date: NaiveDate,
        n_killed: u32,
        n_injured: u32,
    ) -> Self {
        Self {
            entity: entity.into(),
            date,
            n_killed,
            n_injured,
        }
    }
}

impl DatasetRow for IncidentRow {
    fn entity_id(&self) -> &EntityId {
        &self.entity
    }

    fn year(&self) -> i32 {
        self.date.year()
    }
}
