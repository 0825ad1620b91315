//! Selection store implementation

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{SelectionError, SelectionState, TimeRange, YearBounds};
use crate::entity::{EntityId, EntityUniverse};

/// Single source of truth for the committed selection.
///
/// The stored snapshot is replaced wholesale on every transition, never
/// mutated in place, so readers always observe a complete state. Violating
/// inputs fail closed: the transition is rejected and the prior snapshot
/// kept.
pub struct SelectionStore {
    state: RwLock<Arc<SelectionState>>,
}

impl SelectionStore {
    /// Create a store in the unfiltered state for the given dataset bounds.
    pub fn new(bounds: YearBounds) -> Self {
        Self {
            state: RwLock::new(Arc::new(SelectionState::unfiltered(bounds))),
        }
    }

    /// The current committed snapshot.
    pub fn snapshot(&self) -> Arc<SelectionState> {
        self.state.read().clone()
    }

    /// Toggle one entity in or out of the selection.
    pub fn toggle_entity(
        &self,
        id: &EntityId,
        universe: &EntityUniverse,
    ) -> Result<Arc<SelectionState>, SelectionError> {
        if !universe.contains(id) {
            warn!(entity = %id, "toggle rejected: entity not in dataset universe");
            return Err(SelectionError::UnknownEntity(id.clone()));
        }
        let mut state = self.state.write();
        let next = Arc::new(state.toggled(id.clone()));
        debug!(entity = %id, mode = ?next.mode, "selection toggled");
        *state = next.clone();
        Ok(next)
    }

    /// Solo one entity, or clear the solo if it is already active.
    pub fn isolate(
        &self,
        id: &EntityId,
        universe: &EntityUniverse,
    ) -> Result<Arc<SelectionState>, SelectionError> {
        if !universe.contains(id) {
            warn!(entity = %id, "isolate rejected: entity not in dataset universe");
            return Err(SelectionError::UnknownEntity(id.clone()));
        }
        let mut state = self.state.write();
        let next = Arc::new(state.isolated(id.clone()));
        debug!(entity = %id, mode = ?next.mode, "selection isolated");
        *state = next.clone();
        Ok(next)
    }

    /// Replace the active time window, clamping to the dataset bounds.
    pub fn set_time_range(
        &self,
        start: i32,
        end: i32,
        bounds: YearBounds,
    ) -> Result<Arc<SelectionState>, SelectionError> {
        let range = TimeRange::clamped(start, end, bounds).map_err(|err| {
            warn!(start, end, "time range rejected: crossed after clamping");
            err
        })?;
        let mut state = self.state.write();
        let next = Arc::new(state.with_time_range(range));
        *state = next.clone();
        Ok(next)
    }

    /// Return to the unfiltered state over the full dataset range.
    pub fn reset(&self, bounds: YearBounds) -> Arc<SelectionState> {
        let next = Arc::new(SelectionState::unfiltered(bounds));
        *self.state.write() = next.clone();
        next
    }
}
