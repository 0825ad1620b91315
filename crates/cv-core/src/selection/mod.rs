//! Committed selection state shared across views

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityId;

mod store;

pub use store::SelectionStore;

/// Errors from selection transitions. All are recoverable; the prior
/// snapshot is always retained when a transition is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid time range {start}..{end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("unknown entity '{0}'")]
    UnknownEntity(EntityId),

    #[error("no dataset loaded")]
    NoDataset,
}

/// Year bounds of the loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    /// Crossed inputs are normalized by swapping, so a bounds value can
    /// never poison later clamps.
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.min, self.max)
    }

    /// The widest range the dataset supports.
    pub fn full_range(&self) -> TimeRange {
        TimeRange {
            start: self.min,
            end: self.max,
        }
    }
}

/// An inclusive year range, invariant `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: i32,
    end: i32,
}

impl TimeRange {
    /// Clamp both inputs to the dataset bounds, then reject ranges that are
    /// still crossed. Inputs that merely overshoot the bounds resolve
    /// silently; only an unresolvable ordering is an error.
    pub fn clamped(start: i32, end: i32, bounds: YearBounds) -> Result<Self, SelectionError> {
        let clamped_start = bounds.clamp(start);
        let clamped_end = bounds.clamp(end);
        if clamped_start > clamped_end {
            return Err(SelectionError::InvalidRange { start, end });
        }
        Ok(Self {
            start: clamped_start,
            end: clamped_end,
        })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Which entities are active. The denoted set is never empty: `All` stands
/// for the whole universe without materializing it, and a `Multi` always
/// holds at least two ids (a single id is always `Single`, draining past
/// one id lands back on `All`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Every entity in the universe.
    All,
    /// Exactly one entity.
    Single(EntityId),
    /// Two or more entities.
    Multi(BTreeSet<EntityId>),
}

impl SelectionMode {
    /// Membership in the denoted entity set.
    pub fn contains(&self, id: &EntityId) -> bool {
        match self {
            SelectionMode::All => true,
            SelectionMode::Single(x) => x == id,
            SelectionMode::Multi(set) => set.contains(id),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SelectionMode::All)
    }

    /// Number of explicitly selected entities, `None` for `All`.
    pub fn cardinality(&self) -> Option<usize> {
        match self {
            SelectionMode::All => None,
            SelectionMode::Single(_) => Some(1),
            SelectionMode::Multi(set) => Some(set.len()),
        }
    }
}

/// The committed selection: active entities plus the active time window.
/// Immutable value; every transition produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub mode: SelectionMode,
    pub time_range: TimeRange,
}

impl SelectionState {
    /// The initial state: everything visible over the full dataset range.
    pub fn unfiltered(bounds: YearBounds) -> Self {
        Self {
            mode: SelectionMode::All,
            time_range: bounds.full_range(),
        }
    }

    /// Whether a row with this entity and year is active.
    pub fn matches(&self, id: &EntityId, year: i32) -> bool {
        self.mode.contains(id) && self.time_range.contains(year)
    }

    /// Accumulate/drain toggle. Clicking builds a multi-selection up and,
    /// symmetrically, drains it back down through `Single` to `All`.
    pub fn toggled(&self, id: EntityId) -> Self {
        let mode = match &self.mode {
            SelectionMode::All => SelectionMode::Single(id),
            SelectionMode::Single(x) if *x == id => SelectionMode::All,
            SelectionMode::Single(x) => {
                let mut set = BTreeSet::new();
                set.insert(x.clone());
                set.insert(id);
                SelectionMode::Multi(set)
            }
            SelectionMode::Multi(set) if set.contains(&id) => {
                if set.len() > 2 {
                    let mut set = set.clone();
                    set.remove(&id);
                    SelectionMode::Multi(set)
                } else {
                    // Collapse to the remaining element; a malformed
                    // sub-two set drains straight to All.
                    match set.iter().find(|other| **other != id) {
                        Some(other) => SelectionMode::Single(other.clone()),
                        None => SelectionMode::All,
                    }
                }
            }
            SelectionMode::Multi(set) => {
                let mut set = set.clone();
                set.insert(id);
                SelectionMode::Multi(set)
            }
        };
        Self {
            mode,
            time_range: self.time_range,
        }
    }

    /// Exclusive "solo" toggle: always replaces the mode outright,
    /// regardless of any accumulated multi-selection.
    pub fn isolated(&self, id: EntityId) -> Self {
        let mode = match &self.mode {
            SelectionMode::Single(x) if *x == id => SelectionMode::All,
            _ => SelectionMode::Single(id),
        };
        Self {
            mode,
            time_range: self.time_range,
        }
    }

    pub fn with_time_range(&self, time_range: TimeRange) -> Self {
        Self {
            mode: self.mode.clone(),
            time_range,
        }
    }
}
