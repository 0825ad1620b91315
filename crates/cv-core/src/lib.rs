//! Core functionality for the coordinated multi-view platform
//!
//! This crate provides the shared selection state, the pure filter engine
//! and the cross-view event coordinator that keep every visible view
//! consistent with one committed selection.

pub mod coordinator;
pub mod data;
pub mod entity;
pub mod filter;
pub mod selection;

// Re-export commonly used types
pub use coordinator::{HighlightKind, HighlightSignal, SubscriptionHandle, ViewCoordinator};
pub use data::{DatasetCache, DatasetRow, LoadTicket, LoadedDataset, RowSource};
pub use entity::{Entity, EntityId, EntityUniverse};
pub use filter::{filter_rows, FilteredView};
pub use selection::{
    SelectionError, SelectionMode, SelectionState, SelectionStore, TimeRange, YearBounds,
};
