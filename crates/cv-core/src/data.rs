//! Dataset cache and the loading contract
//!
//! The cache holds the one fully loaded dataset for the session. Loading is
//! the only asynchronous step in the system; everything downstream reads
//! the committed dataset by shared reference. A monotonic ticket makes
//! concurrent loads last-request-wins: a superseded load's result is
//! discarded at commit time instead of overwriting newer data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::entity::{EntityId, EntityUniverse};
use crate::selection::YearBounds;

/// The core's only demands on a dataset record.
pub trait DatasetRow: Send + Sync + 'static {
    fn entity_id(&self) -> &EntityId;
    fn year(&self) -> i32;
}

/// One fully loaded dataset: the immutable row sequence plus the universe
/// and year bounds derived from it during the load pass.
#[derive(Debug)]
pub struct LoadedDataset<R> {
    pub rows: Arc<Vec<R>>,
    pub universe: EntityUniverse,
    pub bounds: YearBounds,
}

impl<R> Clone for LoadedDataset<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            universe: self.universe.clone(),
            bounds: self.bounds,
        }
    }
}

/// Token identifying one load attempt. Only the most recently issued
/// ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Session-lifetime cache for the loaded dataset.
pub struct DatasetCache<R> {
    slot: RwLock<Option<LoadedDataset<R>>>,
    latest_ticket: AtomicU64,
}

impl<R> DatasetCache<R> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Register a new load attempt, superseding all earlier tickets.
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Commit a finished load. Returns `false` (and leaves the slot
    /// untouched) when a newer load was started in the meantime.
    pub fn commit(&self, ticket: LoadTicket, dataset: LoadedDataset<R>) -> bool {
        if ticket.0 != self.latest_ticket.load(Ordering::SeqCst) {
            warn!(
                ticket = ticket.0,
                latest = self.latest_ticket.load(Ordering::SeqCst),
                "discarding superseded dataset load"
            );
            return false;
        }
        info!(
            rows = dataset.rows.len(),
            entities = dataset.universe.len(),
            min_year = dataset.bounds.min,
            max_year = dataset.bounds.max,
            "dataset committed"
        );
        *self.slot.write() = Some(dataset);
        true
    }

    /// The committed dataset, if any. Cheap: rows are shared by `Arc`.
    pub fn get(&self) -> Option<LoadedDataset<R>> {
        self.slot.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<R> Default for DatasetCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract for anything that can produce a dataset (CSV file, database,
/// fixture). Implementations live in the data crate.
#[async_trait::async_trait]
pub trait RowSource: Send + Sync {
    type Row: DatasetRow;

    /// Load the full dataset into memory.
    async fn load(&self) -> anyhow::Result<LoadedDataset<Self::Row>>;

    /// Human-readable source name for logs and error surfaces.
    fn source_name(&self) -> &str;

    /// Load and commit into the cache under the last-request-wins
    /// protocol. Returns `false` when a newer load superseded this one.
    async fn load_into(&self, cache: &DatasetCache<Self::Row>) -> anyhow::Result<bool> {
        let ticket = cache.begin_load();
        let dataset = self.load().await?;
        Ok(cache.commit(ticket, dataset))
    }
}
