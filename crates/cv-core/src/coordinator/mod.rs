//! Cross-view event coordinator
//!
//! A synchronous, single-process publish/subscribe bus carrying two kinds
//! of signals: committed state-change notifications (one per successful
//! store transition, after the filter engine has run) and ephemeral
//! hover/highlight signals that never touch the store or the filter.
//!
//! Subscriptions are keyed by explicit handles so a view that re-renders
//! can detach its previous callbacks before registering new ones.
//! Registering without detaching is the classic duplicate-delivery leak;
//! the handle protocol makes it a detectable bug instead of a silent one.

use std::sync::Arc;

use ahash::AHashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::data::{DatasetCache, DatasetRow, LoadedDataset};
use crate::entity::EntityId;
use crate::filter::{filter_rows, FilteredView};
use crate::selection::{SelectionError, SelectionState, SelectionStore};

/// Opaque key for one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(Uuid);

impl SubscriptionHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Kind of a transient highlight signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Hover,
    HoverEnd,
}

/// A transient, non-committing hover indication. Exists only on the bus;
/// it has no stored lifecycle and never becomes part of the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSignal {
    pub entity: EntityId,
    pub kind: HighlightKind,
}

type RenderFn<R> = Box<dyn FnMut(&FilteredView<R>) + Send>;
type HighlightFn = Box<dyn FnMut(&EntityId) + Send>;

struct Subscribers<R> {
    render: Vec<(SubscriptionHandle, RenderFn<R>)>,
    hover: Vec<(SubscriptionHandle, HighlightFn)>,
    hover_end: Vec<(SubscriptionHandle, HighlightFn)>,
    /// Handles detached while their list was checked out for delivery.
    detached: AHashSet<SubscriptionHandle>,
    /// Deliveries currently in flight; emits from inside a callback nest.
    delivering: usize,
}

impl<R> Subscribers<R> {
    fn new() -> Self {
        Self {
            render: Vec::new(),
            hover: Vec::new(),
            hover_end: Vec::new(),
            detached: AHashSet::new(),
            delivering: 0,
        }
    }

    fn detach(&mut self, handle: SubscriptionHandle) {
        self.render.retain(|(h, _)| *h != handle);
        self.hover.retain(|(h, _)| *h != handle);
        self.hover_end.retain(|(h, _)| *h != handle);
        if self.delivering > 0 {
            self.detached.insert(handle);
        }
    }
}

/// The coordinator: owns the selection store, reads the dataset cache and
/// fans committed and transient signals out to registered views.
///
/// All delivery is synchronous and in registration order; each publish
/// runs its subscriber list to completion before returning, so transition
/// *n+1* is never observed before transition *n* finished delivering.
pub struct ViewCoordinator<R: DatasetRow + Clone> {
    cache: Arc<DatasetCache<R>>,
    store: SelectionStore,
    subscribers: Mutex<Subscribers<R>>,
}

impl<R: DatasetRow + Clone> ViewCoordinator<R> {
    /// Create a coordinator over an already-populated dataset cache.
    pub fn new(cache: Arc<DatasetCache<R>>) -> Result<Self, SelectionError> {
        let dataset = cache.get().ok_or(SelectionError::NoDataset)?;
        Ok(Self {
            store: SelectionStore::new(dataset.bounds),
            cache,
            subscribers: Mutex::new(Subscribers::new()),
        })
    }

    /// The current committed selection snapshot.
    pub fn snapshot(&self) -> Arc<SelectionState> {
        self.store.snapshot()
    }

    // --- subscription surface -------------------------------------------

    /// Register a render callback for committed state changes.
    pub fn on_state_changed(
        &self,
        callback: impl FnMut(&FilteredView<R>) + Send + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        self.subscribers
            .lock()
            .render
            .push((handle, Box::new(callback)));
        handle
    }

    /// Register a callback for transient hover signals.
    pub fn on_hover(
        &self,
        callback: impl FnMut(&EntityId) + Send + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        self.subscribers
            .lock()
            .hover
            .push((handle, Box::new(callback)));
        handle
    }

    /// Register a callback for hover-end signals.
    pub fn on_hover_end(
        &self,
        callback: impl FnMut(&EntityId) + Send + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        self.subscribers
            .lock()
            .hover_end
            .push((handle, Box::new(callback)));
        handle
    }

    /// Remove exactly the callbacks registered under `handle`.
    /// Idempotent: detaching an unknown or already-detached handle is a
    /// no-op.
    pub fn detach(&self, handle: SubscriptionHandle) {
        self.subscribers.lock().detach(handle);
    }

    // --- transient highlight channel ------------------------------------

    /// Fan a hover signal out to every highlight subscriber. Never runs
    /// the filter engine or touches the store.
    pub fn emit_hover(&self, entity: &EntityId) {
        debug!(entity = %entity, "hover");
        self.emit_to(|subs| &mut subs.hover, entity);
    }

    /// Fan a hover-end signal out to every highlight subscriber.
    pub fn emit_hover_end(&self, entity: &EntityId) {
        debug!(entity = %entity, "hover end");
        self.emit_to(|subs| &mut subs.hover_end, entity);
    }

    /// Deliver to one highlight list with the lock released, so callbacks
    /// may subscribe, detach or emit without deadlocking the delivery
    /// thread. The list is checked out for the duration; detaches landing
    /// mid-delivery suppress the remaining checked-out callbacks, and
    /// subscriptions landing mid-delivery start with the next signal.
    fn emit_to(
        &self,
        list: fn(&mut Subscribers<R>) -> &mut Vec<(SubscriptionHandle, HighlightFn)>,
        entity: &EntityId,
    ) {
        let mut active = {
            let mut subs = self.subscribers.lock();
            subs.delivering += 1;
            std::mem::take(list(&mut subs))
        };
        for (handle, callback) in active.iter_mut() {
            if self.subscribers.lock().detached.contains(handle) {
                continue;
            }
            callback(entity);
        }

        let mut subs = self.subscribers.lock();
        subs.delivering -= 1;
        active.retain(|(handle, _)| !subs.detached.contains(handle));
        if subs.delivering == 0 {
            subs.detached.clear();
        }
        // Registration order: survivors first, then anything added
        // during delivery.
        let slot = list(&mut subs);
        active.append(slot);
        *slot = active;
    }

    /// Deliver a signal by kind. Convenience over the paired emitters.
    pub fn emit_highlight(&self, signal: &HighlightSignal) {
        match signal.kind {
            HighlightKind::Hover => self.emit_hover(&signal.entity),
            HighlightKind::HoverEnd => self.emit_hover_end(&signal.entity),
        }
    }

    // --- forwarded store operations -------------------------------------

    /// Toggle an entity and publish the recomputed view.
    pub fn toggle_entity(&self, id: &EntityId) -> Result<(), SelectionError> {
        let dataset = self.dataset()?;
        let state = self.store.toggle_entity(id, &dataset.universe)?;
        self.publish(&dataset, &state);
        Ok(())
    }

    /// Solo an entity and publish the recomputed view.
    pub fn isolate(&self, id: &EntityId) -> Result<(), SelectionError> {
        let dataset = self.dataset()?;
        let state = self.store.isolate(id, &dataset.universe)?;
        self.publish(&dataset, &state);
        Ok(())
    }

    /// Replace the time window and publish the recomputed view.
    pub fn set_time_range(&self, start: i32, end: i32) -> Result<(), SelectionError> {
        let dataset = self.dataset()?;
        let state = self.store.set_time_range(start, end, dataset.bounds)?;
        self.publish(&dataset, &state);
        Ok(())
    }

    /// Reset to the unfiltered state and publish the recomputed view.
    pub fn reset(&self) -> Result<(), SelectionError> {
        let dataset = self.dataset()?;
        let state = self.store.reset(dataset.bounds);
        self.publish(&dataset, &state);
        Ok(())
    }

    /// Re-filter the current state and publish, without a transition.
    /// Used for the initial render after views attach, and after a
    /// dataset re-load commits.
    pub fn refresh(&self) -> Result<(), SelectionError> {
        let dataset = self.dataset()?;
        let state = self.store.snapshot();
        self.publish(&dataset, &state);
        Ok(())
    }

    fn dataset(&self) -> Result<LoadedDataset<R>, SelectionError> {
        self.cache.get().ok_or(SelectionError::NoDataset)
    }

    /// Run the filter engine and deliver the result to every render
    /// subscriber, in registration order, to completion. Callbacks run
    /// with the subscriber lock released, so a view may detach and
    /// re-register from inside its own render.
    fn publish(&self, dataset: &LoadedDataset<R>, state: &SelectionState) {
        let view = filter_rows(&dataset.rows, state);
        debug!(rows = view.len(), mode = ?state.mode, "state changed");

        let mut active = {
            let mut subs = self.subscribers.lock();
            subs.delivering += 1;
            std::mem::take(&mut subs.render)
        };
        for (handle, callback) in active.iter_mut() {
            if self.subscribers.lock().detached.contains(handle) {
                continue;
            }
            callback(&view);
        }

        let mut subs = self.subscribers.lock();
        subs.delivering -= 1;
        active.retain(|(handle, _)| !subs.detached.contains(handle));
        if subs.delivering == 0 {
            subs.detached.clear();
        }
        let slot = &mut subs.render;
        active.append(slot);
        *slot = active;
    }
}
