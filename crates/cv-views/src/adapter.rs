//! View adapter contract and subscription lifecycle
//!
//! A mounted view holds one `ViewBinding` bundling its three subscription
//! handles. Re-rendering a view must go through `ViewBinding::detach`
//! before attaching again; skipping the detach leaves the old callbacks
//! registered and every signal is delivered twice.

use std::sync::Arc;

use parking_lot::Mutex;

use cv_core::{DatasetRow, EntityId, FilteredView, SubscriptionHandle, ViewCoordinator};

/// A component that renders from filtered rows and highlight signals.
pub trait ViewAdapter<R>: Send {
    /// A new committed selection was published; rebuild derived data.
    fn on_state_changed(&mut self, view: &FilteredView<R>);

    /// Transient hover on an entity. Must be idempotent: a repeated hover
    /// with no intervening hover-end leaves the same highlighted state.
    fn on_hover(&mut self, entity: &EntityId);

    /// Hover ended. A no-op for entities that were never highlighted or
    /// were filtered out since the hover started.
    fn on_hover_end(&mut self, entity: &EntityId);
}

/// The subscription handles held by one mounted view.
#[derive(Debug, Clone, Copy)]
pub struct ViewBinding {
    render: SubscriptionHandle,
    hover: SubscriptionHandle,
    hover_end: SubscriptionHandle,
}

impl ViewBinding {
    /// Remove this view's callbacks from the coordinator. Safe to call
    /// more than once.
    pub fn detach<R: DatasetRow + Clone>(&self, coordinator: &ViewCoordinator<R>) {
        coordinator.detach(self.render);
        coordinator.detach(self.hover);
        coordinator.detach(self.hover_end);
    }
}

/// Register a view's three callbacks and return the binding that owns
/// them. The view is shared behind a mutex so callbacks can feed it from
/// the coordinator's delivery loop.
pub fn attach_view<R, V>(
    view: &Arc<Mutex<V>>,
    coordinator: &ViewCoordinator<R>,
) -> ViewBinding
where
    R: DatasetRow + Clone,
    V: ViewAdapter<R> + 'static,
{
    let render = {
        let view = Arc::clone(view);
        coordinator.on_state_changed(move |filtered| view.lock().on_state_changed(filtered))
    };
    let hover = {
        let view = Arc::clone(view);
        coordinator.on_hover(move |entity| view.lock().on_hover(entity))
    };
    let hover_end = {
        let view = Arc::clone(view);
        coordinator.on_hover_end(move |entity| view.lock().on_hover_end(entity))
    };
    ViewBinding {
        render,
        hover,
        hover_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::{DatasetCache, LoadedDataset, YearBounds};
    use cv_data::IncidentRow;

    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn coordinator() -> ViewCoordinator<IncidentRow> {
        let rows = vec![
            IncidentRow::new("New York", date(2014, 3, 1), 1, 2),
            IncidentRow::new("California", date(2015, 6, 2), 0, 1),
            IncidentRow::new("Texas", date(2016, 9, 3), 2, 0),
        ];
        let dataset = LoadedDataset {
            universe: rows.iter().map(|r| r.entity.clone()).collect(),
            bounds: YearBounds::new(2014, 2016),
            rows: Arc::new(rows),
        };
        let cache = Arc::new(DatasetCache::new());
        let ticket = cache.begin_load();
        assert!(cache.commit(ticket, dataset));
        ViewCoordinator::new(cache).unwrap()
    }

    #[derive(Default)]
    struct CountingView {
        renders: usize,
        hovers: usize,
        hover_ends: usize,
    }

    impl ViewAdapter<IncidentRow> for CountingView {
        fn on_state_changed(&mut self, _view: &FilteredView<IncidentRow>) {
            self.renders += 1;
        }
        fn on_hover(&mut self, _entity: &EntityId) {
            self.hovers += 1;
        }
        fn on_hover_end(&mut self, _entity: &EntityId) {
            self.hover_ends += 1;
        }
    }

    #[test]
    fn test_attach_wires_all_three_channels() {
        let coordinator = coordinator();
        let view = Arc::new(Mutex::new(CountingView::default()));
        attach_view(&view, &coordinator);

        coordinator.toggle_entity(&EntityId::from("Texas")).unwrap();
        coordinator.emit_hover(&EntityId::from("Texas"));
        coordinator.emit_hover_end(&EntityId::from("Texas"));

        let view = view.lock();
        assert_eq!((view.renders, view.hovers, view.hover_ends), (1, 1, 1));
    }

    #[test]
    fn test_rerender_cycle_does_not_leak() {
        let coordinator = coordinator();
        let view = Arc::new(Mutex::new(CountingView::default()));

        let binding = attach_view(&view, &coordinator);
        binding.detach(&coordinator);
        attach_view(&view, &coordinator);

        coordinator.toggle_entity(&EntityId::from("Texas")).unwrap();
        assert_eq!(view.lock().renders, 1);
    }

    #[test]
    fn test_double_detach_is_harmless() {
        let coordinator = coordinator();
        let view = Arc::new(Mutex::new(CountingView::default()));

        let binding = attach_view(&view, &coordinator);
        binding.detach(&coordinator);
        binding.detach(&coordinator);

        coordinator.emit_hover(&EntityId::from("Texas"));
        assert_eq!(view.lock().hovers, 0);
    }
}
