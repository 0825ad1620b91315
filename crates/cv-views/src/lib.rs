//! View adapters for the coordinated multi-view platform
//!
//! Each adapter consumes filtered row sets and transient highlight signals
//! from the coordinator and maintains the derived data its chart renders.
//! Drawing itself (paths, projections, axis layout) belongs to the
//! embedding UI; these adapters stop at render-ready aggregates.

pub mod adapter;
pub mod geo;
pub mod regions;
pub mod scatter;
pub mod time_series;

pub use adapter::{attach_view, ViewAdapter, ViewBinding};
pub use geo::GeoAggregateView;
pub use scatter::{Regression, ScatterPoint, ScatterView};
pub use time_series::{MonthBucket, TimeSeriesView, YearMonth};

#[cfg(test)]
mod tests {
    //! Full-pipeline tests: CSV file -> cache -> coordinator -> adapters.

    use std::sync::Arc;

    use parking_lot::Mutex;

    use cv_core::{DatasetCache, EntityId, RowSource, ViewCoordinator};
    use cv_data::{CsvSource, DatasetConfig, IncidentRow};

    use super::*;

    const FIXTURE: &str = "\
state,date,n_killed,n_injured
New York,2014-03-01,1,2
New York,2015-06-10,0,1
California,2015-06-12,2,2
California,2016-01-05,1,0
Texas,2016-09-20,3,1
Texas,2013-11-11,9,9
";

    async fn pipeline() -> (
        ViewCoordinator<IncidentRow>,
        Arc<Mutex<TimeSeriesView>>,
        Arc<Mutex<ScatterView>>,
        Arc<Mutex<GeoAggregateView>>,
    ) {
        use std::sync::atomic::{AtomicU64, Ordering};
        static FILE_SEQ: AtomicU64 = AtomicU64::new(0);

        let path = std::env::temp_dir().join(format!(
            "cv-views-e2e-{}-{}.csv",
            std::process::id(),
            FILE_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::write(&path, FIXTURE).unwrap();

        let cache = Arc::new(DatasetCache::new());
        let source = CsvSource::new(&path, DatasetConfig::default().with_excluded_year(2013));
        assert!(source.load_into(&cache).await.unwrap());
        std::fs::remove_file(path).ok();

        let coordinator = ViewCoordinator::new(cache).unwrap();

        let time_series = Arc::new(Mutex::new(TimeSeriesView::new()));
        let scatter = Arc::new(Mutex::new(ScatterView::new()));
        let geo = Arc::new(Mutex::new(GeoAggregateView::new()));
        attach_view(&time_series, &coordinator);
        attach_view(&scatter, &coordinator);
        attach_view(&geo, &coordinator);

        coordinator.refresh().unwrap();
        (coordinator, time_series, scatter, geo)
    }

    #[tokio::test]
    async fn test_initial_render_reaches_every_view() {
        let (_coordinator, time_series, scatter, geo) = pipeline().await;

        // The 2013 row is excluded at parse time; five rows remain.
        assert_eq!(geo.lock().count_for("NY"), 2);
        assert_eq!(geo.lock().count_for("CA"), 2);
        assert_eq!(geo.lock().count_for("TX"), 1);

        assert_eq!(time_series.lock().entities().count(), 3);
        assert_eq!(scatter.lock().points().len(), 5);
    }

    #[tokio::test]
    async fn test_click_filters_all_views_consistently() {
        let (coordinator, time_series, scatter, geo) = pipeline().await;

        coordinator.toggle_entity(&EntityId::from("California")).unwrap();

        assert_eq!(geo.lock().count_for("CA"), 2);
        assert_eq!(geo.lock().count_for("NY"), 0);
        assert_eq!(scatter.lock().points().len(), 2);
        assert!(time_series.lock().series_for(&EntityId::from("Texas")).is_none());
    }

    #[tokio::test]
    async fn test_time_slider_narrows_every_view() {
        let (coordinator, time_series, scatter, geo) = pipeline().await;

        coordinator.set_time_range(2016, 2016).unwrap();

        assert_eq!(geo.lock().count_for("NY"), 0);
        assert_eq!(geo.lock().count_for("CA"), 1);
        assert_eq!(geo.lock().count_for("TX"), 1);
        assert_eq!(time_series.lock().months().len(), 2);
        assert_eq!(scatter.lock().points().len(), 2);
    }

    #[tokio::test]
    async fn test_hover_fans_out_without_refiltering() {
        let (coordinator, time_series, scatter, geo) = pipeline().await;
        let before = geo.lock().count_for("NY");

        let ny = EntityId::from("New York");
        coordinator.emit_hover(&ny);

        assert!(time_series.lock().is_highlighted(&ny));
        assert!(scatter.lock().is_highlighted(&ny));
        assert_eq!(geo.lock().highlighted_keys(), vec!["NY"]);
        // Hover never reruns the filter.
        assert_eq!(geo.lock().count_for("NY"), before);

        coordinator.emit_hover_end(&ny);
        assert!(!time_series.lock().is_highlighted(&ny));
        assert!(geo.lock().highlighted_keys().is_empty());
    }

    #[tokio::test]
    async fn test_reset_restores_full_dashboard() {
        let (coordinator, _time_series, scatter, geo) = pipeline().await;

        coordinator.toggle_entity(&EntityId::from("Texas")).unwrap();
        coordinator.set_time_range(2016, 2016).unwrap();
        coordinator.reset().unwrap();

        assert_eq!(geo.lock().count_for("NY"), 2);
        assert_eq!(scatter.lock().points().len(), 5);
    }
}
