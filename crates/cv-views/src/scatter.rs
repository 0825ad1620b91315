//! Comparison scatter view adapter
//!
//! One point per (entity, year): total killed against total injured, with
//! a least-squares regression line over the visible points.

use ahash::AHashSet;
use chrono::Datelike;
use tracing::debug;

use cv_core::{EntityId, FilteredView};
use cv_data::IncidentRow;

use crate::adapter::ViewAdapter;

/// Yearly totals for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatterPoint {
    pub entity: EntityId,
    pub year: i32,
    pub total_killed: u64,
    pub total_injured: u64,
}

/// Least-squares fit of injured against killed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
}

impl Regression {
    pub fn predict(&self, killed: f64) -> f64 {
        self.slope * killed + self.intercept
    }
}

/// Derived data behind the comparison scatter chart.
#[derive(Default)]
pub struct ScatterView {
    points: Vec<ScatterPoint>,
    regression: Option<Regression>,
    highlighted: AHashSet<EntityId>,
}

impl ScatterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points in deterministic (entity, year) order.
    pub fn points(&self) -> &[ScatterPoint] {
        &self.points
    }

    /// `None` when the points are too few or degenerate to fit.
    pub fn regression(&self) -> Option<Regression> {
        self.regression
    }

    pub fn is_highlighted(&self, entity: &EntityId) -> bool {
        self.highlighted.contains(entity)
    }
}

fn fit(points: &[ScatterPoint]) -> Option<Regression> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.total_killed as f64).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.total_injured as f64).sum::<f64>() / n;

    let numerator: f64 = points
        .iter()
        .map(|p| (p.total_killed as f64 - x_mean) * (p.total_injured as f64 - y_mean))
        .sum();
    let denominator: f64 = points
        .iter()
        .map(|p| (p.total_killed as f64 - x_mean).powi(2))
        .sum();

    if denominator == 0.0 {
        return None;
    }
    let slope = numerator / denominator;
    Some(Regression {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

impl ViewAdapter<IncidentRow> for ScatterView {
    fn on_state_changed(&mut self, view: &FilteredView<IncidentRow>) {
        let mut totals: std::collections::BTreeMap<(EntityId, i32), (u64, u64)> =
            std::collections::BTreeMap::new();
        for row in &view.rows {
            let entry = totals
                .entry((row.entity.clone(), row.date.year()))
                .or_default();
            entry.0 += u64::from(row.n_killed);
            entry.1 += u64::from(row.n_injured);
        }

        self.points = totals
            .into_iter()
            .map(|((entity, year), (total_killed, total_injured))| ScatterPoint {
                entity,
                year,
                total_killed,
                total_injured,
            })
            .collect();
        self.regression = fit(&self.points);
        debug!(points = self.points.len(), "scatter rebuilt");
    }

    fn on_hover(&mut self, entity: &EntityId) {
        self.highlighted.insert(entity.clone());
    }

    fn on_hover_end(&mut self, entity: &EntityId) {
        self.highlighted.remove(entity);
    }
}
