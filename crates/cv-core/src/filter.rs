//! Pure filter engine
//!
//! A referentially transparent projection from (rows, selection) to the
//! visible row subset. No internal state, no error path: an empty result
//! is a valid outcome that views render as an empty state.

use crate::data::DatasetRow;
use crate::selection::SelectionState;

/// The row subset matching one selection snapshot, in source order.
/// Produced per transition and consumed immediately; not cached across
/// state changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<R> {
    pub rows: Vec<R>,
    pub state: SelectionState,
}

impl<R> FilteredView<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Stable filter: keeps rows whose entity is in the denoted set and whose
/// year falls inside the active window, preserving relative row order.
/// `All` matches without materializing the universe.
pub fn filter_rows<R: DatasetRow + Clone>(rows: &[R], state: &SelectionState) -> FilteredView<R> {
    let rows = rows
        .iter()
        .filter(|row| state.matches(row.entity_id(), row.year()))
        .cloned()
        .collect();
    FilteredView {
        rows,
        state: state.clone(),
    }
}
