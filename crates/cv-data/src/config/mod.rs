//! Dataset configuration for data loading

use serde::{Deserialize, Serialize};

use crate::DataError;

/// Column mapping and parse options for a row-oriented dataset file.
///
/// The defaults match the incident dataset the dashboard was built around
/// (`state`, `date`, `n_killed`, `n_injured`). `exclude_years` drops whole
/// years at parse time, before they can reach the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Column holding the entity identifier.
    pub entity_column: String,

    /// Column holding the date (`YYYY-MM-DD`) or a bare year.
    pub date_column: String,

    /// Column holding the killed count.
    pub killed_column: String,

    /// Column holding the injured count.
    pub injured_column: String,

    /// Whether the file carries a header row.
    pub has_headers: bool,

    /// Years dropped entirely during the load pass.
    pub exclude_years: Vec<i32>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            entity_column: "state".to_owned(),
            date_column: "date".to_owned(),
            killed_column: "n_killed".to_owned(),
            injured_column: "n_injured".to_owned(),
            has_headers: true,
            exclude_years: Vec::new(),
        }
    }
}

impl DatasetConfig {
    pub fn with_excluded_year(mut self, year: i32) -> Self {
        self.exclude_years.push(year);
        self
    }

    pub fn excludes_year(&self, year: i32) -> bool {
        self.exclude_years.contains(&year)
    }

    /// Parse a configuration from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
