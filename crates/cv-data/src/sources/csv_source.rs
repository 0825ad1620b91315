//! CSV dataset source
//!
//! Loads the whole file in one blocking pass on the tokio blocking pool,
//! building the entity universe and year bounds alongside the rows. The
//! file is read once per session; every later interaction refilters the
//! cached copy instead of touching the file again.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use cv_core::{EntityId, EntityUniverse, LoadedDataset, RowSource, YearBounds};

use crate::config::DatasetConfig;
use crate::model::IncidentRow;
use crate::DataError;

/// CSV data source for loading incident datasets.
pub struct CsvSource {
    path: PathBuf,
    config: DatasetConfig,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, config: DatasetConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Load the full dataset off the async thread.
    pub async fn load_dataset(&self) -> Result<LoadedDataset<IncidentRow>, DataError> {
        let path = self.path.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || Self::read_file(&path, &config)).await?
    }

    fn read_file(
        path: &Path,
        config: &DatasetConfig,
    ) -> Result<LoadedDataset<IncidentRow>, DataError> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(config.has_headers)
            .from_reader(BufReader::new(file));

        let columns = if config.has_headers {
            let headers = reader.headers()?.clone();
            ColumnIndices::from_headers(&headers, config)?
        } else {
            ColumnIndices::from_positions(config)?
        };

        let mut rows = Vec::new();
        let mut universe = EntityUniverse::new();
        let mut min_year = i32::MAX;
        let mut max_year = i32::MIN;

        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let date = parse_date(columns.field(&record, columns.date, line)?, line)?;
            if config.excludes_year(date.year()) {
                continue;
            }

            let entity = EntityId::from(columns.field(&record, columns.entity, line)?);
            let n_killed = parse_count(columns.field(&record, columns.killed, line)?, line)?;
            let n_injured = parse_count(columns.field(&record, columns.injured, line)?, line)?;

            min_year = min_year.min(date.year());
            max_year = max_year.max(date.year());
            universe.insert(entity.clone());
            rows.push(IncidentRow {
                entity,
                date,
                n_killed,
                n_injured,
            });
        }

        if rows.is_empty() {
            return Err(DataError::Empty);
        }

        info!(
            path = %path.display(),
            rows = rows.len(),
            entities = universe.len(),
            "csv dataset loaded"
        );

        Ok(LoadedDataset {
            rows: Arc::new(rows),
            universe,
            bounds: YearBounds::new(min_year, max_year),
        })
    }

    /// File name used in logs and error surfaces.
    pub fn source_name_str(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown.csv")
    }
}

#[async_trait]
impl RowSource for CsvSource {
    type Row = IncidentRow;

    async fn load(&self) -> anyhow::Result<LoadedDataset<IncidentRow>> {
        Ok(self.load_dataset().await?)
    }

    fn source_name(&self) -> &str {
        self.source_name_str()
    }
}

/// Resolved column positions for one file layout.
struct ColumnIndices {
    entity: usize,
    date: usize,
    killed: usize,
    injured: usize,
}

impl ColumnIndices {
    fn from_headers(headers: &StringRecord, config: &DatasetConfig) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn(name.to_owned()))
        };
        Ok(Self {
            entity: find(&config.entity_column)?,
            date: find(&config.date_column)?,
            killed: find(&config.killed_column)?,
            injured: find(&config.injured_column)?,
        })
    }

    /// Headerless files address columns by 0-based position.
    fn from_positions(config: &DatasetConfig) -> Result<Self, DataError> {
        let parse = |name: &str| {
            name.parse::<usize>().map_err(|_| {
                DataError::Config(format!(
                    "headerless file needs numeric column indices, got '{name}'"
                ))
            })
        };
        Ok(Self {
            entity: parse(&config.entity_column)?,
            date: parse(&config.date_column)?,
            killed: parse(&config.killed_column)?,
            injured: parse(&config.injured_column)?,
        })
    }

    fn field<'r>(&self, record: &'r StringRecord, idx: usize, line: u64) -> Result<&'r str, DataError> {
        record.get(idx).ok_or(DataError::Record {
            line,
            message: format!("missing field {idx}"),
        })
    }
}

/// Day-resolution date, or a bare year taken as January 1st.
fn parse_date(value: &str, line: u64) -> Result<NaiveDate, DataError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    value
        .parse::<i32>()
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .ok_or(DataError::Record {
            line,
            message: format!("unparseable date '{value}'"),
        })
}

/// Outcome counts; an empty field counts as zero.
fn parse_count(value: &str, line: u64) -> Result<u32, DataError> {
    if value.is_empty() {
        return Ok(0);
    }
    value.parse::<u32>().map_err(|_| DataError::Record {
        line,
        message: format!("unparseable count '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::DatasetCache;
    use std::sync::atomic::{AtomicU64, Ordering};

    static FILE_SEQ: AtomicU64 = AtomicU64::new(0);

    fn write_fixture(contents: &str) -> PathBuf {
        let seq = FILE_SEQ.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "cv-data-test-{}-{}.csv",
            std::process::id(),
            seq
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const FIXTURE: &str = "\
state,date,n_killed,n_injured
New York,2014-06-01,1,2
California,2015-07-15,0,3
New York,2016-01-20,2,
Texas,2013-12-31,5,5
";

    #[tokio::test]
    async fn test_load_builds_universe_and_bounds() {
        let path = write_fixture(FIXTURE);
        let source = CsvSource::new(&path, DatasetConfig::default());

        let dataset = source.load_dataset().await.unwrap();
        assert_eq!(dataset.rows.len(), 4);
        assert_eq!(dataset.universe.len(), 3);
        assert_eq!(dataset.bounds, YearBounds::new(2013, 2016));

        // Empty count field reads as zero.
        assert_eq!(dataset.rows[2].n_injured, 0);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_exclude_years_drops_rows_at_parse_time() {
        let path = write_fixture(FIXTURE);
        let config = DatasetConfig::default().with_excluded_year(2013);
        let source = CsvSource::new(&path, config);

        let dataset = source.load_dataset().await.unwrap();
        assert_eq!(dataset.rows.len(), 3);
        assert!(!dataset.universe.contains(&EntityId::from("Texas")));
        assert_eq!(dataset.bounds, YearBounds::new(2014, 2016));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_column_is_a_load_failure() {
        let path = write_fixture("state,when\nNew York,2014-06-01\n");
        let source = CsvSource::new(&path, DatasetConfig::default());

        let err = source.load_dataset().await.unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(name) if name == "date"));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_garbled_record_is_a_load_failure() {
        let path = write_fixture("state,date,n_killed,n_injured\nNew York,not-a-date,1,2\n");
        let source = CsvSource::new(&path, DatasetConfig::default());

        let err = source.load_dataset().await.unwrap_err();
        assert!(matches!(err, DataError::Record { .. }));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_empty_dataset_is_a_load_failure() {
        let path = write_fixture("state,date,n_killed,n_injured\n");
        let source = CsvSource::new(&path, DatasetConfig::default());

        let err = source.load_dataset().await.unwrap_err();
        assert!(matches!(err, DataError::Empty));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_bare_year_dates_parse() {
        let path = write_fixture("state,date,n_killed,n_injured\nTexas,2017,1,0\n");
        let source = CsvSource::new(&path, DatasetConfig::default());

        let dataset = source.load_dataset().await.unwrap();
        assert_eq!(dataset.rows[0].date, NaiveDate::from_ymd_opt(2017, 1, 1).unwrap());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_load_into_commits_to_cache() {
        let path = write_fixture(FIXTURE);
        let source = CsvSource::new(&path, DatasetConfig::default());

        let cache = DatasetCache::new();
        assert!(source.load_into(&cache).await.unwrap());
        assert_eq!(cache.get().unwrap().rows.len(), 4);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_later_load_wins() {
        let path_a = write_fixture(FIXTURE);
        let path_b = write_fixture("state,date,n_killed,n_injured\nTexas,2017-05-05,1,0\n");

        let cache = DatasetCache::new();
        let source_a = CsvSource::new(&path_a, DatasetConfig::default());
        let source_b = CsvSource::new(&path_b, DatasetConfig::default());

        // First load starts, then a second is requested before the first
        // commits; the first's result must be discarded when it arrives.
        let ticket_a = cache.begin_load();
        let dataset_a = source_a.load_dataset().await.unwrap();
        assert!(source_b.load_into(&cache).await.unwrap());
        assert!(!cache.commit(ticket_a, dataset_a));

        assert_eq!(cache.get().unwrap().rows.len(), 1);

        std::fs::remove_file(path_a).ok();
        std::fs::remove_file(path_b).ok();
    }
}
