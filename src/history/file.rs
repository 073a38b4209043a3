use super::{DEFAULT_MAX_RECORDS, HistoryStatistics, HistoryStore, MemoryHistoryStore, SimulationRecord};
use crate::error::HistoryError;
use std::fs;
use std::path::{Path, PathBuf};

/// A history store persisted as a single JSON array.
///
/// The file is read once on open and rewritten after every mutation. It is only
/// created by the first mutation. A mutation whose write fails leaves the store
/// unchanged.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
    cache: MemoryHistoryStore,
}

impl JsonFileHistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        Self::with_capacity(path, DEFAULT_MAX_RECORDS)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, max_records: usize) -> Result<Self, HistoryError> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
            serde_json::from_str(&raw)?
        } else {
            Vec::new()
        };
        Ok(Self {
            cache: MemoryHistoryStore::from_records(records, max_records),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutate` to a copy of the cache and keeps the copy only once it is on disk.
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut MemoryHistoryStore) -> Result<T, HistoryError>,
    ) -> Result<T, HistoryError> {
        let mut staged = self.cache.clone();
        let result = mutate(&mut staged)?;
        self.persist(staged.records())?;
        self.cache = staged;
        Ok(result)
    }

    fn persist(&self, records: &[SimulationRecord]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).map_err(|source| io_error(&self.path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> HistoryError {
    HistoryError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn save(&mut self, record: SimulationRecord) -> Result<(), HistoryError> {
        self.commit(|cache| cache.save(record))
    }

    fn list(&self, limit: usize) -> Result<Vec<SimulationRecord>, HistoryError> {
        self.cache.list(limit)
    }

    fn get(&self, id: &str) -> Result<Option<SimulationRecord>, HistoryError> {
        self.cache.get(id)
    }

    fn list_by_workflow(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> Result<Vec<SimulationRecord>, HistoryError> {
        self.cache.list_by_workflow(workflow_id, limit)
    }

    fn delete(&mut self, id: &str) -> Result<bool, HistoryError> {
        if self.cache.get(id)?.is_none() {
            return Ok(false);
        }
        self.commit(|cache| cache.delete(id))
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.commit(MemoryHistoryStore::clear)
    }

    fn statistics(&self) -> Result<HistoryStatistics, HistoryError> {
        self.cache.statistics()
    }
}
