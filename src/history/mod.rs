//! Persistence of finished (or abandoned) simulation runs.

mod file;
mod memory;
mod record;

pub use file::JsonFileHistoryStore;
pub use memory::MemoryHistoryStore;
pub use record::{RunOutcome, SimulationRecord};

use crate::error::HistoryError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RECORDS: usize = 50;

/// Counts of stored runs by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics {
    pub total: usize,
    pub success: usize,
    pub error: usize,
    pub partial: usize,
}

/// A bounded store of simulation records.
pub trait HistoryStore {
    /// Stores a record, then drops the oldest records beyond capacity.
    fn save(&mut self, record: SimulationRecord) -> Result<(), HistoryError>;

    /// At most `limit` records, newest first.
    fn list(&self, limit: usize) -> Result<Vec<SimulationRecord>, HistoryError>;

    fn get(&self, id: &str) -> Result<Option<SimulationRecord>, HistoryError>;

    fn list_by_workflow(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> Result<Vec<SimulationRecord>, HistoryError>;

    /// Returns whether a record was removed.
    fn delete(&mut self, id: &str) -> Result<bool, HistoryError>;

    fn clear(&mut self) -> Result<(), HistoryError>;

    fn statistics(&self) -> Result<HistoryStatistics, HistoryError>;
}
