use super::{
    DEFAULT_MAX_RECORDS, HistoryStatistics, HistoryStore, RunOutcome, SimulationRecord,
};
use crate::error::HistoryError;
use itertools::Itertools;

/// Keeps records in memory, in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryHistoryStore {
    records: Vec<SimulationRecord>,
    max_records: usize,
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

impl MemoryHistoryStore {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Vec::new(),
            max_records,
        }
    }

    pub(super) fn from_records(records: Vec<SimulationRecord>, max_records: usize) -> Self {
        let mut store = Self {
            records,
            max_records,
        };
        store.enforce_capacity();
        store
    }

    pub(super) fn records(&self) -> &[SimulationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn newest_first(
        &self,
        filter: impl Fn(&SimulationRecord) -> bool,
        limit: usize,
    ) -> Vec<SimulationRecord> {
        // Reverse first so equal timestamps keep the later insertion in front.
        self.records
            .iter()
            .rev()
            .filter(|r| filter(*r))
            .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
            .take(limit)
            .cloned()
            .collect()
    }

    fn enforce_capacity(&mut self) {
        while self.records.len() > self.max_records {
            let Some(oldest) = self.records.iter().position_min_by_key(|r| r.timestamp) else {
                break;
            };
            let dropped = self.records.remove(oldest);
            log::debug!("History full, dropped run '{}'", dropped.id);
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn save(&mut self, record: SimulationRecord) -> Result<(), HistoryError> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(HistoryError::DuplicateId(record.id));
        }
        self.records.push(record);
        self.enforce_capacity();
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<SimulationRecord>, HistoryError> {
        Ok(self.newest_first(|_| true, limit))
    }

    fn get(&self, id: &str) -> Result<Option<SimulationRecord>, HistoryError> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn list_by_workflow(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> Result<Vec<SimulationRecord>, HistoryError> {
        Ok(self.newest_first(|r| r.workflow_id == workflow_id, limit))
    }

    fn delete(&mut self, id: &str) -> Result<bool, HistoryError> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        Ok(self.records.len() != before)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.records.clear();
        Ok(())
    }

    fn statistics(&self) -> Result<HistoryStatistics, HistoryError> {
        let counts = self.records.iter().counts_by(|r| r.status);
        let count = |outcome: RunOutcome| counts.get(&outcome).copied().unwrap_or(0);
        Ok(HistoryStatistics {
            total: self.records.len(),
            success: count(RunOutcome::Success),
            error: count(RunOutcome::Error),
            partial: count(RunOutcome::Partial),
        })
    }
}
