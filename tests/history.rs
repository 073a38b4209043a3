//! Saving, listing and pruning simulation records.
mod common;
use common::*;
use saisei::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn record(id: &str, workflow_id: &str, timestamp: u64, status: RunOutcome) -> SimulationRecord {
    let mut sim = create_simulator(create_branch_workflow(), json!({ "temperature": 50 }));
    let state = tokio_test::block_on(run_to_completion(&mut sim));
    SimulationRecord {
        id: id.to_string(),
        workflow_id: workflow_id.to_string(),
        timestamp,
        status,
        ..SimulationRecord::from_state(workflow_id, "Branch", sim.initial_data().clone(), state)
    }
}

#[cfg(test)]
mod history_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_outcomes() {
        let mut sim = create_simulator(create_branch_workflow(), json!({ "temperature": 95 }));
        sim.start().await;
        assert_eq!(SimulationRecord::capture(&sim).status, RunOutcome::Partial);

        run_to_completion(&mut sim).await;
        let done = SimulationRecord::capture(&sim);
        assert_eq!(done.status, RunOutcome::Success);
        assert_eq!(done.workflow_id, "wf-test");
        assert_eq!(done.workflow_name, "Test workflow");
        assert_eq!(done.steps.len(), 3);
        assert_eq!(done.initial_data, data(json!({ "temperature": 95 })));

        let mut broken = create_simulator(create_branch_workflow(), json!({}));
        run_to_completion(&mut broken).await;
        assert_eq!(SimulationRecord::capture(&broken).status, RunOutcome::Error);
    }

    #[test]
    fn test_list_is_newest_first_and_limited() {
        let mut store = MemoryHistoryStore::default();
        store.save(record("a", "wf", 100, RunOutcome::Success)).unwrap();
        store.save(record("b", "wf", 300, RunOutcome::Success)).unwrap();
        store.save(record("c", "wf", 200, RunOutcome::Success)).unwrap();

        let ids: Vec<_> = store.list(10).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert_eq!(store.list(1).unwrap().len(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut store = MemoryHistoryStore::new(2);
        store.save(record("old", "wf", 1, RunOutcome::Success)).unwrap();
        store.save(record("mid", "wf", 2, RunOutcome::Success)).unwrap();
        store.save(record("new", "wf", 3, RunOutcome::Success)).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("old").unwrap().is_none());
        assert!(store.get("new").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut store = MemoryHistoryStore::default();
        store.save(record("a", "wf", 1, RunOutcome::Success)).unwrap();
        assert!(matches!(
            store.save(record("a", "wf", 2, RunOutcome::Success)),
            Err(HistoryError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_filter_delete_and_statistics() {
        let mut store = MemoryHistoryStore::default();
        store.save(record("a", "pump", 1, RunOutcome::Success)).unwrap();
        store.save(record("b", "fan", 2, RunOutcome::Error)).unwrap();
        store.save(record("c", "pump", 3, RunOutcome::Partial)).unwrap();

        let pump: Vec<_> = store
            .list_by_workflow("pump", 10)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(pump, ["c", "a"]);

        let stats = store.statistics().unwrap();
        assert_eq!((stats.total, stats.success, stats.error, stats.partial), (3, 1, 1, 1));

        assert!(store.delete("b").unwrap());
        assert!(!store.delete("b").unwrap());
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.json");

        {
            let mut store = JsonFileHistoryStore::open(&path).unwrap();
            assert!(!path.exists());
            store.save(record("a", "wf", 1, RunOutcome::Success)).unwrap();
            store.save(record("b", "wf", 2, RunOutcome::Error)).unwrap();
        }

        let mut reopened = JsonFileHistoryStore::open(&path).unwrap();
        let restored = reopened.get("b").unwrap().unwrap();
        assert_eq!(restored.status, RunOutcome::Error);
        assert_eq!(restored.final_state.steps, restored.steps);
        assert_eq!(reopened.list(10).unwrap().len(), 2);

        reopened.delete("a").unwrap();
        let again = JsonFileHistoryStore::open(&path).unwrap();
        assert_eq!(again.statistics().unwrap().total, 1);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let mut store = JsonFileHistoryStore::open(&path).unwrap();
        store.save(record("a", "wf", 1, RunOutcome::Success)).unwrap();

        // A directory in place of the file makes every write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(
            store.save(record("b", "wf", 2, RunOutcome::Success)),
            Err(HistoryError::Io { .. })
        ));
        assert!(store.get("b").unwrap().is_none());
        assert!(store.delete("a").is_err());
        assert!(store.clear().is_err());
        assert_eq!(store.list(10).unwrap().len(), 1);
        assert!(store.get("a").unwrap().is_some());

        std::fs::remove_dir(&path).unwrap();
        store.save(record("b", "wf", 2, RunOutcome::Success)).unwrap();
        assert_eq!(store.statistics().unwrap().total, 2);
        assert_eq!(
            JsonFileHistoryStore::open(&path).unwrap().list(10).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileHistoryStore::open(&path),
            Err(HistoryError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_reloading_a_run_reproduces_it() {
        let mut sim = create_simulator(create_maintenance_workflow(), json!({
            "temperature": 70, "vibration": 5, "readings": [60, 70, 80]
        }));
        run_to_completion(&mut sim).await;
        let saved = SimulationRecord::capture(&sim);

        let mut rerun =
            WorkflowSimulator::builder(create_maintenance_workflow(), saved.initial_data.clone())
                .with_clock(FrozenClock)
                .build();
        let state = run_to_completion(&mut rerun).await;
        assert_eq!(state.steps, saved.steps);
    }
}
