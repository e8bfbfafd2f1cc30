//! In-process arm state backed by DashMap.
//! Used for tests, simulations and single-node deployments.

use crate::store::StateStore;
use bandit_core::{ArmState, BanditResult, ExperimentState};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

/// Concurrent in-memory store: `experiment_id -> arm_id -> field -> value`.
///
/// All writes for one experiment happen under that experiment's shard lock,
/// which makes `increment` atomic across threads.
#[derive(Default)]
pub struct InMemoryStateStore {
    experiments: DashMap<String, HashMap<String, ArmState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of experiments with any stored state.
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn get_arm_state(&self, experiment_id: &str, arm_id: &str) -> BanditResult<ArmState> {
        Ok(self
            .experiments
            .get(experiment_id)
            .and_then(|arms| arms.get(arm_id).cloned())
            .unwrap_or_default())
    }

    fn get_experiment_state(
        &self,
        experiment_id: &str,
        arm_ids: &[String],
    ) -> BanditResult<ExperimentState> {
        let arms = self.experiments.get(experiment_id);
        Ok(arm_ids
            .iter()
            .map(|arm_id| {
                let state = arms
                    .as_ref()
                    .and_then(|a| a.get(arm_id).cloned())
                    .unwrap_or_default();
                (arm_id.clone(), state)
            })
            .collect())
    }

    fn set_arm_state(
        &self,
        experiment_id: &str,
        arm_id: &str,
        state: &ArmState,
    ) -> BanditResult<()> {
        self.experiments
            .entry(experiment_id.to_string())
            .or_default()
            .insert(arm_id.to_string(), state.clone());
        Ok(())
    }

    fn increment(
        &self,
        experiment_id: &str,
        arm_id: &str,
        field: &str,
        amount: f64,
    ) -> BanditResult<f64> {
        let mut arms = self.experiments.entry(experiment_id.to_string()).or_default();
        let value = arms
            .entry(arm_id.to_string())
            .or_default()
            .entry(field.to_string())
            .or_insert(0.0);
        *value += amount;
        Ok(*value)
    }

    fn initialize_arm(
        &self,
        experiment_id: &str,
        arm_id: &str,
        default_state: &ArmState,
    ) -> BanditResult<()> {
        self.experiments
            .entry(experiment_id.to_string())
            .or_default()
            .entry(arm_id.to_string())
            .or_insert_with(|| default_state.clone());
        Ok(())
    }

    fn reset_experiment(&self, experiment_id: &str) -> BanditResult<()> {
        if let Some((_, arms)) = self.experiments.remove(experiment_id) {
            debug!(experiment_id, arms = arms.len(), "Experiment state reset");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state(pairs: &[(&str, f64)]) -> ArmState {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_missing_arm_returns_empty_state() {
        let store = InMemoryStateStore::new();
        assert!(store.get_arm_state("exp", "A").unwrap().is_empty());
        // Reads never create entries.
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_then_get_returns_independent_copy() {
        let store = InMemoryStateStore::new();
        store.set_arm_state("exp", "A", &state(&[("x", 1.0)])).unwrap();

        let mut first = store.get_arm_state("exp", "A").unwrap();
        assert_eq!(first, state(&[("x", 1.0)]));
        first.insert("x".to_string(), 99.0);
        first.insert("y".to_string(), 3.0);

        assert_eq!(store.get_arm_state("exp", "A").unwrap(), state(&[("x", 1.0)]));
    }

    #[test]
    fn test_set_replaces_full_field_set() {
        let store = InMemoryStateStore::new();
        store
            .set_arm_state("exp", "A", &state(&[("alpha", 2.0), ("beta", 3.0)]))
            .unwrap();
        store.set_arm_state("exp", "A", &state(&[("alpha", 7.0)])).unwrap();
        assert_eq!(store.get_arm_state("exp", "A").unwrap(), state(&[("alpha", 7.0)]));
    }

    #[test]
    fn test_experiment_state_has_entry_per_requested_arm() {
        let store = InMemoryStateStore::new();
        store.set_arm_state("exp", "A", &state(&[("count", 3.0)])).unwrap();

        let arms = vec!["A".to_string(), "B".to_string()];
        let snapshot = store.get_experiment_state("exp", &arms).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["A"]["count"], 3.0);
        assert!(snapshot["B"].is_empty());

        let unknown = store.get_experiment_state("other", &arms).unwrap();
        assert!(unknown.values().all(|s| s.is_empty()));
    }

    #[test]
    fn test_increment_matches_direct_write() {
        let store = InMemoryStateStore::new();
        assert_eq!(store.increment("exp", "A", "count", 1.0).unwrap(), 1.0);
        assert_eq!(store.increment("exp", "A", "count", 1.0).unwrap(), 2.0);

        let direct = InMemoryStateStore::new();
        direct.set_arm_state("exp", "A", &state(&[("count", 2.0)])).unwrap();
        assert_eq!(
            store.get_arm_state("exp", "A").unwrap(),
            direct.get_arm_state("exp", "A").unwrap()
        );
    }

    #[test]
    fn test_initialize_arm_is_noop_once_state_exists() {
        let store = InMemoryStateStore::new();
        store.set_arm_state("exp", "A", &state(&[("alpha", 5.0)])).unwrap();
        store
            .initialize_arm("exp", "A", &state(&[("alpha", 1.0), ("beta", 1.0)]))
            .unwrap();
        // No partial merge: beta stays absent.
        assert_eq!(store.get_arm_state("exp", "A").unwrap(), state(&[("alpha", 5.0)]));

        store
            .initialize_arm("exp", "B", &state(&[("alpha", 1.0), ("beta", 1.0)]))
            .unwrap();
        assert_eq!(
            store.get_arm_state("exp", "B").unwrap(),
            state(&[("alpha", 1.0), ("beta", 1.0)])
        );
    }

    #[test]
    fn test_ensure_arms_initializes_each_arm() {
        let store = InMemoryStateStore::new();
        store.increment("exp", "B", "count", 4.0).unwrap();
        let arms = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        store
            .ensure_arms("exp", &arms, &state(&[("count", 0.0), ("value_sum", 0.0)]))
            .unwrap();

        let snapshot = store.get_experiment_state("exp", &arms).unwrap();
        assert_eq!(snapshot["A"]["count"], 0.0);
        assert_eq!(snapshot["B"], state(&[("count", 4.0)]));
        assert_eq!(snapshot["C"]["value_sum"], 0.0);
    }

    #[test]
    fn test_reset_only_touches_one_experiment() {
        let store = InMemoryStateStore::new();
        store.increment("exp_1", "A", "count", 1.0).unwrap();
        store.increment("exp_2", "A", "count", 1.0).unwrap();

        store.reset_experiment("exp_1").unwrap();
        store.reset_experiment("never_created").unwrap();

        assert!(store.get_arm_state("exp_1", "A").unwrap().is_empty());
        assert_eq!(store.get_arm_state("exp_2", "A").unwrap()["count"], 1.0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryStateStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        store.increment("exp", "A", "count", 1.0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get_arm_state("exp", "A").unwrap()["count"], 8_000.0);
    }
}
