//! The storage capability every strategy is written against.

use bandit_core::{ArmState, BanditResult, ExperimentState};

/// Strategy-agnostic persistence for per-arm statistics.
///
/// Keys are namespaced by experiment id, so state recorded for one experiment
/// is never visible to another. Every returned map is an owned copy; mutating
/// it does not affect the store.
///
/// `increment` is the one atomic primitive the engine relies on: concurrent
/// increments of the same field must never lose an update.
pub trait StateStore: Send + Sync {
    /// Full field set for one arm; empty when the arm has no state yet.
    fn get_arm_state(&self, experiment_id: &str, arm_id: &str) -> BanditResult<ArmState>;

    /// One entry per requested arm id, each possibly empty.
    fn get_experiment_state(
        &self,
        experiment_id: &str,
        arm_ids: &[String],
    ) -> BanditResult<ExperimentState> {
        arm_ids
            .iter()
            .map(|arm_id| Ok((arm_id.clone(), self.get_arm_state(experiment_id, arm_id)?)))
            .collect()
    }

    /// Replace the arm's field set. Fields absent from `state` are removed.
    fn set_arm_state(&self, experiment_id: &str, arm_id: &str, state: &ArmState)
        -> BanditResult<()>;

    /// Add `amount` to `field` (created at 0.0 if absent) and return the new value.
    fn increment(
        &self,
        experiment_id: &str,
        arm_id: &str,
        field: &str,
        amount: f64,
    ) -> BanditResult<f64>;

    /// Write `default_state` only if the arm has no state at all. Never merges.
    fn initialize_arm(
        &self,
        experiment_id: &str,
        arm_id: &str,
        default_state: &ArmState,
    ) -> BanditResult<()>;

    /// Drop every arm under `experiment_id`. Unknown experiments are a no-op.
    fn reset_experiment(&self, experiment_id: &str) -> BanditResult<()>;

    /// `initialize_arm` for each id. Not atomic across the set.
    fn ensure_arms(
        &self,
        experiment_id: &str,
        arm_ids: &[String],
        default_state: &ArmState,
    ) -> BanditResult<()> {
        for arm_id in arm_ids {
            self.initialize_arm(experiment_id, arm_id, default_state)?;
        }
        Ok(())
    }
}
