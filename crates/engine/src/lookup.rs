//! Experiment metadata lookup and an in-memory registry implementing it.

use crate::strategies::epsilon_greedy::check_epsilon;
use crate::strategy::{StrategyKind, StrategyParams};
use bandit_core::{BanditError, BanditResult, ExperimentConfig, ParamBag};
use dashmap::DashMap;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Read access to experiment metadata, as needed by the strategy factory.
pub trait ExperimentLookup: Send + Sync {
    /// `Ok(None)` when the experiment does not exist.
    fn get_experiment(&self, experiment_id: &str) -> BanditResult<Option<ExperimentConfig>>;
}

/// Process-local experiment registry.
#[derive(Default)]
pub struct ExperimentRegistry {
    experiments: DashMap<String, ExperimentConfig>,
}

impl ExperimentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new experiment. Requires at least two unique, non-empty arm
    /// ids; a configured strategy name is stored in canonical form and a blank
    /// one is dropped.
    pub fn create_experiment(&self, mut config: ExperimentConfig) -> BanditResult<ExperimentConfig> {
        if config.experiment_id.trim().is_empty() {
            return Err(BanditError::InvalidExperiment(
                "experiment id must not be empty".to_string(),
            ));
        }
        validate_arm_ids(&config.arm_ids)?;
        if config.arm_ids.len() < 2 {
            return Err(BanditError::InvalidExperiment(format!(
                "experiment '{}' needs at least two arms",
                config.experiment_id
            )));
        }
        // A blank name means "use the default strategy".
        if let Some(name) = config.strategy.take().filter(|n| !n.trim().is_empty()) {
            config.strategy = Some(StrategyKind::from_name(&name)?.as_str().to_string());
        }
        validate_params(&config.strategy_params)?;

        match self.experiments.entry(config.experiment_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(BanditError::ExperimentExists(config.experiment_id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                info!(
                    experiment_id = %config.experiment_id,
                    arms = config.arm_ids.len(),
                    strategy = ?config.strategy,
                    "Experiment registered"
                );
                slot.insert(config.clone());
                Ok(config)
            }
        }
    }

    /// Merge new arms into an experiment. The resulting arm list is sorted and
    /// de-duplicated; adding a single arm is allowed.
    pub fn add_arms(&self, experiment_id: &str, arm_ids: &[String]) -> BanditResult<ExperimentConfig> {
        if arm_ids.iter().any(|a| a.is_empty()) {
            return Err(BanditError::InvalidExperiment(
                "arm ids must not be empty".to_string(),
            ));
        }
        let mut entry = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| BanditError::ExperimentNotFound(experiment_id.to_string()))?;

        let merged: BTreeSet<String> = entry
            .arm_ids
            .iter()
            .chain(arm_ids.iter())
            .cloned()
            .collect();
        entry.arm_ids = merged.into_iter().collect();
        Ok(entry.value().clone())
    }

    /// Change the configured strategy. The name and parameters are validated
    /// before the record is touched. Arm state is left as it is.
    pub fn set_strategy(
        &self,
        experiment_id: &str,
        strategy: &str,
        params: ParamBag,
    ) -> BanditResult<ExperimentConfig> {
        let kind = StrategyKind::from_name(strategy)?;
        validate_params(&params)?;

        let mut entry = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| BanditError::ExperimentNotFound(experiment_id.to_string()))?;
        info!(experiment_id, strategy = %kind, "Experiment strategy changed");
        entry.strategy = Some(kind.as_str().to_string());
        entry.strategy_params = params;
        Ok(entry.value().clone())
    }

    pub fn list_experiments(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.experiments.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl ExperimentLookup for ExperimentRegistry {
    fn get_experiment(&self, experiment_id: &str) -> BanditResult<Option<ExperimentConfig>> {
        Ok(self.experiments.get(experiment_id).map(|e| e.value().clone()))
    }
}

fn validate_arm_ids(arm_ids: &[String]) -> BanditResult<()> {
    let mut seen = HashSet::with_capacity(arm_ids.len());
    for arm_id in arm_ids {
        if arm_id.is_empty() {
            return Err(BanditError::InvalidExperiment(
                "arm ids must not be empty".to_string(),
            ));
        }
        if !seen.insert(arm_id.as_str()) {
            return Err(BanditError::InvalidExperiment(format!(
                "duplicate arm id '{arm_id}'"
            )));
        }
    }
    Ok(())
}

fn validate_params(bag: &ParamBag) -> BanditResult<()> {
    let params = StrategyParams::from_bag(bag)?;
    if let Some(epsilon) = params.epsilon {
        check_epsilon(epsilon)?;
    }
    Ok(())
}
