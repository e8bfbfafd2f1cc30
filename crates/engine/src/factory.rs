//! Resolves an experiment's configured strategy into a live instance.
//!
//! Switching an experiment to another strategy does not migrate or clear
//! stored arm state. Each algorithm reads only its own fields and treats the
//! rest as absent, so fields left behind by a previous strategy stay in the
//! store untouched.

use crate::lookup::ExperimentLookup;
use crate::strategy::{Strategy, StrategyKind, StrategyParams};
use bandit_core::{BanditConfig, BanditResult, ParamBag};
use bandit_state::StateStore;
use std::sync::Arc;
use tracing::debug;

pub struct StrategyFactory {
    state_store: Arc<dyn StateStore>,
    experiments: Arc<dyn ExperimentLookup>,
    default_strategy: StrategyKind,
}

impl StrategyFactory {
    /// Fails if `default_strategy` is not a supported name.
    pub fn new(
        state_store: Arc<dyn StateStore>,
        experiments: Arc<dyn ExperimentLookup>,
        default_strategy: &str,
    ) -> BanditResult<Self> {
        let default_strategy = StrategyKind::from_name(default_strategy)?;
        debug!(default_strategy = %default_strategy, "Strategy factory ready");
        Ok(Self {
            state_store,
            experiments,
            default_strategy,
        })
    }

    pub fn from_config(
        config: &BanditConfig,
        state_store: Arc<dyn StateStore>,
        experiments: Arc<dyn ExperimentLookup>,
    ) -> BanditResult<Self> {
        Self::new(state_store, experiments, &config.default_strategy)
    }

    /// Canonical name for `name`, or `UnsupportedStrategy` listing the valid ones.
    pub fn validate_strategy_name(name: &str) -> BanditResult<&'static str> {
        StrategyKind::from_name(name).map(StrategyKind::as_str)
    }

    pub fn default_strategy(&self) -> StrategyKind {
        self.default_strategy
    }

    /// Build the strategy configured for `experiment_id`, falling back to the
    /// default strategy when none is configured, the configured name is blank,
    /// or the experiment is unknown.
    pub fn build_for_experiment(&self, experiment_id: &str) -> BanditResult<Strategy> {
        let (configured, params) = match self.experiments.get_experiment(experiment_id)? {
            Some(experiment) => (experiment.strategy, experiment.strategy_params),
            None => {
                debug!(experiment_id, "Unknown experiment, using default strategy");
                (None, ParamBag::new())
            }
        };

        let kind = match configured.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => StrategyKind::from_name(name)?,
            _ => self.default_strategy,
        };
        debug!(experiment_id, strategy = %kind, "Resolved strategy");
        self.build(kind, &params)
    }

    /// Build a strategy of the given kind from a raw parameter bag.
    pub fn build(&self, kind: StrategyKind, params: &ParamBag) -> BanditResult<Strategy> {
        let params = StrategyParams::from_bag(params)?;
        Strategy::build(kind, Arc::clone(&self.state_store), &params)
    }
}
