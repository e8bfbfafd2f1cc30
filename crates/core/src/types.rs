use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-arm statistics, field name -> value. The field set is chosen by the
/// strategy that reads it; missing fields mean "use the strategy default".
pub type ArmState = HashMap<String, f64>;

/// `arm_id -> ArmState` for one experiment.
pub type ExperimentState = HashMap<String, ArmState>;

/// Free-form construction parameters for a strategy, e.g. `{"epsilon": 0.2}`.
pub type ParamBag = serde_json::Map<String, serde_json::Value>;

/// Caller-supplied request context. Accepted by every strategy, read by none.
pub type UserContext = serde_json::Map<String, serde_json::Value>;

/// Experiment metadata as returned by an experiment lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub experiment_id: String,
    pub arm_ids: Vec<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub strategy_params: ParamBag,
}

impl ExperimentConfig {
    pub fn new(experiment_id: impl Into<String>, arm_ids: Vec<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            arm_ids,
            strategy: None,
            strategy_params: ParamBag::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>, params: ParamBag) -> Self {
        self.strategy = Some(strategy.into());
        self.strategy_params = params;
        self
    }
}
