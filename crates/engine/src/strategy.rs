//! Common strategy contract, the closed set of algorithms behind it, and
//! strategy name resolution.

use crate::strategies::{EpsilonGreedy, ThompsonSampling, Ucb1};
use bandit_core::{ArmState, BanditError, BanditResult, ParamBag, UserContext};
use bandit_state::StateStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Selection and update rule of one bandit algorithm.
///
/// Implementations keep no arm statistics of their own: everything is read
/// from and written to the `StateStore` on each call.
pub trait BanditStrategy: Send + Sync {
    /// Stable lowercase identifier, e.g. `"ucb1"`.
    fn name(&self) -> &'static str;

    /// Field set a brand-new arm starts with.
    fn default_arm_state(&self) -> ArmState;

    fn store(&self) -> &dyn StateStore;

    /// Make sure every arm has state. Idempotent.
    fn initialize_experiment(&self, experiment_id: &str, arm_ids: &[String]) -> BanditResult<()> {
        self.store()
            .ensure_arms(experiment_id, arm_ids, &self.default_arm_state())
    }

    /// Choose one of `arm_ids`. Reads state, never writes it.
    ///
    /// # Panics
    ///
    /// Panics if `arm_ids` is empty.
    fn select_arm(
        &self,
        experiment_id: &str,
        arm_ids: &[String],
        user_context: Option<&UserContext>,
    ) -> BanditResult<String>;

    /// Record one observed reward for `arm_id`.
    fn update(&self, experiment_id: &str, arm_id: &str, reward: f64) -> BanditResult<()>;
}

/// Canonical strategy tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Thompson,
    EpsilonGreedy,
    Ucb1,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::Thompson, Self::EpsilonGreedy, Self::Ucb1];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thompson => "thompson",
            Self::EpsilonGreedy => "epsilon_greedy",
            Self::Ucb1 => "ucb1",
        }
    }

    /// Trim, lowercase, turn hyphens into underscores and resolve aliases.
    /// The result is not guaranteed to be a supported name.
    pub fn normalize(name: &str) -> String {
        let value = name.trim().to_lowercase().replace('-', "_");
        match value.as_str() {
            "ts" | "thompson_sampling" => "thompson".to_string(),
            "epsilon" | "eps_greedy" => "epsilon_greedy".to_string(),
            "ucb" => "ucb1".to_string(),
            _ => value,
        }
    }

    pub fn from_name(name: &str) -> BanditResult<Self> {
        let normalized = Self::normalize(name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| BanditError::UnsupportedStrategy {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = BanditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Typed view over a parameter bag. Keys a strategy does not use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategyParams {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub epsilon: Option<f64>,
    #[serde(default)]
    pub exploration_weight: Option<f64>,
}

impl StrategyParams {
    pub fn from_bag(bag: &ParamBag) -> BanditResult<Self> {
        serde_json::from_value(serde_json::Value::Object(bag.clone()))
            .map_err(|e| BanditError::Config(format!("invalid strategy parameters: {e}")))
    }
}

/// A constructed algorithm, dispatched by tag.
pub enum Strategy {
    Thompson(ThompsonSampling),
    EpsilonGreedy(EpsilonGreedy),
    Ucb1(Ucb1),
}

impl Strategy {
    pub fn build(
        kind: StrategyKind,
        store: Arc<dyn StateStore>,
        params: &StrategyParams,
    ) -> BanditResult<Self> {
        Ok(match kind {
            StrategyKind::Thompson => Self::Thompson(ThompsonSampling::from_params(store, params)),
            StrategyKind::EpsilonGreedy => {
                Self::EpsilonGreedy(EpsilonGreedy::from_params(store, params)?)
            }
            StrategyKind::Ucb1 => Self::Ucb1(Ucb1::from_params(store, params)),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Thompson(_) => StrategyKind::Thompson,
            Self::EpsilonGreedy(_) => StrategyKind::EpsilonGreedy,
            Self::Ucb1(_) => StrategyKind::Ucb1,
        }
    }

    fn inner(&self) -> &dyn BanditStrategy {
        match self {
            Self::Thompson(s) => s,
            Self::EpsilonGreedy(s) => s,
            Self::Ucb1(s) => s,
        }
    }
}

impl BanditStrategy for Strategy {
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn default_arm_state(&self) -> ArmState {
        self.inner().default_arm_state()
    }

    fn store(&self) -> &dyn StateStore {
        self.inner().store()
    }

    fn select_arm(
        &self,
        experiment_id: &str,
        arm_ids: &[String],
        user_context: Option<&UserContext>,
    ) -> BanditResult<String> {
        self.inner().select_arm(experiment_id, arm_ids, user_context)
    }

    fn update(&self, experiment_id: &str, arm_id: &str, reward: f64) -> BanditResult<()> {
        self.inner().update(experiment_id, arm_id, reward)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Strategy").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandit_state::InMemoryStateStore;
    use serde_json::json;

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(StrategyKind::normalize("TS"), "thompson");
        assert_eq!(StrategyKind::normalize("thompson_sampling"), "thompson");
        assert_eq!(StrategyKind::normalize(" Thompson-Sampling "), "thompson");
        assert_eq!(StrategyKind::normalize("epsilon"), "epsilon_greedy");
        assert_eq!(StrategyKind::normalize("EPS_GREEDY"), "epsilon_greedy");
        assert_eq!(StrategyKind::normalize("epsilon-greedy"), "epsilon_greedy");
        assert_eq!(StrategyKind::normalize("UCB"), "ucb1");
        assert_eq!(StrategyKind::normalize("mystery"), "mystery");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(StrategyKind::from_name("UCB1").unwrap(), StrategyKind::Ucb1);
        assert_eq!(
            "EPSILON_GREEDY".parse::<StrategyKind>().unwrap(),
            StrategyKind::EpsilonGreedy
        );
        let err = StrategyKind::from_name("NOT_A_STRATEGY").unwrap_err();
        assert!(matches!(err, BanditError::UnsupportedStrategy { ref name } if name == "NOT_A_STRATEGY"));
    }

    #[test]
    fn test_params_ignore_unknown_keys() {
        let bag = json!({"epsilon": 0.2, "seed": 42, "color": "blue"});
        let params = StrategyParams::from_bag(bag.as_object().unwrap()).unwrap();
        assert_eq!(params.epsilon, Some(0.2));
        assert_eq!(params.seed, Some(42));
        assert_eq!(params.exploration_weight, None);
    }

    #[test]
    fn test_params_reject_wrong_types() {
        let bag = json!({"epsilon": "lots"});
        let err = StrategyParams::from_bag(bag.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, BanditError::Config(_)));
    }

    #[test]
    fn test_build_each_kind() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        for kind in StrategyKind::ALL {
            let strategy = Strategy::build(kind, store.clone(), &StrategyParams::default()).unwrap();
            assert_eq!(strategy.kind(), kind);
            assert_eq!(strategy.name(), kind.as_str());
        }
    }
}
