//! Epsilon-Greedy: explore a uniformly random arm with probability `epsilon`,
//! otherwise exploit the best empirical mean.

use super::{assert_has_arms, field, first_best, strategy_rng, uniform_choice, COUNT, VALUE_SUM};
use crate::strategy::{BanditStrategy, StrategyParams};
use bandit_core::{ArmState, BanditError, BanditResult, UserContext};
use bandit_state::StateStore;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_EPSILON: f64 = 0.1;

/// Means at or below this floor never win the greedy scan. Only negative
/// rewards push an arm there.
const MEAN_FLOOR: f64 = -1.0;

/// Reject exploration rates outside `[0, 1]` (NaN included).
pub fn check_epsilon(epsilon: f64) -> BanditResult<f64> {
    if (0.0..=1.0).contains(&epsilon) {
        Ok(epsilon)
    } else {
        Err(BanditError::Config(format!(
            "epsilon must be in [0, 1], got {epsilon}"
        )))
    }
}

pub struct EpsilonGreedy {
    store: Arc<dyn StateStore>,
    epsilon: f64,
    rng: Mutex<StdRng>,
}

impl EpsilonGreedy {
    pub const NAME: &'static str = "epsilon_greedy";

    pub fn new(store: Arc<dyn StateStore>, epsilon: f64, seed: Option<u64>) -> BanditResult<Self> {
        let epsilon = check_epsilon(epsilon)?;
        debug!(strategy = Self::NAME, epsilon, seed = ?seed, "Strategy constructed");
        Ok(Self {
            store,
            epsilon,
            rng: strategy_rng(seed),
        })
    }

    pub fn from_params(store: Arc<dyn StateStore>, params: &StrategyParams) -> BanditResult<Self> {
        Self::new(store, params.epsilon.unwrap_or(DEFAULT_EPSILON), params.seed)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl BanditStrategy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_arm_state(&self) -> ArmState {
        [(COUNT.to_string(), 0.0), (VALUE_SUM.to_string(), 0.0)]
            .into_iter()
            .collect()
    }

    fn store(&self) -> &dyn StateStore {
        &*self.store
    }

    fn select_arm(
        &self,
        experiment_id: &str,
        arm_ids: &[String],
        _user_context: Option<&UserContext>,
    ) -> BanditResult<String> {
        assert_has_arms(arm_ids);
        metrics::counter!("bandit.select", "strategy" => Self::NAME).increment(1);

        let explore = self.rng.lock().gen::<f64>() < self.epsilon;
        if explore {
            return Ok(uniform_choice(&self.rng, arm_ids));
        }

        let states = self.store.get_experiment_state(experiment_id, arm_ids)?;
        let any_played = arm_ids
            .iter()
            .any(|arm_id| field(states.get(arm_id), COUNT, 0.0) > 0.0);
        if !any_played {
            debug!(experiment_id, "No arm played yet, choosing at random");
            return Ok(uniform_choice(&self.rng, arm_ids));
        }

        let means = arm_ids.iter().map(|arm_id| {
            let state = states.get(arm_id);
            let count = field(state, COUNT, 0.0);
            let mean = if count > 0.0 {
                field(state, VALUE_SUM, 0.0) / count
            } else {
                0.0
            };
            (arm_id, mean)
        });

        match first_best(means, MEAN_FLOOR) {
            Some(arm_id) => Ok(arm_id.clone()),
            None => {
                debug!(experiment_id, "No arm above mean floor, choosing at random");
                Ok(uniform_choice(&self.rng, arm_ids))
            }
        }
    }

    fn update(&self, experiment_id: &str, arm_id: &str, reward: f64) -> BanditResult<()> {
        self.store.increment(experiment_id, arm_id, COUNT, 1.0)?;
        self.store.increment(experiment_id, arm_id, VALUE_SUM, reward)?;
        metrics::counter!("bandit.update", "strategy" => Self::NAME).increment(1);
        Ok(())
    }
}
