//! UCB1 (Auer et al., 2002).
//!
//! Every arm is played once before any index is computed. After that the arm
//! with the highest `mean_i + c * sqrt(2 ln(total) / n_i)` wins, where `c` is
//! the exploration weight.

use super::{assert_has_arms, field, first_best, strategy_rng, uniform_choice, COUNT, VALUE_SUM};
use crate::strategy::{BanditStrategy, StrategyParams};
use bandit_core::{ArmState, BanditResult, UserContext};
use bandit_state::StateStore;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_EXPLORATION_WEIGHT: f64 = 1.0;

pub struct Ucb1 {
    store: Arc<dyn StateStore>,
    exploration_weight: f64,
    rng: Mutex<StdRng>,
}

impl Ucb1 {
    pub const NAME: &'static str = "ucb1";

    pub fn new(store: Arc<dyn StateStore>, exploration_weight: f64, seed: Option<u64>) -> Self {
        debug!(strategy = Self::NAME, exploration_weight, seed = ?seed, "Strategy constructed");
        Self {
            store,
            exploration_weight,
            rng: strategy_rng(seed),
        }
    }

    pub fn from_params(store: Arc<dyn StateStore>, params: &StrategyParams) -> Self {
        Self::new(
            store,
            params.exploration_weight.unwrap_or(DEFAULT_EXPLORATION_WEIGHT),
            params.seed,
        )
    }

    pub fn exploration_weight(&self) -> f64 {
        self.exploration_weight
    }
}

impl BanditStrategy for Ucb1 {
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
        let states = self.store.get_experiment_state(experiment_id, arm_ids)?;
        let count_of = |arm_id: &String| field(states.get(arm_id), COUNT, 0.0);

        // Forced exploration: untried arms first, in random order.
        let unplayed: Vec<String> = arm_ids
            .iter()
            .filter(|arm_id| count_of(*arm_id) == 0.0)
            .cloned()
            .collect();
        if !unplayed.is_empty() {
            return Ok(uniform_choice(&self.rng, &unplayed));
        }

        let total: f64 = arm_ids.iter().map(count_of).sum();
        let log_total = if total > 0.0 { total.ln() } else { 0.0 };

        // Non-positive counts only come from corrupted state; skip those arms.
        let indices = arm_ids.iter().filter_map(|arm_id| {
            let n = count_of(arm_id);
            if n <= 0.0 {
                return None;
            }
            let mean = field(states.get(arm_id), VALUE_SUM, 0.0) / n;
            let bonus = self.exploration_weight * (2.0 * log_total / n).sqrt();
            Some((arm_id, mean + bonus))
        });

        match first_best(indices, f64::NEG_INFINITY) {
            Some(arm_id) => Ok(arm_id.clone()),
            None => {
                warn!(experiment_id, "No arm with a valid count, choosing at random");
                metrics::counter!("bandit.fallback", "strategy" => Self::NAME).increment(1);
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
