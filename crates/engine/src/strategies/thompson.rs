//! Beta-Bernoulli Thompson Sampling.
//!
//! Each arm keeps `alpha` (success mass) and `beta` (failure mass). At decision
//! time one sample is drawn from every arm's `Beta(alpha, beta)` posterior and
//! the largest sample wins.

use super::{assert_has_arms, field, first_best, strategy_rng, ALPHA, BETA};
use crate::strategy::{BanditStrategy, StrategyParams};
use bandit_core::{ArmState, BanditResult, UserContext};
use bandit_state::StateStore;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Beta, Distribution};
use std::sync::Arc;
use tracing::{debug, warn};

const PRIOR: f64 = 1.0;

pub struct ThompsonSampling {
    store: Arc<dyn StateStore>,
    rng: Mutex<StdRng>,
}

impl ThompsonSampling {
    pub const NAME: &'static str = "thompson";

    pub fn new(store: Arc<dyn StateStore>, seed: Option<u64>) -> Self {
        debug!(strategy = Self::NAME, seed = ?seed, "Strategy constructed");
        Self {
            store,
            rng: strategy_rng(seed),
        }
    }

    pub fn from_params(store: Arc<dyn StateStore>, params: &StrategyParams) -> Self {
        Self::new(store, params.seed)
    }

    /// Draw from `Beta(alpha, beta)`. A parameter that is not a positive
    /// finite number is replaced by the prior; the other one is kept.
    fn sample(rng: &mut StdRng, arm_id: &str, alpha: f64, beta: f64) -> f64 {
        let alpha = Self::usable(arm_id, ALPHA, alpha);
        let beta = Self::usable(arm_id, BETA, beta);
        match Beta::new(alpha, beta) {
            Ok(dist) => dist.sample(rng),
            Err(e) => {
                warn!(arm_id, alpha, beta, error = %e, "Beta sampling failed, sampling from prior");
                // Beta(1, 1) is the uniform distribution.
                rng.gen::<f64>()
            }
        }
    }

    fn usable(arm_id: &str, name: &str, value: f64) -> f64 {
        if value.is_finite() && value > 0.0 {
            return value;
        }
        debug!(arm_id, field = name, value, "Invalid Beta parameter, using prior");
        metrics::counter!("bandit.fallback", "strategy" => Self::NAME).increment(1);
        PRIOR
    }
}

impl BanditStrategy for ThompsonSampling {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_arm_state(&self) -> ArmState {
        [(ALPHA.to_string(), PRIOR), (BETA.to_string(), PRIOR)]
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
        let states = self.store.get_experiment_state(experiment_id, arm_ids)?;

        let mut rng = self.rng.lock();
        let samples: Vec<(&String, f64)> = arm_ids
            .iter()
            .map(|arm_id| {
                let state = states.get(arm_id);
                let alpha = field(state, ALPHA, PRIOR);
                let beta = field(state, BETA, PRIOR);
                (arm_id, Self::sample(&mut rng, arm_id, alpha, beta))
            })
            .collect();
        drop(rng);

        metrics::counter!("bandit.select", "strategy" => Self::NAME).increment(1);
        // Samples lie in [0, 1], so some arm always beats the floor.
        let chosen = first_best(samples, f64::NEG_INFINITY)
            .cloned()
            .unwrap_or_else(|| arm_ids[0].clone());
        Ok(chosen)
    }

    /// Fractional rewards split proportionally: `alpha += r`, `beta += 1 - r`.
    fn update(&self, experiment_id: &str, arm_id: &str, reward: f64) -> BanditResult<()> {
        self.store.increment(experiment_id, arm_id, ALPHA, reward)?;
        self.store.increment(experiment_id, arm_id, BETA, 1.0 - reward)?;
        metrics::counter!("bandit.update", "strategy" => Self::NAME).increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandit_state::InMemoryStateStore;

    fn setup(seed: u64) -> (Arc<InMemoryStateStore>, ThompsonSampling) {
        let store = Arc::new(InMemoryStateStore::new());
        let strategy = ThompsonSampling::new(store.clone(), Some(seed));
        (store, strategy)
    }

    fn arms(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_state() {
        let (_, strategy) = setup(1);
        let state = strategy.default_arm_state();
        assert_eq!(state["alpha"], 1.0);
        assert_eq!(state["beta"], 1.0);
        assert_eq!(strategy.name(), "thompson");
    }

    #[test]
    fn test_binary_updates() {
        let (store, strategy) = setup(1);
        strategy.initialize_experiment("exp", &arms(&["A", "B"])).unwrap();
        strategy.update("exp", "A", 1.0).unwrap();
        strategy.update("exp", "A", 0.0).unwrap();

        let state = store.get_arm_state("exp", "A").unwrap();
        assert_eq!(state["alpha"], 2.0);
        assert_eq!(state["beta"], 2.0);
    }

    #[test]
    fn test_fractional_update() {
        let (store, strategy) = setup(1);
        strategy.initialize_experiment("exp", &arms(&["A"])).unwrap();
        strategy.update("exp", "A", 0.5).unwrap();

        let state = store.get_arm_state("exp", "A").unwrap();
        assert_eq!(state["alpha"], 1.5);
        assert_eq!(state["beta"], 1.5);
    }

    #[test]
    fn test_select_returns_member() {
        let (_, strategy) = setup(3);
        let ids = arms(&["A", "B", "C"]);
        strategy.initialize_experiment("exp", &ids).unwrap();
        for _ in 0..100 {
            let arm = strategy.select_arm("exp", &ids, None).unwrap();
            assert!(ids.contains(&arm));
        }
    }

    #[test]
    fn test_select_without_initialization_uses_prior() {
        let (store, strategy) = setup(3);
        let ids = arms(&["A", "B"]);
        let arm = strategy.select_arm("fresh", &ids, None).unwrap();
        assert!(ids.contains(&arm));
        // Selection never writes state.
        assert!(store.is_empty());
    }

    #[test]
    fn test_strong_posterior_dominates() {
        let (store, strategy) = setup(11);
        let ids = arms(&["A", "B"]);
        let strong: ArmState = [("alpha".to_string(), 500.0), ("beta".to_string(), 10.0)]
            .into_iter()
            .collect();
        let weak: ArmState = [("alpha".to_string(), 10.0), ("beta".to_string(), 500.0)]
            .into_iter()
            .collect();
        store.set_arm_state("exp", "A", &weak).unwrap();
        store.set_arm_state("exp", "B", &strong).unwrap();

        for _ in 0..50 {
            assert_eq!(strategy.select_arm("exp", &ids, None).unwrap(), "B");
        }
    }

    #[test]
    fn test_corrupted_parameters_do_not_fail() {
        let (store, strategy) = setup(5);
        let ids = arms(&["A", "B"]);
        let broken: ArmState = [("alpha".to_string(), -3.0), ("beta".to_string(), 0.0)]
            .into_iter()
            .collect();
        store.set_arm_state("exp", "A", &broken).unwrap();
        let arm = strategy.select_arm("exp", &ids, None).unwrap();
        assert!(ids.contains(&arm));
    }

    #[test]
    fn test_invalid_beta_keeps_valid_alpha() {
        let (store, strategy) = setup(9);
        let ids = arms(&["A", "B"]);
        // Successes only, with beta never written by this strategy.
        let lopsided: ArmState = [("alpha".to_string(), 50.0), ("beta".to_string(), 0.0)]
            .into_iter()
            .collect();
        let even: ArmState = [("alpha".to_string(), 25.0), ("beta".to_string(), 25.0)]
            .into_iter()
            .collect();
        store.set_arm_state("exp", "A", &lopsided).unwrap();
        store.set_arm_state("exp", "B", &even).unwrap();

        let wins = (0..500)
            .filter(|_| strategy.select_arm("exp", &ids, None).unwrap() == "A")
            .count();
        assert!(wins > 480, "A picked {wins}/500");
    }

    #[test]
    fn test_same_seed_same_choices() {
        let ids = arms(&["A", "B", "C", "D"]);
        let (_, first) = setup(42);
        let (_, second) = setup(42);
        let left: Vec<_> = (0..30)
            .map(|_| first.select_arm("exp", &ids, None).unwrap())
            .collect();
        let right: Vec<_> = (0..30)
            .map(|_| second.select_arm("exp", &ids, None).unwrap())
            .collect();
        assert_eq!(left, right);
    }

    #[test]
    #[should_panic(expected = "at least one arm")]
    fn test_empty_arm_list_panics() {
        let (_, strategy) = setup(1);
        let _ = strategy.select_arm("exp", &[], None);
    }
}
