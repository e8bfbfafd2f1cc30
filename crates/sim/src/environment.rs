//! Stationary Bernoulli environment with hidden per-arm success rates.

use bandit_core::{BanditError, BanditResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Arms with fixed conversion rates. The same seed always yields the same
/// reward sequence for the same sequence of pulls.
pub struct BernoulliEnvironment {
    arm_ids: Vec<String>,
    rates: HashMap<String, f64>,
    best_rate: f64,
    rng: StdRng,
}

impl BernoulliEnvironment {
    /// `arm_rates` keeps its iteration order as the arm order. Every rate must
    /// lie in `[0, 1]` and arm ids must be unique.
    pub fn new<I, S>(arm_rates: I, seed: Option<u64>) -> BanditResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut arm_ids = Vec::new();
        let mut rates = HashMap::new();
        for (arm_id, rate) in arm_rates {
            let arm_id = arm_id.into();
            if !(0.0..=1.0).contains(&rate) {
                return Err(BanditError::Config(format!(
                    "rate for arm '{arm_id}' must be in [0, 1], got {rate}"
                )));
            }
            if rates.insert(arm_id.clone(), rate).is_some() {
                return Err(BanditError::Config(format!("duplicate arm '{arm_id}'")));
            }
            arm_ids.push(arm_id);
        }
        if arm_ids.is_empty() {
            return Err(BanditError::Config(
                "environment needs at least one arm".to_string(),
            ));
        }

        let best_rate = rates.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            arm_ids,
            rates,
            best_rate,
            rng,
        })
    }

    pub fn arm_ids(&self) -> &[String] {
        &self.arm_ids
    }

    pub fn rate(&self, arm_id: &str) -> BanditResult<f64> {
        self.rates
            .get(arm_id)
            .copied()
            .ok_or_else(|| BanditError::UnknownArm(arm_id.to_string()))
    }

    pub fn best_rate(&self) -> f64 {
        self.best_rate
    }

    /// First arm, in arm order, whose rate equals the best rate.
    pub fn best_arm(&self) -> &str {
        self.arm_ids
            .iter()
            .find(|arm_id| self.rates[arm_id.as_str()] == self.best_rate)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Draw one Bernoulli outcome, `1.0` or `0.0`.
    pub fn pull(&mut self, arm_id: &str) -> BanditResult<f64> {
        let rate = self.rate(arm_id)?;
        Ok(if self.rng.gen::<f64>() < rate { 1.0 } else { 0.0 })
    }

    /// Expected loss of choosing `arm_id` instead of the best arm.
    pub fn regret(&self, arm_id: &str) -> BanditResult<f64> {
        Ok(self.best_rate - self.rate(arm_id)?)
    }
}
