//! Drives a strategy through repeated rounds against an environment.

use crate::environment::BernoulliEnvironment;
use bandit_core::BanditResult;
use bandit_engine::BanditStrategy;
use tracing::debug;

/// Per-round trajectories of one simulation run. All three vectors have one
/// entry per round; both cumulative series are non-decreasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOutcome {
    pub cumulative_regret: Vec<f64>,
    pub cumulative_reward: Vec<f64>,
    pub choices: Vec<String>,
}

impl SimulationOutcome {
    pub fn rounds(&self) -> usize {
        self.choices.len()
    }

    pub fn final_regret(&self) -> f64 {
        self.cumulative_regret.last().copied().unwrap_or(0.0)
    }

    pub fn final_reward(&self) -> f64 {
        self.cumulative_reward.last().copied().unwrap_or(0.0)
    }

    /// Share of the last `window` choices that picked `best_arm`.
    pub fn tail_share(&self, best_arm: &str, window: usize) -> f64 {
        let tail = &self.choices[self.choices.len().saturating_sub(window)..];
        if tail.is_empty() {
            return 0.0;
        }
        tail.iter().filter(|arm| *arm == best_arm).count() as f64 / tail.len() as f64
    }
}

/// Initialize the experiment, then repeat select -> pull -> update for
/// `n_rounds` rounds.
pub fn run_simulation<S>(
    strategy: &S,
    environment: &mut BernoulliEnvironment,
    experiment_id: &str,
    n_rounds: usize,
) -> BanditResult<SimulationOutcome>
where
    S: BanditStrategy + ?Sized,
{
    let arm_ids = environment.arm_ids().to_vec();
    strategy.initialize_experiment(experiment_id, &arm_ids)?;

    let mut outcome = SimulationOutcome {
        cumulative_regret: Vec::with_capacity(n_rounds),
        cumulative_reward: Vec::with_capacity(n_rounds),
        choices: Vec::with_capacity(n_rounds),
    };
    let mut regret = 0.0;
    let mut reward_total = 0.0;

    for _ in 0..n_rounds {
        let arm_id = strategy.select_arm(experiment_id, &arm_ids, None)?;
        let reward = environment.pull(&arm_id)?;
        strategy.update(experiment_id, &arm_id, reward)?;

        regret += environment.regret(&arm_id)?;
        reward_total += reward;
        outcome.cumulative_regret.push(regret);
        outcome.cumulative_reward.push(reward_total);
        outcome.choices.push(arm_id);
    }

    debug!(
        experiment_id,
        strategy = strategy.name(),
        rounds = n_rounds,
        regret,
        reward = reward_total,
        "Simulation finished"
    );
    Ok(outcome)
}

/// First round `t` at which `best_arm` makes up at least `threshold` of the
/// `window` choices ending just before `t + 1`. `None` if that never happens.
pub fn convergence_round(
    choices: &[String],
    best_arm: &str,
    window: usize,
    threshold: f64,
) -> Option<usize> {
    if window == 0 || choices.len() < window {
        return None;
    }
    let mut best_count = choices[..window].iter().filter(|c| *c == best_arm).count();
    for t in window..choices.len() {
        if choices[t] == best_arm {
            best_count += 1;
        }
        if choices[t - window] == best_arm {
            best_count -= 1;
        }
        if best_count as f64 / window as f64 >= threshold {
            return Some(t);
        }
    }
    None
}
