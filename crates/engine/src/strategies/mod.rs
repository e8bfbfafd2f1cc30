//! The three bandit algorithms and the helpers they share.

pub mod epsilon_greedy;
pub mod thompson;
pub mod ucb1;

pub use epsilon_greedy::EpsilonGreedy;
pub use thompson::ThompsonSampling;
pub use ucb1::Ucb1;

use bandit_core::ArmState;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) const ALPHA: &str = "alpha";
pub(crate) const BETA: &str = "beta";
pub(crate) const COUNT: &str = "count";
pub(crate) const VALUE_SUM: &str = "value_sum";

/// One generator per strategy instance. Seeded runs are reproducible as long
/// as a single caller drives the instance.
pub(crate) fn strategy_rng(seed: Option<u64>) -> Mutex<StdRng> {
    Mutex::new(match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    })
}

/// Read one field, falling back to the strategy's default when the arm has no
/// state or the field is missing.
pub(crate) fn field(state: Option<&ArmState>, name: &str, default: f64) -> f64 {
    state.and_then(|s| s.get(name)).copied().unwrap_or(default)
}

/// First candidate whose score is strictly greater than every earlier one and
/// than `floor`. Ties keep the earlier arm.
pub(crate) fn first_best<'a, I>(scored: I, floor: f64) -> Option<&'a String>
where
    I: IntoIterator<Item = (&'a String, f64)>,
{
    let mut best: Option<&'a String> = None;
    let mut best_score = floor;
    for (arm_id, score) in scored {
        if score > best_score {
            best_score = score;
            best = Some(arm_id);
        }
    }
    best
}

pub(crate) fn uniform_choice(rng: &Mutex<StdRng>, arm_ids: &[String]) -> String {
    let idx = rng.lock().gen_range(0..arm_ids.len());
    arm_ids[idx].clone()
}

pub(crate) fn assert_has_arms(arm_ids: &[String]) {
    assert!(!arm_ids.is_empty(), "select_arm requires at least one arm");
}
