//! Randomized arm-rate configurations with one clearly best arm.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SAMPLE_ARM_IDS: [&str; 4] = ["A", "B", "C", "D"];

const BASE_RATE_MIN: f64 = 0.03;
const BASE_RATE_MAX: f64 = 0.40;
const WINNER_MARGIN_MIN: f64 = 0.15;
const WINNER_MARGIN_MAX: f64 = 0.30;
const WINNER_RATE_CAP: f64 = 0.95;

/// `n` four-arm configurations. In each one a randomly placed winner sits at
/// least 0.15 above the best of the other draws. Rates are rounded to three
/// decimals.
pub fn generate_samples(n: usize, seed: u64) -> Vec<Vec<(String, f64)>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut rates: Vec<f64> = SAMPLE_ARM_IDS
                .iter()
                .map(|_| rng.gen_range(BASE_RATE_MIN..BASE_RATE_MAX))
                .collect();
            let winner = rng.gen_range(0..rates.len());
            let top = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let margin = rng.gen_range(WINNER_MARGIN_MIN..WINNER_MARGIN_MAX);
            rates[winner] = (top + margin).min(WINNER_RATE_CAP);

            SAMPLE_ARM_IDS
                .iter()
                .zip(rates)
                .map(|(arm_id, rate)| (arm_id.to_string(), (rate * 1000.0).round() / 1000.0))
                .collect()
        })
        .collect()
}

/// Arm with the highest rate; the first one wins ties.
pub fn best_of(rates: &[(String, f64)]) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (arm_id, rate) in rates {
        if best.map_or(true, |(_, best_rate)| *rate > best_rate) {
            best = Some((arm_id, *rate));
        }
    }
    best.map(|(arm_id, _)| arm_id)
}

/// Difference between the best and second-best rate.
pub fn winner_gap(rates: &[(String, f64)]) -> f64 {
    let mut sorted: Vec<f64> = rates.iter().map(|(_, rate)| *rate).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    match sorted.as_slice() {
        [first, second, ..] => first - second,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_have_a_clear_winner() {
        let samples = generate_samples(50, 42);
        assert_eq!(samples.len(), 50);
        for rates in &samples {
            assert_eq!(rates.len(), 4);
            assert!(rates.iter().all(|(_, r)| (0.0..=WINNER_RATE_CAP).contains(r)));
            // 0.15 margin minus rounding slack.
            assert!(winner_gap(rates) >= 0.149, "{rates:?}");
            assert!(best_of(rates).is_some());
        }
    }

    #[test]
    fn test_samples_are_seeded() {
        assert_eq!(generate_samples(5, 7), generate_samples(5, 7));
        assert_ne!(generate_samples(5, 7), generate_samples(5, 8));
        assert!(generate_samples(0, 7).is_empty());
    }

    #[test]
    fn test_best_of_prefers_first_on_tie() {
        let rates = vec![("X".to_string(), 0.5), ("Y".to_string(), 0.5)];
        assert_eq!(best_of(&rates), Some("X"));
        assert_eq!(winner_gap(&rates), 0.0);
        assert_eq!(best_of(&[]), None);
    }
}
