//! Offline simulation harness: Bernoulli environments, a round-by-round
//! runner and convergence measurements.

pub mod environment;
pub mod runner;
pub mod samples;

pub use environment::BernoulliEnvironment;
pub use runner::{convergence_round, run_simulation, SimulationOutcome};
pub use samples::{best_of, generate_samples, winner_gap, SAMPLE_ARM_IDS};
