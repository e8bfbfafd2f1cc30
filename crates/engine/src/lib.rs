//! Bandit decision engine: Thompson Sampling, Epsilon-Greedy and UCB1
//! written against a pluggable arm-state store, plus the factory that turns
//! an experiment's configured strategy into a live instance.

pub mod factory;
pub mod lookup;
pub mod strategies;
pub mod strategy;

pub use factory::StrategyFactory;
pub use lookup::{ExperimentLookup, ExperimentRegistry};
pub use strategies::{EpsilonGreedy, ThompsonSampling, Ucb1};
pub use strategy::{BanditStrategy, Strategy, StrategyKind, StrategyParams};
