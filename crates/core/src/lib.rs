//! Shared building blocks for the bandit decision engine: error taxonomy,
//! configuration and the data types exchanged between stores and strategies.

pub mod config;
pub mod error;
pub mod types;

pub use config::BanditConfig;
pub use error::{BanditError, BanditResult};
pub use types::{ArmState, ExperimentConfig, ExperimentState, ParamBag, UserContext};
