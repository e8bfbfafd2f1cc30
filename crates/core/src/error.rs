use thiserror::Error;

pub type BanditResult<T> = Result<T, BanditError>;

#[derive(Error, Debug)]
pub enum BanditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported strategy '{name}'. Valid values: thompson, epsilon_greedy, ucb1.")]
    UnsupportedStrategy { name: String },

    #[error("Invalid experiment: {0}")]
    InvalidExperiment(String),

    #[error("Experiment '{0}' already exists")]
    ExperimentExists(String),

    #[error("Experiment '{0}' was not found")]
    ExperimentNotFound(String),

    #[error("Unknown arm '{0}'")]
    UnknownArm(String),

    #[error("State store error: {0}")]
    Store(String),
}

impl BanditError {
    /// Errors caused by caller input rather than by the engine or its backends.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnsupportedStrategy { .. }
                | Self::InvalidExperiment(_)
                | Self::ExperimentExists(_)
                | Self::ExperimentNotFound(_)
        )
    }
}
