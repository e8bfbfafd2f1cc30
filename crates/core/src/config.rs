use serde::Deserialize;

/// Root engine configuration. Loaded from environment variables
/// with the prefix `BANDIT__`, e.g. `BANDIT__STATE__BACKEND=redis`.
#[derive(Debug, Clone, Deserialize)]
pub struct BanditConfig {
    /// Strategy used for experiments that have none configured.
    #[serde(default = "default_strategy")]
    pub default_strategy: String,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_backend")]
    pub backend: StateBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

// Default functions
fn default_strategy() -> String {
    "thompson".to_string()
}
fn default_backend() -> StateBackend {
    StateBackend::Memory
}
fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}
fn default_key_prefix() -> String {
    "bandit".to_string()
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            default_strategy: default_strategy(),
            state: StateConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl BanditConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("BANDIT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
