//! Arm-state persistence: the `StateStore` capability plus in-memory and
//! Redis implementations, selected by configuration.

#![warn(clippy::unwrap_used)]

pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use memory::InMemoryStateStore;
pub use redis_store::RedisStateStore;
pub use store::StateStore;

use bandit_core::config::{RedisConfig, StateBackend, StateConfig};
use bandit_core::BanditResult;
use std::sync::Arc;
use tracing::info;

/// Build the configured backend.
pub fn open_store(state: &StateConfig, redis: &RedisConfig) -> BanditResult<Arc<dyn StateStore>> {
    info!(backend = ?state.backend, "Opening arm state store");
    match state.backend {
        StateBackend::Memory => Ok(Arc::new(InMemoryStateStore::new())),
        StateBackend::Redis => Ok(Arc::new(RedisStateStore::connect(redis)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_is_default() {
        let store = open_store(&StateConfig::default(), &RedisConfig::default()).unwrap();
        store.increment("exp", "A", "count", 1.0).unwrap();
        assert_eq!(store.get_arm_state("exp", "A").unwrap()["count"], 1.0);
    }
}
