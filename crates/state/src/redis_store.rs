//! Durable arm state in Redis: one hash per arm, field -> float.

use crate::keys::KeySpace;
use crate::store::StateStore;
use bandit_core::config::RedisConfig;
use bandit_core::{ArmState, BanditError, BanditResult};
use parking_lot::Mutex;
use redis::Commands;
use std::collections::HashMap;
use tracing::{debug, info};

/// Creates the hash only when the key is absent, in one server-side step.
const INITIALIZE_ARM_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
";

fn store_err(err: redis::RedisError) -> BanditError {
    BanditError::Store(err.to_string())
}

/// Redis-backed `StateStore`.
///
/// Atomicity of `increment` comes from `HINCRBYFLOAT`; the store itself only
/// serializes access to its single connection.
pub struct RedisStateStore {
    conn: Mutex<redis::Connection>,
    keys: KeySpace,
    initialize_script: redis::Script,
}

impl RedisStateStore {
    /// Connect and verify the server answers `PING`.
    pub fn connect(config: &RedisConfig) -> BanditResult<Self> {
        info!(url = %config.url, prefix = %config.key_prefix, "Connecting to Redis");

        let client = redis::Client::open(config.url.as_str()).map_err(store_err)?;
        let mut conn = client.get_connection().map_err(store_err)?;
        let pong: String = redis::cmd("PING").query(&mut conn).map_err(store_err)?;
        info!(response = %pong, "Redis connection established");

        Ok(Self {
            conn: Mutex::new(conn),
            keys: KeySpace::new(config.key_prefix.clone()),
            initialize_script: redis::Script::new(INITIALIZE_ARM_SCRIPT),
        })
    }
}

fn parse_fields(key: &str, raw: HashMap<String, String>) -> BanditResult<ArmState> {
    raw.into_iter()
        .map(|(field, value)| {
            value
                .parse::<f64>()
                .map(|v| (field.clone(), v))
                .map_err(|_| {
                    BanditError::Store(format!(
                        "non-numeric value '{value}' for field '{field}' in {key}"
                    ))
                })
        })
        .collect()
}

impl StateStore for RedisStateStore {
    fn get_arm_state(&self, experiment_id: &str, arm_id: &str) -> BanditResult<ArmState> {
        let key = self.keys.arm_state_key(experiment_id, arm_id);
        let mut guard = self.conn.lock();
        let conn: &mut redis::Connection = &mut guard;
        let raw: HashMap<String, String> = conn.hgetall(&key).map_err(store_err)?;
        metrics::counter!("bandit.state.redis.read").increment(1);
        parse_fields(&key, raw)
    }

    fn set_arm_state(
        &self,
        experiment_id: &str,
        arm_id: &str,
        state: &ArmState,
    ) -> BanditResult<()> {
        let key = self.keys.arm_state_key(experiment_id, arm_id);
        let items: Vec<(&str, f64)> = state.iter().map(|(k, v)| (k.as_str(), *v)).collect();

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !items.is_empty() {
            pipe.hset_multiple(&key, items.as_slice()).ignore();
        }

        let mut guard = self.conn.lock();
        let conn: &mut redis::Connection = &mut guard;
        pipe.query::<()>(conn).map_err(store_err)?;
        metrics::counter!("bandit.state.redis.write").increment(1);
        Ok(())
    }

    fn increment(
        &self,
        experiment_id: &str,
        arm_id: &str,
        field: &str,
        amount: f64,
    ) -> BanditResult<f64> {
        let key = self.keys.arm_state_key(experiment_id, arm_id);
        let mut guard = self.conn.lock();
        let conn: &mut redis::Connection = &mut guard;
        // f64 deltas are sent as HINCRBYFLOAT.
        let value: f64 = conn.hincr(&key, field, amount).map_err(store_err)?;
        metrics::counter!("bandit.state.redis.increment").increment(1);
        Ok(value)
    }

    fn initialize_arm(
        &self,
        experiment_id: &str,
        arm_id: &str,
        default_state: &ArmState,
    ) -> BanditResult<()> {
        // An empty hash cannot exist in Redis; absent fields already read as defaults.
        if default_state.is_empty() {
            return Ok(());
        }

        let key = self.keys.arm_state_key(experiment_id, arm_id);
        let mut invocation = self.initialize_script.prepare_invoke();
        invocation.key(&key);
        for (field, value) in default_state {
            invocation.arg(field.as_str()).arg(*value);
        }

        let mut guard = self.conn.lock();
        let conn: &mut redis::Connection = &mut guard;
        let created: i64 = invocation.invoke(conn).map_err(store_err)?;
        if created == 1 {
            debug!(experiment_id, arm_id, "Arm state initialized");
        }
        Ok(())
    }

    fn reset_experiment(&self, experiment_id: &str) -> BanditResult<()> {
        let pattern = self.keys.experiment_arm_pattern(experiment_id);
        let mut guard = self.conn.lock();
        let conn: &mut redis::Connection = &mut guard;

        let keys: Vec<String> = conn
            .scan_match::<_, String>(&pattern)
            .map_err(store_err)?
            .collect();
        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).map_err(store_err)?;
        }

        info!(experiment_id, deleted = keys.len(), "Experiment state reset");
        Ok(())
    }
}
