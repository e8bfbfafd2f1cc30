//! Redis key naming.

/// Builds every key the Redis store touches under a common prefix.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn arm_state_key(&self, experiment_id: &str, arm_id: &str) -> String {
        format!("{}:experiment:{experiment_id}:arm:{arm_id}", self.prefix)
    }

    /// SCAN pattern matching every arm hash of one experiment. Glob
    /// metacharacters in the prefix and experiment id are escaped so the
    /// pattern can never reach into another experiment.
    pub fn experiment_arm_pattern(&self, experiment_id: &str) -> String {
        format!(
            "{}:experiment:{}:arm:*",
            escape_glob(&self.prefix),
            escape_glob(experiment_id)
        )
    }
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_state_key_layout() {
        let keys = KeySpace::new("bandit");
        assert_eq!(keys.arm_state_key("exp_1", "A"), "bandit:experiment:exp_1:arm:A");
    }

    #[test]
    fn test_pattern_escapes_glob_characters() {
        let keys = KeySpace::new("bandit");
        assert_eq!(
            keys.experiment_arm_pattern("exp_1"),
            "bandit:experiment:exp_1:arm:*"
        );
        assert_eq!(
            keys.experiment_arm_pattern("exp*[1]?"),
            "bandit:experiment:exp\\*\\[1\\]\\?:arm:*"
        );
    }
}
