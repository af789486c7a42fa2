// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Hive configuration.
//!
//! Config values arrive as a base64-encoded JSON string from the process
//! launcher, with `HIVE_<name>` environment variables taking precedence.

use std::sync::OnceLock;

/// Global configuration singleton.
static HIVE_CONFIG: OnceLock<HiveConfig> = OnceLock::new();

/// Get the global HiveConfig, initializing env-overridden defaults on
/// first use.
pub fn hive_config() -> &'static HiveConfig {
    HIVE_CONFIG.get_or_init(|| {
        let mut config = HiveConfig::default();
        config.apply_env_overrides();
        config
    })
}

/// Initialize the global HiveConfig from a base64-encoded JSON string.
/// Returns an error if already initialized.
pub fn initialize_config(config_str: Option<&str>) -> Result<(), String> {
    let config = match config_str {
        Some(s) if !s.is_empty() => HiveConfig::from_base64_json(s)?,
        _ => HiveConfig::default(),
    };
    HIVE_CONFIG
        .set(config)
        .map_err(|_| "HiveConfig already initialized".to_string())
}

/// Recognized configuration parameters.
#[derive(Debug, Clone)]
pub struct HiveConfig {
    /// Cadence of the supervisor-liveness check on the reactor.
    pub raylet_death_check_interval_ms: u64,
    /// How long a direct task submitter waits on a worker lease.
    pub worker_lease_timeout_ms: u64,
    /// Direct-call return values larger than this are promoted to plasma
    /// at allocation time.
    pub max_direct_call_object_size: u64,
    /// Floor on retry attempts for actor creation tasks.
    pub actor_creation_min_retries: u64,
    /// Whether distributed reference counting is enabled.
    pub ref_counting_enabled: bool,
    /// Fixed delay before a failed task is resubmitted.
    pub task_retry_delay_ms: u64,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            raylet_death_check_interval_ms: 1_000,
            worker_lease_timeout_ms: 500,
            max_direct_call_object_size: 100 * 1024,
            actor_creation_min_retries: 3,
            ref_counting_enabled: true,
            task_retry_delay_ms: 5_000,
        }
    }
}

impl HiveConfig {
    /// Parse from base64-encoded JSON (as sent by the launcher).
    pub fn from_base64_json(b64: &str) -> Result<Self, String> {
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
            .map_err(|e| format!("base64 decode error: {e}"))?;
        let json_str =
            String::from_utf8(decoded).map_err(|e| format!("UTF-8 decode error: {e}"))?;
        Self::from_json(&json_str)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;

        let mut config = Self::default();

        macro_rules! set_field {
            ($field:ident, u64) => {
                if let Some(v) = map.get(stringify!($field)).and_then(|v| v.as_u64()) {
                    config.$field = v;
                }
            };
            ($field:ident, bool) => {
                if let Some(v) = map.get(stringify!($field)).and_then(|v| v.as_bool()) {
                    config.$field = v;
                }
            };
        }

        set_field!(raylet_death_check_interval_ms, u64);
        set_field!(worker_lease_timeout_ms, u64);
        set_field!(max_direct_call_object_size, u64);
        set_field!(actor_creation_min_retries, u64);
        set_field!(ref_counting_enabled, bool);
        set_field!(task_retry_delay_ms, u64);

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides of the form `HIVE_<name>`.
    fn apply_env_overrides(&mut self) {
        macro_rules! env_override {
            ($field:ident, u64) => {
                if let Ok(val) = std::env::var(concat!("HIVE_", stringify!($field))) {
                    if let Ok(v) = val.parse::<u64>() {
                        self.$field = v;
                    }
                }
            };
            ($field:ident, bool) => {
                if let Ok(val) = std::env::var(concat!("HIVE_", stringify!($field))) {
                    if let Ok(v) = val.parse::<bool>() {
                        self.$field = v;
                    }
                }
            };
        }

        env_override!(raylet_death_check_interval_ms, u64);
        env_override!(worker_lease_timeout_ms, u64);
        env_override!(max_direct_call_object_size, u64);
        env_override!(actor_creation_min_retries, u64);
        env_override!(ref_counting_enabled, bool);
        env_override!(task_retry_delay_ms, u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HiveConfig::default();
        assert_eq!(config.raylet_death_check_interval_ms, 1_000);
        assert_eq!(config.max_direct_call_object_size, 100 * 1024);
        assert!(config.ref_counting_enabled);
        assert_eq!(config.task_retry_delay_ms, 5_000);
    }

    #[test]
    fn test_json_parse() {
        let json = r#"{"worker_lease_timeout_ms": 250, "ref_counting_enabled": false}"#;
        let config = HiveConfig::from_json(json).unwrap();
        assert_eq!(config.worker_lease_timeout_ms, 250);
        assert!(!config.ref_counting_enabled);
    }

    #[test]
    fn test_base64_json_roundtrip() {
        use base64::Engine;
        let json = r#"{"max_direct_call_object_size": 4096}"#;
        let b64 = base64::engine::general_purpose::STANDARD.encode(json);
        let config = HiveConfig::from_base64_json(&b64).unwrap();
        assert_eq!(config.max_direct_call_object_size, 4096);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = HiveConfig::from_json(r#"{"no_such_key": 1}"#).unwrap();
        assert_eq!(config.actor_creation_min_retries, 3);
    }
}
