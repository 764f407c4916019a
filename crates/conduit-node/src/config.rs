// Path: crates/conduit-node/src/config.rs
//! Deployment configuration, loaded from a TOML file and overridable by
//! environment variables/CLI flags (see [`crate::cli`]).

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ConduitConfig {
    pub listen_address: String,
    pub hmac_secret: String,
    #[serde(default = "default_context_server_name")]
    pub context_server_name: String,
    #[serde(default = "default_context_required_read_scope")]
    pub context_required_read_scope: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,
    #[serde(default = "default_breaker_recovery_secs")]
    pub breaker_recovery_secs: u64,
    #[serde(default = "default_heartbeat_stream_id")]
    pub heartbeat_stream_id: String,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

fn default_context_server_name() -> String {
    "InventoryDB_Primary".to_string()
}

fn default_context_required_read_scope() -> String {
    "db:inventory:read".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_breaker_threshold() -> u32 {
    3
}

fn default_breaker_recovery_secs() -> u64 {
    30
}

fn default_heartbeat_stream_id() -> String {
    "node-heartbeat".to_string()
}

fn default_heartbeat_interval_secs() -> u64 {
    10
}

impl ConduitConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn breaker_recovery(&self) -> Duration {
        Duration::from_secs(self.breaker_recovery_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_in_defaults() {
        let config = ConduitConfig::from_toml_str(
            r#"
            listen_address = "0.0.0.0:50051"
            hmac_secret = "dev-secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.context_server_name, "InventoryDB_Primary");
        assert_eq!(config.cache_ttl_secs, 30);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config = ConduitConfig::from_toml_str(
            r#"
            listen_address = "0.0.0.0:50051"
            hmac_secret = "dev-secret"
            cache_ttl_secs = 5
            breaker_threshold = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_ttl_secs, 5);
        assert_eq!(config.breaker_threshold, 10);
    }
}
