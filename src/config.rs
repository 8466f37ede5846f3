//! Environment configuration, loaded once at boot. Missing required
//! variables are a fatal `ConfigError` (spec.md §7).

use crate::error::RelayError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub admin_master_key: String,
    pub upstream_ws_url: String,
    pub upstream_api_key: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub db_idle_timeout: Duration,
    pub legacy_payload_envelope: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, RelayError> {
        let database_url = require_env("DATABASE_URL")?;
        let admin_master_key = require_env("ADMIN_MASTER_KEY")?;
        let upstream_ws_url = require_env("TELEGRAB_WS_URL")?;
        let upstream_api_key = require_env("TELEGRAB_API_KEY")?;
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_owned());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

        let db_max_connections = parse_env_or("DB_MAX_CONNECTIONS", 20)?;
        let db_connect_timeout_secs = parse_env_or("DB_CONNECT_TIMEOUT_SECS", 2)?;
        let db_idle_timeout_secs = parse_env_or("DB_IDLE_TIMEOUT_SECS", 30)?;
        let legacy_payload_envelope = env::var("LEGACY_PAYLOAD_ENVELOPE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            admin_master_key,
            upstream_ws_url,
            upstream_api_key,
            bind_addr,
            db_max_connections,
            db_connect_timeout: Duration::from_secs(db_connect_timeout_secs),
            db_idle_timeout: Duration::from_secs(db_idle_timeout_secs),
            legacy_payload_envelope,
        })
    }
}

fn require_env(name: &str) -> Result<String, RelayError> {
    env::var(name).map_err(|_| RelayError::Config(format!("{name} must be set")))
}

fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, RelayError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RelayError::Config(format!("{name} is not a valid value"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "DATABASE_URL",
            "ADMIN_MASTER_KEY",
            "TELEGRAB_WS_URL",
            "TELEGRAB_API_KEY",
            "PORT",
            "BIND_ADDR",
            "DB_MAX_CONNECTIONS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn from_env_fails_fast_when_required_var_is_missing() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn from_env_defaults_bind_addr_from_port() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("DATABASE_URL", "postgres://x");
        env::set_var("ADMIN_MASTER_KEY", "k");
        env::set_var("TELEGRAB_WS_URL", "wss://x");
        env::set_var("TELEGRAB_API_KEY", "k2");
        env::set_var("PORT", "9090");

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9090");
        assert_eq!(cfg.db_max_connections, 20);
        clear_all();
    }
}
