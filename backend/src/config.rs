//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary); command-line flags override them.

use crate::api::logs::log_warning;

/// Port used when neither `--port` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 3000;

/// Upload limit per request, in megabytes (three CSV files together).
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

pub const PORT_VAR: &str = "PORT";
pub const MAX_UPLOAD_VAR: &str = "CAMPAIGN_REVIEW_MAX_UPLOAD_MB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Unparseable values fall back to the
    /// defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(PORT_VAR) {
            match raw.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => log_warning(format!("Ignoring {PORT_VAR}={raw}: not a port number")),
            }
        }

        if let Some(raw) = lookup(MAX_UPLOAD_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(mb) if mb > 0 => config.max_upload_bytes = mb * 1024 * 1024,
                _ => log_warning(format!("Ignoring {MAX_UPLOAD_VAR}={raw}: expected a positive number")),
            }
        }

        config
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_environment_values() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080"), (MAX_UPLOAD_VAR, "5")]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "http"), (MAX_UPLOAD_VAR, "0")]));
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_flag_overrides_environment() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")])).with_port(Some(9000));
        assert_eq!(config.port, 9000);
        assert_eq!(config.clone().with_port(None).port, 9000);
    }
}
