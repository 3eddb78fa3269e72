//! Service configuration from environment variables

use std::env;
use std::time::Duration;

use game_review_core::engine::{EngineOptions, DEFAULT_DEPTH, DEFAULT_LINES};
use game_review_core::SearchParams;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("Default search parameters out of range: {0}")]
    Defaults(String),
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Used when a request omits depth or multipv
    pub default_params: SearchParams,

    pub engine_threads: usize,
    pub engine_hash_mb: usize,

    /// Engine processes that may run at once
    pub pool_size: usize,

    /// Wall-clock limit for one analysis request
    pub analysis_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            stockfish_path: "stockfish".to_string(),
            default_params: SearchParams::default(),
            engine_threads: 1,
            engine_hash_mb: 256,
            pool_size: 1,
            analysis_timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(var) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError::Invalid { var, value }),
                None => Ok(None),
            }
        };
        let narrow = |var: &'static str, value: u64| -> Result<u8, ConfigError> {
            u8::try_from(value).map_err(|_| ConfigError::Invalid {
                var,
                value: value.to_string(),
            })
        };

        let depth = match parsed("DEFAULT_DEPTH")? {
            Some(v) => narrow("DEFAULT_DEPTH", v)?,
            None => DEFAULT_DEPTH,
        };
        let multipv = match parsed("DEFAULT_MULTIPV")? {
            Some(v) => narrow("DEFAULT_MULTIPV", v)?,
            None => DEFAULT_LINES,
        };
        let default_params =
            SearchParams::new(depth, multipv).map_err(|e| ConfigError::Defaults(e.to_string()))?;

        let pool_size = parsed("ENGINE_POOL_SIZE")?.unwrap_or(1) as usize;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                var: "ENGINE_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            stockfish_path: lookup("STOCKFISH_PATH").unwrap_or_else(|| "stockfish".to_string()),
            default_params,
            engine_threads: parsed("ENGINE_THREADS")?
                .map(|v| v as usize)
                .unwrap_or_else(|| (num_cpus::get() / 2).max(1)),
            engine_hash_mb: parsed("ENGINE_HASH_MB")?.unwrap_or(256) as usize,
            pool_size,
            analysis_timeout: parsed("ANALYSIS_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            threads: self.engine_threads,
            hash_mb: self.engine_hash_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.stockfish_path, "stockfish");
        assert_eq!(config.default_params, SearchParams::default());
        assert!(config.engine_threads >= 1);
        assert_eq!(config.engine_hash_mb, 256);
        assert_eq!(config.pool_size, 1);
        assert_eq!(config.analysis_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOCKFISH_PATH", "/usr/games/stockfish"),
            ("DEFAULT_DEPTH", "12"),
            ("DEFAULT_MULTIPV", "1"),
            ("ENGINE_THREADS", "4"),
            ("ENGINE_POOL_SIZE", "3"),
            ("ANALYSIS_TIMEOUT_SECS", "90"),
        ])
        .unwrap();
        assert_eq!(config.stockfish_path, "/usr/games/stockfish");
        assert_eq!(config.default_params, SearchParams::new(12, 1).unwrap());
        assert_eq!(config.engine_options().threads, 4);
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.analysis_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_malformed_number() {
        let err = load(&[("ENGINE_HASH_MB", "lots")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "ENGINE_HASH_MB",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn test_out_of_range_defaults() {
        assert!(matches!(load(&[("DEFAULT_DEPTH", "2")]), Err(ConfigError::Defaults(_))));
        assert!(matches!(load(&[("DEFAULT_MULTIPV", "900")]), Err(ConfigError::Invalid { .. })));
        assert!(load(&[("ENGINE_POOL_SIZE", "0")]).is_err());
    }
}
