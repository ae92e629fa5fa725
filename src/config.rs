//! Runtime configuration
//!
//! Read from the environment (a `.env` file is honoured by the binary), then
//! selectively overridden by command-line flags.

use crate::loader::DEFAULT_API_URL;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the persisted collection and deck documents
    pub data_dir: PathBuf,
    /// Base URL of the card search API
    pub api_url: String,
    /// Local card dump to use instead of the API
    pub card_db: Option<PathBuf>,
    /// Lookups in flight during an import (1 = sequential)
    pub import_concurrency: usize,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("mtg-data"),
            api_url: DEFAULT_API_URL.to_string(),
            card_db: None,
            import_concurrency: 1,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Build from `MTG_*` environment variables, defaulting anything unset
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        Config {
            data_dir: var("MTG_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            api_url: var("MTG_API_URL").unwrap_or(defaults.api_url),
            card_db: var("MTG_CARD_DB").map(PathBuf::from),
            import_concurrency: var("MTG_IMPORT_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.import_concurrency),
            http_timeout: var("MTG_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reads_variables_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("MTG_DATA_DIR", "/tmp/mtg"),
            ("MTG_CARD_DB", "cards.json"),
            ("MTG_IMPORT_CONCURRENCY", "8"),
            ("MTG_HTTP_TIMEOUT_SECS", "soon"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/mtg"));
        assert_eq!(config.card_db, Some(PathBuf::from("cards.json")));
        assert_eq!(config.import_concurrency, 8);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
