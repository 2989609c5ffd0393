//! Process configuration read from `KNOWLEDGE_*` environment variables.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "KNOWLEDGE_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "KNOWLEDGE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "KNOWLEDGE_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "db/graph.db";

/// Runtime settings shared by binaries embedding the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is skipped when unset.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = read(DB_PATH_VAR)
            .map(|value| PathBuf::from(value.trim()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => normalize_level(&level)?,
            None => default_log_level(),
        };
        let log_dir = read(LOG_DIR_VAR).map(|value| PathBuf::from(value.trim()));

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DEFAULT_DB_PATH};
    use crate::logging::{default_log_level, LoggingError};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn values_are_read_and_normalized() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("KNOWLEDGE_DB_PATH", " /data/kg.db "),
            ("KNOWLEDGE_LOG_LEVEL", "Warning"),
            ("KNOWLEDGE_LOG_DIR", "/var/log/kg"),
        ]))
        .expect("config is valid");
        assert_eq!(config.db_path, PathBuf::from("/data/kg.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/kg")));
    }

    #[test]
    fn blank_values_count_as_unset_and_bad_levels_fail() {
        let config = CoreConfig::from_lookup(lookup(&[("KNOWLEDGE_LOG_DIR", "  ")]))
            .expect("blank dir is ignored");
        assert_eq!(config.log_dir, None);

        let err = CoreConfig::from_lookup(lookup(&[("KNOWLEDGE_LOG_LEVEL", "chatty")]))
            .expect_err("unknown level is rejected");
        assert_eq!(err, LoggingError::UnsupportedLevel("chatty".to_string()));
    }
}
