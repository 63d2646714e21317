use std::path::PathBuf;

use crate::error::{BotError, Result};

const DEFAULT_DATABASE_PATH: &str = "voiq.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_path: PathBuf,
    pub base_vocabulary_file: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Read configuration from the process environment, after loading `.env` if present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| BotError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))?;

        let database_path = lookup("DATABASE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let base_vocabulary_file = lookup("BASE_VOCABULARY_FILE")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            bot_token,
            database_path,
            base_vocabulary_file,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = Config::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.database_path, PathBuf::from("voiq.db"));
        assert!(config.base_vocabulary_file.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_PATH", "x.db")])).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("DATABASE_PATH", "/var/lib/voiq/words.db"),
            ("BASE_VOCABULARY_FILE", "seed.csv"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/voiq/words.db"));
        assert_eq!(config.base_vocabulary_file, Some(PathBuf::from("seed.csv")));
        assert_eq!(config.log_level, "debug");
    }
}
