use crate::import::block_builder::{ScoreSettings, DEFAULT_WEIGHT};
use crate::models::Source;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration
/// Loads a .env file if present, then reads environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// League of Legends install directory; builds go under `Game/Config/Champions`
    pub lol_dir: PathBuf,
    pub sources: BTreeSet<Source>,
    /// Keep previously imported builds instead of clearing them first
    pub keep_old: bool,
    pub max_concurrent: usize,
    pub request_timeout: Duration,
    /// Data Dragon locale for item names
    pub item_language: String,
    /// Win-rate weight when ranking MurderBridge item sets
    pub score_weight: f64,
    pub score_settings: ScoreSettings,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Config: loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, or a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lol_dir = lookup("CHAMPR_LOL_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("CHAMPR_LOL_DIR"))?;

        let sources = match lookup("CHAMPR_SOURCES") {
            Some(list) => parse_sources(&list)?,
            None => Source::ALL.iter().copied().collect(),
        };

        let keep_old = match lookup("CHAMPR_KEEP_OLD") {
            Some(v) => parse_bool("CHAMPR_KEEP_OLD", &v)?,
            None => false,
        };

        let max_concurrent = match lookup("CHAMPR_MAX_CONCURRENT") {
            Some(v) => parse_positive("CHAMPR_MAX_CONCURRENT", &v)?,
            None => 10,
        };

        let timeout_secs = match lookup("CHAMPR_REQUEST_TIMEOUT_SECS") {
            Some(v) => parse_positive("CHAMPR_REQUEST_TIMEOUT_SECS", &v)?,
            None => 30,
        };

        let item_language = lookup("CHAMPR_ITEM_LANG").unwrap_or_else(|| "en_US".to_string());

        let defaults = ScoreSettings::default();
        let score_weight = match lookup("CHAMPR_SCORE_WEIGHT") {
            Some(v) => parse_weight("CHAMPR_SCORE_WEIGHT", &v)?,
            None => DEFAULT_WEIGHT,
        };
        let frequency_weight = match lookup("CHAMPR_FREQUENCY_WEIGHT") {
            Some(v) => parse_weight("CHAMPR_FREQUENCY_WEIGHT", &v)?,
            None => defaults.frequency_weight,
        };
        let min_frequency = match lookup("CHAMPR_MIN_FREQUENCY") {
            Some(v) => parse_weight("CHAMPR_MIN_FREQUENCY", &v)?,
            None => defaults.min_frequency,
        };

        info!(
            "Config: {} source(s) into {}, keep_old={}",
            sources.len(),
            lol_dir.display(),
            keep_old
        );

        Ok(Self {
            lol_dir,
            sources,
            keep_old,
            max_concurrent,
            request_timeout: Duration::from_secs(timeout_secs as u64),
            item_language,
            score_weight,
            score_settings: ScoreSettings {
                frequency_weight,
                min_frequency,
            },
        })
    }
}

fn parse_sources(list: &str) -> Result<BTreeSet<Source>, ConfigError> {
    let sources = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Source>().map_err(|_| ConfigError::Invalid {
                key: "CHAMPR_SOURCES",
                value: s.to_string(),
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    if sources.is_empty() {
        warn!("Config: CHAMPR_SOURCES is empty, nothing will be imported");
    }
    Ok(sources)
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

/// Non-negative finite float
fn parse_weight(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("CHAMPR_LOL_DIR", "/games/lol")]).unwrap();
        assert_eq!(config.lol_dir, PathBuf::from("/games/lol"));
        assert_eq!(config.sources.len(), 3);
        assert!(!config.keep_old);
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.item_language, "en_US");
        assert_eq!(config.score_weight, 2.5);
        assert_eq!(config.score_settings, ScoreSettings::default());
    }

    #[test]
    fn test_scoring_settings() {
        let config = config(&[
            ("CHAMPR_LOL_DIR", "/games/lol"),
            ("CHAMPR_SCORE_WEIGHT", "1.5"),
            ("CHAMPR_FREQUENCY_WEIGHT", "0"),
            ("CHAMPR_MIN_FREQUENCY", " 0.25 "),
        ])
        .unwrap();
        assert_eq!(config.score_weight, 1.5);
        assert_eq!(config.score_settings.frequency_weight, 0.0);
        assert_eq!(config.score_settings.min_frequency, 0.25);

        for bad in ["-1", "NaN", "inf", "heavy"] {
            assert_eq!(
                super::parse_weight("CHAMPR_SCORE_WEIGHT", bad),
                Err(ConfigError::Invalid {
                    key: "CHAMPR_SCORE_WEIGHT",
                    value: bad.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_lol_dir_is_required() {
        assert_eq!(config(&[]), Err(ConfigError::Missing("CHAMPR_LOL_DIR")));
    }

    #[test]
    fn test_source_list_and_flags() {
        let config = config(&[
            ("CHAMPR_LOL_DIR", "/games/lol"),
            ("CHAMPR_SOURCES", "op.gg, murderbridge"),
            ("CHAMPR_KEEP_OLD", "true"),
            ("CHAMPR_MAX_CONCURRENT", "4"),
        ])
        .unwrap();
        assert_eq!(
            config.sources.into_iter().collect::<Vec<_>>(),
            vec![Source::OpGg, Source::MurderBridge]
        );
        assert!(config.keep_old);
        assert_eq!(config.max_concurrent, 4);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("CHAMPR_LOL_DIR", "/x"), ("CHAMPR_SOURCES", "u.gg")]),
            Err(ConfigError::Invalid { key: "CHAMPR_SOURCES", .. })
        ));
        assert!(matches!(
            config(&[("CHAMPR_LOL_DIR", "/x"), ("CHAMPR_MAX_CONCURRENT", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
