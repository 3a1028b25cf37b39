//! Analyzer configuration from environment variables

use crate::trend_core::{DEFAULT_BREAKOUT_THRESHOLD_PCT, DEFAULT_REPORT_SIZE};
use std::env;

/// Configuration for a `TrendAnalyzer` and its ingestion task
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Capacity of every gainers/losers heap
    pub max_heap_size: usize,

    /// Observations kept per symbol in the sliding window
    pub window_size: usize,

    /// Historical comparison timeframes, one heap pair each
    pub timeframes: Vec<String>,

    /// Deviation from the window average that counts as a breakout
    pub breakout_threshold_pct: f64,

    /// Entries per section of a summary report
    pub report_size: usize,

    /// Ingestion channel buffer size (batches)
    pub channel_buffer: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_heap_size: 10,
            window_size: 60,
            timeframes: vec!["one_week".to_string(), "two_week".to_string()],
            breakout_threshold_pct: DEFAULT_BREAKOUT_THRESHOLD_PCT,
            report_size: DEFAULT_REPORT_SIZE,
            channel_buffer: 64,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `TREND_MAX_HEAP_SIZE` (default: 10)
    /// - `TREND_WINDOW_SIZE` (default: 60)
    /// - `TREND_TIMEFRAMES` (default: one_week,two_week; empty disables)
    /// - `TREND_BREAKOUT_THRESHOLD_PCT` (default: 5.0)
    /// - `TREND_REPORT_SIZE` (default: 5)
    /// - `TREND_CHANNEL_BUFFER` (default: 64)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timeframes = match env::var("TREND_TIMEFRAMES") {
            Ok(s) => s
                .split(',')
                .map(|tf| tf.trim().to_string())
                .filter(|tf| !tf.is_empty())
                .collect(),
            Err(_) => defaults.timeframes,
        };

        let config = Self {
            max_heap_size: env::var("TREND_MAX_HEAP_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_heap_size),

            window_size: env::var("TREND_WINDOW_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.window_size),

            timeframes,

            breakout_threshold_pct: env::var("TREND_BREAKOUT_THRESHOLD_PCT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.breakout_threshold_pct),

            report_size: env::var("TREND_REPORT_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.report_size),

            channel_buffer: env::var("TREND_CHANNEL_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.channel_buffer),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_heap_size == 0 {
            return Err(ConfigError::InvalidValue(
                "TREND_MAX_HEAP_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.window_size == 0 {
            return Err(ConfigError::InvalidValue(
                "TREND_WINDOW_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "TREND_CHANNEL_BUFFER must be greater than 0".to_string(),
            ));
        }

        if !self.breakout_threshold_pct.is_finite() || self.breakout_threshold_pct < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "TREND_BREAKOUT_THRESHOLD_PCT must be a non-negative number, got {}",
                self.breakout_threshold_pct
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "TREND_MAX_HEAP_SIZE",
        "TREND_WINDOW_SIZE",
        "TREND_TIMEFRAMES",
        "TREND_BREAKOUT_THRESHOLD_PCT",
        "TREND_REPORT_SIZE",
        "TREND_CHANNEL_BUFFER",
    ];

    // Env vars are process-wide, so defaults and overrides run in one test
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = AnalyzerConfig::from_env().unwrap();
        assert_eq!(config, AnalyzerConfig::default());

        env::set_var("TREND_MAX_HEAP_SIZE", "20");
        env::set_var("TREND_WINDOW_SIZE", "not-a-number");
        env::set_var("TREND_TIMEFRAMES", " day, ,week ");
        env::set_var("TREND_BREAKOUT_THRESHOLD_PCT", "2.5");

        let config = AnalyzerConfig::from_env().unwrap();
        assert_eq!(config.max_heap_size, 20);
        assert_eq!(config.window_size, 60);
        assert_eq!(config.timeframes, vec!["day".to_string(), "week".to_string()]);
        assert_eq!(config.breakout_threshold_pct, 2.5);

        env::set_var("TREND_TIMEFRAMES", "");
        env::set_var("TREND_MAX_HEAP_SIZE", "0");
        assert!(matches!(
            AnalyzerConfig::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));

        env::remove_var("TREND_MAX_HEAP_SIZE");
        let config = AnalyzerConfig::from_env().unwrap();
        assert!(config.timeframes.is_empty());

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = AnalyzerConfig {
            breakout_threshold_pct: -1.0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
