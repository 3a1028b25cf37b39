
pub mod config;
pub mod trend_core;

pub use config::{AnalyzerConfig, ConfigError};
pub use trend_core::TrendAnalyzer;
