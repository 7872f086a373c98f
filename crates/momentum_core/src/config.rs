//! Engine configuration.
//!
//! # Responsibility
//! - Hold every tunable window/threshold used by scoring, resurfacing,
//!   suggestions and analytics.
//! - Load configuration from JSON documents and reject invalid values.
//!
//! # Invariants
//! - Every field has a default; partial documents are valid.
//! - `validate()` must pass before a config reaches the engine.

use crate::clock::{MS_PER_DAY, MS_PER_HOUR};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid config value `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub resurfacing: ResurfaceConfig,
    pub suggestions: SuggestionConfig,
    pub analytics: AnalyticsConfig,
}

/// Classifier call policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Per-attempt deadline for one classifier call.
    pub timeout_ms: u64,
    /// Extra attempts after the first failure.
    pub max_retries: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            max_retries: 1,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Momentum scoring knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Notes created within this window count as "recent history" for novelty.
    pub novelty_window_days: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            novelty_window_days: 14,
        }
    }
}

impl ScoringConfig {
    pub fn novelty_window_ms(&self) -> i64 {
        i64::from(self.novelty_window_days) * MS_PER_DAY
    }
}

/// Resurfacing eligibility and urgency knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResurfaceConfig {
    pub min_dormancy_hours: u32,
    /// Dormancy at which the decay factor reaches 1.
    pub saturation_days: u32,
    /// Minimum momentum score for eligibility.
    pub threshold: f64,
}

impl Default for ResurfaceConfig {
    fn default() -> Self {
        Self {
            min_dormancy_hours: 24,
            saturation_days: 7,
            threshold: 5.0,
        }
    }
}

impl ResurfaceConfig {
    pub fn min_dormancy_ms(&self) -> i64 {
        i64::from(self.min_dormancy_hours) * MS_PER_HOUR
    }

    pub fn saturation_ms(&self) -> i64 {
        i64::from(self.saturation_days) * MS_PER_DAY
    }
}

/// Suggestion detector knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Maximum creation distance between two connected notes.
    pub connection_window_days: u32,
    pub combine_min_notes: usize,
    /// Minimum summed momentum of a category group before consolidation.
    pub combine_momentum_threshold: f64,
    pub trend_window_days: u32,
    /// Recent/prior window count ratio that marks a category as trending.
    pub trend_ratio: f64,
    /// Minimum recent-window notes before a category can trend.
    pub trend_min_notes: usize,
    /// Cap for `related_note_ids` on multi-note suggestions.
    pub max_related: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            connection_window_days: 30,
            combine_min_notes: 3,
            combine_momentum_threshold: 15.0,
            trend_window_days: 7,
            trend_ratio: 1.5,
            trend_min_notes: 2,
            max_related: 5,
        }
    }
}

impl SuggestionConfig {
    pub fn connection_window_ms(&self) -> i64 {
        i64::from(self.connection_window_days) * MS_PER_DAY
    }

    pub fn trend_window_ms(&self) -> i64 {
        i64::from(self.trend_window_days) * MS_PER_DAY
    }
}

/// Analytics aggregation knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Offset applied to epoch timestamps when bucketing into calendar days.
    pub utc_offset_minutes: i32,
    pub top_categories: usize,
    pub high_momentum_threshold: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            top_categories: 5,
            high_momentum_threshold: 7.0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects values that would make engine behavior undefined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.timeout_ms == 0 {
            return Err(invalid("classifier.timeout_ms", "must be > 0"));
        }
        if self.scoring.novelty_window_days == 0 {
            return Err(invalid("scoring.novelty_window_days", "must be > 0"));
        }
        if self.resurfacing.saturation_ms() < self.resurfacing.min_dormancy_ms() {
            return Err(invalid(
                "resurfacing.saturation_days",
                "must cover at least min_dormancy_hours",
            ));
        }
        check_score_range("resurfacing.threshold", self.resurfacing.threshold)?;
        if self.suggestions.connection_window_days == 0 {
            return Err(invalid("suggestions.connection_window_days", "must be > 0"));
        }
        if self.suggestions.combine_min_notes < 2 {
            return Err(invalid("suggestions.combine_min_notes", "must be >= 2"));
        }
        if !self.suggestions.combine_momentum_threshold.is_finite()
            || self.suggestions.combine_momentum_threshold < 0.0
        {
            return Err(invalid(
                "suggestions.combine_momentum_threshold",
                "must be a finite value >= 0",
            ));
        }
        if self.suggestions.trend_window_days == 0 {
            return Err(invalid("suggestions.trend_window_days", "must be > 0"));
        }
        if !self.suggestions.trend_ratio.is_finite() || self.suggestions.trend_ratio < 1.0 {
            return Err(invalid("suggestions.trend_ratio", "must be >= 1.0"));
        }
        if self.suggestions.max_related == 0 {
            return Err(invalid("suggestions.max_related", "must be > 0"));
        }
        if self.analytics.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(invalid(
                "analytics.utc_offset_minutes",
                "must be within one day of UTC",
            ));
        }
        check_score_range(
            "analytics.high_momentum_threshold",
            self.analytics.high_momentum_threshold,
        )?;
        Ok(())
    }
}

fn check_score_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=10.0).contains(&value) {
        return Err(invalid(field, format!("must be within [0, 10], got {value}")));
    }
    Ok(())
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};

    #[test]
    fn partial_document_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"resurfacing": {"threshold": 6.5}}"#)
            .expect("partial config should parse");
        assert_eq!(config.resurfacing.threshold, 6.5);
        assert_eq!(config.resurfacing.min_dormancy_hours, 24);
        assert_eq!(config.suggestions.trend_ratio, 1.5);
        assert_eq!(config.scoring.novelty_window_days, 14);
    }

    #[test]
    fn rejects_trend_ratio_below_one() {
        let err = EngineConfig::from_json_str(r#"{"suggestions": {"trend_ratio": 0.5}}"#)
            .expect_err("ratio < 1 must be rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "suggestions.trend_ratio",
                ..
            }
        ));
    }

    #[test]
    fn rejects_saturation_shorter_than_dormancy() {
        let err = EngineConfig::from_json_str(
            r#"{"resurfacing": {"min_dormancy_hours": 200, "saturation_days": 7}}"#,
        )
        .expect_err("saturation window must cover dormancy");
        assert!(err.to_string().contains("saturation_days"));
    }

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default()
            .validate()
            .expect("defaults should validate");
    }
}
