//! Classifier and scorer output shapes.
//!
//! # Responsibility
//! - Define `AiAnalysis` (classifier output) and `MomentumResult` (scorer output).
//! - Own the fixed composite formula tying momentum to its sub-scores.
//!
//! # Invariants
//! - Sub-scores live in `[0, 5]`, momentum in `[0, 10]`.
//! - `momentum_score == momentum_from_components(importance, actionability, novelty)`.

use serde::{Deserialize, Serialize};

/// Upper bound of every sub-score.
pub const SUB_SCORE_MAX: f64 = 5.0;
/// Upper bound of the composite momentum score.
pub const MOMENTUM_MAX: f64 = 10.0;
/// Neutral sub-score used when a signal cannot be computed.
pub const NEUTRAL_SUB_SCORE: f64 = 2.5;
/// Composite score of three neutral sub-scores.
pub const NEUTRAL_MOMENTUM: f64 = 5.0;
/// Category written when the classifier cannot be reached.
pub const DEFAULT_CATEGORY: &str = "General";

/// Structured output of the external text-understanding capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub category: String,
    pub summary: String,
    pub keywords: Vec<String>,
    /// Classifier rationale for the chosen category.
    pub reason: String,
}

/// Output of the momentum scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumResult {
    pub momentum_score: f64,
    pub score_reason: String,
    pub importance: f64,
    pub actionability: f64,
    pub novelty: f64,
    pub recommended_action: String,
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Clamps and rounds a raw sub-score into `[0, 5]`.
///
/// Non-finite inputs collapse to the neutral midpoint.
pub fn normalize_sub_score(value: f64) -> f64 {
    if !value.is_finite() {
        return NEUTRAL_SUB_SCORE;
    }
    round1(value.clamp(0.0, SUB_SCORE_MAX))
}

/// Composite momentum: `round1((i + a + n) * 10 / 15)` clamped to `[0, 10]`.
pub fn momentum_from_components(importance: f64, actionability: f64, novelty: f64) -> f64 {
    let sum = importance + actionability + novelty;
    if !sum.is_finite() {
        return NEUTRAL_MOMENTUM;
    }
    round1(sum * MOMENTUM_MAX / (SUB_SCORE_MAX * 3.0)).clamp(0.0, MOMENTUM_MAX)
}

/// Display band for a momentum score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumTier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl MomentumTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::VeryHigh
        } else if score >= 6.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryHigh => "Very high",
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}
