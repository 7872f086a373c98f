//! Analyzed note domain model.
//!
//! # Responsibility
//! - Define the canonical note record assembled from text, classifier output
//!   and scorer output.
//! - Provide validation and partial-update helpers used by the note store.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `text` and `created_at` are immutable after creation.
//! - `last_interacted_at >= created_at` and `updated_at >= created_at`.
//! - `momentum_score` is derived from the sub-scores, never set on its own.

use crate::model::insight::{
    momentum_from_components, AiAnalysis, MomentumResult, MOMENTUM_MAX, SUB_SCORE_MAX,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every note.
pub type NoteId = Uuid;

const MOMENTUM_EPSILON: f64 = 1e-9;

/// Validation errors for note invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValidationError {
    /// Nil UUID is reserved and cannot identify a note.
    NilId,
    /// Note text is empty or whitespace-only.
    BlankText,
    /// A sub-score is outside `[0, 5]` or not finite.
    SubScoreOutOfRange { field: &'static str, value: f64 },
    /// Momentum is outside `[0, 10]` or disagrees with the sub-scores.
    MomentumMismatch { stored: f64, derived: f64 },
    /// `last_interacted_at` precedes `created_at`.
    InteractionBeforeCreation {
        created_at: i64,
        last_interacted_at: i64,
    },
    /// `updated_at` precedes `created_at`.
    UpdateBeforeCreation { created_at: i64, updated_at: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "note id cannot be nil"),
            Self::BlankText => write!(f, "note text cannot be blank"),
            Self::SubScoreOutOfRange { field, value } => {
                write!(f, "{field} ({value}) must be within [0, {SUB_SCORE_MAX}]")
            }
            Self::MomentumMismatch { stored, derived } => write!(
                f,
                "momentum_score ({stored}) must equal derived score ({derived}) within [0, {MOMENTUM_MAX}]"
            ),
            Self::InteractionBeforeCreation {
                created_at,
                last_interacted_at,
            } => write!(
                f,
                "last_interacted_at ({last_interacted_at}) must be >= created_at ({created_at})"
            ),
            Self::UpdateBeforeCreation {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical analyzed note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Original user-entered content.
    pub text: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds. Advances on every mutation.
    pub updated_at: i64,
    pub category: String,
    pub summary: String,
    /// Ordered classifier keywords; duplicates are allowed.
    pub keywords: Vec<String>,
    pub reason: String,
    pub momentum_score: f64,
    pub score_reason: String,
    pub importance: f64,
    pub actionability: f64,
    pub novelty: f64,
    pub recommended_action: String,
    /// Last time the user viewed or engaged with this note.
    pub last_interacted_at: i64,
    pub is_favorite: bool,
    /// Last time this note was shown as a resurfaced note.
    pub last_resurfaced_at: Option<i64>,
}

impl Note {
    /// Assembles a new note with a generated stable ID.
    pub fn assemble(
        text: impl Into<String>,
        analysis: AiAnalysis,
        momentum: MomentumResult,
        now_ms: i64,
    ) -> Self {
        Self::assemble_with_id(Uuid::new_v4(), text, analysis, momentum, now_ms)
    }

    /// Assembles a note with a caller-provided ID.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn assemble_with_id(
        id: NoteId,
        text: impl Into<String>,
        analysis: AiAnalysis,
        momentum: MomentumResult,
        now_ms: i64,
    ) -> Self {
        let mut note = Self {
            id,
            text: text.into(),
            created_at: now_ms,
            updated_at: now_ms,
            category: String::new(),
            summary: String::new(),
            keywords: Vec::new(),
            reason: String::new(),
            momentum_score: 0.0,
            score_reason: String::new(),
            importance: 0.0,
            actionability: 0.0,
            novelty: 0.0,
            recommended_action: String::new(),
            last_interacted_at: now_ms,
            is_favorite: false,
            last_resurfaced_at: None,
        };
        note.set_analysis(analysis);
        note.set_momentum(momentum);
        note
    }

    /// Checks every note invariant.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.is_nil() {
            return Err(NoteValidationError::NilId);
        }
        if self.text.trim().is_empty() {
            return Err(NoteValidationError::BlankText);
        }

        for (field, value) in [
            ("importance", self.importance),
            ("actionability", self.actionability),
            ("novelty", self.novelty),
        ] {
            if !value.is_finite() || !(0.0..=SUB_SCORE_MAX).contains(&value) {
                return Err(NoteValidationError::SubScoreOutOfRange { field, value });
            }
        }

        let derived = momentum_from_components(self.importance, self.actionability, self.novelty);
        if !self.momentum_score.is_finite()
            || (self.momentum_score - derived).abs() > MOMENTUM_EPSILON
        {
            return Err(NoteValidationError::MomentumMismatch {
                stored: self.momentum_score,
                derived,
            });
        }

        if self.last_interacted_at < self.created_at {
            return Err(NoteValidationError::InteractionBeforeCreation {
                created_at: self.created_at,
                last_interacted_at: self.last_interacted_at,
            });
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::UpdateBeforeCreation {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }

        Ok(())
    }

    /// Applies a partial update and advances `updated_at`.
    ///
    /// Interaction timestamps are clamped so they never precede creation.
    pub fn apply_patch(&mut self, patch: &NotePatch, now_ms: i64) {
        if let Some(analysis) = patch.analysis.as_ref() {
            self.set_analysis(analysis.clone());
        }
        if let Some(momentum) = patch.momentum.as_ref() {
            self.set_momentum(momentum.clone());
        }
        if let Some(at) = patch.last_interacted_at {
            self.last_interacted_at = at.max(self.created_at);
        }
        if let Some(at) = patch.last_resurfaced_at {
            self.last_resurfaced_at = Some(at.max(self.created_at));
        }
        match patch.favorite {
            Some(FavoriteUpdate::Set(value)) => self.is_favorite = value,
            Some(FavoriteUpdate::Toggle) => self.is_favorite = !self.is_favorite,
            None => {}
        }
        self.updated_at = self.updated_at.max(now_ms).max(self.created_at);
    }

    /// Plain-text export used by share flows.
    pub fn share_text(&self) -> String {
        format!(
            "{}\n\nCategory: {}\nMomentum: {:.1}/10\n\n{}",
            self.summary, self.category, self.momentum_score, self.text
        )
    }

    fn set_analysis(&mut self, analysis: AiAnalysis) {
        self.category = analysis.category;
        self.summary = analysis.summary;
        self.keywords = analysis.keywords;
        self.reason = analysis.reason;
    }

    fn set_momentum(&mut self, momentum: MomentumResult) {
        self.importance = momentum.importance;
        self.actionability = momentum.actionability;
        self.novelty = momentum.novelty;
        self.momentum_score =
            momentum_from_components(momentum.importance, momentum.actionability, momentum.novelty);
        self.score_reason = momentum.score_reason;
        self.recommended_action = momentum.recommended_action;
    }
}

/// Favorite flag change carried by a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteUpdate {
    Set(bool),
    /// Flip relative to the stored value at write time.
    Toggle,
}

/// Partial update for mutable note fields.
///
/// `text`, `id` and `created_at` are intentionally absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    /// Replaces category, summary, keywords and reason together.
    pub analysis: Option<AiAnalysis>,
    /// Replaces all scorer fields together.
    pub momentum: Option<MomentumResult>,
    pub last_interacted_at: Option<i64>,
    pub last_resurfaced_at: Option<i64>,
    pub favorite: Option<FavoriteUpdate>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_none()
            && self.momentum.is_none()
            && self.last_interacted_at.is_none()
            && self.last_resurfaced_at.is_none()
            && self.favorite.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{FavoriteUpdate, Note, NotePatch, NoteValidationError};
    use crate::model::insight::{AiAnalysis, MomentumResult};

    fn analysis() -> AiAnalysis {
        AiAnalysis {
            category: "Business".to_string(),
            summary: "Pricing experiment".to_string(),
            keywords: vec!["pricing".to_string(), "churn".to_string()],
            reason: "mentions pricing".to_string(),
        }
    }

    fn momentum(importance: f64, actionability: f64, novelty: f64) -> MomentumResult {
        MomentumResult {
            momentum_score: 0.0,
            score_reason: "test".to_string(),
            importance,
            actionability,
            novelty,
            recommended_action: "Review".to_string(),
        }
    }

    #[test]
    fn assemble_derives_momentum_from_sub_scores() {
        let note = Note::assemble("raise prices", analysis(), momentum(4.0, 2.0, 3.0), 1_000);
        assert_eq!(note.momentum_score, 6.0);
        assert_eq!(note.last_interacted_at, 1_000);
        assert!(note.validate().is_ok());
    }

    #[test]
    fn validate_rejects_tampered_momentum() {
        let mut note = Note::assemble("raise prices", analysis(), momentum(4.0, 2.0, 3.0), 1_000);
        note.momentum_score = 9.0;
        assert!(matches!(
            note.validate(),
            Err(NoteValidationError::MomentumMismatch { .. })
        ));
    }

    #[test]
    fn patch_clamps_interaction_and_toggles_favorite() {
        let mut note = Note::assemble("raise prices", analysis(), momentum(1.0, 1.0, 1.0), 5_000);
        let patch = NotePatch {
            last_interacted_at: Some(10),
            favorite: Some(FavoriteUpdate::Toggle),
            ..NotePatch::default()
        };
        note.apply_patch(&patch, 6_000);
        assert_eq!(note.last_interacted_at, 5_000);
        assert!(note.is_favorite);
        assert_eq!(note.updated_at, 6_000);
        assert!(note.validate().is_ok());
    }

    #[test]
    fn share_text_includes_summary_category_and_score() {
        let note = Note::assemble("raise prices", analysis(), momentum(4.0, 2.0, 3.0), 1_000);
        assert_eq!(
            note.share_text(),
            "Pricing experiment\n\nCategory: Business\nMomentum: 6.0/10\n\nraise prices"
        );
    }
}
