//! Domain model for analyzed notes and derived insight.
//!
//! # Responsibility
//! - Define the canonical note record and the classifier/scorer output shapes.
//! - Define ephemeral outputs: suggestions, resurfaced notes, analytics.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId` that is never reused.
//! - `momentum_score` is always derived from the three sub-scores.
//! - Suggestions and analytics are recomputed, never persisted.

pub mod analytics;
pub mod insight;
pub mod note;
pub mod suggestion;
