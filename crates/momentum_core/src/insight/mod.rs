//! Read-only analytical passes over a note snapshot.
//!
//! # Responsibility
//! - Select notes to resurface.
//! - Detect and rank cross-note suggestions.
//! - Aggregate the analytics summary.
//!
//! # Invariants
//! - Every pass is a pure function of `(notes, now, config)`.
//! - No pass fails; degenerate input yields empty or neutral output.
//! - Output order is driven by explicit sort keys only.

pub mod analytics;
pub mod resurface;
pub mod suggest;
