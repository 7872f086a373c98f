//! Note analysis pipeline.
//!
//! # Responsibility
//! - Call the external classifier with timeout, retry and fallback.
//! - Score momentum from text, classification and recent history.
//!
//! # Invariants
//! - Analysis never blocks note creation; every failure has a fallback.

pub mod classifier;
pub mod momentum;
pub mod text;
