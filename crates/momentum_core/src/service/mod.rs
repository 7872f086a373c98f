//! Engine use-case services.
//!
//! # Responsibility
//! - Orchestrate classifier, scorer, store and analytical passes into the
//!   engine's public operations.
//! - Keep CLI callers decoupled from storage details.

pub mod note_service;
