//! Core of the momentum note intelligence engine.
//! This crate is the single source of truth for note invariants and scoring.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod db;
pub mod insight;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use analysis::classifier::{AnalysisError, Classifier, HeuristicClassifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::analytics::AnalyticsData;
pub use model::insight::{AiAnalysis, MomentumResult, MomentumTier};
pub use model::note::{Note, NoteId, NotePatch, NoteValidationError};
pub use model::suggestion::{ResurfacedNote, Suggestion, SuggestionKind};
pub use repo::note_repo::{
    NoteListQuery, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
};
pub use service::note_service::{NoteService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
