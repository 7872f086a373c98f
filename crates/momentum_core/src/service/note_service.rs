//! Note intelligence engine facade.
//!
//! # Responsibility
//! - Turn raw text into an analyzed, scored and persisted note.
//! - Route note mutations through the store with the injected clock.
//! - Run resurfacing, suggestions and analytics over a store snapshot.
//!
//! # Invariants
//! - Blank text is rejected before the classifier or scorer run.
//! - Classifier failure never blocks note creation; the fallback analysis
//!   is stored instead.
//! - Read-only passes never mutate the store.
//!
//! # See also
//! - `insight` for the pure analytical passes.

use crate::analysis::classifier::{fallback_analysis, Classifier, ClassifierGateway};
use crate::analysis::momentum::{score, NoveltyContext};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::insight::analytics::aggregate;
use crate::insight::resurface::select_resurface_candidates;
use crate::insight::suggest::generate_suggestions;
use crate::model::analytics::AnalyticsData;
use crate::model::insight::{AiAnalysis, MomentumResult};
use crate::model::note::{FavoriteUpdate, Note, NoteId, NotePatch};
use crate::model::suggestion::{ResurfacedNote, Suggestion};
use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Service error for engine use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller input rejected before any work happened.
    InvalidInput(String),
    /// Target note does not exist.
    NotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Engine facade over a note store, classifier and clock.
pub struct NoteService<R: NoteRepository, K: Clock> {
    repo: R,
    classifier: ClassifierGateway,
    clock: K,
    config: EngineConfig,
}

impl<R: NoteRepository, K: Clock> NoteService<R, K> {
    pub fn new(repo: R, classifier: Arc<dyn Classifier>, clock: K, config: EngineConfig) -> Self {
        let gateway = ClassifierGateway::new(classifier, config.classifier.clone());
        Self {
            repo,
            classifier: gateway,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyzes, scores and persists one note.
    ///
    /// # Errors
    /// - `InvalidInput` for empty or whitespace-only text.
    /// - `Repo` when persistence fails.
    pub fn create_analyzed_note(&self, text: &str) -> ServiceResult<Note> {
        let started_at = Instant::now();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::InvalidInput(
                "note text cannot be blank".to_string(),
            ));
        }

        let analysis = self.analyze_or_fallback(trimmed, None);
        let history = self.snapshot()?;
        let now_ms = self.clock.now_ms();
        let momentum = self.score_against(trimmed, &analysis, &history, now_ms, None);

        let note = Note::assemble(text, analysis, momentum, now_ms);
        let note_id = self.repo.create_note(&note)?;
        let stored = self
            .repo
            .get_note(note_id)?
            .ok_or(ServiceError::InconsistentState(
                "created note not found in read-back",
            ))?;

        info!(
            "event=note_create module=service status=ok note_id={} momentum={:.1} keywords={} duration_ms={}",
            stored.id,
            stored.momentum_score,
            stored.keywords.len(),
            started_at.elapsed().as_millis()
        );
        Ok(stored)
    }

    /// Reruns classification and scoring for an existing note.
    pub fn reanalyze_note(&mut self, id: NoteId) -> ServiceResult<Note> {
        let note = self.get_note(id)?;
        let analysis = self.analyze_or_fallback(note.text.trim(), Some(id));
        let history = self.snapshot()?;
        let now_ms = self.clock.now_ms();
        let momentum = self.score_against(note.text.trim(), &analysis, &history, now_ms, Some(id));

        let patch = NotePatch {
            analysis: Some(analysis),
            momentum: Some(momentum),
            ..NotePatch::default()
        };
        let updated = self.repo.update_note(id, &patch, now_ms)?;
        info!(
            "event=note_reanalyze module=service status=ok note_id={} momentum={:.1}",
            updated.id, updated.momentum_score
        );
        Ok(updated)
    }

    /// Gets one active note.
    pub fn get_note(&self, id: NoteId) -> ServiceResult<Note> {
        self.repo.get_note(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Lists active notes ordered by `created_at DESC, id ASC`.
    pub fn list_notes(&self, query: &NoteListQuery) -> ServiceResult<Vec<Note>> {
        Ok(self.repo.list_notes(query)?)
    }

    /// Records that the user viewed or engaged with a note.
    pub fn mark_interacted(&mut self, id: NoteId) -> ServiceResult<Note> {
        let now_ms = self.clock.now_ms();
        self.apply(
            id,
            NotePatch {
                last_interacted_at: Some(now_ms),
                ..NotePatch::default()
            },
            "interacted",
        )
    }

    /// Records that a resurfaced note was shown to the user.
    pub fn mark_resurfaced(&mut self, id: NoteId) -> ServiceResult<Note> {
        let now_ms = self.clock.now_ms();
        self.apply(
            id,
            NotePatch {
                last_resurfaced_at: Some(now_ms),
                ..NotePatch::default()
            },
            "resurfaced",
        )
    }

    /// Flips the favorite flag.
    pub fn toggle_favorite(&mut self, id: NoteId) -> ServiceResult<Note> {
        self.apply(
            id,
            NotePatch {
                favorite: Some(FavoriteUpdate::Toggle),
                ..NotePatch::default()
            },
            "favorite",
        )
    }

    /// Tombstones one note.
    pub fn delete_note(&self, id: NoteId) -> ServiceResult<()> {
        self.repo.delete_note(id, self.clock.now_ms())?;
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    /// Plain-text export of one note.
    pub fn share_text(&self, id: NoteId) -> ServiceResult<String> {
        Ok(self.get_note(id)?.share_text())
    }

    /// Notes that should resurface now. Does not mark them.
    pub fn get_resurfaced(&self, limit: usize) -> ServiceResult<Vec<ResurfacedNote>> {
        let notes = self.snapshot()?;
        let now_ms = self.clock.now_ms();
        let selected =
            select_resurface_candidates(&notes, now_ms, limit, &self.config.resurfacing);
        info!(
            "event=resurface_run module=service status=ok scanned={} selected={} limit={}",
            notes.len(),
            selected.len(),
            limit
        );
        Ok(selected)
    }

    /// Ranked cross-note suggestions stamped with the current time.
    pub fn get_suggestions(&self, max_suggestions: usize) -> ServiceResult<Vec<Suggestion>> {
        let notes = self.snapshot()?;
        let now_ms = self.clock.now_ms();
        let mut suggestions =
            generate_suggestions(&notes, max_suggestions, &self.config.suggestions);
        for suggestion in &mut suggestions {
            suggestion.created_at = now_ms;
        }
        info!(
            "event=suggest_run module=service status=ok scanned={} generated={} max={}",
            notes.len(),
            suggestions.len(),
            max_suggestions
        );
        Ok(suggestions)
    }

    /// Analytics summary at the current time.
    pub fn get_analytics(&self) -> ServiceResult<AnalyticsData> {
        let notes = self.snapshot()?;
        let analytics = aggregate(&notes, self.clock.now_ms(), &self.config.analytics);
        info!(
            "event=analytics_run module=service status=ok total_notes={} streak_days={}",
            analytics.total_notes, analytics.streak_days
        );
        Ok(analytics)
    }

    fn snapshot(&self) -> ServiceResult<Vec<Note>> {
        Ok(self.repo.list_notes(&NoteListQuery::default())?)
    }

    fn apply(&mut self, id: NoteId, patch: NotePatch, change: &str) -> ServiceResult<Note> {
        let now_ms = self.clock.now_ms();
        match self.repo.update_note(id, &patch, now_ms) {
            Ok(note) => {
                info!(
                    "event=note_update module=service status=ok note_id={id} change={change}"
                );
                Ok(note)
            }
            Err(err) => {
                warn!(
                    "event=note_update module=service status=error note_id={id} change={change} error={err}"
                );
                Err(err.into())
            }
        }
    }

    fn analyze_or_fallback(&self, text: &str, note_id: Option<NoteId>) -> AiAnalysis {
        match self.classifier.analyze(text) {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(
                    "event=note_analyze module=service status=fallback note_id={} error_code={}",
                    note_id.map_or_else(|| "new".to_string(), |id| id.to_string()),
                    err.code()
                );
                fallback_analysis(text, &err)
            }
        }
    }

    fn score_against(
        &self,
        text: &str,
        analysis: &AiAnalysis,
        history: &[Note],
        now_ms: i64,
        exclude: Option<NoteId>,
    ) -> MomentumResult {
        let context = NoveltyContext {
            notes: history,
            now_ms,
            window_ms: self.config.scoring.novelty_window_ms(),
            exclude,
        };
        score(text, analysis, Some(&context))
    }
}
