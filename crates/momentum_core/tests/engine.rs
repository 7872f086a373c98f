use momentum_core::clock::{MS_PER_DAY, MS_PER_HOUR};
use momentum_core::config::ClassifierConfig;
use momentum_core::db::open_db_in_memory;
use momentum_core::{
    AiAnalysis, AnalysisError, Classifier, EngineConfig, FixedClock, HeuristicClassifier,
    NoteListQuery, NoteService, ServiceError, SqliteNoteRepository, Suggestion, SuggestionKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// 2024-01-10T12:00:00Z.
const NOW: i64 = 1_704_888_000_000;

struct StubClassifier {
    analysis: Mutex<AiAnalysis>,
    calls: AtomicUsize,
}

impl StubClassifier {
    fn new(category: &str, keywords: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            analysis: Mutex::new(analysis(category, keywords)),
            calls: AtomicUsize::new(0),
        })
    }

    fn replace(&self, next: AiAnalysis) {
        *self.analysis.lock().unwrap() = next;
    }
}

impl Classifier for StubClassifier {
    fn analyze(&self, _text: &str) -> Result<AiAnalysis, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.analysis.lock().unwrap().clone())
    }
}

struct DownClassifier;

impl Classifier for DownClassifier {
    fn analyze(&self, _text: &str) -> Result<AiAnalysis, AnalysisError> {
        Err(AnalysisError::Unavailable("connection refused".to_string()))
    }
}

struct SlowClassifier;

impl Classifier for SlowClassifier {
    fn analyze(&self, _text: &str) -> Result<AiAnalysis, AnalysisError> {
        thread::sleep(Duration::from_millis(300));
        Ok(analysis("Business", &["late"]))
    }
}

fn analysis(category: &str, keywords: &[&str]) -> AiAnalysis {
    AiAnalysis {
        category: category.to_string(),
        summary: format!("{category} summary"),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        reason: "stub".to_string(),
    }
}

fn has_kind(suggestions: &[Suggestion], kind: SuggestionKind) -> bool {
    suggestions.iter().any(|suggestion| suggestion.kind == kind)
}

const LAUNCH_TEXT: &str =
    "Call the investor about the launch deadline. Email the team the revenue plan.";

#[test]
fn blank_text_is_rejected_before_classification() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Business", &[]);
    let clock = FixedClock::new(NOW);
    let service = NoteService::new(repo, classifier.clone(), &clock, EngineConfig::default());

    let err = service.create_analyzed_note(" \n\t ").unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    assert!(service.list_notes(&NoteListQuery::default()).unwrap().is_empty());
}

#[test]
fn created_note_carries_classifier_and_scorer_output() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Business", &["launch", "revenue", "investor"]);
    let clock = FixedClock::new(NOW);
    let service = NoteService::new(repo, classifier, &clock, EngineConfig::default());

    let note = service.create_analyzed_note(LAUNCH_TEXT).unwrap();

    assert_eq!(note.text, LAUNCH_TEXT);
    assert_eq!(note.category, "Business");
    assert_eq!(note.keywords, vec!["launch", "revenue", "investor"]);
    assert_eq!(note.created_at, NOW);
    assert_eq!(note.last_interacted_at, NOW);
    assert_eq!(note.novelty, 2.5);
    assert_eq!(note.importance, 4.8);
    assert_eq!(note.actionability, 3.5);
    assert_eq!(note.momentum_score, 7.2);
    assert_eq!(
        note.recommended_action,
        "Prioritize: review this Business note and set a date to act on it."
    );
    assert_eq!(service.get_note(note.id).unwrap(), note);
}

#[test]
fn classifier_outage_falls_back_to_general() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let clock = FixedClock::new(NOW);
    let service = NoteService::new(repo, Arc::new(DownClassifier), &clock, EngineConfig::default());

    let note = service
        .create_analyzed_note("  **Sketch** the onboarding flow for onboarding week  ")
        .unwrap();

    assert_eq!(note.category, "General");
    assert_eq!(note.summary, "Sketch the onboarding flow for onboarding week");
    assert_eq!(note.keywords[0], "onboarding");
    assert!(note.reason.contains("analysis_unavailable"));
}

#[test]
fn symbol_only_text_keeps_a_summary_on_fallback() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let clock = FixedClock::new(NOW);
    let service = NoteService::new(
        repo,
        Arc::new(HeuristicClassifier),
        &clock,
        EngineConfig::default(),
    );

    let note = service.create_analyzed_note(" !!! *** ").unwrap();
    assert_eq!(note.category, "General");
    assert_eq!(note.summary, "!!! ***");
    assert!(note.keywords.is_empty());
    assert_eq!(note.momentum_score, 5.0);
    assert_eq!(service.get_note(note.id).unwrap().summary, "!!! ***");
}

#[test]
fn second_note_in_window_is_scored_against_the_first() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Business", &["launch", "revenue"]);
    let clock = FixedClock::new(NOW);
    let service = NoteService::new(repo, classifier.clone(), &clock, EngineConfig::default());

    let first = service.create_analyzed_note("Launch revenue review").unwrap();
    assert_eq!(first.novelty, 2.5);

    clock.advance(MS_PER_HOUR);
    let repeat = service.create_analyzed_note("Launch revenue recap").unwrap();
    assert_eq!(repeat.novelty, 0.0);

    classifier.replace(analysis("Health", &["sleep"]));
    let fresh = service.create_analyzed_note("Sleep earlier this week").unwrap();
    assert_eq!(fresh.novelty, 5.0);
}

#[test]
fn classifier_timeout_falls_back_without_blocking() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let clock = FixedClock::new(NOW);
    let config = EngineConfig {
        classifier: ClassifierConfig {
            timeout_ms: 20,
            max_retries: 0,
        },
        ..EngineConfig::default()
    };
    let service = NoteService::new(repo, Arc::new(SlowClassifier), &clock, config);

    let note = service.create_analyzed_note("Draft pricing page copy").unwrap();
    assert_eq!(note.category, "General");
    assert!(note.reason.contains("analysis_timeout"));
}

#[test]
fn resurfacing_follows_dormancy_and_interaction() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Business", &["launch", "revenue", "investor"]);
    let clock = FixedClock::new(NOW);
    let mut service = NoteService::new(repo, classifier, &clock, EngineConfig::default());

    let note = service.create_analyzed_note(LAUNCH_TEXT).unwrap();
    assert!(note.momentum_score >= 5.0);

    clock.advance(23 * MS_PER_HOUR);
    assert!(service.get_resurfaced(5).unwrap().is_empty());

    clock.advance(2 * MS_PER_HOUR);
    let first = service.get_resurfaced(5).unwrap();
    let second = service.get_resurfaced(5).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].note.id, note.id);
    assert_eq!(first[0].recommended_action, note.recommended_action);
    assert!(first[0].resurface_reason.contains("untouched for 1 day"));

    let seen = service.mark_resurfaced(note.id).unwrap();
    assert_eq!(seen.last_resurfaced_at, Some(NOW + 25 * MS_PER_HOUR));
    assert_eq!(service.get_resurfaced(5).unwrap().len(), 1);

    service.mark_interacted(note.id).unwrap();
    assert!(service.get_resurfaced(5).unwrap().is_empty());
}

#[test]
fn suggestions_connect_related_notes_and_track_resurfacing() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Business", &["venue", "launch"]);
    let clock = FixedClock::new(NOW);
    let mut service = NoteService::new(repo, classifier, &clock, EngineConfig::default());

    assert!(service.get_suggestions(5).unwrap().is_empty());

    let first = service
        .create_analyzed_note("Call Sam. Book the venue. I need to decide on the launch.")
        .unwrap();
    clock.advance(MS_PER_DAY);
    let second = service.create_analyzed_note("Venue shortlist for the launch party").unwrap();

    let suggestions = service.get_suggestions(10).unwrap();
    let connection = suggestions
        .iter()
        .find(|suggestion| suggestion.kind == SuggestionKind::Connection)
        .expect("connection suggestion");
    assert!(connection.related_note_ids.contains(&first.id));
    assert!(connection.related_note_ids.contains(&second.id));
    assert!(suggestions.iter().all(|suggestion| suggestion.created_at == NOW + MS_PER_DAY));

    assert!(first.actionability >= 4.0);
    assert!(has_kind(&suggestions, SuggestionKind::Action));
    service.mark_resurfaced(first.id).unwrap();
    let after = service.get_suggestions(10).unwrap();
    assert!(!has_kind(&after, SuggestionKind::Action));
}

#[test]
fn analytics_reflect_the_store() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Learning", &["rust"]);
    let clock = FixedClock::new(NOW - MS_PER_DAY);
    let service = NoteService::new(repo, classifier, &clock, EngineConfig::default());

    let empty = service.get_analytics().unwrap();
    assert_eq!(empty.total_notes, 0);
    assert_eq!(empty.avg_momentum, 0.0);

    service.create_analyzed_note("Read the ownership chapter").unwrap();
    clock.set(NOW);
    service.create_analyzed_note("Write a borrow checker quiz").unwrap();

    let analytics = service.get_analytics().unwrap();
    assert_eq!(analytics.total_notes, 2);
    assert_eq!(analytics.today_notes, 1);
    assert_eq!(analytics.week_notes, 2);
    assert_eq!(analytics.streak_days, 2);
    assert_eq!(analytics.top_categories.len(), 1);
    assert_eq!(analytics.top_categories[0].name, "Learning");
    assert_eq!(analytics.top_categories[0].count, 2);
}

#[test]
fn favorite_share_reanalyze_and_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let classifier = StubClassifier::new("Health", &["sleep"]);
    let clock = FixedClock::new(NOW);
    let mut service =
        NoteService::new(repo, classifier.clone(), &clock, EngineConfig::default());

    let note = service.create_analyzed_note("Sleep before midnight").unwrap();
    assert!(service.toggle_favorite(note.id).unwrap().is_favorite);

    let shared = service.share_text(note.id).unwrap();
    assert_eq!(
        shared,
        format!(
            "Health summary\n\nCategory: Health\nMomentum: {:.1}/10\n\nSleep before midnight",
            note.momentum_score
        )
    );

    classifier.replace(analysis("Personal Growth", &["habit"]));
    clock.advance(MS_PER_HOUR);
    let reanalyzed = service.reanalyze_note(note.id).unwrap();
    assert_eq!(reanalyzed.category, "Personal Growth");
    assert_eq!(reanalyzed.keywords, vec!["habit"]);
    assert!(reanalyzed.is_favorite);
    assert_eq!(reanalyzed.updated_at, NOW + MS_PER_HOUR);

    service.delete_note(note.id).unwrap();
    assert!(matches!(
        service.get_note(note.id),
        Err(ServiceError::NotFound(id)) if id == note.id
    ));
    assert!(matches!(
        service.toggle_favorite(note.id),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn heuristic_engine_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("momentum.db");
    let clock = FixedClock::new(NOW);

    let created = {
        let mut conn = momentum_core::open_db(&path).unwrap();
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let service = NoteService::new(
            repo,
            Arc::new(HeuristicClassifier),
            &clock,
            EngineConfig::default(),
        );
        service
            .create_analyzed_note("Fix the database migration bug before the deploy")
            .unwrap()
    };
    assert_eq!(created.category, "Technical");

    let mut conn = momentum_core::open_db(&path).unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let service = NoteService::new(
        repo,
        Arc::new(HeuristicClassifier),
        &clock,
        EngineConfig::default(),
    );
    let notes = service.list_notes(&NoteListQuery::default()).unwrap();
    assert_eq!(notes, vec![created]);
}
