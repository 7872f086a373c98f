//! Momentum scoring.
//!
//! # Responsibility
//! - Derive importance, actionability and novelty sub-scores from note text,
//!   classifier output and optional recent-note history.
//! - Combine them into the composite momentum score with a rationale and a
//!   recommended action.
//!
//! # Invariants
//! - Scoring never fails; degenerate text yields the neutral baseline.
//! - Sub-scores are in `[0, 5]`, momentum in `[0, 10]`, one decimal each.
//! - Without history, novelty is the neutral midpoint.
//! - Dominant sub-score ties resolve importance > actionability > novelty.

use crate::analysis::text::{normalize_keyword, sentences, tokenize, truncate_chars};
use crate::model::insight::{
    momentum_from_components, normalize_sub_score, AiAnalysis, MomentumResult, NEUTRAL_SUB_SCORE,
};
use crate::model::note::{Note, NoteId};
use std::collections::BTreeSet;

const IMPORTANCE_BASE: f64 = 1.0;
const IMPORTANCE_SIGNAL_WEIGHT: f64 = 0.8;
const IMPORTANCE_SIGNAL_CAP: f64 = 2.4;
const KEYWORD_DENSITY_WEIGHT: f64 = 6.0;
const KEYWORD_DENSITY_CAP: f64 = 1.6;

const ACTIONABILITY_BASE: f64 = 1.0;
const IMPERATIVE_WEIGHT: f64 = 1.25;
const NEXT_STEP_WEIGHT: f64 = 0.75;
const ACTION_SIGNAL_CAP: usize = 2;

const NOVELTY_CATEGORY_SHARE: f64 = 0.4;
const NOVELTY_KEYWORD_SHARE: f64 = 0.6;

const ACTION_SENTENCE_MAX_CHARS: usize = 80;

/// Goal, deadline and decision vocabulary.
const IMPORTANCE_TERMS: &[&str] = &[
    "asap", "critical", "deadline", "decide", "decided", "decision", "due", "essential", "goal",
    "goals", "important", "launch", "milestone", "must", "objective", "priority", "revenue",
    "strategy", "tomorrow", "urgent", "vital",
];

/// Verbs that make a sentence an instruction when they lead it.
const IMPERATIVE_VERBS: &[&str] = &[
    "add", "ask", "book", "build", "buy", "call", "check", "contact", "create", "draft", "email",
    "finish", "fix", "follow", "launch", "learn", "make", "organize", "plan", "prepare", "read",
    "research", "review", "schedule", "send", "set", "ship", "start", "test", "try", "update",
    "write",
];

const NEXT_STEP_PHRASES: &[&str] = &[
    "action item",
    "don't forget",
    "going to",
    "have to",
    "need to",
    "next step",
    "remember to",
    "should",
    "to-do",
    "todo",
];

/// Recent-note history used to judge novelty.
#[derive(Debug, Clone, Copy)]
pub struct NoveltyContext<'a> {
    /// Candidate history; filtered to the window below.
    pub notes: &'a [Note],
    pub now_ms: i64,
    /// Notes created within `[now - window, now]` count as recent.
    pub window_ms: i64,
    /// Note being rescored, excluded from its own history.
    pub exclude: Option<NoteId>,
}

/// Sub-score that drives a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDriver {
    Importance,
    Actionability,
    Novelty,
}

impl ScoreDriver {
    /// Decision table over sub-scores with fixed tie priority.
    pub fn dominant(importance: f64, actionability: f64, novelty: f64) -> Self {
        if importance >= actionability && importance >= novelty {
            Self::Importance
        } else if actionability >= novelty {
            Self::Actionability
        } else {
            Self::Novelty
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Importance => "Importance",
            Self::Actionability => "Actionability",
            Self::Novelty => "Novelty",
        }
    }
}

struct TextSignals {
    importance_terms: Vec<&'static str>,
    keyword_density: f64,
    imperative_sentences: Vec<String>,
    next_step_phrases: Vec<&'static str>,
}

/// Scores one note. Never fails.
pub fn score(
    text: &str,
    analysis: &AiAnalysis,
    context: Option<&NoveltyContext<'_>>,
) -> MomentumResult {
    let words = tokenize(text);
    if words.is_empty() {
        return neutral_baseline();
    }

    let signals = collect_signals(text, &words, analysis);
    let importance = normalize_sub_score(importance_score(&signals));
    let actionability = normalize_sub_score(actionability_score(&signals));
    let history = context.and_then(|context| novelty_score(analysis, context));
    let has_history = history.is_some();
    let (novelty, unseen_keywords) = history.unwrap_or((NEUTRAL_SUB_SCORE, Vec::new()));
    let novelty = normalize_sub_score(novelty);

    let driver = ScoreDriver::dominant(importance, actionability, novelty);
    MomentumResult {
        momentum_score: momentum_from_components(importance, actionability, novelty),
        score_reason: score_reason(
            driver,
            &signals,
            has_history,
            importance,
            actionability,
            novelty,
        ),
        importance,
        actionability,
        novelty,
        recommended_action: recommended_action(driver, &signals, analysis, &unseen_keywords),
    }
}

/// Result used when text carries no scorable signal.
pub fn neutral_baseline() -> MomentumResult {
    MomentumResult {
        momentum_score: momentum_from_components(
            NEUTRAL_SUB_SCORE,
            NEUTRAL_SUB_SCORE,
            NEUTRAL_SUB_SCORE,
        ),
        score_reason: "Not enough text to score; using the neutral baseline.".to_string(),
        importance: NEUTRAL_SUB_SCORE,
        actionability: NEUTRAL_SUB_SCORE,
        novelty: NEUTRAL_SUB_SCORE,
        recommended_action: "Review this note and add detail.".to_string(),
    }
}

fn collect_signals(text: &str, words: &[String], analysis: &AiAnalysis) -> TextSignals {
    let importance_terms = IMPORTANCE_TERMS
        .iter()
        .copied()
        .filter(|term| words.iter().any(|word| word.as_str() == *term))
        .collect::<Vec<_>>();

    let keyword_tokens = analysis
        .keywords
        .iter()
        .flat_map(|keyword| tokenize(keyword))
        .collect::<BTreeSet<_>>();
    let keyword_hits = words
        .iter()
        .filter(|word| keyword_tokens.contains(word.as_str()))
        .count();
    let keyword_density = keyword_hits as f64 / words.len() as f64;

    let imperative_sentences = sentences(text)
        .into_iter()
        .filter(|sentence| {
            tokenize(sentence)
                .first()
                .is_some_and(|first| IMPERATIVE_VERBS.binary_search(&first.as_str()).is_ok())
        })
        .collect::<Vec<_>>();

    let lowered = text.to_lowercase().replace('’', "'");
    let next_step_phrases = NEXT_STEP_PHRASES
        .iter()
        .copied()
        .filter(|phrase| lowered.contains(phrase))
        .collect::<Vec<_>>();

    TextSignals {
        importance_terms,
        keyword_density,
        imperative_sentences,
        next_step_phrases,
    }
}

fn importance_score(signals: &TextSignals) -> f64 {
    let language = (signals.importance_terms.len() as f64 * IMPORTANCE_SIGNAL_WEIGHT)
        .min(IMPORTANCE_SIGNAL_CAP);
    let density = (signals.keyword_density * KEYWORD_DENSITY_WEIGHT).min(KEYWORD_DENSITY_CAP);
    IMPORTANCE_BASE + language + density
}

fn actionability_score(signals: &TextSignals) -> f64 {
    let imperatives = signals.imperative_sentences.len().min(ACTION_SIGNAL_CAP);
    let next_steps = signals.next_step_phrases.len().min(ACTION_SIGNAL_CAP);
    if imperatives == 0 && next_steps == 0 {
        return 0.0;
    }
    ACTIONABILITY_BASE
        + IMPERATIVE_WEIGHT * imperatives as f64
        + NEXT_STEP_WEIGHT * next_steps as f64
}

/// Returns the raw novelty score and the keywords absent from history.
///
/// `None` when the window holds no other note.
fn novelty_score(
    analysis: &AiAnalysis,
    context: &NoveltyContext<'_>,
) -> Option<(f64, Vec<String>)> {
    let window_start = context.now_ms.saturating_sub(context.window_ms);
    let recent = context
        .notes
        .iter()
        .filter(|note| Some(note.id) != context.exclude)
        .filter(|note| note.created_at >= window_start && note.created_at <= context.now_ms)
        .collect::<Vec<_>>();
    if recent.is_empty() {
        return None;
    }

    let category = analysis.category.trim().to_lowercase();
    let category_unseen = !recent
        .iter()
        .any(|note| note.category.trim().to_lowercase() == category);
    let category_part = if category_unseen { 1.0 } else { 0.0 };

    let seen_keywords = recent
        .iter()
        .flat_map(|note| note.keywords.iter())
        .filter_map(|keyword| normalize_keyword(keyword))
        .collect::<BTreeSet<_>>();

    let mut own_keywords = Vec::new();
    for keyword in analysis.keywords.iter().filter_map(|keyword| normalize_keyword(keyword)) {
        if !own_keywords.contains(&keyword) {
            own_keywords.push(keyword);
        }
    }
    let unseen = own_keywords
        .into_iter()
        .filter(|keyword| !seen_keywords.contains(keyword))
        .collect::<Vec<_>>();

    let distinct_total = analysis
        .keywords
        .iter()
        .filter_map(|keyword| normalize_keyword(keyword))
        .collect::<BTreeSet<_>>()
        .len();
    let keyword_part = if distinct_total == 0 {
        category_part
    } else {
        unseen.len() as f64 / distinct_total as f64
    };

    let raw =
        5.0 * (NOVELTY_CATEGORY_SHARE * category_part + NOVELTY_KEYWORD_SHARE * keyword_part);
    Some((raw, unseen))
}

fn score_reason(
    driver: ScoreDriver,
    signals: &TextSignals,
    has_history: bool,
    importance: f64,
    actionability: f64,
    novelty: f64,
) -> String {
    let detail = match driver {
        ScoreDriver::Importance if !signals.importance_terms.is_empty() => format!(
            "uses goal, deadline or decision language ({})",
            signals.importance_terms.join(", ")
        ),
        ScoreDriver::Importance => "stays focused on its own key topics".to_string(),
        ScoreDriver::Actionability if !signals.imperative_sentences.is_empty() => format!(
            "contains {} direct instruction(s)",
            signals.imperative_sentences.len()
        ),
        ScoreDriver::Actionability => "states explicit next steps".to_string(),
        ScoreDriver::Novelty if has_history => {
            "introduces topics not seen in recent notes".to_string()
        }
        ScoreDriver::Novelty => "has no recent history to compare against".to_string(),
    };

    format!(
        "{}-led: the note {detail} (importance {importance:.1}/5, \
         actionability {actionability:.1}/5, novelty {novelty:.1}/5).",
        driver.label()
    )
}

fn recommended_action(
    driver: ScoreDriver,
    signals: &TextSignals,
    analysis: &AiAnalysis,
    unseen_keywords: &[String],
) -> String {
    match driver {
        ScoreDriver::Actionability => match signals.imperative_sentences.first() {
            Some(sentence) => format!(
                "Next step: {}",
                truncate_chars(sentence, ACTION_SENTENCE_MAX_CHARS)
            ),
            None => "Next step: pick one concrete task from this note and schedule it.".to_string(),
        },
        ScoreDriver::Importance => format!(
            "Prioritize: review this {} note and set a date to act on it.",
            analysis.category.trim()
        ),
        ScoreDriver::Novelty => {
            let topic = unseen_keywords
                .first()
                .or_else(|| analysis.keywords.first())
                .map(|keyword| keyword.trim().to_string())
                .filter(|keyword| !keyword.is_empty());
            match topic {
                Some(topic) => {
                    format!("Explore: research {topic} further and capture what you find.")
                }
                None => "Explore: research this new direction further.".to_string(),
            }
        }
    }
}
