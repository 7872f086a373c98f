//! Classifier adapter boundary.
//!
//! # Responsibility
//! - Define the single-method contract for the external text-understanding
//!   capability (`Classifier::analyze`).
//! - Apply per-attempt timeout, bounded retry and output sanitation.
//! - Provide the local fallback analysis used when the capability fails.
//!
//! # Invariants
//! - A timed-out or failed call is reported as `AnalysisError`, never a panic.
//! - Sanitized output always has a non-empty category and summary.

use crate::analysis::text::{
    derive_summary, extract_keywords, sentences, tokenize, truncate_chars, SUMMARY_MAX_CHARS,
};
use crate::config::ClassifierConfig;
use crate::model::insight::{AiAnalysis, DEFAULT_CATEGORY};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const FALLBACK_KEYWORDS: usize = 5;

/// Failure of the classifier capability.
///
/// Every variant means "analysis unavailable" to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Capability could not be reached or refused the request.
    Unavailable(String),
    /// Capability did not answer within the configured deadline.
    Timeout { timeout_ms: u64 },
    /// Capability answered with output that violates the contract.
    Malformed(String),
}

impl AnalysisError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "analysis_unavailable",
            Self::Timeout { .. } => "analysis_timeout",
            Self::Malformed(_) => "analysis_malformed",
        }
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "analysis unavailable: {message}"),
            Self::Timeout { timeout_ms } => {
                write!(f, "analysis unavailable: timed out after {timeout_ms}ms")
            }
            Self::Malformed(message) => {
                write!(f, "analysis unavailable: malformed output: {message}")
            }
        }
    }
}

impl Error for AnalysisError {}

/// External text-understanding capability.
///
/// `text` is non-empty trimmed content; validation is the caller's job.
///
/// The gateway stops waiting after its timeout but cannot cancel the call.
/// Implementations must enforce their own deadline (for example a client
/// request timeout), otherwise a hung backend keeps one worker thread alive
/// per attempt.
pub trait Classifier: Send + Sync {
    fn analyze(&self, text: &str) -> Result<AiAnalysis, AnalysisError>;
}

/// Call policy wrapper around a shared classifier.
pub struct ClassifierGateway {
    classifier: Arc<dyn Classifier>,
    config: ClassifierConfig,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight count when a worker finishes or unwinds.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ClassifierGateway {
    pub fn new(classifier: Arc<dyn Classifier>, config: ClassifierConfig) -> Self {
        Self {
            classifier,
            config,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Worker threads still running, including ones abandoned after a timeout.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs the classifier with timeout and bounded retry.
    ///
    /// Returns the last attempt's error when every attempt fails.
    pub fn analyze(&self, text: &str) -> Result<AiAnalysis, AnalysisError> {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.analyze_once(text) {
                Ok(analysis) => return Ok(analysis),
                Err(err) => {
                    warn!(
                        "event=classifier_call module=analysis status=error attempt={} max_attempts={} error_code={}",
                        attempt,
                        max_attempts,
                        err.code()
                    );
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                }
            }
        }
    }

    fn analyze_once(&self, text: &str) -> Result<AiAnalysis, AnalysisError> {
        let classifier = Arc::clone(&self.classifier);
        let input = text.to_string();
        let (sender, receiver) = mpsc::channel();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        thread::Builder::new()
            .name("momentum-classifier".to_string())
            .spawn(move || {
                let _guard = guard;
                // Receiver may be gone after a timeout; the late result is dropped.
                let _ = sender.send(classifier.analyze(&input));
            })
            .map_err(|err| {
                AnalysisError::Unavailable(format!("cannot start classifier worker: {err}"))
            })?;

        let raw = match receiver.recv_timeout(self.config.timeout()) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "event=classifier_timeout module=analysis status=abandoned timeout_ms={} in_flight={}",
                    self.config.timeout_ms,
                    self.in_flight()
                );
                return Err(AnalysisError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(AnalysisError::Unavailable(
                    "classifier worker exited without a result".to_string(),
                ));
            }
        };

        sanitize_analysis(raw)
    }
}

/// Trims classifier output and rejects contract violations.
///
/// Keyword order and duplicates are preserved; blank keywords are dropped.
pub fn sanitize_analysis(raw: AiAnalysis) -> Result<AiAnalysis, AnalysisError> {
    let category = raw.category.trim().to_string();
    if category.is_empty() {
        return Err(AnalysisError::Malformed("empty category".to_string()));
    }
    let summary = raw.summary.trim().to_string();
    if summary.is_empty() {
        return Err(AnalysisError::Malformed("empty summary".to_string()));
    }

    Ok(AiAnalysis {
        category,
        summary,
        keywords: raw
            .keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect(),
        reason: raw.reason.trim().to_string(),
    })
}

/// Local analysis stored when the classifier is unavailable.
///
/// The summary is never empty for non-blank text: when markdown stripping
/// leaves nothing, the trimmed raw text is used.
pub fn fallback_analysis(text: &str, cause: &AnalysisError) -> AiAnalysis {
    let mut summary = derive_summary(text);
    if summary.is_empty() {
        summary = truncate_chars(text.trim(), SUMMARY_MAX_CHARS);
    }
    AiAnalysis {
        category: DEFAULT_CATEGORY.to_string(),
        summary,
        keywords: extract_keywords(text, FALLBACK_KEYWORDS),
        reason: format!(
            "Classifier unavailable ({}); filed under {DEFAULT_CATEGORY} with a summary taken from the note text.",
            cause.code()
        ),
    }
}

const CATEGORY_LEXICON: &[(&str, &[&str])] = &[
    (
        "Product Idea",
        &["app", "feature", "idea", "mvp", "prototype", "product", "roadmap", "users"],
    ),
    (
        "Business",
        &[
            "business", "client", "customer", "customers", "market", "marketing", "pricing",
            "profit", "revenue", "sales", "startup",
        ],
    ),
    (
        "Technical",
        &[
            "api", "bug", "code", "database", "deploy", "refactor", "rust", "server", "software",
            "test", "tests",
        ],
    ),
    (
        "Creative",
        &[
            "art", "design", "draw", "music", "novel", "paint", "poem", "song", "story", "write",
            "writing",
        ],
    ),
    (
        "Health",
        &[
            "diet", "doctor", "exercise", "gym", "health", "meditate", "run", "running", "sleep",
            "workout",
        ],
    ),
    (
        "Personal Growth",
        &[
            "confidence", "gratitude", "growth", "habit", "habits", "journal", "mindset", "reflect",
            "routine",
        ],
    ),
    (
        "Learning",
        &[
            "book", "course", "learn", "learning", "lecture", "read", "reading", "research",
            "study", "tutorial",
        ],
    ),
];

/// Deterministic lexicon-based classifier.
///
/// Stands in for the external model in local tools and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl Classifier for HeuristicClassifier {
    fn analyze(&self, text: &str) -> Result<AiAnalysis, AnalysisError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(AnalysisError::Malformed("no words to classify".to_string()));
        }

        let mut best: Option<(&str, Vec<&str>)> = None;
        for &(category, lexicon) in CATEGORY_LEXICON {
            let mut matched = lexicon
                .iter()
                .copied()
                .filter(|term| tokens.iter().any(|token| token.as_str() == *term))
                .collect::<Vec<_>>();
            matched.sort_unstable();
            let better = match best.as_ref() {
                Some((_, current)) => matched.len() > current.len(),
                None => !matched.is_empty(),
            };
            if better {
                best = Some((category, matched));
            }
        }

        let (category, reason) = match best {
            Some((category, matched)) => (
                category.to_string(),
                format!(
                    "Matched {} {category} signal(s): {}.",
                    matched.len(),
                    matched.join(", ")
                ),
            ),
            None => (
                DEFAULT_CATEGORY.to_string(),
                format!("No strong topical signal; filed under {DEFAULT_CATEGORY}."),
            ),
        };

        let summary = sentences(text)
            .into_iter()
            .next()
            .map(|first| derive_summary(&first))
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| truncate_chars(text.trim(), SUMMARY_MAX_CHARS));

        Ok(AiAnalysis {
            category,
            summary,
            keywords: extract_keywords(text, FALLBACK_KEYWORDS),
            reason,
        })
    }
}
