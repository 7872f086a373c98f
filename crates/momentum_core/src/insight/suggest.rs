//! Suggestion generator.
//!
//! # Responsibility
//! - Run independent detectors (connection, combine, expand, trend, action)
//!   over one note snapshot.
//! - Merge and rank their candidates into a capped suggestion list.
//!
//! # Invariants
//! - Identical input yields identical ordered output, regardless of the
//!   order notes are passed in.
//! - Suggestion ids derive from kind and related ids, so they are stable
//!   across runs.
//! - Time windows are measured from the newest note in the snapshot.

use crate::analysis::text::{normalize_keyword, truncate_chars};
use crate::clock::MS_PER_DAY;
use crate::config::SuggestionConfig;
use crate::model::note::{Note, NoteId};
use crate::model::suggestion::{Suggestion, SuggestionKind};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

const SUGGESTION_NAMESPACE: Uuid = Uuid::from_u128(0x6d6f_6d65_6e74_756d_2d73_7567_6765_7374);
const TITLE_SUMMARY_MAX_CHARS: usize = 60;
const EXPAND_MIN_IMPORTANCE: f64 = 4.0;
const EXPAND_MAX_ACTIONABILITY: f64 = 2.0;
const ACTION_MIN_ACTIONABILITY: f64 = 4.0;
const CONNECTION_MIN_SHARED_KEYWORDS: usize = 2;

struct Candidate {
    kind: SuggestionKind,
    title: String,
    description: String,
    related: Vec<NoteId>,
}

struct Ranked {
    suggestion: Suggestion,
    score: f64,
    latest_related_at: i64,
}

/// Generates up to `max_suggestions` ranked suggestions.
pub fn generate_suggestions(
    notes: &[Note],
    max_suggestions: usize,
    config: &SuggestionConfig,
) -> Vec<Suggestion> {
    if max_suggestions == 0 || notes.is_empty() {
        return Vec::new();
    }

    let snapshot = canonical_snapshot(notes);
    let reference_ms = snapshot
        .iter()
        .map(|note| note.created_at)
        .max()
        .unwrap_or_default();

    let mut candidates = Vec::new();
    candidates.extend(detect_connections(&snapshot, config));
    candidates.extend(detect_combines(&snapshot, config));
    candidates.extend(detect_expands(&snapshot));
    candidates.extend(detect_trends(&snapshot, reference_ms, config));
    candidates.extend(detect_actions(&snapshot));

    let by_id = snapshot
        .iter()
        .map(|note| (note.id, *note))
        .collect::<BTreeMap<_, _>>();
    let mut ranked = candidates
        .into_iter()
        .map(|candidate| rank(candidate, &by_id, reference_ms))
        .collect::<Vec<_>>();
    ranked.sort_by(compare_ranked);

    ranked
        .into_iter()
        .take(max_suggestions)
        .map(|ranked| ranked.suggestion)
        .collect()
}

/// Ranking multiplier applied to the average momentum of related notes.
pub fn kind_weight(kind: SuggestionKind) -> f64 {
    match kind {
        SuggestionKind::Action => 1.1,
        SuggestionKind::Connection => 1.0,
        SuggestionKind::Combine => 0.9,
        SuggestionKind::Trend => 0.85,
        SuggestionKind::Expand => 0.8,
    }
}

/// Stable id for a suggestion of `kind` over `related` notes.
pub fn suggestion_id(kind: SuggestionKind, related: &[NoteId]) -> Uuid {
    let mut name = String::from(kind.as_str());
    for id in related {
        name.push(':');
        name.push_str(&id.to_string());
    }
    Uuid::new_v5(&SUGGESTION_NAMESPACE, name.as_bytes())
}

/// Deduplicates by id and orders by `(created_at, id)`.
fn canonical_snapshot(notes: &[Note]) -> Vec<&Note> {
    let mut by_id = BTreeMap::new();
    for note in notes {
        by_id.entry(note.id).or_insert(note);
    }
    let mut snapshot = by_id.into_values().collect::<Vec<_>>();
    snapshot.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then(left.id.cmp(&right.id))
    });
    snapshot
}

fn detect_connections(snapshot: &[&Note], config: &SuggestionConfig) -> Vec<Candidate> {
    let window_ms = config.connection_window_ms();
    let mut candidates = Vec::new();
    for (index, older) in snapshot.iter().enumerate() {
        for newer in &snapshot[index + 1..] {
            if newer.created_at - older.created_at > window_ms {
                break;
            }
            if older.is_favorite && newer.is_favorite {
                continue;
            }

            let shared = shared_keywords(older, newer);
            let related = vec![older.id, newer.id];
            if shared.len() >= CONNECTION_MIN_SHARED_KEYWORDS {
                candidates.push(Candidate {
                    kind: SuggestionKind::Connection,
                    title: format!("Connect notes on {} and {}", shared[0], shared[1]),
                    description: format!(
                        "Both notes mention {}. Link them to build on the shared idea.",
                        shared.join(", ")
                    ),
                    related,
                });
            } else if same_category(older, newer) {
                candidates.push(Candidate {
                    kind: SuggestionKind::Connection,
                    title: format!("Connect two {} notes", newer.category.trim()),
                    description: format!(
                        "These notes share the {} category and were written {} apart.",
                        newer.category.trim(),
                        describe_days(newer.created_at - older.created_at)
                    ),
                    related,
                });
            }
        }
    }
    candidates
}

fn detect_combines(snapshot: &[&Note], config: &SuggestionConfig) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for group in category_groups(snapshot).into_values() {
        if group.len() < config.combine_min_notes {
            continue;
        }
        let total_momentum = group.iter().map(|note| note.momentum_score).sum::<f64>();
        if total_momentum <= config.combine_momentum_threshold {
            continue;
        }

        let mut strongest = group.clone();
        strongest.sort_by(|left, right| {
            right
                .momentum_score
                .total_cmp(&left.momentum_score)
                .then(right.created_at.cmp(&left.created_at))
                .then(left.id.cmp(&right.id))
        });
        strongest.truncate(config.max_related);

        let category = display_category(&group);
        candidates.push(Candidate {
            kind: SuggestionKind::Combine,
            title: format!("Combine your {} {category} notes", group.len()),
            description: format!(
                "{} notes in {category} carry {total_momentum:.1} combined momentum. Consolidate them into one plan.",
                group.len()
            ),
            related: strongest.iter().map(|note| note.id).collect(),
        });
    }
    candidates
}

fn detect_expands(snapshot: &[&Note]) -> Vec<Candidate> {
    snapshot
        .iter()
        .filter(|note| {
            note.importance >= EXPAND_MIN_IMPORTANCE
                && note.actionability <= EXPAND_MAX_ACTIONABILITY
        })
        .map(|note| Candidate {
            kind: SuggestionKind::Expand,
            title: format!("Expand: {}", title_fragment(note)),
            description: format!(
                "Importance is high ({:.1}/5) but actionability is low ({:.1}/5). Break it into concrete steps.",
                note.importance, note.actionability
            ),
            related: vec![note.id],
        })
        .collect()
}

fn detect_trends(
    snapshot: &[&Note],
    reference_ms: i64,
    config: &SuggestionConfig,
) -> Vec<Candidate> {
    let window_ms = config.trend_window_ms();
    let recent_start = reference_ms - window_ms;
    let prior_start = recent_start - window_ms;

    let mut candidates = Vec::new();
    for group in category_groups(snapshot).into_values() {
        let mut recent = group
            .iter()
            .copied()
            .filter(|note| note.created_at > recent_start && note.created_at <= reference_ms)
            .collect::<Vec<_>>();
        let prior_count = group
            .iter()
            .filter(|note| note.created_at > prior_start && note.created_at <= recent_start)
            .count();

        if recent.len() < config.trend_min_notes
            || recent.len() as f64 <= prior_count as f64 * config.trend_ratio
        {
            continue;
        }

        recent.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then(left.id.cmp(&right.id))
        });
        let recent_count = recent.len();
        recent.truncate(config.max_related);

        let category = display_category(&group);
        candidates.push(Candidate {
            kind: SuggestionKind::Trend,
            title: format!("{category} is trending"),
            description: format!(
                "{recent_count} {category} notes in the last {days} days versus {prior_count} in the {days} days before.",
                days = config.trend_window_days
            ),
            related: recent.iter().map(|note| note.id).collect(),
        });
    }
    candidates
}

fn detect_actions(snapshot: &[&Note]) -> Vec<Candidate> {
    snapshot
        .iter()
        .filter(|note| {
            note.actionability >= ACTION_MIN_ACTIONABILITY && note.last_resurfaced_at.is_none()
        })
        .map(|note| Candidate {
            kind: SuggestionKind::Action,
            title: format!("Act on: {}", title_fragment(note)),
            description: note.recommended_action.clone(),
            related: vec![note.id],
        })
        .collect()
}

fn rank(candidate: Candidate, by_id: &BTreeMap<NoteId, &Note>, reference_ms: i64) -> Ranked {
    let related_notes = candidate
        .related
        .iter()
        .filter_map(|id| by_id.get(id))
        .collect::<Vec<_>>();
    let average_momentum = if related_notes.is_empty() {
        0.0
    } else {
        related_notes
            .iter()
            .map(|note| note.momentum_score)
            .sum::<f64>()
            / related_notes.len() as f64
    };
    let latest_related_at = related_notes
        .iter()
        .map(|note| note.created_at)
        .max()
        .unwrap_or(i64::MIN);

    Ranked {
        score: kind_weight(candidate.kind) * average_momentum,
        latest_related_at,
        suggestion: Suggestion {
            id: suggestion_id(candidate.kind, &candidate.related),
            kind: candidate.kind,
            title: candidate.title,
            description: candidate.description,
            related_note_ids: candidate.related,
            created_at: reference_ms,
        },
    }
}

fn compare_ranked(left: &Ranked, right: &Ranked) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then(right.latest_related_at.cmp(&left.latest_related_at))
        .then(left.suggestion.kind.cmp(&right.suggestion.kind))
        .then(
            left.suggestion
                .related_note_ids
                .cmp(&right.suggestion.related_note_ids),
        )
        .then(left.suggestion.title.cmp(&right.suggestion.title))
}

/// Shared normalized keywords, in the first note's keyword order.
fn shared_keywords(first: &Note, second: &Note) -> Vec<String> {
    let other = second
        .keywords
        .iter()
        .filter_map(|keyword| normalize_keyword(keyword))
        .collect::<BTreeSet<_>>();
    let mut shared = Vec::new();
    for keyword in first.keywords.iter().filter_map(|keyword| normalize_keyword(keyword)) {
        if other.contains(&keyword) && !shared.contains(&keyword) {
            shared.push(keyword);
        }
    }
    shared
}

fn same_category(first: &Note, second: &Note) -> bool {
    let left = first.category.trim();
    !left.is_empty() && left.eq_ignore_ascii_case(second.category.trim())
}

/// Groups notes by case-insensitive category. Each group keeps snapshot order.
fn category_groups<'a>(snapshot: &[&'a Note]) -> BTreeMap<String, Vec<&'a Note>> {
    let mut groups: BTreeMap<String, Vec<&Note>> = BTreeMap::new();
    for note in snapshot {
        let key = note.category.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().push(*note);
    }
    groups
}

/// Category spelling from the newest note in the group.
fn display_category(group: &[&Note]) -> String {
    group
        .last()
        .map(|note| note.category.trim().to_string())
        .unwrap_or_default()
}

fn title_fragment(note: &Note) -> String {
    let source = if note.summary.trim().is_empty() {
        note.text.trim()
    } else {
        note.summary.trim()
    };
    truncate_chars(source, TITLE_SUMMARY_MAX_CHARS)
}

fn describe_days(delta_ms: i64) -> String {
    match delta_ms / MS_PER_DAY {
        0 => "less than a day".to_string(),
        1 => "1 day".to_string(),
        days => format!("{days} days"),
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_suggestions, suggestion_id};
    use crate::clock::MS_PER_DAY;
    use crate::config::SuggestionConfig;
    use crate::model::insight::{AiAnalysis, MomentumResult};
    use crate::model::note::Note;
    use crate::model::suggestion::SuggestionKind;

    const NOW: i64 = 500 * MS_PER_DAY;

    struct Seed<'a> {
        category: &'a str,
        keywords: &'a [&'a str],
        scores: (f64, f64, f64),
        created_at: i64,
    }

    fn note(seed: Seed<'_>) -> Note {
        let analysis = AiAnalysis {
            category: seed.category.to_string(),
            summary: format!("{} note", seed.category),
            keywords: seed.keywords.iter().map(|k| k.to_string()).collect(),
            reason: "reason".to_string(),
        };
        let (importance, actionability, novelty) = seed.scores;
        let momentum = MomentumResult {
            momentum_score: 0.0,
            score_reason: "reason".to_string(),
            importance,
            actionability,
            novelty,
            recommended_action: "Do the thing".to_string(),
        };
        Note::assemble("body", analysis, momentum, seed.created_at)
    }

    fn kinds(notes: &[Note]) -> Vec<SuggestionKind> {
        generate_suggestions(notes, 50, &SuggestionConfig::default())
            .into_iter()
            .map(|suggestion| suggestion.kind)
            .collect()
    }

    #[test]
    fn empty_collection_yields_nothing() {
        assert!(generate_suggestions(&[], 5, &SuggestionConfig::default()).is_empty());
    }

    #[test]
    fn shared_keywords_produce_connection_for_the_pair() {
        let first = note(Seed {
            category: "Business",
            keywords: &["pricing", "onboarding", "churn"],
            scores: (3.0, 2.0, 2.0),
            created_at: NOW - MS_PER_DAY,
        });
        let second = note(Seed {
            category: "Technical",
            keywords: &["Onboarding", "pricing"],
            scores: (3.0, 2.0, 2.0),
            created_at: NOW,
        });

        let suggestions =
            generate_suggestions(&[second.clone(), first.clone()], 5, &SuggestionConfig::default());
        let connection = suggestions
            .iter()
            .find(|suggestion| suggestion.kind == SuggestionKind::Connection)
            .expect("connection expected");
        assert_eq!(connection.related_note_ids, vec![first.id, second.id]);
        assert_eq!(connection.title, "Connect notes on pricing and onboarding");
        assert_eq!(
            connection.id,
            suggestion_id(SuggestionKind::Connection, &[first.id, second.id])
        );
    }

    #[test]
    fn distant_or_double_favorite_pairs_do_not_connect() {
        let old = note(Seed {
            category: "Health",
            keywords: &["sleep", "routine"],
            scores: (2.0, 1.0, 2.0),
            created_at: NOW - 40 * MS_PER_DAY,
        });
        let new = note(Seed {
            category: "Health",
            keywords: &["sleep", "routine"],
            scores: (2.0, 1.0, 2.0),
            created_at: NOW,
        });
        assert!(!kinds(&[old, new.clone()]).contains(&SuggestionKind::Connection));

        let mut near = note(Seed {
            category: "Health",
            keywords: &["sleep", "routine"],
            scores: (2.0, 1.0, 2.0),
            created_at: NOW - MS_PER_DAY,
        });
        let mut new = new;
        near.is_favorite = true;
        new.is_favorite = true;
        assert!(!kinds(&[near, new]).contains(&SuggestionKind::Connection));
    }

    #[test]
    fn single_note_rules_fire_on_thresholds() {
        let expand = note(Seed {
            category: "Business",
            keywords: &[],
            scores: (4.5, 1.0, 2.0),
            created_at: NOW,
        });
        let action = note(Seed {
            category: "Learning",
            keywords: &[],
            scores: (2.0, 4.5, 2.0),
            created_at: NOW - 60 * MS_PER_DAY,
        });
        let mut resurfaced = action.clone();
        resurfaced.id = uuid::Uuid::new_v4();
        resurfaced.category = "Health".to_string();
        resurfaced.last_resurfaced_at = Some(NOW);

        let found = kinds(&[expand, action, resurfaced]);
        assert_eq!(found, vec![SuggestionKind::Action, SuggestionKind::Expand]);
    }

    #[test]
    fn combine_and_trend_need_groups() {
        let mut notes = Vec::new();
        for day in 0..3 {
            notes.push(note(Seed {
                category: "Product Idea",
                keywords: &[],
                scores: (3.0, 3.0, 3.0),
                created_at: NOW - day * MS_PER_DAY,
            }));
        }
        notes.push(note(Seed {
            category: "product idea",
            keywords: &[],
            scores: (3.0, 3.0, 3.0),
            created_at: NOW - 10 * MS_PER_DAY,
        }));
        let suggestions = generate_suggestions(&notes, 20, &SuggestionConfig::default());
        let combine = suggestions
            .iter()
            .find(|suggestion| suggestion.kind == SuggestionKind::Combine)
            .expect("combine expected");
        assert_eq!(combine.related_note_ids.len(), 4);
        assert_eq!(combine.title, "Combine your 4 Product Idea notes");

        let trend = suggestions
            .iter()
            .find(|suggestion| suggestion.kind == SuggestionKind::Trend)
            .expect("trend expected");
        assert_eq!(trend.related_note_ids[0], notes[0].id);
        assert_eq!(trend.related_note_ids.len(), 3);
    }

    #[test]
    fn output_is_deterministic_and_capped() {
        let mut notes = Vec::new();
        for index in 0..6 {
            notes.push(note(Seed {
                category: "Creative",
                keywords: &["story", "draft"],
                scores: (4.0, 4.0, 1.0 + f64::from(index) * 0.5),
                created_at: NOW - i64::from(index) * MS_PER_DAY,
            }));
        }
        let config = SuggestionConfig::default();
        let forward = generate_suggestions(&notes, 4, &config);
        notes.reverse();
        let reversed = generate_suggestions(&notes, 4, &config);

        assert_eq!(forward.len(), 4);
        assert_eq!(forward, reversed);
        assert!(forward.iter().all(|suggestion| suggestion.created_at == NOW));
    }
}
