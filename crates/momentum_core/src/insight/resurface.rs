//! Resurfacing scheduler.
//!
//! # Responsibility
//! - Pick dormant, high-momentum notes worth showing again.
//! - Explain each pick with a short reason.
//!
//! # Invariants
//! - Notes dormant for less than the minimum dormancy are never selected.
//! - Urgency is `momentum * decay`, where decay rises linearly from 0 at the
//!   minimum dormancy to 1 at saturation and stays at 1 afterwards.
//! - Selection has no side effects; identical inputs give identical output.

use crate::clock::{MS_PER_DAY, MS_PER_HOUR};
use crate::config::ResurfaceConfig;
use crate::model::insight::MomentumTier;
use crate::model::note::Note;
use crate::model::suggestion::ResurfacedNote;
use std::cmp::Ordering;
use std::collections::BTreeSet;

struct Candidate<'a> {
    note: &'a Note,
    dormancy_ms: i64,
    decay: f64,
    urgency: f64,
}

/// Selects up to `limit` notes to resurface at `now_ms`.
pub fn select_resurface_candidates(
    notes: &[Note],
    now_ms: i64,
    limit: usize,
    config: &ResurfaceConfig,
) -> Vec<ResurfacedNote> {
    if limit == 0 {
        return Vec::new();
    }

    let min_dormancy_ms = config.min_dormancy_ms();
    let mut seen = BTreeSet::new();
    let mut candidates = Vec::new();
    for note in notes {
        let dormancy_ms = now_ms.saturating_sub(note.last_interacted_at);
        if dormancy_ms < min_dormancy_ms || note.momentum_score < config.threshold {
            continue;
        }
        if !seen.insert(note.id) {
            continue;
        }
        let decay = decay_factor(dormancy_ms, config);
        candidates.push(Candidate {
            note,
            dormancy_ms,
            decay,
            urgency: note.momentum_score * decay,
        });
    }

    candidates.sort_by(compare_candidates);
    candidates
        .into_iter()
        .take(limit)
        .map(|candidate| ResurfacedNote {
            resurface_reason: resurface_reason(&candidate),
            recommended_action: candidate.note.recommended_action.clone(),
            note: candidate.note.clone(),
        })
        .collect()
}

/// Maps dormancy to an urgency multiplier in `[0, 1]`.
pub fn decay_factor(dormancy_ms: i64, config: &ResurfaceConfig) -> f64 {
    let min_ms = config.min_dormancy_ms();
    let saturation_ms = config.saturation_ms();
    if dormancy_ms < min_ms {
        return 0.0;
    }
    if saturation_ms <= min_ms {
        return 1.0;
    }
    let progress = (dormancy_ms - min_ms) as f64 / (saturation_ms - min_ms) as f64;
    progress.clamp(0.0, 1.0)
}

fn compare_candidates(left: &Candidate<'_>, right: &Candidate<'_>) -> Ordering {
    right
        .urgency
        .total_cmp(&left.urgency)
        .then(left.note.created_at.cmp(&right.note.created_at))
        .then(left.note.id.cmp(&right.note.id))
}

fn resurface_reason(candidate: &Candidate<'_>) -> String {
    let score = candidate.note.momentum_score;
    let mut reason = format!(
        "{} momentum ({score:.1}/10), untouched for {}",
        MomentumTier::from_score(score).label(),
        describe_dormancy(candidate.dormancy_ms)
    );
    if candidate.decay >= 1.0 {
        reason.push_str(", overdue for review");
    }
    reason
}

fn describe_dormancy(dormancy_ms: i64) -> String {
    let days = dormancy_ms / MS_PER_DAY;
    if days >= 1 {
        return plural(days, "day");
    }
    plural((dormancy_ms / MS_PER_HOUR).max(1), "hour")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{decay_factor, describe_dormancy, select_resurface_candidates};
    use crate::clock::{MS_PER_DAY, MS_PER_HOUR};
    use crate::config::ResurfaceConfig;
    use crate::model::insight::{AiAnalysis, MomentumResult};
    use crate::model::note::Note;

    const NOW: i64 = 1_000 * MS_PER_DAY;

    fn note(sub_score: f64, created_at: i64, last_interacted_at: i64) -> Note {
        let analysis = AiAnalysis {
            category: "General".to_string(),
            summary: "summary".to_string(),
            keywords: vec![],
            reason: "reason".to_string(),
        };
        let momentum = MomentumResult {
            momentum_score: 0.0,
            score_reason: "reason".to_string(),
            importance: sub_score,
            actionability: sub_score,
            novelty: sub_score,
            recommended_action: "Review it".to_string(),
        };
        let mut note = Note::assemble("text", analysis, momentum, created_at);
        note.last_interacted_at = last_interacted_at;
        note
    }

    #[test]
    fn decay_rises_linearly_then_caps() {
        let config = ResurfaceConfig::default();
        assert_eq!(decay_factor(23 * MS_PER_HOUR, &config), 0.0);
        assert_eq!(decay_factor(MS_PER_DAY, &config), 0.0);
        assert_eq!(decay_factor(4 * MS_PER_DAY, &config), 0.5);
        assert_eq!(decay_factor(7 * MS_PER_DAY, &config), 1.0);
        assert_eq!(decay_factor(90 * MS_PER_DAY, &config), 1.0);
    }

    #[test]
    fn dormancy_boundary_is_respected() {
        let config = ResurfaceConfig::default();
        let fresh = note(3.0, NOW - 10 * MS_PER_DAY, NOW - 23 * MS_PER_HOUR);
        let dormant = note(3.0, NOW - 10 * MS_PER_DAY, NOW - 25 * MS_PER_HOUR);
        assert_eq!(dormant.momentum_score, 6.0);

        let picked = select_resurface_candidates(&[fresh, dormant.clone()], NOW, 10, &config);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].note.id, dormant.id);
        assert_eq!(picked[0].recommended_action, "Review it");
        assert_eq!(
            picked[0].resurface_reason,
            "High momentum (6.0/10), untouched for 1 day"
        );
    }

    #[test]
    fn low_momentum_notes_are_skipped() {
        let config = ResurfaceConfig::default();
        let low = note(2.0, NOW - 20 * MS_PER_DAY, NOW - 20 * MS_PER_DAY);
        assert!(select_resurface_candidates(&[low], NOW, 10, &config).is_empty());
    }

    #[test]
    fn ordering_prefers_urgency_then_older_notes() {
        let config = ResurfaceConfig::default();
        let saturated_new = note(4.5, NOW - 9 * MS_PER_DAY, NOW - 8 * MS_PER_DAY);
        let saturated_old = note(4.5, NOW - 30 * MS_PER_DAY, NOW - 20 * MS_PER_DAY);
        let half_decayed = note(5.0, NOW - 40 * MS_PER_DAY, NOW - 4 * MS_PER_DAY);
        let notes = vec![half_decayed.clone(), saturated_new.clone(), saturated_old.clone()];

        let picked = select_resurface_candidates(&notes, NOW, 10, &config);
        let ids = picked.iter().map(|item| item.note.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![saturated_old.id, saturated_new.id, half_decayed.id]);
        assert!(picked[0].resurface_reason.ends_with("overdue for review"));

        let again = select_resurface_candidates(&notes, NOW, 10, &config);
        assert_eq!(picked, again);
    }

    #[test]
    fn limit_caps_results_and_duplicates_collapse() {
        let config = ResurfaceConfig::default();
        let one = note(4.0, NOW - 10 * MS_PER_DAY, NOW - 10 * MS_PER_DAY);
        let two = note(4.0, NOW - 9 * MS_PER_DAY, NOW - 9 * MS_PER_DAY);
        let notes = vec![one.clone(), one.clone(), two];

        assert_eq!(select_resurface_candidates(&notes, NOW, 10, &config).len(), 2);
        assert_eq!(select_resurface_candidates(&notes, NOW, 1, &config).len(), 1);
        assert!(select_resurface_candidates(&notes, NOW, 0, &config).is_empty());
    }

    #[test]
    fn dormancy_is_described_in_days_or_hours() {
        assert_eq!(describe_dormancy(5 * MS_PER_DAY + MS_PER_HOUR), "5 days");
        assert_eq!(describe_dormancy(3 * MS_PER_HOUR), "3 hours");
        assert_eq!(describe_dormancy(10), "1 hour");
    }
}
