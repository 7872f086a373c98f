//! Analytics aggregator.
//!
//! # Responsibility
//! - Derive counts, averages, weekly trend and streak from a note snapshot.
//!
//! # Invariants
//! - Empty input yields zero counts, `avg_momentum == 0.0` and no NaN.
//! - Calendar-day bucketing uses the configured UTC offset.
//! - Category ties resolve alphabetically; weekday ties resolve Monday first.

use crate::clock::MS_PER_DAY;
use crate::config::AnalyticsConfig;
use crate::model::analytics::{AnalyticsData, CategoryCount, DayCount};
use crate::model::insight::{round1, DEFAULT_CATEGORY};
use crate::model::note::Note;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc, Weekday};
use std::collections::{BTreeMap, BTreeSet};

const TREND_DAYS: i64 = 7;
const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Aggregates the analytics snapshot at `now_ms`.
pub fn aggregate(notes: &[Note], now_ms: i64, config: &AnalyticsConfig) -> AnalyticsData {
    let offset = FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());
    let today = local_date(now_ms, &offset);
    let note_dates = notes
        .iter()
        .map(|note| local_date(note.created_at, &offset))
        .collect::<Vec<_>>();

    let today_notes = match today {
        Some(today) => note_dates.iter().filter(|date| **date == Some(today)).count(),
        None => 0,
    };
    let week_start = now_ms.saturating_sub(TREND_DAYS * MS_PER_DAY);
    let week_notes = notes
        .iter()
        .filter(|note| note.created_at > week_start && note.created_at <= now_ms)
        .count();

    let avg_momentum = if notes.is_empty() {
        0.0
    } else {
        round1(notes.iter().map(|note| note.momentum_score).sum::<f64>() / notes.len() as f64)
    };
    let high_momentum_count = notes
        .iter()
        .filter(|note| note.momentum_score >= config.high_momentum_threshold)
        .count();

    let active_days = note_dates.iter().flatten().copied().collect::<BTreeSet<_>>();

    AnalyticsData {
        total_notes: notes.len(),
        today_notes,
        week_notes,
        avg_momentum,
        top_categories: top_categories(notes, config.top_categories),
        weekly_trend: today
            .map(|today| weekly_trend(&note_dates, today))
            .unwrap_or_default(),
        high_momentum_count,
        most_productive_day: most_productive_day(&note_dates),
        streak_days: today
            .map(|today| streak_days(&active_days, today))
            .unwrap_or(0),
    }
}

/// Short English weekday label, `Mon`..`Sun`.
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn local_date(timestamp_ms: i64, offset: &FixedOffset) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|instant| instant.with_timezone(offset).date_naive())
}

fn top_categories(notes: &[Note], cap: usize) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for note in notes {
        let name = match note.category.trim() {
            "" => DEFAULT_CATEGORY,
            name => name,
        };
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut ranked = counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect::<Vec<_>>();
    // Stable sort keeps the map's alphabetical order inside equal counts.
    ranked.sort_by(|left, right| right.count.cmp(&left.count));
    ranked.truncate(cap);
    ranked
}

fn weekly_trend(note_dates: &[Option<NaiveDate>], today: NaiveDate) -> Vec<DayCount> {
    (0..TREND_DAYS)
        .rev()
        .filter_map(|days_back| today.checked_sub_days(chrono::Days::new(days_back as u64)))
        .map(|day| DayCount {
            day: weekday_label(day.weekday()).to_string(),
            count: note_dates.iter().filter(|date| **date == Some(day)).count(),
        })
        .collect()
}

fn most_productive_day(note_dates: &[Option<NaiveDate>]) -> Option<String> {
    let mut per_weekday = [0_usize; 7];
    for date in note_dates.iter().flatten() {
        per_weekday[date.weekday().num_days_from_monday() as usize] += 1;
    }

    let mut best: Option<(Weekday, usize)> = None;
    for (day, count) in WEEK.iter().zip(per_weekday) {
        if count == 0 {
            continue;
        }
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((*day, count));
        }
    }
    best.map(|(day, _)| weekday_label(day).to_string())
}

fn streak_days(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if active_days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor {
        if !active_days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}
