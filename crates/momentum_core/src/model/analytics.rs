//! Analytics snapshot shape.

use serde::{Deserialize, Serialize};

/// Note count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Note count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    /// Short weekday label (`Mon`..`Sun`).
    pub day: String,
    pub count: usize,
}

/// Derived summary over the note collection at computation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsData {
    pub total_notes: usize,
    pub today_notes: usize,
    pub week_notes: usize,
    /// Mean momentum rounded to one decimal; `0.0` for an empty collection.
    pub avg_momentum: f64,
    pub top_categories: Vec<CategoryCount>,
    /// Last seven calendar days, oldest first.
    pub weekly_trend: Vec<DayCount>,
    pub high_momentum_count: usize,
    /// `None` when there are no notes.
    pub most_productive_day: Option<String>,
    pub streak_days: u32,
}
