//! Suggestion and resurfacing output shapes.

use crate::model::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of cross-note recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Connection,
    Action,
    Expand,
    Combine,
    Trend,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Action => "action",
            Self::Expand => "expand",
            Self::Combine => "combine",
            Self::Trend => "trend",
        }
    }
}

/// Generated, non-persisted recommendation linking one or more notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Derived from kind and related ids, so identical inputs share an id.
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub title: String,
    pub description: String,
    pub related_note_ids: Vec<NoteId>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Note selected for resurfacing in one scheduler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResurfacedNote {
    pub note: Note,
    pub resurface_reason: String,
    pub recommended_action: String,
}
