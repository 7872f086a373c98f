//! Note store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own note lifecycle persistence: create, get, patch, soft-delete, list.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Patches run read-modify-write inside one IMMEDIATE transaction, so
//!   concurrent writers to the same note are serialized.
//! - Deleted notes are tombstoned and invisible to every read/write API.

use crate::db::migrations::{schema_version, supported_schema_version};
use crate::db::DbError;
use crate::model::note::{Note, NoteId, NotePatch, NoteValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    text,
    created_at,
    updated_at,
    category,
    summary,
    keywords_json,
    reason,
    momentum_score,
    score_reason,
    importance,
    actionability,
    novelty,
    recommended_action,
    last_interacted_at,
    is_favorite,
    last_resurfaced_at
FROM notes";

const NOTES_DEFAULT_LIMIT: u32 = 20;
const NOTES_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    /// Update request that changes no field.
    EmptyPatch(NoteId),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::EmptyPatch(id) => write!(f, "update for note {id} changes no field"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "note repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::EmptyPatch(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Case-insensitive exact category filter.
    pub category: Option<String>,
    pub favorites_only: bool,
    /// `None` returns the full snapshot.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Note store interface consumed by the engine.
pub trait NoteRepository {
    /// Persists a new note and returns its stable id.
    fn create_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Gets one active note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Applies a partial update atomically and returns the stored result.
    ///
    /// Rejects patches that change no field.
    fn update_note(&mut self, id: NoteId, patch: &NotePatch, now_ms: i64) -> RepoResult<Note>;
    /// Tombstones one active note.
    fn delete_note(&self, id: NoteId, now_ms: i64) -> RepoResult<()>;
    /// Lists active notes ordered by `created_at DESC, id ASC`.
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        let actual_version = schema_version(conn)?;
        let expected_version = supported_schema_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                id,
                text,
                created_at,
                updated_at,
                category,
                summary,
                keywords_json,
                reason,
                momentum_score,
                score_reason,
                importance,
                actionability,
                novelty,
                recommended_action,
                last_interacted_at,
                is_favorite,
                last_resurfaced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
            params![
                note.id.to_string(),
                note.text.as_str(),
                note.created_at,
                note.updated_at,
                note.category.as_str(),
                note.summary.as_str(),
                encode_keywords(&note.keywords)?,
                note.reason.as_str(),
                note.momentum_score,
                note.score_reason.as_str(),
                note.importance,
                note.actionability,
                note.novelty,
                note.recommended_action.as_str(),
                note.last_interacted_at,
                bool_to_int(note.is_favorite),
                note.last_resurfaced_at,
            ],
        )?;

        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        load_active_note(self.conn, id)
    }

    fn update_note(&mut self, id: NoteId, patch: &NotePatch, now_ms: i64) -> RepoResult<Note> {
        if patch.is_empty() {
            return Err(RepoError::EmptyPatch(id));
        }
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut note = load_active_note(&tx, id)?.ok_or(RepoError::NotFound(id))?;

        note.apply_patch(patch, now_ms);
        note.validate()?;

        let changed = tx.execute(
            "UPDATE notes
             SET
                updated_at = ?2,
                category = ?3,
                summary = ?4,
                keywords_json = ?5,
                reason = ?6,
                momentum_score = ?7,
                score_reason = ?8,
                importance = ?9,
                actionability = ?10,
                novelty = ?11,
                recommended_action = ?12,
                last_interacted_at = ?13,
                is_favorite = ?14,
                last_resurfaced_at = ?15
             WHERE id = ?1
               AND is_deleted = 0;",
            params![
                note.id.to_string(),
                note.updated_at,
                note.category.as_str(),
                note.summary.as_str(),
                encode_keywords(&note.keywords)?,
                note.reason.as_str(),
                note.momentum_score,
                note.score_reason.as_str(),
                note.importance,
                note.actionability,
                note.novelty,
                note.recommended_action.as_str(),
                note.last_interacted_at,
                bool_to_int(note.is_favorite),
                note.last_resurfaced_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(note)
    }

    fn delete_note(&self, id: NoteId, now_ms: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                is_deleted = 1,
                updated_at = MAX(updated_at, ?2)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), now_ms],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE is_deleted = 0");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category.as_ref() {
            sql.push_str(" AND category = ? COLLATE NOCASE");
            bind_values.push(Value::Text(category.trim().to_string()));
        }

        if query.favorites_only {
            sql.push_str(" AND is_favorite = 1");
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }
}

/// Normalizes a requested page size: missing or zero uses the default page,
/// larger values are capped.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
    }
}

fn load_active_note(conn: &Connection, id: NoteId) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!(
        "{NOTE_SELECT_SQL}
         WHERE id = ?1
           AND is_deleted = 0;"
    ))?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(row)?));
    }

    Ok(None)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{id_text}` in notes.id"))
        })?;

    let keywords_text: String = row.get("keywords_json")?;
    let keywords = serde_json::from_str::<Vec<String>>(&keywords_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid notes.keywords_json for {id}: {err}"))
    })?;

    let is_favorite = match row.get::<_, i64>("is_favorite")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_favorite value `{other}` in notes.is_favorite"
            )));
        }
    };

    let note = Note {
        id,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        category: row.get("category")?,
        summary: row.get("summary")?,
        keywords,
        reason: row.get("reason")?,
        momentum_score: row.get("momentum_score")?,
        score_reason: row.get("score_reason")?,
        importance: row.get("importance")?,
        actionability: row.get("actionability")?,
        novelty: row.get("novelty")?,
        recommended_action: row.get("recommended_action")?,
        last_interacted_at: row.get("last_interacted_at")?,
        is_favorite,
        last_resurfaced_at: row.get("last_resurfaced_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn encode_keywords(keywords: &[String]) -> RepoResult<String> {
    serde_json::to_string(keywords)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode keywords: {err}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
