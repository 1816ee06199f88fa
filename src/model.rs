use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NoteId = i64;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NoteSnapshot {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub folder_id: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("invalid note id {0} (ids must be positive)")]
    InvalidId(NoteId),
}

impl NoteSnapshot {
    pub fn new(id: NoteId, title: impl Into<String>, content: impl Into<String>) -> Self {
        NoteSnapshot {
            id,
            title: title.into(),
            content: content.into(),
            created_at: Utc::now(),
            updated_at: None,
            is_pinned: false,
            folder_id: None,
        }
    }

    /// Effective ordering timestamp; a never-updated note sorts by creation time.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreState {
    pub version: u32,
    pub widget_enabled: bool,
    pub notes: Vec<NoteSnapshot>,
}

impl Default for StoreState {
    fn default() -> Self {
        StoreState {
            version: SCHEMA_VERSION,
            widget_enabled: false,
            notes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sort_key_falls_back_to_created_at() {
        let mut note = NoteSnapshot::new(1, "a", "b");
        note.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(note.sort_key(), note.created_at);

        let stamp = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        note.updated_at = Some(stamp);
        assert_eq!(note.sort_key(), stamp);
    }

    #[test]
    fn default_state_is_empty_and_disabled() {
        let state = StoreState::default();
        assert_eq!(state.version, SCHEMA_VERSION);
        assert!(!state.widget_enabled);
        assert!(state.notes.is_empty());
    }
}
