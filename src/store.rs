use crate::model::{NoteId, NoteSnapshot, SnapshotError, StoreState, SCHEMA_VERSION};
use anyhow::{Context, Result};
use chrono::Utc;
use directories::ProjectDirs;
use serde_yaml::Value;
use std::env;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STORE_FILE: &str = "widget_data.yml";
pub const DATA_DIR_ENV: &str = "NOTEABLE_DATA_DIR";

/// Handle on the shared widget data file. One instance per process; both the
/// application process (writer) and the widget host process (reader) open the
/// same path. Every mutation rewrites the whole document through an atomic
/// temp-file-then-rename, so a reader in another process never sees a torn
/// document.
#[derive(Debug, Clone)]
pub struct SharedStore {
    path: PathBuf,
}

impl SharedStore {
    /// Open the store at the device-shared default location.
    pub fn open() -> Result<Self> {
        Ok(SharedStore {
            path: shared_data_path()?,
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SharedStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace the record with the snapshot's id. The store stamps
    /// `updated_at` on every upsert; the caller's value is ignored. Also marks
    /// the widget feature enabled, since data is now available to project.
    pub fn upsert(&self, mut snapshot: NoteSnapshot) -> Result<NoteSnapshot> {
        if snapshot.id <= 0 {
            return Err(SnapshotError::InvalidId(snapshot.id).into());
        }
        // Clamp so a snapshot created moments from now keeps updated_at >= created_at.
        snapshot.updated_at = Some(Utc::now().max(snapshot.created_at));
        let mut state = self.load_state();
        match state.notes.iter_mut().find(|n| n.id == snapshot.id) {
            Some(slot) => *slot = snapshot.clone(),
            None => state.notes.push(snapshot.clone()),
        }
        state.widget_enabled = true;
        self.persist(&state)?;
        Ok(snapshot)
    }

    /// Remove the record with the given id. Deleting an absent id is not an error.
    pub fn delete(&self, id: NoteId) -> Result<()> {
        let mut state = self.load_state();
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        if state.notes.len() == before {
            return Ok(());
        }
        self.persist(&state)
    }

    /// All records, most recently updated first, ties broken by ascending id.
    /// A never-written or unreadable store reads as empty.
    pub fn read_all(&self) -> Vec<NoteSnapshot> {
        let mut notes = self.load_state().notes;
        notes.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()).then(a.id.cmp(&b.id)));
        notes
    }

    /// `read_all` filtered to pinned records, same order.
    pub fn read_pinned(&self) -> Vec<NoteSnapshot> {
        self.read_all()
            .into_iter()
            .filter(|n| n.is_pinned)
            .collect()
    }

    /// Remove every record and reset the feature flag. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.persist(&StoreState::default())
    }

    pub fn set_widget_enabled(&self, enabled: bool) -> Result<()> {
        let mut state = self.load_state();
        state.widget_enabled = enabled;
        self.persist(&state)
    }

    pub fn is_widget_enabled(&self) -> bool {
        self.load_state().widget_enabled
    }

    /// Decode the on-disk document, skipping whatever cannot be decoded: one
    /// damaged record must not blank the whole widget, so records are decoded
    /// individually and failures are dropped with a warning.
    fn load_state(&self) -> StoreState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return StoreState::default(),
            Err(err) => {
                warn!("widget store at {:?} unreadable: {err}", self.path);
                return StoreState::default();
            }
        };
        let doc: Value = match serde_yaml::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("widget store at {:?} undecodable: {err}", self.path);
                return StoreState::default();
            }
        };
        let version = doc
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or_default() as u32;
        if version != SCHEMA_VERSION {
            warn!(
                "widget store at {:?} has unsupported schema version {version}",
                self.path
            );
            return StoreState::default();
        }
        let widget_enabled = doc
            .get("widget_enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let mut notes = Vec::new();
        if let Some(items) = doc.get("notes").and_then(Value::as_sequence) {
            for item in items {
                match serde_yaml::from_value::<NoteSnapshot>(item.clone()) {
                    Ok(note) if note.id > 0 => notes.push(note),
                    Ok(note) => warn!("skipping stored note with invalid id {}", note.id),
                    Err(err) => warn!("skipping undecodable note record: {err}"),
                }
            }
        }
        StoreState {
            version,
            widget_enabled,
            notes,
        }
    }

    /// Durable whole-document replace: write a sibling temp file, fsync it,
    /// then rename over the live path. The reader may run in a process that
    /// starts long after we exit, so the write must be on disk before we return.
    fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
        }
        let serialized = serde_yaml::to_string(state).context("serializing widget store")?;
        let tmp = self.path.with_extension("yml.tmp");
        {
            let mut file =
                fs::File::create(&tmp).with_context(|| format!("creating {tmp:?}"))?;
            file.write_all(serialized.as_bytes())
                .with_context(|| format!("writing {tmp:?}"))?;
            file.sync_all().with_context(|| format!("syncing {tmp:?}"))?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {:?}", self.path))?;
        debug!(
            "persisted widget store ({} notes) to {:?}",
            state.notes.len(),
            self.path
        );
        Ok(())
    }
}

fn shared_data_path() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir).join(STORE_FILE));
    }
    let dirs = ProjectDirs::from("", "", "noteable").context("locating shared data directory")?;
    Ok(dirs.data_dir().join(STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SharedStore {
        SharedStore::at(dir.path().join(STORE_FILE))
    }

    #[test]
    fn never_written_store_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.read_all().is_empty());
        assert!(store.read_pinned().is_empty());
        assert!(!store.is_widget_enabled());
    }

    #[test]
    fn upsert_round_trips_modulo_stamping() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut note = NoteSnapshot::new(7, "Groceries", "milk, eggs");
        note.folder_id = Some("errands".into());
        let written = store.upsert(note.clone()).unwrap();

        let all = store.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], written);
        assert_eq!(all[0].title, note.title);
        assert_eq!(all[0].content, note.content);
        assert_eq!(all[0].created_at, note.created_at);
        assert_eq!(all[0].folder_id, note.folder_id);
        assert!(all[0].updated_at.is_some());
    }

    #[test]
    fn upsert_stamps_updated_at_unconditionally() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut note = NoteSnapshot::new(1, "a", "b");
        let stale = note.created_at - chrono::Duration::hours(2);
        note.created_at = stale;
        note.updated_at = Some(stale);
        let written = store.upsert(note).unwrap();
        assert!(written.updated_at.unwrap() > stale);
        assert!(written.updated_at.unwrap() >= written.created_at);
    }

    #[test]
    fn upsert_replaces_whole_record_by_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.upsert(NoteSnapshot::new(3, "first", "old body")).unwrap();

        let mut replacement = NoteSnapshot::new(3, "second", "new body");
        replacement.is_pinned = true;
        store.upsert(replacement).unwrap();

        let all = store.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "second");
        assert_eq!(all[0].content, "new body");
        assert!(all[0].is_pinned);
    }

    #[test]
    fn upsert_rejects_non_positive_ids() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.upsert(NoteSnapshot::new(0, "", "")).is_err());
        assert!(store.upsert(NoteSnapshot::new(-4, "", "")).is_err());
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn read_all_orders_by_updated_desc_then_id_asc() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let base = Utc::now();
        let mut state = StoreState::default();
        for (id, offset_minutes) in [(1, 0), (2, 30), (3, 10)] {
            let mut note = NoteSnapshot::new(id, format!("n{id}"), "");
            note.created_at = base;
            note.updated_at = Some(base + chrono::Duration::minutes(offset_minutes));
            state.notes.push(note);
        }
        store.persist(&state).unwrap();

        let ids: Vec<_> = store.read_all().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn tie_break_is_ascending_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let stamp = Utc::now();
        let mut state = StoreState::default();
        for id in [9, 2, 5] {
            let mut note = NoteSnapshot::new(id, format!("n{id}"), "");
            note.created_at = stamp;
            note.updated_at = Some(stamp);
            state.notes.push(note);
        }
        state.widget_enabled = true;
        store.persist(&state).unwrap();

        let ids: Vec<_> = store.read_all().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn read_pinned_is_pinned_subset_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let stamp = Utc::now();
        let mut state = StoreState::default();
        for (id, pinned) in [(1, true), (2, false), (3, true)] {
            let mut note = NoteSnapshot::new(id, format!("n{id}"), "");
            note.created_at = stamp;
            note.updated_at = Some(stamp);
            note.is_pinned = pinned;
            state.notes.push(note);
        }
        store.persist(&state).unwrap();

        let ids: Vec<_> = store.read_pinned().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn delete_removes_record_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.upsert(NoteSnapshot::new(1, "keep", "")).unwrap();
        store.upsert(NoteSnapshot::new(2, "drop", "")).unwrap();

        store.delete(2).unwrap();
        let ids: Vec<_> = store.read_all().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1]);

        store.delete(99).unwrap();
        assert_eq!(store.read_all().len(), 1);
    }

    #[test]
    fn clear_is_idempotent_and_resets_flag() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.upsert(NoteSnapshot::new(1, "a", "b")).unwrap();
        assert!(store.is_widget_enabled());

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.read_all().is_empty());
        assert!(!store.is_widget_enabled());
    }

    #[test]
    fn feature_flag_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.is_widget_enabled());
        store.set_widget_enabled(true).unwrap();
        assert!(store.is_widget_enabled());
        store.set_widget_enabled(false).unwrap();
        assert!(!store.is_widget_enabled());
    }

    #[test]
    fn corrupt_record_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let doc = "version: 1\n\
                   widget_enabled: true\n\
                   notes:\n\
                   - id: 1\n  \
                     title: good\n  \
                     content: body\n  \
                     created_at: 2024-03-01T10:00:00Z\n\
                   - id: not-a-number\n  \
                     title: bad\n\
                   - id: 2\n  \
                     title: also good\n  \
                     content: ''\n  \
                     created_at: 2024-03-02T10:00:00Z\n";
        fs::write(store.path(), doc).unwrap();

        let ids: Vec<_> = store.read_all().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(store.is_widget_enabled());
    }

    #[test]
    fn garbage_document_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), ": not yaml {{{{").unwrap();
        assert!(store.read_all().is_empty());
        assert!(!store.is_widget_enabled());
    }

    #[test]
    fn unknown_schema_version_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "version: 99\nwidget_enabled: true\nnotes: []\n",
        )
        .unwrap();
        assert!(store.read_all().is_empty());
        assert!(!store.is_widget_enabled());
    }

    #[test]
    fn write_then_refresh_then_render_sees_fresh_note() {
        use crate::projector::{project_face, Labels, WidgetFace};
        use crate::refresh::{MarkerFileHost, RefreshTrigger, WidgetKind};

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut note = NoteSnapshot::new(5, "Fresh", "just written");
        note.is_pinned = true;
        store.upsert(note).unwrap();

        let trigger = RefreshTrigger::new(Box::new(MarkerFileHost::new(dir.path())));
        trigger.request_refresh(&[WidgetKind::PinnedNotes]);
        let host = MarkerFileHost::new(dir.path());
        assert_eq!(host.generation(WidgetKind::PinnedNotes), 1);

        // The widget host wakes up, re-reads the store, projects its face.
        let reader = SharedStore::at(store.path());
        let view = project_face(
            &reader.read_pinned(),
            WidgetFace::Pinned,
            &Labels::default(),
            Utc::now(),
        );
        let row = view.rows[0].as_ref().unwrap();
        assert_eq!(row.title, "Fresh");
        assert!(row.is_pinned);
    }

    #[test]
    fn second_handle_sees_durable_write() {
        // Same-path, separate-handle read models the widget host process
        // opening the store after the application wrote.
        let dir = TempDir::new().unwrap();
        let writer = store_in(&dir);
        writer.upsert(NoteSnapshot::new(11, "from app", "hello")).unwrap();

        let reader = SharedStore::at(writer.path());
        let all = reader.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "from app");
    }
}
