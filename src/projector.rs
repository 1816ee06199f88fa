use crate::model::{NoteId, NoteSnapshot};
use chrono::{DateTime, Utc};

pub const PREVIEW_ELLIPSIS: &str = "...";

/// The two list-bearing widget faces. Each face fixes how many slots it
/// renders and how much content fits a preview line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetFace {
    Recent,
    Pinned,
}

impl WidgetFace {
    pub fn slot_count(self) -> usize {
        match self {
            WidgetFace::Recent => 3,
            WidgetFace::Pinned => 4,
        }
    }

    pub fn preview_limit(self) -> usize {
        match self {
            WidgetFace::Recent => 50,
            WidgetFace::Pinned => 40,
        }
    }
}

/// Display strings the projector falls back to. Localization swaps this
/// struct out; derivation logic stays untouched.
#[derive(Debug, Clone)]
pub struct Labels {
    pub untitled: String,
    pub tap_to_view: String,
    pub tap_to_capture: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            untitled: "Untitled".into(),
            tap_to_view: "Tap to view".into(),
            tap_to_capture: "Tap to capture".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub is_pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceView {
    pub face: WidgetFace,
    pub rows: Vec<Option<NoteRow>>,
    pub has_notes: bool,
    pub rendered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickCaptureView {
    pub note_count: usize,
    pub caption: String,
    pub rendered_at: DateTime<Utc>,
}

/// Derive the rows a face renders from already-ordered store output. Pure:
/// same notes, face and instant always produce the same view. Fewer notes
/// than slots pads with empty slots rather than failing.
pub fn project_face(
    notes: &[NoteSnapshot],
    face: WidgetFace,
    labels: &Labels,
    rendered_at: DateTime<Utc>,
) -> FaceView {
    let mut rows: Vec<Option<NoteRow>> = notes
        .iter()
        .take(face.slot_count())
        .map(|note| Some(note_row(note, face, labels)))
        .collect();
    rows.resize(face.slot_count(), None);
    let has_notes = rows.iter().any(Option::is_some);
    FaceView {
        face,
        rows,
        has_notes,
        rendered_at,
    }
}

/// The quick-capture face shows a count instead of rows.
pub fn project_quick_capture(
    notes: &[NoteSnapshot],
    labels: &Labels,
    rendered_at: DateTime<Utc>,
) -> QuickCaptureView {
    let note_count = notes.len();
    let caption = match note_count {
        0 => labels.tap_to_capture.clone(),
        1 => "1 note".to_string(),
        n => format!("{n} notes"),
    };
    QuickCaptureView {
        note_count,
        caption,
        rendered_at,
    }
}

fn note_row(note: &NoteSnapshot, face: WidgetFace, labels: &Labels) -> NoteRow {
    let title = if note.title.is_empty() {
        labels.untitled.clone()
    } else {
        note.title.clone()
    };
    let mut preview = truncate_preview(&note.content, face.preview_limit());
    if preview.is_empty() {
        preview = labels.tap_to_view.clone();
    }
    NoteRow {
        id: note.id,
        title,
        preview,
        is_pinned: note.is_pinned,
    }
}

/// Character-wise truncation; content at exactly the limit passes through.
fn truncate_preview(content: &str, limit: usize) -> String {
    if content.chars().count() > limit {
        let mut out: String = content.chars().take(limit).collect();
        out.push_str(PREVIEW_ELLIPSIS);
        out
    } else {
        content.to_string()
    }
}
