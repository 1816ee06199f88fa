use crate::cli::FaceArg;
use crate::deeplink::{self, NavCommand, NavSink, Router};
use crate::model::NoteSnapshot;
use crate::projector::{project_face, project_quick_capture, Labels, WidgetFace};
use crate::refresh::{MarkerFileHost, RefreshTrigger, WidgetKind};
use crate::store::SharedStore;
use anyhow::{bail, Result};
use chrono::Utc;
use tracing::warn;

pub fn add(title: String, content: String, pin: bool, folder: Option<String>) -> Result<()> {
    let (store, trigger) = open_app_side()?;
    let id = store.read_all().iter().map(|n| n.id).max().unwrap_or(0) + 1;
    let mut note = NoteSnapshot::new(id, title, content);
    note.is_pinned = pin;
    note.folder_id = folder;
    let written = store.upsert(note)?;
    trigger.request_refresh_all();
    println!("Added note {} ({})", written.id, written.title);
    Ok(())
}

pub fn edit(
    id: i64,
    title: Option<String>,
    content: Option<String>,
    folder: Option<String>,
) -> Result<()> {
    let (store, trigger) = open_app_side()?;
    let Some(mut note) = store.read_all().into_iter().find(|n| n.id == id) else {
        bail!("note {id} not found");
    };
    if let Some(t) = title {
        note.title = t;
    }
    if let Some(c) = content {
        note.content = c;
    }
    if let Some(f) = folder {
        note.folder_id = Some(f);
    }
    store.upsert(note)?;
    trigger.request_refresh_all();
    println!("Updated note {id}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let (store, trigger) = open_app_side()?;
    store.delete(id)?;
    trigger.request_refresh_all();
    println!("Deleted note {id}");
    Ok(())
}

pub fn set_pinned(id: i64, pinned: bool) -> Result<()> {
    let (store, trigger) = open_app_side()?;
    let Some(mut note) = store.read_all().into_iter().find(|n| n.id == id) else {
        bail!("note {id} not found");
    };
    note.is_pinned = pinned;
    store.upsert(note)?;
    trigger.request_refresh_all();
    println!("{} note {id}", if pinned { "Pinned" } else { "Unpinned" });
    Ok(())
}

pub fn list(pinned: bool) -> Result<()> {
    let store = SharedStore::open()?;
    let notes = if pinned {
        store.read_pinned()
    } else {
        store.read_all()
    };
    println!(
        "Store: {} (widget {})",
        store.path().display(),
        if store.is_widget_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );
    if notes.is_empty() {
        println!("  (empty)");
    }
    for note in notes {
        print_note(&note);
    }
    Ok(())
}

/// The widget host's render entry point: read the shared store, project the
/// requested face, print it. Store reads only; safe to invoke at any time.
pub fn render(face: FaceArg) -> Result<()> {
    let store = SharedStore::open()?;
    let labels = Labels::default();
    let now = Utc::now();
    match face {
        FaceArg::QuickCapture => {
            let view = project_quick_capture(&store.read_all(), &labels, now);
            println!("[quick-capture] {}", view.caption);
        }
        FaceArg::Recent => print_face(project_face(
            &store.read_all(),
            WidgetFace::Recent,
            &labels,
            now,
        )),
        FaceArg::Pinned => print_face(project_face(
            &store.read_pinned(),
            WidgetFace::Pinned,
            &labels,
            now,
        )),
    }
    Ok(())
}

pub fn open_link(uri: String, warm: bool) -> Result<()> {
    let (store, trigger) = open_app_side()?;
    let mut router = Router::new(AppNav { store, trigger });
    let routed = if warm {
        router.handle_continuation(&uri)
    } else {
        router.handle_launch(&uri)
    };
    if !routed {
        println!("Ignored unroutable link: {uri}");
    }
    Ok(())
}

pub fn enable(on: bool) -> Result<()> {
    let (store, trigger) = open_app_side()?;
    store.set_widget_enabled(on)?;
    trigger.request_refresh_all();
    println!("Widget {}", if on { "enabled" } else { "disabled" });
    Ok(())
}

pub fn clear() -> Result<()> {
    let (store, trigger) = open_app_side()?;
    store.clear()?;
    trigger.request_refresh_all();
    println!("Cleared widget data");
    Ok(())
}

fn open_app_side() -> Result<(SharedStore, RefreshTrigger)> {
    let store = SharedStore::open()?;
    let trigger = match store.path().parent() {
        Some(dir) => RefreshTrigger::new(Box::new(MarkerFileHost::new(dir))),
        None => RefreshTrigger::disabled(),
    };
    Ok((store, trigger))
}

/// The application side of the router: a view command opens the detail view,
/// an unpin command mutates the store and re-requests a refresh.
struct AppNav {
    store: SharedStore,
    trigger: RefreshTrigger,
}

impl NavSink for AppNav {
    fn navigate(&mut self, command: NavCommand) {
        match command {
            NavCommand::ViewNote(id) => {
                // Navigation always succeeds; a stale id is the detail view's
                // "not found" state, not a routing failure.
                match self.store.read_all().into_iter().find(|n| n.id == id) {
                    Some(note) => {
                        println!("Opening note {id}");
                        print_note(&note);
                    }
                    None => println!("Opening note {id}: not found"),
                }
            }
            NavCommand::UnpinNote(id) => {
                let Some(mut note) = self.store.read_all().into_iter().find(|n| n.id == id)
                else {
                    println!("Unpin {id}: note not found");
                    return;
                };
                note.is_pinned = false;
                // Tap handling is fire-and-forget; a failed write is logged,
                // never surfaced to the widget.
                match self.store.upsert(note) {
                    Ok(_) => {
                        self.trigger
                            .request_refresh(&[WidgetKind::PinnedNotes, WidgetKind::RecentNotes]);
                        println!("Unpinned note {id}");
                    }
                    Err(err) => warn!("unpin of note {id} not persisted: {err:#}"),
                }
            }
            NavCommand::Capture | NavCommand::QuickCapture => {
                println!("Opening blank editor for capture");
            }
        }
    }
}

fn print_face(view: crate::projector::FaceView) {
    let name = match view.face {
        WidgetFace::Recent => "recent-notes",
        WidgetFace::Pinned => "pinned-notes",
    };
    println!(
        "[{name}] rendered at {}",
        view.rendered_at.format("%Y-%m-%d %H:%M:%S")
    );
    if !view.has_notes {
        println!("  (no notes yet)");
        return;
    }
    for (slot, row) in view.rows.iter().enumerate() {
        match row {
            Some(row) => {
                let pin = if row.is_pinned { " *" } else { "" };
                println!("  {slot}: {}{pin}", row.title);
                println!("     {}", row.preview);
                println!("     -> {}", deeplink::view_note_uri(row.id));
            }
            None => println!("  {slot}: (empty slot)"),
        }
    }
}

fn print_note(note: &NoteSnapshot) {
    let pin = if note.is_pinned { " *" } else { "" };
    println!("  - {}: {}{pin}", note.id, note.title);
    if !note.content.is_empty() {
        println!("    {}", note.content);
    }
    if let Some(folder) = &note.folder_id {
        println!("    folder: {folder}");
    }
    if let Some(updated) = note.updated_at {
        println!("    updated: {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
}
