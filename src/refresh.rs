use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// The three widget faces the host can be asked to re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WidgetKind {
    QuickCapture,
    RecentNotes,
    PinnedNotes,
}

impl WidgetKind {
    pub fn all() -> [WidgetKind; 3] {
        [
            WidgetKind::QuickCapture,
            WidgetKind::RecentNotes,
            WidgetKind::PinnedNotes,
        ]
    }

    pub fn token(self) -> &'static str {
        match self {
            WidgetKind::QuickCapture => "quick-capture",
            WidgetKind::RecentNotes => "recent-notes",
            WidgetKind::PinnedNotes => "pinned-notes",
        }
    }
}

/// The platform invalidation primitive. Implementations ask the OS widget
/// host to re-invoke the render entry point for one face; they never render
/// anything themselves.
pub trait RefreshHost {
    fn invalidate(&self, kind: WidgetKind) -> Result<()>;
}

/// Stand-in when the platform refresh primitive is unavailable. A missed
/// refresh is recovered at the host's next natural refresh cycle.
pub struct NoopHost;

impl RefreshHost for NoopHost {
    fn invalidate(&self, _kind: WidgetKind) -> Result<()> {
        Ok(())
    }
}

/// Cross-process invalidation signal for the CLI: bump a per-face generation
/// file next to the store so a separately launched widget-host invocation can
/// observe that its face went stale.
pub struct MarkerFileHost {
    dir: PathBuf,
}

impl MarkerFileHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        MarkerFileHost { dir: dir.into() }
    }

    pub fn generation(&self, kind: WidgetKind) -> u64 {
        fs::read_to_string(self.marker_path(kind))
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    fn marker_path(&self, kind: WidgetKind) -> PathBuf {
        self.dir.join(format!("{}.refresh", kind.token()))
    }
}

impl RefreshHost for MarkerFileHost {
    fn invalidate(&self, kind: WidgetKind) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {:?}", self.dir))?;
        let path = self.marker_path(kind);
        let next = self.generation(kind) + 1;
        fs::write(&path, format!("{next}\n")).with_context(|| format!("writing {path:?}"))?;
        Ok(())
    }
}

/// Request-for-invalidation surface the application calls after a mutation.
/// Requests are hints: duplicates within a call collapse, host failures are
/// logged and swallowed, and the caller never has to wait for a render.
pub struct RefreshTrigger {
    host: Box<dyn RefreshHost>,
}

impl RefreshTrigger {
    pub fn new(host: Box<dyn RefreshHost>) -> Self {
        RefreshTrigger { host }
    }

    pub fn disabled() -> Self {
        RefreshTrigger::new(Box::new(NoopHost))
    }

    pub fn request_refresh(&self, kinds: &[WidgetKind]) {
        let unique: BTreeSet<WidgetKind> = kinds.iter().copied().collect();
        for kind in unique {
            match self.host.invalidate(kind) {
                Ok(()) => debug!("requested refresh of {}", kind.token()),
                Err(err) => warn!("refresh of {} not delivered: {err:#}", kind.token()),
            }
        }
    }

    pub fn request_refresh_all(&self) {
        self.request_refresh(&WidgetKind::all());
    }
}
