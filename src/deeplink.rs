use crate::model::NoteId;
use tracing::debug;

pub const SCHEME: &str = "noteable";

/// Navigation/mutation command decoded from a widget tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    ViewNote(NoteId),
    UnpinNote(NoteId),
    /// Open a blank editor (the `note-detail` link without an id).
    Capture,
    QuickCapture,
}

pub fn view_note_uri(id: NoteId) -> String {
    format!("{SCHEME}://view-note/{id}")
}

pub fn note_detail_uri(id: NoteId) -> String {
    format!("{SCHEME}://note-detail/{id}")
}

pub fn unpin_note_uri(id: NoteId) -> String {
    format!("{SCHEME}://unpin-note/{id}")
}

pub fn capture_uri() -> String {
    format!("{SCHEME}://note-detail")
}

pub fn quick_capture_uri() -> String {
    format!("{SCHEME}://quick-capture")
}

/// Decode a widget deep link. Anything unrecognized decodes to `None`: a bad
/// URI must never take the application down, it is simply dropped.
pub fn decode(uri: &str) -> Option<NavCommand> {
    let (scheme, rest) = uri.split_once("://")?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    let (action, tail) = match rest.split_once('/') {
        Some((action, tail)) => (action, Some(tail)),
        None => (rest, None),
    };
    match action {
        "view-note" => Some(NavCommand::ViewNote(parse_id(tail?)?)),
        "note-detail" => match tail {
            Some(tail) => Some(NavCommand::ViewNote(parse_id(tail)?)),
            None => Some(NavCommand::Capture),
        },
        "unpin-note" => Some(NavCommand::UnpinNote(parse_id(tail?)?)),
        "quick-capture" => match tail {
            Some("") | None => Some(NavCommand::QuickCapture),
            Some(_) => None,
        },
        _ => None,
    }
}

fn parse_id(raw: &str) -> Option<NoteId> {
    let id = raw.parse::<NoteId>().ok()?;
    (id > 0).then_some(id)
}

/// Where decoded commands land: the application's in-process navigation.
pub trait NavSink {
    fn navigate(&mut self, command: NavCommand);
}

/// Funnels both launch transports into one decode step. The OS hands the app
/// a URI either at cold start or as a continuation event while it is already
/// running; the same URI must route identically on both paths, and each tap
/// delivers at most one command.
pub struct Router<S: NavSink> {
    sink: S,
}

impl<S: NavSink> Router<S> {
    pub fn new(sink: S) -> Self {
        Router { sink }
    }

    /// Cold start with a launch URI.
    pub fn handle_launch(&mut self, uri: &str) -> bool {
        self.dispatch(uri)
    }

    /// New-intent/continuation event while already running.
    pub fn handle_continuation(&mut self, uri: &str) -> bool {
        self.dispatch(uri)
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn dispatch(&mut self, uri: &str) -> bool {
        match decode(uri) {
            Some(command) => {
                self.sink.navigate(command);
                true
            }
            None => {
                debug!("dropping unroutable uri: {uri}");
                false
            }
        }
    }
}
