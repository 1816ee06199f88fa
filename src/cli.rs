use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "noteable-widgets",
    version,
    about = "Shared home-screen widget store for the Noteable app"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a new note snapshot into the shared store
    Add {
        /// Title of the note
        title: String,
        /// Note body
        #[arg(long, default_value = "")]
        content: String,
        /// Pin the note
        #[arg(long)]
        pin: bool,
        /// Folder the note belongs to
        #[arg(long)]
        folder: Option<String>,
    },
    /// Edit an existing snapshot
    Edit {
        /// Note id to edit
        id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body
        #[arg(long)]
        content: Option<String>,
        /// New folder
        #[arg(long)]
        folder: Option<String>,
    },
    /// Delete a snapshot
    Delete {
        /// Note id to delete
        id: i64,
    },
    /// Pin a note
    Pin {
        /// Note id to pin
        id: i64,
    },
    /// Unpin a note
    Unpin {
        /// Note id to unpin
        id: i64,
    },
    /// List raw store contents
    List {
        /// Only pinned notes
        #[arg(long)]
        pinned: bool,
    },
    /// Render a widget face the way the widget host would
    Render {
        /// Widget face to render
        face: FaceArg,
    },
    /// Route a widget deep link into the application
    Open {
        /// Deep link URI, e.g. noteable://view-note/3
        uri: String,
        /// Deliver as a continuation event instead of a cold start
        #[arg(long)]
        warm: bool,
    },
    /// Set the widget feature flag
    Enable {
        /// Turn the flag off instead
        #[arg(long)]
        off: bool,
    },
    /// Remove all widget data (sign-out/reset)
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FaceArg {
    QuickCapture,
    Recent,
    Pinned,
}
