use anyhow::Result;
use clap::Parser;
use noteable_widgets::cli::{Cli, Command};
use noteable_widgets::commands;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();
    match args.command {
        Command::Add {
            title,
            content,
            pin,
            folder,
        } => commands::add(title, content, pin, folder),
        Command::Edit {
            id,
            title,
            content,
            folder,
        } => commands::edit(id, title, content, folder),
        Command::Delete { id } => commands::delete(id),
        Command::Pin { id } => commands::set_pinned(id, true),
        Command::Unpin { id } => commands::set_pinned(id, false),
        Command::List { pinned } => commands::list(pinned),
        Command::Render { face } => commands::render(face),
        Command::Open { uri, warm } => commands::open_link(uri, warm),
        Command::Enable { off } => commands::enable(!off),
        Command::Clear => commands::clear(),
    }
}
