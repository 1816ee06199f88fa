pub mod cli;
pub mod commands;
pub mod deeplink;
pub mod model;
pub mod projector;
pub mod refresh;
pub mod store;
