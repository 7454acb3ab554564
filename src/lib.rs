/// Combat Pad - tabletop encounter tracker
///
/// Roster management, initiative-ordered combat with timed effects,
/// and JSON snapshots of the roster on disk.

pub mod config;
pub mod core;
pub mod tui;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
