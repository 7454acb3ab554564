pub mod combat;
pub mod commands;
pub mod effects;
pub mod error;
pub mod initiative;
pub mod logging;
pub mod roster;
pub mod saves;
pub mod tracker;

pub use error::{Error, Result};
