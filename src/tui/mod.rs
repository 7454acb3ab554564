pub mod app;
pub mod combat;
pub mod events;
pub mod theme;
