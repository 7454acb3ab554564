//! In-tree test suites
//!
//! - `common`: shared fixtures
//! - `unit`: encounter flows and the auto-end timer, driven through the tracker
//! - `property`: proptest invariants for turn order, effect decay and HP

mod common;
mod property;
mod unit;
