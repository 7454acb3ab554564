//! Property-based tests for Combat Pad
//!
//! ## Test Modules
//!
//! - `combat_props`: turn order and HP
//!   - `next_turn` applied N times returns to the starting participant
//!   - HP never drops below 0 for any sequence of changes
//!   - The encounter counts as ended iff every monster is down
//!
//! - `effect_props`: effect decay
//!   - An effect of duration d expires on exactly the d-th turn start of its owner
//!   - No tracked effect ever shows a duration of 0
//!
//! By default, proptest runs 256 cases per property. Override with
//! `PROPTEST_CASES`.

mod combat_props;
mod effect_props;
