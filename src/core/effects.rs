//! Timed status effects attached to a single combat participant.
//!
//! Durations count the owner's own turn starts: every start of the owner's
//! turn takes one off, and an effect that reaches zero is dropped in the
//! same step, so a tracked effect always has at least one turn left.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Effect {
    pub id: String,
    pub name: String,
    /// Turns remaining, always >= 1 while tracked.
    pub duration: u32,
}

/// Effects on one participant, in the order they were applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectTracker {
    effects: Vec<Effect>,
}

impl EffectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a new effect. The name is trimmed; an empty name or a duration
    /// below one turn is rejected.
    pub fn add(&mut self, name: &str, duration: i32) -> Result<&Effect, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyEffectName);
        }
        let duration = u32::try_from(duration)
            .ok()
            .filter(|d| *d >= 1)
            .ok_or(ValidationError::InvalidDuration(duration))?;

        self.effects.push(Effect {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            duration,
        });
        Ok(&self.effects[self.effects.len() - 1])
    }

    /// Remove an effect by id
    pub fn remove(&mut self, effect_id: &str) -> Option<Effect> {
        let pos = self.effects.iter().position(|e| e.id == effect_id)?;
        Some(self.effects.remove(pos))
    }

    /// Tick every effect at the start of the owner's turn.
    /// Returns the effects that expired.
    pub fn decay_on_turn_start(&mut self) -> Vec<Effect> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            effect.duration = effect.duration.saturating_sub(1);
            if effect.duration == 0 {
                expired.push(effect.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn get(&self, effect_id: &str) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == effect_id)
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }
}
