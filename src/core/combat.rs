//! Combat Session
//!
//! Turn-based encounter state: participants snapshotted from the roster,
//! initiative order, the current-turn pointer, HP changes and effect decay.
//!
//! Phases: Setup → Active → Ended → (end) → Setup. `Ended` is derived from
//! state on every read: at least one participant and no monster left
//! standing. Scheduling the automatic reset lives in the tracker.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::effects::{Effect, EffectTracker};
use super::error::ValidationError;
use super::roster::{CharacterPatch, Roster};

// ============================================================================
// Participants
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipantKind {
    Character,
    Monster,
}

/// Addresses one participant: the roster id plus, for spawned monster
/// copies, the instance index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRef {
    pub source_id: String,
    pub instance: Option<u32>,
}

impl ParticipantRef {
    pub fn character(id: impl Into<String>) -> Self {
        Self {
            source_id: id.into(),
            instance: None,
        }
    }

    pub fn monster(id: impl Into<String>, instance: u32) -> Self {
        Self {
            source_id: id.into(),
            instance: Some(instance),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombatParticipant {
    pub source_id: String,
    pub name: String,
    pub kind: ParticipantKind,
    pub instance: Option<u32>,
    pub initiative: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: i32,
    pub effects: EffectTracker,
    /// Selection order, used to break initiative ties.
    #[serde(skip)]
    seq: usize,
}

impl CombatParticipant {
    pub fn reference(&self) -> ParticipantRef {
        ParticipantRef {
            source_id: self.source_id.clone(),
            instance: self.instance,
        }
    }

    pub fn matches(&self, target: &ParticipantRef) -> bool {
        self.source_id == target.source_id && self.instance == target.instance
    }

    /// Name with the instance number appended for monster copies.
    pub fn display_name(&self) -> String {
        match self.instance {
            Some(index) => format!("{} ({})", self.name, index + 1),
            None => self.name.clone(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }
}

// ============================================================================
// Selection
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonsterGroup {
    pub monster_id: String,
    pub count: u32,
}

/// What the GM picked for an encounter: characters, monster groups with
/// copy counts, and initiative per character id and per monster id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombatSelection {
    pub characters: Vec<String>,
    pub monsters: Vec<MonsterGroup>,
    pub initiatives: HashMap<String, i32>,
}

impl CombatSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(mut self, id: &str, initiative: i32) -> Self {
        self.characters.push(id.to_string());
        self.initiatives.insert(id.to_string(), initiative);
        self
    }

    /// Add a monster group. A `None` initiative can be filled in later by
    /// [`roll_monster_groups`](super::initiative::roll_monster_groups).
    pub fn with_monsters(mut self, id: &str, count: u32, initiative: Option<i32>) -> Self {
        self.monsters.push(MonsterGroup {
            monster_id: id.to_string(),
            count,
        });
        if let Some(initiative) = initiative {
            self.initiatives.insert(id.to_string(), initiative);
        }
        self
    }

    /// True when there are no characters and no monster group with copies.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.monsters.iter().all(|g| g.count == 0)
    }
}

// ============================================================================
// Events & results
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CombatPhase {
    Setup,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpChange {
    Delta(i32),
    Set(i32),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CombatEventType {
    CombatStarted,
    TurnStarted,
    Damage,
    Healing,
    InitiativeChanged,
    EffectApplied,
    EffectRemoved,
    EffectExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEvent {
    pub round: u32,
    pub turn: usize,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub event_type: CombatEventType,
    pub description: String,
}

/// Result of advancing a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub current: ParticipantRef,
    pub new_round: bool,
    pub expired_effects: Vec<Effect>,
}

/// What `end` wrote back to the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombatSummary {
    pub rounds: u32,
    pub participants: usize,
    /// (character id, hp written back)
    pub character_hp: Vec<(String, i32)>,
}

// ============================================================================
// Combat Session
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CombatSession {
    participants: Vec<CombatParticipant>,
    current_turn: usize,
    round: u32,
    started_at: Option<DateTime<Utc>>,
    events: Vec<CombatEvent>,
    #[serde(skip)]
    clamp_healing_to_max: bool,
}

impl Default for CombatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatSession {
    pub fn new() -> Self {
        Self {
            participants: Vec::new(),
            current_turn: 0,
            round: 1,
            started_at: None,
            events: Vec::new(),
            clamp_healing_to_max: false,
        }
    }

    /// Cap healed HP at max HP. Off by default: HP may rise above max.
    pub fn with_healing_ceiling(mut self, enabled: bool) -> Self {
        self.clamp_healing_to_max = enabled;
        self
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Build the participant list from the roster and enter `Active`.
    ///
    /// Characters keep their current HP; monster copies start at max HP and
    /// share the group initiative (0 when none was supplied). Unknown roster
    /// ids are skipped.
    pub fn start(&mut self, roster: &Roster, selection: &CombatSelection) -> Result<(), ValidationError> {
        if self.is_active() {
            return Err(ValidationError::CombatAlreadyActive);
        }
        if selection.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        if let Some(missing) = selection
            .characters
            .iter()
            .find(|id| !selection.initiatives.contains_key(*id))
        {
            return Err(ValidationError::MissingInitiative(missing.clone()));
        }

        let mut participants = Vec::new();

        for id in &selection.characters {
            let Some(character) = roster.character(id) else {
                tracing::warn!(character_id = %id, "selected character not in roster, skipping");
                continue;
            };
            participants.push(CombatParticipant {
                source_id: character.id.clone(),
                name: character.name.clone(),
                kind: ParticipantKind::Character,
                instance: None,
                initiative: selection.initiatives[id],
                hp: character.hp,
                max_hp: character.max_hp,
                ac: character.ac,
                effects: EffectTracker::new(),
                seq: participants.len(),
            });
        }

        for group in &selection.monsters {
            let Some(monster) = roster.monster(&group.monster_id) else {
                tracing::warn!(monster_id = %group.monster_id, "selected monster not in roster, skipping");
                continue;
            };
            let initiative = selection
                .initiatives
                .get(&group.monster_id)
                .copied()
                .unwrap_or(0);
            for index in 0..group.count {
                participants.push(CombatParticipant {
                    source_id: monster.id.clone(),
                    name: monster.name.clone(),
                    kind: ParticipantKind::Monster,
                    instance: Some(index),
                    initiative,
                    hp: monster.max_hp,
                    max_hp: monster.max_hp,
                    ac: monster.ac,
                    effects: EffectTracker::new(),
                    seq: participants.len(),
                });
            }
        }

        if participants.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        self.participants = participants;
        self.current_turn = 0;
        self.round = 1;
        self.started_at = Some(Utc::now());
        self.events.clear();
        self.sort_initiative();

        tracing::info!(participants = self.participants.len(), "combat started");
        let first = self.participants[0].display_name();
        self.log_event(first, CombatEventType::CombatStarted, "Combat started");
        Ok(())
    }

    /// Write character HP back to the roster and return to `Setup`.
    /// Monster HP is discarded. Returns `None` when no combat was running.
    pub fn end(&mut self, roster: &mut Roster) -> Option<CombatSummary> {
        if !self.is_active() {
            return None;
        }

        let mut character_hp = Vec::new();
        for participant in &self.participants {
            if participant.kind == ParticipantKind::Character {
                roster.edit_character(&participant.source_id, CharacterPatch::hp(participant.hp));
                character_hp.push((participant.source_id.clone(), participant.hp));
            }
        }

        let summary = CombatSummary {
            rounds: self.round,
            participants: self.participants.len(),
            character_hp,
        };

        self.participants.clear();
        self.current_turn = 0;
        self.round = 1;
        self.started_at = None;
        self.events.clear();

        tracing::info!(rounds = summary.rounds, "combat ended");
        Some(summary)
    }

    // ------------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        !self.participants.is_empty()
    }

    /// Encounter-end condition, recomputed from state on every call.
    /// A combat with no monsters counts as ended.
    pub fn is_ended(&self) -> bool {
        self.is_active()
            && self
                .participants
                .iter()
                .filter(|p| p.kind == ParticipantKind::Monster)
                .all(CombatParticipant::is_down)
    }

    pub fn phase(&self) -> CombatPhase {
        if !self.is_active() {
            CombatPhase::Setup
        } else if self.is_ended() {
            CombatPhase::Ended
        } else {
            CombatPhase::Active
        }
    }

    /// Participants in turn order (descending initiative).
    pub fn participants(&self) -> &[CombatParticipant] {
        &self.participants
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn current_participant(&self) -> Option<&CombatParticipant> {
        self.participants.get(self.current_turn)
    }

    /// References in the order turns are taken, starting with the current one.
    pub fn turn_order(&self) -> Vec<ParticipantRef> {
        let len = self.participants.len();
        (0..len)
            .map(|offset| self.participants[(self.current_turn + offset) % len].reference())
            .collect()
    }

    pub fn participant(&self, target: &ParticipantRef) -> Option<&CombatParticipant> {
        self.participants.iter().find(|p| p.matches(target))
    }

    fn participant_mut(&mut self, target: &ParticipantRef) -> Option<&mut CombatParticipant> {
        self.participants.iter_mut().find(|p| p.matches(target))
    }

    // ------------------------------------------------------------------------
    // Turn order
    // ------------------------------------------------------------------------

    /// Highest initiative first; ties keep selection order.
    fn sort_initiative(&mut self) {
        self.participants.sort_by(|a, b| {
            b.initiative
                .cmp(&a.initiative)
                .then_with(|| a.seq.cmp(&b.seq))
        });
    }

    /// Change a participant's initiative. The participant whose turn it is
    /// keeps the turn after the re-sort. Returns false for unknown refs.
    pub fn set_initiative(&mut self, target: &ParticipantRef, initiative: i32) -> bool {
        let current_seq = self.current_participant().map(|p| p.seq);
        let Some(participant) = self.participant_mut(target) else {
            return false;
        };
        participant.initiative = initiative;
        let actor = participant.display_name();

        self.sort_initiative();
        if let Some(seq) = current_seq {
            if let Some(pos) = self.participants.iter().position(|p| p.seq == seq) {
                self.current_turn = pos;
            }
        }
        self.log_event(
            actor.clone(),
            CombatEventType::InitiativeChanged,
            format!("{} initiative set to {}", actor, initiative),
        );
        true
    }

    /// Advance to the next participant and decay the effects of the one
    /// whose turn is starting. Returns `None` without participants.
    pub fn next_turn(&mut self) -> Option<TurnResult> {
        if self.participants.is_empty() {
            return None;
        }

        self.sort_initiative();
        self.current_turn = (self.current_turn + 1) % self.participants.len();
        let new_round = self.current_turn == 0;
        if new_round {
            self.round += 1;
        }

        let participant = &mut self.participants[self.current_turn];
        let expired_effects = participant.effects.decay_on_turn_start();
        let current = participant.reference();
        let actor = participant.display_name();

        self.log_event(
            actor.clone(),
            CombatEventType::TurnStarted,
            format!("{}'s turn", actor),
        );
        for effect in &expired_effects {
            self.log_event(
                actor.clone(),
                CombatEventType::EffectExpired,
                format!("{} expired on {}", effect.name, actor),
            );
        }

        Some(TurnResult {
            current,
            new_round,
            expired_effects,
        })
    }

    /// Step the pointer back one participant. No effect decay runs.
    pub fn previous_turn(&mut self) -> Option<ParticipantRef> {
        if self.participants.is_empty() {
            return None;
        }

        if self.current_turn == 0 {
            self.current_turn = self.participants.len() - 1;
            self.round = self.round.saturating_sub(1).max(1);
        } else {
            self.current_turn -= 1;
        }
        self.current_participant().map(CombatParticipant::reference)
    }

    // ------------------------------------------------------------------------
    // HP
    // ------------------------------------------------------------------------

    /// Apply an HP change. The result never drops below 0. Returns the new HP,
    /// or `None` for an unknown participant.
    pub fn modify_hp(&mut self, target: &ParticipantRef, change: HpChange) -> Option<i32> {
        let clamp_to_max = self.clamp_healing_to_max;
        let participant = self.participant_mut(target)?;
        let before = participant.hp;

        let mut hp = match change {
            HpChange::Delta(delta) => before.saturating_add(delta),
            HpChange::Set(value) => value,
        };
        if clamp_to_max && hp > before {
            hp = hp.min(participant.max_hp.max(before));
        }
        participant.hp = hp.max(0);

        let after = participant.hp;
        let actor = participant.display_name();
        if after < before {
            self.log_event(
                actor.clone(),
                CombatEventType::Damage,
                format!("{} takes {} damage", actor, before - after),
            );
        } else if after > before {
            self.log_event(
                actor.clone(),
                CombatEventType::Healing,
                format!("{} heals {} HP", actor, after - before),
            );
        }
        Some(after)
    }

    // ------------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------------

    /// Attach an effect. Input is validated before the participant lookup;
    /// an unknown participant yields `Ok(None)`.
    pub fn add_effect(
        &mut self,
        target: &ParticipantRef,
        name: &str,
        duration: i32,
    ) -> Result<Option<Effect>, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyEffectName);
        }
        if duration < 1 {
            return Err(ValidationError::InvalidDuration(duration));
        }
        let Some(participant) = self.participant_mut(target) else {
            return Ok(None);
        };
        let effect = participant.effects.add(name, duration)?.clone();
        let actor = participant.display_name();

        self.log_event(
            actor.clone(),
            CombatEventType::EffectApplied,
            format!("{} gains {} ({} turns)", actor, effect.name, effect.duration),
        );
        Ok(Some(effect))
    }

    pub fn remove_effect(&mut self, target: &ParticipantRef, effect_id: &str) -> Option<Effect> {
        let participant = self.participant_mut(target)?;
        let removed = participant.effects.remove(effect_id)?;
        let actor = participant.display_name();

        self.log_event(
            actor.clone(),
            CombatEventType::EffectRemoved,
            format!("{} loses {}", actor, removed.name),
        );
        Some(removed)
    }

    fn log_event(
        &mut self,
        actor: impl Into<String>,
        event_type: CombatEventType,
        description: impl Into<String>,
    ) {
        self.events.push(CombatEvent {
            round: self.round,
            turn: self.current_turn,
            timestamp: Utc::now(),
            actor: actor.into(),
            event_type,
            description: description.into(),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
