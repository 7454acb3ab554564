//! Application session
//!
//! One `CombatTracker` per process owns the roster, the combat session and
//! the save directory. The presentation layer holds a clone and calls the
//! methods below; every call is a short critical section on one async mutex.
//!
//! When an encounter reaches its end condition the tracker schedules an
//! automatic reset after the configured delay. Any later combat command
//! cancels that task and, if the condition still holds, schedules a fresh
//! one. The task also checks a revision counter before acting, so a timer
//! from an older state never touches a newer one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::config::AppConfig;

use super::combat::{
    CombatPhase, CombatSelection, CombatSession, CombatSummary, HpChange, ParticipantRef,
    TurnResult,
};
use super::effects::Effect;
use super::error::Result;
use super::roster::{CharacterPatch, MonsterPatch, NewCharacter, NewMonster, Roster};
use super::saves::{LoadedSnapshot, SaveStore, SnapshotListing};

const EVENT_CAPACITY: usize = 64;

/// Change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    RosterReplaced { filename: String },
    CombatStarted { participants: usize },
    TurnAdvanced { current: ParticipantRef, round: u32 },
    /// The end condition became true; a reset is pending.
    EncounterEnded,
    CombatReset { summary: CombatSummary, automatic: bool },
}

#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub auto_end_delay: Duration,
    pub clamp_healing_to_max: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            auto_end_delay: Duration::from_secs(2),
            clamp_healing_to_max: false,
        }
    }
}

impl From<&AppConfig> for TrackerOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            auto_end_delay: config.combat.auto_end_delay(),
            clamp_healing_to_max: config.combat.clamp_healing_to_max,
        }
    }
}

struct TrackerState {
    roster: Roster,
    combat: CombatSession,
    /// Bumped on every combat command and on reset.
    revision: u64,
    pending_auto_end: Option<JoinHandle<()>>,
}

impl TrackerState {
    fn cancel_auto_end(&mut self) {
        if let Some(handle) = self.pending_auto_end.take() {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct CombatTracker {
    state: Arc<Mutex<TrackerState>>,
    saves: Arc<SaveStore>,
    events: broadcast::Sender<TrackerEvent>,
    auto_end_delay: Duration,
}

impl CombatTracker {
    pub fn new(saves: SaveStore, options: TrackerOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                roster: Roster::new(),
                combat: CombatSession::new().with_healing_ceiling(options.clamp_healing_to_max),
                revision: 0,
                pending_auto_end: None,
            })),
            saves: Arc::new(saves),
            events,
            auto_end_delay: options.auto_end_delay,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(SaveStore::new(config.saves_dir()), TrackerOptions::from(config))
    }

    /// Restore the most recent snapshot. No snapshot at all is not an
    /// error: the tracker keeps its empty roster and returns `None`.
    pub async fn bootstrap(&self) -> Result<Option<String>> {
        match self.saves.load_latest().await {
            Ok(loaded) => {
                let filename = loaded.filename.clone();
                self.replace_roster(loaded).await;
                Ok(Some(filename))
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("No save file found, starting with empty roster");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub fn saves(&self) -> &SaveStore {
        &self.saves
    }

    fn notify(&self, event: TrackerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub async fn roster(&self) -> Roster {
        self.state.lock().await.roster.clone()
    }

    pub async fn combat(&self) -> CombatSession {
        self.state.lock().await.combat.clone()
    }

    pub async fn phase(&self) -> CombatPhase {
        self.state.lock().await.combat.phase()
    }

    // ========================================================================
    // Roster
    // ========================================================================

    pub async fn add_character(&self, character: NewCharacter) -> String {
        self.state.lock().await.roster.add_character(character)
    }

    pub async fn edit_character(&self, id: &str, patch: CharacterPatch) -> bool {
        self.state.lock().await.roster.edit_character(id, patch)
    }

    pub async fn delete_character(&self, id: &str) -> bool {
        self.state.lock().await.roster.delete_character(id).is_some()
    }

    pub async fn add_monster(&self, monster: NewMonster) -> String {
        self.state.lock().await.roster.add_monster(monster)
    }

    pub async fn edit_monster(&self, id: &str, patch: MonsterPatch) -> bool {
        self.state.lock().await.roster.edit_monster(id, patch)
    }

    pub async fn delete_monster(&self, id: &str) -> bool {
        self.state.lock().await.roster.delete_monster(id).is_some()
    }

    // ========================================================================
    // Combat
    // ========================================================================

    pub async fn start_combat(&self, selection: &CombatSelection) -> Result<()> {
        let participants = self
            .with_combat(|combat, roster| {
                combat.start(roster, selection)?;
                Ok::<_, super::error::ValidationError>(combat.participants().len())
            })
            .await?;
        self.notify(TrackerEvent::CombatStarted { participants });
        Ok(())
    }

    pub async fn next_turn(&self) -> Option<TurnResult> {
        let (result, round) = self
            .with_combat(|combat, _| {
                let result = combat.next_turn();
                (result, combat.round())
            })
            .await;
        if let Some(result) = &result {
            self.notify(TrackerEvent::TurnAdvanced {
                current: result.current.clone(),
                round,
            });
        }
        result
    }

    pub async fn previous_turn(&self) -> Option<ParticipantRef> {
        let (current, round) = self
            .with_combat(|combat, _| (combat.previous_turn(), combat.round()))
            .await;
        if let Some(current) = &current {
            self.notify(TrackerEvent::TurnAdvanced {
                current: current.clone(),
                round,
            });
        }
        current
    }

    pub async fn modify_hp(&self, target: &ParticipantRef, change: HpChange) -> Option<i32> {
        self.with_combat(|combat, _| combat.modify_hp(target, change))
            .await
    }

    pub async fn set_initiative(&self, target: &ParticipantRef, initiative: i32) -> bool {
        self.with_combat(|combat, _| combat.set_initiative(target, initiative))
            .await
    }

    pub async fn add_effect(
        &self,
        target: &ParticipantRef,
        name: &str,
        duration: i32,
    ) -> Result<Option<Effect>> {
        Ok(self
            .with_combat(|combat, _| combat.add_effect(target, name, duration))
            .await?)
    }

    pub async fn remove_effect(&self, target: &ParticipantRef, effect_id: &str) -> Option<Effect> {
        self.with_combat(|combat, _| combat.remove_effect(target, effect_id))
            .await
    }

    /// End the encounter now, cancelling any pending automatic reset.
    pub async fn end_combat(&self) -> Option<CombatSummary> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.cancel_auto_end();
        state.revision += 1;
        let summary = state.combat.end(&mut state.roster)?;
        drop(guard);

        self.notify(TrackerEvent::CombatReset {
            summary: summary.clone(),
            automatic: false,
        });
        Some(summary)
    }

    /// Run a combat command, then re-evaluate the end condition and
    /// (re)schedule or cancel the automatic reset.
    async fn with_combat<R>(&self, f: impl FnOnce(&mut CombatSession, &mut Roster) -> R) -> R {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let was_ended = state.combat.is_ended();

        let result = f(&mut state.combat, &mut state.roster);

        state.revision += 1;
        state.cancel_auto_end();
        let ended = state.combat.is_ended();
        if ended {
            let revision = state.revision;
            let tracker = self.clone();
            state.pending_auto_end = Some(tokio::spawn(async move {
                tracker.auto_end(revision).await;
            }));
        }
        drop(guard);

        if ended && !was_ended {
            tracing::info!(delay_ms = self.auto_end_delay.as_millis() as u64, "encounter ended, reset scheduled");
            self.notify(TrackerEvent::EncounterEnded);
        }
        result
    }

    async fn auto_end(self, revision: u64) {
        tokio::time::sleep(self.auto_end_delay).await;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.revision != revision || !state.combat.is_ended() {
            tracing::debug!(revision, "stale auto-end timer ignored");
            return;
        }
        state.pending_auto_end = None;
        state.revision += 1;
        let Some(summary) = state.combat.end(&mut state.roster) else {
            return;
        };
        drop(guard);

        tracing::info!(rounds = summary.rounds, "combat reset automatically");
        self.notify(TrackerEvent::CombatReset {
            summary,
            automatic: true,
        });
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Snapshot the current roster to a new save file.
    pub async fn save(&self) -> Result<String> {
        let roster = self.roster().await;
        Ok(self.saves.save(&roster).await?)
    }

    pub async fn load_latest(&self) -> Result<LoadedSnapshot> {
        let loaded = self.saves.load_latest().await?;
        self.replace_roster(loaded.clone()).await;
        Ok(loaded)
    }

    pub async fn load_save(&self, filename: &str) -> Result<LoadedSnapshot> {
        let loaded = self.saves.load_by_name(filename).await?;
        self.replace_roster(loaded.clone()).await;
        Ok(loaded)
    }

    pub async fn list_saves(&self) -> Result<SnapshotListing> {
        Ok(self.saves.list_snapshots().await?)
    }

    pub async fn delete_save(&self, filename: &str) -> Result<()> {
        Ok(self.saves.delete(filename).await?)
    }

    async fn replace_roster(&self, loaded: LoadedSnapshot) {
        let filename = loaded.filename;
        self.state.lock().await.roster = loaded.snapshot.into_roster();
        self.notify(TrackerEvent::RosterReplaced { filename });
    }
}
