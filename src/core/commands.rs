//! Persistence commands for the UI layer.
//!
//! Each command awaits the tracker and folds any error into a
//! [`CommandResult`], which serializes as
//! `{"success": true, ...payload}` or `{"success": false, "error": "..."}`.

use serde::Serialize;

use super::error::Error;
use super::roster::{Character, Monster};
use super::saves::{LoadedSnapshot, SnapshotInfo};
use super::tracker::CombatTracker;

/// Outcome of a UI command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult<T> {
    Ok(T),
    Err(String),
}

impl<T> CommandResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Err(message) => Some(message),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(message) => Err(message),
        }
    }
}

impl<T> From<Result<T, Error>> for CommandResult<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => {
                tracing::warn!(error = %err, "command failed");
                Self::Err(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    payload: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<T: Serialize> Serialize for CommandResult<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Ok(payload) => Envelope {
                success: true,
                payload: Some(payload),
                error: None,
            },
            Self::Err(message) => Envelope {
                success: false,
                payload: None,
                error: Some(message.as_str()),
            },
        };
        envelope.serialize(serializer)
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedGame {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterData {
    pub characters: Vec<Character>,
    pub monsters: Vec<Monster>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameData {
    pub data: RosterData,
    pub filename: String,
}

impl From<LoadedSnapshot> for GameData {
    fn from(loaded: LoadedSnapshot) -> Self {
        Self {
            data: RosterData {
                characters: loaded.snapshot.characters,
                monsters: loaded.snapshot.monsters,
            },
            filename: loaded.filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFiles {
    pub files: Vec<SnapshotInfo>,
}

// ============================================================================
// Commands
// ============================================================================

/// Write the tracker's current roster to a new snapshot.
pub async fn save_game_state(tracker: &CombatTracker) -> CommandResult<SavedGame> {
    tracker
        .save()
        .await
        .map(|filename| SavedGame { filename })
        .into()
}

/// Load the newest snapshot into the tracker.
pub async fn load_game_state(tracker: &CombatTracker) -> CommandResult<GameData> {
    tracker.load_latest().await.map(GameData::from).into()
}

pub async fn list_save_files(tracker: &CombatTracker) -> CommandResult<SaveFiles> {
    tracker
        .list_saves()
        .await
        .map(|listing| SaveFiles {
            files: listing.into_iter().collect(),
        })
        .into()
}

/// Load a named snapshot into the tracker.
pub async fn load_save_file(tracker: &CombatTracker, filename: &str) -> CommandResult<GameData> {
    tracker.load_save(filename).await.map(GameData::from).into()
}

pub async fn delete_save_file(tracker: &CombatTracker, filename: &str) -> CommandResult<()> {
    tracker.delete_save(filename).await.into()
}
