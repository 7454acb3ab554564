//! Save directory for roster snapshots.
//!
//! One JSON file per snapshot, named from the save instant:
//!
//! ```json
//! {
//!   "characters": [ { "id": "...", "name": "...", "type": "PLAYER", "ac": 18, "hp": 20, "maxHp": 20 } ],
//!   "monsters":   [ { "id": "...", "name": "...", "type": "MONSTER", "maxHp": 6, "ac": 15, "perception": 2 } ],
//!   "timestamp":  "2026-10-19T12:34:56.789Z",
//!   "version":    "1.0.0"
//! }
//! ```
//!
//! Writes go to a hidden temp file that is renamed into place, so a crash
//! never leaves a truncated snapshot. All operations on one store are
//! serialized behind an async mutex. Reads are lenient: a missing
//! collection loads as empty.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::instrument;

use super::error::SaveError;
use super::roster::{Character, Monster, Roster};

/// Format version written into every snapshot.
pub const SAVE_FORMAT_VERSION: &str = "1.0.0";

/// Highest snapshot major version this build can read.
const SUPPORTED_MAJOR: u64 = 1;

/// Subdirectory of the data directory that holds snapshots.
pub const SAVES_DIR: &str = "saves";

const SAVE_PREFIX: &str = "save-";
const SAVE_EXTENSION: &str = ".json";

pub type SaveResult<T> = std::result::Result<T, SaveError>;

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub characters: Vec<Character>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub monsters: Vec<Monster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A `null` collection reads the same as a missing one.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl SaveSnapshot {
    pub fn from_roster(roster: &Roster, timestamp: String) -> Self {
        Self {
            characters: roster.characters().cloned().collect(),
            monsters: roster.monsters().cloned().collect(),
            timestamp: Some(timestamp),
            version: Some(SAVE_FORMAT_VERSION.to_string()),
        }
    }

    pub fn into_roster(self) -> Roster {
        Roster::from_parts(self.characters, self.monsters)
    }

    fn check_version(&self, file: &str) -> SaveResult<()> {
        let Some(version) = self.version.as_deref() else {
            return Ok(());
        };
        let major = version
            .split('.')
            .next()
            .and_then(|m| m.trim().parse::<u64>().ok())
            .ok_or_else(|| SaveError::format(file, format!("unrecognized version '{version}'")))?;
        if major > SUPPORTED_MAJOR {
            return Err(SaveError::format(
                file,
                format!("version {version} is newer than supported {SAVE_FORMAT_VERSION}"),
            ));
        }
        Ok(())
    }
}

/// A snapshot read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub filename: String,
    pub snapshot: SaveSnapshot,
}

/// Directory entry for one snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub name: String,
    /// File modification time
    pub timestamp: DateTime<Utc>,
    pub size: u64,
}

/// Snapshot descriptors, newest first. Iterating does not consume the
/// listing, so it can be walked any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotListing {
    entries: Vec<SnapshotInfo>,
}

impl SnapshotListing {
    pub fn iter(&self) -> std::slice::Iter<'_, SnapshotInfo> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&SnapshotInfo> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SnapshotListing {
    type Item = &'a SnapshotInfo;
    type IntoIter = std::slice::Iter<'a, SnapshotInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for SnapshotListing {
    type Item = SnapshotInfo;
    type IntoIter = std::vec::IntoIter<SnapshotInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// `save-<ISO-8601 with ':' and '.' replaced by '-'>.json`
pub fn snapshot_filename(timestamp: &str) -> String {
    format!(
        "{SAVE_PREFIX}{}{SAVE_EXTENSION}",
        timestamp.replace([':', '.'], "-")
    )
}

// ============================================================================
// Save Store
// ============================================================================

#[derive(Debug)]
pub struct SaveStore {
    dir: PathBuf,
    io_lock: Mutex<()>,
}

impl SaveStore {
    /// Store rooted at `dir`; the directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Store at `<data_dir>/saves`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SAVES_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the roster to a new snapshot and return its filename.
    #[instrument(skip(self, roster), fields(dir = %self.dir.display()))]
    pub async fn save(&self, roster: &Roster) -> SaveResult<String> {
        let _guard = self.io_lock.lock().await;
        self.ensure_dir().await?;

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let filename = self.unused_filename(&timestamp).await;
        let snapshot = SaveSnapshot::from_roster(roster, timestamp);
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| SaveError::format(&filename, e.to_string()))?;

        write_atomic(&self.dir.join(&filename), content.as_bytes()).await?;

        tracing::info!(
            filename = %filename,
            characters = snapshot.characters.len(),
            monsters = snapshot.monsters.len(),
            "game state saved"
        );
        Ok(filename)
    }

    /// All snapshots, newest modification time first. A missing or empty
    /// directory yields an empty listing.
    pub async fn list_snapshots(&self) -> SaveResult<SnapshotListing> {
        let _guard = self.io_lock.lock().await;
        self.ensure_dir().await?;
        self.list_locked().await
    }

    /// Load the snapshot with the most recent modification time.
    pub async fn load_latest(&self) -> SaveResult<LoadedSnapshot> {
        let _guard = self.io_lock.lock().await;
        self.ensure_dir().await?;
        let listing = self.list_locked().await?;
        let latest = listing
            .latest()
            .ok_or_else(|| SaveError::NotFound("no save files found".to_string()))?;
        self.load_locked(&latest.name).await
    }

    pub async fn load_by_name(&self, filename: &str) -> SaveResult<LoadedSnapshot> {
        let _guard = self.io_lock.lock().await;
        self.load_locked(filename).await
    }

    pub async fn delete(&self, filename: &str) -> SaveResult<()> {
        let _guard = self.io_lock.lock().await;
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename = %filename, "save file deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SaveError::NotFound(filename.to_string()))
            }
            Err(e) => Err(SaveError::io(format!("deleting {filename}"), e)),
        }
    }

    // ------------------------------------------------------------------------
    // Internals (caller holds io_lock)
    // ------------------------------------------------------------------------

    async fn ensure_dir(&self) -> SaveResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SaveError::io(format!("creating save directory {}", self.dir.display()), e)
        })
    }

    async fn list_locked(&self) -> SaveResult<SnapshotListing> {
        let mut dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            SaveError::io(format!("reading save directory {}", self.dir.display()), e)
        })?;

        let mut entries = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(SaveError::io(
                        format!("reading save directory {}", self.dir.display()),
                        e,
                    ))
                }
            };
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.ends_with(SAVE_EXTENSION) || name.starts_with('.') {
                continue;
            }
            // Entries can vanish between read_dir and stat; skip them.
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));
            entries.push(SnapshotInfo {
                name,
                timestamp: modified,
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(SnapshotListing { entries })
    }

    async fn load_locked(&self, filename: &str) -> SaveResult<LoadedSnapshot> {
        let path = self.resolve(filename)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SaveError::NotFound(filename.to_string()))
            }
            Err(e) => return Err(SaveError::io(format!("reading {filename}"), e)),
        };

        let snapshot: SaveSnapshot = serde_json::from_str(&content)
            .map_err(|e| SaveError::format(filename, e.to_string()))?;
        snapshot.check_version(filename)?;

        tracing::info!(
            filename = %filename,
            characters = snapshot.characters.len(),
            monsters = snapshot.monsters.len(),
            "game state loaded"
        );
        Ok(LoadedSnapshot {
            filename: filename.to_string(),
            snapshot,
        })
    }

    /// Map a bare filename into the save directory. Anything that could
    /// escape the directory is reported as not found.
    fn resolve(&self, filename: &str) -> SaveResult<PathBuf> {
        let escapes = filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename == "."
            || filename == "..";
        if escapes {
            return Err(SaveError::NotFound(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }

    /// Filename for `timestamp`, with a numeric suffix if a save from the
    /// same millisecond already exists.
    async fn unused_filename(&self, timestamp: &str) -> String {
        let base = snapshot_filename(timestamp);
        if !path_exists(&self.dir.join(&base)).await {
            return base;
        }
        let stem = base.trim_end_matches(SAVE_EXTENSION);
        let mut counter = 1u32;
        loop {
            let candidate = format!("{stem}-{counter}{SAVE_EXTENSION}");
            if !path_exists(&self.dir.join(&candidate)).await {
                return candidate;
            }
            counter += 1;
        }
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Write to a hidden temp file beside `path`, fsync, then rename over.
async fn write_atomic(path: &Path, bytes: &[u8]) -> SaveResult<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("snapshot");
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let written = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(SaveError::io(format!("writing {}", temp_path.display()), e));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(SaveError::io(
            format!("renaming {} to {}", temp_path.display(), path.display()),
            e,
        ));
    }
    Ok(())
}
