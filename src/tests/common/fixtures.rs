//! Test Fixtures
//!
//! A small adventuring party, a goblin, and trackers backed by a
//! temporary save directory.

use std::time::Duration;

use tempfile::TempDir;

use crate::core::combat::{CombatSelection, ParticipantRef};
use crate::core::roster::{CharacterType, NewCharacter, NewMonster, Roster};
use crate::core::saves::SaveStore;
use crate::core::tracker::{CombatTracker, TrackerOptions};

pub const AUTO_END_DELAY: Duration = Duration::from_secs(2);

// =============================================================================
// Roster Fixtures
// =============================================================================

pub fn seelah() -> NewCharacter {
    NewCharacter {
        name: "Seelah".into(),
        kind: CharacterType::Player,
        ac: 18,
        hp: 20,
        max_hp: 20,
    }
}

pub fn valeros() -> NewCharacter {
    NewCharacter {
        name: "Valeros".into(),
        kind: CharacterType::Player,
        ac: 17,
        hp: 24,
        max_hp: 24,
    }
}

pub fn goblin() -> NewMonster {
    NewMonster {
        name: "Goblin".into(),
        max_hp: 6,
        ac: 15,
        perception: 2,
        ..Default::default()
    }
}

/// Roster ids for the party fixtures.
pub struct Party {
    pub seelah: String,
    pub valeros: String,
    pub goblin: String,
}

impl Party {
    /// Seelah at 15, two goblins sharing 14.
    pub fn skirmish(&self) -> CombatSelection {
        CombatSelection::new()
            .with_character(&self.seelah, 15)
            .with_monsters(&self.goblin, 2, Some(14))
    }

    pub fn goblin_copy(&self, instance: u32) -> ParticipantRef {
        ParticipantRef::monster(&self.goblin, instance)
    }
}

pub fn create_party_roster() -> (Roster, Party) {
    let mut roster = Roster::new();
    let party = Party {
        seelah: roster.add_character(seelah()),
        valeros: roster.add_character(valeros()),
        goblin: roster.add_monster(goblin()),
    };
    (roster, party)
}

// =============================================================================
// Tracker Fixtures
// =============================================================================

/// Tracker with an empty roster writing into a fresh temporary directory.
/// Keep the TempDir alive for the duration of the test.
pub fn create_test_tracker() -> (CombatTracker, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let tracker = CombatTracker::new(
        SaveStore::new(temp_dir.path()),
        TrackerOptions {
            auto_end_delay: AUTO_END_DELAY,
            clamp_healing_to_max: false,
        },
    );
    (tracker, temp_dir)
}

/// Tracker preloaded with the party fixtures.
pub async fn create_party_tracker() -> (CombatTracker, Party, TempDir) {
    let (tracker, temp_dir) = create_test_tracker();
    let party = Party {
        seelah: tracker.add_character(seelah()).await,
        valeros: tracker.add_character(valeros()).await,
        goblin: tracker.add_monster(goblin()).await,
    };
    (tracker, party, temp_dir)
}
