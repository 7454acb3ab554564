//! Roster Store
//!
//! Persistent collections of player characters and monsters. Entries are
//! addressed by a generated identifier; edits merge a patch into an existing
//! entry and unknown identifiers are silently ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Characters
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CharacterType {
    #[default]
    Player,
    Npc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CharacterType,
    pub ac: i32,
    pub hp: i32,
    pub max_hp: i32,
}

/// Character fields supplied by the caller; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCharacter {
    pub name: String,
    pub kind: CharacterType,
    pub ac: i32,
    pub hp: i32,
    pub max_hp: i32,
}

/// Partial update for a character. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub kind: Option<CharacterType>,
    pub ac: Option<i32>,
    pub hp: Option<i32>,
    pub max_hp: Option<i32>,
}

impl CharacterPatch {
    pub fn hp(hp: i32) -> Self {
        Self {
            hp: Some(hp),
            ..Self::default()
        }
    }

    fn apply(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name;
        }
        if let Some(kind) = self.kind {
            character.kind = kind;
        }
        if let Some(ac) = self.ac {
            character.ac = ac;
        }
        if let Some(hp) = self.hp {
            character.hp = hp;
        }
        if let Some(max_hp) = self.max_hp {
            character.max_hp = max_hp;
        }
    }
}

// ============================================================================
// Monsters
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonsterType {
    #[default]
    Monster,
    Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MonsterType,
    pub max_hp: i32,
    pub ac: i32,
    /// Initiative bonus; may be negative.
    pub perception: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMonster {
    pub name: String,
    pub kind: MonsterType,
    pub max_hp: i32,
    pub ac: i32,
    pub perception: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonsterPatch {
    pub name: Option<String>,
    pub kind: Option<MonsterType>,
    pub max_hp: Option<i32>,
    pub ac: Option<i32>,
    pub perception: Option<i32>,
}

impl MonsterPatch {
    fn apply(self, monster: &mut Monster) {
        if let Some(name) = self.name {
            monster.name = name;
        }
        if let Some(kind) = self.kind {
            monster.kind = kind;
        }
        if let Some(max_hp) = self.max_hp {
            monster.max_hp = max_hp;
        }
        if let Some(ac) = self.ac {
            monster.ac = ac;
        }
        if let Some(perception) = self.perception {
            monster.perception = perception;
        }
    }
}

// ============================================================================
// Roster
// ============================================================================

/// Characters and monsters keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    characters: IndexMap<String, Character>,
    monsters: IndexMap<String, Monster>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a roster from persisted collections, keeping their identifiers.
    /// A later duplicate id replaces the earlier entry, with a warning.
    pub fn from_parts(
        characters: impl IntoIterator<Item = Character>,
        monsters: impl IntoIterator<Item = Monster>,
    ) -> Self {
        let mut roster = Self::new();
        for character in characters {
            if let Some(replaced) = roster.characters.insert(character.id.clone(), character) {
                tracing::warn!(
                    character_id = %replaced.id,
                    name = %replaced.name,
                    "duplicate character id, earlier entry dropped"
                );
            }
        }
        for monster in monsters {
            if let Some(replaced) = roster.monsters.insert(monster.id.clone(), monster) {
                tracing::warn!(
                    monster_id = %replaced.id,
                    name = %replaced.name,
                    "duplicate monster id, earlier entry dropped"
                );
            }
        }
        roster
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.monsters.is_empty()
    }

    // ------------------------------------------------------------------------
    // Characters
    // ------------------------------------------------------------------------

    /// Insert a character under a fresh identifier and return it.
    pub fn add_character(&mut self, new: NewCharacter) -> String {
        let id = Uuid::new_v4().to_string();
        let character = Character {
            id: id.clone(),
            name: new.name,
            kind: new.kind,
            ac: new.ac,
            hp: new.hp,
            max_hp: new.max_hp,
        };
        tracing::debug!(character_id = %id, name = %character.name, "character added");
        self.characters.insert(id.clone(), character);
        id
    }

    /// Merge `patch` into the character. Returns false when the id is unknown.
    pub fn edit_character(&mut self, id: &str, patch: CharacterPatch) -> bool {
        match self.characters.get_mut(id) {
            Some(character) => {
                patch.apply(character);
                true
            }
            None => false,
        }
    }

    pub fn delete_character(&mut self, id: &str) -> Option<Character> {
        self.characters.shift_remove(id)
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    // ------------------------------------------------------------------------
    // Monsters
    // ------------------------------------------------------------------------

    pub fn add_monster(&mut self, new: NewMonster) -> String {
        let id = Uuid::new_v4().to_string();
        let monster = Monster {
            id: id.clone(),
            name: new.name,
            kind: new.kind,
            max_hp: new.max_hp,
            ac: new.ac,
            perception: new.perception,
        };
        tracing::debug!(monster_id = %id, name = %monster.name, "monster added");
        self.monsters.insert(id.clone(), monster);
        id
    }

    pub fn edit_monster(&mut self, id: &str, patch: MonsterPatch) -> bool {
        match self.monsters.get_mut(id) {
            Some(monster) => {
                patch.apply(monster);
                true
            }
            None => false,
        }
    }

    pub fn delete_monster(&mut self, id: &str) -> Option<Monster> {
        self.monsters.shift_remove(id)
    }

    pub fn monster(&self, id: &str) -> Option<&Monster> {
        self.monsters.get(id)
    }

    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }
}
