//! Initiative rolls for monster groups.
//!
//! Players roll their own initiative at the table and the GM types it in;
//! monsters roll `d20 + perception` once per group, and every copy of the
//! group shares the result.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::combat::CombatSelection;
use super::roster::{Monster, Roster};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitiativeRoll {
    /// Natural d20 result
    pub roll: i32,
    pub modifier: i32,
    pub total: i32,
}

pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(1..=20)
}

/// Roll initiative for a monster group: d20 plus the monster's perception.
pub fn roll_monster_initiative<R: Rng + ?Sized>(monster: &Monster, rng: &mut R) -> InitiativeRoll {
    let roll = roll_d20(rng);
    InitiativeRoll {
        roll,
        modifier: monster.perception,
        total: roll + monster.perception,
    }
}

/// Roll for every monster group in the selection.
///
/// With `reroll` false, groups that already carry an initiative keep it.
/// Groups whose monster is not in the roster are skipped.
pub fn roll_monster_groups<R: Rng + ?Sized>(
    selection: &mut CombatSelection,
    roster: &Roster,
    rng: &mut R,
    reroll: bool,
) -> Vec<(String, InitiativeRoll)> {
    let mut rolled = Vec::new();
    let ids: Vec<String> = selection
        .monsters
        .iter()
        .map(|group| group.monster_id.clone())
        .collect();

    for id in ids {
        if !reroll && selection.initiatives.contains_key(&id) {
            continue;
        }
        let Some(monster) = roster.monster(&id) else {
            continue;
        };
        let result = roll_monster_initiative(monster, rng);
        tracing::debug!(
            monster = %monster.name,
            roll = result.roll,
            total = result.total,
            "rolled group initiative"
        );
        selection.initiatives.insert(id.clone(), result.total);
        rolled.push((id, result));
    }
    rolled
}
