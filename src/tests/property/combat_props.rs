//! Property-based tests for the combat session
//!
//! Tests invariants:
//! - Turn order is circular
//! - HP is never negative
//! - The end condition tracks monster HP exactly

use proptest::prelude::*;

use crate::core::combat::{CombatSelection, CombatSession, HpChange, ParticipantKind};
use crate::core::roster::{NewCharacter, NewMonster, Roster};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// (character initiatives, monster groups as (copies, initiative))
fn arb_encounter() -> impl Strategy<Value = (Vec<i32>, Vec<(u32, i32)>)> {
    (
        prop::collection::vec(-5i32..30, 0..5),
        prop::collection::vec((1u32..4, -5i32..30), 0..4),
    )
        .prop_filter("needs at least one participant", |(chars, groups)| {
            !chars.is_empty() || !groups.is_empty()
        })
}

fn arb_hp_change() -> impl Strategy<Value = HpChange> {
    prop_oneof![
        (-1000i32..1000).prop_map(HpChange::Delta),
        (-100i32..100).prop_map(HpChange::Set),
    ]
}

fn start_encounter(characters: &[i32], groups: &[(u32, i32)]) -> CombatSession {
    let mut roster = Roster::new();
    let mut selection = CombatSelection::new();

    for (i, initiative) in characters.iter().enumerate() {
        let id = roster.add_character(NewCharacter {
            name: format!("Hero {i}"),
            hp: 20,
            max_hp: 20,
            ..Default::default()
        });
        selection = selection.with_character(&id, *initiative);
    }
    for (i, (copies, initiative)) in groups.iter().enumerate() {
        let id = roster.add_monster(NewMonster {
            name: format!("Monster {i}"),
            max_hp: 8,
            ..Default::default()
        });
        selection = selection.with_monsters(&id, *copies, Some(*initiative));
    }

    let mut combat = CombatSession::new();
    combat
        .start(&roster, &selection)
        .expect("generated selection is valid");
    combat
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_next_turn_is_circular((characters, groups) in arb_encounter()) {
        let mut combat = start_encounter(&characters, &groups);
        let n = combat.participants().len();
        let first = combat.current_participant().map(|p| p.reference());

        for _ in 0..n {
            combat.next_turn();
        }

        prop_assert_eq!(combat.current_turn(), 0);
        prop_assert_eq!(combat.current_participant().map(|p| p.reference()), first);
        prop_assert_eq!(combat.round(), 2);
    }

    #[test]
    fn prop_initiative_is_descending((characters, groups) in arb_encounter()) {
        let combat = start_encounter(&characters, &groups);
        let initiatives: Vec<i32> = combat.participants().iter().map(|p| p.initiative).collect();
        prop_assert!(initiatives.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prop_hp_never_negative(
        (characters, groups) in arb_encounter(),
        changes in prop::collection::vec((any::<prop::sample::Index>(), arb_hp_change()), 1..40),
    ) {
        let mut combat = start_encounter(&characters, &groups);
        let refs: Vec<_> = combat.participants().iter().map(|p| p.reference()).collect();

        for (index, change) in changes {
            let target = index.get(&refs);
            let hp = combat.modify_hp(target, change);
            prop_assert!(hp.is_some_and(|hp| hp >= 0));
        }
        prop_assert!(combat.participants().iter().all(|p| p.hp >= 0));
    }

    #[test]
    fn prop_ended_iff_all_monsters_down(
        (characters, groups) in arb_encounter(),
        changes in prop::collection::vec((any::<prop::sample::Index>(), arb_hp_change()), 0..30),
    ) {
        let mut combat = start_encounter(&characters, &groups);
        let refs: Vec<_> = combat.participants().iter().map(|p| p.reference()).collect();

        for (index, change) in changes {
            combat.modify_hp(index.get(&refs), change);
            let all_down = combat
                .participants()
                .iter()
                .filter(|p| p.kind == ParticipantKind::Monster)
                .all(|p| p.hp <= 0);
            prop_assert_eq!(combat.is_ended(), all_down);
        }
    }
}
