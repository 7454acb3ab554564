//! Property-based tests for effect decay
//!
//! Tests invariants:
//! - An effect of duration d is removed on exactly the d-th turn start of its owner
//! - Tracked effects always have at least one turn left

use proptest::prelude::*;

use crate::core::combat::{CombatSelection, CombatSession};
use crate::core::effects::EffectTracker;
use crate::core::roster::{NewCharacter, Roster};

fn start_party(initiatives: &[i32]) -> CombatSession {
    let mut roster = Roster::new();
    let mut selection = CombatSelection::new();
    for (i, initiative) in initiatives.iter().enumerate() {
        let id = roster.add_character(NewCharacter {
            name: format!("Hero {i}"),
            hp: 10,
            max_hp: 10,
            ..Default::default()
        });
        selection = selection.with_character(&id, *initiative);
    }
    let mut combat = CombatSession::new();
    combat
        .start(&roster, &selection)
        .expect("generated selection is valid");
    combat
}

proptest! {
    #[test]
    fn prop_effect_expires_on_exact_turn_start(
        initiatives in prop::collection::vec(0i32..20, 1..6),
        owner_index in any::<prop::sample::Index>(),
        duration in 1i32..8,
    ) {
        let mut combat = start_party(&initiatives);
        let owner = owner_index.get(combat.participants()).reference();
        let effect = combat
            .add_effect(&owner, "Haste", duration)
            .unwrap()
            .unwrap();

        let mut starts = 0;
        loop {
            let result = combat.next_turn().unwrap();
            if result.current != owner {
                prop_assert!(result.expired_effects.is_empty());
                continue;
            }
            starts += 1;
            let still_tracked = combat
                .participant(&owner)
                .unwrap()
                .effects
                .get(&effect.id)
                .is_some();

            if starts < duration {
                prop_assert!(still_tracked);
                prop_assert!(result.expired_effects.is_empty());
            } else {
                prop_assert!(!still_tracked);
                prop_assert_eq!(result.expired_effects.len(), 1);
                prop_assert_eq!(&result.expired_effects[0].id, &effect.id);
                break;
            }
        }
    }

    #[test]
    fn prop_tracked_durations_stay_positive(
        durations in prop::collection::vec(1i32..6, 0..6),
        ticks in 0usize..10,
    ) {
        let mut tracker = EffectTracker::new();
        for (i, duration) in durations.iter().enumerate() {
            tracker.add(&format!("Effect {i}"), *duration).unwrap();
        }
        for _ in 0..ticks {
            tracker.decay_on_turn_start();
            prop_assert!(tracker.effects().iter().all(|e| e.duration >= 1));
        }
        let expected = durations.iter().filter(|d| **d as usize > ticks).count();
        prop_assert_eq!(tracker.len(), expected);
    }
}
