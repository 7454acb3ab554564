//! Encounter flows driven through the tracker.

use rstest::rstest;

use crate::core::combat::{CombatPhase, CombatSelection, CombatSession, HpChange, ParticipantRef};
use crate::core::error::{Error, ValidationError};
use crate::core::roster::CharacterPatch;
use crate::tests::common::*;

#[tokio::test(start_paused = true)]
async fn test_skirmish_scenario() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();

    let combat = tracker.combat().await;
    let order: Vec<(String, i32)> = combat
        .participants()
        .iter()
        .map(|p| (p.display_name(), p.initiative))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Seelah".to_string(), 15),
            ("Goblin (1)".to_string(), 14),
            ("Goblin (2)".to_string(), 14),
        ]
    );

    for instance in 0..2 {
        tracker
            .modify_hp(&party.goblin_copy(instance), HpChange::Delta(-6))
            .await;
    }
    assert!(tracker.combat().await.is_ended());

    tokio::time::sleep(AUTO_END_DELAY * 2).await;
    assert_eq!(tracker.phase().await, CombatPhase::Setup);
    assert_eq!(tracker.roster().await.character(&party.seelah).unwrap().hp, 20);
}

#[tokio::test]
async fn test_start_errors_surface_as_validation() {
    let (tracker, party, _temp) = create_party_tracker().await;

    let err = tracker
        .start_combat(&CombatSelection::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::EmptySelection)));

    let mut selection = party.skirmish();
    selection.characters.push(party.valeros.clone());
    let err = tracker.start_combat(&selection).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingInitiative(ref id)) if *id == party.valeros
    ));
    assert_eq!(tracker.phase().await, CombatPhase::Setup);
}

#[tokio::test]
async fn test_roster_edits_during_combat_do_not_touch_participants() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();

    tracker
        .edit_character(&party.seelah, CharacterPatch::hp(1))
        .await;
    let seelah = ParticipantRef::character(&party.seelah);
    assert_eq!(tracker.combat().await.participant(&seelah).unwrap().hp, 20);

    tracker.modify_hp(&seelah, HpChange::Delta(-4)).await;
    tracker.end_combat().await;
    assert_eq!(tracker.roster().await.character(&party.seelah).unwrap().hp, 16);
}

#[tokio::test]
async fn test_deleted_character_is_skipped_on_writeback() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    assert!(tracker.delete_character(&party.seelah).await);

    let summary = tracker.end_combat().await.unwrap();
    assert_eq!(summary.participants, 3);
    assert!(tracker.roster().await.character(&party.seelah).is_none());
}

#[tokio::test]
async fn test_effect_lifecycle_through_turns() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    let goblin = party.goblin_copy(0);

    let effect = tracker
        .add_effect(&goblin, "Frightened", 1)
        .await
        .unwrap()
        .unwrap();
    assert!(tracker.add_effect(&goblin, "  ", 2).await.is_err());

    let result = tracker.next_turn().await.unwrap();
    assert_eq!(result.current, goblin);
    assert_eq!(result.expired_effects.len(), 1);
    assert_eq!(result.expired_effects[0].id, effect.id);
    assert!(tracker.combat().await.participant(&goblin).unwrap().effects.is_empty());

    assert_eq!(
        tracker.previous_turn().await,
        Some(ParticipantRef::character(&party.seelah))
    );
}

#[rstest]
#[case::damage(HpChange::Delta(-5), 15)]
#[case::overkill(HpChange::Delta(-500), 0)]
#[case::heal_past_max(HpChange::Delta(5), 25)]
#[case::set(HpChange::Set(7), 7)]
#[case::set_negative(HpChange::Set(-3), 0)]
fn test_hp_changes(#[case] change: HpChange, #[case] expected: i32) {
    let (roster, party) = create_party_roster();
    let mut combat = CombatSession::new();
    combat.start(&roster, &party.skirmish()).unwrap();

    let seelah = ParticipantRef::character(&party.seelah);
    assert_eq!(combat.modify_hp(&seelah, change), Some(expected));
}

#[test]
fn test_healing_ceiling_option() {
    let (roster, party) = create_party_roster();
    let mut combat = CombatSession::new().with_healing_ceiling(true);
    combat.start(&roster, &party.skirmish()).unwrap();

    let seelah = ParticipantRef::character(&party.seelah);
    assert_eq!(combat.modify_hp(&seelah, HpChange::Delta(5)), Some(20));
}

#[tokio::test]
async fn test_save_during_combat_persists_roster_only() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    tracker
        .modify_hp(&ParticipantRef::character(&party.seelah), HpChange::Delta(-10))
        .await;

    let filename = tracker.save().await.unwrap();
    let loaded = tracker.load_save(&filename).await.unwrap();
    let saved_seelah = loaded
        .snapshot
        .characters
        .iter()
        .find(|c| c.id == party.seelah)
        .unwrap();
    assert_eq!(saved_seelah.hp, 20);
    assert_eq!(tracker.phase().await, CombatPhase::Active);
}
