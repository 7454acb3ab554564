//! Automatic encounter reset
//!
//! Runs on a paused clock: sleeping in the test advances tokio time
//! deterministically, so the reset task fires exactly at the delay.

use std::time::Duration;

use crate::core::combat::{CombatPhase, HpChange, ParticipantRef};
use crate::core::tracker::TrackerEvent;
use crate::tests::common::*;

async fn drop_goblins(tracker: &crate::core::tracker::CombatTracker, party: &Party) {
    for instance in 0..2 {
        tracker
            .modify_hp(&party.goblin_copy(instance), HpChange::Set(0))
            .await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_reset_fires_after_delay() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    drop_goblins(&tracker, &party).await;
    assert_eq!(tracker.phase().await, CombatPhase::Ended);

    tokio::time::sleep(AUTO_END_DELAY - Duration::from_millis(1)).await;
    assert_eq!(tracker.phase().await, CombatPhase::Ended);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(tracker.phase().await, CombatPhase::Setup);
    assert!(tracker.combat().await.participants().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_healing_cancels_reset() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    drop_goblins(&tracker, &party).await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    tracker
        .modify_hp(&party.goblin_copy(1), HpChange::Delta(3))
        .await;
    assert_eq!(tracker.phase().await, CombatPhase::Active);

    tokio::time::sleep(AUTO_END_DELAY * 3).await;
    assert_eq!(tracker.phase().await, CombatPhase::Active);
}

#[tokio::test(start_paused = true)]
async fn test_manual_end_beats_timer() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    drop_goblins(&tracker, &party).await;

    assert!(tracker.end_combat().await.is_some());
    tracker.start_combat(&party.skirmish()).await.unwrap();

    tokio::time::sleep(AUTO_END_DELAY * 2).await;
    let combat = tracker.combat().await;
    assert_eq!(combat.phase(), CombatPhase::Active);
    assert_eq!(combat.participants().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_later_command_restarts_window() {
    let (tracker, party, _temp) = create_party_tracker().await;
    tracker.start_combat(&party.skirmish()).await.unwrap();
    drop_goblins(&tracker, &party).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    tracker
        .add_effect(&ParticipantRef::character(&party.seelah), "Bless", 10)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(tracker.phase().await, CombatPhase::Ended);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(tracker.phase().await, CombatPhase::Setup);
}

#[tokio::test(start_paused = true)]
async fn test_reset_writes_back_and_notifies() {
    let (tracker, party, _temp) = create_party_tracker().await;
    let mut events = tracker.subscribe();

    tracker.start_combat(&party.skirmish()).await.unwrap();
    tracker
        .modify_hp(&ParticipantRef::character(&party.seelah), HpChange::Delta(-7))
        .await;
    drop_goblins(&tracker, &party).await;

    tokio::time::sleep(AUTO_END_DELAY + Duration::from_millis(10)).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen[0], TrackerEvent::CombatStarted { participants: 3 }));
    assert!(seen.contains(&TrackerEvent::EncounterEnded));
    let reset = seen
        .iter()
        .find_map(|e| match e {
            TrackerEvent::CombatReset { summary, automatic } => Some((summary.clone(), *automatic)),
            _ => None,
        })
        .unwrap();
    assert!(reset.1);
    assert_eq!(reset.0.character_hp, vec![(party.seelah.clone(), 13)]);

    let roster = tracker.roster().await;
    assert_eq!(roster.character(&party.seelah).unwrap().hp, 13);
}
