use crimecoin_game::outcome::{abort_outcome, settle};
use crimecoin_game::{
    ContentGenerator, ContinueResult, Difficulty, MemoryLedger, Mission, MissionEngine,
    MissionError, MissionId, OutcomeKind, PlayerId, PlayerLedger, PlayerRecord, SessionPhase,
    StatVector, StaticCatalog,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

const PLAYER: PlayerId = PlayerId(9);

fn corner_store() -> Mission {
    Mission::new(MissionId(2), "Corner Store Heist", Difficulty::Medium, 10, (20, 40))
        .expect("valid mission")
}

/// Ledger holding one player with 100 $CRIME, already charged for one attempt.
fn charged_ledger() -> MemoryLedger {
    let ledger = MemoryLedger::new();
    let mut record = PlayerRecord::new(PLAYER, "scenario");
    record.crime_coin = 100;
    ledger.insert_player(record);
    let charged = ledger.charge(PLAYER, 10).expect("charge succeeds");
    assert_eq!(charged.crime_coin, 90);
    ledger
}

#[test]
fn success_with_base_thirty_pays_forty() {
    let ledger = charged_ledger();
    let mission = corner_store();
    let content = ContentGenerator::default();
    let outcome = (0..2_000)
        .map(|seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            settle(&mission, &StatVector::uniform(80), 0.85, 0.5, &content, &mut rng)
        })
        .find(|outcome| outcome.base_reward == 30)
        .expect("some seed draws a base reward of 30");
    assert_eq!(outcome.crime_coin_delta, 40);

    let record = ledger.apply_outcome(PLAYER, &mission, &outcome).unwrap();
    assert_eq!(record.crime_coin, 130);
    assert_eq!(record.successful_missions, 1);
}

#[test]
fn failure_charges_only_the_extra_loss() {
    let ledger = charged_ledger();
    let mission = corner_store();
    let mut rng = SmallRng::seed_from_u64(4);
    let outcome = settle(
        &mission,
        &StatVector::uniform(40),
        0.85,
        0.99,
        &ContentGenerator::default(),
        &mut rng,
    );
    assert_eq!(outcome.kind, OutcomeKind::Failure);
    assert_eq!(outcome.crime_coin_lost, 13);
    assert_eq!(outcome.attempt_net, -13);

    let record = ledger.apply_outcome(PLAYER, &mission, &outcome).unwrap();
    assert_eq!(record.crime_coin, 87);
    let history = ledger.history(PLAYER).unwrap();
    assert_eq!(history[0].crime_coin_change, -3);
    assert!(!history[0].success);
}

#[test]
fn abort_returns_a_quarter_of_the_cost() {
    let ledger = charged_ledger();
    let mission = corner_store();
    let outcome = abort_outcome(&mission, &ContentGenerator::default());
    let record = ledger.apply_outcome(PLAYER, &mission, &outcome).unwrap();
    assert_eq!(record.crime_coin, 92);
    assert_eq!(outcome.attempt_net, -8);
    assert_eq!(record.fun_coin, 11);
    assert_eq!(record.total_missions, 1);
}

#[test]
fn insufficient_funds_leave_balance_untouched() {
    let ledger = MemoryLedger::new();
    let mut record = PlayerRecord::new(PLAYER, "broke");
    record.crime_coin = 40;
    ledger.insert_player(record);
    let engine = MissionEngine::new(StaticCatalog::load_from_static(), ledger);

    let err = engine.start_mission(PLAYER, MissionId(3), 11).unwrap_err();
    assert_eq!(
        err,
        MissionError::InsufficientFunds {
            required: 50,
            available: 40
        }
    );
    assert!(err.is_client_error());
    assert_eq!(engine.player(PLAYER).unwrap().crime_coin, 40);
    assert!(engine.history(PLAYER).unwrap().is_empty());
}

#[test]
fn every_engine_attempt_settles_exactly_once() {
    let ledger = MemoryLedger::new();
    ledger.insert_player(PlayerRecord::new(PLAYER, "grinder"));
    let engine = MissionEngine::new(StaticCatalog::load_from_static(), ledger);

    for seed in 0..25_u64 {
        let before = engine.player(PLAYER).unwrap().crime_coin;
        let (mut session, charged) = engine.start_mission(PLAYER, MissionId(2), seed).unwrap();
        assert_eq!(charged.crime_coin, before - 10);

        let outcome = loop {
            if session.progress() < 60
                && let Some(offer) = session.offers().first().map(|offer| offer.id)
            {
                session.take_action(offer).unwrap();
                continue;
            }
            if let ContinueResult::Resolved(outcome) = session.continue_mission().unwrap() {
                break outcome;
            }
        };
        assert!(matches!(
            session.phase(),
            SessionPhase::Success | SessionPhase::Failure
        ));

        let after = engine.record_outcome(&session).unwrap().crime_coin;
        assert_eq!(after, (charged.crime_coin + outcome.crime_coin_delta).max(0));
        assert_eq!(after - before, outcome.attempt_net.max(-before));
        assert!(session.continue_mission().is_err());
    }
    assert_eq!(engine.history(PLAYER).unwrap().len(), 25);
}
