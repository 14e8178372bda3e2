use crimecoin_game::outcome::{resolve, settle};
use crimecoin_game::{
    ContentGenerator, Difficulty, Mission, MissionId, StatTarget, StatVector, generate_actions,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;

fn rate(hits: usize) -> f64 {
    let hits = u32::try_from(hits).expect("count fits");
    let total = u32::try_from(SAMPLE_SIZE).expect("sample size fits u32");
    f64::from(hits) / f64::from(total)
}

fn mission(difficulty: Difficulty) -> Mission {
    Mission::new(MissionId(1), "Acceptance", difficulty, 10, (20, 40)).expect("valid mission")
}

#[test]
fn success_rate_tracks_final_chance() {
    let content = ContentGenerator::default();
    let stats = StatVector::uniform(50);
    for (difficulty, chance) in [
        (Difficulty::Easy, 0.90),
        (Difficulty::Medium, 0.70),
        (Difficulty::Hard, 0.45),
    ] {
        let mission = mission(difficulty);
        let mut rng = SmallRng::seed_from_u64(0x00C0_FFEE);
        let successes = (0..SAMPLE_SIZE)
            .filter(|_| resolve(&mission, &stats, chance, &content, &mut rng).is_success())
            .count();
        let observed = rate(successes);
        assert!(
            (observed - chance).abs() <= TOLERANCE,
            "{difficulty} success rate drifted: observed {observed:.4}, expected {chance:.2}"
        );
    }
}

#[test]
fn bonus_item_drop_rate_tracks_tier() {
    let content = ContentGenerator::default();
    let stats = StatVector::uniform(70);
    for (difficulty, expected) in [
        (Difficulty::Easy, 0.10),
        (Difficulty::Medium, 0.30),
        (Difficulty::Hard, 0.50),
    ] {
        let mission = mission(difficulty);
        let mut rng = SmallRng::seed_from_u64(1234);
        let drops = (0..SAMPLE_SIZE)
            .filter(|_| {
                !settle(&mission, &stats, 0.9, 0.0, &content, &mut rng)
                    .bonus_items
                    .is_empty()
            })
            .count();
        let observed = rate(drops);
        assert!(
            (observed - expected).abs() <= TOLERANCE,
            "{difficulty} drop rate drifted: observed {observed:.4}"
        );
    }
}

#[test]
fn special_offer_rate_matches_configuration() {
    let mut rng = SmallRng::seed_from_u64(77);
    let specials = (0..SAMPLE_SIZE)
        .filter(|_| {
            generate_actions(Difficulty::Hard, 3, &mut rng)
                .last()
                .is_some_and(|offer| offer.stat == StatTarget::Success)
        })
        .count();
    let observed = rate(specials);
    assert!(
        (observed - 0.25).abs() <= TOLERANCE,
        "special offer rate drifted: observed {observed:.4}"
    );
}

#[test]
fn success_rewards_stay_in_band() {
    let content = ContentGenerator::default();
    let mission = mission(Difficulty::Medium);
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..SAMPLE_SIZE {
        let outcome = settle(&mission, &StatVector::uniform(60), 0.85, 0.1, &content, &mut rng);
        assert!((20..=40).contains(&outcome.base_reward));
        assert!(outcome.crime_coin_delta >= outcome.base_reward);
        assert!(outcome.crime_coin_delta <= outcome.base_reward * 3 / 2);
        assert!((10..30).contains(&outcome.fun_coin_gained));
    }
}
