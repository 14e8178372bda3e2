use std::fmt::Write as _;
use std::hash::Hasher;

use crimecoin_game::{ContentData, Difficulty, MissionCatalog, Stat, StaticCatalog};
use twox_hash::XxHash64;

const CONTENT_SHAPE_HASH: u64 = 0x63d3_b841_7f4d_3235;

#[test]
fn content_asset_shape_is_stable() {
    let data = ContentData::default_content();
    let mut shape = String::new();
    for arch in &data.archetypes {
        writeln!(shape, "{}|{}|{}", arch.stat, arch.name, arch.risk).unwrap();
    }
    for (label, len) in [
        ("narratives", data.narratives.len()),
        ("complications", data.complications.len()),
        ("milestones", data.milestones.len()),
        ("lessons", data.lessons.len()),
        ("success_headlines", data.success_headlines.len()),
    ] {
        writeln!(shape, "{label}={len}").unwrap();
    }
    for event in &data.random_events {
        writeln!(shape, "event|{}", event.stat).unwrap();
    }
    for stat in Stat::ALL {
        writeln!(shape, "failure|{stat}={}", data.failure_reasons_for(stat).len()).unwrap();
    }
    for item in &data.bonus_items {
        writeln!(shape, "item|{}", item.name).unwrap();
    }

    assert_eq!(
        snapshot_hash(shape.as_bytes()),
        CONTENT_SHAPE_HASH,
        "content asset shape changed\n{shape}"
    );
}

#[test]
fn content_round_trips_through_json() {
    let data = ContentData::default_content();
    let json = serde_json::to_string(data).unwrap();
    let reparsed = ContentData::from_json(&json).unwrap();
    assert_eq!(&reparsed, data);
}

#[test]
fn mission_catalog_covers_every_tier() {
    let missions = StaticCatalog::default_catalog().all_missions().unwrap();
    for tier in Difficulty::ALL {
        assert!(
            missions.iter().any(|mission| mission.difficulty == tier),
            "no {tier} mission"
        );
    }
    for mission in &missions {
        mission.validate().unwrap();
        assert!(!mission.description.is_empty());
        assert!(!mission.time_required.is_empty());
    }
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}
