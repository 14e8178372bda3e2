//! Success probability, resolution roll, and reward/penalty magnitudes.
//!
//! This is the single outcome calculator used by every caller. Amounts on the
//! [`Outcome`] are split into what the ledger applies at resolution
//! (`crime_coin_delta`) and what the attempt cost the player overall
//! (`attempt_net`), since the entry cost is charged when the mission starts.
use crate::constants::{
    ABORT_FUN_COIN, ABORT_REFUND_FRACTION, FAILURE_EXPERIENCE, FAILURE_FUN_COIN_SCALE,
    FINAL_CHANCE_CAP, LUCK_CHANCE_DIVISOR, NOTORIETY_DIVISOR, PERFORMANCE_PIVOT,
    PERFORMANCE_WEIGHT, REWARD_MULTIPLIER_CAP, SUCCESS_FUN_COIN_RANGE, SUCCESS_XP_DIVISOR,
    SUCCESS_XP_JITTER,
};
use crate::content::ContentGenerator;
use crate::data::BonusItem;
use crate::mission::{Difficulty, Mission};
use crate::numbers::{floor_f64_to_i64, floor_f64_to_u32, i64_to_f64};
use crate::stats::StatVector;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    Failure,
    Aborted,
}

impl OutcomeKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a terminal mission transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    /// $CRIME change applied to the ledger at resolution.
    pub crime_coin_delta: i64,
    /// Total $CRIME the attempt lost, entry cost included. Zero on success.
    pub crime_coin_lost: i64,
    /// Net $CRIME change of the whole attempt, entry cost included.
    pub attempt_net: i64,
    pub fun_coin_gained: u32,
    pub experience_gained: u32,
    pub notoriety_gained: u32,
    /// Final chance used for the roll; zero for aborts.
    pub success_chance: f64,
    pub roll: Option<f64>,
    /// Reward drawn before the performance multiplier; zero unless successful.
    pub base_reward: i64,
    pub narrative: String,
    pub lesson: Option<String>,
    #[serde(default)]
    pub bonus_items: Vec<BonusItem>,
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Success)
    }
}

/// Stat-derived chance before the luck bonus: `avg/100 + bonus`, capped per tier.
#[must_use]
pub fn success_chance(stats: &StatVector, difficulty: Difficulty) -> f64 {
    let (bonus, cap) = difficulty.chance_adjustment();
    (stats.average() / 100.0 + bonus).min(cap)
}

/// Chance used for the roll: [`success_chance`] plus `luck/200`, capped at 0.95.
#[must_use]
pub fn final_chance(stats: &StatVector, difficulty: Difficulty) -> f64 {
    let luck_bonus = f64::from(stats.luck) / LUCK_CHANCE_DIVISOR;
    (success_chance(stats, difficulty) + luck_bonus).min(FINAL_CHANCE_CAP)
}

/// `1 + max(0, chance - 0.5) * 2 * 0.5`, capped at 1.5.
#[must_use]
pub fn reward_multiplier(chance: f64) -> f64 {
    let performance = ((chance - PERFORMANCE_PIVOT) * 2.0).max(0.0);
    (1.0 + performance * PERFORMANCE_WEIGHT).min(REWARD_MULTIPLIER_CAP)
}

/// $CRIME credited for a successful attempt with the given base reward.
#[must_use]
pub fn success_payout(base_reward: i64, chance: f64) -> i64 {
    floor_f64_to_i64(i64_to_f64(base_reward) * reward_multiplier(chance))
}

/// `min(1, (1 - chance) * 2)`.
#[must_use]
pub fn failure_severity(chance: f64) -> f64 {
    ((1.0 - chance) * 2.0).clamp(0.0, 1.0)
}

/// Extra $CRIME lost on failure, on top of the entry cost.
#[must_use]
pub fn failure_loss(cost: i64, difficulty: Difficulty, chance: f64) -> i64 {
    let extra = i64_to_f64(cost) * failure_severity(chance) * difficulty.loss_multiplier();
    floor_f64_to_i64(extra).max(0)
}

/// Draw the resolution roll and settle the attempt.
pub fn resolve<R: Rng + ?Sized>(
    mission: &Mission,
    stats: &StatVector,
    chance: f64,
    content: &ContentGenerator<'_>,
    rng: &mut R,
) -> Outcome {
    let roll: f64 = rng.r#gen();
    log::debug!(
        "{} resolution roll {roll:.4} against chance {chance:.4}",
        mission.id
    );
    settle(mission, stats, chance, roll, content, rng)
}

/// Settle an attempt for a known roll. `roll < chance` succeeds.
pub fn settle<R: Rng + ?Sized>(
    mission: &Mission,
    stats: &StatVector,
    chance: f64,
    roll: f64,
    content: &ContentGenerator<'_>,
    rng: &mut R,
) -> Outcome {
    if roll < chance {
        success_outcome(mission, chance, roll, content, rng)
    } else {
        failure_outcome(mission, stats, chance, roll, content, rng)
    }
}

fn success_outcome<R: Rng + ?Sized>(
    mission: &Mission,
    chance: f64,
    roll: f64,
    content: &ContentGenerator<'_>,
    rng: &mut R,
) -> Outcome {
    let base_reward = rng.gen_range(mission.min_reward..=mission.max_reward);
    let crime = success_payout(base_reward, chance);
    let fun_coin = rng.gen_range(SUCCESS_FUN_COIN_RANGE.0..SUCCESS_FUN_COIN_RANGE.1);
    let experience = u32::try_from(base_reward / SUCCESS_XP_DIVISOR)
        .unwrap_or(u32::MAX)
        .saturating_add(rng.gen_range(0..SUCCESS_XP_JITTER));
    let notoriety = u32::try_from(crime / NOTORIETY_DIVISOR).unwrap_or(0);
    let narrative = content.success_headline(rng);
    let bonus_items = content.roll_bonus_items(mission.difficulty, rng);

    Outcome {
        kind: OutcomeKind::Success,
        crime_coin_delta: crime,
        crime_coin_lost: 0,
        attempt_net: crime - mission.cost,
        fun_coin_gained: fun_coin,
        experience_gained: experience,
        notoriety_gained: notoriety,
        success_chance: chance,
        roll: Some(roll),
        base_reward,
        narrative,
        lesson: None,
        bonus_items,
    }
}

fn failure_outcome<R: Rng + ?Sized>(
    mission: &Mission,
    stats: &StatVector,
    chance: f64,
    roll: f64,
    content: &ContentGenerator<'_>,
    rng: &mut R,
) -> Outcome {
    let severity = failure_severity(chance);
    let extra = failure_loss(mission.cost, mission.difficulty, chance);
    let story = content.generate_outcome_narrative(stats, rng);

    Outcome {
        kind: OutcomeKind::Failure,
        crime_coin_delta: -extra,
        crime_coin_lost: mission.cost + extra,
        attempt_net: -(mission.cost + extra),
        fun_coin_gained: floor_f64_to_u32(severity * FAILURE_FUN_COIN_SCALE) + 1,
        experience_gained: FAILURE_EXPERIENCE,
        notoriety_gained: 0,
        success_chance: chance,
        roll: Some(roll),
        base_reward: 0,
        narrative: story.reason,
        lesson: Some(story.lesson),
        bonus_items: Vec::new(),
    }
}

/// Voluntary withdrawal: a quarter of the entry cost comes back.
#[must_use]
pub fn abort_outcome(mission: &Mission, content: &ContentGenerator<'_>) -> Outcome {
    let refund = floor_f64_to_i64(i64_to_f64(mission.cost) * ABORT_REFUND_FRACTION).max(0);
    let story = content.abort_narrative();
    Outcome {
        kind: OutcomeKind::Aborted,
        crime_coin_delta: refund,
        crime_coin_lost: mission.cost - refund,
        attempt_net: refund - mission.cost,
        fun_coin_gained: ABORT_FUN_COIN,
        experience_gained: 0,
        notoriety_gained: 0,
        success_chance: 0.0,
        roll: None,
        base_reward: 0,
        narrative: story.reason,
        lesson: Some(story.lesson),
        bonus_items: Vec::new(),
    }
}
