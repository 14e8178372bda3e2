//! Randomized action offers and narrative text.
//!
//! Generation is total: every call returns usable text even when a pool in the
//! content asset is empty. All randomness comes from the caller's RNG.
use crate::constants::{
    MILESTONE_STEP, SPECIAL_OFFER_BONUS, SPECIAL_OFFER_CHANCE, SPECIAL_OFFER_RISK,
};
use crate::data::{BonusItem, ContentData, RandomEventDef, fill_stat};
use crate::mission::Difficulty;
use crate::stats::{Stat, StatTarget, StatVector};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const FALLBACK_ACTION_NAME: &str = "Improvise";
const FALLBACK_ACTION_RISK: u8 = 20;
const FALLBACK_NARRATIVE: &str = "You press on with the job.";
const FALLBACK_LESSON: &str = "Regroup and try again.";

/// A choice presented to the player during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOffer {
    /// Unique within the owning session.
    pub id: u32,
    pub name: String,
    pub description: String,
    pub stat: StatTarget,
    pub bonus: u32,
    /// Percent chance of a complication.
    pub risk: u8,
    pub narrative: String,
}

/// Failure explanation plus advice for the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeNarrative {
    pub reason: String,
    pub lesson: String,
}

/// Stat boost triggered late in a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub stat: Stat,
    pub message: String,
}

/// Draws offers and narrative text from a set of content pools.
#[derive(Debug, Clone, Copy)]
pub struct ContentGenerator<'a> {
    data: &'a ContentData,
}

impl Default for ContentGenerator<'static> {
    fn default() -> Self {
        Self::new(ContentData::default_content())
    }
}

impl<'a> ContentGenerator<'a> {
    #[must_use]
    pub const fn new(data: &'a ContentData) -> Self {
        Self { data }
    }

    #[must_use]
    pub const fn data(&self) -> &'a ContentData {
        self.data
    }

    /// Generate `count` offers with ids `first_id..first_id + count`.
    ///
    /// Hard missions may swap the last slot for an all-round `success` offer,
    /// so the returned length always equals `count`.
    pub fn generate_actions<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        count: usize,
        first_id: u32,
        rng: &mut R,
    ) -> Vec<ActionOffer> {
        let (min_bonus, max_bonus) = difficulty.bonus_range();
        let mut offers = Vec::with_capacity(count);
        let mut id = first_id;
        for _ in 0..count {
            let stat = Stat::random(rng);
            let pool: Vec<_> = self.data.archetypes_for(stat).collect();
            let (name, description, risk) = pool.choose(rng).map_or_else(
                || (FALLBACK_ACTION_NAME.to_string(), String::new(), FALLBACK_ACTION_RISK),
                |arch| (arch.name.clone(), arch.description.clone(), arch.risk.min(100)),
            );
            offers.push(ActionOffer {
                id,
                name,
                description,
                stat: stat.into(),
                bonus: rng.gen_range(min_bonus..=max_bonus),
                risk,
                narrative: self.narrative(rng),
            });
            id = id.wrapping_add(1);
        }

        if difficulty.allows_special_offers()
            && let Some(last) = offers.last_mut()
            && rng.gen_bool(SPECIAL_OFFER_CHANCE)
        {
            let (name, description) = self.data.special_offers.choose(rng).map_or_else(
                || ("Go all in".to_string(), String::new()),
                |text| (text.name.clone(), text.description.clone()),
            );
            *last = ActionOffer {
                id: last.id,
                name,
                description,
                stat: StatTarget::Success,
                bonus: SPECIAL_OFFER_BONUS,
                risk: SPECIAL_OFFER_RISK,
                narrative: self.narrative(rng),
            };
        }
        offers
    }

    /// Failure reason keyed by the weakest stat plus a lesson.
    pub fn generate_outcome_narrative<R: Rng + ?Sized>(
        &self,
        stats: &StatVector,
        rng: &mut R,
    ) -> OutcomeNarrative {
        let weakest = stats.weakest_stat();
        let reason = pick_text(self.data.failure_reasons_for(weakest), rng, FALLBACK_NARRATIVE);
        let lesson = self
            .data
            .lessons
            .choose(rng)
            .map_or_else(|| FALLBACK_LESSON.to_string(), |tpl| fill_stat(tpl, weakest));
        OutcomeNarrative { reason, lesson }
    }

    /// Complication line for a risky action that penalized `stat`.
    pub fn complication<R: Rng + ?Sized>(&self, stat: Stat, rng: &mut R) -> String {
        self.data.complications.choose(rng).map_or_else(
            || fill_stat("Your {stat} takes a hit.", stat),
            |tpl| fill_stat(tpl, stat),
        )
    }

    /// Milestone line for the given progress, `floor(progress/20) - 1`.
    #[must_use]
    pub fn milestone(&self, progress: u8) -> String {
        let step = usize::from(progress / MILESTONE_STEP);
        step.checked_sub(1)
            .and_then(|idx| self.data.milestones.get(idx))
            .unwrap_or(&self.data.continue_fallback)
            .clone()
    }

    pub fn random_event<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<RandomEvent> {
        self.data
            .random_events
            .choose(rng)
            .map(|RandomEventDef { stat, message }| RandomEvent {
                stat: *stat,
                message: message.clone(),
            })
    }

    pub fn success_headline<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        pick_text(&self.data.success_headlines, rng, "Mission accomplished.")
    }

    /// Roll for a bonus item drop on a successful mission.
    pub fn roll_bonus_items<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Vec<BonusItem> {
        if !rng.gen_bool(difficulty.bonus_item_chance()) {
            return Vec::new();
        }
        self.data.bonus_items.choose(rng).cloned().into_iter().collect()
    }

    #[must_use]
    pub fn abort_narrative(&self) -> OutcomeNarrative {
        OutcomeNarrative {
            reason: self.data.abort.narrative.clone(),
            lesson: self.data.abort.lesson.clone(),
        }
    }

    fn narrative<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        pick_text(&self.data.narratives, rng, FALLBACK_NARRATIVE)
    }
}

fn pick_text<R: Rng + ?Sized>(pool: &[String], rng: &mut R, fallback: &str) -> String {
    pool.choose(rng).map_or_else(|| fallback.to_string(), Clone::clone)
}

/// Generate offers with the embedded content pools. Ids start at 0.
pub fn generate_actions<R: Rng + ?Sized>(
    difficulty: Difficulty,
    count: usize,
    rng: &mut R,
) -> Vec<ActionOffer> {
    ContentGenerator::default().generate_actions(difficulty, count, 0, rng)
}

/// Failure narrative drawn from the embedded content pools.
pub fn generate_outcome_narrative<R: Rng + ?Sized>(
    stats: &StatVector,
    rng: &mut R,
) -> OutcomeNarrative {
    ContentGenerator::default().generate_outcome_narrative(stats, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_OFFER_COUNT;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn default_offer_batches_are_valid() {
        let mut rng = SmallRng::seed_from_u64(42);
        for difficulty in Difficulty::ALL {
            let (min_bonus, max_bonus) = difficulty.bonus_range();
            for _ in 0..300 {
                let offers = generate_actions(difficulty, DEFAULT_OFFER_COUNT, &mut rng);
                assert_eq!(offers.len(), DEFAULT_OFFER_COUNT);
                for offer in &offers {
                    assert!(offer.bonus > 0);
                    assert!(offer.risk <= 100);
                    assert!(!offer.narrative.is_empty());
                    if offer.stat == StatTarget::Success {
                        assert_eq!(difficulty, Difficulty::Hard);
                        assert_eq!(offer.bonus, SPECIAL_OFFER_BONUS);
                    } else {
                        assert!((min_bonus..=max_bonus).contains(&offer.bonus));
                    }
                }
            }
        }
    }

    #[test]
    fn hard_missions_eventually_offer_special_action() {
        let mut rng = SmallRng::seed_from_u64(5);
        let seen = (0..200).any(|_| {
            generate_actions(Difficulty::Hard, 3, &mut rng)
                .iter()
                .any(|offer| offer.stat == StatTarget::Success && offer.risk == SPECIAL_OFFER_RISK)
        });
        assert!(seen);
    }

    #[test]
    fn special_offer_takes_the_last_slot() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut specials = 0;
        for _ in 0..300 {
            let offers =
                ContentGenerator::default().generate_actions(Difficulty::Hard, 3, 4, &mut rng);
            assert_eq!(offers.len(), 3);
            assert_eq!(offers.iter().map(|offer| offer.id).collect::<Vec<_>>(), [4, 5, 6]);
            for (idx, offer) in offers.iter().enumerate() {
                if offer.stat == StatTarget::Success {
                    assert_eq!(idx, 2);
                    specials += 1;
                }
            }
        }
        assert!(specials > 0);
    }

    #[test]
    fn offer_ids_are_sequential() {
        let mut rng = SmallRng::seed_from_u64(1);
        let offers = ContentGenerator::default().generate_actions(Difficulty::Easy, 3, 7, &mut rng);
        let ids: Vec<u32> = offers.iter().map(|offer| offer.id).collect();
        assert_eq!(ids, [7, 8, 9]);
    }

    #[test]
    fn empty_pools_still_produce_text() {
        let empty = ContentData::default();
        let generator = ContentGenerator::new(&empty);
        let mut rng = SmallRng::seed_from_u64(3);
        let offers = generator.generate_actions(Difficulty::Medium, 2, 0, &mut rng);
        assert_eq!(offers.len(), 2);
        assert!(offers.iter().all(|offer| !offer.narrative.is_empty()));
        let story = generator.generate_outcome_narrative(&StatVector::uniform(10), &mut rng);
        assert!(!story.reason.is_empty() && !story.lesson.is_empty());
        assert!(generator.random_event(&mut rng).is_none());
    }

    #[test]
    fn outcome_narrative_follows_weakest_stat() {
        let generator = ContentGenerator::default();
        let stats = StatVector::new(80, 80, 15, 80);
        let speed_pool = generator.data().failure_reasons_for(Stat::Speed);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            let story = generator.generate_outcome_narrative(&stats, &mut rng);
            assert!(speed_pool.contains(&story.reason));
            assert!(!story.lesson.contains("{stat}"));
        }
    }

    #[test]
    fn milestones_index_by_progress() {
        let generator = ContentGenerator::default();
        let data = generator.data();
        assert_eq!(generator.milestone(20), data.milestones[0]);
        assert_eq!(generator.milestone(80), data.milestones[3]);
        assert_eq!(generator.milestone(0), data.continue_fallback);
    }

    #[test]
    fn complication_names_the_penalized_stat() {
        let data = ContentData::from_json(r#"{ "complications": ["Your {stat} slips."] }"#).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let line = ContentGenerator::new(&data).complication(Stat::Luck, &mut rng);
        assert_eq!(line, "Your luck slips.");
    }
}
