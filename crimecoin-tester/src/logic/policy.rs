use std::fmt;

use crimecoin_game::{ActionOffer, Mission, StatVector, final_chance};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const FULL_PROGRESS: u8 = 100;
const CAUTIOUS_ACTION_BUDGET: u32 = 3;
const CAUTIOUS_ABORT_CHANCE: f64 = 0.4;
const CAUTIOUS_ABORT_AFTER: u32 = 2;
const BALANCED_ACTION_BUDGET: u32 = 2;
const MONTE_CARLO_ACTION_ODDS: f64 = 0.6;

/// What an automated player can see of its live mission.
#[derive(Debug, Clone)]
pub struct MissionView {
    pub mission: Mission,
    pub offers: Vec<ActionOffer>,
    pub stats: StatVector,
    pub progress: u8,
    pub actions_taken: u32,
}

impl MissionView {
    /// Chance the mission would succeed if rolled right now.
    #[must_use]
    pub fn chance(&self) -> f64 {
        final_chance(&self.stats, self.mission.difficulty)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.progress >= FULL_PROGRESS
    }
}

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDecision {
    TakeAction {
        offer_id: u32,
        rationale: Option<String>,
    },
    Continue,
    Abort {
        rationale: Option<String>,
    },
}

impl PolicyDecision {
    #[must_use]
    pub fn take(offer_id: u32, rationale: impl Into<String>) -> Self {
        Self::TakeAction {
            offer_id,
            rationale: Some(rationale.into()),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::TakeAction { offer_id, .. } => format!("action #{offer_id}"),
            Self::Continue => "continue".to_string(),
            Self::Abort { .. } => "abort".to_string(),
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next move for a live mission.
    fn decide(&mut self, view: &MissionView) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Cautious,
    Aggressive,
    Balanced,
    WalkAway,
    MonteCarlo,
}

impl GameplayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Aggressive => "Aggressive",
            Self::Balanced => "Balanced",
            Self::WalkAway => "Walk Away",
            Self::MonteCarlo => "Monte Carlo",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::WalkAway => Box::new(WalkAwayPolicy),
            Self::MonteCarlo => Box::new(MonteCarloPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct AggressivePolicy;
struct BalancedPolicy;
struct WalkAwayPolicy;

struct MonteCarloPolicy {
    rng: ChaCha20Rng,
}

impl MonteCarloPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn decide(&mut self, view: &MissionView) -> PolicyDecision {
        let chance = view.chance();
        if view.actions_taken >= CAUTIOUS_ABORT_AFTER
            && !view.is_complete()
            && chance < CAUTIOUS_ABORT_CHANCE
        {
            return PolicyDecision::Abort {
                rationale: Some(format!("chance {chance:.2}")),
            };
        }
        if view.actions_taken >= CAUTIOUS_ACTION_BUDGET || view.is_complete() {
            return PolicyDecision::Continue;
        }
        view.offers
            .iter()
            .min_by_key(|offer| offer.risk)
            .map_or(PolicyDecision::Continue, |offer| {
                PolicyDecision::take(offer.id, format!("risk {}", offer.risk))
            })
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn decide(&mut self, view: &MissionView) -> PolicyDecision {
        if view.is_complete() {
            return PolicyDecision::Continue;
        }
        view.offers
            .iter()
            .max_by_key(|offer| offer.bonus)
            .map_or(PolicyDecision::Continue, |offer| {
                PolicyDecision::take(offer.id, format!("bonus {}", offer.bonus))
            })
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn decide(&mut self, view: &MissionView) -> PolicyDecision {
        if view.actions_taken >= BALANCED_ACTION_BUDGET || view.is_complete() {
            return PolicyDecision::Continue;
        }
        view.offers
            .iter()
            .map(|offer| (offer, balanced_score(offer, &view.stats)))
            .max_by_key(|(_, score)| *score)
            .map_or(PolicyDecision::Continue, |(offer, score)| {
                PolicyDecision::take(offer.id, format!("score {score}"))
            })
    }
}

impl PlayerPolicy for WalkAwayPolicy {
    fn name(&self) -> &'static str {
        "Walk Away"
    }

    fn decide(&mut self, _view: &MissionView) -> PolicyDecision {
        PolicyDecision::Abort {
            rationale: Some("cold feet".to_string()),
        }
    }
}

impl PlayerPolicy for MonteCarloPolicy {
    fn name(&self) -> &'static str {
        "Monte Carlo"
    }

    fn decide(&mut self, view: &MissionView) -> PolicyDecision {
        if view.is_complete()
            || view.offers.is_empty()
            || !self.rng.gen_bool(MONTE_CARLO_ACTION_ODDS)
        {
            return PolicyDecision::Continue;
        }
        let index = self.rng.gen_range(0..view.offers.len());
        view.offers
            .get(index)
            .map_or(PolicyDecision::Continue, |offer| {
                PolicyDecision::take(offer.id, format!("pick {index}"))
            })
    }
}

/// Bonus that would actually land, weighed against complication risk.
fn balanced_score(offer: &ActionOffer, stats: &StatVector) -> i64 {
    let headroom = offer
        .stat
        .stat()
        .map_or(100, |stat| 100 - i64::from(stats.get(stat)));
    let useful = i64::from(offer.bonus).min(headroom);
    useful * 2 - i64::from(offer.risk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimecoin_game::{Difficulty, MissionId, StatTarget};

    fn offer(id: u32, stat: StatTarget, bonus: u32, risk: u8) -> ActionOffer {
        ActionOffer {
            id,
            name: format!("offer {id}"),
            description: String::new(),
            stat,
            bonus,
            risk,
            narrative: String::new(),
        }
    }

    fn view(stats: StatVector, actions_taken: u32, progress: u8) -> MissionView {
        MissionView {
            mission: Mission::new(MissionId(2), "Fixture", Difficulty::Medium, 10, (20, 40))
                .unwrap(),
            offers: vec![
                offer(1, StatTarget::Stealth, 20, 30),
                offer(2, StatTarget::Speed, 35, 60),
                offer(3, StatTarget::Luck, 10, 5),
            ],
            stats,
            progress,
            actions_taken,
        }
    }

    #[test]
    fn cautious_takes_lowest_risk_then_bails_on_bad_odds() {
        let mut policy = GameplayStrategy::Cautious.create_policy(1);
        let first = policy.decide(&view(StatVector::uniform(50), 0, 0));
        assert!(matches!(first, PolicyDecision::TakeAction { offer_id: 3, .. }));

        let grim = policy.decide(&view(StatVector::uniform(10), 2, 40));
        assert!(matches!(grim, PolicyDecision::Abort { .. }));
    }

    #[test]
    fn aggressive_chases_bonus_until_complete() {
        let mut policy = GameplayStrategy::Aggressive.create_policy(1);
        let pick = policy.decide(&view(StatVector::uniform(50), 4, 80));
        assert!(matches!(pick, PolicyDecision::TakeAction { offer_id: 2, .. }));
        assert_eq!(
            policy.decide(&view(StatVector::uniform(50), 5, 100)),
            PolicyDecision::Continue
        );
    }

    #[test]
    fn balanced_ignores_capped_stats() {
        let mut policy = GameplayStrategy::Balanced.create_policy(1);
        let stats = StatVector::new(50, 50, 100, 50);
        let mut sample = view(stats, 0, 0);
        sample.offers = vec![
            offer(1, StatTarget::Stealth, 20, 10),
            offer(2, StatTarget::Speed, 35, 10),
        ];
        let pick = policy.decide(&sample);
        assert!(matches!(pick, PolicyDecision::TakeAction { offer_id: 1, .. }));
        assert_eq!(
            policy.decide(&view(stats, 2, 40)),
            PolicyDecision::Continue
        );
    }

    #[test]
    fn monte_carlo_is_deterministic_per_seed() {
        let sample = view(StatVector::uniform(40), 0, 0);
        let mut a = GameplayStrategy::MonteCarlo.create_policy(99);
        let mut b = GameplayStrategy::MonteCarlo.create_policy(99);
        for _ in 0..10 {
            assert_eq!(a.decide(&sample), b.decide(&sample));
        }
    }

    #[test]
    fn walk_away_always_aborts() {
        let mut policy = GameplayStrategy::WalkAway.create_policy(0);
        assert!(matches!(
            policy.decide(&view(StatVector::uniform(90), 0, 0)),
            PolicyDecision::Abort { .. }
        ));
        assert_eq!(policy.name(), GameplayStrategy::WalkAway.label());
    }
}
