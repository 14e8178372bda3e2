//! Mission definitions and difficulty tiers.
use crate::constants::{
    EASY_BONUS_ITEM_CHANCE, EASY_BONUS_RANGE, EASY_CHANCE_BONUS, EASY_CHANCE_CAP,
    EASY_LOSS_MULTIPLIER, HARD_BONUS_ITEM_CHANCE, HARD_BONUS_RANGE, HARD_CHANCE_BONUS,
    HARD_CHANCE_CAP, HARD_LOSS_MULTIPLIER, MEDIUM_BONUS_ITEM_CHANCE, MEDIUM_BONUS_RANGE,
    MEDIUM_CHANCE_BONUS, MEDIUM_CHANCE_CAP, MEDIUM_LOSS_MULTIPLIER,
};
use crate::error::MissionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered mission difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Inclusive bonus range for generated action offers.
    #[must_use]
    pub const fn bonus_range(self) -> (u32, u32) {
        match self {
            Self::Easy => EASY_BONUS_RANGE,
            Self::Medium => MEDIUM_BONUS_RANGE,
            Self::Hard => HARD_BONUS_RANGE,
        }
    }

    /// Additive bonus and ceiling applied to the stat-derived base chance.
    #[must_use]
    pub const fn chance_adjustment(self) -> (f64, f64) {
        match self {
            Self::Easy => (EASY_CHANCE_BONUS, EASY_CHANCE_CAP),
            Self::Medium => (MEDIUM_CHANCE_BONUS, MEDIUM_CHANCE_CAP),
            Self::Hard => (HARD_CHANCE_BONUS, HARD_CHANCE_CAP),
        }
    }

    /// Scale applied to the extra loss on a failed attempt.
    #[must_use]
    pub const fn loss_multiplier(self) -> f64 {
        match self {
            Self::Easy => EASY_LOSS_MULTIPLIER,
            Self::Medium => MEDIUM_LOSS_MULTIPLIER,
            Self::Hard => HARD_LOSS_MULTIPLIER,
        }
    }

    #[must_use]
    pub const fn bonus_item_chance(self) -> f64 {
        match self {
            Self::Easy => EASY_BONUS_ITEM_CHANCE,
            Self::Medium => MEDIUM_BONUS_ITEM_CHANCE,
            Self::Hard => HARD_BONUS_ITEM_CHANCE,
        }
    }

    /// Whether special `success` offers may appear.
    #[must_use]
    pub const fn allows_special_offers(self) -> bool {
        matches!(self, Self::Hard)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = MissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MissionError::InvalidDifficulty(trimmed.to_string()))
    }
}

/// Stable mission identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(pub u32);

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mission#{}", self.0)
    }
}

/// A mission definition. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub cost: i64,
    pub min_reward: i64,
    pub max_reward: i64,
    /// Display-only nominal success rate in percent.
    pub success_rate: u8,
    #[serde(default)]
    pub time_required: String,
}

impl Mission {
    /// Build a validated mission.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidMission`] when the cost is negative or the
    /// reward range is inverted.
    pub fn new(
        id: MissionId,
        name: impl Into<String>,
        difficulty: Difficulty,
        cost: i64,
        reward_range: (i64, i64),
    ) -> Result<Self, MissionError> {
        let mission = Self {
            id,
            name: name.into(),
            description: String::new(),
            difficulty,
            cost,
            min_reward: reward_range.0,
            max_reward: reward_range.1,
            success_rate: 0,
            time_required: String::new(),
        };
        mission.validate()?;
        Ok(mission)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check the structural invariants of the mission.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidMission`] describing the first violation.
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.cost < 0 {
            return Err(MissionError::InvalidMission(format!(
                "{} has negative cost {}",
                self.id, self.cost
            )));
        }
        if self.min_reward > self.max_reward {
            return Err(MissionError::InvalidMission(format!(
                "{} reward range {}..={} is inverted",
                self.id, self.min_reward, self.max_reward
            )));
        }
        if self.min_reward < 0 {
            return Err(MissionError::InvalidMission(format!(
                "{} has negative minimum reward {}",
                self.id, self.min_reward
            )));
        }
        Ok(())
    }

    /// Human-readable reward range, e.g. `20-40`.
    #[must_use]
    pub fn reward_label(&self) -> String {
        format!("{}-{}", self.min_reward, self.max_reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!(matches!(
            "legendary".parse::<Difficulty>(),
            Err(MissionError::InvalidDifficulty(raw)) if raw == "legendary"
        ));
    }

    #[test]
    fn difficulty_is_ordered() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
    }

    #[test]
    fn bonus_ranges_shift_upward() {
        let mut previous = (0, 0);
        for tier in Difficulty::ALL {
            let range = tier.bonus_range();
            assert!(range.0 > previous.0 && range.1 > previous.1);
            previous = range;
        }
    }

    #[test]
    fn mission_rejects_inverted_rewards() {
        let err = Mission::new(MissionId(9), "Bad", Difficulty::Easy, 5, (10, 2)).unwrap_err();
        assert!(matches!(err, MissionError::InvalidMission(_)));
        let err = Mission::new(MissionId(9), "Bad", Difficulty::Easy, -1, (1, 2)).unwrap_err();
        assert!(matches!(err, MissionError::InvalidMission(_)));
        let ok = Mission::new(MissionId(1), "Fine", Difficulty::Easy, 0, (3, 3)).unwrap();
        assert_eq!(ok.reward_label(), "3-3");
    }
}
