//! Transient four-stat vector used during a single mission attempt.
use crate::constants::{
    INTIMIDATION_START_BAND, LUCK_START_BAND, SPEED_START_BAND, STAT_MAX, STAT_MIN,
    STEALTH_START_BAND, SUCCESS_BONUS_DIVISOR,
};
use crate::numbers::clamp_u32_to_u8;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four named aptitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Stealth,
    Intimidation,
    Speed,
    Luck,
}

impl Stat {
    /// Enumeration order; ties in [`StatVector::weakest_stat`] resolve to the earliest entry.
    pub const ALL: [Self; 4] = [Self::Stealth, Self::Intimidation, Self::Speed, Self::Luck];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Stealth => "stealth",
            Self::Intimidation => "intimidation",
            Self::Speed => "speed",
            Self::Luck => "luck",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Stat affected by an action: a single aptitude or the all-round `success` boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatTarget {
    Stealth,
    Intimidation,
    Speed,
    Luck,
    Success,
}

impl StatTarget {
    #[must_use]
    pub const fn stat(self) -> Option<Stat> {
        match self {
            Self::Stealth => Some(Stat::Stealth),
            Self::Intimidation => Some(Stat::Intimidation),
            Self::Speed => Some(Stat::Speed),
            Self::Luck => Some(Stat::Luck),
            Self::Success => None,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self.stat() {
            Some(stat) => stat.key(),
            None => "success",
        }
    }
}

impl From<Stat> for StatTarget {
    fn from(stat: Stat) -> Self {
        match stat {
            Stat::Stealth => Self::Stealth,
            Stat::Intimidation => Self::Intimidation,
            Stat::Speed => Self::Speed,
            Stat::Luck => Self::Luck,
        }
    }
}

impl FromStr for StatTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stealth" => Ok(Self::Stealth),
            "intimidation" => Ok(Self::Intimidation),
            "speed" => Ok(Self::Speed),
            "luck" => Ok(Self::Luck),
            "success" => Ok(Self::Success),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Momentary aptitude during one mission attempt. Every component stays in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatVector {
    pub stealth: u8,
    pub intimidation: u8,
    pub speed: u8,
    pub luck: u8,
}

impl Default for StatVector {
    fn default() -> Self {
        Self::uniform(STAT_MIN)
    }
}

impl StatVector {
    /// Build a vector, clamping each component into range.
    #[must_use]
    pub fn new(stealth: u8, intimidation: u8, speed: u8, luck: u8) -> Self {
        Self {
            stealth: stealth.min(STAT_MAX),
            intimidation: intimidation.min(STAT_MAX),
            speed: speed.min(STAT_MAX),
            luck: luck.min(STAT_MAX),
        }
    }

    #[must_use]
    pub fn uniform(value: u8) -> Self {
        Self::new(value, value, value, value)
    }

    /// Fresh vector drawn from the fixed baseline bands. Difficulty plays no part.
    pub fn random_initial<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut draw = |band: (u8, u8)| rng.gen_range(band.0..=band.1);
        Self {
            stealth: draw(STEALTH_START_BAND),
            intimidation: draw(INTIMIDATION_START_BAND),
            speed: draw(SPEED_START_BAND),
            luck: draw(LUCK_START_BAND),
        }
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> u8 {
        match stat {
            Stat::Stealth => self.stealth,
            Stat::Intimidation => self.intimidation,
            Stat::Speed => self.speed,
            Stat::Luck => self.luck,
        }
    }

    /// Copy of the vector with one component replaced (clamped).
    #[must_use]
    pub fn with(mut self, stat: Stat, value: u8) -> Self {
        let value = value.min(STAT_MAX);
        match stat {
            Stat::Stealth => self.stealth = value,
            Stat::Intimidation => self.intimidation = value,
            Stat::Speed => self.speed = value,
            Stat::Luck => self.luck = value,
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, u8)> + '_ {
        Stat::ALL.into_iter().map(|stat| (stat, self.get(stat)))
    }

    #[must_use]
    pub fn average(&self) -> f64 {
        let total: u32 = self.iter().map(|(_, value)| u32::from(value)).sum();
        f64::from(total) / 4.0
    }

    /// Increase the targeted stat, clamped to 100. `success` spreads a quarter
    /// of the amount over every stat.
    #[must_use]
    pub fn apply_bonus(self, target: StatTarget, amount: u32) -> Self {
        self.shift(target, amount, raise)
    }

    /// Decrease the targeted stat, clamped to 0.
    #[must_use]
    pub fn apply_penalty(self, target: StatTarget, amount: u32) -> Self {
        self.shift(target, amount, lower)
    }

    /// String-keyed bonus; unrecognized stat names leave the vector untouched.
    #[must_use]
    pub fn apply_bonus_named(self, stat_name: &str, amount: u32) -> Self {
        stat_name
            .parse::<StatTarget>()
            .map_or(self, |target| self.apply_bonus(target, amount))
    }

    /// String-keyed penalty; unrecognized stat names leave the vector untouched.
    #[must_use]
    pub fn apply_penalty_named(self, stat_name: &str, amount: u32) -> Self {
        stat_name
            .parse::<StatTarget>()
            .map_or(self, |target| self.apply_penalty(target, amount))
    }

    /// Lowest stat; the first minimum in [`Stat::ALL`] order wins ties.
    #[must_use]
    pub fn weakest_stat(&self) -> Stat {
        let mut weakest = Stat::Stealth;
        for stat in Stat::ALL {
            if self.get(stat) < self.get(weakest) {
                weakest = stat;
            }
        }
        weakest
    }

    fn shift(self, target: StatTarget, amount: u32, op: fn(u8, u32) -> u8) -> Self {
        match target.stat() {
            Some(stat) => self.with(stat, op(self.get(stat), amount)),
            None => {
                let share = amount / SUCCESS_BONUS_DIVISOR;
                Stat::ALL
                    .into_iter()
                    .fold(self, |acc, stat| acc.with(stat, op(acc.get(stat), share)))
            }
        }
    }
}

fn raise(current: u8, amount: u32) -> u8 {
    clamp_u32_to_u8(u32::from(current).saturating_add(amount).min(u32::from(STAT_MAX)))
}

fn lower(current: u8, amount: u32) -> u8 {
    clamp_u32_to_u8(u32::from(current).saturating_sub(amount))
}
