//! Centralized balance and tuning constants for CrimeCoin mission logic.
//!
//! These values define the math behind every mission attempt. Keeping them
//! together ensures that balancing can only be adjusted via code changes
//! reviewed in version control, rather than through the content assets.

// Stat model ---------------------------------------------------------------
pub const STAT_MIN: u8 = 0;
pub const STAT_MAX: u8 = 100;
pub(crate) const STEALTH_START_BAND: (u8, u8) = (50, 79);
pub(crate) const INTIMIDATION_START_BAND: (u8, u8) = (60, 89);
pub(crate) const SPEED_START_BAND: (u8, u8) = (40, 69);
pub(crate) const LUCK_START_BAND: (u8, u8) = (20, 49);
pub(crate) const SUCCESS_BONUS_DIVISOR: u32 = 4;

// Content generation -------------------------------------------------------
pub const DEFAULT_OFFER_COUNT: usize = 3;
pub(crate) const REPLACEMENT_OFFER_COUNT: usize = 1;
pub(crate) const EASY_BONUS_RANGE: (u32, u32) = (5, 15);
pub(crate) const MEDIUM_BONUS_RANGE: (u32, u32) = (10, 20);
pub(crate) const HARD_BONUS_RANGE: (u32, u32) = (15, 25);
pub(crate) const SPECIAL_OFFER_CHANCE: f64 = 0.25;
pub(crate) const SPECIAL_OFFER_BONUS: u32 = 15;
pub(crate) const SPECIAL_OFFER_RISK: u8 = 40;
pub(crate) const EASY_BONUS_ITEM_CHANCE: f64 = 0.10;
pub(crate) const MEDIUM_BONUS_ITEM_CHANCE: f64 = 0.30;
pub(crate) const HARD_BONUS_ITEM_CHANCE: f64 = 0.50;

// Session progression ------------------------------------------------------
pub const PROGRESS_COMPLETE: u8 = 100;
pub(crate) const ACTION_PROGRESS_STEP: u8 = 20;
pub(crate) const CONTINUE_PROGRESS_STEP: u8 = 20;
pub(crate) const MILESTONE_STEP: u8 = 20;
pub(crate) const RANDOM_EVENT_MIN_PROGRESS: u8 = 60;
pub(crate) const RANDOM_EVENT_CHANCE: f64 = 0.30;
pub(crate) const RANDOM_EVENT_BOOST: u32 = 5;
pub(crate) const RISK_PENALTY_DIVISOR: u32 = 10;

// Success chance -----------------------------------------------------------
pub(crate) const EASY_CHANCE_BONUS: f64 = 0.20;
pub(crate) const EASY_CHANCE_CAP: f64 = 0.95;
pub(crate) const MEDIUM_CHANCE_BONUS: f64 = 0.10;
pub(crate) const MEDIUM_CHANCE_CAP: f64 = 0.85;
pub(crate) const HARD_CHANCE_BONUS: f64 = 0.0;
pub(crate) const HARD_CHANCE_CAP: f64 = 0.75;
pub(crate) const LUCK_CHANCE_DIVISOR: f64 = 200.0;
pub(crate) const FINAL_CHANCE_CAP: f64 = 0.95;

// Rewards ------------------------------------------------------------------
pub(crate) const PERFORMANCE_PIVOT: f64 = 0.5;
pub(crate) const PERFORMANCE_WEIGHT: f64 = 0.5;
pub(crate) const REWARD_MULTIPLIER_CAP: f64 = 1.5;
pub(crate) const SUCCESS_FUN_COIN_RANGE: (u32, u32) = (10, 30);
pub(crate) const SUCCESS_XP_DIVISOR: i64 = 10;
pub(crate) const SUCCESS_XP_JITTER: u32 = 5;
pub(crate) const NOTORIETY_DIVISOR: i64 = 50;

// Penalties ----------------------------------------------------------------
pub(crate) const EASY_LOSS_MULTIPLIER: f64 = 0.5;
pub(crate) const MEDIUM_LOSS_MULTIPLIER: f64 = 1.0;
pub(crate) const HARD_LOSS_MULTIPLIER: f64 = 1.5;
pub(crate) const FAILURE_FUN_COIN_SCALE: f64 = 5.0;
pub(crate) const FAILURE_EXPERIENCE: u32 = 5;
pub(crate) const ABORT_REFUND_FRACTION: f64 = 0.25;
pub(crate) const ABORT_FUN_COIN: u32 = 1;

// Ledger -------------------------------------------------------------------
pub const DEFAULT_PLAYER_CRIME_COIN: i64 = 1_337;
pub const DEFAULT_PLAYER_FUN_COIN: i64 = 42;
pub(crate) const NEW_PLAYER_CRIME_COIN: i64 = 1_000;
pub(crate) const NEW_PLAYER_FUN_COIN: i64 = 10;
pub(crate) const NEW_PLAYER_NOTORIETY: u32 = 1;
pub const EXPERIENCE_PER_LEVEL: u32 = 1_000;

// Float comparisons --------------------------------------------------------
pub const FLOAT_EPSILON: f64 = 1e-9;
