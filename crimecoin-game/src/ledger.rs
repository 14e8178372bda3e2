//! Cumulative player balances and mission history.
//!
//! The engine only reaches the ledger through [`PlayerLedger`]. [`MemoryLedger`]
//! is the in-process implementation used by the tester and the test suites.
use crate::constants::{
    DEFAULT_PLAYER_CRIME_COIN, DEFAULT_PLAYER_FUN_COIN, EXPERIENCE_PER_LEVEL,
    NEW_PLAYER_CRIME_COIN, NEW_PLAYER_FUN_COIN, NEW_PLAYER_NOTORIETY,
};
use crate::data::BonusItem;
use crate::mission::{Mission, MissionId};
use crate::outcome::{Outcome, OutcomeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Player identifier passed explicitly to every engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Persistent player profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub username: String,
    pub reputation: String,
    pub crime_coin: i64,
    pub fun_coin: i64,
    pub level: u32,
    /// Experience toward the next level.
    pub experience: u32,
    pub successful_missions: u32,
    pub total_missions: u32,
    pub total_earnings: i64,
    pub biggest_heist: i64,
    pub daily_missions: u32,
    pub notoriety: u32,
    #[serde(default)]
    pub inventory: Vec<BonusItem>,
}

impl PlayerRecord {
    /// Fresh profile with the starting balances.
    #[must_use]
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            reputation: "Rookie Thief".to_string(),
            crime_coin: NEW_PLAYER_CRIME_COIN,
            fun_coin: NEW_PLAYER_FUN_COIN,
            level: 1,
            experience: 0,
            successful_missions: 0,
            total_missions: 0,
            total_earnings: 0,
            biggest_heist: 0,
            daily_missions: 0,
            notoriety: NEW_PLAYER_NOTORIETY,
            inventory: Vec::new(),
        }
    }

    /// The seeded demo player.
    #[must_use]
    pub fn demo(id: PlayerId) -> Self {
        Self {
            crime_coin: DEFAULT_PLAYER_CRIME_COIN,
            fun_coin: DEFAULT_PLAYER_FUN_COIN,
            level: 3,
            experience: 350,
            successful_missions: 21,
            total_missions: 29,
            total_earnings: 4_269,
            biggest_heist: 420,
            daily_missions: 3,
            ..Self::new(id, "Player")
        }
    }

    /// Deduct an entry cost. Callers check the balance first.
    pub fn charge(&mut self, amount: i64) {
        self.crime_coin = (self.crime_coin - amount.max(0)).max(0);
    }

    /// Fold a terminal outcome into the cumulative profile.
    pub fn apply_outcome(&mut self, outcome: &Outcome) {
        self.crime_coin = (self.crime_coin + outcome.crime_coin_delta).max(0);
        self.fun_coin += i64::from(outcome.fun_coin_gained);
        self.total_missions = self.total_missions.saturating_add(1);
        self.daily_missions = self.daily_missions.saturating_add(1);
        self.notoriety = self.notoriety.saturating_add(outcome.notoriety_gained);
        if outcome.is_success() {
            self.successful_missions = self.successful_missions.saturating_add(1);
            self.total_earnings += outcome.crime_coin_delta;
            self.biggest_heist = self.biggest_heist.max(outcome.crime_coin_delta);
            self.inventory.extend(outcome.bonus_items.iter().cloned());
        }
        self.gain_experience(outcome.experience_gained);
    }

    /// Experience needed to leave the current level.
    #[must_use]
    pub const fn next_level_threshold(&self) -> u32 {
        EXPERIENCE_PER_LEVEL.saturating_mul(self.level)
    }

    fn gain_experience(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(amount);
        while self.next_level_threshold() > 0 && self.experience >= self.next_level_threshold() {
            self.experience -= self.next_level_threshold();
            self.level = self.level.saturating_add(1);
            log::info!("player {} reached level {}", self.id, self.level);
        }
    }
}

/// One recorded mission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub player: PlayerId,
    pub mission: MissionId,
    pub mission_name: String,
    pub timestamp: DateTime<Utc>,
    pub kind: OutcomeKind,
    pub success: bool,
    pub crime_coin_change: i64,
    pub fun_coin_change: u32,
    pub experience_gained: u32,
}

/// Persistence collaborator for player currency and history.
///
/// Implementations use interior mutability so one ledger can serve many
/// players concurrently.
pub trait PlayerLedger {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_player(&self, player: PlayerId) -> Result<Option<PlayerRecord>, Self::Error>;

    /// Deduct `amount` $CRIME from the player.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unknown, cannot cover the amount, or
    /// the write fails.
    fn charge(&self, player: PlayerId, amount: i64) -> Result<PlayerRecord, Self::Error>;

    /// Apply a terminal outcome and append a history entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unknown or the write fails.
    fn apply_outcome(
        &self,
        player: PlayerId,
        mission: &Mission,
        outcome: &Outcome,
    ) -> Result<PlayerRecord, Self::Error>;

    /// History for the player, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn history(&self, player: PlayerId) -> Result<Vec<HistoryEntry>, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("player {0} is not registered")]
    UnknownPlayer(PlayerId),
    #[error("player {player} has {available} $CRIME, needs {required}")]
    InsufficientBalance {
        player: PlayerId,
        required: i64,
        available: i64,
    },
    #[error("write rejected: {0}")]
    WriteRejected(String),
    #[error("ledger lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct LedgerTables {
    players: HashMap<PlayerId, PlayerRecord>,
    history: Vec<HistoryEntry>,
    next_history_id: u64,
}

/// In-memory [`PlayerLedger`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: Mutex<LedgerTables>,
    fail_writes: AtomicBool,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with the demo player as id 1.
    #[must_use]
    pub fn with_default_player() -> Self {
        let ledger = Self::new();
        ledger.insert_player(PlayerRecord::demo(PlayerId(1)));
        ledger
    }

    /// Insert or replace a player record.
    pub fn insert_player(&self, record: PlayerRecord) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .players
            .insert(record.id, record);
    }

    /// Make every subsequent write fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::WriteRejected("ledger is read-only".to_string()));
        }
        Ok(())
    }

    fn with_tables<T>(
        &self,
        f: impl FnOnce(&mut LedgerTables) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut tables = self.tables.lock().map_err(|_| LedgerError::Poisoned)?;
        f(&mut tables)
    }
}

impl PlayerLedger for MemoryLedger {
    type Error = LedgerError;

    fn get_player(&self, player: PlayerId) -> Result<Option<PlayerRecord>, Self::Error> {
        self.with_tables(|tables| Ok(tables.players.get(&player).cloned()))
    }

    fn charge(&self, player: PlayerId, amount: i64) -> Result<PlayerRecord, Self::Error> {
        self.check_writable()?;
        self.with_tables(|tables| {
            let record = tables
                .players
                .get_mut(&player)
                .ok_or(LedgerError::UnknownPlayer(player))?;
            if record.crime_coin < amount {
                return Err(LedgerError::InsufficientBalance {
                    player,
                    required: amount,
                    available: record.crime_coin,
                });
            }
            record.charge(amount);
            Ok(record.clone())
        })
    }

    fn apply_outcome(
        &self,
        player: PlayerId,
        mission: &Mission,
        outcome: &Outcome,
    ) -> Result<PlayerRecord, Self::Error> {
        self.check_writable()?;
        self.with_tables(|tables| {
            let record = tables
                .players
                .get_mut(&player)
                .ok_or(LedgerError::UnknownPlayer(player))?;
            record.apply_outcome(outcome);
            let updated = record.clone();

            let id = tables.next_history_id;
            tables.next_history_id += 1;
            tables.history.push(HistoryEntry {
                id,
                player,
                mission: mission.id,
                mission_name: mission.name.clone(),
                timestamp: Utc::now(),
                kind: outcome.kind,
                success: outcome.is_success(),
                crime_coin_change: outcome.crime_coin_delta,
                fun_coin_change: outcome.fun_coin_gained,
                experience_gained: outcome.experience_gained,
            });
            Ok(updated)
        })
    }

    fn history(&self, player: PlayerId) -> Result<Vec<HistoryEntry>, Self::Error> {
        self.with_tables(|tables| {
            let mut entries: Vec<HistoryEntry> = tables
                .history
                .iter()
                .filter(|entry| entry.player == player)
                .cloned()
                .collect();
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
            Ok(entries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentGenerator;
    use crate::mission::Difficulty;
    use crate::outcome::abort_outcome;

    fn heist() -> Mission {
        Mission::new(MissionId(2), "Corner Store Heist", Difficulty::Medium, 10, (20, 40)).unwrap()
    }

    fn win(delta: i64) -> Outcome {
        Outcome {
            kind: OutcomeKind::Success,
            crime_coin_delta: delta,
            crime_coin_lost: 0,
            attempt_net: delta - 10,
            fun_coin_gained: 12,
            experience_gained: 800,
            notoriety_gained: 1,
            success_chance: 0.85,
            roll: Some(0.5),
            base_reward: 30,
            narrative: "Clean getaway.".to_string(),
            lesson: None,
            bonus_items: vec![BonusItem {
                name: "Ski Mask".to_string(),
                icon: "fa-mask".to_string(),
            }],
        }
    }

    #[test]
    fn insert_player_survives_a_poisoned_lock() {
        let ledger = MemoryLedger::new();
        let panicked = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _tables = ledger.tables.lock().unwrap();
                    panic!("writer died mid-update");
                })
                .join()
        });
        assert!(panicked.is_err());
        assert_eq!(ledger.get_player(PlayerId(9)), Err(LedgerError::Poisoned));

        ledger.insert_player(PlayerRecord::new(PlayerId(9), "late"));
        let tables = ledger.tables.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(tables.players[&PlayerId(9)].username, "late");
    }

    #[test]
    fn default_player_matches_seed_profile() {
        let ledger = MemoryLedger::with_default_player();
        let player = ledger.get_player(PlayerId(1)).unwrap().unwrap();
        assert_eq!(player.crime_coin, 1_337);
        assert_eq!(player.fun_coin, 42);
        assert_eq!(player.level, 3);
        assert!(ledger.get_player(PlayerId(2)).unwrap().is_none());
    }

    #[test]
    fn charge_rejects_overdraft() {
        let ledger = MemoryLedger::new();
        let mut record = PlayerRecord::new(PlayerId(5), "kid");
        record.crime_coin = 8;
        ledger.insert_player(record);
        assert!(matches!(
            ledger.charge(PlayerId(5), 10),
            Err(LedgerError::InsufficientBalance { available: 8, .. })
        ));
        assert_eq!(ledger.charge(PlayerId(5), 8).unwrap().crime_coin, 0);
        assert_eq!(
            ledger.charge(PlayerId(6), 1).unwrap_err(),
            LedgerError::UnknownPlayer(PlayerId(6))
        );
    }

    #[test]
    fn success_updates_counters_and_levels() {
        let mut record = PlayerRecord::new(PlayerId(1), "p");
        record.experience = 300;
        record.apply_outcome(&win(40));
        assert_eq!(record.crime_coin, 1_040);
        assert_eq!(record.fun_coin, 22);
        assert_eq!(record.level, 2);
        assert_eq!(record.experience, 100);
        assert_eq!(record.successful_missions, 1);
        assert_eq!(record.total_earnings, 40);
        assert_eq!(record.biggest_heist, 40);
        assert_eq!(record.notoriety, 2);
        assert_eq!(record.inventory.len(), 1);
    }

    #[test]
    fn balance_never_goes_negative() {
        let mut record = PlayerRecord::new(PlayerId(1), "p");
        record.crime_coin = 2;
        let mut loss = win(0);
        loss.kind = OutcomeKind::Failure;
        loss.crime_coin_delta = -30;
        record.apply_outcome(&loss);
        assert_eq!(record.crime_coin, 0);
        assert_eq!(record.successful_missions, 0);
        assert_eq!(record.total_missions, 1);
    }

    #[test]
    fn history_is_newest_first_and_writes_can_fail() {
        let ledger = MemoryLedger::with_default_player();
        let mission = heist();
        let aborted = abort_outcome(&mission, &ContentGenerator::default());
        ledger.apply_outcome(PlayerId(1), &mission, &win(35)).unwrap();
        ledger.apply_outcome(PlayerId(1), &mission, &aborted).unwrap();

        let history = ledger.history(PlayerId(1)).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, OutcomeKind::Aborted);
        assert!(history[1].success);
        assert!(history[0].timestamp >= history[1].timestamp);

        ledger.set_fail_writes(true);
        assert!(matches!(
            ledger.apply_outcome(PlayerId(1), &mission, &aborted),
            Err(LedgerError::WriteRejected(_))
        ));
        assert_eq!(ledger.history(PlayerId(1)).unwrap().len(), 2);
    }
}
