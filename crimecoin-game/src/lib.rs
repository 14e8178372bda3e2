//! CrimeCoin Mission Engine
//!
//! Platform-agnostic mission resolution logic for the CrimeCoin crime game.
//! Players pay $CRIME to attempt a mission, pick actions that shift a hidden
//! stat vector, then roll an outcome that pays out or costs them more.
//! Persistence and mission definitions are reached through traits so the
//! crate carries no storage or transport dependencies.

pub mod catalog;
pub mod constants;
pub mod content;
pub mod data;
pub mod error;
pub mod ledger;
pub mod mission;
pub mod numbers;
pub mod outcome;
pub mod rng;
pub mod service;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use catalog::{CatalogError, MissionCatalog, StaticCatalog};
pub use content::{
    ActionOffer, ContentGenerator, OutcomeNarrative, RandomEvent, generate_actions,
    generate_outcome_narrative,
};
pub use data::{BonusItem, ContentData};
pub use error::MissionError;
pub use ledger::{HistoryEntry, LedgerError, MemoryLedger, PlayerId, PlayerLedger, PlayerRecord};
pub use mission::{Difficulty, Mission, MissionId};
pub use outcome::{Outcome, OutcomeKind, final_chance, success_chance};
pub use rng::{DrawCounts, RngBundle};
pub use service::{ContinueReport, LedgerStatus, MissionService, Resolution, StartReport};
pub use session::{
    ActionReport, Complication, ContinueResult, MissionSession, ProgressUpdate, SessionPhase,
};
pub use stats::{Stat, StatTarget, StatVector};

/// Binds a mission catalog to a player ledger.
///
/// The engine performs the ledger side of a mission: it charges the entry
/// cost when a session starts and applies the outcome once it ends. Sessions
/// themselves stay with the caller.
pub struct MissionEngine<C, L>
where
    C: MissionCatalog,
    L: PlayerLedger,
{
    catalog: C,
    ledger: L,
}

impl<C, L> MissionEngine<C, L>
where
    C: MissionCatalog,
    L: PlayerLedger,
{
    /// Create a new engine with the provided catalog and ledger
    pub const fn new(catalog: C, ledger: L) -> Self {
        Self { catalog, ledger }
    }

    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Look up a mission, mapping absence to [`MissionError::MissionNotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if the mission is unknown or the catalog fails.
    pub fn mission(&self, id: MissionId) -> Result<Mission, MissionError> {
        self.catalog
            .get_mission(id)
            .map_err(|err| MissionError::Catalog(err.to_string()))?
            .ok_or(MissionError::MissionNotFound(id))
    }

    /// Current ledger record for a player.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unknown or the ledger fails.
    pub fn player(&self, player: PlayerId) -> Result<PlayerRecord, MissionError> {
        self.ledger
            .get_player(player)
            .map_err(|err| MissionError::LedgerReadFailed(err.to_string()))?
            .ok_or(MissionError::PlayerNotFound(player))
    }

    /// Start a session and charge its entry cost exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InsufficientFunds`] without charging anything
    /// when the balance is short, or a lookup/ledger error.
    pub fn start_mission(
        &self,
        player: PlayerId,
        mission_id: MissionId,
        seed: u64,
    ) -> Result<(MissionSession, PlayerRecord), MissionError> {
        let mission = self.mission(mission_id)?;
        let record = self.player(player)?;
        let mut session = MissionSession::new(player, mission, seed);
        session.start(record.crime_coin)?;
        let charged = self
            .ledger
            .charge(player, session.mission().cost)
            .map_err(|err| MissionError::LedgerWriteFailed(err.to_string()))?;
        Ok((session, charged))
    }

    /// Apply a finished session's outcome to the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::InvalidSessionState`] while the session is not
    /// terminal, or [`MissionError::LedgerWriteFailed`] if the write fails.
    pub fn record_outcome(&self, session: &MissionSession) -> Result<PlayerRecord, MissionError> {
        let Some(outcome) = session.outcome() else {
            return Err(MissionError::InvalidSessionState {
                phase: session.phase(),
                operation: "record an outcome",
            });
        };
        self.apply_outcome(session.player(), session.mission(), outcome)
    }

    pub(crate) fn apply_outcome(
        &self,
        player: PlayerId,
        mission: &Mission,
        outcome: &Outcome,
    ) -> Result<PlayerRecord, MissionError> {
        self.ledger
            .apply_outcome(player, mission, outcome)
            .map_err(|err| MissionError::LedgerWriteFailed(err.to_string()))
    }

    /// Mission history for a player, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn history(&self, player: PlayerId) -> Result<Vec<HistoryEntry>, MissionError> {
        self.ledger
            .history(player)
            .map_err(|err| MissionError::LedgerReadFailed(err.to_string()))
    }
}
