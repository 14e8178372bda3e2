//! Multi-player front for the mission engine.
//!
//! Each player owns at most one live session. Calls for the same player are
//! serialized by a per-player lock while different players run in parallel.
//! Ledger writes at terminal transitions are at-least-once: a failed write is
//! queued and the outcome is still returned to the caller.
use crate::catalog::MissionCatalog;
use crate::content::ActionOffer;
use crate::error::MissionError;
use crate::ledger::{HistoryEntry, PlayerId, PlayerLedger, PlayerRecord};
use crate::mission::{Mission, MissionId};
use crate::outcome::Outcome;
use crate::session::{ActionReport, ContinueResult, MissionSession, ProgressUpdate, SessionPhase};
use crate::stats::StatVector;
use crate::MissionEngine;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Returned by [`MissionService::charge_and_start_mission`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReport {
    pub mission: MissionId,
    pub offers: Vec<ActionOffer>,
    pub stats: StatVector,
    pub narrative: String,
    /// $CRIME left after the entry cost.
    pub balance: i64,
    pub seed: u64,
}

/// Whether the ledger has absorbed an outcome yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerStatus {
    Applied(PlayerRecord),
    Queued { reason: String },
}

/// Terminal outcome plus the state of its ledger write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub ledger: LedgerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContinueReport {
    Advanced(ProgressUpdate),
    Resolved(Resolution),
}

#[derive(Debug, Clone)]
struct PendingWrite {
    player: PlayerId,
    mission: Mission,
    outcome: Outcome,
}

type SessionSlot = Arc<Mutex<Option<MissionSession>>>;

/// Session registry over a [`MissionEngine`].
pub struct MissionService<C, L>
where
    C: MissionCatalog,
    L: PlayerLedger,
{
    engine: MissionEngine<C, L>,
    sessions: Mutex<HashMap<PlayerId, SessionSlot>>,
    seeds: Mutex<ChaCha20Rng>,
    pending: Mutex<VecDeque<PendingWrite>>,
}

impl<C, L> MissionService<C, L>
where
    C: MissionCatalog,
    L: PlayerLedger,
{
    /// Session seeds are drawn from a ChaCha stream keyed by `master_seed`.
    pub fn new(catalog: C, ledger: L, master_seed: u64) -> Self {
        Self {
            engine: MissionEngine::new(catalog, ledger),
            sessions: Mutex::new(HashMap::new()),
            seeds: Mutex::new(ChaCha20Rng::seed_from_u64(master_seed)),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub const fn engine(&self) -> &MissionEngine<C, L> {
        &self.engine
    }

    /// Charge the entry cost and open a fresh session.
    ///
    /// A finished session for the same player is replaced; a live one blocks
    /// the call.
    ///
    /// # Errors
    ///
    /// [`MissionError::InsufficientFunds`] with no charge, lookup errors, or
    /// [`MissionError::InvalidSessionState`] while another mission is live.
    pub fn charge_and_start_mission(
        &self,
        player: PlayerId,
        mission: MissionId,
    ) -> Result<StartReport, MissionError> {
        let slot = self.slot(player);
        let mut guard = lock(&slot);
        if let Some(live) = guard.as_ref().filter(|session| !session.is_terminal()) {
            return Err(MissionError::InvalidSessionState {
                phase: live.phase(),
                operation: "start another mission",
            });
        }

        let seed = self.next_seed();
        let (session, record) = self.engine.start_mission(player, mission, seed)?;
        let report = StartReport {
            mission,
            offers: session.offers().to_vec(),
            stats: session.stats(),
            narrative: session.narrative().to_string(),
            balance: record.crime_coin,
            seed,
        };
        *guard = Some(session);
        Ok(report)
    }

    /// Take an action in the player's live session.
    ///
    /// # Errors
    ///
    /// [`MissionError::NoActiveSession`] when the player has no session for
    /// `mission`, plus any session error.
    pub fn submit_action(
        &self,
        player: PlayerId,
        mission: MissionId,
        offer_id: u32,
    ) -> Result<ActionReport, MissionError> {
        self.with_session(player, mission, |session| session.take_action(offer_id))
    }

    /// Advance the player's session; resolves and settles it at full progress.
    ///
    /// # Errors
    ///
    /// [`MissionError::NoActiveSession`] or any session error.
    pub fn continue_mission(
        &self,
        player: PlayerId,
        mission: MissionId,
    ) -> Result<ContinueReport, MissionError> {
        self.with_session(player, mission, |session| {
            Ok(match session.continue_mission()? {
                ContinueResult::Advanced(update) => ContinueReport::Advanced(update),
                ContinueResult::Resolved(outcome) => {
                    ContinueReport::Resolved(self.settle(player, session.mission(), outcome))
                }
            })
        })
    }

    /// Finish the player's session: roll it when `attempt`, abort otherwise.
    ///
    /// The server-held stat vector is used for the roll.
    ///
    /// # Errors
    ///
    /// [`MissionError::MissionIncomplete`] for an attempt before progress
    /// reaches 100, [`MissionError::NoActiveSession`], or a session error.
    pub fn resolve_or_abort(
        &self,
        player: PlayerId,
        mission: MissionId,
        attempt: bool,
    ) -> Result<Resolution, MissionError> {
        self.with_session(player, mission, |session| {
            let outcome = if attempt {
                session.resolve()?
            } else {
                session.abort()?
            };
            Ok(self.settle(player, session.mission(), outcome))
        })
    }

    /// Retry queued ledger writes. Returns how many were applied.
    pub fn retry_pending_writes(&self) -> usize {
        let mut queue = lock(&self.pending);
        let mut applied = 0;
        let mut remaining = VecDeque::with_capacity(queue.len());
        while let Some(write) = queue.pop_front() {
            match self
                .engine
                .apply_outcome(write.player, &write.mission, &write.outcome)
            {
                Ok(_) => applied += 1,
                Err(err) => {
                    log::warn!("ledger write for player {} still failing: {err}", write.player);
                    remaining.push_back(write);
                }
            }
        }
        *queue = remaining;
        applied
    }

    #[must_use]
    pub fn pending_writes(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Phase of the player's current session, if any.
    #[must_use]
    pub fn session_phase(&self, player: PlayerId) -> Option<(MissionId, SessionPhase)> {
        let slot = lock(&self.sessions).get(&player).cloned()?;
        let guard = lock(&slot);
        guard
            .as_ref()
            .map(|session| (session.mission().id, session.phase()))
    }

    /// # Errors
    ///
    /// Returns an error if the player is unknown or the ledger fails.
    pub fn player(&self, player: PlayerId) -> Result<PlayerRecord, MissionError> {
        self.engine.player(player)
    }

    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn history(&self, player: PlayerId) -> Result<Vec<HistoryEntry>, MissionError> {
        self.engine.history(player)
    }

    fn slot(&self, player: PlayerId) -> SessionSlot {
        Arc::clone(lock(&self.sessions).entry(player).or_default())
    }

    fn next_seed(&self) -> u64 {
        lock(&self.seeds).next_u64()
    }

    fn with_session<T>(
        &self,
        player: PlayerId,
        mission: MissionId,
        f: impl FnOnce(&mut MissionSession) -> Result<T, MissionError>,
    ) -> Result<T, MissionError> {
        let no_session = MissionError::NoActiveSession { player, mission };
        let slot = lock(&self.sessions)
            .get(&player)
            .cloned()
            .ok_or_else(|| no_session.clone())?;
        let mut guard = lock(&slot);
        match guard.as_mut() {
            Some(session) if session.mission().id == mission => f(session),
            _ => Err(no_session),
        }
    }

    /// Apply or queue a terminal outcome. Runs under the player's slot lock so
    /// a new start cannot slip in before the credit lands.
    fn settle(&self, player: PlayerId, mission: &Mission, outcome: Outcome) -> Resolution {
        let ledger = match self.engine.apply_outcome(player, mission, &outcome) {
            Ok(record) => LedgerStatus::Applied(record),
            Err(err) => {
                log::warn!("queueing ledger write for player {player}: {err}");
                lock(&self.pending).push_back(PendingWrite {
                    player,
                    mission: mission.clone(),
                    outcome: outcome.clone(),
                });
                LedgerStatus::Queued {
                    reason: err.to_string(),
                }
            }
        };
        Resolution { outcome, ledger }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
