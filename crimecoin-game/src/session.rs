//! State machine for a single mission attempt.
use crate::constants::{
    ACTION_PROGRESS_STEP, CONTINUE_PROGRESS_STEP, DEFAULT_OFFER_COUNT, PROGRESS_COMPLETE,
    RANDOM_EVENT_BOOST, RANDOM_EVENT_CHANCE, RANDOM_EVENT_MIN_PROGRESS, REPLACEMENT_OFFER_COUNT,
    RISK_PENALTY_DIVISOR, SUCCESS_BONUS_DIVISOR,
};
use crate::content::{ActionOffer, ContentGenerator, RandomEvent};
use crate::error::MissionError;
use crate::ledger::PlayerId;
use crate::mission::Mission;
use crate::outcome::{self, Outcome, OutcomeKind};
use crate::rng::{DrawCounts, RngBundle};
use crate::stats::{Stat, StatTarget, StatVector};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Lifecycle phase of a [`MissionSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Success,
    Failure,
    Aborted,
}

impl SessionPhase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Aborted)
    }

    const fn from_outcome(kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::Success => Self::Success,
            OutcomeKind::Failure => Self::Failure,
            OutcomeKind::Aborted => Self::Aborted,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Penalty rolled against a risky action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complication {
    pub stat: Stat,
    pub penalty: u32,
    pub message: String,
}

/// Result of [`MissionSession::take_action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    pub offer: ActionOffer,
    pub progress_increase: u8,
    pub progress: u8,
    pub narrative: String,
    /// Nominal bonus per affected stat before clamping.
    pub stat_increase: u32,
    pub complication: Option<Complication>,
    pub replacements: Vec<ActionOffer>,
    pub stats: StatVector,
}

/// Progress step taken by [`MissionSession::continue_mission`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub progress: u8,
    pub narrative: String,
    pub event: Option<RandomEvent>,
    pub stats: StatVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContinueResult {
    Advanced(ProgressUpdate),
    Resolved(Outcome),
}

/// One player's attempt at one mission.
///
/// Owned exclusively by its caller; every mutation goes through `&mut self`.
#[derive(Debug, Clone)]
pub struct MissionSession {
    player: PlayerId,
    mission: Mission,
    phase: SessionPhase,
    stats: StatVector,
    progress: u8,
    offers: SmallVec<[ActionOffer; 4]>,
    narrative: String,
    log: Vec<String>,
    outcome: Option<Outcome>,
    rng: RngBundle,
    next_offer_id: u32,
    content: ContentGenerator<'static>,
}

impl MissionSession {
    #[must_use]
    pub fn new(player: PlayerId, mission: Mission, seed: u64) -> Self {
        Self::with_content(player, mission, seed, ContentGenerator::default())
    }

    /// Session drawing text from custom content pools.
    #[must_use]
    pub fn with_content(
        player: PlayerId,
        mission: Mission,
        seed: u64,
        content: ContentGenerator<'static>,
    ) -> Self {
        Self {
            player,
            mission,
            phase: SessionPhase::NotStarted,
            stats: StatVector::default(),
            progress: 0,
            offers: SmallVec::new(),
            narrative: String::new(),
            log: Vec::new(),
            outcome: None,
            rng: RngBundle::from_seed(seed),
            next_offer_id: 0,
            content,
        }
    }

    /// Begin the attempt if the player can cover the entry cost.
    ///
    /// Does not touch any ledger; the caller charges the cost once this
    /// returns `Ok`.
    ///
    /// # Errors
    ///
    /// [`MissionError::InsufficientFunds`] leaves the session untouched.
    /// [`MissionError::InvalidSessionState`] if the session already started.
    pub fn start(&mut self, available_funds: i64) -> Result<(), MissionError> {
        self.ensure_phase(SessionPhase::NotStarted, "start")?;
        if available_funds < self.mission.cost {
            return Err(MissionError::InsufficientFunds {
                required: self.mission.cost,
                available: available_funds,
            });
        }

        self.stats = StatVector::random_initial(self.rng.stats());
        self.progress = 0;
        let offers = self.draw_offers(DEFAULT_OFFER_COUNT);
        self.offers = offers.into_iter().collect();
        self.phase = SessionPhase::InProgress;
        let intro = format!(
            "You're about to start the {} mission. Ready to commit some crime?",
            self.mission.name
        );
        self.set_narrative(intro);
        log::info!(
            "player {} started {} ({}) with seed {}",
            self.player,
            self.mission.id,
            self.mission.difficulty,
            self.rng.seed()
        );
        Ok(())
    }

    /// Take one of the active offers.
    ///
    /// # Errors
    ///
    /// [`MissionError::UnknownOffer`] when `offer_id` is not active, or
    /// [`MissionError::InvalidSessionState`] outside `InProgress`.
    pub fn take_action(&mut self, offer_id: u32) -> Result<ActionReport, MissionError> {
        self.ensure_phase(SessionPhase::InProgress, "take an action")?;
        let index = self
            .offers
            .iter()
            .position(|offer| offer.id == offer_id)
            .ok_or(MissionError::UnknownOffer(offer_id))?;
        let offer = self.offers.remove(index);

        self.stats = self.stats.apply_bonus(offer.stat, offer.bonus);
        let stat_increase = match offer.stat {
            StatTarget::Success => offer.bonus / SUCCESS_BONUS_DIVISOR,
            _ => offer.bonus,
        };

        let mut narrative = offer.narrative.clone();
        let complication = self.roll_complication(offer.risk);
        if let Some(comp) = &complication {
            narrative.push(' ');
            narrative.push_str(&comp.message);
        }

        let before = self.progress;
        self.progress = before.saturating_add(ACTION_PROGRESS_STEP).min(PROGRESS_COMPLETE);

        let replacements = self.draw_offers(REPLACEMENT_OFFER_COUNT);
        self.offers.extend(replacements.iter().cloned());
        self.set_narrative(narrative.clone());
        log::debug!(
            "player {} took offer {} ({} +{}) progress {}",
            self.player,
            offer.id,
            offer.stat,
            offer.bonus,
            self.progress
        );

        Ok(ActionReport {
            offer,
            progress_increase: self.progress - before,
            progress: self.progress,
            narrative,
            stat_increase,
            complication,
            replacements,
            stats: self.stats,
        })
    }

    /// Advance toward the objective, or resolve once progress is complete.
    ///
    /// # Errors
    ///
    /// [`MissionError::InvalidSessionState`] outside `InProgress`.
    pub fn continue_mission(&mut self) -> Result<ContinueResult, MissionError> {
        self.ensure_phase(SessionPhase::InProgress, "continue")?;
        if self.progress >= PROGRESS_COMPLETE {
            return self.resolve().map(ContinueResult::Resolved);
        }

        self.progress = self
            .progress
            .saturating_add(CONTINUE_PROGRESS_STEP)
            .min(PROGRESS_COMPLETE);
        let mut narrative = self.content.milestone(self.progress);
        let mut event = None;
        if self.progress >= RANDOM_EVENT_MIN_PROGRESS
            && self.rng.events().gen_bool(RANDOM_EVENT_CHANCE)
            && let Some(found) = self.content.random_event(self.rng.events())
        {
            self.stats = self.stats.apply_bonus(found.stat.into(), RANDOM_EVENT_BOOST);
            self.log.push(narrative);
            narrative = found.message.clone();
            event = Some(found);
        }
        self.set_narrative(narrative.clone());

        Ok(ContinueResult::Advanced(ProgressUpdate {
            progress: self.progress,
            narrative,
            event,
            stats: self.stats,
        }))
    }

    /// Roll the outcome from the current stats. Requires full progress.
    ///
    /// # Errors
    ///
    /// [`MissionError::MissionIncomplete`] before progress reaches 100, or
    /// [`MissionError::InvalidSessionState`] outside `InProgress`.
    pub fn resolve(&mut self) -> Result<Outcome, MissionError> {
        self.ensure_phase(SessionPhase::InProgress, "resolve")?;
        if self.progress < PROGRESS_COMPLETE {
            return Err(MissionError::MissionIncomplete {
                progress: self.progress,
            });
        }
        let chance = outcome::final_chance(&self.stats, self.mission.difficulty);
        let result = outcome::resolve(
            &self.mission,
            &self.stats,
            chance,
            &self.content,
            self.rng.outcome(),
        );
        Ok(self.finish(result))
    }

    /// Walk away, recovering part of the entry cost.
    ///
    /// # Errors
    ///
    /// [`MissionError::InvalidSessionState`] outside `InProgress`.
    pub fn abort(&mut self) -> Result<Outcome, MissionError> {
        self.ensure_phase(SessionPhase::InProgress, "abort")?;
        let result = outcome::abort_outcome(&self.mission, &self.content);
        Ok(self.finish(result))
    }

    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    #[must_use]
    pub const fn mission(&self) -> &Mission {
        &self.mission
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    #[must_use]
    pub const fn stats(&self) -> StatVector {
        self.stats
    }

    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn offers(&self) -> &[ActionOffer] {
        &self.offers
    }

    #[must_use]
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Every narrative line shown so far, oldest first.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn draw_counts(&self) -> DrawCounts {
        self.rng.draw_counts()
    }

    fn ensure_phase(
        &self,
        expected: SessionPhase,
        operation: &'static str,
    ) -> Result<(), MissionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(MissionError::InvalidSessionState {
                phase: self.phase,
                operation,
            })
        }
    }

    fn draw_offers(&mut self, count: usize) -> Vec<ActionOffer> {
        let offers = self.content.generate_actions(
            self.mission.difficulty,
            count,
            self.next_offer_id,
            self.rng.content(),
        );
        let issued = u32::try_from(offers.len()).unwrap_or(u32::MAX);
        self.next_offer_id = self.next_offer_id.wrapping_add(issued);
        offers
    }

    fn roll_complication(&mut self, risk: u8) -> Option<Complication> {
        let risk = risk.min(100);
        if risk == 0 || !self.rng.stats().gen_bool(f64::from(risk) / 100.0) {
            return None;
        }
        let stat = Stat::random(self.rng.stats());
        let penalty = u32::from(risk).div_ceil(RISK_PENALTY_DIVISOR);
        self.stats = self.stats.apply_penalty(stat.into(), penalty);
        let message = self.content.complication(stat, self.rng.content());
        Some(Complication {
            stat,
            penalty,
            message,
        })
    }

    fn finish(&mut self, result: Outcome) -> Outcome {
        self.phase = SessionPhase::from_outcome(result.kind);
        self.progress = match result.kind {
            OutcomeKind::Aborted => self.progress,
            _ => PROGRESS_COMPLETE,
        };
        self.offers.clear();
        self.set_narrative(result.narrative.clone());
        log::info!(
            "player {} {} {}: delta {} net {}",
            self.player,
            result.kind,
            self.mission.id,
            result.crime_coin_delta,
            result.attempt_net
        );
        self.outcome = Some(result.clone());
        result
    }

    fn set_narrative(&mut self, line: String) {
        self.log.push(line.clone());
        self.narrative = line;
    }
}
