use crimecoin_game::{
    ContinueReport, LedgerStatus, MemoryLedger, MissionError, MissionId, MissionService,
    Outcome, OutcomeKind, PlayerId, PlayerRecord, SessionPhase, StatVector, StaticCatalog,
};

use crate::logic::policy::{GameplayStrategy, MissionView, PlayerPolicy, PolicyDecision};

/// Player the simulator plays as.
pub const SIMULATED_PLAYER: PlayerId = PlayerId(1);

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub missions: Vec<MissionId>,
    pub attempts: u32,
    pub starting_balance: i64,
    pub max_steps: u32,
    pub ledger_outage: bool,
}

impl SimulationConfig {
    #[cfg(test)]
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            missions: vec![MissionId(1), MissionId(2), MissionId(3)],
            attempts: 3,
            starting_balance: 1_000,
            max_steps: 32,
            ledger_outage: false,
        }
    }
}

/// One policy decision and the state it produced.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: u32,
    pub decision: String,
    pub rationale: Option<String>,
    pub progress: u8,
    pub stats: StatVector,
}

/// Everything observed while playing one mission attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub mission: MissionId,
    pub balance_before: i64,
    pub balance_after: i64,
    pub rejected: Option<MissionError>,
    pub outcome: Option<Outcome>,
    pub queued_write: bool,
    pub steps: Vec<StepRecord>,
}

impl AttemptRecord {
    #[must_use]
    pub fn kind(&self) -> Option<OutcomeKind> {
        self.outcome.as_ref().map(|outcome| outcome.kind)
    }
}

/// Drives a [`MissionService`] with an automated policy and checks the
/// ledger against its own running tally.
pub struct MissionSimulation {
    service: MissionService<StaticCatalog, MemoryLedger>,
    config: SimulationConfig,
    policy: Box<dyn PlayerPolicy + Send>,
    expected_balance: i64,
    violations: Vec<String>,
}

impl MissionSimulation {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let ledger = MemoryLedger::new();
        let mut record = PlayerRecord::new(SIMULATED_PLAYER, "simulator");
        record.crime_coin = config.starting_balance;
        ledger.insert_player(record);
        let service =
            MissionService::new(StaticCatalog::default_catalog().clone(), ledger, config.seed);
        Self {
            service,
            policy: config.strategy.create_policy(config.seed),
            expected_balance: config.starting_balance,
            config,
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn service(&self) -> &MissionService<StaticCatalog, MemoryLedger> {
        &self.service
    }

    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    #[cfg(test)]
    pub const fn expected_balance(&self) -> i64 {
        self.expected_balance
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Play every configured attempt. Stops early once the player is broke.
    pub fn run(&mut self) -> Vec<AttemptRecord> {
        let mut records = Vec::new();
        if self.config.missions.is_empty() {
            return records;
        }
        for attempt in 0..self.config.attempts {
            let index = usize::try_from(attempt).unwrap_or(0) % self.config.missions.len();
            let mission = self.config.missions[index];
            let record = self.play_attempt(attempt + 1, mission);
            let broke = matches!(record.rejected, Some(MissionError::InsufficientFunds { .. }));
            records.push(record);
            if broke {
                break;
            }
        }
        records
    }

    fn violation(&mut self, attempt: u32, message: impl Into<String>) {
        let message = format!("attempt {attempt}: {}", message.into());
        log::warn!("{message}");
        self.violations.push(message);
    }

    fn balance(&self) -> i64 {
        self.service
            .player(SIMULATED_PLAYER)
            .map_or(-1, |record| record.crime_coin)
    }

    fn play_attempt(&mut self, attempt: u32, mission: MissionId) -> AttemptRecord {
        let balance_before = self.balance();
        let mut record = AttemptRecord {
            attempt,
            mission,
            balance_before,
            balance_after: balance_before,
            rejected: None,
            outcome: None,
            queued_write: false,
            steps: Vec::new(),
        };

        let start = match self
            .service
            .charge_and_start_mission(SIMULATED_PLAYER, mission)
        {
            Ok(start) => start,
            Err(err) => {
                if self.balance() != balance_before {
                    self.violation(attempt, format!("rejected start changed balance: {err}"));
                }
                if !matches!(err, MissionError::InsufficientFunds { .. }) {
                    self.violation(attempt, format!("unexpected start error: {err}"));
                }
                record.rejected = Some(err);
                return record;
            }
        };

        let Ok(definition) = self.service.engine().mission(mission) else {
            self.violation(attempt, format!("{mission} vanished from the catalog"));
            return record;
        };
        self.expected_balance = (self.expected_balance - definition.cost).max(0);
        if start.balance != self.expected_balance {
            self.violation(
                attempt,
                format!(
                    "charge left {} but {} was expected",
                    start.balance, self.expected_balance
                ),
            );
            self.expected_balance = start.balance;
        }

        if self.config.ledger_outage {
            self.service.engine().ledger().set_fail_writes(true);
        }

        let mut view = MissionView {
            mission: definition,
            offers: start.offers,
            stats: start.stats,
            progress: 0,
            actions_taken: 0,
        };
        let mut step = 0;
        while step < self.config.max_steps && record.outcome.is_none() {
            step += 1;
            let decision = self.policy.decide(&view);
            let label = decision.label();
            let rationale = match &decision {
                PolicyDecision::TakeAction { rationale, .. }
                | PolicyDecision::Abort { rationale } => rationale.clone(),
                PolicyDecision::Continue => None,
            };
            let before = view.progress;
            if let Err(err) = self.apply_decision(&decision, &mut view, &mut record) {
                self.violation(attempt, format!("{label} failed: {err}"));
                break;
            }
            if view.progress < before {
                self.violation(
                    attempt,
                    format!("progress went backwards {before} -> {}", view.progress),
                );
            }
            record.steps.push(StepRecord {
                step,
                decision: label,
                rationale,
                progress: view.progress,
                stats: view.stats,
            });
        }

        if record.outcome.is_none() {
            self.violation(
                attempt,
                format!("mission unresolved after {} steps", self.config.max_steps),
            );
            if let Ok(resolution) =
                self.service
                    .resolve_or_abort(SIMULATED_PLAYER, view.mission.id, false)
            {
                self.absorb_resolution(resolution.outcome, resolution.ledger, &mut record);
            }
        }

        if self.config.ledger_outage {
            self.service.engine().ledger().set_fail_writes(false);
            let applied = self.service.retry_pending_writes();
            if record.queued_write && applied == 0 {
                self.violation(attempt, "queued write was not applied on retry");
            }
        }
        if self.service.pending_writes() > 0 {
            self.violation(attempt, "ledger writes still pending");
        }

        self.check_terminal(attempt, &view, &record);
        record.balance_after = self.balance();
        if record.balance_after != self.expected_balance {
            self.violation(
                attempt,
                format!(
                    "ledger balance {} does not match expected {}",
                    record.balance_after, self.expected_balance
                ),
            );
            self.expected_balance = record.balance_after;
        }
        record
    }

    fn apply_decision(
        &mut self,
        decision: &PolicyDecision,
        view: &mut MissionView,
        record: &mut AttemptRecord,
    ) -> Result<(), MissionError> {
        let mission = view.mission.id;
        match decision {
            PolicyDecision::TakeAction { offer_id, .. } => {
                let report = self
                    .service
                    .submit_action(SIMULATED_PLAYER, mission, *offer_id)?;
                view.offers.retain(|offer| offer.id != *offer_id);
                view.offers.extend(report.replacements);
                view.stats = report.stats;
                view.progress = report.progress;
                view.actions_taken += 1;
            }
            PolicyDecision::Continue => {
                match self.service.continue_mission(SIMULATED_PLAYER, mission)? {
                    ContinueReport::Advanced(update) => {
                        view.stats = update.stats;
                        view.progress = update.progress;
                    }
                    ContinueReport::Resolved(resolution) => {
                        self.absorb_resolution(resolution.outcome, resolution.ledger, record);
                    }
                }
            }
            PolicyDecision::Abort { .. } => {
                let resolution = self
                    .service
                    .resolve_or_abort(SIMULATED_PLAYER, mission, false)?;
                self.absorb_resolution(resolution.outcome, resolution.ledger, record);
            }
        }
        Ok(())
    }

    fn absorb_resolution(
        &mut self,
        outcome: Outcome,
        ledger: LedgerStatus,
        record: &mut AttemptRecord,
    ) {
        let attempt = record.attempt;
        let cost = self
            .service
            .engine()
            .mission(record.mission)
            .map_or(0, |mission| mission.cost);
        if outcome.attempt_net != outcome.crime_coin_delta - cost {
            self.violation(
                attempt,
                format!(
                    "net {} disagrees with delta {} and cost {cost}",
                    outcome.attempt_net, outcome.crime_coin_delta
                ),
            );
        }
        if outcome.kind == OutcomeKind::Success && outcome.crime_coin_delta < 0 {
            self.violation(attempt, "successful mission paid a negative amount");
        }

        self.expected_balance = (self.expected_balance + outcome.crime_coin_delta).max(0);
        match ledger {
            LedgerStatus::Applied(updated) => {
                if updated.crime_coin != self.expected_balance {
                    self.violation(
                        attempt,
                        format!(
                            "settled balance {} but {} was expected",
                            updated.crime_coin, self.expected_balance
                        ),
                    );
                }
            }
            LedgerStatus::Queued { reason } => {
                log::debug!("attempt {attempt} write queued: {reason}");
                record.queued_write = true;
                if !self.config.ledger_outage {
                    self.violation(attempt, format!("write queued without an outage: {reason}"));
                }
            }
        }
        record.outcome = Some(outcome);
    }

    fn check_terminal(&mut self, attempt: u32, view: &MissionView, record: &AttemptRecord) {
        let Some(kind) = record.kind() else {
            return;
        };
        let expected_phase = match kind {
            OutcomeKind::Success => SessionPhase::Success,
            OutcomeKind::Failure => SessionPhase::Failure,
            OutcomeKind::Aborted => SessionPhase::Aborted,
        };
        match self.service.session_phase(SIMULATED_PLAYER) {
            Some((_, phase)) if phase == expected_phase => {}
            other => self.violation(
                attempt,
                format!("session phase {other:?} does not match outcome {kind}"),
            ),
        }

        let replay = self
            .service
            .resolve_or_abort(SIMULATED_PLAYER, view.mission.id, true);
        if !matches!(replay, Err(MissionError::InvalidSessionState { .. })) {
            self.violation(
                attempt,
                format!("finished session accepted another resolution: {replay:?}"),
            );
        }
        let action = self
            .service
            .submit_action(SIMULATED_PLAYER, view.mission.id, 0);
        if !matches!(action, Err(MissionError::InvalidSessionState { .. })) {
            self.violation(attempt, "finished session accepted an action");
        }
    }
}
