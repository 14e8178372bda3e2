use anyhow::Result;
use std::sync::Arc;

use crimecoin_game::{MissionId, OutcomeKind, PlayerRecord};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{
    AttemptRecord, MissionSimulation, SIMULATED_PLAYER, SimulationConfig,
};

/// Steps allowed per attempt before the run is flagged as stuck.
pub const DEFAULT_MAX_STEPS: u32 = 32;

/// What to play and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub missions: Vec<MissionId>,
    pub attempts: u32,
    pub starting_balance: i64,
    pub ledger_outage: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            missions: vec![MissionId(1), MissionId(2), MissionId(3)],
            attempts: 3,
            starting_balance: 1_000,
            ledger_outage: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_missions(mut self, missions: impl Into<Vec<MissionId>>) -> Self {
        self.missions = missions.into();
        self
    }

    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_starting_balance(mut self, balance: i64) -> Self {
        self.starting_balance = balance;
        self
    }

    #[must_use]
    pub const fn with_ledger_outage(mut self) -> Self {
        self.ledger_outage = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    fn config(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            strategy: self.strategy,
            missions: self.missions.clone(),
            attempts: self.attempts,
            starting_balance: self.starting_balance,
            max_steps: DEFAULT_MAX_STEPS,
            ledger_outage: self.ledger_outage,
        }
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub policy_name: &'static str,
    pub starting_balance: i64,
    pub attempts: Vec<AttemptRecord>,
    pub final_record: Option<PlayerRecord>,
    pub history_len: usize,
    pub violations: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| attempt.kind() == Some(kind))
            .count()
    }

    #[must_use]
    pub fn resolved(&self) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| attempt.outcome.is_some())
            .count()
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| attempt.rejected.is_some())
            .count()
    }

    #[must_use]
    pub fn final_balance(&self) -> i64 {
        self.final_record
            .as_ref()
            .map_or(0, |record| record.crime_coin)
    }
}

/// Runs plans against a fresh in-memory ledger per seed.
#[derive(Debug, Clone, Copy)]
pub struct GameTester {
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut simulation = MissionSimulation::new(plan.config(seed));
        let attempts = simulation.run();
        let service = simulation.service();
        let final_record = service.player(SIMULATED_PLAYER).ok();
        let history_len = service
            .history(SIMULATED_PLAYER)
            .map_or(0, |entries| entries.len());

        if self.verbose {
            for attempt in &attempts {
                let label = attempt
                    .kind()
                    .map_or_else(|| "rejected".to_string(), |kind| kind.to_string());
                println!(
                    "    attempt {} on {}: {} ({} -> {})",
                    attempt.attempt,
                    attempt.mission,
                    label,
                    attempt.balance_before,
                    attempt.balance_after
                );
            }
        }

        SimulationSummary {
            seed,
            strategy: plan.strategy,
            policy_name: simulation.policy_name(),
            starting_balance: plan.starting_balance,
            final_record,
            history_len,
            violations: simulation.violations().to_vec(),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_match_history() {
        let plan = SimulationPlan::new(GameplayStrategy::Balanced).with_attempts(6);
        let summary = GameTester::new(false).run_plan(&plan, 21);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert_eq!(summary.resolved(), 6);
        assert_eq!(summary.history_len, 6);
        let total = summary.count(OutcomeKind::Success)
            + summary.count(OutcomeKind::Failure)
            + summary.count(OutcomeKind::Aborted);
        assert_eq!(total, 6);
        assert_eq!(
            summary.final_record.as_ref().map(|record| record.total_missions),
            Some(6)
        );
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let plan = SimulationPlan::new(GameplayStrategy::MonteCarlo).with_attempts(4);
        let tester = GameTester::new(false);
        let first = tester.run_plan(&plan, 404);
        let second = tester.run_plan(&plan, 404);
        let outcomes = |summary: &SimulationSummary| {
            summary
                .attempts
                .iter()
                .map(|attempt| attempt.outcome.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(outcomes(&first), outcomes(&second));
        assert_eq!(first.final_balance(), second.final_balance());
    }

    #[test]
    fn expectations_see_the_summary() {
        let plan = SimulationPlan::new(GameplayStrategy::WalkAway)
            .with_missions([MissionId(1)])
            .with_attempts(1)
            .with_expectation(|summary: &SimulationSummary| {
                anyhow::ensure!(summary.count(OutcomeKind::Aborted) == 1, "expected an abort");
                Ok(())
            });
        let summary = GameTester::new(false).run_plan(&plan, 1);
        for expectation in &plan.expectations {
            expectation.evaluate(&summary).unwrap();
        }
    }
}
