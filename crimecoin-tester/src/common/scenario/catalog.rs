use anyhow::{Result, ensure};

use super::TestScenario;
use crate::logic::{GameTester, GameplayStrategy, SimulationPlan, SimulationSummary};
use crimecoin_game::constants::EXPERIENCE_PER_LEVEL;
use crimecoin_game::{MissionId, Outcome, OutcomeKind, PlayerId, PlayerRecord, StaticCatalog};

const HARD_MISSION: MissionId = MissionId(3);
const MEDIUM_MISSION: MissionId = MissionId(2);

fn mission_cost(id: MissionId) -> i64 {
    StaticCatalog::default_catalog()
        .find(id)
        .map_or(0, |mission| mission.cost)
}

fn outcomes(summary: &SimulationSummary) -> impl Iterator<Item = &Outcome> {
    summary
        .attempts
        .iter()
        .filter_map(|attempt| attempt.outcome.as_ref())
}

pub fn ledger_consistency_scenario() -> TestScenario {
    TestScenario::simulation(
        "Ledger Totals Match Outcomes",
        SimulationPlan::new(GameplayStrategy::MonteCarlo)
            .with_attempts(15)
            .with_starting_balance(600)
            .with_expectation(ledger_totals_expectation),
    )
}

fn ledger_totals_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = summary
        .final_record
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("simulated player disappeared"))?;
    let baseline = PlayerRecord::new(PlayerId(0), "baseline");
    let resolved = u32::try_from(summary.resolved())?;

    ensure!(
        record.total_missions == resolved,
        "total_missions {} but {resolved} attempts resolved",
        record.total_missions
    );
    ensure!(
        summary.history_len == summary.resolved(),
        "history has {} entries for {resolved} resolved attempts",
        summary.history_len
    );
    let successes = u32::try_from(summary.count(OutcomeKind::Success))?;
    ensure!(
        record.successful_missions == successes,
        "successful_missions {} but {successes} successes",
        record.successful_missions
    );

    let fun: i64 = outcomes(summary)
        .map(|outcome| i64::from(outcome.fun_coin_gained))
        .sum();
    ensure!(
        record.fun_coin == baseline.fun_coin + fun,
        "fun coin {} but {} expected",
        record.fun_coin,
        baseline.fun_coin + fun
    );

    let notoriety: u32 = outcomes(summary)
        .map(|outcome| outcome.notoriety_gained)
        .sum();
    ensure!(
        record.notoriety == baseline.notoriety + notoriety,
        "notoriety {} but {} expected",
        record.notoriety,
        baseline.notoriety + notoriety
    );

    let earnings: Vec<i64> = outcomes(summary)
        .filter(|outcome| outcome.is_success())
        .map(|outcome| outcome.crime_coin_delta)
        .collect();
    ensure!(
        record.total_earnings == earnings.iter().sum::<i64>(),
        "total earnings {} disagree with successes",
        record.total_earnings
    );
    ensure!(
        record.biggest_heist == earnings.iter().copied().max().unwrap_or(0),
        "biggest heist {} is not the largest payout",
        record.biggest_heist
    );
    Ok(())
}

pub fn abort_refund_scenario() -> TestScenario {
    TestScenario::simulation(
        "Abort Refunds a Quarter of the Cost",
        SimulationPlan::new(GameplayStrategy::WalkAway)
            .with_missions([HARD_MISSION])
            .with_attempts(3)
            .with_starting_balance(200)
            .with_expectation(abort_refund_expectation),
    )
}

fn abort_refund_expectation(summary: &SimulationSummary) -> Result<()> {
    let aborted = summary.count(OutcomeKind::Aborted);
    ensure!(
        aborted == summary.attempts.len(),
        "{aborted} of {} attempts aborted",
        summary.attempts.len()
    );
    let cost = mission_cost(HARD_MISSION);
    let kept = cost - cost / 4;
    let expected = summary.starting_balance - i64::try_from(aborted)? * kept;
    ensure!(
        summary.final_balance() == expected,
        "balance {} after {aborted} aborts, expected {expected}",
        summary.final_balance()
    );
    ensure!(
        outcomes(summary).all(|outcome| outcome.roll.is_none()),
        "an aborted attempt rolled the dice"
    );
    Ok(())
}

pub fn insufficient_funds_scenario() -> TestScenario {
    TestScenario::simulation(
        "Short Balance Is Rejected Without Charge",
        SimulationPlan::new(GameplayStrategy::Aggressive)
            .with_missions([HARD_MISSION])
            .with_attempts(3)
            .with_starting_balance(30)
            .with_expectation(insufficient_funds_expectation),
    )
}

fn insufficient_funds_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.rejected() == 1, "expected exactly one rejected start");
    ensure!(summary.resolved() == 0, "a short balance still played");
    ensure!(
        summary.final_balance() == summary.starting_balance,
        "rejected start changed the balance to {}",
        summary.final_balance()
    );
    ensure!(summary.history_len == 0, "rejected start wrote history");
    Ok(())
}

pub fn success_rate_scenario() -> TestScenario {
    TestScenario::simulation(
        "Success Rate Tracks Rolled Chance",
        SimulationPlan::new(GameplayStrategy::Aggressive)
            .with_missions([MEDIUM_MISSION])
            .with_attempts(60)
            .with_starting_balance(5_000)
            .with_expectation(success_rate_expectation),
    )
}

/// Successes must land within four standard deviations of the sum of
/// per-attempt chances.
fn success_rate_expectation(summary: &SimulationSummary) -> Result<()> {
    let rolled: Vec<(f64, bool)> = outcomes(summary)
        .filter(|outcome| outcome.roll.is_some())
        .map(|outcome| (outcome.success_chance, outcome.is_success()))
        .collect();
    ensure!(!rolled.is_empty(), "no attempt reached the roll");

    let expected: f64 = rolled.iter().map(|(chance, _)| chance).sum();
    let variance: f64 = rolled
        .iter()
        .map(|(chance, _)| chance * (1.0 - chance))
        .sum();
    let observed = rolled.iter().filter(|(_, success)| *success).count();
    #[allow(clippy::cast_precision_loss)]
    let gap = (observed as f64 - expected).abs();
    ensure!(
        gap <= 4.0 * variance.sqrt() + 1.0,
        "{observed} successes vs {expected:.1} expected over {} rolls",
        rolled.len()
    );
    ensure!(
        rolled.iter().all(|(chance, _)| *chance <= 0.95),
        "a chance exceeded the 95% cap"
    );
    Ok(())
}

pub fn ledger_outage_scenario() -> TestScenario {
    TestScenario::simulation(
        "Queued Ledger Writes Land on Retry",
        SimulationPlan::new(GameplayStrategy::Cautious)
            .with_attempts(6)
            .with_ledger_outage()
            .with_expectation(ledger_outage_expectation),
    )
}

fn ledger_outage_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary
            .attempts
            .iter()
            .filter(|attempt| attempt.outcome.is_some())
            .all(|attempt| attempt.queued_write),
        "an outcome was applied during the outage"
    );
    ensure!(
        summary.history_len == summary.resolved(),
        "{} queued writes landed for {} outcomes",
        summary.history_len,
        summary.resolved()
    );
    Ok(())
}

fn replay_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::MonteCarlo).with_attempts(6)
}

pub fn deterministic_scenario() -> TestScenario {
    TestScenario::simulation(
        "Deterministic Replay",
        replay_plan().with_expectation(deterministic_expectation),
    )
}

fn deterministic_expectation(summary: &SimulationSummary) -> Result<()> {
    let replay = GameTester::new(false).run_plan(&replay_plan(), summary.seed);
    ensure!(
        replay.attempts.len() == summary.attempts.len(),
        "replay played {} attempts, first run {}",
        replay.attempts.len(),
        summary.attempts.len()
    );
    for (first, again) in summary.attempts.iter().zip(&replay.attempts) {
        ensure!(
            first.outcome == again.outcome,
            "attempt {} diverged on replay",
            first.attempt
        );
        ensure!(
            first.steps.len() == again.steps.len(),
            "attempt {} took a different path on replay",
            first.attempt
        );
    }
    ensure!(
        replay.final_balance() == summary.final_balance(),
        "replay ended on {} instead of {}",
        replay.final_balance(),
        summary.final_balance()
    );
    Ok(())
}

pub fn level_progression_scenario() -> TestScenario {
    TestScenario::simulation(
        "Level Progression",
        SimulationPlan::new(GameplayStrategy::Aggressive)
            .with_missions([HARD_MISSION])
            .with_attempts(40)
            .with_starting_balance(10_000)
            .with_expectation(level_progression_expectation),
    )
}

/// Experience spent on level-ups plus the remainder equals everything earned.
fn level_progression_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = summary
        .final_record
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("simulated player disappeared"))?;
    ensure!(
        record.experience < record.next_level_threshold(),
        "experience {} should have levelled past {}",
        record.experience,
        record.next_level_threshold()
    );
    let earned: u64 = outcomes(summary)
        .map(|outcome| u64::from(outcome.experience_gained))
        .sum();
    let spent: u64 = (1..u64::from(record.level))
        .map(|level| level * u64::from(EXPERIENCE_PER_LEVEL))
        .sum();
    ensure!(
        spent + u64::from(record.experience) == earned,
        "level {} with {} xp does not account for {earned} earned",
        record.level,
        record.experience
    );
    Ok(())
}

pub fn bonus_items_scenario() -> TestScenario {
    TestScenario::simulation(
        "Bonus Items Reach Inventory",
        SimulationPlan::new(GameplayStrategy::Aggressive)
            .with_missions([HARD_MISSION])
            .with_attempts(30)
            .with_starting_balance(5_000)
            .with_expectation(bonus_items_expectation),
    )
}

fn bonus_items_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = summary
        .final_record
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("simulated player disappeared"))?;
    let awarded: usize = outcomes(summary)
        .map(|outcome| {
            if outcome.is_success() {
                outcome.bonus_items.len()
            } else {
                0
            }
        })
        .sum();
    ensure!(
        outcomes(summary)
            .filter(|outcome| !outcome.is_success())
            .all(|outcome| outcome.bonus_items.is_empty()),
        "a failed attempt carried bonus items"
    );
    ensure!(
        record.inventory.len() == awarded,
        "inventory holds {} items but {awarded} were awarded",
        record.inventory.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(scenario: &TestScenario, seed: u64) -> Result<()> {
        let summary = GameTester::new(false).run_plan(&scenario.plan, seed);
        ensure!(summary.violations.is_empty(), "{:?}", summary.violations);
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary)?;
        }
        Ok(())
    }

    #[test]
    fn deterministic_scenarios_pass() {
        for scenario in [
            ledger_consistency_scenario(),
            abort_refund_scenario(),
            insufficient_funds_scenario(),
            ledger_outage_scenario(),
            deterministic_scenario(),
            level_progression_scenario(),
            bonus_items_scenario(),
        ] {
            for seed in [1, 1337] {
                run(&scenario, seed).unwrap_or_else(|err| panic!("{}: {err}", scenario.name));
            }
        }
    }

    #[test]
    fn success_rate_scenario_passes() {
        run(&success_rate_scenario(), 2024).unwrap();
    }
}
