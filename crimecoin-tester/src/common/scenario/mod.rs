use anyhow::Result;

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};
use crimecoin_game::MissionId;

pub mod catalog;

/// A named plan the tester can run across seeds.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.resolved() == summary.attempts.len(),
        "every smoke attempt should resolve, got {} of {}",
        summary.resolved(),
        summary.attempts.len()
    );
    anyhow::ensure!(
        summary.history_len == summary.resolved(),
        "history has {} entries for {} resolved attempts",
        summary.history_len,
        summary.resolved()
    );
    Ok(())
}

/// Every attempt either resolved or was turned away for lack of funds.
fn survival_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.resolved() + summary.rejected() == summary.attempts.len(),
        "some attempts neither resolved nor were rejected"
    );
    anyhow::ensure!(
        summary.final_balance() >= 0,
        "balance went negative: {}",
        summary.final_balance()
    );
    Ok(())
}

fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(GameplayStrategy::Balanced).with_expectation(smoke_expectation),
    )
}

fn strategy_scenario(name: &str, strategy: GameplayStrategy) -> TestScenario {
    TestScenario::simulation(
        name,
        SimulationPlan::new(strategy)
            .with_missions([MissionId(1), MissionId(2), MissionId(3), MissionId(2)])
            .with_attempts(12)
            .with_starting_balance(400)
            .with_expectation(survival_expectation),
    )
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "cautious-strategy" | "cautious" => Some(strategy_scenario(
            "Cautious Strategy Test",
            GameplayStrategy::Cautious,
        )),
        "aggressive-strategy" | "aggressive" => Some(strategy_scenario(
            "Aggressive Strategy Test",
            GameplayStrategy::Aggressive,
        )),
        "balanced-strategy" | "balanced" => Some(strategy_scenario(
            "Balanced Strategy Test",
            GameplayStrategy::Balanced,
        )),
        "monte-carlo-strategy" | "monte-carlo" => Some(strategy_scenario(
            "Monte Carlo Strategy Test",
            GameplayStrategy::MonteCarlo,
        )),
        "ledger-consistency" | "ledger" => Some(catalog::ledger_consistency_scenario()),
        "abort-refund" | "abort" => Some(catalog::abort_refund_scenario()),
        "insufficient-funds" | "broke" => Some(catalog::insufficient_funds_scenario()),
        "success-rate" | "odds" => Some(catalog::success_rate_scenario()),
        "ledger-outage" | "outage" => Some(catalog::ledger_outage_scenario()),
        "deterministic" | "deterministic-replay" => Some(catalog::deterministic_scenario()),
        "level-progression" | "levels" => Some(catalog::level_progression_scenario()),
        "bonus-items" | "loot" => Some(catalog::bonus_items_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("cautious-strategy", "Cautious Strategy Test"),
        ("aggressive-strategy", "Aggressive Strategy Test"),
        ("balanced-strategy", "Balanced Strategy Test"),
        ("monte-carlo-strategy", "Monte Carlo Strategy Test"),
        ("ledger-consistency", "Ledger Totals Match Outcomes"),
        ("abort-refund", "Abort Refunds a Quarter of the Cost"),
        ("insufficient-funds", "Short Balance Is Rejected Without Charge"),
        ("success-rate", "Success Rate Tracks Rolled Chance"),
        ("ledger-outage", "Queued Ledger Writes Land on Retry"),
        ("deterministic", "Deterministic Replay"),
        ("level-progression", "Level Progression"),
        ("bonus-items", "Bonus Items Reach Inventory"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, description) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("{key} missing"));
            assert!(!description.is_empty());
            assert!(!scenario.name.is_empty());
        }
        assert!(get_scenario("no-such-thing").is_none());
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert_eq!(get_scenario("SMOKE").map(|s| s.name), Some("Smoke Test".to_string()));
        assert!(get_scenario("Outage").is_some());
    }
}
