use anyhow::{Result, ensure};
use dominion_game::{PLAYER_ID, WorldState, decode_to_seed, encode_friendly};

use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary, world_digest};
use crate::logic::policy::GameplayStrategy;

/// Logic scenario: a plan plus the expectations checked against its run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(
        key: &'static str,
        name: impl Into<String>,
        description: &'static str,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            description,
            plan,
        }
    }
}

const PACIFIST_BOT: usize = 0;

fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "smoke",
            "Smoke",
            "Three idle rounds: standings publish and turns reset",
            SimulationPlan::new(GameplayStrategy::Idle)
                .with_rounds(3)
                .with_expectation(smoke_expectation),
        ),
        TestScenario::new(
            "determinism",
            "Deterministic Replay",
            "Replaying a seed reproduces the world byte for byte",
            SimulationPlan::new(GameplayStrategy::MonteCarlo)
                .with_rounds(8)
                .with_expectation(determinism_expectation),
        ),
        TestScenario::new(
            "conservation",
            "Land and Resource Conservation",
            "Land adds up and no quantity goes negative across a raiding run",
            SimulationPlan::new(GameplayStrategy::Raider)
                .with_rounds(15)
                .with_config(|config| config.protection_rounds = 1)
                .with_expectation(conservation_expectation),
        ),
        TestScenario::new(
            "protection",
            "Divine Protection",
            "Nobody lands an attack before protection lapses",
            SimulationPlan::new(GameplayStrategy::Raider)
                .with_rounds(6)
                .with_expectation(protection_expectation),
        ),
        TestScenario::new(
            "bot-behavior",
            "Bot Behavior",
            "A pacifist bot never attacks and bots stay within their turn budgets",
            SimulationPlan::new(GameplayStrategy::Builder)
                .with_rounds(12)
                .with_config(|config| config.protection_rounds = 1)
                .with_setup(make_first_bot_pacifist)
                .with_expectation(bot_behavior_expectation),
        ),
    ]
}

/// Keys and descriptions for `--list-scenarios`.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn scenario_keys() -> Vec<&'static str> {
    catalog().into_iter().map(|scenario| scenario.key).collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    catalog()
        .into_iter()
        .find(|scenario| scenario.key.eq_ignore_ascii_case(key))
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.rounds.len() == 3, "expected 3 rounds, got {}", summary.rounds.len());
    ensure!(summary.game_ended, "run should finish at the round cap");
    for outcome in &summary.rounds {
        let standings = outcome
            .summary
            .as_ref()
            .map(|round| &round.standings)
            .ok_or_else(|| anyhow::anyhow!("round {} published no standings", outcome.round))?;
        ensure!(
            standings.entries.len() == summary.final_world.roster.bots.len() + 1,
            "standings should list every empire"
        );
        ensure!(
            standings.rank_of(PLAYER_ID).is_some(),
            "player missing from standings"
        );
    }
    let code = encode_friendly(summary.seed);
    let decoded = decode_to_seed(&code)
        .ok_or_else(|| anyhow::anyhow!("run code {code} failed to decode"))?;
    ensure!(
        encode_friendly(decoded) == code,
        "run code {code} is not stable"
    );
    Ok(())
}

fn determinism_expectation(summary: &SimulationSummary) -> Result<()> {
    let tester = GameTester::try_new(false)?;
    let plan = SimulationPlan::new(summary.strategy).with_rounds(8);
    let replay = tester.run_plan(&plan, summary.seed);
    ensure!(
        replay.world_digest()? == summary.world_digest()?,
        "replay of seed {} diverged",
        summary.seed
    );

    let saved = serde_json::to_string(&summary.initial_world)?;
    let restored: WorldState = serde_json::from_str(&saved)?;
    ensure!(
        world_digest(&restored)? == world_digest(&summary.initial_world)?,
        "save/load changed the world"
    );
    Ok(())
}

fn conservation_expectation(summary: &SimulationSummary) -> Result<()> {
    for outcome in &summary.rounds {
        ensure!(
            outcome.land_violations.is_empty(),
            "round {}: land invariant broken for {:?}",
            outcome.round,
            outcome.land_violations
        );
    }
    for empire in summary.final_world.roster.empires() {
        let res = &empire.resources;
        ensure!(
            res.gold >= 0 && res.food >= 0 && res.runes >= 0 && res.land >= 0,
            "{} holds a negative resource",
            empire.name
        );
        ensure!(empire.troops.total() >= 0, "{} has negative troops", empire.name);
        ensure!(empire.peasants >= 0, "{} has negative peasants", empire.name);
        ensure!(
            (0..=100).contains(&empire.health),
            "{} health out of range",
            empire.name
        );
    }
    Ok(())
}

fn protection_expectation(summary: &SimulationSummary) -> Result<()> {
    let protected_until = summary.initial_world.config.protection_rounds;
    for outcome in summary
        .rounds
        .iter()
        .filter(|outcome| outcome.round <= protected_until)
    {
        ensure!(
            outcome.attacks_won() == 0 && outcome.executed.iter().all(|a| a.won.is_none()),
            "player attack resolved in protected round {}",
            outcome.round
        );
        if let Some(round) = &outcome.summary {
            for report in &round.bots {
                ensure!(
                    report.attacks.is_empty(),
                    "bot {} attacked in protected round {}",
                    report.bot,
                    outcome.round
                );
            }
        }
    }
    Ok(())
}

fn make_first_bot_pacifist(world: &mut WorldState) {
    if let Some(bot) = world.roster.bots.get_mut(PACIFIST_BOT) {
        bot.personality.aggression_threshold = 5.0;
    }
}

fn bot_behavior_expectation(summary: &SimulationSummary) -> Result<()> {
    let pacifist = summary
        .initial_world
        .roster
        .bots
        .get(PACIFIST_BOT)
        .map(|bot| bot.id())
        .ok_or_else(|| anyhow::anyhow!("no bots generated"))?;
    for outcome in &summary.rounds {
        let Some(round) = &outcome.summary else {
            continue;
        };
        for report in &round.bots {
            ensure!(
                report.turns_used <= report.turns_budget,
                "bot {} overspent in round {}",
                report.bot,
                outcome.round
            );
            if report.bot == pacifist {
                ensure!(
                    report.attacks.is_empty(),
                    "pacifist bot attacked in round {}",
                    outcome.round
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_keys_are_unique_and_resolvable() {
        let keys = scenario_keys();
        for key in &keys {
            assert_eq!(get_scenario(key).map(|s| s.key), Some(*key));
        }
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), keys.len());
        assert!(get_scenario("SMOKE").is_some());
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn every_scenario_passes_for_a_fixed_seed() {
        let tester = GameTester::try_new(false).unwrap();
        for key in scenario_keys() {
            let scenario = get_scenario(key).unwrap();
            let summary = tester.run_plan(&scenario.plan, 1337);
            for expectation in &scenario.plan.expectations {
                expectation
                    .evaluate(&summary)
                    .unwrap_or_else(|err| panic!("{key}: {err:#}"));
            }
        }
    }
}
