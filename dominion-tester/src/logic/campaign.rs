use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use dominion_game::encode_friendly;

/// Outcome of one full campaign for one strategy and seed.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignRecord {
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub seed_code: String,
    pub final_rank: u32,
    pub networth: i64,
    pub land: i64,
    pub rounds_played: u32,
    pub player_eliminated: bool,
    pub bots_eliminated: u32,
    pub attacks_won: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignAggregate {
    pub strategy: GameplayStrategy,
    pub iterations: usize,
    pub mean_rank: f64,
    pub mean_networth: f64,
    pub std_networth: f64,
    pub mean_land: f64,
    pub mean_attacks_won: f64,
    pub survival_rate: f64,
    pub win_rate: f64,
}

/// Play every campaign strategy across the seeds and record how each run ended.
///
/// # Errors
///
/// Fails when a run ends without standings or breaks the land invariant.
pub fn run_campaign_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
    rounds: u32,
) -> Result<Vec<CampaignRecord>> {
    let iterations = iterations.max(1);
    let mut records =
        Vec::with_capacity(seeds.len() * GameplayStrategy::CAMPAIGN.len() * iterations);

    for strategy in GameplayStrategy::CAMPAIGN {
        let plan = SimulationPlan::new(strategy).with_rounds(rounds);
        for seed in seeds {
            for iteration in 0..iterations {
                let iteration_offset = u64::try_from(iteration).unwrap_or(0);
                let iteration_seed = seed.seed.wrapping_add(iteration_offset);
                let summary = tester.run_plan(&plan, iteration_seed);
                let seed_code = if iteration == 0 {
                    seed.display_code()
                } else {
                    encode_friendly(iteration_seed)
                };
                let record = record_from_summary(&summary, seed_code).with_context(|| {
                    format!(
                        "campaign failed for strategy {strategy}, seed {} (iteration {})",
                        seed.seed,
                        iteration + 1
                    )
                })?;
                records.push(record);
            }
        }
    }

    Ok(records)
}

fn record_from_summary(summary: &SimulationSummary, seed_code: String) -> Result<CampaignRecord> {
    for outcome in &summary.rounds {
        ensure!(
            outcome.land_violations.is_empty(),
            "round {}: land invariant broken for {:?}",
            outcome.round,
            outcome.land_violations
        );
    }
    let world = &summary.final_world;
    let final_rank = summary
        .final_rank()
        .context("run ended without published standings")?;
    let player = world.player();
    let bots_eliminated = world
        .roster
        .bots
        .iter()
        .filter(|bot| bot.empire.is_eliminated())
        .count();

    Ok(CampaignRecord {
        strategy: summary.strategy,
        seed: summary.seed,
        seed_code,
        final_rank,
        networth: player.networth,
        land: player.resources.land,
        rounds_played: u32::try_from(summary.rounds.len()).unwrap_or(u32::MAX),
        player_eliminated: player.is_eliminated(),
        bots_eliminated: u32::try_from(bots_eliminated).unwrap_or(u32::MAX),
        attacks_won: u32::try_from(summary.attacks_won()).unwrap_or(u32::MAX),
    })
}

#[must_use]
pub fn aggregate_campaigns(records: &[CampaignRecord]) -> Vec<CampaignAggregate> {
    let mut builders: BTreeMap<GameplayStrategy, AggregateBuilder> = BTreeMap::new();
    for record in records {
        builders
            .entry(record.strategy)
            .or_insert_with(|| AggregateBuilder::new(record.strategy))
            .ingest(record);
    }
    builders
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// A campaign counts as won when the player tops the final standings alive.
#[must_use]
pub const fn player_won(record: &CampaignRecord) -> bool {
    record.final_rank == 1 && !record.player_eliminated
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    strategy: GameplayStrategy,
    iterations: u32,
    rank_sum: u64,
    networth: RunningStats,
    land_sum: f64,
    attacks_won_sum: u32,
    survived: u32,
    won: u32,
}

impl AggregateBuilder {
    fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            iterations: 0,
            rank_sum: 0,
            networth: RunningStats::default(),
            land_sum: 0.0,
            attacks_won_sum: 0,
            survived: 0,
            won: 0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn ingest(&mut self, record: &CampaignRecord) {
        self.iterations += 1;
        self.rank_sum += u64::from(record.final_rank);
        self.networth.add(record.networth as f64);
        self.land_sum += record.land as f64;
        self.attacks_won_sum = self.attacks_won_sum.saturating_add(record.attacks_won);
        if !record.player_eliminated {
            self.survived += 1;
        }
        if player_won(record) {
            self.won += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> CampaignAggregate {
        let denom = f64::from(self.iterations.max(1));
        CampaignAggregate {
            strategy: self.strategy,
            iterations: usize::try_from(self.iterations).unwrap_or(usize::MAX),
            mean_rank: self.rank_sum as f64 / denom,
            mean_networth: self.networth.mean(),
            std_networth: self.networth.std_dev(),
            mean_land: self.land_sum / denom,
            mean_attacks_won: f64::from(self.attacks_won_sum) / denom,
            survival_rate: f64::from(self.survived) / denom,
            win_rate: f64::from(self.won) / denom,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        self.m2 += delta * (value - self.mean);
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}
