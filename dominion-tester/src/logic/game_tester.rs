use std::sync::Arc;

use anyhow::{Context, Result};
use dominion_game::{Catalog, SimConfig, WorldState};
use sha2::{Digest, Sha256};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{RoundOutcome, SimulationConfig, SimulationSession};

pub const DEFAULT_ROUNDS: u32 = 20;

/// Everything needed to reproduce one scripted run.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub rounds: u32,
    pub configure: Option<fn(&mut SimConfig)>,
    pub setup: Option<fn(&mut WorldState)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            rounds: DEFAULT_ROUNDS,
            configure: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_config(mut self, configure: fn(&mut SimConfig)) -> Self {
        self.configure = Some(configure);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut WorldState)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
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
    /// Run the hook against a finished simulation.
    ///
    /// # Errors
    ///
    /// Returns the hook's error when the expectation does not hold.
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
    pub rounds: Vec<RoundOutcome>,
    pub initial_world: WorldState,
    pub final_world: WorldState,
    pub game_ended: bool,
}

impl SimulationSummary {
    #[must_use]
    pub fn attacks_won(&self) -> usize {
        self.rounds.iter().map(RoundOutcome::attacks_won).sum()
    }

    #[must_use]
    pub fn final_rank(&self) -> Option<u32> {
        self.final_world
            .last_standings
            .as_ref()
            .and_then(|standings| standings.rank_of(dominion_game::PLAYER_ID))
    }

    /// SHA-256 over the serialized final world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world cannot be serialized.
    pub fn world_digest(&self) -> Result<[u8; 32]> {
        world_digest(&self.final_world)
    }
}

/// SHA-256 over a serialized world.
///
/// # Errors
///
/// Returns an error if the world cannot be serialized.
pub fn world_digest(world: &WorldState) -> Result<[u8; 32]> {
    let json = serde_json::to_vec(world).context("failed to serialize world")?;
    let mut hasher = Sha256::new();
    hasher.update(json);
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 32];
    bytes.copy_from_slice(&digest);
    Ok(bytes)
}

/// Headless deterministic runner for the core game logic.
#[derive(Clone)]
pub struct GameTester {
    catalog: Arc<Catalog>,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>, verbose: bool) -> Self {
        Self { catalog, verbose }
    }

    /// Tester over the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails to parse.
    pub fn try_new(verbose: bool) -> Result<Self> {
        let catalog = Catalog::builtin().context("failed to load built-in catalog")?;
        Ok(Self::new(Arc::new(catalog), verbose))
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn session(&self, plan: &SimulationPlan, seed: u64) -> SimulationSession {
        let mut config = SimulationConfig::new(plan.strategy, seed).with_rounds(plan.rounds);
        if let Some(configure) = plan.configure {
            configure(&mut config.sim);
        }
        let mut session = SimulationSession::new(&config, self.catalog());
        if let Some(setup) = plan.setup {
            setup(session.world_mut());
        }
        session
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut session = self.session(plan, seed);
        let initial_world = session.world().clone();
        let mut policy = plan.strategy.create_policy(seed);
        let rounds = session.run(policy.as_mut(), plan.rounds);
        let final_world = session.into_world();
        if self.verbose {
            println!(
                "  ▶ {} seed {}: {} rounds, finished {}",
                plan.strategy,
                seed,
                rounds.len(),
                final_world.is_finished()
            );
        }
        SimulationSummary {
            seed,
            strategy: plan.strategy,
            game_ended: final_world.is_finished(),
            rounds,
            initial_world,
            final_world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_apply_config_and_setup() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(GameplayStrategy::Idle)
            .with_rounds(3)
            .with_config(|config| config.bot_count = 2)
            .with_setup(|world| world.roster.player.resources.gold = 1);
        let summary = tester.run_plan(&plan, 10);
        assert_eq!(summary.initial_world.roster.bots.len(), 2);
        assert_eq!(summary.initial_world.player().resources.gold, 1);
        assert_eq!(summary.rounds.len(), 3);
        assert!(summary.game_ended);
        assert!(summary.final_rank().is_some());
    }

    #[test]
    fn identical_plans_share_a_digest() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(GameplayStrategy::Raider).with_rounds(5);
        let first = tester.run_plan(&plan, 99).world_digest().unwrap();
        let second = tester.run_plan(&plan, 99).world_digest().unwrap();
        assert_eq!(first, second);
    }
}
