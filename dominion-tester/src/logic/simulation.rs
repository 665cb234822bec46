use std::sync::Arc;

use dominion_game::{
    ActionError, ActionOutcome, Catalog, EmpireId, Race, RoundSummary, SimConfig,
    TurnActionResult, TurnParams, WorldState, attack, bank_transaction, build, buy_from_shop,
    cast_spell, economy_turn, end_round, market_trade, select_draft,
};
use log::debug;

use crate::logic::policy::{GameplayStrategy, PlannedAction, PlayerPolicy};

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub race: Race,
    pub sim: SimConfig,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            race: Race::Human,
            sim: SimConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_rounds(mut self, rounds: u32) -> Self {
        self.sim.max_rounds = rounds;
        self
    }
}

/// A step the engine accepted.
#[derive(Debug, Clone)]
pub struct ExecutedAction {
    pub label: String,
    pub turns_spent: i64,
    /// Set for attacks: whether the attack took land
    pub won: Option<bool>,
}

/// Result of one player round followed by the bot phase.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub round: u32,
    pub executed: Vec<ExecutedAction>,
    pub rejected: Vec<String>,
    pub turns_forfeited: i64,
    pub summary: Option<RoundSummary>,
    /// Empires whose land stopped adding up after this round
    pub land_violations: Vec<EmpireId>,
    pub game_ended: bool,
}

impl RoundOutcome {
    #[must_use]
    pub fn attacks_won(&self) -> usize {
        self.executed
            .iter()
            .filter(|action| action.won == Some(true))
            .count()
    }
}

/// Core deterministic harness: one world driven by one policy.
pub struct SimulationSession {
    world: WorldState,
    catalog: Arc<Catalog>,
}

impl SimulationSession {
    #[must_use]
    pub fn new(config: &SimulationConfig, catalog: Arc<Catalog>) -> Self {
        let world = WorldState::generate(
            format!("sim-{}-{}", config.strategy.label(), config.seed),
            config.seed,
            config.sim.clone(),
            &catalog,
            "Autopilot",
            config.race,
        );
        Self { world, catalog }
    }

    #[must_use]
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    #[must_use]
    pub fn into_world(self) -> WorldState {
        self.world
    }

    /// Play the policy's round, then hand over to the bots.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> RoundOutcome {
        let round = self.world.round;
        let mut outcome = RoundOutcome {
            round,
            executed: Vec::new(),
            rejected: Vec::new(),
            turns_forfeited: 0,
            summary: None,
            land_violations: Vec::new(),
            game_ended: self.world.is_finished(),
        };
        if outcome.game_ended {
            return outcome;
        }

        for step in policy.plan_round(&self.world) {
            let label = step.label();
            match self.execute(&step) {
                Ok(result) => {
                    let won = match &result.outcome {
                        ActionOutcome::Attack(combat) => Some(combat.won),
                        _ => None,
                    };
                    outcome.executed.push(ExecutedAction {
                        label,
                        turns_spent: result.turns_spent,
                        won,
                    });
                }
                Err(err) => {
                    debug!("{} rejected {label}: {err}", policy.name());
                    outcome.rejected.push(format!("{label}: {err}"));
                }
            }
        }

        outcome.turns_forfeited = self.world.player_turns_remaining;
        match end_round(&mut self.world, &self.catalog) {
            Ok(TurnActionResult {
                outcome: ActionOutcome::RoundEnded(summary),
                ..
            }) => outcome.summary = Some(summary),
            Ok(_) => {}
            Err(err) => outcome.rejected.push(format!("end round: {err}")),
        }
        outcome.land_violations = self
            .world
            .roster
            .empires()
            .filter(|empire| !empire.land_invariant_holds())
            .map(|empire| empire.id)
            .collect();
        outcome.game_ended = self.world.is_finished();
        outcome
    }

    /// Play rounds until the run finishes or `max_rounds` have been played.
    pub fn run(&mut self, policy: &mut dyn PlayerPolicy, max_rounds: u32) -> Vec<RoundOutcome> {
        let mut rounds = Vec::new();
        for _ in 0..max_rounds {
            let outcome = self.advance(policy);
            let ended = outcome.game_ended;
            rounds.push(outcome);
            if ended {
                break;
            }
        }
        rounds
    }

    fn execute(&mut self, step: &PlannedAction) -> Result<TurnActionResult, ActionError> {
        let world = &mut self.world;
        match step {
            PlannedAction::Economy { action, turns } => {
                let turns = turns
                    .unwrap_or(world.player_turns_remaining)
                    .min(world.player_turns_remaining);
                economy_turn(world, *action, turns, &TurnParams::default())
            }
            PlannedAction::Build(order) => build(world, *order),
            PlannedAction::Attack {
                target,
                attack_type,
            } => attack(world, *target, *attack_type),
            PlannedAction::Spell { spell, target } => cast_spell(world, *spell, *target),
            PlannedAction::Market(order) => market_trade(world, *order),
            PlannedAction::Bank(op) => bank_transaction(world, *op),
            PlannedAction::Draft(id) => select_draft(world, &self.catalog, id),
            PlannedAction::Shop(id) => buy_from_shop(world, &self.catalog, id),
        }
    }
}
