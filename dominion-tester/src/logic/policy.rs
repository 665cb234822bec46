use std::fmt;

use dominion_game::era::eras_compatible;
use dominion_game::{
    ActionKind, AttackType, BankOp, BuildingCounts, BuildingKind, EmpireId, Good, MarketOrder,
    SpellKind, TroopKind, WorldState,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Food the autopilot keeps on hand before it starts buying.
const FOOD_FLOOR: i64 = 8_000;
const FOOD_TOP_UP: i64 = 4_000;
const SAVINGS_THRESHOLD: i64 = 250_000;

/// Turn count for an economy step; `None` spends everything left.
pub type TurnBudget = Option<i64>;

/// One step of a player's round, executed in order by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    Economy { action: ActionKind, turns: TurnBudget },
    Build(BuildingCounts),
    Attack { target: EmpireId, attack_type: AttackType },
    Spell { spell: SpellKind, target: Option<EmpireId> },
    Market(MarketOrder),
    Bank(BankOp),
    Draft(String),
    Shop(String),
}

impl PlannedAction {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Economy { action, turns } => match turns {
                Some(turns) => format!("{} x{turns}", action.key()),
                None => format!("{} (rest)", action.key()),
            },
            Self::Build(order) => format!("build {}", order.total()),
            Self::Attack {
                target,
                attack_type,
            } => format!("{attack_type:?} attack on {target}"),
            Self::Spell { spell, target } => match target {
                Some(target) => format!("{spell:?} on {target}"),
                None => format!("{spell:?}"),
            },
            Self::Market(order) => format!("{:?} {} {:?}", order.side, order.quantity, order.good),
            Self::Bank(op) => format!("{op:?}"),
            Self::Draft(id) => format!("draft {id}"),
            Self::Shop(id) => format!("shop {id}"),
        }
    }
}

/// Policy interface for automated play.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Steps for the current round, given the world as the round opens.
    fn plan_round(&mut self, world: &WorldState) -> Vec<PlannedAction>;
}

/// Built-in autopilot strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameplayStrategy {
    Idle,
    Builder,
    Raider,
    Mystic,
    MonteCarlo,
}

impl GameplayStrategy {
    pub const CAMPAIGN: [Self; 4] = [Self::Builder, Self::Raider, Self::Mystic, Self::MonteCarlo];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Builder => "Builder",
            Self::Raider => "Raider",
            Self::Mystic => "Mystic",
            Self::MonteCarlo => "Monte Carlo",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Idle => Box::new(IdlePolicy),
            Self::Builder => Box::new(BuilderPolicy),
            Self::Raider => Box::new(RaiderPolicy),
            Self::Mystic => Box::new(MysticPolicy),
            Self::MonteCarlo => Box::new(MonteCarloPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct IdlePolicy;
struct BuilderPolicy;
struct RaiderPolicy;
struct MysticPolicy;

struct MonteCarloPolicy {
    rng: ChaCha20Rng,
}

impl MonteCarloPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

/// Living bots the player can reach this round, weakest first.
#[must_use]
pub fn reachable_targets(world: &WorldState) -> Vec<EmpireId> {
    let player = world.player();
    let gate = player.has_gate(world.round);
    let mut targets: Vec<_> = world
        .roster
        .bots
        .iter()
        .map(|bot| &bot.empire)
        .filter(|empire| !empire.is_eliminated() && !empire.is_protected(world.round))
        .filter(|empire| eras_compatible(player.era, empire.era, gate))
        .map(|empire| (empire.networth, empire.id))
        .collect();
    targets.sort_unstable();
    targets.into_iter().map(|(_, id)| id).collect()
}

/// Bot with the highest networth, if any is still standing.
#[must_use]
pub fn leading_bot(world: &WorldState) -> Option<EmpireId> {
    world
        .roster
        .bots
        .iter()
        .filter(|bot| !bot.empire.is_eliminated())
        .max_by_key(|bot| (bot.empire.networth, std::cmp::Reverse(bot.id())))
        .map(|bot| bot.id())
}

/// Steps every active strategy shares: take a draft pick, keep food up,
/// bank surplus gold.
fn housekeeping(world: &WorldState) -> Vec<PlannedAction> {
    let mut steps = Vec::new();
    if let Some(first) = world.draft_options.as_ref().and_then(|options| options.first()) {
        steps.push(PlannedAction::Draft(first.clone()));
    }
    let player = world.player();
    if player.resources.food < FOOD_FLOOR {
        steps.push(PlannedAction::Market(MarketOrder::buy(Good::Food, FOOD_TOP_UP)));
    }
    if player.resources.gold > SAVINGS_THRESHOLD {
        steps.push(PlannedAction::Bank(BankOp::Deposit(
            player.resources.gold - SAVINGS_THRESHOLD,
        )));
    }
    if player.loan > 0 && player.resources.gold > player.loan * 2 {
        steps.push(PlannedAction::Bank(BankOp::Repay(player.loan)));
    }
    steps
}

fn build_order(freeland: i64, mix: &[(BuildingKind, i64)]) -> Option<BuildingCounts> {
    if freeland <= 0 {
        return None;
    }
    let total_weight: i64 = mix.iter().map(|(_, weight)| weight).sum();
    let mut order = BuildingCounts::default();
    let mut placed = 0;
    for (kind, weight) in mix {
        let count = freeland * weight / total_weight.max(1);
        *order.get_mut(*kind) += count;
        placed += count;
    }
    if let Some((kind, _)) = mix.first() {
        *order.get_mut(*kind) += freeland - placed;
    }
    Some(order)
}

impl PlayerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn plan_round(&mut self, _world: &WorldState) -> Vec<PlannedAction> {
        Vec::new()
    }
}

impl PlayerPolicy for BuilderPolicy {
    fn name(&self) -> &'static str {
        "builder"
    }

    fn plan_round(&mut self, world: &WorldState) -> Vec<PlannedAction> {
        let mut steps = housekeeping(world);
        steps.push(PlannedAction::Economy {
            action: ActionKind::Explore,
            turns: Some(6),
        });
        let freeland = world.player().resources.freeland;
        let mix = [
            (BuildingKind::Homes, 3),
            (BuildingKind::Markets, 3),
            (BuildingKind::Farms, 3),
            (BuildingKind::Towers, 1),
        ];
        if let Some(order) = build_order(freeland, &mix) {
            steps.push(PlannedAction::Build(order));
        }
        if let Some(tech) = world.shop_stock.as_ref().and_then(|stock| stock.first()) {
            steps.push(PlannedAction::Shop(tech.clone()));
        }
        steps.push(PlannedAction::Economy {
            action: ActionKind::Farm,
            turns: Some(4),
        });
        steps.push(PlannedAction::Economy {
            action: ActionKind::Cash,
            turns: None,
        });
        steps
    }
}

impl PlayerPolicy for RaiderPolicy {
    fn name(&self) -> &'static str {
        "raider"
    }

    fn plan_round(&mut self, world: &WorldState) -> Vec<PlannedAction> {
        let mut steps = housekeeping(world);
        let targets = reachable_targets(world);
        if let Some(&target) = targets.first() {
            if world.player_intel_on(target).is_none() {
                steps.push(PlannedAction::Spell {
                    spell: SpellKind::Spy,
                    target: Some(target),
                });
            }
            steps.push(PlannedAction::Attack {
                target,
                attack_type: AttackType::Standard,
            });
            let strongest_line = TroopKind::MILITARY
                .iter()
                .copied()
                .max_by_key(|kind| world.player().troops.get(*kind));
            if let Some(attack_type) = strongest_line.and_then(AttackType::for_line) {
                steps.push(PlannedAction::Attack {
                    target,
                    attack_type,
                });
            }
        }
        let freeland = world.player().resources.freeland;
        let mix = [(BuildingKind::Barracks, 2), (BuildingKind::Farms, 1)];
        if let Some(order) = build_order(freeland, &mix) {
            steps.push(PlannedAction::Build(order));
        }
        steps.push(PlannedAction::Economy {
            action: ActionKind::Farm,
            turns: Some(5),
        });
        steps.push(PlannedAction::Economy {
            action: ActionKind::Industry,
            turns: None,
        });
        steps
    }
}

impl PlayerPolicy for MysticPolicy {
    fn name(&self) -> &'static str {
        "mystic"
    }

    fn plan_round(&mut self, world: &WorldState) -> Vec<PlannedAction> {
        let mut steps = housekeeping(world);
        if !world.player().is_shielded(world.round + 1) {
            steps.push(PlannedAction::Spell {
                spell: SpellKind::Shield,
                target: None,
            });
        }
        if let Some(leader) = leading_bot(world)
            && reachable_targets(world).contains(&leader)
        {
            steps.push(PlannedAction::Spell {
                spell: SpellKind::Storm,
                target: Some(leader),
            });
        }
        let freeland = world.player().resources.freeland;
        let mix = [(BuildingKind::Towers, 2), (BuildingKind::Farms, 1)];
        if let Some(order) = build_order(freeland, &mix) {
            steps.push(PlannedAction::Build(order));
        }
        steps.push(PlannedAction::Economy {
            action: ActionKind::Meditate,
            turns: Some(8),
        });
        steps.push(PlannedAction::Economy {
            action: ActionKind::Cash,
            turns: None,
        });
        steps
    }
}

impl PlayerPolicy for MonteCarloPolicy {
    fn name(&self) -> &'static str {
        "monte-carlo"
    }

    fn plan_round(&mut self, world: &WorldState) -> Vec<PlannedAction> {
        let mut steps = housekeeping(world);
        let targets = reachable_targets(world);
        let step_count = self.rng.gen_range(2..=6);
        for _ in 0..step_count {
            let step = match self.rng.gen_range(0..10) {
                0 | 1 if !targets.is_empty() => PlannedAction::Attack {
                    target: targets[self.rng.gen_range(0..targets.len())],
                    attack_type: AttackType::ALL[self.rng.gen_range(0..AttackType::ALL.len())],
                },
                2 if !targets.is_empty() => PlannedAction::Spell {
                    spell: SpellKind::ENEMY_SPELLS
                        [self.rng.gen_range(0..SpellKind::ENEMY_SPELLS.len())],
                    target: Some(targets[self.rng.gen_range(0..targets.len())]),
                },
                3 => PlannedAction::Spell {
                    spell: SpellKind::SELF_SPELLS
                        [self.rng.gen_range(0..SpellKind::SELF_SPELLS.len())],
                    target: None,
                },
                _ => PlannedAction::Economy {
                    action: ActionKind::ALL[self.rng.gen_range(0..ActionKind::ALL.len() - 1)],
                    turns: Some(self.rng.gen_range(1..=8)),
                },
            };
            steps.push(step);
        }
        steps.push(PlannedAction::Economy {
            action: ActionKind::Cash,
            turns: None,
        });
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dominion_game::{Catalog, Race, SimConfig};

    fn world(seed: u64) -> WorldState {
        let catalog = Catalog::builtin().unwrap();
        WorldState::generate("policy", seed, SimConfig::default(), &catalog, "Pilot", Race::Human)
    }

    #[test]
    fn protected_bots_are_not_targets() {
        let world = world(3);
        assert!(reachable_targets(&world).is_empty());
    }

    #[test]
    fn build_orders_cover_all_free_land() {
        let order = build_order(101, &[(BuildingKind::Homes, 2), (BuildingKind::Farms, 1)])
            .unwrap();
        assert_eq!(order.total(), 101);
        assert!(build_order(0, &[(BuildingKind::Homes, 1)]).is_none());
    }

    #[test]
    fn monte_carlo_plans_are_seeded() {
        let world = world(9);
        let mut a = GameplayStrategy::MonteCarlo.create_policy(5);
        let mut b = GameplayStrategy::MonteCarlo.create_policy(5);
        assert_eq!(a.plan_round(&world), b.plan_round(&world));
    }

    #[test]
    fn every_active_plan_ends_by_spending_the_rest() {
        let world = world(4);
        for strategy in GameplayStrategy::CAMPAIGN {
            let plan = strategy.create_policy(1).plan_round(&world);
            assert!(matches!(
                plan.last(),
                Some(PlannedAction::Economy { turns: None, .. })
            ));
        }
        assert!(GameplayStrategy::Idle.create_policy(1).plan_round(&world).is_empty());
    }
}
