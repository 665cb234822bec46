//! Per-archetype strategy profiles: how many turns to explore, when to
//! attack, what to build and how to spend the rest of the round.
use serde::{Deserialize, Serialize};

use crate::bot::personality::{Archetype, Personality};
use crate::bot::state_machine::BotState;
use crate::constants::{LATE_GAME_ROUND, PACIFIST_AGGRESSION_THRESHOLD};
use crate::economy::ActionKind;
use crate::empire::{BuildingCounts, BuildingKind};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, u32_to_f64};

/// Conditions a bot checks before committing to an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackGate {
    pub min_round: u32,
    pub min_health: i64,
    /// Estimated offense/defense ratio floor
    pub min_power_ratio: f64,
    pub max_attacks_per_round: u32,
}

/// One entry of the production plan. Shares below `min_turns` are folded
/// into cash instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionStep {
    pub action: ActionKind,
    pub min_turns: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub explore_turns: i64,
    pub attack: AttackGate,
    /// Target share of freeland per building kind, indexed like `BuildingKind::ALL`
    pub build_ratios: [f64; 5],
    pub production: Vec<ProductionStep>,
    pub uses_magic: bool,
    pub keeps_shield: bool,
    /// Turns of deficit the bot tolerates before liquidating troops
    pub runway_turns: f64,
    pub base_spending: f64,
}

const fn step(action: ActionKind, min_turns: i64) -> ProductionStep {
    ProductionStep { action, min_turns }
}

impl StrategyProfile {
    #[must_use]
    pub fn for_archetype(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Conqueror => Self {
                explore_turns: 2,
                attack: AttackGate {
                    min_round: 4,
                    min_health: 55,
                    min_power_ratio: 1.15,
                    max_attacks_per_round: 4,
                },
                build_ratios: [0.15, 0.25, 0.1, 0.4, 0.1],
                production: vec![
                    step(ActionKind::Industry, 4),
                    step(ActionKind::Farm, 2),
                    step(ActionKind::Cash, 1),
                ],
                uses_magic: true,
                keeps_shield: false,
                runway_turns: 15.0,
                base_spending: 0.7,
            },
            Archetype::Turtle => Self {
                explore_turns: 4,
                attack: AttackGate {
                    min_round: 12,
                    min_health: 80,
                    min_power_ratio: 2.0,
                    max_attacks_per_round: 1,
                },
                build_ratios: [0.2, 0.3, 0.15, 0.2, 0.15],
                production: vec![
                    step(ActionKind::Farm, 3),
                    step(ActionKind::Industry, 4),
                    step(ActionKind::Cash, 1),
                ],
                uses_magic: false,
                keeps_shield: true,
                runway_turns: 40.0,
                base_spending: 0.3,
            },
            Archetype::Merchant => Self {
                explore_turns: 5,
                attack: AttackGate {
                    min_round: 10,
                    min_health: 70,
                    min_power_ratio: 1.6,
                    max_attacks_per_round: 1,
                },
                build_ratios: [0.45, 0.25, 0.05, 0.1, 0.15],
                production: vec![
                    step(ActionKind::Cash, 2),
                    step(ActionKind::Farm, 2),
                    step(ActionKind::Explore, 2),
                    step(ActionKind::Industry, 3),
                ],
                uses_magic: true,
                keeps_shield: true,
                runway_turns: 30.0,
                base_spending: 0.4,
            },
            Archetype::Mystic => Self {
                explore_turns: 3,
                attack: AttackGate {
                    min_round: 8,
                    min_health: 65,
                    min_power_ratio: 1.4,
                    max_attacks_per_round: 2,
                },
                build_ratios: [0.15, 0.25, 0.4, 0.1, 0.1],
                production: vec![
                    step(ActionKind::Meditate, 3),
                    step(ActionKind::Cash, 2),
                    step(ActionKind::Farm, 2),
                    step(ActionKind::Industry, 3),
                ],
                uses_magic: true,
                keeps_shield: true,
                runway_turns: 25.0,
                base_spending: 0.5,
            },
            Archetype::Explorer => Self {
                explore_turns: 10,
                attack: AttackGate {
                    min_round: 8,
                    min_health: 65,
                    min_power_ratio: 1.5,
                    max_attacks_per_round: 2,
                },
                build_ratios: [0.2, 0.3, 0.1, 0.2, 0.2],
                production: vec![
                    step(ActionKind::Explore, 3),
                    step(ActionKind::Cash, 2),
                    step(ActionKind::Farm, 2),
                    step(ActionKind::Industry, 3),
                ],
                uses_magic: false,
                keeps_shield: false,
                runway_turns: 25.0,
                base_spending: 0.5,
            },
            Archetype::Raider => Self {
                explore_turns: 1,
                attack: AttackGate {
                    min_round: 5,
                    min_health: 50,
                    min_power_ratio: 1.2,
                    max_attacks_per_round: 3,
                },
                build_ratios: [0.2, 0.25, 0.1, 0.35, 0.1],
                production: vec![
                    step(ActionKind::Industry, 4),
                    step(ActionKind::Cash, 2),
                    step(ActionKind::Farm, 2),
                ],
                uses_magic: true,
                keeps_shield: false,
                runway_turns: 12.0,
                base_spending: 0.8,
            },
        }
    }

    /// Share of spare gold the bot will commit this round; rises toward 1 as
    /// the campaign reaches its late game.
    #[must_use]
    pub fn spending_aggression(&self, round: u32) -> f64 {
        let progress = (u32_to_f64(round) / LATE_GAME_ROUND).min(1.0);
        let base = self.base_spending.clamp(0.0, 1.0);
        (base + (1.0 - base) * progress * 0.5).clamp(0.0, 1.0)
    }

    /// Whether an attack at `ratio` is acceptable right now.
    #[must_use]
    pub fn allows_attack(
        &self,
        personality: &Personality,
        state: BotState,
        round: u32,
        health: i64,
        ratio: f64,
        attacks_this_round: u32,
    ) -> bool {
        if personality.aggression_threshold >= PACIFIST_AGGRESSION_THRESHOLD {
            return false;
        }
        if health < self.attack.min_health
            || attacks_this_round >= self.attack.max_attacks_per_round
        {
            return false;
        }
        let required = self
            .attack
            .min_power_ratio
            .max(personality.aggression_threshold);
        match state {
            BotState::Developing | BotState::Defensive => false,
            BotState::Retaliating => ratio >= required * 0.9,
            BotState::Aggressive => round >= self.attack.min_round && ratio >= required * 0.9,
            BotState::Militarizing => round >= self.attack.min_round && ratio >= required,
        }
    }

    /// Building order for `freeland` acres following the ratios; any
    /// rounding remainder goes to the largest ratio.
    #[must_use]
    pub fn build_plan(&self, freeland: i64) -> BuildingCounts {
        let mut plan = BuildingCounts::default();
        if freeland <= 0 {
            return plan;
        }
        let total: f64 = self.build_ratios.iter().sum();
        if total <= 0.0 {
            return plan;
        }
        let acres = i64_to_f64(freeland);
        let mut largest = BuildingKind::ALL[0];
        for (kind, ratio) in BuildingKind::ALL.into_iter().zip(self.build_ratios) {
            *plan.get_mut(kind) = floor_f64_to_i64(acres * ratio / total);
            if ratio > self.build_ratios[largest.index()] {
                largest = kind;
            }
        }
        *plan.get_mut(largest) += freeland - plan.total();
        plan
    }

    /// Split `turns` over the production plan by personality weight.
    /// Steps whose share falls below their minimum are replaced by cash.
    #[must_use]
    pub fn allocate_production(
        &self,
        personality: &Personality,
        turns: i64,
    ) -> Vec<(ActionKind, i64)> {
        let mut plan: Vec<(ActionKind, i64)> = Vec::new();
        if turns <= 0 || self.production.is_empty() {
            return plan;
        }
        let weights: Vec<f64> = self
            .production
            .iter()
            .map(|step| personality.weight(step.action).max(0.05))
            .collect();
        let total: f64 = weights.iter().sum();
        let mut assigned = 0;
        let mut substituted = 0;
        for (step, weight) in self.production.iter().zip(weights) {
            let share = floor_f64_to_i64(i64_to_f64(turns) * weight / total);
            if share < step.min_turns {
                substituted += share;
            } else if share > 0 {
                push_turns(&mut plan, step.action, share);
            }
            assigned += share;
        }
        let leftover = turns - assigned + substituted;
        if leftover > 0 {
            push_turns(&mut plan, ActionKind::Cash, leftover);
        }
        plan
    }
}

fn push_turns(plan: &mut Vec<(ActionKind, i64)>, action: ActionKind, turns: i64) {
    if let Some(entry) = plan.iter_mut().find(|(existing, _)| *existing == action) {
        entry.1 += turns;
    } else {
        plan.push((action, turns));
    }
}
