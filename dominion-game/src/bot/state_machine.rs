//! Five-state bot posture, recomputed from scratch every round.
use serde::{Deserialize, Serialize};

use crate::bot::memory::BotMemory;
use crate::bot::personality::Personality;
use crate::config::BotTuning;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    #[default]
    Developing,
    Militarizing,
    Aggressive,
    Defensive,
    Retaliating,
}

impl BotState {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Developing => "developing",
            Self::Militarizing => "militarizing",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Retaliating => "retaliating",
        }
    }
}

/// Power readings the transition needs, gathered by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateInputs {
    pub round: u32,
    pub own_offense: f64,
    pub own_defense: f64,
    pub strongest_rival_offense: f64,
    pub field_average_offense: f64,
}

/// Fixed-priority transition. The first matching rule wins.
#[must_use]
pub fn compute_state(
    personality: &Personality,
    memory: &BotMemory,
    inputs: &StateInputs,
    tuning: &BotTuning,
) -> BotState {
    if memory.attacked_recently(inputs.round)
        && personality.aggression_threshold < tuning.retaliation_cutoff
    {
        return BotState::Retaliating;
    }
    if inputs.own_defense < tuning.defensive_fraction * inputs.strongest_rival_offense
        && personality.defense_focus >= tuning.defense_focus_min
    {
        return BotState::Defensive;
    }
    if inputs.own_offense > tuning.aggressive_multiple * inputs.field_average_offense
        && personality.aggression_threshold <= tuning.cautious_threshold
    {
        return BotState::Aggressive;
    }
    if inputs.round <= tuning.grace_rounds {
        return BotState::Developing;
    }
    BotState::Militarizing
}
