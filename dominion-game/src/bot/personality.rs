//! Archetype personality catalog.
//!
//! Personalities are plain data keyed by [`Archetype`]; generation jitters a
//! copy per bot so no two bots of one archetype behave identically.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::economy::ActionKind;
use crate::empire::IndustryAllocation;
use crate::era::Era;
use crate::race::Race;
use crate::rng::GameRng;
use crate::spells::SpellKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Conqueror,
    Turtle,
    Merchant,
    Mystic,
    Explorer,
    Raider,
}

impl Archetype {
    pub const ALL: [Self; 6] = [
        Self::Conqueror,
        Self::Turtle,
        Self::Merchant,
        Self::Mystic,
        Self::Explorer,
        Self::Raider,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Conqueror => "conqueror",
            Self::Turtle => "turtle",
            Self::Merchant => "merchant",
            Self::Mystic => "mystic",
            Self::Explorer => "explorer",
            Self::Raider => "raider",
        }
    }

    /// Baseline personality for this archetype.
    #[must_use]
    pub fn personality(self) -> Personality {
        let weights = |pairs: &[(ActionKind, f64)]| pairs.iter().copied().collect();
        match self {
            Self::Conqueror => Personality {
                name: "Conqueror".into(),
                archetype: self,
                preferred_era: Era::Present,
                preferred_race: Race::Troll,
                action_weights: weights(&[
                    (ActionKind::Industry, 0.45),
                    (ActionKind::Cash, 0.25),
                    (ActionKind::Farm, 0.15),
                    (ActionKind::Explore, 0.15),
                ]),
                aggression_threshold: 0.8,
                defense_focus: 0.3,
                player_bias: 4.0,
                wealth_seeking: false,
                offensive_spells: vec![SpellKind::Blast],
                explore_before_attack: false,
                industry_mix: [0.35, 0.35, 0.2, 0.1],
            },
            Self::Turtle => Personality {
                name: "Turtle".into(),
                archetype: self,
                preferred_era: Era::Past,
                preferred_race: Race::Dwarf,
                action_weights: weights(&[
                    (ActionKind::Industry, 0.35),
                    (ActionKind::Farm, 0.3),
                    (ActionKind::Cash, 0.35),
                ]),
                aggression_threshold: 3.5,
                defense_focus: 0.9,
                player_bias: 0.0,
                wealth_seeking: false,
                offensive_spells: Vec::new(),
                explore_before_attack: true,
                industry_mix: [0.5, 0.2, 0.1, 0.2],
            },
            Self::Merchant => Personality {
                name: "Merchant".into(),
                archetype: self,
                preferred_era: Era::Present,
                preferred_race: Race::Gnome,
                action_weights: weights(&[
                    (ActionKind::Cash, 0.55),
                    (ActionKind::Farm, 0.2),
                    (ActionKind::Explore, 0.15),
                    (ActionKind::Industry, 0.1),
                ]),
                aggression_threshold: 2.5,
                defense_focus: 0.6,
                player_bias: 1.0,
                wealth_seeking: true,
                offensive_spells: vec![SpellKind::Steal],
                explore_before_attack: true,
                industry_mix: [0.4, 0.3, 0.2, 0.1],
            },
            Self::Mystic => Personality {
                name: "Mystic".into(),
                archetype: self,
                preferred_era: Era::Future,
                preferred_race: Race::Elf,
                action_weights: weights(&[
                    (ActionKind::Meditate, 0.4),
                    (ActionKind::Cash, 0.3),
                    (ActionKind::Farm, 0.15),
                    (ActionKind::Industry, 0.15),
                ]),
                aggression_threshold: 1.8,
                defense_focus: 0.5,
                player_bias: 2.0,
                wealth_seeking: false,
                offensive_spells: vec![SpellKind::Storm, SpellKind::Quake, SpellKind::Steal],
                explore_before_attack: true,
                industry_mix: [0.25, 0.25, 0.35, 0.15],
            },
            Self::Explorer => Personality {
                name: "Explorer".into(),
                archetype: self,
                preferred_era: Era::Past,
                preferred_race: Race::Orc,
                action_weights: weights(&[
                    (ActionKind::Explore, 0.45),
                    (ActionKind::Cash, 0.25),
                    (ActionKind::Farm, 0.15),
                    (ActionKind::Industry, 0.15),
                ]),
                aggression_threshold: 2.2,
                defense_focus: 0.4,
                player_bias: 1.0,
                wealth_seeking: false,
                offensive_spells: Vec::new(),
                explore_before_attack: true,
                industry_mix: [0.4, 0.4, 0.1, 0.1],
            },
            Self::Raider => Personality {
                name: "Raider".into(),
                archetype: self,
                preferred_era: Era::Present,
                preferred_race: Race::Gremlin,
                action_weights: weights(&[
                    (ActionKind::Industry, 0.4),
                    (ActionKind::Cash, 0.3),
                    (ActionKind::Farm, 0.2),
                    (ActionKind::Explore, 0.1),
                ]),
                aggression_threshold: 1.2,
                defense_focus: 0.2,
                player_bias: 3.0,
                wealth_seeking: true,
                offensive_spells: vec![SpellKind::Steal, SpellKind::Seize],
                explore_before_attack: false,
                industry_mix: [0.2, 0.5, 0.2, 0.1],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    pub archetype: Archetype,
    pub preferred_era: Era,
    pub preferred_race: Race,
    pub action_weights: BTreeMap<ActionKind, f64>,
    /// Lower is more eager to attack
    pub aggression_threshold: f64,
    /// 0..=1; how strongly the bot favours defense
    pub defense_focus: f64,
    /// Flat targeting bonus applied to the player
    pub player_bias: f64,
    pub wealth_seeking: bool,
    pub offensive_spells: Vec<SpellKind>,
    pub explore_before_attack: bool,
    /// Raw troop-mix weights; renormalized into an allocation at generation
    pub industry_mix: [f64; 4],
}

impl Personality {
    /// A per-bot variation: weights and thresholds move by up to +-15%.
    #[must_use]
    pub fn jittered(&self, rng: &mut GameRng) -> Self {
        let mut varied = self.clone();
        for weight in varied.action_weights.values_mut() {
            *weight *= rng.range(0.85, 1.15);
        }
        varied.aggression_threshold *= rng.range(0.85, 1.15);
        varied.defense_focus = (varied.defense_focus * rng.range(0.85, 1.15)).clamp(0.0, 1.0);
        for share in &mut varied.industry_mix {
            *share *= rng.range(0.85, 1.15);
        }
        varied
    }

    /// Industry allocation derived from the mix, always summing to 100.
    #[must_use]
    pub fn industry_allocation(&self) -> IndustryAllocation {
        IndustryAllocation::normalized(self.industry_mix)
    }

    #[must_use]
    pub fn weight(&self, action: ActionKind) -> f64 {
        self.action_weights.get(&action).copied().unwrap_or(0.0)
    }
}
