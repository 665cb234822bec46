//! Rule-based empires.
//!
//! The pipeline runs memory -> state -> targeting -> phase execution. Memory
//! and state are inert data; [`phases`] is the only part that mutates.
pub mod economic;
pub mod memory;
pub mod personality;
pub mod phases;
pub mod state_machine;
pub mod strategy;
pub mod targeting;

use serde::{Deserialize, Serialize};

pub use economic::{
    EconomicReport, deficit_liquidation, emergency_liquidation, food_trade, manage_economy,
    surplus_troop_purchase,
};
pub use memory::{BotMemory, CombatIntel, OpponentLedger};
pub use personality::{Archetype, Personality};
pub use phases::{BotRoundReport, run_bot_phase};
pub use state_machine::{BotState, StateInputs, compute_state};
pub use strategy::{AttackGate, ProductionStep, StrategyProfile};
pub use targeting::{AttackerView, TargetView, networth_leader, score_target, select_target};

use crate::empire::{Empire, EmpireId};
use crate::rng::GameRng;

const BOT_NAMES: [&str; 16] = [
    "Ashmark", "Brightwater", "Coldharbor", "Duskhollow", "Emberfall", "Frosthelm", "Greymoor",
    "Highcrest", "Ironvale", "Jadereach", "Kingsmere", "Lowmarsh", "Mistwood", "Northgate",
    "Oakenshield", "Redcliff",
];

/// An empire driven by the bot pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotEmpire {
    pub empire: Empire,
    pub archetype: Archetype,
    pub personality: Personality,
    #[serde(default)]
    pub memory: BotMemory,
    #[serde(default)]
    pub state: BotState,
}

impl BotEmpire {
    /// New bot with a jittered copy of the archetype's personality, its
    /// preferred race and era, and an industry mix derived from it.
    #[must_use]
    pub fn generate(id: EmpireId, archetype: Archetype, rng: &mut GameRng) -> Self {
        let personality = archetype.personality().jittered(rng);
        let base = rng.pick(&BOT_NAMES).copied().unwrap_or("Nameless");
        let name = format!("{base} {}", personality.name);
        let mut empire = Empire::new(
            id,
            name,
            personality.preferred_race,
            personality.preferred_era,
        );
        empire.industry = personality.industry_allocation();
        Self {
            empire,
            archetype,
            personality,
            memory: BotMemory::default(),
            state: BotState::default(),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> StrategyProfile {
        StrategyProfile::for_archetype(self.archetype)
    }

    #[must_use]
    pub const fn id(&self) -> EmpireId {
        self.empire.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_bots_follow_their_archetype() {
        let mut rng = GameRng::create(99);
        let bot = BotEmpire::generate(3, Archetype::Mystic, &mut rng);
        assert_eq!(bot.id(), 3);
        assert_eq!(bot.empire.race, bot.personality.preferred_race);
        assert_eq!(bot.empire.era, bot.personality.preferred_era);
        assert!(bot.empire.name.ends_with("Mystic"));
        assert_eq!(bot.empire.industry.as_array().iter().sum::<u32>(), 100);
        assert_eq!(bot.state, BotState::Developing);

        let again = BotEmpire::generate(3, Archetype::Mystic, &mut GameRng::create(99));
        assert_eq!(bot, again);
    }
}
