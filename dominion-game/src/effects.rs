//! Timed effects and acquired bonuses.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::economy::ActionKind;

/// "Active until round N" marker. Active iff the expiry round is at least
/// the current round; `None` means the effect is not held at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expiry(Option<u32>);

impl Expiry {
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    #[must_use]
    pub const fn until(round: u32) -> Self {
        Self(Some(round))
    }

    #[must_use]
    pub const fn round(self) -> Option<u32> {
        self.0
    }

    #[must_use]
    pub const fn is_active(self, current_round: u32) -> bool {
        match self.0 {
            Some(until) => until >= current_round,
            None => false,
        }
    }

    /// Drop the marker once it has lapsed.
    pub const fn prune(&mut self, current_round: u32) {
        if !self.is_active(current_round) {
            self.0 = None;
        }
    }

    /// Set the expiry to `round` unless the effect already lasts longer.
    pub fn extend_to(&mut self, round: u32) {
        self.0 = Some(self.0.map_or(round, |until| until.max(round)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimedEffects {
    #[serde(default)]
    pub shield: Expiry,
    #[serde(default)]
    pub gate: Expiry,
    #[serde(default)]
    pub pacification: Expiry,
    #[serde(default)]
    pub divine_protection: Expiry,
}

impl TimedEffects {
    pub const fn prune(&mut self, current_round: u32) {
        self.shield.prune(current_round);
        self.gate.prune(current_round);
        self.pacification.prune(current_round);
        self.divine_protection.prune(current_round);
    }

    /// Pacified or divinely protected targets cannot be attacked or hexed.
    #[must_use]
    pub const fn is_protected(&self, current_round: u32) -> bool {
        self.pacification.is_active(current_round)
            || self.divine_protection.is_active(current_round)
    }
}

/// Numeric effect families a catalog entry may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    FoodProduction,
    Income,
    IndustryOutput,
    RuneProduction,
    ExploreYield,
    BuildCost,
    TroopUpkeep,
    Offense,
    Defense,
    SpellCost,
    SpellHealthCost,
    BankInterest,
    MarketPrice,
    PopulationGrowth,
    RichestBotTax,
}

/// A catalog effect resolved onto an empire at acquisition time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquiredEffect {
    pub id: String,
    pub effect: EffectKind,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bonuses {
    #[serde(default)]
    pub advisors: Vec<AcquiredEffect>,
    #[serde(default)]
    pub techs: Vec<AcquiredEffect>,
    #[serde(default)]
    pub mastery: BTreeMap<ActionKind, u32>,
    #[serde(default)]
    pub policies: BTreeSet<String>,
    #[serde(default)]
    pub bonus_turns: u32,
    #[serde(default = "Bonuses::default_advisor_slots")]
    pub advisor_slots: u32,
}

impl Default for Bonuses {
    fn default() -> Self {
        Self {
            advisors: Vec::new(),
            techs: Vec::new(),
            mastery: BTreeMap::new(),
            policies: BTreeSet::new(),
            bonus_turns: 0,
            advisor_slots: Self::default_advisor_slots(),
        }
    }
}

impl Bonuses {
    const fn default_advisor_slots() -> u32 {
        3
    }

    /// Summed magnitude of every advisor and tech declaring `kind`.
    #[must_use]
    pub fn modifier(&self, kind: EffectKind) -> f64 {
        self.advisors
            .iter()
            .chain(self.techs.iter())
            .filter(|effect| effect.effect == kind)
            .map(|effect| effect.magnitude)
            .sum()
    }

    #[must_use]
    pub fn mastery_level(&self, action: ActionKind) -> u32 {
        self.mastery.get(&action).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn owns(&self, id: &str) -> bool {
        self.advisors
            .iter()
            .chain(self.techs.iter())
            .any(|effect| effect.id == id)
            || self.policies.contains(id)
    }

    #[must_use]
    pub fn free_advisor_slots(&self) -> u32 {
        let used = u32::try_from(self.advisors.len()).unwrap_or(u32::MAX);
        self.advisor_slots.saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_inclusive_of_its_round() {
        let shield = Expiry::until(5);
        assert!(shield.is_active(4));
        assert!(shield.is_active(5));
        assert!(!shield.is_active(6));
        assert!(!Expiry::none().is_active(0));
    }

    #[test]
    fn prune_clears_only_lapsed_markers() {
        let mut effects = TimedEffects {
            shield: Expiry::until(3),
            gate: Expiry::until(7),
            ..TimedEffects::default()
        };
        effects.prune(4);
        assert_eq!(effects.shield, Expiry::none());
        assert_eq!(effects.gate.round(), Some(7));
    }

    #[test]
    fn extend_never_shortens() {
        let mut gate = Expiry::until(9);
        gate.extend_to(4);
        assert_eq!(gate.round(), Some(9));
        gate.extend_to(12);
        assert_eq!(gate.round(), Some(12));
    }

    #[test]
    fn protection_covers_both_flags() {
        let mut effects = TimedEffects::default();
        assert!(!effects.is_protected(1));
        effects.divine_protection = Expiry::until(2);
        assert!(effects.is_protected(2));
        assert!(!effects.is_protected(3));
    }

    #[test]
    fn modifiers_sum_advisors_and_techs() {
        let bonuses = Bonuses {
            advisors: vec![AcquiredEffect {
                id: "a".into(),
                effect: EffectKind::Income,
                magnitude: 0.1,
            }],
            techs: vec![
                AcquiredEffect {
                    id: "t".into(),
                    effect: EffectKind::Income,
                    magnitude: 0.05,
                },
                AcquiredEffect {
                    id: "u".into(),
                    effect: EffectKind::Offense,
                    magnitude: 0.2,
                },
            ],
            ..Bonuses::default()
        };
        assert!((bonuses.modifier(EffectKind::Income) - 0.15).abs() < 1e-9);
        assert!(bonuses.modifier(EffectKind::Defense).abs() < f64::EPSILON);
        assert!(bonuses.owns("u"));
        assert_eq!(bonuses.free_advisor_slots(), 2);
    }
}
