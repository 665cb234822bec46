//! Empire data model shared by every resolver.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    HEALTH_MAX, NW_GOLD_DIVISOR, NW_PEASANT_DIVISOR, NW_PER_BUILDING, NW_PER_LAND,
    NW_TROOP_WEIGHTS, START_AIRCRAFT, START_CAVALRY, START_FOOD, START_FREELAND, START_GOLD,
    START_INFANTRY, START_LAND, START_NAVY, START_PEASANTS, START_RUNES, START_TAX_RATE,
    START_WIZARDS,
};
use crate::effects::{Bonuses, EffectKind, TimedEffects};
use crate::era::Era;
use crate::numbers::floor_f64_to_i64;
use crate::race::{Race, RaceModifiers};

/// Empire identifier. The player is always `0`; bots are numbered from 1.
pub type EmpireId = u32;

pub const PLAYER_ID: EmpireId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroopKind {
    Infantry,
    Cavalry,
    Aircraft,
    Navy,
    Wizards,
}

impl TroopKind {
    pub const ALL: [Self; 5] = [
        Self::Infantry,
        Self::Cavalry,
        Self::Aircraft,
        Self::Navy,
        Self::Wizards,
    ];
    /// Fighting units; wizards only take part in magic.
    pub const MILITARY: [Self; 4] = [Self::Infantry, Self::Cavalry, Self::Aircraft, Self::Navy];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Infantry => 0,
            Self::Cavalry => 1,
            Self::Aircraft => 2,
            Self::Navy => 3,
            Self::Wizards => 4,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Infantry => "infantry",
            Self::Cavalry => "cavalry",
            Self::Aircraft => "aircraft",
            Self::Navy => "navy",
            Self::Wizards => "wizards",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Markets,
    Farms,
    Towers,
    Barracks,
    Homes,
}

impl BuildingKind {
    pub const ALL: [Self; 5] = [
        Self::Markets,
        Self::Farms,
        Self::Towers,
        Self::Barracks,
        Self::Homes,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Markets => 0,
            Self::Farms => 1,
            Self::Towers => 2,
            Self::Barracks => 3,
            Self::Homes => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub gold: i64,
    pub food: i64,
    pub runes: i64,
    pub land: i64,
    pub freeland: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TroopCounts {
    pub infantry: i64,
    pub cavalry: i64,
    pub aircraft: i64,
    pub navy: i64,
    pub wizards: i64,
}

impl TroopCounts {
    #[must_use]
    pub const fn get(&self, kind: TroopKind) -> i64 {
        match kind {
            TroopKind::Infantry => self.infantry,
            TroopKind::Cavalry => self.cavalry,
            TroopKind::Aircraft => self.aircraft,
            TroopKind::Navy => self.navy,
            TroopKind::Wizards => self.wizards,
        }
    }

    pub const fn get_mut(&mut self, kind: TroopKind) -> &mut i64 {
        match kind {
            TroopKind::Infantry => &mut self.infantry,
            TroopKind::Cavalry => &mut self.cavalry,
            TroopKind::Aircraft => &mut self.aircraft,
            TroopKind::Navy => &mut self.navy,
            TroopKind::Wizards => &mut self.wizards,
        }
    }

    /// Sum of the four fighting categories.
    #[must_use]
    pub const fn military(&self) -> i64 {
        self.infantry + self.cavalry + self.aircraft + self.navy
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.military() + self.wizards
    }

    pub fn add(&mut self, other: &Self) {
        for kind in TroopKind::ALL {
            *self.get_mut(kind) += other.get(kind);
        }
    }

    pub fn subtract(&mut self, other: &Self) {
        for kind in TroopKind::ALL {
            let slot = self.get_mut(kind);
            *slot = (*slot - other.get(kind)).max(0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingCounts {
    pub markets: i64,
    pub farms: i64,
    pub towers: i64,
    pub barracks: i64,
    pub homes: i64,
    /// Deprecated; kept for save compatibility and always zero.
    #[serde(default)]
    pub labs: i64,
    /// Deprecated; kept for save compatibility and always zero.
    #[serde(default)]
    pub fortresses: i64,
}

impl BuildingCounts {
    #[must_use]
    pub const fn get(&self, kind: BuildingKind) -> i64 {
        match kind {
            BuildingKind::Markets => self.markets,
            BuildingKind::Farms => self.farms,
            BuildingKind::Towers => self.towers,
            BuildingKind::Barracks => self.barracks,
            BuildingKind::Homes => self.homes,
        }
    }

    pub const fn get_mut(&mut self, kind: BuildingKind) -> &mut i64 {
        match kind {
            BuildingKind::Markets => &mut self.markets,
            BuildingKind::Farms => &mut self.farms,
            BuildingKind::Towers => &mut self.towers,
            BuildingKind::Barracks => &mut self.barracks,
            BuildingKind::Homes => &mut self.homes,
        }
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.markets + self.farms + self.towers + self.barracks + self.homes
    }

    pub const fn clear_deprecated(&mut self) {
        self.labs = 0;
        self.fortresses = 0;
    }

    /// First category holding a negative count, if any.
    #[must_use]
    pub fn first_negative(&self) -> Option<(BuildingKind, i64)> {
        BuildingKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .find(|(_, value)| *value < 0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("industry allocation must sum to 100 (got {sum})")]
    BadSum { sum: u32 },
}

/// Industry output split across the four fighting categories, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryAllocation {
    infantry: u32,
    cavalry: u32,
    aircraft: u32,
    navy: u32,
}

impl Default for IndustryAllocation {
    fn default() -> Self {
        Self {
            infantry: 50,
            cavalry: 25,
            aircraft: 15,
            navy: 10,
        }
    }
}

impl IndustryAllocation {
    /// Build an allocation that already sums to exactly 100.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::BadSum` when the shares do not add up to 100.
    pub fn try_new(shares: [u32; 4]) -> Result<Self, AllocationError> {
        let sum = shares.iter().sum::<u32>();
        if sum != 100 {
            return Err(AllocationError::BadSum { sum });
        }
        Ok(Self::from_array(shares))
    }

    /// Renormalize arbitrary non-negative weights to integer percentages
    /// summing to exactly 100 (largest remainder, ties to the lower index).
    /// All-zero or non-finite weights fall back to an even split.
    #[must_use]
    pub fn normalized(weights: [f64; 4]) -> Self {
        let clean = weights.map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 });
        let total: f64 = clean.iter().sum();
        if total <= 0.0 {
            return Self::from_array([25, 25, 25, 25]);
        }
        let exact = clean.map(|w| w / total * 100.0);
        let mut shares = exact.map(|e| u32::try_from(floor_f64_to_i64(e)).unwrap_or(0));
        let assigned: u32 = shares.iter().sum();
        let mut order = [0usize, 1, 2, 3];
        order.sort_by(|a, b| {
            let ra = exact[*a] - exact[*a].floor();
            let rb = exact[*b] - exact[*b].floor();
            rb.total_cmp(&ra).then(a.cmp(b))
        });
        for index in order.iter().cycle().take(100_u32.saturating_sub(assigned) as usize) {
            shares[*index] += 1;
        }
        Self::from_array(shares)
    }

    const fn from_array(shares: [u32; 4]) -> Self {
        Self {
            infantry: shares[0],
            cavalry: shares[1],
            aircraft: shares[2],
            navy: shares[3],
        }
    }

    #[must_use]
    pub const fn as_array(&self) -> [u32; 4] {
        [self.infantry, self.cavalry, self.aircraft, self.navy]
    }

    #[must_use]
    pub const fn share(&self, kind: TroopKind) -> u32 {
        match kind {
            TroopKind::Infantry => self.infantry,
            TroopKind::Cavalry => self.cavalry,
            TroopKind::Aircraft => self.aircraft,
            TroopKind::Navy => self.navy,
            TroopKind::Wizards => 0,
        }
    }

    /// Re-check the sum, for values that arrived through deserialization.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::BadSum` when the shares do not add up to 100.
    pub fn validate(&self) -> Result<(), AllocationError> {
        Self::try_new(self.as_array()).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatTallies {
    pub offense_attempts: u32,
    pub offense_successes: u32,
    pub defense_attempts: u32,
    pub defense_successes: u32,
    pub kills: i64,
}

/// Counters reset at the start of each empire's round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundCounters {
    pub attacks: u32,
    pub offensive_spells: u32,
}

impl RoundCounters {
    pub const fn reset(&mut self) {
        self.attacks = 0;
        self.offensive_spells = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Empire {
    pub id: EmpireId,
    pub name: String,
    pub race: Race,
    pub era: Era,
    #[serde(default)]
    pub era_changed_round: Option<u32>,
    pub resources: Resources,
    pub buildings: BuildingCounts,
    pub troops: TroopCounts,
    #[serde(default)]
    pub industry: IndustryAllocation,
    pub peasants: i64,
    pub health: i64,
    pub tax_rate: i64,
    #[serde(default)]
    pub bank: i64,
    #[serde(default)]
    pub loan: i64,
    #[serde(default)]
    pub networth: i64,
    #[serde(default)]
    pub tallies: CombatTallies,
    #[serde(default)]
    pub round: RoundCounters,
    #[serde(default)]
    pub effects: TimedEffects,
    #[serde(default)]
    pub bonuses: Bonuses,
}

impl Empire {
    /// Fresh empire with the standard starting position.
    #[must_use]
    pub fn new(id: EmpireId, name: impl Into<String>, race: Race, era: Era) -> Self {
        let mut empire = Self {
            id,
            name: name.into(),
            race,
            era,
            era_changed_round: None,
            resources: Resources {
                gold: START_GOLD,
                food: START_FOOD,
                runes: START_RUNES,
                land: START_LAND,
                freeland: START_FREELAND,
            },
            buildings: BuildingCounts {
                markets: 40,
                farms: 60,
                towers: 30,
                barracks: 40,
                homes: 40,
                labs: 0,
                fortresses: 0,
            },
            troops: TroopCounts {
                infantry: START_INFANTRY,
                cavalry: START_CAVALRY,
                aircraft: START_AIRCRAFT,
                navy: START_NAVY,
                wizards: START_WIZARDS,
            },
            industry: IndustryAllocation::default(),
            peasants: START_PEASANTS,
            health: HEALTH_MAX,
            tax_rate: START_TAX_RATE,
            bank: 0,
            loan: 0,
            networth: 0,
            tallies: CombatTallies::default(),
            round: RoundCounters::default(),
            effects: TimedEffects::default(),
            bonuses: Bonuses::default(),
        };
        empire.recompute_networth();
        empire
    }

    #[must_use]
    pub const fn is_player(&self) -> bool {
        self.id == PLAYER_ID
    }

    #[must_use]
    pub const fn is_eliminated(&self) -> bool {
        self.health <= 0
    }

    #[must_use]
    pub const fn race_mods(&self) -> RaceModifiers {
        self.race.modifiers()
    }

    #[must_use]
    pub fn modifier(&self, kind: EffectKind) -> f64 {
        self.bonuses.modifier(kind)
    }

    #[must_use]
    pub const fn is_protected(&self, round: u32) -> bool {
        self.effects.is_protected(round)
    }

    #[must_use]
    pub const fn is_shielded(&self, round: u32) -> bool {
        self.effects.shield.is_active(round)
    }

    #[must_use]
    pub const fn has_gate(&self, round: u32) -> bool {
        self.effects.gate.is_active(round)
    }

    #[must_use]
    pub const fn land_invariant_holds(&self) -> bool {
        self.resources.land == self.buildings.total() + self.resources.freeland
    }

    /// Derived strength scalar over land, buildings, population, gold and troops.
    #[must_use]
    pub fn compute_networth(&self) -> i64 {
        let troops: i64 = TroopKind::ALL
            .iter()
            .map(|kind| self.troops.get(*kind) * NW_TROOP_WEIGHTS[kind.index()])
            .sum();
        self.resources.land * NW_PER_LAND
            + self.buildings.total() * NW_PER_BUILDING
            + self.peasants / NW_PEASANT_DIVISOR
            + self.resources.gold / NW_GOLD_DIVISOR
            + troops
    }

    pub fn recompute_networth(&mut self) -> i64 {
        self.networth = self.compute_networth();
        self.networth
    }

    /// Force every quantity back into its legal range.
    pub fn clamp_resources(&mut self) {
        let res = &mut self.resources;
        res.gold = res.gold.max(0);
        res.food = res.food.max(0);
        res.runes = res.runes.max(0);
        res.land = res.land.max(0);
        res.freeland = res.freeland.max(0);
        for kind in TroopKind::ALL {
            let slot = self.troops.get_mut(kind);
            *slot = (*slot).max(0);
        }
        for kind in BuildingKind::ALL {
            let slot = self.buildings.get_mut(kind);
            *slot = (*slot).max(0);
        }
        self.buildings.clear_deprecated();
        self.peasants = self.peasants.max(0);
        self.bank = self.bank.max(0);
        self.loan = self.loan.max(0);
        self.health = self.health.clamp(0, HEALTH_MAX);
        self.tax_rate = self.tax_rate.clamp(0, 100);
    }

    pub fn lose_health(&mut self, amount: i64) {
        self.health = (self.health - amount.max(0)).clamp(0, HEALTH_MAX);
    }

    /// Start-of-round housekeeping: lapsed effects and per-round counters.
    pub const fn begin_round(&mut self, round: u32) {
        self.effects.prune(round);
        self.round.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Empire {
        Empire::new(3, "Sample", Race::Human, Era::Present)
    }

    #[test]
    fn starting_empire_satisfies_land_invariant() {
        let empire = sample();
        assert!(empire.land_invariant_holds());
        assert!(empire.networth > 0);
        assert!(!empire.is_player());
        assert!(!empire.is_eliminated());
    }

    #[test]
    fn allocation_rejects_bad_sums() {
        assert!(IndustryAllocation::try_new([25, 25, 25, 25]).is_ok());
        assert_eq!(
            IndustryAllocation::try_new([50, 50, 10, 0]),
            Err(AllocationError::BadSum { sum: 110 })
        );
    }

    #[test]
    fn normalization_always_sums_to_one_hundred() {
        let cases = [
            [0.0, 0.0, 0.0, 0.0],
            [3.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 0.0],
            [0.333, 0.333, 0.334, 0.0],
            [f64::NAN, 2.0, -4.0, 1.0],
            [7.0, 13.0, 0.5, 1e-9],
        ];
        for weights in cases {
            let alloc = IndustryAllocation::normalized(weights);
            assert_eq!(alloc.as_array().iter().sum::<u32>(), 100, "{weights:?}");
        }
        assert_eq!(
            IndustryAllocation::normalized([0.0; 4]).as_array(),
            [25, 25, 25, 25]
        );
        assert_eq!(
            IndustryAllocation::normalized([0.0, 5.0, 0.0, 0.0]).as_array(),
            [0, 100, 0, 0]
        );
        assert_eq!(
            IndustryAllocation::normalized([1.0, 1.0, 1.0, 0.0]).as_array(),
            [34, 33, 33, 0]
        );
    }

    #[test]
    fn clamp_restores_legal_ranges() {
        let mut empire = sample();
        empire.resources.gold = -5;
        empire.troops.navy = -1;
        empire.health = 140;
        empire.buildings.labs = 9;
        empire.clamp_resources();
        assert_eq!(empire.resources.gold, 0);
        assert_eq!(empire.troops.navy, 0);
        assert_eq!(empire.health, HEALTH_MAX);
        assert_eq!(empire.buildings.labs, 0);
    }

    #[test]
    fn deprecated_buildings_deserialize_with_defaults() {
        let json = r#"{"markets":1,"farms":2,"towers":3,"barracks":4,"homes":5}"#;
        let counts: BuildingCounts = serde_json::from_str(json).unwrap();
        assert_eq!(counts.total(), 15);
        assert_eq!(counts.labs, 0);
        assert_eq!(counts.fortresses, 0);
    }

    #[test]
    fn troop_subtract_never_goes_negative() {
        let mut troops = TroopCounts {
            infantry: 10,
            ..TroopCounts::default()
        };
        troops.subtract(&TroopCounts {
            infantry: 25,
            cavalry: 3,
            ..TroopCounts::default()
        });
        assert_eq!(troops.infantry, 0);
        assert_eq!(troops.cavalry, 0);
    }

    #[test]
    fn begin_round_resets_counters() {
        let mut empire = sample();
        empire.round.attacks = 4;
        empire.round.offensive_spells = 2;
        empire.effects.shield = crate::effects::Expiry::until(1);
        empire.begin_round(2);
        assert_eq!(empire.round, RoundCounters::default());
        assert!(empire.effects.shield.round().is_none());
    }
}
