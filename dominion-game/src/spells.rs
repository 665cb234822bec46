//! Self and enemy magic.
//!
//! Self spells cannot fail once they are affordable. Enemy spells compare
//! wizard densities and succeed only above a per-spell threshold; every enemy
//! cast costs the caster health whatever the outcome.
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BLAST_TROOP_RATE, ERA_CHANGE_COOLDOWN_ROUNDS, FAILED_SPELL_WIZARD_LOSS_MAX,
    FAILED_SPELL_WIZARD_LOSS_MIN, GATE_ROUNDS, HARVEST_FOOD_PER_LAND, MIDAS_GOLD_PER_LAND,
    QUAKE_BUILDING_RATE, QUAKE_MIN_BUILDING_RATIO, SEIZE_BUILDING_RATE, SEIZE_CASTER_WIZARD_LOSS,
    SEIZE_FREELAND_RATE, SEIZE_TARGET_WIZARD_LOSS, SHIELD_ROUNDS, SPELL_COST_BONUS_CAP,
    SPELL_COST_PER_LAND, SPELL_COST_PER_TOWER, SPELL_HEALTH_COST, SPELL_TURN_COST,
    STEAL_BAND_HIGH, STEAL_BAND_LOW, STORM_FOOD_RATE, STORM_GOLD_RATE, WIZARD_DEFENSE_PREMIUM,
    WIZARD_RATIO_CAP,
};
use crate::effects::EffectKind;
use crate::empire::{
    BuildingCounts, BuildingKind, Empire, EmpireId, Resources, TroopCounts, TroopKind,
};
use crate::era::{Era, era_change_ready, eras_compatible};
use crate::numbers::{ceil_f64_to_i64, i64_to_f64, portion, round_f64_to_i64};
use crate::race::Race;
use crate::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellKind {
    Shield,
    Harvest,
    Midas,
    Gate,
    Advance,
    Regress,
    Spy,
    Blast,
    Storm,
    Steal,
    Quake,
    Seize,
}

impl SpellKind {
    pub const SELF_SPELLS: [Self; 6] = [
        Self::Shield,
        Self::Harvest,
        Self::Midas,
        Self::Gate,
        Self::Advance,
        Self::Regress,
    ];
    pub const ENEMY_SPELLS: [Self; 6] = [
        Self::Spy,
        Self::Blast,
        Self::Storm,
        Self::Steal,
        Self::Quake,
        Self::Seize,
    ];

    #[must_use]
    pub const fn is_self(self) -> bool {
        matches!(
            self,
            Self::Shield | Self::Harvest | Self::Midas | Self::Gate | Self::Advance | Self::Regress
        )
    }

    #[must_use]
    pub const fn cost_multiplier(self) -> f64 {
        match self {
            Self::Shield => 1.0,
            Self::Harvest | Self::Midas => 1.5,
            Self::Gate => 2.0,
            Self::Advance | Self::Regress => 4.0,
            Self::Spy => 0.5,
            Self::Blast => 2.5,
            Self::Storm | Self::Quake => 3.0,
            Self::Steal => 3.5,
            Self::Seize => 5.0,
        }
    }

    /// Wizard power ratio an enemy spell must exceed. Self spells have none.
    #[must_use]
    pub const fn threshold(self) -> Option<f64> {
        match self {
            Self::Spy => Some(0.05),
            Self::Blast => Some(1.2),
            Self::Storm => Some(1.3),
            Self::Steal => Some(1.5),
            Self::Quake => Some(1.8),
            Self::Seize => Some(2.5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellParams {
    pub round: u32,
    pub turns_available: i64,
    #[serde(default = "SpellParams::default_turn_cost")]
    pub turn_cost: i64,
    /// Reach any era without a gate
    #[serde(default)]
    pub cross_era: bool,
}

impl SpellParams {
    #[must_use]
    pub const fn new(round: u32, turns_available: i64) -> Self {
        Self {
            round,
            turns_available,
            turn_cost: SPELL_TURN_COST,
            cross_era: false,
        }
    }

    const fn default_turn_cost() -> i64 {
        SPELL_TURN_COST
    }

    #[must_use]
    pub const fn with_turn_cost(mut self, turn_cost: i64) -> Self {
        self.turn_cost = turn_cost;
        self
    }

    #[must_use]
    pub const fn with_cross_era(mut self, cross_era: bool) -> Self {
        self.cross_era = cross_era;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpellError {
    #[error("{0:?} cannot be cast on yourself")]
    NotASelfSpell(SpellKind),
    #[error("{0:?} needs an enemy target")]
    NotAnEnemySpell(SpellKind),
    #[error("spell costs {cost} runes but only {available} are available")]
    InsufficientRunes { cost: i64, available: i64 },
    #[error("spell needs {needed} turns but only {available} remain")]
    InsufficientTurns { needed: i64, available: i64 },
    #[error("caster {0} has been eliminated")]
    CasterEliminated(EmpireId),
    #[error("target {0} has been eliminated")]
    TargetEliminated(EmpireId),
    #[error("an empire cannot target itself")]
    SelfTarget,
    #[error("target {0} is under protection")]
    TargetProtected(EmpireId),
    #[error("cannot reach the {target:?} era from the {caster:?} era without a gate")]
    EraMismatch { caster: Era, target: Era },
    #[error("no era beyond {0:?} in that direction")]
    EraBound(Era),
    #[error("era already changed recently; ready in round {ready_round}")]
    EraCooldown { ready_round: u32 },
}

/// Immutable capture of a target's state at cast time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelSnapshot {
    pub target: EmpireId,
    pub round: u32,
    pub race: Race,
    pub era: Era,
    pub resources: Resources,
    pub buildings: BuildingCounts,
    pub troops: TroopCounts,
    pub networth: i64,
    pub health: i64,
    pub shielded: bool,
}

impl IntelSnapshot {
    #[must_use]
    pub fn capture(target: &Empire, round: u32) -> Self {
        Self {
            target: target.id,
            round,
            race: target.race,
            era: target.era,
            resources: target.resources,
            buildings: target.buildings,
            troops: target.troops,
            networth: target.networth,
            health: target.health,
            shielded: target.is_shielded(round),
        }
    }

    /// Fresh iff captured no more than `window` rounds before `current_round`.
    #[must_use]
    pub const fn is_fresh(&self, current_round: u32, window: u32) -> bool {
        current_round.saturating_sub(self.round) <= window
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpellEffect {
    None,
    Shield { until: u32 },
    Gate { until: u32 },
    Harvest { food: i64 },
    Midas { gold: i64 },
    EraShift { from: Era, to: Era },
    Intel { snapshot: IntelSnapshot },
    Storm { food: i64, gold: i64 },
    Blast { losses: TroopCounts },
    Steal { gold: i64 },
    Quake { destroyed: BuildingCounts },
    Seize { destroyed: BuildingCounts, land: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellResult {
    pub caster: EmpireId,
    pub target: Option<EmpireId>,
    pub spell: SpellKind,
    pub success: bool,
    pub cost: i64,
    pub ratio: Option<f64>,
    pub effect: SpellEffect,
    pub wizards_lost: i64,
    pub target_wizards_lost: i64,
    pub health_cost: i64,
    pub turns_spent: i64,
}

/// Rune cost of `spell` for `caster`, never below 1.
#[must_use]
pub fn spell_cost(caster: &Empire, spell: SpellKind) -> i64 {
    let base = i64_to_f64(caster.resources.land) * SPELL_COST_PER_LAND
        + i64_to_f64(caster.buildings.towers) * SPELL_COST_PER_TOWER;
    let discount = caster
        .modifier(EffectKind::SpellCost)
        .clamp(0.0, SPELL_COST_BONUS_CAP);
    let magic = caster.race_mods().magic_mult().max(0.01);
    ceil_f64_to_i64(base / magic * spell.cost_multiplier() * (1.0 - discount)).max(1)
}

fn wizard_strength(empire: &Empire) -> f64 {
    if empire.resources.land <= 0 {
        return 0.0;
    }
    i64_to_f64(empire.troops.wizards) / i64_to_f64(empire.resources.land)
        * empire.race_mods().magic_mult()
}

/// Caster-versus-target magic comparison, capped.
#[must_use]
pub fn wizard_power_ratio(caster: &Empire, target: &Empire) -> f64 {
    let attack = wizard_strength(caster);
    if attack <= 0.0 {
        return 0.0;
    }
    let defend = wizard_strength(target) * WIZARD_DEFENSE_PREMIUM;
    if defend <= 0.0 {
        return WIZARD_RATIO_CAP;
    }
    (attack / defend).min(WIZARD_RATIO_CAP)
}

/// Health an enemy cast costs `caster`.
#[must_use]
pub fn spell_health_cost(caster: &Empire) -> i64 {
    let relief = caster
        .modifier(EffectKind::SpellHealthCost)
        .clamp(0.0, 1.0);
    round_f64_to_i64(SPELL_HEALTH_COST * (1.0 - relief)).max(0)
}

fn check_affordable(
    caster: &Empire,
    spell: SpellKind,
    params: &SpellParams,
) -> Result<i64, SpellError> {
    if caster.is_eliminated() {
        return Err(SpellError::CasterEliminated(caster.id));
    }
    if params.turns_available < params.turn_cost {
        return Err(SpellError::InsufficientTurns {
            needed: params.turn_cost,
            available: params.turns_available,
        });
    }
    let cost = spell_cost(caster, spell);
    if caster.resources.runes < cost {
        return Err(SpellError::InsufficientRunes {
            cost,
            available: caster.resources.runes,
        });
    }
    Ok(cost)
}

/// Validate a self spell without mutating anything. Returns the rune cost.
///
/// # Errors
///
/// Returns `SpellError` when the spell is not a self spell, is unaffordable
/// or would move past an era bound or inside the era cooldown.
pub fn validate_self_spell(
    caster: &Empire,
    spell: SpellKind,
    params: &SpellParams,
) -> Result<i64, SpellError> {
    if !spell.is_self() {
        return Err(SpellError::NotASelfSpell(spell));
    }
    let cost = check_affordable(caster, spell, params)?;
    if matches!(spell, SpellKind::Advance | SpellKind::Regress) {
        let target = if spell == SpellKind::Advance {
            caster.era.next()
        } else {
            caster.era.previous()
        };
        if target.is_none() {
            return Err(SpellError::EraBound(caster.era));
        }
        if !era_change_ready(caster.era_changed_round, params.round) {
            let ready_round = caster
                .era_changed_round
                .map_or(params.round, |r| r + ERA_CHANGE_COOLDOWN_ROUNDS);
            return Err(SpellError::EraCooldown { ready_round });
        }
    }
    Ok(cost)
}

/// Cast a spell on the caster's own empire.
///
/// # Errors
///
/// See [`validate_self_spell`]; nothing is mutated on error.
pub fn cast_self_spell(
    caster: &mut Empire,
    spell: SpellKind,
    params: &SpellParams,
) -> Result<SpellResult, SpellError> {
    let cost = validate_self_spell(caster, spell, params)?;
    caster.resources.runes -= cost;
    let magic = caster.race_mods().magic_mult();
    let land = i64_to_f64(caster.resources.land);
    let effect = match spell {
        SpellKind::Shield => {
            let until = params.round + SHIELD_ROUNDS;
            caster.effects.shield.extend_to(until);
            SpellEffect::Shield { until }
        }
        SpellKind::Gate => {
            let until = params.round + GATE_ROUNDS;
            caster.effects.gate.extend_to(until);
            SpellEffect::Gate { until }
        }
        SpellKind::Harvest => {
            let food = round_f64_to_i64(land * HARVEST_FOOD_PER_LAND * magic);
            caster.resources.food += food;
            SpellEffect::Harvest { food }
        }
        SpellKind::Midas => {
            let gold = round_f64_to_i64(land * MIDAS_GOLD_PER_LAND * magic);
            caster.resources.gold += gold;
            SpellEffect::Midas { gold }
        }
        SpellKind::Advance | SpellKind::Regress => {
            let from = caster.era;
            let to = if spell == SpellKind::Advance {
                from.next()
            } else {
                from.previous()
            }
            .unwrap_or(from);
            caster.era = to;
            caster.era_changed_round = Some(params.round);
            SpellEffect::EraShift { from, to }
        }
        _ => SpellEffect::None,
    };
    caster.recompute_networth();
    debug!("empire {} cast {:?} for {} runes", caster.id, spell, cost);
    Ok(SpellResult {
        caster: caster.id,
        target: None,
        spell,
        success: true,
        cost,
        ratio: None,
        effect,
        wizards_lost: 0,
        target_wizards_lost: 0,
        health_cost: 0,
        turns_spent: params.turn_cost,
    })
}

/// Validate an enemy spell without mutating anything. Returns the rune cost.
///
/// # Errors
///
/// Returns `SpellError` for a self spell, an unaffordable cast, a protected
/// or eliminated target, or an unreachable era (Spy ignores eras).
pub fn validate_enemy_spell(
    caster: &Empire,
    target: &Empire,
    spell: SpellKind,
    params: &SpellParams,
) -> Result<i64, SpellError> {
    if spell.is_self() {
        return Err(SpellError::NotAnEnemySpell(spell));
    }
    if caster.id == target.id {
        return Err(SpellError::SelfTarget);
    }
    if target.is_eliminated() {
        return Err(SpellError::TargetEliminated(target.id));
    }
    if target.is_protected(params.round) {
        return Err(SpellError::TargetProtected(target.id));
    }
    let reach = params.cross_era || caster.has_gate(params.round);
    if spell != SpellKind::Spy && !eras_compatible(caster.era, target.era, reach) {
        return Err(SpellError::EraMismatch {
            caster: caster.era,
            target: target.era,
        });
    }
    check_affordable(caster, spell, params)
}

/// Cast an enemy spell. Runes, health and the turn price are paid whether
/// or not the spell lands.
///
/// # Errors
///
/// See [`validate_enemy_spell`]; nothing is mutated on error.
pub fn cast_enemy_spell(
    caster: &mut Empire,
    target: &mut Empire,
    spell: SpellKind,
    params: &SpellParams,
    rng: &mut GameRng,
) -> Result<SpellResult, SpellError> {
    let cost = validate_enemy_spell(caster, target, spell, params)?;
    caster.resources.runes -= cost;
    let health_cost = spell_health_cost(caster);
    caster.lose_health(health_cost);
    caster.round.offensive_spells += 1;

    let ratio = wizard_power_ratio(caster, target);
    let threshold = spell.threshold().unwrap_or(f64::MAX);
    let success = ratio > threshold;
    let shielded = target.is_shielded(params.round);
    target.tallies.defense_attempts += 1;

    let mut wizards_lost = 0;
    let mut target_wizards_lost = 0;
    let effect = if success {
        match spell {
            SpellKind::Spy => SpellEffect::Intel {
                snapshot: IntelSnapshot::capture(target, params.round),
            },
            SpellKind::Storm => storm(target, shielded),
            SpellKind::Blast => blast(target, shielded),
            SpellKind::Steal => steal(caster, target, shielded, rng),
            SpellKind::Quake => quake(target, shielded),
            SpellKind::Seize => {
                wizards_lost = portion(caster.troops.wizards, SEIZE_CASTER_WIZARD_LOSS);
                target_wizards_lost = portion(target.troops.wizards, SEIZE_TARGET_WIZARD_LOSS);
                caster.troops.wizards -= wizards_lost;
                target.troops.wizards -= target_wizards_lost;
                seize(caster, target, shielded)
            }
            _ => SpellEffect::None,
        }
    } else {
        let pct = rng.int_range(FAILED_SPELL_WIZARD_LOSS_MIN, FAILED_SPELL_WIZARD_LOSS_MAX);
        wizards_lost = portion(caster.troops.wizards, i64_to_f64(pct) / 100.0);
        caster.troops.wizards -= wizards_lost;
        target.tallies.defense_successes += 1;
        SpellEffect::None
    };

    caster.recompute_networth();
    target.recompute_networth();
    debug!(
        "empire {} cast {:?} on {}: ratio {:.3} vs {:.2} success={}",
        caster.id, spell, target.id, ratio, threshold, success
    );

    Ok(SpellResult {
        caster: caster.id,
        target: Some(target.id),
        spell,
        success,
        cost,
        ratio: Some(ratio),
        effect,
        wizards_lost,
        target_wizards_lost,
        health_cost,
        turns_spent: params.turn_cost,
    })
}

const fn shield_scaled(rate: f64, shielded: bool) -> f64 {
    if shielded { rate / 2.0 } else { rate }
}

fn storm(target: &mut Empire, shielded: bool) -> SpellEffect {
    let food = portion(target.resources.food, shield_scaled(STORM_FOOD_RATE, shielded));
    let gold = portion(target.resources.gold, shield_scaled(STORM_GOLD_RATE, shielded));
    target.resources.food -= food;
    target.resources.gold -= gold;
    SpellEffect::Storm { food, gold }
}

fn blast(target: &mut Empire, shielded: bool) -> SpellEffect {
    let rate = shield_scaled(BLAST_TROOP_RATE, shielded);
    let mut losses = TroopCounts::default();
    for kind in TroopKind::ALL {
        *losses.get_mut(kind) = portion(target.troops.get(kind), rate);
    }
    target.troops.subtract(&losses);
    SpellEffect::Blast { losses }
}

fn steal(
    caster: &mut Empire,
    target: &mut Empire,
    shielded: bool,
    rng: &mut GameRng,
) -> SpellEffect {
    let low = shield_scaled(STEAL_BAND_LOW, shielded);
    let high = shield_scaled(STEAL_BAND_HIGH, shielded);
    let gold = portion(target.resources.gold, rng.range(low, high));
    target.resources.gold -= gold;
    caster.resources.gold += gold;
    SpellEffect::Steal { gold }
}

fn quake(target: &mut Empire, shielded: bool) -> SpellEffect {
    let rate = shield_scaled(QUAKE_BUILDING_RATE, shielded);
    let floor = ceil_f64_to_i64(i64_to_f64(target.resources.land) * QUAKE_MIN_BUILDING_RATIO);
    let mut budget = (target.buildings.total() - floor).max(0);
    let mut destroyed = BuildingCounts::default();
    for kind in BuildingKind::ALL {
        let lost = portion(target.buildings.get(kind), rate).min(budget);
        *destroyed.get_mut(kind) = lost;
        budget -= lost;
    }
    for kind in BuildingKind::ALL {
        *target.buildings.get_mut(kind) -= destroyed.get(kind);
    }
    target.resources.freeland += destroyed.total();
    SpellEffect::Quake { destroyed }
}

fn seize(caster: &mut Empire, target: &mut Empire, shielded: bool) -> SpellEffect {
    let rate = shield_scaled(SEIZE_BUILDING_RATE, shielded);
    let mut destroyed = BuildingCounts::default();
    for kind in BuildingKind::ALL {
        let lost = portion(target.buildings.get(kind), rate);
        *destroyed.get_mut(kind) = lost;
        *target.buildings.get_mut(kind) -= lost;
    }
    let free = portion(
        target.resources.freeland,
        shield_scaled(SEIZE_FREELAND_RATE, shielded),
    );
    let land = destroyed.total() + free;
    target.resources.freeland -= free;
    target.resources.land -= land;
    caster.resources.land += land;
    caster.resources.freeland += land;
    SpellEffect::Seize { destroyed, land }
}
