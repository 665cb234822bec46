//! Attack resolution.
//!
//! Offense is the weighted sum of the attack type's committed categories,
//! defense the weighted sum of all four fighting categories. Both apply race,
//! bonus and health scaling; only offense rolls luck. Preconditions are checked
//! before any power is computed.
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    ATTACK_HEALTH_COST, ATTACK_TURN_COST, ATTACKER_FAIL_LOSS_RATE, ATTACKER_WIN_LOSS_RATE,
    BASE_LAND_SHARE, COMBAT_LUCK_HIGH, COMBAT_LUCK_LOW, DEFENDER_HOLD_LOSS_RATE, DEFENSE_WEIGHTS,
    ELIMINATION_LAND, HEALTH_MAX, MAX_LAND_SHARE, MAX_POWER_RATIO_FOR_LAND, OFFENSE_WEIGHTS,
    SHIELD_DEFENSE_FACTOR,
};
use crate::effects::EffectKind;
use crate::empire::{BuildingCounts, BuildingKind, Empire, EmpireId, TroopCounts, TroopKind};
use crate::era::{Era, eras_compatible};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, portion};
use crate::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    Standard,
    Infantry,
    Cavalry,
    Air,
    Naval,
}

impl AttackType {
    pub const ALL: [Self; 5] = [
        Self::Standard,
        Self::Infantry,
        Self::Cavalry,
        Self::Air,
        Self::Naval,
    ];

    /// Troop categories committed by this attack.
    #[must_use]
    pub fn committed(self) -> SmallVec<[TroopKind; 4]> {
        match self {
            Self::Standard => SmallVec::from_slice(&TroopKind::MILITARY),
            Self::Infantry => SmallVec::from_slice(&[TroopKind::Infantry]),
            Self::Cavalry => SmallVec::from_slice(&[TroopKind::Cavalry]),
            Self::Air => SmallVec::from_slice(&[TroopKind::Aircraft]),
            Self::Naval => SmallVec::from_slice(&[TroopKind::Navy]),
        }
    }

    /// Single-line attack using `kind`, if one exists.
    #[must_use]
    pub const fn for_line(kind: TroopKind) -> Option<Self> {
        match kind {
            TroopKind::Infantry => Some(Self::Infantry),
            TroopKind::Cavalry => Some(Self::Cavalry),
            TroopKind::Aircraft => Some(Self::Air),
            TroopKind::Navy => Some(Self::Naval),
            TroopKind::Wizards => None,
        }
    }

    /// Multiple of defense the offense must exceed.
    #[must_use]
    pub const fn threshold(self) -> f64 {
        match self {
            Self::Standard => 1.10,
            Self::Infantry => 0.90,
            Self::Cavalry => 0.95,
            Self::Air | Self::Naval => 1.00,
        }
    }

    /// Defender troop loss rate on a successful attack, before shielding.
    #[must_use]
    pub const fn defender_loss_rate(self) -> f64 {
        match self {
            Self::Standard => 0.09,
            _ => 0.07,
        }
    }

    #[must_use]
    pub const fn land_multiplier(self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Infantry => 0.7,
            Self::Cavalry => 0.8,
            Self::Air | Self::Naval => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackParams {
    pub attack_type: AttackType,
    pub round: u32,
    /// Turns the attacker can still spend this round
    pub turns_available: i64,
    #[serde(default = "AttackParams::default_turn_cost")]
    pub turn_cost: i64,
    /// Extra fractional offense for this attack only
    #[serde(default)]
    pub dynamic_bonus: f64,
    /// Reach any era without a gate; bots attack across eras innately
    #[serde(default)]
    pub cross_era: bool,
}

impl AttackParams {
    #[must_use]
    pub const fn new(attack_type: AttackType, round: u32, turns_available: i64) -> Self {
        Self {
            attack_type,
            round,
            turns_available,
            turn_cost: ATTACK_TURN_COST,
            dynamic_bonus: 0.0,
            cross_era: false,
        }
    }

    const fn default_turn_cost() -> i64 {
        ATTACK_TURN_COST
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
pub enum AttackError {
    #[error("an empire cannot attack itself")]
    SelfTarget,
    #[error("attacker {0} has been eliminated")]
    AttackerEliminated(EmpireId),
    #[error("target {0} has been eliminated")]
    DefenderEliminated(EmpireId),
    #[error("target {0} is under protection")]
    TargetProtected(EmpireId),
    #[error("cannot reach the {defender:?} era from the {attacker:?} era without a gate")]
    EraMismatch { attacker: Era, defender: Era },
    #[error("attack needs {needed} turns but only {available} remain")]
    InsufficientTurns { needed: i64, available: i64 },
    #[error("no troops committed to a {0:?} attack")]
    NoTroops(AttackType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: EmpireId,
    pub defender: EmpireId,
    pub attack_type: AttackType,
    pub won: bool,
    /// Offense before luck
    pub raw_offense: f64,
    pub offense_power: f64,
    pub defense_power: f64,
    pub threshold: f64,
    pub luck: f64,
    pub ratio: f64,
    pub land_taken: i64,
    pub buildings_taken: BuildingCounts,
    pub freeland_taken: i64,
    pub attacker_troops_before: TroopCounts,
    pub defender_troops_before: TroopCounts,
    pub attacker_losses: TroopCounts,
    pub defender_losses: TroopCounts,
    pub defender_eliminated: bool,
    pub turns_spent: i64,
}

/// Non-mutating estimate built from the same formulas, without luck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackPreview {
    pub offense_power: f64,
    pub defense_power: f64,
    pub threshold: f64,
    pub ratio: f64,
    pub expected_win: bool,
}

fn health_factor(empire: &Empire) -> f64 {
    0.5 + 0.5 * i64_to_f64(empire.health.clamp(0, HEALTH_MAX)) / i64_to_f64(HEALTH_MAX)
}

/// Offense for `attack_type` before luck.
#[must_use]
pub fn offense_power(empire: &Empire, attack_type: AttackType, dynamic_bonus: f64) -> f64 {
    let weighted: f64 = attack_type
        .committed()
        .iter()
        .map(|kind| i64_to_f64(empire.troops.get(*kind)) * OFFENSE_WEIGHTS[kind.index()])
        .sum();
    weighted
        * empire.race_mods().offense_mult()
        * (1.0 + empire.modifier(EffectKind::Offense))
        * (1.0 + dynamic_bonus)
        * health_factor(empire)
}

/// Defense against any attack landing in `round`.
#[must_use]
pub fn defense_power(empire: &Empire, round: u32) -> f64 {
    let weighted: f64 = TroopKind::MILITARY
        .iter()
        .map(|kind| i64_to_f64(empire.troops.get(*kind)) * DEFENSE_WEIGHTS[kind.index()])
        .sum();
    let shield = if empire.is_shielded(round) {
        SHIELD_DEFENSE_FACTOR
    } else {
        1.0
    };
    weighted
        * empire.race_mods().defense_mult()
        * (1.0 + empire.modifier(EffectKind::Defense))
        * health_factor(empire)
        * shield
}

fn ratio(offense: f64, defense: f64) -> f64 {
    if defense <= 0.0 {
        if offense > 0.0 { f64::MAX } else { 0.0 }
    } else {
        offense / defense
    }
}

/// Check every precondition that does not depend on power.
///
/// # Errors
///
/// Returns the first violated precondition as an `AttackError`.
pub fn validate_attack(
    attacker: &Empire,
    defender: &Empire,
    params: &AttackParams,
) -> Result<(), AttackError> {
    if attacker.id == defender.id {
        return Err(AttackError::SelfTarget);
    }
    if attacker.is_eliminated() {
        return Err(AttackError::AttackerEliminated(attacker.id));
    }
    if defender.is_eliminated() {
        return Err(AttackError::DefenderEliminated(defender.id));
    }
    if defender.is_protected(params.round) {
        return Err(AttackError::TargetProtected(defender.id));
    }
    let reach = params.cross_era || attacker.has_gate(params.round);
    if !eras_compatible(attacker.era, defender.era, reach) {
        return Err(AttackError::EraMismatch {
            attacker: attacker.era,
            defender: defender.era,
        });
    }
    if params.turns_available < params.turn_cost {
        return Err(AttackError::InsufficientTurns {
            needed: params.turn_cost,
            available: params.turns_available,
        });
    }
    let committed: i64 = params
        .attack_type
        .committed()
        .iter()
        .map(|kind| attacker.troops.get(*kind))
        .sum();
    if committed <= 0 {
        return Err(AttackError::NoTroops(params.attack_type));
    }
    Ok(())
}

/// Estimate an attack without touching either empire or the RNG.
///
/// # Errors
///
/// Returns `AttackError` when the attack would be rejected.
pub fn preview_attack(
    attacker: &Empire,
    defender: &Empire,
    params: &AttackParams,
) -> Result<AttackPreview, AttackError> {
    validate_attack(attacker, defender, params)?;
    Ok(estimate(attacker, defender, params))
}

/// Raw power comparison without validation; used for decision support.
#[must_use]
pub fn estimate(attacker: &Empire, defender: &Empire, params: &AttackParams) -> AttackPreview {
    let offense = offense_power(attacker, params.attack_type, params.dynamic_bonus);
    let defense = defense_power(defender, params.round);
    let threshold = params.attack_type.threshold();
    AttackPreview {
        offense_power: offense,
        defense_power: defense,
        threshold,
        ratio: ratio(offense, defense),
        expected_win: offense > defense * threshold,
    }
}

/// Resolve one attack. The caller pays the returned `turns_spent` through the
/// economy resolver.
///
/// # Errors
///
/// Returns `AttackError` when a precondition fails; nothing is mutated then.
pub fn resolve_attack(
    attacker: &mut Empire,
    defender: &mut Empire,
    params: &AttackParams,
    rng: &mut GameRng,
) -> Result<CombatResult, AttackError> {
    validate_attack(attacker, defender, params)?;

    let attack_type = params.attack_type;
    let raw_offense = offense_power(attacker, attack_type, params.dynamic_bonus);
    let defense = defense_power(defender, params.round);
    let luck = rng.range(COMBAT_LUCK_LOW, COMBAT_LUCK_HIGH);
    let offense = raw_offense * luck;
    let threshold = attack_type.threshold();
    let won = offense > defense * threshold;
    let power_ratio = ratio(offense, defense);
    let shielded = defender.is_shielded(params.round);

    let attacker_troops_before = attacker.troops;
    let defender_troops_before = defender.troops;

    let attacker_rate = if won {
        ATTACKER_WIN_LOSS_RATE
    } else {
        ATTACKER_FAIL_LOSS_RATE
    };
    let mut attacker_losses = TroopCounts::default();
    for kind in attack_type.committed() {
        *attacker_losses.get_mut(kind) = portion(attacker.troops.get(kind), attacker_rate);
    }

    let defender_rate = if won {
        let rate = attack_type.defender_loss_rate();
        if shielded { rate / 2.0 } else { rate }
    } else {
        DEFENDER_HOLD_LOSS_RATE
    };
    let mut defender_losses = TroopCounts::default();
    for kind in TroopKind::MILITARY {
        *defender_losses.get_mut(kind) = portion(defender.troops.get(kind), defender_rate);
    }

    attacker.troops.subtract(&attacker_losses);
    defender.troops.subtract(&defender_losses);

    let mut land_taken = 0;
    let mut buildings_taken = BuildingCounts::default();
    let mut freeland_taken = 0;
    if won {
        let share = (BASE_LAND_SHARE
            * power_ratio.min(MAX_POWER_RATIO_FOR_LAND)
            * attack_type.land_multiplier())
        .min(MAX_LAND_SHARE);
        land_taken = floor_f64_to_i64(i64_to_f64(defender.resources.land) * share)
            .max(1)
            .min(defender.resources.land);
        (buildings_taken, freeland_taken) = split_land(defender, land_taken);
        land_taken = transfer_land(defender, attacker, &buildings_taken, freeland_taken);
        attacker.round.attacks += 1;
        attacker.tallies.offense_successes += 1;
    } else {
        defender.tallies.defense_successes += 1;
    }
    attacker.tallies.offense_attempts += 1;
    defender.tallies.defense_attempts += 1;
    attacker.tallies.kills += defender_losses.total();
    defender.tallies.kills += attacker_losses.total();
    attacker.lose_health(ATTACK_HEALTH_COST);

    let defender_eliminated =
        won && !defender.is_eliminated() && defender.resources.land < ELIMINATION_LAND;
    if defender_eliminated {
        defender.health = 0;
    }

    attacker.recompute_networth();
    defender.recompute_networth();

    debug!(
        "attack {:?} {} -> {}: offense {:.1} vs defense {:.1} (x{:.2}) won={} land={}",
        attack_type,
        attacker.id,
        defender.id,
        offense,
        defense,
        threshold,
        won,
        land_taken
    );

    Ok(CombatResult {
        attacker: attacker.id,
        defender: defender.id,
        attack_type,
        won,
        raw_offense,
        offense_power: offense,
        defense_power: defense,
        threshold,
        luck,
        ratio: power_ratio,
        land_taken,
        buildings_taken,
        freeland_taken,
        attacker_troops_before,
        defender_troops_before,
        attacker_losses,
        defender_losses,
        defender_eliminated,
        turns_spent: params.turn_cost,
    })
}

/// Split `acres` of the defender's land into buildings (proportionally) and
/// freeland. The parts sum to `acres` whenever the land invariant holds.
fn split_land(defender: &Empire, acres: i64) -> (BuildingCounts, i64) {
    debug_assert!(
        defender.land_invariant_holds(),
        "empire {} land {} != buildings {} + freeland {}",
        defender.id,
        defender.resources.land,
        defender.buildings.total(),
        defender.resources.freeland
    );
    let land = defender.resources.land.max(1);
    let mut taken = BuildingCounts::default();
    for kind in BuildingKind::ALL {
        let owned = defender.buildings.get(kind);
        *taken.get_mut(kind) = (owned * acres / land).min(owned);
    }
    let mut remaining = acres - taken.total();
    let from_free = remaining.min(defender.resources.freeland).max(0);
    remaining -= from_free;
    for kind in BuildingKind::ALL {
        if remaining <= 0 {
            break;
        }
        let spare = defender.buildings.get(kind) - taken.get(kind);
        let extra = spare.min(remaining).max(0);
        *taken.get_mut(kind) += extra;
        remaining -= extra;
    }
    (taken, from_free)
}

/// Move the split acres and return how many actually changed hands.
fn transfer_land(
    from: &mut Empire,
    to: &mut Empire,
    buildings: &BuildingCounts,
    freeland: i64,
) -> i64 {
    let acres = buildings.total() + freeland;
    for kind in BuildingKind::ALL {
        let moved = buildings.get(kind);
        *from.buildings.get_mut(kind) -= moved;
        *to.buildings.get_mut(kind) += moved;
    }
    from.resources.freeland -= freeland;
    to.resources.freeland += freeland;
    from.resources.land -= acres;
    to.resources.land += acres;
    acres
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Expiry;
    use crate::race::Race;

    fn bare(id: EmpireId) -> Empire {
        let mut empire = Empire::new(id, format!("E{id}"), Race::Human, Era::Present);
        empire.troops = TroopCounts::default();
        empire
    }

    fn params(attack_type: AttackType) -> AttackParams {
        AttackParams::new(attack_type, 1, 10)
    }

    #[test]
    fn reference_scenario_standard_attack_wins() {
        let mut attacker = bare(1);
        attacker.troops.infantry = 1_000;
        let mut defender = bare(2);
        defender.troops.infantry = 400;
        let mut rng = GameRng::create(1);
        let land_a = attacker.resources.land;
        let land_d = defender.resources.land;

        let result =
            resolve_attack(&mut attacker, &mut defender, &params(AttackType::Standard), &mut rng)
                .unwrap();
        assert!((result.raw_offense - 1_000.0).abs() < 1e-9);
        assert!((result.defense_power - 800.0).abs() < 1e-9);
        assert!(result.won);
        assert!(result.land_taken > 0);
        assert_eq!(land_d - defender.resources.land, result.land_taken);
        assert_eq!(attacker.resources.land - land_a, result.land_taken);
        assert!(attacker.land_invariant_holds());
        assert!(defender.land_invariant_holds());
        assert_eq!(attacker.round.attacks, 1);
        assert_eq!(attacker.health, HEALTH_MAX - ATTACK_HEALTH_COST);
    }

    #[test]
    fn troops_are_conserved_for_every_attack_type() {
        for attack_type in AttackType::ALL {
            for seed in 1..20_u64 {
                let mut attacker = Empire::new(1, "A", Race::Troll, Era::Present);
                let mut defender = Empire::new(2, "D", Race::Dwarf, Era::Present);
                let mut rng = GameRng::create(seed);
                let result =
                    resolve_attack(&mut attacker, &mut defender, &params(attack_type), &mut rng)
                        .unwrap();
                for kind in TroopKind::ALL {
                    assert_eq!(
                        result.attacker_troops_before.get(kind),
                        attacker.troops.get(kind) + result.attacker_losses.get(kind)
                    );
                    assert_eq!(
                        result.defender_troops_before.get(kind),
                        defender.troops.get(kind) + result.defender_losses.get(kind)
                    );
                }
            }
        }
    }

    #[test]
    fn protected_targets_are_rejected_before_any_draw() {
        let mut attacker = bare(1);
        attacker.troops.navy = 1_000_000;
        let mut defender = bare(2);
        defender.effects.pacification = Expiry::until(3);
        let mut rng = GameRng::create(5);
        let before = (attacker.clone(), defender.clone());
        let outcome =
            resolve_attack(&mut attacker, &mut defender, &params(AttackType::Naval), &mut rng);
        assert_eq!(outcome, Err(AttackError::TargetProtected(2)));
        assert_eq!((attacker, defender), before);
        assert_eq!(rng, GameRng::create(5));
    }

    #[test]
    fn other_preconditions_reject() {
        let attacker = bare(1);
        let mut defender = bare(2);
        assert_eq!(
            validate_attack(&attacker, &attacker, &params(AttackType::Standard)),
            Err(AttackError::SelfTarget)
        );
        assert_eq!(
            validate_attack(&attacker, &defender, &params(AttackType::Standard)),
            Err(AttackError::NoTroops(AttackType::Standard))
        );
        defender.era = Era::Future;
        let mut armed = bare(1);
        armed.troops.infantry = 10;
        assert!(matches!(
            validate_attack(&armed, &defender, &params(AttackType::Standard)),
            Err(AttackError::EraMismatch { .. })
        ));
        let innate = params(AttackType::Standard).with_cross_era(true);
        assert!(validate_attack(&armed, &defender, &innate).is_ok());
        armed.effects.gate = Expiry::until(1);
        assert!(validate_attack(&armed, &defender, &params(AttackType::Standard)).is_ok());
        let short = AttackParams::new(AttackType::Standard, 1, 1);
        assert_eq!(
            validate_attack(&armed, &defender, &short),
            Err(AttackError::InsufficientTurns {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn failed_attack_costs_attacker_more() {
        let mut attacker = bare(1);
        attacker.troops.infantry = 101;
        let mut defender = bare(2);
        defender.troops.infantry = 1_010;
        let mut rng = GameRng::create(3);
        let result =
            resolve_attack(&mut attacker, &mut defender, &params(AttackType::Infantry), &mut rng)
                .unwrap();
        assert!(!result.won);
        assert_eq!(result.attacker_losses.infantry, 10);
        assert_eq!(result.defender_losses.infantry, 30);
        assert_eq!(result.land_taken, 0);
        assert_eq!(defender.tallies.defense_successes, 1);
        assert_eq!(attacker.round.attacks, 0);
    }

    #[test]
    fn shield_halves_defender_losses() {
        let run = |shielded: bool| {
            let mut attacker = bare(1);
            attacker.troops.infantry = 50_000;
            let mut defender = bare(2);
            defender.troops.infantry = 1_010;
            if shielded {
                defender.effects.shield = Expiry::until(1);
            }
            let mut rng = GameRng::create(8);
            resolve_attack(&mut attacker, &mut defender, &params(AttackType::Standard), &mut rng)
                .unwrap()
        };
        let open = run(false);
        let guarded = run(true);
        assert!(open.won && guarded.won);
        assert_eq!(open.defender_losses.infantry, 90);
        assert_eq!(guarded.defender_losses.infantry, 45);
    }

    #[test]
    fn land_transfer_reports_the_acres_it_moves() {
        let mut defender = bare(2);
        defender.resources.freeland = 3;
        defender.buildings = BuildingCounts {
            markets: 7,
            farms: 11,
            towers: 2,
            barracks: 5,
            homes: 12,
            ..BuildingCounts::default()
        };
        defender.resources.land = defender.buildings.total() + 3;
        for acres in 1..=defender.resources.land {
            let mut from = defender.clone();
            let mut to = bare(1);
            let land_to = to.resources.land;
            let (buildings, freeland) = split_land(&from, acres);
            assert_eq!(buildings.total() + freeland, acres);
            assert_eq!(transfer_land(&mut from, &mut to, &buildings, freeland), acres);
            assert_eq!(from.resources.land, defender.resources.land - acres);
            assert_eq!(to.resources.land, land_to + acres);
            assert!(from.land_invariant_holds() && to.land_invariant_holds());
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "land")]
    fn split_refuses_an_inconsistent_defender() {
        let mut defender = bare(2);
        defender.resources.land += 40;
        let _ = split_land(&defender, 20);
    }

    #[test]
    fn tiny_defender_is_eliminated() {
        let mut attacker = bare(1);
        attacker.troops.infantry = 100_000;
        let mut defender = bare(2);
        defender.resources.land = 10;
        defender.resources.freeland = 10;
        defender.buildings = BuildingCounts::default();
        let mut rng = GameRng::create(2);
        let result =
            resolve_attack(&mut attacker, &mut defender, &params(AttackType::Standard), &mut rng)
                .unwrap();
        assert!(result.won);
        assert!(result.defender_eliminated);
        assert!(defender.is_eliminated());
    }

    #[test]
    fn preview_matches_formulas_without_mutation() {
        let mut attacker = bare(1);
        attacker.troops.cavalry = 300;
        let mut defender = bare(2);
        defender.troops.infantry = 100;
        let preview =
            preview_attack(&attacker, &defender, &params(AttackType::Cavalry)).unwrap();
        assert!((preview.offense_power - 600.0).abs() < 1e-9);
        assert!((preview.defense_power - 200.0).abs() < 1e-9);
        assert!(preview.expected_win);
        defender.effects.divine_protection = Expiry::until(1);
        attacker.troops.cavalry = 0;
        assert_eq!(
            preview_attack(&attacker, &defender, &params(AttackType::Cavalry)),
            Err(AttackError::TargetProtected(2))
        );
    }
}
