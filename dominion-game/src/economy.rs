//! Per-turn economy resolver.
//!
//! Every turn runs the same fixed sequence: food, income and expenses, the
//! action yield, banking, then clamping and population. Turns are processed
//! one at a time so an emergency stop keeps all progress made before it.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BANK_INTEREST_RATE, BANK_SAVINGS_PER_LAND, BUILD_COST_BASE, BUILD_COST_PER_LAND,
    BUILD_LAND_DIVISOR, BUILD_MIN_PER_TURN, BUILDING_MAINTENANCE, CASH_ACTION_BONUS,
    DESERTION_RATE, EXPLORE_BASE_LAND, EXPLORE_JITTER_HIGH, EXPLORE_JITTER_LOW,
    FARM_ACTION_BONUS, FOOD_PER_FARM, FOOD_PER_FREELAND, FOOD_PER_PEASANT, FOOD_PER_TROOP,
    GOLD_PER_MARKET, HEALTH_MAX, HEALTH_REGEN_PER_TURN, INDUSTRY_POINTS_LAND_DIVISOR,
    INDUSTRY_POINTS_PER_BARRACKS, INDUSTRY_UNIT_COST, LOAN_CAPACITY_TURNS,
    LOAN_EMERGENCY_MULTIPLE, LOAN_INTEREST_RATE, LOAN_PAYMENT_RATE, MASTERY_BONUS_PER_LEVEL,
    MEDITATE_RUNES_LAND_DIVISOR, MEDITATE_RUNES_PER_TOWER, PEASANT_GROWTH_RATE,
    PEASANTS_PER_HOME, PEASANTS_PER_LAND, RUNES_PER_TOWER_BASE, SIZE_BONUS_MIN,
    SIZE_BONUS_SCALE, STARVATION_PEASANT_LOSS, TAX_GOLD_PER_PEASANT, TROOP_GOLD_UPKEEP,
};
use crate::effects::EffectKind;
use crate::empire::{
    AllocationError, BuildingCounts, BuildingKind, Empire, IndustryAllocation, TroopCounts,
    TroopKind,
};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, portion, round_f64_to_i64};
use crate::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Explore,
    Farm,
    Cash,
    Meditate,
    Industry,
    Build,
}

impl ActionKind {
    pub const ALL: [Self; 6] = [
        Self::Explore,
        Self::Farm,
        Self::Cash,
        Self::Meditate,
        Self::Industry,
        Self::Build,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Farm => "farm",
            Self::Cash => "cash",
            Self::Meditate => "meditate",
            Self::Industry => "industry",
            Self::Build => "build",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Food,
    Loan,
}

/// Optional settings applied before the first turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnParams {
    #[serde(default)]
    pub industry: Option<IndustryAllocation>,
    #[serde(default)]
    pub tax_rate: Option<i64>,
    /// Construction queue for `Build`
    #[serde(default)]
    pub buildings: Option<BuildingCounts>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconomyError {
    #[error("tax rate must be between 0 and 100 (got {0})")]
    InvalidTaxRate(i64),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("build order for {kind:?} is negative ({value})")]
    NegativeBuildCount { kind: BuildingKind, value: i64 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomyResult {
    /// `None` for upkeep-only turns paid by attacks and spells
    pub action: Option<ActionKind>,
    pub turns_requested: i64,
    pub turns_spent: i64,
    pub turns_remaining: i64,
    pub income: i64,
    pub expenses: i64,
    pub food_produced: i64,
    pub food_consumed: i64,
    pub land_gained: i64,
    pub runes_gained: i64,
    pub troops_produced: TroopCounts,
    pub buildings_constructed: BuildingCounts,
    pub interest_earned: i64,
    pub loan_paid: i64,
    pub deserted_troops: TroopCounts,
    pub deserted_peasants: i64,
    pub stopped_early: Option<StopReason>,
}

impl EconomyResult {
    fn new(action: Option<ActionKind>, turns: i64) -> Self {
        Self {
            action,
            turns_requested: turns.max(0),
            turns_remaining: turns.max(0),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn net_income(&self) -> i64 {
        self.income - self.expenses
    }
}

/// Advance `empire` by up to `turns` turns of `action`.
///
/// # Errors
///
/// Returns `EconomyError` for an out-of-range tax rate, an allocation not
/// summing to 100 or a negative build order. Nothing is mutated in that case.
pub fn run_turns(
    empire: &mut Empire,
    action: ActionKind,
    turns: i64,
    params: &TurnParams,
    rng: &mut GameRng,
) -> Result<EconomyResult, EconomyError> {
    validate_params(params)?;
    let mut result = EconomyResult::new(Some(action), turns);
    if turns <= 0 {
        return Ok(result);
    }
    if let Some(rate) = params.tax_rate {
        empire.tax_rate = rate;
    }
    if let Some(allocation) = params.industry {
        empire.industry = allocation;
    }
    let mut queue = params.buildings.unwrap_or_default();
    queue.clear_deprecated();
    process_turns(empire, Some(action), turns, &mut queue, rng, &mut result);
    Ok(result)
}

/// Turns that pay food, upkeep and interest without any action yield.
/// Attacks and spells spend their turn price through this. No draws are made.
pub fn run_upkeep_turns(empire: &mut Empire, turns: i64, rng: &mut GameRng) -> EconomyResult {
    let mut result = EconomyResult::new(None, turns);
    if turns > 0 {
        let mut queue = BuildingCounts::default();
        process_turns(empire, None, turns, &mut queue, rng, &mut result);
    }
    result
}

fn validate_params(params: &TurnParams) -> Result<(), EconomyError> {
    if let Some(rate) = params.tax_rate
        && !(0..=100).contains(&rate)
    {
        return Err(EconomyError::InvalidTaxRate(rate));
    }
    if let Some(allocation) = &params.industry {
        allocation.validate()?;
    }
    if let Some(buildings) = &params.buildings
        && let Some((kind, value)) = buildings.first_negative()
    {
        return Err(EconomyError::NegativeBuildCount { kind, value });
    }
    Ok(())
}

fn process_turns(
    empire: &mut Empire,
    action: Option<ActionKind>,
    turns: i64,
    queue: &mut BuildingCounts,
    rng: &mut GameRng,
    result: &mut EconomyResult,
) {
    for _ in 0..turns {
        if action == Some(ActionKind::Build) && !can_build_any(empire, queue) {
            debug!("build queue exhausted after {} turns", result.turns_spent);
            break;
        }
        if loan_overdrawn(empire) {
            warn!(
                "empire {} halted: loan {} above emergency capacity",
                empire.id, empire.loan
            );
            result.stopped_early = Some(StopReason::Loan);
            break;
        }

        // 1. food
        let produced = round_f64_to_i64(food_production(empire));
        let consumed = round_f64_to_i64(food_consumption(empire));
        if empire.resources.food + produced - consumed < 0 {
            desert(empire, result);
            warn!(
                "empire {} halted: food shortfall, {} troops and {} peasants deserted",
                empire.id,
                result.deserted_troops.total(),
                result.deserted_peasants
            );
            result.stopped_early = Some(StopReason::Food);
            break;
        }
        empire.resources.food += produced - consumed;
        result.food_produced += produced;
        result.food_consumed += consumed;

        // 2. income and expenses
        let gross = gross_income(empire);
        let income = round_f64_to_i64(gross);
        let spent = round_f64_to_i64(expenses(empire));
        let trickle = round_f64_to_i64(rune_trickle(empire));
        empire.resources.gold += income - spent;
        empire.resources.runes += trickle;
        result.income += income;
        result.expenses += spent;
        result.runes_gained += trickle;

        // 3. action yield
        if let Some(kind) = action {
            apply_yield(empire, kind, gross, produced, queue, rng, result);
        }

        // 4. bank
        let interest = savings_interest(empire);
        empire.bank += interest;
        result.interest_earned += interest;
        let payment = loan_payment(empire).min(empire.resources.gold.max(0));
        empire.resources.gold -= payment;
        empire.loan -= payment;
        result.loan_paid += payment;

        // 5. clamp and population
        empire.clamp_resources();
        settle_population(empire, consumed);
        result.turns_spent += 1;
    }
    result.turns_remaining = result.turns_requested - result.turns_spent;
    empire.recompute_networth();
    debug!(
        "empire {} {:?}: {}/{} turns, net gold {}, stop {:?}",
        empire.id,
        action,
        result.turns_spent,
        result.turns_requested,
        result.net_income(),
        result.stopped_early
    );
}

fn apply_yield(
    empire: &mut Empire,
    action: ActionKind,
    gross: f64,
    produced: i64,
    queue: &mut BuildingCounts,
    rng: &mut GameRng,
    result: &mut EconomyResult,
) {
    let scale = size_bonus(empire.networth) * mastery_factor(empire, action);
    match action {
        ActionKind::Explore => {
            let jitter = rng.range(EXPLORE_JITTER_LOW, EXPLORE_JITTER_HIGH);
            let explore = empire.race_mods().explore_mult()
                * (1.0 + empire.modifier(EffectKind::ExploreYield));
            let land = floor_f64_to_i64(EXPLORE_BASE_LAND * scale * explore * jitter).max(1);
            empire.resources.land += land;
            empire.resources.freeland += land;
            result.land_gained += land;
        }
        ActionKind::Farm => {
            let bonus = round_f64_to_i64(i64_to_f64(produced) * FARM_ACTION_BONUS * scale);
            empire.resources.food += bonus;
            result.food_produced += bonus;
        }
        ActionKind::Cash => {
            let bonus = round_f64_to_i64(gross * CASH_ACTION_BONUS * scale);
            empire.resources.gold += bonus;
            result.income += bonus;
        }
        ActionKind::Meditate => {
            let base = i64_to_f64(empire.buildings.towers) * MEDITATE_RUNES_PER_TOWER
                + i64_to_f64(empire.resources.land) / MEDITATE_RUNES_LAND_DIVISOR;
            let runes = round_f64_to_i64(base * rune_multiplier(empire) * scale);
            empire.resources.runes += runes;
            result.runes_gained += runes;
        }
        ActionKind::Industry => {
            let points = industry_points(empire) * scale;
            for (kind, unit_cost) in TroopKind::MILITARY.into_iter().zip(INDUSTRY_UNIT_COST) {
                let share = f64::from(empire.industry.share(kind)) / 100.0;
                let units = floor_f64_to_i64(points * share / unit_cost);
                *empire.troops.get_mut(kind) += units;
                *result.troops_produced.get_mut(kind) += units;
            }
        }
        ActionKind::Build => build_from_queue(empire, queue, result),
    }
}

fn build_from_queue(empire: &mut Empire, queue: &mut BuildingCounts, result: &mut EconomyResult) {
    let cost = build_cost(empire);
    let mut capacity = build_rate(empire);
    for kind in BuildingKind::ALL {
        if capacity == 0 {
            break;
        }
        let affordable = if cost > 0 {
            empire.resources.gold.max(0) / cost
        } else {
            i64::MAX
        };
        let count = queue
            .get(kind)
            .min(capacity)
            .min(empire.resources.freeland)
            .min(affordable)
            .max(0);
        if count == 0 {
            continue;
        }
        *queue.get_mut(kind) -= count;
        *empire.buildings.get_mut(kind) += count;
        *result.buildings_constructed.get_mut(kind) += count;
        empire.resources.freeland -= count;
        empire.resources.gold -= count * cost;
        result.expenses += count * cost;
        capacity -= count;
    }
}

fn can_build_any(empire: &Empire, queue: &BuildingCounts) -> bool {
    queue.total() > 0
        && empire.resources.freeland > 0
        && empire.resources.gold >= build_cost(empire)
}

fn desert(empire: &mut Empire, result: &mut EconomyResult) {
    for kind in TroopKind::ALL {
        let lost = portion(empire.troops.get(kind), DESERTION_RATE);
        *empire.troops.get_mut(kind) -= lost;
        *result.deserted_troops.get_mut(kind) += lost;
    }
    let peasants = portion(empire.peasants, DESERTION_RATE);
    empire.peasants -= peasants;
    result.deserted_peasants += peasants;
    empire.recompute_networth();
}

fn settle_population(empire: &mut Empire, consumed: i64) {
    if empire.resources.food < consumed {
        empire.peasants -= portion(empire.peasants, STARVATION_PEASANT_LOSS);
        return;
    }
    let gap = peasant_capacity(empire) - empire.peasants;
    if gap > 0 {
        let tax_drag = 1.0 - i64_to_f64(empire.tax_rate) / 200.0;
        let growth = PEASANT_GROWTH_RATE
            * tax_drag
            * (1.0 + empire.modifier(EffectKind::PopulationGrowth));
        empire.peasants += portion(gap, growth);
    } else {
        empire.peasants -= portion(-gap, PEASANT_GROWTH_RATE);
    }
    empire.health = (empire.health + HEALTH_REGEN_PER_TURN).min(HEALTH_MAX);
}

/// Diminishing returns on action yields as an empire grows.
#[must_use]
pub fn size_bonus(networth: i64) -> f64 {
    let nw = i64_to_f64(networth.max(0));
    (1.0 / (1.0 + (nw / SIZE_BONUS_SCALE).sqrt())).clamp(SIZE_BONUS_MIN, 1.0)
}

#[must_use]
pub fn mastery_factor(empire: &Empire, action: ActionKind) -> f64 {
    1.0 + f64::from(empire.bonuses.mastery_level(action)) * MASTERY_BONUS_PER_LEVEL
}

#[must_use]
pub fn food_production(empire: &Empire) -> f64 {
    let base = i64_to_f64(empire.buildings.farms) * FOOD_PER_FARM
        + i64_to_f64(empire.resources.freeland) * FOOD_PER_FREELAND;
    base * empire.race_mods().food_mult() * (1.0 + empire.modifier(EffectKind::FoodProduction))
}

#[must_use]
pub fn food_consumption(empire: &Empire) -> f64 {
    i64_to_f64(empire.peasants) * FOOD_PER_PEASANT
        + i64_to_f64(empire.troops.total()) * FOOD_PER_TROOP
}

/// Signed food balance of one turn at the current state.
#[must_use]
pub fn net_food(empire: &Empire) -> i64 {
    round_f64_to_i64(food_production(empire)) - round_f64_to_i64(food_consumption(empire))
}

fn income_multiplier(empire: &Empire) -> f64 {
    empire.race_mods().production_mult() * (1.0 + empire.modifier(EffectKind::Income))
}

fn rune_multiplier(empire: &Empire) -> f64 {
    empire.race_mods().magic_mult() * (1.0 + empire.modifier(EffectKind::RuneProduction))
}

/// Tax and market revenue for one turn before expenses.
#[must_use]
pub fn gross_income(empire: &Empire) -> f64 {
    let tax = i64_to_f64(empire.peasants) * i64_to_f64(empire.tax_rate) / 100.0
        * TAX_GOLD_PER_PEASANT;
    let markets = i64_to_f64(empire.buildings.markets) * GOLD_PER_MARKET;
    (tax + markets) * income_multiplier(empire)
}

#[must_use]
pub fn rune_trickle(empire: &Empire) -> f64 {
    i64_to_f64(empire.buildings.towers) * RUNES_PER_TOWER_BASE * rune_multiplier(empire)
}

/// Gold upkeep of one unit of `kind`.
#[must_use]
pub fn unit_upkeep(empire: &Empire, kind: TroopKind) -> f64 {
    let discount = empire.modifier(EffectKind::TroopUpkeep).clamp(0.0, 0.75);
    TROOP_GOLD_UPKEEP[kind.index()] * (1.0 - discount)
}

#[must_use]
pub fn troop_upkeep(empire: &Empire) -> f64 {
    TroopKind::ALL
        .into_iter()
        .map(|kind| i64_to_f64(empire.troops.get(kind)) * unit_upkeep(empire, kind))
        .sum()
}

#[must_use]
pub fn expenses(empire: &Empire) -> f64 {
    troop_upkeep(empire)
        + i64_to_f64(empire.buildings.total()) * BUILDING_MAINTENANCE
        + i64_to_f64(empire.loan) * LOAN_INTEREST_RATE
}

/// Signed gold balance of one turn at the current state.
#[must_use]
pub fn net_income(empire: &Empire) -> i64 {
    round_f64_to_i64(gross_income(empire)) - round_f64_to_i64(expenses(empire))
}

#[must_use]
pub fn industry_points(empire: &Empire) -> f64 {
    let base = i64_to_f64(empire.buildings.barracks) * INDUSTRY_POINTS_PER_BARRACKS
        + i64_to_f64(empire.resources.land) / INDUSTRY_POINTS_LAND_DIVISOR;
    base * empire.race_mods().industry_mult() * (1.0 + empire.modifier(EffectKind::IndustryOutput))
}

/// Gold price of one building.
#[must_use]
pub fn build_cost(empire: &Empire) -> i64 {
    let discount = empire.modifier(EffectKind::BuildCost).clamp(0.0, 0.75);
    let base = BUILD_COST_BASE + i64_to_f64(empire.resources.land) * BUILD_COST_PER_LAND;
    round_f64_to_i64(base * (1.0 - discount)).max(1)
}

/// Buildings that can be raised in one turn.
#[must_use]
pub fn build_rate(empire: &Empire) -> i64 {
    (empire.resources.land / BUILD_LAND_DIVISOR).max(BUILD_MIN_PER_TURN)
}

#[must_use]
pub fn peasant_capacity(empire: &Empire) -> i64 {
    empire.resources.land * PEASANTS_PER_LAND + empire.buildings.homes * PEASANTS_PER_HOME
}

/// Sustainable loan ceiling derived from the current gross income.
#[must_use]
pub fn loan_capacity(empire: &Empire) -> i64 {
    round_f64_to_i64(gross_income(empire).max(1.0) * LOAN_CAPACITY_TURNS)
}

fn loan_overdrawn(empire: &Empire) -> bool {
    i64_to_f64(empire.loan) > i64_to_f64(loan_capacity(empire)) * LOAN_EMERGENCY_MULTIPLE
}

fn savings_interest(empire: &Empire) -> i64 {
    let capped = empire.bank.min(empire.resources.land * BANK_SAVINGS_PER_LAND);
    let rate = BANK_INTEREST_RATE * (1.0 + empire.modifier(EffectKind::BankInterest));
    floor_f64_to_i64(i64_to_f64(capped.max(0)) * rate)
}

fn loan_payment(empire: &Empire) -> i64 {
    if empire.loan <= 0 {
        return 0;
    }
    portion(empire.loan, LOAN_PAYMENT_RATE).max(1).min(empire.loan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::era::Era;
    use crate::race::Race;

    fn empire() -> Empire {
        Empire::new(1, "Econ", Race::Human, Era::Present)
    }

    #[test]
    fn non_positive_turns_are_a_no_op() {
        let mut e = empire();
        let before = e.clone();
        let mut rng = GameRng::create(1);
        let result = run_turns(&mut e, ActionKind::Cash, 0, &TurnParams::default(), &mut rng)
            .unwrap();
        assert_eq!(result.turns_spent, 0);
        assert_eq!(e, before);
        assert_eq!(rng, GameRng::create(1));
    }

    #[test]
    fn invalid_params_reject_before_mutation() {
        let mut e = empire();
        let before = e.clone();
        let mut rng = GameRng::create(1);
        let bad_tax = TurnParams {
            tax_rate: Some(140),
            ..TurnParams::default()
        };
        assert_eq!(
            run_turns(&mut e, ActionKind::Farm, 3, &bad_tax, &mut rng),
            Err(EconomyError::InvalidTaxRate(140))
        );
        let bad_build = TurnParams {
            buildings: Some(BuildingCounts {
                farms: -2,
                ..BuildingCounts::default()
            }),
            ..TurnParams::default()
        };
        assert!(matches!(
            run_turns(&mut e, ActionKind::Build, 3, &bad_build, &mut rng),
            Err(EconomyError::NegativeBuildCount { .. })
        ));
        assert_eq!(e, before);
    }

    #[test]
    fn explore_adds_land_and_freeland_together() {
        let mut e = empire();
        let mut rng = GameRng::create(9);
        let result =
            run_turns(&mut e, ActionKind::Explore, 5, &TurnParams::default(), &mut rng).unwrap();
        assert_eq!(result.turns_spent, 5);
        assert!(result.land_gained >= 5);
        assert_eq!(e.resources.land, 250 + result.land_gained);
        assert!(e.land_invariant_holds());
    }

    #[test]
    fn food_shortfall_stops_early_and_deserts() {
        let mut e = empire();
        e.buildings.farms = 0;
        e.buildings.homes += 100;
        e.resources.freeland = 0;
        e.resources.food = 900;
        let before = e.clone();

        let mut stepped = before.clone();
        let mut expected = 0;
        while stepped.resources.food + net_food(&stepped) >= 0 {
            run_upkeep_turns(&mut stepped, 1, &mut GameRng::create(2));
            expected += 1;
            assert!(expected < 10, "food never ran out");
        }

        let result =
            run_turns(&mut e, ActionKind::Cash, 10, &TurnParams::default(), &mut GameRng::create(2))
                .unwrap();
        assert_eq!(result.stopped_early, Some(StopReason::Food));
        assert_eq!(result.turns_spent, expected);
        assert!(result.turns_spent >= 1);
        assert_eq!(result.turns_remaining, 10 - expected);
        assert!(result.deserted_troops.total() > 0);
        assert_eq!(e.troops.total(), before.troops.total() - result.deserted_troops.total());
        assert!(e.resources.food >= 0);

        let mut completed = before.clone();
        let clean = run_turns(
            &mut completed,
            ActionKind::Cash,
            expected,
            &TurnParams::default(),
            &mut GameRng::create(2),
        )
        .unwrap();
        assert_eq!(clean.stopped_early, None);
        assert_eq!(result.food_produced, clean.food_produced);
        assert_eq!(result.food_consumed, clean.food_consumed);
        assert_eq!(result.income, clean.income);
        assert_eq!(result.expenses, clean.expenses);
        assert_eq!(e.resources.food, completed.resources.food);
        assert_eq!(e.resources.gold, completed.resources.gold);
    }

    #[test]
    fn oversized_loan_halts_before_any_turn() {
        let mut e = empire();
        e.loan = loan_capacity(&e) * 3;
        let mut rng = GameRng::create(2);
        let result =
            run_turns(&mut e, ActionKind::Farm, 4, &TurnParams::default(), &mut rng).unwrap();
        assert_eq!(result.stopped_early, Some(StopReason::Loan));
        assert_eq!(result.turns_spent, 0);
        assert_eq!(result.turns_remaining, 4);
    }

    #[test]
    fn build_consumes_freeland_and_ends_when_queue_empties() {
        let mut e = empire();
        let params = TurnParams {
            buildings: Some(BuildingCounts {
                farms: 6,
                towers: 3,
                ..BuildingCounts::default()
            }),
            ..TurnParams::default()
        };
        let mut rng = GameRng::create(4);
        let result = run_turns(&mut e, ActionKind::Build, 10, &params, &mut rng).unwrap();
        assert_eq!(result.buildings_constructed.total(), 9);
        assert_eq!(result.turns_spent, 1);
        assert_eq!(e.resources.freeland, 40 - 9);
        assert!(e.land_invariant_holds());
    }

    #[test]
    fn industry_follows_allocation() {
        let mut e = empire();
        let params = TurnParams {
            industry: Some(IndustryAllocation::try_new([100, 0, 0, 0]).unwrap()),
            ..TurnParams::default()
        };
        let mut rng = GameRng::create(4);
        let result = run_turns(&mut e, ActionKind::Industry, 2, &params, &mut rng).unwrap();
        assert!(result.troops_produced.infantry > 0);
        assert_eq!(result.troops_produced.cavalry, 0);
        assert_eq!(result.troops_produced.navy, 0);
    }

    #[test]
    fn upkeep_turns_never_draw() {
        let mut e = empire();
        let mut rng = GameRng::create(77);
        let result = run_upkeep_turns(&mut e, 2, &mut rng);
        assert_eq!(result.turns_spent, 2);
        assert!(result.action.is_none());
        assert_eq!(rng, GameRng::create(77));
    }

    #[test]
    fn size_bonus_is_bounded_and_decreasing() {
        assert!((size_bonus(0) - 1.0).abs() < f64::EPSILON);
        assert!(size_bonus(50_000) > size_bonus(500_000));
        assert!((size_bonus(i64::MAX) - SIZE_BONUS_MIN).abs() < f64::EPSILON);
    }

    #[test]
    fn loan_payment_comes_from_gold() {
        let mut e = empire();
        e.loan = 10_000;
        let mut rng = GameRng::create(4);
        let result =
            run_turns(&mut e, ActionKind::Cash, 1, &TurnParams::default(), &mut rng).unwrap();
        assert_eq!(result.loan_paid, 200);
        assert_eq!(e.loan, 9_800);
    }
}
