//! Bot economic management.
//!
//! Each policy inspects the empire and returns the market orders it wants.
//! [`manage_economy`] runs them in priority order, executing one policy's
//! orders before the next policy looks at the result.
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bot::strategy::StrategyProfile;
use crate::constants::{
    FOOD_CRITICAL_TURNS, FOOD_RESERVE_MAX_TURNS, FOOD_RESERVE_MIN_TURNS, TROOP_GOLD_UPKEEP,
    UPKEEP_CEILING_SHARE,
};
use crate::economy::{
    expenses, food_consumption, gross_income, net_food, net_income, troop_upkeep, unit_upkeep,
};
use crate::empire::{Empire, TroopCounts, TroopKind};
use crate::market::{Good, MarketOrder, MarketPrices, MarketResult, Side, trade};
use crate::numbers::{ceil_f64_to_i64, floor_f64_to_i64, i64_to_f64, portion};

const DEFICIT_LIQUIDATION_CAP: f64 = 0.10;

/// Military lines ordered from the most to the least expensive to keep.
fn by_upkeep_desc() -> [TroopKind; 5] {
    let mut kinds = TroopKind::ALL;
    kinds.sort_by(|a, b| {
        TROOP_GOLD_UPKEEP[b.index()]
            .total_cmp(&TROOP_GOLD_UPKEEP[a.index()])
            .then(a.index().cmp(&b.index()))
    });
    kinds
}

/// Sell troops, most expensive upkeep first, to raise food money when the
/// reserve would run dry within a few turns.
#[must_use]
pub fn emergency_liquidation(empire: &Empire, prices: &MarketPrices) -> Vec<MarketOrder> {
    let mut orders = Vec::new();
    let consumption = food_consumption(empire);
    if net_food(empire) >= 0
        || i64_to_f64(empire.resources.food) >= consumption * FOOD_CRITICAL_TURNS
    {
        return orders;
    }
    let needed_food = ceil_f64_to_i64(consumption * FOOD_CRITICAL_TURNS) - empire.resources.food;
    if needed_food <= 0 {
        return orders;
    }
    let cost = i64_to_f64(needed_food) * prices.buy_price(empire, Good::Food);
    let mut shortfall = cost - i64_to_f64(empire.resources.gold.max(0));
    for kind in by_upkeep_desc() {
        if shortfall <= 0.0 {
            break;
        }
        let held = empire.troops.get(kind);
        let price = prices.sell_price(Good::Troop(kind));
        if held <= 0 || price <= 0.0 {
            continue;
        }
        let units = ceil_f64_to_i64(shortfall / price).min(held);
        orders.push(MarketOrder::sell(Good::Troop(kind), units));
        shortfall -= i64_to_f64(units) * price;
    }
    orders.push(MarketOrder::buy(Good::Food, needed_food));
    orders
}

/// Keep food within the reserve band: buy up to the floor, sell above the
/// ceiling. Cautious bots keep a deeper floor.
#[must_use]
pub fn food_trade(empire: &Empire, prices: &MarketPrices, aggression: f64) -> Vec<MarketOrder> {
    let consumption = food_consumption(empire);
    if consumption <= 0.0 {
        return Vec::new();
    }
    let caution = 1.0 + (1.0 - aggression.clamp(0.0, 1.0)) * 0.5;
    let floor_turns = (FOOD_RESERVE_MIN_TURNS * caution).min(FOOD_RESERVE_MAX_TURNS);
    let floor = ceil_f64_to_i64(consumption * floor_turns);
    let ceiling = floor_f64_to_i64(consumption * FOOD_RESERVE_MAX_TURNS);
    let food = empire.resources.food;
    if food < floor {
        let price = prices.buy_price(empire, Good::Food);
        let affordable = floor_f64_to_i64(i64_to_f64(empire.resources.gold.max(0)) / price);
        let quantity = (floor - food).min(affordable);
        if quantity > 0 {
            return vec![MarketOrder::buy(Good::Food, quantity)];
        }
    } else if food > ceiling && net_food(empire) > 0 {
        return vec![MarketOrder::sell(Good::Food, food - ceiling)];
    }
    Vec::new()
}

/// Trim up to 10% of each line, priciest first, once the gold runway under
/// the current deficit is shorter than `runway_turns`.
#[must_use]
pub fn deficit_liquidation(empire: &Empire, runway_turns: f64) -> Vec<MarketOrder> {
    let mut orders = Vec::new();
    let net = net_income(empire);
    if net >= 0 {
        return orders;
    }
    let deficit = i64_to_f64(-net);
    let runway = i64_to_f64(empire.resources.gold.max(0)) / deficit;
    if runway >= runway_turns {
        return orders;
    }
    let mut savings_needed = deficit;
    for kind in by_upkeep_desc() {
        if savings_needed <= 0.0 {
            break;
        }
        let upkeep = unit_upkeep(empire, kind);
        if upkeep <= 0.0 {
            continue;
        }
        let cap = portion(empire.troops.get(kind), DEFICIT_LIQUIDATION_CAP);
        let units = ceil_f64_to_i64(savings_needed / upkeep).min(cap);
        if units > 0 {
            orders.push(MarketOrder::sell(Good::Troop(kind), units));
            savings_needed -= i64_to_f64(units) * upkeep;
        }
    }
    orders
}

/// Spend gold above the reserve on troops in the empire's industry mix,
/// bounded by the gold budget and by what gross income can keep paid.
#[must_use]
pub fn surplus_troop_purchase(
    empire: &Empire,
    prices: &MarketPrices,
    runway_turns: f64,
    aggression: f64,
) -> Vec<MarketOrder> {
    let mut orders = Vec::new();
    let aggression = aggression.clamp(0.0, 1.0);
    let reserve = expenses(empire).max(1.0) * runway_turns * (1.0 - aggression * 0.5);
    let budget = (i64_to_f64(empire.resources.gold) - reserve) * aggression;
    let upkeep_room = gross_income(empire) * UPKEEP_CEILING_SHARE - troop_upkeep(empire);
    if budget <= 0.0 || upkeep_room <= 0.0 {
        return orders;
    }
    for kind in TroopKind::MILITARY {
        let share = f64::from(empire.industry.share(kind)) / 100.0;
        if share <= 0.0 {
            continue;
        }
        let price = prices.buy_price(empire, Good::Troop(kind));
        let by_gold = floor_f64_to_i64(budget * share / price);
        let by_upkeep =
            floor_f64_to_i64(upkeep_room * share / unit_upkeep(empire, kind).max(0.01));
        let units = by_gold.min(by_upkeep);
        if units > 0 {
            orders.push(MarketOrder::buy(Good::Troop(kind), units));
        }
    }
    orders
}

/// What one round of economic management did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomicReport {
    pub trades: Vec<MarketResult>,
    pub liquidated: TroopCounts,
    pub purchased: TroopCounts,
}

impl EconomicReport {
    fn record(&mut self, result: MarketResult) {
        if let Good::Troop(kind) = result.order.good {
            match result.order.side {
                Side::Sell => *self.liquidated.get_mut(kind) += result.filled,
                Side::Buy => *self.purchased.get_mut(kind) += result.filled,
            }
        }
        self.trades.push(result);
    }
}

fn execute(
    empire: &mut Empire,
    prices: &MarketPrices,
    orders: Vec<MarketOrder>,
    report: &mut EconomicReport,
) {
    for order in orders {
        match trade(empire, prices, order) {
            Ok(result) => report.record(result),
            Err(err) => warn!("empire {} skipped market order: {err}", empire.id),
        }
    }
}

/// Run the four policies in order against `empire`.
pub fn manage_economy(
    empire: &mut Empire,
    prices: &MarketPrices,
    profile: &StrategyProfile,
    round: u32,
) -> EconomicReport {
    let aggression = profile.spending_aggression(round);
    let mut report = EconomicReport::default();

    let orders = emergency_liquidation(empire, prices);
    execute(empire, prices, orders, &mut report);
    let orders = food_trade(empire, prices, aggression);
    execute(empire, prices, orders, &mut report);
    let orders = deficit_liquidation(empire, profile.runway_turns);
    execute(empire, prices, orders, &mut report);
    let orders = surplus_troop_purchase(empire, prices, profile.runway_turns, aggression);
    execute(empire, prices, orders, &mut report);

    debug!(
        "empire {} economy: {} trades, liquidated {}, purchased {}",
        empire.id,
        report.trades.len(),
        report.liquidated.total(),
        report.purchased.total()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::personality::Archetype;
    use crate::era::Era;
    use crate::race::Race;

    fn empire() -> Empire {
        Empire::new(2, "Bot", Race::Human, Era::Present)
    }

    #[test]
    fn upkeep_order_puts_navy_first() {
        let order = by_upkeep_desc();
        assert_eq!(order[0], TroopKind::Navy);
        assert_eq!(order[1], TroopKind::Aircraft);
        assert_eq!(order[4], TroopKind::Wizards);
    }

    #[test]
    fn emergency_sells_troops_then_buys_food() {
        let mut starving = empire();
        starving.buildings.farms = 0;
        starving.resources.freeland += 60;
        starving.resources.food = 10;
        starving.resources.gold = 0;
        let orders = emergency_liquidation(&starving, &MarketPrices::default());
        assert!(matches!(
            orders.first(),
            Some(MarketOrder {
                good: Good::Troop(TroopKind::Navy),
                side: Side::Sell,
                ..
            })
        ));
        assert_eq!(orders.last().map(|o| o.good), Some(Good::Food));

        let fed = empire();
        assert!(emergency_liquidation(&fed, &MarketPrices::default()).is_empty());
    }

    #[test]
    fn food_band_buys_low_and_sells_high() {
        let prices = MarketPrices::default();
        let mut low = empire();
        low.resources.food = 0;
        let buys = food_trade(&low, &prices, 0.5);
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].side, Side::Buy);

        let mut high = empire();
        high.resources.food = 1_000_000;
        let sells = food_trade(&high, &prices, 0.5);
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].side, Side::Sell);
    }

    #[test]
    fn deficit_liquidation_caps_each_line() {
        let mut broke = empire();
        broke.troops.navy = 10_000;
        broke.resources.gold = 100;
        let orders = deficit_liquidation(&broke, 20.0);
        assert!(!orders.is_empty());
        for order in &orders {
            if let Good::Troop(kind) = order.good {
                let cap = portion(broke.troops.get(kind), DEFICIT_LIQUIDATION_CAP);
                assert!(order.quantity <= cap);
            }
        }
        assert!(deficit_liquidation(&empire(), 20.0).is_empty());
    }

    #[test]
    fn surplus_purchase_respects_upkeep_ceiling() {
        let prices = MarketPrices::default();
        let mut rich = empire();
        rich.resources.gold = 50_000_000;
        let orders = surplus_troop_purchase(&rich, &prices, 20.0, 1.0);
        assert!(!orders.is_empty());
        let mut after = rich.clone();
        for order in &orders {
            if let Good::Troop(kind) = order.good {
                *after.troops.get_mut(kind) += order.quantity;
            }
        }
        assert!(troop_upkeep(&after) <= gross_income(&rich) * UPKEEP_CEILING_SHARE + 1e-6);

        let mut poor = empire();
        poor.resources.gold = 0;
        assert!(surplus_troop_purchase(&poor, &prices, 20.0, 1.0).is_empty());
    }

    #[test]
    fn manage_economy_keeps_resources_non_negative() {
        let profile = StrategyProfile::for_archetype(Archetype::Raider);
        let mut bot = empire();
        bot.resources.gold = 2_000_000;
        let report = manage_economy(&mut bot, &MarketPrices::default(), &profile, 30);
        assert!(bot.resources.gold >= 0);
        assert!(bot.resources.food >= 0);
        assert!(report.purchased.military() > 0);
    }
}
