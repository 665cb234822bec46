//! Global market: food and troop trading with per-round price drift.
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    FOOD_BASE_PRICE, MARKET_DRIFT, MARKET_PRICE_CEILING, MARKET_PRICE_FLOOR, MARKET_SELL_RATIO,
    TROOP_BASE_PRICES,
};
use crate::effects::EffectKind;
use crate::empire::{Empire, TroopKind};
use crate::numbers::{ceil_f64_to_i64, floor_f64_to_i64, i64_to_f64};
use crate::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Good {
    Food,
    Troop(TroopKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub good: Good,
    pub side: Side,
    pub quantity: i64,
}

impl MarketOrder {
    #[must_use]
    pub const fn buy(good: Good, quantity: i64) -> Self {
        Self {
            good,
            side: Side::Buy,
            quantity,
        }
    }

    #[must_use]
    pub const fn sell(good: Good, quantity: i64) -> Self {
        Self {
            good,
            side: Side::Sell,
            quantity,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("market quantity must be positive (got {0})")]
    NonPositiveQuantity(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketResult {
    pub order: MarketOrder,
    pub filled: i64,
    pub unit_price: f64,
    /// Positive when gold was received
    pub gold_delta: i64,
}

/// Price multipliers relative to the base table, drifted once per round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketPrices {
    pub food_factor: f64,
    pub troop_factors: [f64; 5],
}

impl Default for MarketPrices {
    fn default() -> Self {
        Self {
            food_factor: 1.0,
            troop_factors: [1.0; 5],
        }
    }
}

impl MarketPrices {
    fn factor(&self, good: Good) -> f64 {
        match good {
            Good::Food => self.food_factor,
            Good::Troop(kind) => self.troop_factors[kind.index()],
        }
    }

    /// Market price before any empire modifiers.
    #[must_use]
    pub fn list_price(&self, good: Good) -> f64 {
        let base = match good {
            Good::Food => FOOD_BASE_PRICE,
            Good::Troop(kind) => TROOP_BASE_PRICES[kind.index()],
        };
        base * self.factor(good)
    }

    /// Price `empire` pays per unit, after race and advisor market bonuses.
    #[must_use]
    pub fn buy_price(&self, empire: &Empire, good: Good) -> f64 {
        let discount = empire.modifier(EffectKind::MarketPrice).clamp(0.0, 0.5);
        self.list_price(good) * empire.race_mods().market_mult() * (1.0 - discount)
    }

    #[must_use]
    pub fn sell_price(&self, good: Good) -> f64 {
        self.list_price(good) * MARKET_SELL_RATIO
    }

    /// Move every price factor by up to the drift rate, within the band.
    pub fn drift(&mut self, rng: &mut GameRng) {
        self.food_factor = drifted(self.food_factor, rng);
        for factor in &mut self.troop_factors {
            *factor = drifted(*factor, rng);
        }
    }
}

fn drifted(factor: f64, rng: &mut GameRng) -> f64 {
    let step = rng.range(-MARKET_DRIFT, MARKET_DRIFT);
    (factor * (1.0 + step)).clamp(MARKET_PRICE_FLOOR, MARKET_PRICE_CEILING)
}

fn holding(empire: &Empire, good: Good) -> i64 {
    match good {
        Good::Food => empire.resources.food,
        Good::Troop(kind) => empire.troops.get(kind),
    }
}

fn holding_mut(empire: &mut Empire, good: Good) -> &mut i64 {
    match good {
        Good::Food => &mut empire.resources.food,
        Good::Troop(kind) => empire.troops.get_mut(kind),
    }
}

/// Execute a trade. Buys beyond the available gold and sells beyond the
/// held quantity are filled partially.
///
/// # Errors
///
/// Returns `MarketError::NonPositiveQuantity` for an empty order.
pub fn trade(
    empire: &mut Empire,
    prices: &MarketPrices,
    order: MarketOrder,
) -> Result<MarketResult, MarketError> {
    if order.quantity <= 0 {
        return Err(MarketError::NonPositiveQuantity(order.quantity));
    }
    let (filled, unit_price, gold_delta) = match order.side {
        Side::Buy => {
            let unit_price = prices.buy_price(empire, order.good);
            let affordable =
                floor_f64_to_i64(i64_to_f64(empire.resources.gold.max(0)) / unit_price);
            let filled = order.quantity.min(affordable).max(0);
            let cost = ceil_f64_to_i64(i64_to_f64(filled) * unit_price).min(empire.resources.gold);
            *holding_mut(empire, order.good) += filled;
            empire.resources.gold -= cost;
            (filled, unit_price, -cost)
        }
        Side::Sell => {
            let unit_price = prices.sell_price(order.good);
            let filled = order.quantity.min(holding(empire, order.good)).max(0);
            let revenue = floor_f64_to_i64(i64_to_f64(filled) * unit_price);
            *holding_mut(empire, order.good) -= filled;
            empire.resources.gold += revenue;
            (filled, unit_price, revenue)
        }
    };
    empire.recompute_networth();
    debug!(
        "empire {} market {:?} {:?}: filled {}/{} at {:.2}",
        empire.id, order.side, order.good, filled, order.quantity, unit_price
    );
    Ok(MarketResult {
        order,
        filled,
        unit_price,
        gold_delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::era::Era;
    use crate::race::Race;

    fn empire(race: Race) -> Empire {
        Empire::new(1, "Trader", race, Era::Present)
    }

    #[test]
    fn buying_spends_gold_and_adds_goods() {
        let mut e = empire(Race::Human);
        let prices = MarketPrices::default();
        let result = trade(&mut e, &prices, MarketOrder::buy(Good::Food, 1_000)).unwrap();
        assert_eq!(result.filled, 1_000);
        assert_eq!(result.gold_delta, -8_000);
        assert_eq!(e.resources.food, 11_000);
        assert_eq!(e.resources.gold, 92_000);
    }

    #[test]
    fn unaffordable_buys_fill_partially() {
        let mut e = empire(Race::Human);
        e.resources.gold = 1_000;
        let prices = MarketPrices::default();
        let order = MarketOrder::buy(Good::Troop(TroopKind::Navy), 10);
        let result = trade(&mut e, &prices, order).unwrap();
        assert_eq!(result.filled, 1);
        assert_eq!(e.resources.gold, 100);
    }

    #[test]
    fn selling_is_capped_by_holdings() {
        let mut e = empire(Race::Human);
        let prices = MarketPrices::default();
        let order = MarketOrder::sell(Good::Troop(TroopKind::Aircraft), 500);
        let result = trade(&mut e, &prices, order).unwrap();
        assert_eq!(result.filled, 20);
        assert_eq!(result.gold_delta, 6_000);
        assert_eq!(e.troops.aircraft, 0);
    }

    #[test]
    fn race_market_bonus_discounts_buys() {
        let prices = MarketPrices::default();
        let gnome = empire(Race::Gnome);
        let human = empire(Race::Human);
        assert!(prices.buy_price(&gnome, Good::Food) < prices.buy_price(&human, Good::Food));
    }

    #[test]
    fn drift_stays_within_band() {
        let mut prices = MarketPrices::default();
        let mut rng = GameRng::create(11);
        for _ in 0..500 {
            prices.drift(&mut rng);
            assert!((MARKET_PRICE_FLOOR..=MARKET_PRICE_CEILING).contains(&prices.food_factor));
            for factor in prices.troop_factors {
                assert!((MARKET_PRICE_FLOOR..=MARKET_PRICE_CEILING).contains(&factor));
            }
        }
    }

    #[test]
    fn empty_orders_are_rejected() {
        let mut e = empire(Race::Human);
        let prices = MarketPrices::default();
        assert_eq!(
            trade(&mut e, &prices, MarketOrder::sell(Good::Food, 0)),
            Err(MarketError::NonPositiveQuantity(0))
        );
    }
}
