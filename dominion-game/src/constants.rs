//! Centralized balance and tuning constants for Dominion game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// News keys ----------------------------------------------------------------
pub(crate) const NEWS_ATTACK_WON: &str = "news.attack.won";
pub(crate) const NEWS_ATTACK_REPELLED: &str = "news.attack.repelled";
pub(crate) const NEWS_EMPIRE_ELIMINATED: &str = "news.empire.eliminated";
pub(crate) const NEWS_SPELL_SUCCESS: &str = "news.spell.success";
pub(crate) const NEWS_SPELL_FAILED: &str = "news.spell.failed";
pub(crate) const NEWS_SHIELD_RAISED: &str = "news.spell.shield";
pub(crate) const NEWS_FOOD_DESERTION: &str = "news.economy.desertion";
pub(crate) const NEWS_LOAN_HALT: &str = "news.economy.loan-halt";
pub(crate) const NEWS_EDICT_TAX: &str = "news.edict.richest-tax";
pub(crate) const NEWS_TROOPS_LIQUIDATED: &str = "news.economy.liquidated";

// Empire defaults ----------------------------------------------------------
pub(crate) const START_GOLD: i64 = 100_000;
pub(crate) const START_FOOD: i64 = 10_000;
pub(crate) const START_RUNES: i64 = 500;
pub(crate) const START_LAND: i64 = 250;
pub(crate) const START_FREELAND: i64 = 40;
pub(crate) const START_PEASANTS: i64 = 1_500;
pub(crate) const START_TAX_RATE: i64 = 35;
pub(crate) const START_INFANTRY: i64 = 300;
pub(crate) const START_CAVALRY: i64 = 60;
pub(crate) const START_AIRCRAFT: i64 = 20;
pub(crate) const START_NAVY: i64 = 10;
pub(crate) const START_WIZARDS: i64 = 40;
pub(crate) const HEALTH_MAX: i64 = 100;

// Networth weights ---------------------------------------------------------
pub(crate) const NW_PER_LAND: i64 = 20;
pub(crate) const NW_PER_BUILDING: i64 = 5;
pub(crate) const NW_PEASANT_DIVISOR: i64 = 5;
pub(crate) const NW_GOLD_DIVISOR: i64 = 1_000;
pub(crate) const NW_TROOP_WEIGHTS: [i64; 5] = [1, 2, 4, 6, 2];

// Economy tuning -----------------------------------------------------------
pub(crate) const FOOD_PER_FARM: f64 = 80.0;
pub(crate) const FOOD_PER_FREELAND: f64 = 2.0;
pub(crate) const FOOD_PER_PEASANT: f64 = 0.25;
pub(crate) const FOOD_PER_TROOP: f64 = 0.05;
pub(crate) const TAX_GOLD_PER_PEASANT: f64 = 1.6;
pub(crate) const GOLD_PER_MARKET: f64 = 30.0;
pub(crate) const RUNES_PER_TOWER_BASE: f64 = 2.0;
pub(crate) const TROOP_GOLD_UPKEEP: [f64; 5] = [0.5, 1.0, 2.0, 3.0, 0.5];
pub(crate) const BUILDING_MAINTENANCE: f64 = 2.0;
pub(crate) const LOAN_INTEREST_RATE: f64 = 0.0075;
pub(crate) const LOAN_PAYMENT_RATE: f64 = 0.02;
pub(crate) const LOAN_CAPACITY_TURNS: f64 = 50.0;
pub(crate) const LOAN_EMERGENCY_MULTIPLE: f64 = 2.0;
pub(crate) const BANK_INTEREST_RATE: f64 = 0.004;
pub(crate) const BANK_SAVINGS_PER_LAND: i64 = 5_000;
pub(crate) const SIZE_BONUS_SCALE: f64 = 100_000.0;
pub(crate) const SIZE_BONUS_MIN: f64 = 0.25;
pub(crate) const MASTERY_BONUS_PER_LEVEL: f64 = 0.02;
pub(crate) const EXPLORE_BASE_LAND: f64 = 12.0;
pub(crate) const EXPLORE_JITTER_LOW: f64 = 0.85;
pub(crate) const EXPLORE_JITTER_HIGH: f64 = 1.15;
pub(crate) const FARM_ACTION_BONUS: f64 = 0.25;
pub(crate) const CASH_ACTION_BONUS: f64 = 0.25;
pub(crate) const MEDITATE_RUNES_PER_TOWER: f64 = 10.0;
pub(crate) const MEDITATE_RUNES_LAND_DIVISOR: f64 = 2.0;
pub(crate) const INDUSTRY_POINTS_PER_BARRACKS: f64 = 4.0;
pub(crate) const INDUSTRY_POINTS_LAND_DIVISOR: f64 = 5.0;
pub(crate) const INDUSTRY_UNIT_COST: [f64; 4] = [1.0, 2.0, 4.0, 6.0];
pub(crate) const BUILD_MIN_PER_TURN: i64 = 4;
pub(crate) const BUILD_LAND_DIVISOR: i64 = 25;
pub(crate) const BUILD_COST_BASE: f64 = 300.0;
pub(crate) const BUILD_COST_PER_LAND: f64 = 0.8;
pub(crate) const DESERTION_RATE: f64 = 0.03;
pub(crate) const STARVATION_PEASANT_LOSS: f64 = 0.01;
pub(crate) const PEASANT_GROWTH_RATE: f64 = 0.03;
pub(crate) const PEASANTS_PER_LAND: i64 = 5;
pub(crate) const PEASANTS_PER_HOME: i64 = 30;
pub(crate) const HEALTH_REGEN_PER_TURN: i64 = 1;

// Market tuning ------------------------------------------------------------
pub(crate) const FOOD_BASE_PRICE: f64 = 8.0;
pub(crate) const TROOP_BASE_PRICES: [f64; 5] = [150.0, 350.0, 600.0, 900.0, 500.0];
pub(crate) const MARKET_SELL_RATIO: f64 = 0.5;
pub(crate) const MARKET_DRIFT: f64 = 0.05;
pub(crate) const MARKET_PRICE_FLOOR: f64 = 0.5;
pub(crate) const MARKET_PRICE_CEILING: f64 = 2.0;

// Combat tuning ------------------------------------------------------------
pub(crate) const ATTACK_TURN_COST: i64 = 2;
pub(crate) const OFFENSE_WEIGHTS: [f64; 4] = [1.0, 2.0, 4.0, 6.0];
pub(crate) const DEFENSE_WEIGHTS: [f64; 4] = [2.0, 2.0, 3.0, 5.0];
pub(crate) const SHIELD_DEFENSE_FACTOR: f64 = 0.9;
pub(crate) const COMBAT_LUCK_LOW: f64 = 0.95;
pub(crate) const COMBAT_LUCK_HIGH: f64 = 1.05;
pub(crate) const BASE_LAND_SHARE: f64 = 0.05;
pub(crate) const MAX_LAND_SHARE: f64 = 0.15;
pub(crate) const MAX_POWER_RATIO_FOR_LAND: f64 = 3.0;
pub(crate) const ATTACKER_WIN_LOSS_RATE: f64 = 0.04;
pub(crate) const ATTACKER_FAIL_LOSS_RATE: f64 = 0.10;
pub(crate) const DEFENDER_HOLD_LOSS_RATE: f64 = 0.03;
pub(crate) const ATTACK_HEALTH_COST: i64 = 5;
pub(crate) const ELIMINATION_LAND: i64 = 10;

// Magic tuning -------------------------------------------------------------
pub(crate) const SPELL_TURN_COST: i64 = 1;
pub(crate) const SPELL_COST_PER_LAND: f64 = 0.10;
pub(crate) const SPELL_COST_PER_TOWER: f64 = 0.25;
pub(crate) const SPELL_COST_BONUS_CAP: f64 = 0.75;
pub(crate) const WIZARD_DEFENSE_PREMIUM: f64 = 1.05;
pub(crate) const WIZARD_RATIO_CAP: f64 = 1_000.0;
pub(crate) const SPELL_HEALTH_COST: f64 = 2.0;
pub(crate) const FAILED_SPELL_WIZARD_LOSS_MIN: i64 = 1;
pub(crate) const FAILED_SPELL_WIZARD_LOSS_MAX: i64 = 5;
pub(crate) const SHIELD_ROUNDS: u32 = 2;
pub(crate) const GATE_ROUNDS: u32 = 2;
pub(crate) const ERA_CHANGE_COOLDOWN_ROUNDS: u32 = 3;
pub(crate) const HARVEST_FOOD_PER_LAND: f64 = 8.0;
pub(crate) const MIDAS_GOLD_PER_LAND: f64 = 25.0;
pub(crate) const STORM_FOOD_RATE: f64 = 0.08;
pub(crate) const STORM_GOLD_RATE: f64 = 0.06;
pub(crate) const BLAST_TROOP_RATE: f64 = 0.03;
pub(crate) const STEAL_BAND_LOW: f64 = 0.03;
pub(crate) const STEAL_BAND_HIGH: f64 = 0.07;
pub(crate) const QUAKE_BUILDING_RATE: f64 = 0.03;
pub(crate) const QUAKE_MIN_BUILDING_RATIO: f64 = 0.30;
pub(crate) const SEIZE_BUILDING_RATE: f64 = 0.015;
pub(crate) const SEIZE_FREELAND_RATE: f64 = 0.02;
pub(crate) const SEIZE_CASTER_WIZARD_LOSS: f64 = 0.02;
pub(crate) const SEIZE_TARGET_WIZARD_LOSS: f64 = 0.03;

// Bot tuning ---------------------------------------------------------------
pub(crate) const PACIFIST_AGGRESSION_THRESHOLD: f64 = 3.0;
pub(crate) const MAX_OFFENSIVE_SPELLS_PER_ROUND: u32 = 3;
pub(crate) const FOOD_RESERVE_MIN_TURNS: f64 = 20.0;
pub(crate) const FOOD_RESERVE_MAX_TURNS: f64 = 50.0;
pub(crate) const FOOD_CRITICAL_TURNS: f64 = 5.0;
pub(crate) const LATE_GAME_ROUND: f64 = 40.0;
pub(crate) const UPKEEP_CEILING_SHARE: f64 = 0.8;
pub(crate) const BOT_SHIELD_RUNE_RESERVE: f64 = 1.5;
pub(crate) const WEAK_LINE_FACTOR: f64 = 0.5;
pub(crate) const SINGLE_LINE_OFFENSE_SHARE: f64 = 0.4;
