//! Run configuration.
//!
//! Balance math lives in [`crate::constants`]; this struct carries the knobs a
//! run may override from JSON, each with a serde default so partial documents
//! load cleanly.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ATTACK_TURN_COST, MAX_OFFENSIVE_SPELLS_PER_ROUND, SPELL_TURN_COST};
use crate::numbers::{i64_to_f64, usize_to_f64};

/// Errors raised when run configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

fn check_min(field: &'static str, min: f64, value: f64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

fn check_range(field: &'static str, min: f64, max: f64, value: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "SimConfig::default_turns_per_round")]
    pub turns_per_round: i64,
    #[serde(default = "SimConfig::default_bot_count")]
    pub bot_count: u32,
    #[serde(default = "SimConfig::default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "SimConfig::default_attack_turn_cost")]
    pub attack_turn_cost: i64,
    #[serde(default = "SimConfig::default_spell_turn_cost")]
    pub spell_turn_cost: i64,
    #[serde(default = "SimConfig::default_spy_staleness_rounds")]
    pub spy_staleness_rounds: u32,
    #[serde(default = "SimConfig::default_max_spells_per_round")]
    pub max_spells_per_round: u32,
    #[serde(default = "SimConfig::default_draft_interval")]
    pub draft_interval: u32,
    #[serde(default = "SimConfig::default_draft_size")]
    pub draft_size: usize,
    #[serde(default = "SimConfig::default_shop_size")]
    pub shop_size: usize,
    #[serde(default = "SimConfig::default_rerolls_per_draft")]
    pub rerolls_per_draft: u32,
    #[serde(default = "SimConfig::default_protection_rounds")]
    pub protection_rounds: u32,
    #[serde(default = "SimConfig::default_news_capacity")]
    pub news_capacity: usize,
    #[serde(default)]
    pub bot_tuning: BotTuning,
}

impl SimConfig {
    const fn default_turns_per_round() -> i64 {
        30
    }
    const fn default_bot_count() -> u32 {
        5
    }
    const fn default_max_rounds() -> u32 {
        50
    }
    const fn default_attack_turn_cost() -> i64 {
        ATTACK_TURN_COST
    }
    const fn default_spell_turn_cost() -> i64 {
        SPELL_TURN_COST
    }
    const fn default_spy_staleness_rounds() -> u32 {
        2
    }
    const fn default_max_spells_per_round() -> u32 {
        MAX_OFFENSIVE_SPELLS_PER_ROUND
    }
    const fn default_draft_interval() -> u32 {
        5
    }
    const fn default_draft_size() -> usize {
        3
    }
    const fn default_shop_size() -> usize {
        4
    }
    const fn default_rerolls_per_draft() -> u32 {
        1
    }
    const fn default_protection_rounds() -> u32 {
        3
    }
    const fn default_news_capacity() -> usize {
        200
    }

    /// Parse a configuration document and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and the first
    /// violated bound otherwise.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("turns_per_round", 4.0, 200.0, i64_to_f64(self.turns_per_round))?;
        check_range("bot_count", 1.0, 40.0, f64::from(self.bot_count))?;
        check_min("max_rounds", 1.0, f64::from(self.max_rounds))?;
        check_range("attack_turn_cost", 1.0, 10.0, i64_to_f64(self.attack_turn_cost))?;
        check_range("spell_turn_cost", 1.0, 10.0, i64_to_f64(self.spell_turn_cost))?;
        check_range(
            "max_spells_per_round",
            0.0,
            f64::from(MAX_OFFENSIVE_SPELLS_PER_ROUND),
            f64::from(self.max_spells_per_round),
        )?;
        check_min("draft_interval", 1.0, f64::from(self.draft_interval))?;
        check_min("draft_size", 1.0, usize_to_f64(self.draft_size))?;
        check_min("news_capacity", 10.0, usize_to_f64(self.news_capacity))?;
        self.bot_tuning.validate()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            turns_per_round: Self::default_turns_per_round(),
            bot_count: Self::default_bot_count(),
            max_rounds: Self::default_max_rounds(),
            attack_turn_cost: Self::default_attack_turn_cost(),
            spell_turn_cost: Self::default_spell_turn_cost(),
            spy_staleness_rounds: Self::default_spy_staleness_rounds(),
            max_spells_per_round: Self::default_max_spells_per_round(),
            draft_interval: Self::default_draft_interval(),
            draft_size: Self::default_draft_size(),
            shop_size: Self::default_shop_size(),
            rerolls_per_draft: Self::default_rerolls_per_draft(),
            protection_rounds: Self::default_protection_rounds(),
            news_capacity: Self::default_news_capacity(),
            bot_tuning: BotTuning::default(),
        }
    }
}

/// Weights for the bot state machine and target scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotTuning {
    /// Aggression threshold below which a bot retaliates
    #[serde(default = "BotTuning::default_retaliation_cutoff")]
    pub retaliation_cutoff: f64,
    #[serde(default = "BotTuning::default_defensive_fraction")]
    pub defensive_fraction: f64,
    #[serde(default = "BotTuning::default_defense_focus_min")]
    pub defense_focus_min: f64,
    #[serde(default = "BotTuning::default_aggressive_multiple")]
    pub aggressive_multiple: f64,
    /// Highest aggression threshold still allowed to turn aggressive
    #[serde(default = "BotTuning::default_cautious_threshold")]
    pub cautious_threshold: f64,
    #[serde(default = "BotTuning::default_grace_rounds")]
    pub grace_rounds: u32,
    #[serde(default = "BotTuning::default_grudge_per_attack")]
    pub grudge_per_attack: f64,
    #[serde(default = "BotTuning::default_grudge_per_spell")]
    pub grudge_per_spell: f64,
    #[serde(default = "BotTuning::default_same_era_bonus")]
    pub same_era_bonus: f64,
    #[serde(default = "BotTuning::default_weak_target_bonus")]
    pub weak_target_bonus: f64,
    #[serde(default = "BotTuning::default_weak_target_ratio")]
    pub weak_target_ratio: f64,
    #[serde(default = "BotTuning::default_wealth_factor")]
    pub wealth_factor: f64,
    #[serde(default = "BotTuning::default_leader_multiplier")]
    pub leader_multiplier: f64,
    #[serde(default = "BotTuning::default_min_power_ratio")]
    pub min_power_ratio: f64,
}

impl BotTuning {
    const fn default_retaliation_cutoff() -> f64 {
        2.0
    }
    const fn default_defensive_fraction() -> f64 {
        0.6
    }
    const fn default_defense_focus_min() -> f64 {
        0.5
    }
    const fn default_aggressive_multiple() -> f64 {
        1.3
    }
    const fn default_cautious_threshold() -> f64 {
        1.5
    }
    const fn default_grace_rounds() -> u32 {
        5
    }
    const fn default_grudge_per_attack() -> f64 {
        8.0
    }
    const fn default_grudge_per_spell() -> f64 {
        4.0
    }
    const fn default_same_era_bonus() -> f64 {
        3.0
    }
    const fn default_weak_target_bonus() -> f64 {
        6.0
    }
    const fn default_weak_target_ratio() -> f64 {
        1.5
    }
    const fn default_wealth_factor() -> f64 {
        2.0
    }
    const fn default_leader_multiplier() -> f64 {
        1.25
    }
    const fn default_min_power_ratio() -> f64 {
        0.8
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "bot_tuning.defensive_fraction",
            0.0,
            2.0,
            self.defensive_fraction,
        )?;
        check_range(
            "bot_tuning.defense_focus_min",
            0.0,
            1.0,
            self.defense_focus_min,
        )?;
        check_min(
            "bot_tuning.aggressive_multiple",
            1.0,
            self.aggressive_multiple,
        )?;
        check_min("bot_tuning.leader_multiplier", 1.0, self.leader_multiplier)?;
        check_range("bot_tuning.min_power_ratio", 0.0, 5.0, self.min_power_ratio)?;
        check_min("bot_tuning.grudge_per_attack", 0.0, self.grudge_per_attack)?;
        check_min("bot_tuning.grudge_per_spell", 0.0, self.grudge_per_spell)?;
        Ok(())
    }
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            retaliation_cutoff: Self::default_retaliation_cutoff(),
            defensive_fraction: Self::default_defensive_fraction(),
            defense_focus_min: Self::default_defense_focus_min(),
            aggressive_multiple: Self::default_aggressive_multiple(),
            cautious_threshold: Self::default_cautious_threshold(),
            grace_rounds: Self::default_grace_rounds(),
            grudge_per_attack: Self::default_grudge_per_attack(),
            grudge_per_spell: Self::default_grudge_per_spell(),
            same_era_bonus: Self::default_same_era_bonus(),
            weak_target_bonus: Self::default_weak_target_bonus(),
            weak_target_ratio: Self::default_weak_target_ratio(),
            wealth_factor: Self::default_wealth_factor(),
            leader_multiplier: Self::default_leader_multiplier(),
            min_power_ratio: Self::default_min_power_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
        assert_eq!(SimConfig::default().turns_per_round, 30);
        assert_eq!(SimConfig::default().spy_staleness_rounds, 2);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SimConfig::from_json(r#"{ "bot_count": 8, "bot_tuning": { "grace_rounds": 2 } }"#)
            .unwrap();
        assert_eq!(cfg.bot_count, 8);
        assert_eq!(cfg.turns_per_round, 30);
        assert_eq!(cfg.bot_tuning.grace_rounds, 2);
        assert!((cfg.bot_tuning.leader_multiplier - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_values_are_reported() {
        let err = SimConfig::from_json(r#"{ "turns_per_round": 1 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation {
                field: "turns_per_round",
                ..
            }
        ));
        let err = SimConfig::from_json(r#"{ "bot_tuning": { "leader_multiplier": 0.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MinViolation { .. }));
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
