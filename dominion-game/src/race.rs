//! Race modifiers. Each race is a fixed lookup of percentage adjustments.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Troll,
    Gnome,
    Gremlin,
    Orc,
    Drow,
    Goblin,
}

/// Percentage adjustments applied as `1 + pct / 100` multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaceModifiers {
    pub offense: i32,
    pub defense: i32,
    pub production: i32,
    pub food: i32,
    pub magic: i32,
    pub market: i32,
    pub explore: i32,
    pub industry: i32,
}

impl Race {
    pub const ALL: [Self; 9] = [
        Self::Human,
        Self::Elf,
        Self::Dwarf,
        Self::Troll,
        Self::Gnome,
        Self::Gremlin,
        Self::Orc,
        Self::Drow,
        Self::Goblin,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Elf => "elf",
            Self::Dwarf => "dwarf",
            Self::Troll => "troll",
            Self::Gnome => "gnome",
            Self::Gremlin => "gremlin",
            Self::Orc => "orc",
            Self::Drow => "drow",
            Self::Goblin => "goblin",
        }
    }

    #[must_use]
    pub const fn modifiers(self) -> RaceModifiers {
        match self {
            Self::Human => RaceModifiers {
                offense: 0,
                defense: 0,
                production: 0,
                food: 0,
                magic: 0,
                market: 0,
                explore: 0,
                industry: 0,
            },
            Self::Elf => RaceModifiers {
                offense: -14,
                defense: 2,
                production: 2,
                food: -10,
                magic: 18,
                market: 0,
                explore: 12,
                industry: -12,
            },
            Self::Dwarf => RaceModifiers {
                offense: 6,
                defense: 16,
                production: 8,
                food: 0,
                magic: -16,
                market: -4,
                explore: -8,
                industry: 12,
            },
            Self::Troll => RaceModifiers {
                offense: 24,
                defense: -10,
                production: -4,
                food: 6,
                magic: -12,
                market: -8,
                explore: 14,
                industry: 0,
            },
            Self::Gnome => RaceModifiers {
                offense: -16,
                defense: 10,
                production: 6,
                food: 0,
                magic: 0,
                market: 10,
                explore: -6,
                industry: 6,
            },
            Self::Gremlin => RaceModifiers {
                offense: 10,
                defense: -6,
                production: -10,
                food: 18,
                magic: -8,
                market: 0,
                explore: 0,
                industry: 0,
            },
            Self::Orc => RaceModifiers {
                offense: 16,
                defense: 0,
                production: -6,
                food: -4,
                magic: -4,
                market: 0,
                explore: 22,
                industry: -10,
            },
            Self::Drow => RaceModifiers {
                offense: 14,
                defense: 6,
                production: -8,
                food: -6,
                magic: 18,
                market: -12,
                explore: -8,
                industry: 0,
            },
            Self::Goblin => RaceModifiers {
                offense: -10,
                defense: -4,
                production: 0,
                food: 0,
                magic: -6,
                market: 8,
                explore: 0,
                industry: 16,
            },
        }
    }
}

impl RaceModifiers {
    #[must_use]
    pub fn multiplier(pct: i32) -> f64 {
        1.0 + f64::from(pct) / 100.0
    }

    #[must_use]
    pub fn offense_mult(self) -> f64 {
        Self::multiplier(self.offense)
    }

    #[must_use]
    pub fn defense_mult(self) -> f64 {
        Self::multiplier(self.defense)
    }

    #[must_use]
    pub fn production_mult(self) -> f64 {
        Self::multiplier(self.production)
    }

    #[must_use]
    pub fn food_mult(self) -> f64 {
        Self::multiplier(self.food)
    }

    #[must_use]
    pub fn magic_mult(self) -> f64 {
        Self::multiplier(self.magic)
    }

    /// Buy-price multiplier; a positive market bonus makes goods cheaper.
    #[must_use]
    pub fn market_mult(self) -> f64 {
        Self::multiplier(-self.market)
    }

    #[must_use]
    pub fn explore_mult(self) -> f64 {
        Self::multiplier(self.explore)
    }

    #[must_use]
    pub fn industry_mult(self) -> f64 {
        Self::multiplier(self.industry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_is_neutral() {
        let mods = Race::Human.modifiers();
        assert!((mods.offense_mult() - 1.0).abs() < f64::EPSILON);
        assert!((mods.magic_mult() - 1.0).abs() < f64::EPSILON);
        assert!((mods.market_mult() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn every_race_has_positive_multipliers() {
        for race in Race::ALL {
            let mods = race.modifiers();
            for mult in [
                mods.offense_mult(),
                mods.defense_mult(),
                mods.production_mult(),
                mods.food_mult(),
                mods.magic_mult(),
                mods.market_mult(),
                mods.explore_mult(),
                mods.industry_mult(),
            ] {
                assert!(mult > 0.5, "{} has a degenerate multiplier", race.key());
            }
        }
    }

    #[test]
    fn market_bonus_lowers_prices() {
        assert!(Race::Gnome.modifiers().market_mult() < 1.0);
        assert!(Race::Drow.modifiers().market_mult() > 1.0);
    }
}
