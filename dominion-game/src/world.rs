//! Run state: the roster of empires plus everything a round needs to resume.
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bot::memory::BotMemory;
use crate::bot::personality::Archetype;
use crate::bot::targeting::TargetView;
use crate::bot::BotEmpire;
use crate::catalog::{Catalog, EntryKind};
use crate::config::SimConfig;
use crate::effects::{AcquiredEffect, EffectKind, Expiry};
use crate::empire::{Empire, EmpireId, PLAYER_ID};
use crate::era::Era;
use crate::market::MarketPrices;
use crate::news::NewsFeed;
use crate::race::Race;
use crate::rng::{GameRng, derive_stream_seed};
use crate::round::RoundStandings;
use crate::spells::IntelSnapshot;

const EDICT_CHANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Player,
    Finished,
}

/// Run-wide edicts drawn at generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunModifiers {
    #[serde(default)]
    pub edicts: Vec<AcquiredEffect>,
}

impl RunModifiers {
    /// Summed magnitude of edicts declaring `kind`.
    #[must_use]
    pub fn magnitude(&self, kind: EffectKind) -> f64 {
        self.edicts
            .iter()
            .filter(|edict| edict.effect == kind)
            .map(|edict| edict.magnitude)
            .sum()
    }
}

/// Mutable access to one side of an attack or spell.
#[derive(Debug)]
pub struct Combatant<'a> {
    pub empire: &'a mut Empire,
    pub memory: Option<&'a mut BotMemory>,
}

impl<'a> Combatant<'a> {
    const fn player(empire: &'a mut Empire) -> Self {
        Self {
            empire,
            memory: None,
        }
    }

    fn bot(bot: &'a mut BotEmpire) -> Self {
        let BotEmpire { empire, memory, .. } = bot;
        Self {
            empire,
            memory: Some(memory),
        }
    }
}

/// The player plus every bot, bots kept in ascending id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub player: Empire,
    pub bots: Vec<BotEmpire>,
}

impl Roster {
    #[must_use]
    pub fn empire(&self, id: EmpireId) -> Option<&Empire> {
        if id == PLAYER_ID {
            return Some(&self.player);
        }
        self.bot(id).map(|bot| &bot.empire)
    }

    pub fn empire_mut(&mut self, id: EmpireId) -> Option<&mut Empire> {
        if id == PLAYER_ID {
            return Some(&mut self.player);
        }
        self.bot_mut(id).map(|bot| &mut bot.empire)
    }

    #[must_use]
    pub fn bot(&self, id: EmpireId) -> Option<&BotEmpire> {
        self.bots.iter().find(|bot| bot.empire.id == id)
    }

    pub fn bot_mut(&mut self, id: EmpireId) -> Option<&mut BotEmpire> {
        self.bots.iter_mut().find(|bot| bot.empire.id == id)
    }

    /// Every empire, player first.
    pub fn empires(&self) -> impl Iterator<Item = &Empire> {
        std::iter::once(&self.player).chain(self.bots.iter().map(|bot| &bot.empire))
    }

    pub fn empires_mut(&mut self) -> impl Iterator<Item = &mut Empire> {
        std::iter::once(&mut self.player).chain(self.bots.iter_mut().map(|bot| &mut bot.empire))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<EmpireId> {
        self.empires().map(|empire| empire.id).collect()
    }

    /// Read-only views of every empire for target scoring.
    #[must_use]
    pub fn views(&self, round: u32) -> Vec<TargetView> {
        self.empires()
            .map(|empire| TargetView::observe(empire, round))
            .collect()
    }

    /// Borrow two distinct empires mutably, with bot memory where present.
    pub fn pair_mut(
        &mut self,
        a: EmpireId,
        b: EmpireId,
    ) -> Option<(Combatant<'_>, Combatant<'_>)> {
        if a == b {
            return None;
        }
        let Self { player, bots } = self;
        if a == PLAYER_ID {
            let bot = bots.iter_mut().find(|bot| bot.empire.id == b)?;
            return Some((Combatant::player(player), Combatant::bot(bot)));
        }
        if b == PLAYER_ID {
            let bot = bots.iter_mut().find(|bot| bot.empire.id == a)?;
            return Some((Combatant::bot(bot), Combatant::player(player)));
        }
        let ia = bots.iter().position(|bot| bot.empire.id == a)?;
        let ib = bots.iter().position(|bot| bot.empire.id == b)?;
        if ia < ib {
            let (left, right) = bots.split_at_mut(ib);
            Some((Combatant::bot(&mut left[ia]), Combatant::bot(&mut right[0])))
        } else {
            let (left, right) = bots.split_at_mut(ia);
            Some((Combatant::bot(&mut right[0]), Combatant::bot(&mut left[ib])))
        }
    }

    /// Recompute networth everywhere and return it keyed by id.
    pub fn refresh_networths(&mut self) -> BTreeMap<EmpireId, i64> {
        self.empires_mut()
            .map(|empire| (empire.id, empire.recompute_networth()))
            .collect()
    }
}

/// Everything persisted between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub version: u64,
    pub run_id: String,
    pub seed: u64,
    pub round: u32,
    #[serde(default)]
    pub phase: RunPhase,
    pub player_turns_remaining: i64,
    pub roster: Roster,
    #[serde(default)]
    pub market: MarketPrices,
    #[serde(default)]
    pub shop_stock: Option<Vec<String>>,
    #[serde(default)]
    pub draft_options: Option<Vec<String>>,
    #[serde(default)]
    pub rerolls_used: u32,
    #[serde(default)]
    pub player_intel: BTreeMap<EmpireId, IntelSnapshot>,
    #[serde(default)]
    pub modifiers: RunModifiers,
    #[serde(default)]
    pub news: NewsFeed,
    /// Next value to draw; every round-time draw comes from here
    pub rng: GameRng,
    #[serde(default)]
    pub config: SimConfig,
    #[serde(default)]
    pub networth_snapshot: BTreeMap<EmpireId, i64>,
    #[serde(default)]
    pub last_standings: Option<RoundStandings>,
}

impl WorldState {
    /// Build a fresh run. Generation draws from a stream derived from `seed`
    /// and separate from the one rounds use, so generation changes never
    /// shift round outcomes.
    #[must_use]
    pub fn generate(
        run_id: impl Into<String>,
        seed: u64,
        config: SimConfig,
        catalog: &Catalog,
        player_name: impl Into<String>,
        player_race: Race,
    ) -> Self {
        let mut gen_rng = GameRng::create(derive_stream_seed(seed, b"world"));

        let mut archetypes = Archetype::ALL;
        gen_rng.shuffle(&mut archetypes);
        let mut bots = Vec::new();
        for (slot, id) in (1..=config.bot_count).enumerate() {
            let archetype = archetypes[slot % archetypes.len()];
            bots.push(BotEmpire::generate(id, archetype, &mut gen_rng));
        }

        let mut player = Empire::new(PLAYER_ID, player_name, player_race, Era::Present);
        let mut modifiers = RunModifiers::default();
        let edicts: Vec<_> = catalog.of_kind(EntryKind::Edict).collect();
        if gen_rng.chance(EDICT_CHANCE)
            && let Some(edict) = gen_rng.pick(&edicts)
        {
            modifiers.edicts.push(edict.to_effect());
        }

        let protection = Expiry::until(config.protection_rounds);
        player.effects.divine_protection = protection;
        for bot in &mut bots {
            bot.empire.effects.divine_protection = protection;
        }

        let mut roster = Roster { player, bots };
        let networth_snapshot = roster.refresh_networths();
        let world = Self {
            version: 0,
            run_id: run_id.into(),
            seed,
            round: 1,
            phase: RunPhase::Player,
            player_turns_remaining: config.turns_per_round,
            roster,
            market: MarketPrices::default(),
            shop_stock: None,
            draft_options: None,
            rerolls_used: 0,
            player_intel: BTreeMap::new(),
            modifiers,
            news: NewsFeed::with_capacity(config.news_capacity),
            rng: GameRng::create(derive_stream_seed(seed, b"rounds")),
            networth_snapshot,
            last_standings: None,
            config,
        };
        info!(
            "generated run {} (seed {}) with {} bots, edicts {:?}",
            world.run_id,
            world.seed,
            world.roster.bots.len(),
            world
                .modifiers
                .edicts
                .iter()
                .map(|edict| edict.id.as_str())
                .collect::<Vec<_>>()
        );
        world
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, RunPhase::Finished)
    }

    #[must_use]
    pub fn player(&self) -> &Empire {
        &self.roster.player
    }

    /// Player intel no older than the configured staleness window.
    #[must_use]
    pub fn player_intel_on(&self, target: EmpireId) -> Option<&IntelSnapshot> {
        self.player_intel
            .get(&target)
            .filter(|snapshot| snapshot.is_fresh(self.round, self.config.spy_staleness_rounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(seed: u64) -> WorldState {
        let catalog = Catalog::builtin().unwrap();
        WorldState::generate(
            "run-test",
            seed,
            SimConfig::default(),
            &catalog,
            "Player",
            Race::Human,
        )
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(world(42), world(42));
        assert_ne!(world(42).roster, world(43).roster);
    }

    #[test]
    fn generated_world_has_protected_starting_empires() {
        let world = world(7);
        assert_eq!(world.round, 1);
        assert_eq!(world.roster.bots.len(), 5);
        let ids = world.roster.ids();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        for empire in world.roster.empires() {
            assert!(empire.is_protected(1));
            assert!(empire.land_invariant_holds());
        }
        assert_eq!(world.player_turns_remaining, 30);
    }

    #[test]
    fn pair_mut_borrows_both_sides() {
        let mut world = world(3);
        {
            let (a, b) = world.roster.pair_mut(4, 2).unwrap();
            assert_eq!((a.empire.id, b.empire.id), (4, 2));
            assert!(a.memory.is_some() && b.memory.is_some());
            a.empire.resources.gold = 1;
            b.empire.resources.gold = 2;
        }
        let (player, bot) = world.roster.pair_mut(0, 5).unwrap();
        assert!(player.memory.is_none());
        assert_eq!(bot.empire.id, 5);
        assert!(world.roster.pair_mut(1, 1).is_none());
        assert!(world.roster.pair_mut(1, 99).is_none());
        assert_eq!(world.roster.empire(4).map(|e| e.resources.gold), Some(1));
        assert_eq!(world.roster.empire(2).map(|e| e.resources.gold), Some(2));
    }

    #[test]
    fn world_state_survives_json() {
        let world = world(11);
        let json = serde_json::to_string(&world).unwrap();
        let back: WorldState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, world);
    }
}
