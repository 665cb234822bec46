//! Dominion Game Engine
//!
//! Deterministic core of a seeded empire-building simulation: economy,
//! combat, magic and rule-based rival empires. The crate holds no UI,
//! transport or storage engine; those plug in through the traits below.

pub mod actions;
pub mod bank;
pub mod bot;
pub mod catalog;
pub mod combat;
pub mod config;
pub mod constants;
pub mod draft;
pub mod economy;
pub mod effects;
pub mod empire;
pub mod era;
pub mod market;
pub mod news;
pub mod numbers;
pub mod race;
pub mod rng;
pub mod round;
pub mod seed;
pub mod spells;
pub mod storage;
pub mod world;

// Re-export commonly used types
pub use actions::{
    ActionError, ActionOutcome, TurnActionResult, attack, bank_transaction, build,
    buy_from_shop, cast_spell, economy_turn, end_round, market_trade, reroll_draft,
    select_draft,
};
pub use bank::{BankError, BankOp, BankResult};
pub use bot::{Archetype, BotEmpire, BotMemory, BotRoundReport, BotState, Personality};
pub use catalog::{Catalog, CatalogEntry, EntryKind};
pub use combat::{AttackError, AttackParams, AttackPreview, AttackType, CombatResult};
pub use config::{BotTuning, ConfigError, SimConfig};
pub use draft::{Acquisition, DraftError};
pub use economy::{ActionKind, EconomyError, EconomyResult, StopReason, TurnParams};
pub use effects::{AcquiredEffect, EffectKind, Expiry};
pub use empire::{
    BuildingCounts, BuildingKind, Empire, EmpireId, IndustryAllocation, PLAYER_ID, TroopCounts,
    TroopKind,
};
pub use era::Era;
pub use market::{Good, MarketError, MarketOrder, MarketPrices, MarketResult, Side};
pub use news::{NewsEntry, NewsFeed};
pub use race::Race;
pub use rng::GameRng;
pub use round::{RoundStandings, RoundSummary, StandingEntry, advance_round};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy, parse_seed};
pub use spells::{IntelSnapshot, SpellEffect, SpellError, SpellKind, SpellParams, SpellResult};
pub use storage::{MemoryStorage, StorageError, WorldStorage};
pub use world::{Roster, RunModifiers, RunPhase, WorldState};

/// Source of the static content catalog.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the advisor, tech and edict catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or parsed.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loader for the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl CatalogLoader for BuiltinCatalog {
    type Error = serde_json::Error;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::builtin()
    }
}

/// Ties a catalog source to a run store.
pub struct GameEngine<L, S>
where
    L: CatalogLoader,
    S: WorldStorage,
{
    loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: CatalogLoader,
    S: WorldStorage,
{
    pub const fn new(loader: L, storage: S) -> Self {
        Self { loader, storage }
    }

    /// Load the catalog from the configured source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn catalog(&self) -> Result<Catalog, L::Error> {
        self.loader.load_catalog()
    }

    /// Generate a new run and store its first version.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the catalog cannot
    /// be loaded or the run id is already taken.
    pub fn create_run(
        &self,
        run_id: &str,
        seed: u64,
        config: SimConfig,
        player_name: &str,
        player_race: Race,
    ) -> Result<WorldState, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        config.validate()?;
        let catalog = self.loader.load_catalog().map_err(Into::into)?;
        let mut world =
            WorldState::generate(run_id, seed, config, &catalog, player_name, player_race);
        world.version = self.storage.store(&world, 0).map_err(Into::into)?;
        Ok(world)
    }

    /// Load a stored run.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state cannot be read.
    pub fn load_run(&self, run_id: &str) -> Result<Option<WorldState>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        self.storage.load(run_id).map_err(Into::into)
    }

    /// Store `world` over the version it was loaded at and advance its
    /// version on success.
    ///
    /// # Errors
    ///
    /// Returns the store's error, a version conflict included, leaving
    /// `world` unchanged.
    pub fn commit(&self, world: &mut WorldState) -> Result<u64, S::Error> {
        let version = self.storage.store(world, world.version)?;
        world.version = version;
        Ok(version)
    }
}
