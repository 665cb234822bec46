//! Advisor drafts and the tech shop.
//!
//! Drafts open every few rounds with a handful of advisors the player does not
//! own yet; one may be taken per draft. The shop lists techs for gold and is
//! restocked with each draft.
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogEntry, EntryKind};
use crate::economy::ActionKind;
use crate::empire::Empire;
use crate::rng::GameRng;
use crate::world::WorldState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("no draft is open")]
    NoDraftOpen,
    #[error("{0} is not among the offered choices")]
    NotOffered(String),
    #[error("unknown catalog entry {0}")]
    UnknownEntry(String),
    #[error("every advisor slot is taken")]
    SlotsFull,
    #[error("no rerolls left for this draft")]
    NoRerollsLeft,
    #[error("{0} is already owned")]
    AlreadyOwned(String),
    #[error("{id} costs {price} gold, only {available} available")]
    InsufficientGold { id: String, price: i64, available: i64 },
    #[error("{0} is not in the shop")]
    NotInStock(String),
}

/// What an acquisition added to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    pub gold_spent: i64,
    pub mastery_raised: Option<ActionKind>,
}

/// Up to `count` entries of `kind` the empire does not own, in shuffled order.
fn draw_unowned(
    catalog: &Catalog,
    kind: EntryKind,
    empire: &Empire,
    count: usize,
    rng: &mut GameRng,
) -> Vec<String> {
    let mut pool: Vec<String> = catalog
        .of_kind(kind)
        .filter(|entry| !empire.bonuses.owns(&entry.id))
        .map(|entry| entry.id.clone())
        .collect();
    rng.shuffle(&mut pool);
    pool.truncate(count);
    pool
}

fn lookup<'a>(
    catalog: &'a Catalog,
    id: &str,
    kind: EntryKind,
) -> Result<&'a CatalogEntry, DraftError> {
    catalog
        .get(id)
        .filter(|entry| entry.kind == kind)
        .ok_or_else(|| DraftError::UnknownEntry(id.to_string()))
}

fn grant(empire: &mut Empire, entry: &CatalogEntry) {
    let effect = entry.to_effect();
    match entry.kind {
        EntryKind::Advisor => empire.bonuses.advisors.push(effect),
        EntryKind::Tech => empire.bonuses.techs.push(effect),
        EntryKind::Edict => {
            empire.bonuses.policies.insert(entry.id.clone());
        }
    }
    if let Some(action) = entry.mastery {
        *empire.bonuses.mastery.entry(action).or_insert(0) += 1;
    }
}

/// Open a draft for the player and restock the shop.
pub fn offer_draft(world: &mut WorldState, catalog: &Catalog) {
    let options = draw_unowned(
        catalog,
        EntryKind::Advisor,
        &world.roster.player,
        world.config.draft_size,
        &mut world.rng,
    );
    debug!("round {} draft offers {:?}", world.round, options);
    world.draft_options = if options.is_empty() {
        None
    } else {
        Some(options)
    };
    world.rerolls_used = 0;
    stock_shop(world, catalog);
}

/// Take one of the offered advisors, closing the draft.
///
/// # Errors
///
/// Returns `DraftError` when no draft is open, the id was not offered, or
/// every advisor slot is full. Nothing changes on error.
pub fn select(
    world: &mut WorldState,
    catalog: &Catalog,
    id: &str,
) -> Result<Acquisition, DraftError> {
    let options = world.draft_options.as_ref().ok_or(DraftError::NoDraftOpen)?;
    if !options.iter().any(|option| option == id) {
        return Err(DraftError::NotOffered(id.to_string()));
    }
    let entry = lookup(catalog, id, EntryKind::Advisor)?;
    let player = &mut world.roster.player;
    if player.bonuses.owns(id) {
        return Err(DraftError::AlreadyOwned(id.to_string()));
    }
    if player.bonuses.free_advisor_slots() == 0 {
        return Err(DraftError::SlotsFull);
    }
    grant(player, entry);
    player.recompute_networth();
    world.draft_options = None;
    Ok(Acquisition {
        id: entry.id.clone(),
        name: entry.name.clone(),
        kind: entry.kind,
        gold_spent: 0,
        mastery_raised: entry.mastery,
    })
}

/// Replace the open draft's options with a fresh draw.
///
/// # Errors
///
/// Returns `DraftError::NoDraftOpen` or `DraftError::NoRerollsLeft`.
pub fn reroll(world: &mut WorldState, catalog: &Catalog) -> Result<Vec<String>, DraftError> {
    if world.draft_options.is_none() {
        return Err(DraftError::NoDraftOpen);
    }
    if world.rerolls_used >= world.config.rerolls_per_draft {
        return Err(DraftError::NoRerollsLeft);
    }
    world.rerolls_used += 1;
    let options = draw_unowned(
        catalog,
        EntryKind::Advisor,
        &world.roster.player,
        world.config.draft_size,
        &mut world.rng,
    );
    world.draft_options = Some(options.clone());
    Ok(options)
}

/// Refill the shop with techs the player does not own.
pub fn stock_shop(world: &mut WorldState, catalog: &Catalog) {
    let stock = draw_unowned(
        catalog,
        EntryKind::Tech,
        &world.roster.player,
        world.config.shop_size,
        &mut world.rng,
    );
    world.shop_stock = if stock.is_empty() { None } else { Some(stock) };
}

/// Buy a tech from the shop.
///
/// # Errors
///
/// Returns `DraftError` when the tech is not stocked, already owned, or
/// unaffordable. Nothing changes on error.
pub fn buy(world: &mut WorldState, catalog: &Catalog, id: &str) -> Result<Acquisition, DraftError> {
    let stocked = world
        .shop_stock
        .as_ref()
        .is_some_and(|stock| stock.iter().any(|item| item == id));
    if !stocked {
        return Err(DraftError::NotInStock(id.to_string()));
    }
    let entry = lookup(catalog, id, EntryKind::Tech)?;
    let player = &mut world.roster.player;
    if player.bonuses.owns(id) {
        return Err(DraftError::AlreadyOwned(id.to_string()));
    }
    if player.resources.gold < entry.price {
        return Err(DraftError::InsufficientGold {
            id: id.to_string(),
            price: entry.price,
            available: player.resources.gold,
        });
    }
    player.resources.gold -= entry.price;
    grant(player, entry);
    player.recompute_networth();
    if let Some(stock) = world.shop_stock.as_mut() {
        stock.retain(|item| item != id);
    }
    Ok(Acquisition {
        id: entry.id.clone(),
        name: entry.name.clone(),
        kind: entry.kind,
        gold_spent: entry.price,
        mastery_raised: entry.mastery,
    })
}
