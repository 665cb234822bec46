//! Player entry points.
//!
//! Each action validates against the current `WorldState`, mutates it and
//! reports what happened. A rejected action leaves the world untouched.
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::{BankError, BankOp, BankResult, transact};
use crate::catalog::Catalog;
use crate::combat::{AttackError, AttackParams, AttackType, CombatResult, resolve_attack};
use crate::constants::{
    NEWS_ATTACK_REPELLED, NEWS_ATTACK_WON, NEWS_EMPIRE_ELIMINATED, NEWS_FOOD_DESERTION,
    NEWS_LOAN_HALT, NEWS_SHIELD_RAISED, NEWS_SPELL_FAILED, NEWS_SPELL_SUCCESS,
};
use crate::draft::{self, Acquisition, DraftError};
use crate::economy::{
    ActionKind, EconomyError, EconomyResult, StopReason, TurnParams, build_rate, run_turns,
    run_upkeep_turns,
};
use crate::empire::{BuildingCounts, EmpireId, PLAYER_ID};
use crate::market::{MarketError, MarketOrder, MarketResult, trade};
use crate::round::{RoundSummary, advance_round};
use crate::spells::{
    SpellEffect, SpellError, SpellKind, SpellParams, SpellResult, cast_enemy_spell,
    cast_self_spell,
};
use crate::world::WorldState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("the run has finished")]
    RunFinished,
    #[error("no turns remaining this round")]
    NoTurnsRemaining,
    #[error("requested {requested} turns but only {available} remain")]
    InsufficientTurns { requested: i64, available: i64 },
    #[error("turn count must be positive (got {0})")]
    NonPositiveTurns(i64),
    #[error("no empire with id {0}")]
    UnknownTarget(EmpireId),
    #[error("{0:?} needs a target")]
    MissingTarget(SpellKind),
    #[error("build order is empty")]
    EmptyBuildOrder,
    #[error(transparent)]
    Economy(#[from] EconomyError),
    #[error(transparent)]
    Attack(#[from] AttackError),
    #[error(transparent)]
    Spell(#[from] SpellError),
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Draft(#[from] DraftError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    Economy(EconomyResult),
    Attack(CombatResult),
    Spell(SpellResult),
    Market(MarketResult),
    Bank(BankResult),
    Acquired(Acquisition),
    Rerolled(Vec<String>),
    RoundEnded(RoundSummary),
}

/// Result envelope shared by every player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnActionResult {
    pub round: u32,
    pub turns_spent: i64,
    pub turns_remaining: i64,
    pub outcome: ActionOutcome,
    /// Upkeep paid for the turns an attack or spell consumed
    #[serde(default)]
    pub upkeep: Option<EconomyResult>,
}

fn ensure_active(world: &WorldState) -> Result<(), ActionError> {
    if world.is_finished() {
        return Err(ActionError::RunFinished);
    }
    Ok(())
}

fn ensure_turns(world: &WorldState, requested: i64) -> Result<(), ActionError> {
    ensure_active(world)?;
    if requested <= 0 {
        return Err(ActionError::NonPositiveTurns(requested));
    }
    if world.player_turns_remaining <= 0 {
        return Err(ActionError::NoTurnsRemaining);
    }
    if requested > world.player_turns_remaining {
        return Err(ActionError::InsufficientTurns {
            requested,
            available: world.player_turns_remaining,
        });
    }
    Ok(())
}

fn note_stop(world: &mut WorldState, result: &EconomyResult) {
    let key = match result.stopped_early {
        Some(StopReason::Food) => NEWS_FOOD_DESERTION,
        Some(StopReason::Loan) => NEWS_LOAN_HALT,
        None => return,
    };
    world.news.push(world.round, key, Some(PLAYER_ID), None, "");
}

fn finish(
    world: &mut WorldState,
    turns_spent: i64,
    outcome: ActionOutcome,
    upkeep: Option<EconomyResult>,
) -> TurnActionResult {
    world.player_turns_remaining = (world.player_turns_remaining - turns_spent).max(0);
    world.roster.refresh_networths();
    TurnActionResult {
        round: world.round,
        turns_spent,
        turns_remaining: world.player_turns_remaining,
        outcome,
        upkeep,
    }
}

/// Spend turns on an economic action.
///
/// # Errors
///
/// Returns `ActionError` when the run has finished, the turn count is out of
/// range or the parameters are invalid.
pub fn economy_turn(
    world: &mut WorldState,
    action: ActionKind,
    turns: i64,
    params: &TurnParams,
) -> Result<TurnActionResult, ActionError> {
    ensure_turns(world, turns)?;
    let result = run_turns(&mut world.roster.player, action, turns, params, &mut world.rng)?;
    debug!(
        "player {:?} x{}: spent {}, stop {:?}",
        action, turns, result.turns_spent, result.stopped_early
    );
    note_stop(world, &result);
    let spent = result.turns_spent;
    Ok(finish(world, spent, ActionOutcome::Economy(result), None))
}

/// Queue `order` and spend as many build turns as it needs, capped by the
/// turns remaining.
///
/// # Errors
///
/// Returns `ActionError` for an empty or negative order, a finished run or
/// no turns left.
pub fn build(
    world: &mut WorldState,
    order: BuildingCounts,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    if let Some((kind, value)) = order.first_negative() {
        return Err(EconomyError::NegativeBuildCount { kind, value }.into());
    }
    let total = order.total();
    if total <= 0 {
        return Err(ActionError::EmptyBuildOrder);
    }
    let rate = build_rate(&world.roster.player).max(1);
    let needed = (total + rate - 1) / rate;
    let turns = needed.min(world.player_turns_remaining);
    ensure_turns(world, turns.max(1))?;
    let params = TurnParams {
        buildings: Some(order),
        ..TurnParams::default()
    };
    economy_turn(world, ActionKind::Build, turns, &params)
}

/// Attack another empire.
///
/// # Errors
///
/// Returns `ActionError` for an unknown target or any combat precondition.
pub fn attack(
    world: &mut WorldState,
    target: EmpireId,
    attack_type: AttackType,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let round = world.round;
    let params = AttackParams::new(attack_type, round, world.player_turns_remaining)
        .with_turn_cost(world.config.attack_turn_cost);
    let (player, defender) = world
        .roster
        .pair_mut(PLAYER_ID, target)
        .ok_or(ActionError::UnknownTarget(target))?;
    let result = resolve_attack(player.empire, defender.empire, &params, &mut world.rng)?;
    let upkeep = run_upkeep_turns(player.empire, result.turns_spent, &mut world.rng);
    if let Some(memory) = defender.memory {
        memory.record_attack_received(PLAYER_ID, result.land_taken, round);
    }

    let key = if result.won {
        NEWS_ATTACK_WON
    } else {
        NEWS_ATTACK_REPELLED
    };
    world.news.push(
        round,
        key,
        Some(PLAYER_ID),
        Some(target),
        format!("{:?} attack, {} acres", result.attack_type, result.land_taken),
    );
    if result.defender_eliminated {
        world
            .news
            .push(round, NEWS_EMPIRE_ELIMINATED, Some(PLAYER_ID), Some(target), "");
    }
    note_stop(world, &upkeep);
    let spent = result.turns_spent;
    Ok(finish(world, spent, ActionOutcome::Attack(result), Some(upkeep)))
}

/// Cast a self spell, or an enemy spell on `target`. A successful Spy
/// refreshes the player's intel on the target.
///
/// # Errors
///
/// Returns `ActionError` for a missing or unknown target and any spell
/// precondition.
pub fn cast_spell(
    world: &mut WorldState,
    spell: SpellKind,
    target: Option<EmpireId>,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let round = world.round;
    let params = SpellParams::new(round, world.player_turns_remaining)
        .with_turn_cost(world.config.spell_turn_cost);

    if spell.is_self() {
        let player = &mut world.roster.player;
        let result = cast_self_spell(player, spell, &params)?;
        let upkeep = run_upkeep_turns(player, result.turns_spent, &mut world.rng);
        if spell == SpellKind::Shield {
            world
                .news
                .push(round, NEWS_SHIELD_RAISED, Some(PLAYER_ID), None, "");
        }
        note_stop(world, &upkeep);
        let spent = result.turns_spent;
        return Ok(finish(world, spent, ActionOutcome::Spell(result), Some(upkeep)));
    }

    let target = target.ok_or(ActionError::MissingTarget(spell))?;
    let (caster, victim) = world
        .roster
        .pair_mut(PLAYER_ID, target)
        .ok_or(ActionError::UnknownTarget(target))?;
    let result = cast_enemy_spell(caster.empire, victim.empire, spell, &params, &mut world.rng)?;
    let upkeep = run_upkeep_turns(caster.empire, result.turns_spent, &mut world.rng);
    if spell != SpellKind::Spy
        && let Some(memory) = victim.memory
    {
        memory.record_spell_received(PLAYER_ID, round);
    }
    if let SpellEffect::Intel { snapshot } = &result.effect {
        world.player_intel.insert(target, snapshot.clone());
    }
    let key = if result.success {
        NEWS_SPELL_SUCCESS
    } else {
        NEWS_SPELL_FAILED
    };
    world
        .news
        .push(round, key, Some(PLAYER_ID), Some(target), format!("{spell:?}"));
    note_stop(world, &upkeep);
    let spent = result.turns_spent;
    Ok(finish(world, spent, ActionOutcome::Spell(result), Some(upkeep)))
}

/// Buy or sell on the market at current prices. Costs no turns.
///
/// # Errors
///
/// Returns `ActionError` for a finished run or an empty order.
pub fn market_trade(
    world: &mut WorldState,
    order: MarketOrder,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let result = trade(&mut world.roster.player, &world.market, order)?;
    Ok(finish(world, 0, ActionOutcome::Market(result), None))
}

/// Deposit, withdraw, borrow or repay. Costs no turns.
///
/// # Errors
///
/// Returns `ActionError` for a finished run or a non-positive amount.
pub fn bank_transaction(
    world: &mut WorldState,
    op: BankOp,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let result = transact(&mut world.roster.player, op)?;
    Ok(finish(world, 0, ActionOutcome::Bank(result), None))
}

/// Take an advisor from the open draft.
///
/// # Errors
///
/// See [`draft::select`].
pub fn select_draft(
    world: &mut WorldState,
    catalog: &Catalog,
    id: &str,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let acquired = draft::select(world, catalog, id)?;
    Ok(finish(world, 0, ActionOutcome::Acquired(acquired), None))
}

/// Redraw the open draft's options.
///
/// # Errors
///
/// See [`draft::reroll`].
pub fn reroll_draft(
    world: &mut WorldState,
    catalog: &Catalog,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let options = draft::reroll(world, catalog)?;
    Ok(finish(world, 0, ActionOutcome::Rerolled(options), None))
}

/// Buy a tech from the shop.
///
/// # Errors
///
/// See [`draft::buy`].
pub fn buy_from_shop(
    world: &mut WorldState,
    catalog: &Catalog,
    id: &str,
) -> Result<TurnActionResult, ActionError> {
    ensure_active(world)?;
    let acquired = draft::buy(world, catalog, id)?;
    Ok(finish(world, 0, ActionOutcome::Acquired(acquired), None))
}

/// Forfeit any turns left, let the bots act and open the next round.
///
/// # Errors
///
/// Returns `ActionError::RunFinished` once the run is over.
pub fn end_round(
    world: &mut WorldState,
    catalog: &Catalog,
) -> Result<TurnActionResult, ActionError> {
    let summary = advance_round(world, catalog).ok_or(ActionError::RunFinished)?;
    Ok(TurnActionResult {
        round: world.round,
        turns_spent: 0,
        turns_remaining: world.player_turns_remaining,
        outcome: ActionOutcome::RoundEnded(summary),
        upkeep: None,
    })
}
