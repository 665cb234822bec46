//! The bot half of a round.
//!
//! Every living bot runs the same phases in ascending id order, spending a
//! per-round turn budget and drawing from the world's threaded RNG:
//!
//! 0. round reset, run edicts and state selection
//! 1. era (no behaviour yet)
//! 2. land acquisition: exploration, attacks and offensive magic
//! 3. construction
//! 4. production
//! 5. economic management
//! 6. defense
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bot::BotEmpire;
use crate::bot::economic::{EconomicReport, manage_economy};
use crate::bot::personality::Personality;
use crate::bot::state_machine::{BotState, StateInputs, compute_state};
use crate::bot::strategy::StrategyProfile;
use crate::bot::targeting::{AttackerView, score_target, select_target};
use crate::combat::{
    AttackParams, AttackType, CombatResult, defense_power, estimate, offense_power,
    resolve_attack, validate_attack,
};
use crate::config::SimConfig;
use crate::constants::{
    BOT_SHIELD_RUNE_RESERVE, NEWS_ATTACK_REPELLED, NEWS_ATTACK_WON, NEWS_EDICT_TAX,
    NEWS_EMPIRE_ELIMINATED, NEWS_FOOD_DESERTION, NEWS_LOAN_HALT, NEWS_SHIELD_RAISED,
    NEWS_SPELL_FAILED, NEWS_SPELL_SUCCESS, NEWS_TROOPS_LIQUIDATED, SINGLE_LINE_OFFENSE_SHARE,
};
use crate::economy::{
    ActionKind, EconomyResult, StopReason, TurnParams, build_cost, build_rate, run_turns,
    run_upkeep_turns,
};
use crate::effects::EffectKind;
use crate::empire::{BuildingKind, Empire, EmpireId};
use crate::market::MarketPrices;
use crate::news::NewsFeed;
use crate::numbers::{floor_f64_to_i64, i64_to_f64, portion, usize_to_f64};
use crate::rng::GameRng;
use crate::spells::{
    SpellEffect, SpellKind, SpellParams, SpellResult, cast_enemy_spell, cast_self_spell,
    spell_cost, validate_enemy_spell, wizard_power_ratio,
};
use crate::world::{Roster, RunModifiers};

/// Read-only inputs shared by every bot in one round.
#[derive(Debug, Clone, Copy)]
pub struct PhaseContext<'a> {
    pub round: u32,
    pub config: &'a SimConfig,
    pub prices: &'a MarketPrices,
    pub modifiers: &'a RunModifiers,
}

/// What one bot did during its part of the round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotRoundReport {
    pub bot: EmpireId,
    pub state: BotState,
    pub turns_budget: i64,
    pub turns_used: i64,
    pub edict_tax: i64,
    pub land_explored: i64,
    pub attacks: Vec<CombatResult>,
    pub spells: Vec<SpellResult>,
    pub buildings_constructed: i64,
    pub production: Vec<EconomyResult>,
    pub economics: EconomicReport,
    pub shield_cast: bool,
    pub stopped_early: Option<StopReason>,
}

impl BotRoundReport {
    #[must_use]
    pub const fn turns_left(&self) -> i64 {
        self.turns_budget - self.turns_used
    }
}

/// Per-bot data copied out of the roster so the roster can be borrowed
/// mutably while the bot acts.
struct BotPlan {
    id: EmpireId,
    personality: Personality,
    profile: StrategyProfile,
}

/// Run the bot phases for every living bot in ascending id order.
pub fn run_bot_phase(
    roster: &mut Roster,
    ctx: &PhaseContext<'_>,
    news: &mut NewsFeed,
    rng: &mut GameRng,
) -> Vec<BotRoundReport> {
    let mut ids: Vec<EmpireId> = roster.bots.iter().map(BotEmpire::id).collect();
    ids.sort_unstable();
    let mut reports = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(bot) = roster.bot(id) else {
            continue;
        };
        if bot.empire.is_eliminated() {
            continue;
        }
        let plan = BotPlan {
            id,
            personality: bot.personality.clone(),
            profile: bot.strategy(),
        };
        let turn = BotTurn {
            roster: &mut *roster,
            plan: &plan,
            ctx,
            news: &mut *news,
            rng: &mut *rng,
            report: BotRoundReport {
                bot: id,
                ..BotRoundReport::default()
            },
        };
        reports.push(turn.run());
    }
    reports
}

/// One bot's pass through the phases.
struct BotTurn<'a, 'c> {
    roster: &'a mut Roster,
    plan: &'a BotPlan,
    ctx: &'a PhaseContext<'c>,
    news: &'a mut NewsFeed,
    rng: &'a mut GameRng,
    report: BotRoundReport,
}

impl BotTurn<'_, '_> {
    fn run(mut self) -> BotRoundReport {
        let id = self.plan.id;

        // 0. reset, edicts, state
        self.report.edict_tax = self.apply_richest_tax();
        let inputs = state_inputs(self.roster, id, self.ctx.round);
        if let Some(bot) = self.roster.bot_mut(id) {
            bot.empire.round.reset();
            bot.state = compute_state(
                &self.plan.personality,
                &bot.memory,
                &inputs,
                &self.ctx.config.bot_tuning,
            );
            self.report.state = bot.state;
            self.report.turns_budget =
                self.ctx.config.turns_per_round + i64::from(bot.empire.bonuses.bonus_turns);
        }
        debug!(
            "bot {} round {} state {:?} budget {}",
            id, self.ctx.round, self.report.state, self.report.turns_budget
        );

        // 1. era: bots keep their generated era

        // 2. land acquisition
        if self.plan.personality.explore_before_attack {
            self.explore();
            self.attack_loop();
        } else {
            self.attack_loop();
            self.explore();
        }
        if self.plan.profile.uses_magic && !self.plan.personality.offensive_spells.is_empty() {
            self.magic_loop();
        }

        // 3. build
        self.build();

        // 4. production
        self.produce();

        // 5. economic management
        if let Some(bot) = self.roster.bot_mut(id) {
            self.report.economics = manage_economy(
                &mut bot.empire,
                self.ctx.prices,
                &self.plan.profile,
                self.ctx.round,
            );
            let liquidated = self.report.economics.liquidated.total();
            if liquidated > 0 {
                self.news.push(
                    self.ctx.round,
                    NEWS_TROOPS_LIQUIDATED,
                    Some(id),
                    None,
                    format!("{liquidated} troops sold"),
                );
            }
        }

        // 6. defense
        self.raise_shield();

        if let Some(bot) = self.roster.bot_mut(id) {
            bot.empire.recompute_networth();
        }
        self.report
    }

    fn spend(&mut self, turns: i64, upkeep: &EconomyResult) {
        self.report.turns_used += turns.max(0);
        if self.report.stopped_early.is_none() {
            self.report.stopped_early = upkeep.stopped_early;
        }
        let round = self.ctx.round;
        let actor = Some(self.plan.id);
        match upkeep.stopped_early {
            Some(StopReason::Food) => self.news.push(
                round,
                NEWS_FOOD_DESERTION,
                actor,
                None,
                format!(
                    "{} troops and {} peasants deserted",
                    upkeep.deserted_troops.total(),
                    upkeep.deserted_peasants
                ),
            ),
            Some(StopReason::Loan) => self.news.push(round, NEWS_LOAN_HALT, actor, None, ""),
            None => {}
        }
    }

    fn can_act(&self, turn_cost: i64) -> bool {
        self.report.stopped_early.is_none() && self.report.turns_left() >= turn_cost.max(1)
    }

    /// Turns held back for the end-of-round shield.
    fn shield_reserve(&self) -> i64 {
        if self.plan.profile.keeps_shield {
            self.ctx.config.spell_turn_cost
        } else {
            0
        }
    }

    fn apply_richest_tax(&mut self) -> i64 {
        let id = self.plan.id;
        let rate = self.ctx.modifiers.magnitude(EffectKind::RichestBotTax);
        if rate <= 0.0 {
            return 0;
        }
        let richest = self
            .roster
            .bots
            .iter()
            .filter(|bot| !bot.empire.is_eliminated())
            .max_by(|a, b| {
                a.empire
                    .resources
                    .gold
                    .cmp(&b.empire.resources.gold)
                    .then(b.id().cmp(&a.id()))
            })
            .map(BotEmpire::id);
        if richest != Some(id) {
            return 0;
        }
        let Some(empire) = self.roster.empire_mut(id) else {
            return 0;
        };
        let tax = portion(empire.resources.gold, rate);
        empire.resources.gold -= tax;
        if tax > 0 {
            self.news
                .push(self.ctx.round, NEWS_EDICT_TAX, Some(id), None, format!("{tax} gold"));
        }
        tax
    }

    /// Run `turns` of `action`, booking the turns and any stop reason.
    fn run_action(
        &mut self,
        action: ActionKind,
        turns: i64,
        params: &TurnParams,
    ) -> Option<EconomyResult> {
        if turns <= 0 || self.report.stopped_early.is_some() {
            return None;
        }
        let empire = self.roster.empire_mut(self.plan.id)?;
        match run_turns(empire, action, turns, params, self.rng) {
            Ok(result) => {
                self.spend(result.turns_spent, &result);
                Some(result)
            }
            Err(err) => {
                warn!("bot {} {:?} rejected: {err}", self.plan.id, action);
                None
            }
        }
    }

    fn explore(&mut self) {
        let turns = self.plan.profile.explore_turns.min(self.report.turns_left());
        if let Some(result) = self.run_action(ActionKind::Explore, turns, &TurnParams::default()) {
            self.report.land_explored += result.land_gained;
        }
    }

    fn attack_loop(&mut self) {
        let id = self.plan.id;
        let round = self.ctx.round;
        while self.can_act(self.ctx.config.attack_turn_cost) {
            let Some((target, params)) =
                plan_attack(self.roster, self.plan, self.ctx, self.report.turns_left())
            else {
                break;
            };
            let Some((attacker, defender)) = self.roster.pair_mut(id, target) else {
                break;
            };
            let result = match resolve_attack(attacker.empire, defender.empire, &params, self.rng)
            {
                Ok(result) => result,
                Err(err) => {
                    warn!("bot {id} attack on {target} rejected: {err}");
                    break;
                }
            };
            let upkeep = run_upkeep_turns(attacker.empire, result.turns_spent, self.rng);
            if let Some(memory) = attacker.memory {
                memory.record_combat(target, result.won, &result.defender_losses);
            }
            if let Some(memory) = defender.memory {
                memory.record_attack_received(id, result.land_taken, round);
            }

            let key = if result.won {
                NEWS_ATTACK_WON
            } else {
                NEWS_ATTACK_REPELLED
            };
            self.news.push(
                round,
                key,
                Some(id),
                Some(target),
                format!("{:?} attack, {} acres", result.attack_type, result.land_taken),
            );
            if result.defender_eliminated {
                self.news
                    .push(round, NEWS_EMPIRE_ELIMINATED, Some(id), Some(target), "");
            }
            self.spend(result.turns_spent, &upkeep);

            let keep_going = result.won && !result.defender_eliminated;
            self.report.attacks.push(result);
            if !keep_going {
                break;
            }
        }
    }

    fn magic_loop(&mut self) {
        let id = self.plan.id;
        let round = self.ctx.round;
        let turn_cost = self.ctx.config.spell_turn_cost;
        while self.can_act(turn_cost) {
            let Some(bot) = self.roster.bot(id) else {
                break;
            };
            if bot.empire.round.offensive_spells >= self.ctx.config.max_spells_per_round
                || matches!(bot.state, BotState::Developing | BotState::Defensive)
            {
                break;
            }
            let Some(target) = pick_target(self.roster, bot, self.ctx) else {
                break;
            };
            let Some(defender) = self.roster.empire(target) else {
                break;
            };
            let Some(spell) = choose_spell(bot, defender, self.plan, self.ctx) else {
                break;
            };
            let params = SpellParams::new(round, self.report.turns_left())
                .with_turn_cost(turn_cost)
                .with_cross_era(true);
            if let Err(err) = validate_enemy_spell(&bot.empire, defender, spell, &params) {
                debug!("bot {id} skips {spell:?} on {target}: {err}");
                break;
            }

            let Some((caster, victim)) = self.roster.pair_mut(id, target) else {
                break;
            };
            let result =
                match cast_enemy_spell(caster.empire, victim.empire, spell, &params, self.rng) {
                    Ok(result) => result,
                    Err(err) => {
                        warn!("bot {id} {spell:?} on {target} rejected: {err}");
                        break;
                    }
                };
            let upkeep = run_upkeep_turns(caster.empire, result.turns_spent, self.rng);
            if let (Some(memory), SpellEffect::Intel { snapshot }) = (caster.memory, &result.effect)
            {
                memory.record_spy(snapshot.clone());
            }
            if spell != SpellKind::Spy
                && let Some(memory) = victim.memory
            {
                memory.record_spell_received(id, round);
            }
            let key = if result.success {
                NEWS_SPELL_SUCCESS
            } else {
                NEWS_SPELL_FAILED
            };
            self.news
                .push(round, key, Some(id), Some(target), format!("{spell:?}"));
            self.spend(result.turns_spent, &upkeep);

            let landed = result.success;
            self.report.spells.push(result);
            if !landed {
                break;
            }
        }
    }

    fn build(&mut self) {
        let Some(empire) = self.roster.empire(self.plan.id) else {
            return;
        };
        let mut order = self.plan.profile.build_plan(empire.resources.freeland);
        let wanted = order.total();
        if wanted <= 0 {
            return;
        }
        let spend = i64_to_f64(empire.resources.gold.max(0))
            * self.plan.profile.spending_aggression(self.ctx.round);
        let affordable = floor_f64_to_i64(spend / i64_to_f64(build_cost(empire).max(1)));
        if affordable <= 0 {
            return;
        }
        if affordable < wanted {
            let scale = i64_to_f64(affordable) / i64_to_f64(wanted);
            for kind in BuildingKind::ALL {
                let scaled = floor_f64_to_i64(i64_to_f64(order.get(kind)) * scale);
                *order.get_mut(kind) = scaled;
            }
        }
        let total = order.total();
        let rate = build_rate(empire).max(1);
        let turns = ((total + rate - 1) / rate)
            .min(self.report.turns_left() - self.shield_reserve());
        let params = TurnParams {
            buildings: Some(order),
            ..TurnParams::default()
        };
        if let Some(result) = self.run_action(ActionKind::Build, turns, &params) {
            self.report.buildings_constructed += result.buildings_constructed.total();
        }
    }

    fn produce(&mut self) {
        let available = self.report.turns_left() - self.shield_reserve();
        let plan = self
            .plan
            .profile
            .allocate_production(&self.plan.personality, available);
        for (action, turns) in plan {
            if let Some(result) = self.run_action(action, turns, &TurnParams::default()) {
                self.report.production.push(result);
            }
        }
    }

    fn raise_shield(&mut self) {
        let id = self.plan.id;
        let round = self.ctx.round;
        if !self.plan.profile.keeps_shield || !self.can_act(self.ctx.config.spell_turn_cost) {
            return;
        }
        let Some(empire) = self.roster.empire_mut(id) else {
            return;
        };
        if empire.is_shielded(round) {
            return;
        }
        let cost = spell_cost(empire, SpellKind::Shield);
        if i64_to_f64(empire.resources.runes) < i64_to_f64(cost) * BOT_SHIELD_RUNE_RESERVE {
            debug!("bot {id} cannot spare runes for a shield");
            return;
        }
        let params = SpellParams::new(round, self.report.turns_left())
            .with_turn_cost(self.ctx.config.spell_turn_cost);
        match cast_self_spell(empire, SpellKind::Shield, &params) {
            Ok(result) => {
                let upkeep = run_upkeep_turns(empire, result.turns_spent, self.rng);
                self.spend(result.turns_spent, &upkeep);
                self.report.shield_cast = true;
                self.news.push(round, NEWS_SHIELD_RAISED, Some(id), None, "");
                self.report.spells.push(result);
            }
            Err(err) => debug!("bot {id} shield skipped: {err}"),
        }
    }
}

fn state_inputs(roster: &Roster, id: EmpireId, round: u32) -> StateInputs {
    let mut inputs = StateInputs {
        round,
        ..StateInputs::default()
    };
    let mut rival_total = 0.0;
    let mut rivals = 0_usize;
    for empire in roster.empires().filter(|empire| !empire.is_eliminated()) {
        let offense = offense_power(empire, AttackType::Standard, 0.0);
        if empire.id == id {
            inputs.own_offense = offense;
            inputs.own_defense = defense_power(empire, round);
        } else {
            inputs.strongest_rival_offense = inputs.strongest_rival_offense.max(offense);
            rival_total += offense;
            rivals += 1;
        }
    }
    if rivals > 0 {
        inputs.field_average_offense = rival_total / usize_to_f64(rivals);
    }
    inputs
}

/// Single-line attack along a line the target keeps losing little of,
/// when that line carries enough of the bot's own offense.
fn choose_attack_type(bot: &BotEmpire, target: EmpireId) -> AttackType {
    let full = offense_power(&bot.empire, AttackType::Standard, 0.0);
    if full <= 0.0 {
        return AttackType::Standard;
    }
    for kind in bot.memory.weak_troop_lines(target) {
        if let Some(line) = AttackType::for_line(kind)
            && offense_power(&bot.empire, line, 0.0) >= full * SINGLE_LINE_OFFENSE_SHARE
        {
            return line;
        }
    }
    AttackType::Standard
}

fn attacker_view(bot: &BotEmpire) -> AttackerView<'_> {
    AttackerView {
        id: bot.id(),
        era: bot.empire.era,
        offense: offense_power(&bot.empire, AttackType::Standard, 0.0),
        cross_era: true,
        personality: &bot.personality,
        memory: &bot.memory,
    }
}

/// Target for the next hostile act: the top grudge when retaliating and
/// still reachable, the best-scoring candidate otherwise.
fn pick_target(roster: &Roster, bot: &BotEmpire, ctx: &PhaseContext<'_>) -> Option<EmpireId> {
    let views = roster.views(ctx.round);
    let tuning = &ctx.config.bot_tuning;
    let me = attacker_view(bot);
    let grudge = if bot.state == BotState::Retaliating {
        bot.memory.top_grudge().filter(|target| {
            views
                .iter()
                .any(|view| view.id == *target && score_target(&me, view, None, tuning) > 0.0)
        })
    } else {
        None
    };
    grudge.or_else(|| select_target(&me, &views, tuning))
}

fn plan_attack(
    roster: &Roster,
    plan: &BotPlan,
    ctx: &PhaseContext<'_>,
    turns_left: i64,
) -> Option<(EmpireId, AttackParams)> {
    let bot = roster.bot(plan.id)?;
    let target = pick_target(roster, bot, ctx)?;
    let defender = roster.empire(target)?;
    let params = AttackParams::new(choose_attack_type(bot, target), ctx.round, turns_left)
        .with_turn_cost(ctx.config.attack_turn_cost)
        .with_cross_era(true);
    if let Err(err) = validate_attack(&bot.empire, defender, &params) {
        debug!("bot {} skips attack on {}: {err}", plan.id, target);
        return None;
    }
    let preview = estimate(&bot.empire, defender, &params);
    let allowed = plan.profile.allows_attack(
        &plan.personality,
        bot.state,
        ctx.round,
        bot.empire.health,
        preview.ratio,
        bot.empire.round.attacks,
    );
    if !allowed {
        debug!(
            "bot {} holds off {} (ratio {:.2}, state {:?})",
            plan.id, target, preview.ratio, bot.state
        );
        return None;
    }
    Some((target, params))
}

/// Spy when intel is stale, otherwise the first preferred spell the wizard
/// ratio clears and the runes cover.
fn choose_spell(
    bot: &BotEmpire,
    target: &Empire,
    plan: &BotPlan,
    ctx: &PhaseContext<'_>,
) -> Option<SpellKind> {
    if bot
        .memory
        .fresh_intel(target.id, ctx.round, ctx.config.spy_staleness_rounds)
        .is_none()
    {
        return Some(SpellKind::Spy);
    }
    let ratio = wizard_power_ratio(&bot.empire, target);
    plan.personality.offensive_spells.iter().copied().find(|spell| {
        spell.threshold().is_some_and(|threshold| ratio > threshold)
            && spell_cost(&bot.empire, *spell) <= bot.empire.resources.runes
    })
}
