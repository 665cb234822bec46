//! Attack target selection.
//!
//! Candidates are scored from personality, memory and a read-only view of
//! every empire. The highest positive score wins; ties go to the lowest id.
use serde::{Deserialize, Serialize};

use crate::bot::memory::BotMemory;
use crate::bot::personality::Personality;
use crate::combat::{AttackType, defense_power, offense_power};
use crate::config::BotTuning;
use crate::empire::{Empire, EmpireId};
use crate::era::{Era, eras_compatible};
use crate::numbers::{i64_to_f64, u32_to_f64};

/// What a bot can see of another empire when choosing a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub id: EmpireId,
    pub is_player: bool,
    pub era: Era,
    pub offense: f64,
    pub defense: f64,
    pub gold: i64,
    pub networth: i64,
    pub eliminated: bool,
    pub protected: bool,
}

impl TargetView {
    #[must_use]
    pub fn observe(empire: &Empire, round: u32) -> Self {
        Self {
            id: empire.id,
            is_player: empire.is_player(),
            era: empire.era,
            offense: offense_power(empire, AttackType::Standard, 0.0),
            defense: defense_power(empire, round),
            gold: empire.resources.gold,
            networth: empire.networth,
            eliminated: empire.is_eliminated(),
            protected: empire.is_protected(round),
        }
    }
}

/// The choosing bot's side of the comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackerView<'a> {
    pub id: EmpireId,
    pub era: Era,
    pub offense: f64,
    /// Ignore era boundaries; bots reach every era innately
    pub cross_era: bool,
    pub personality: &'a Personality,
    pub memory: &'a BotMemory,
}

/// Score one candidate; excluded candidates score 0.
#[must_use]
pub fn score_target(
    attacker: &AttackerView<'_>,
    candidate: &TargetView,
    leader: Option<EmpireId>,
    tuning: &BotTuning,
) -> f64 {
    if candidate.id == attacker.id || candidate.eliminated || candidate.protected {
        return 0.0;
    }
    if !eras_compatible(attacker.era, candidate.era, attacker.cross_era) {
        return 0.0;
    }
    let ratio = if candidate.defense > 0.0 {
        attacker.offense / candidate.defense
    } else {
        f64::MAX
    };
    if ratio < tuning.min_power_ratio {
        return 0.0;
    }

    let mut score = 0.0;
    if candidate.is_player {
        score += attacker.personality.player_bias;
    }
    if let Some(ledger) = attacker.memory.ledger(candidate.id) {
        score += tuning.grudge_per_attack * u32_to_f64(ledger.attacks_received);
        score += tuning.grudge_per_spell * u32_to_f64(ledger.spells_received);
    }
    if candidate.era == attacker.era {
        score += tuning.same_era_bonus;
    }
    if attacker.offense >= tuning.weak_target_ratio * candidate.defense {
        score += tuning.weak_target_bonus;
    }
    if attacker.personality.wealth_seeking && candidate.gold > 1 {
        score += tuning.wealth_factor * i64_to_f64(candidate.gold).log10();
    }
    if leader == Some(candidate.id) {
        score *= tuning.leader_multiplier;
    }
    score
}

/// Empire holding the highest networth; ties go to the lowest id.
#[must_use]
pub fn networth_leader(views: &[TargetView]) -> Option<EmpireId> {
    let mut leader: Option<&TargetView> = None;
    for view in views.iter().filter(|view| !view.eliminated) {
        let better = leader.is_none_or(|best| {
            view.networth > best.networth || (view.networth == best.networth && view.id < best.id)
        });
        if better {
            leader = Some(view);
        }
    }
    leader.map(|view| view.id)
}

/// Best-scoring target, or `None` when nothing scores above 0.
#[must_use]
pub fn select_target(
    attacker: &AttackerView<'_>,
    views: &[TargetView],
    tuning: &BotTuning,
) -> Option<EmpireId> {
    let leader = networth_leader(views);
    let mut best: Option<(EmpireId, f64)> = None;
    for view in views {
        let score = score_target(attacker, view, leader, tuning);
        if score <= 0.0 {
            continue;
        }
        let better = best.is_none_or(|(id, top)| score > top || (score == top && view.id < id));
        if better {
            best = Some((view.id, score));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::personality::Archetype;

    fn view(id: EmpireId, defense: f64) -> TargetView {
        TargetView {
            id,
            is_player: id == 0,
            era: Era::Present,
            offense: 1_000.0,
            defense,
            gold: 100_000,
            networth: 10_000,
            eliminated: false,
            protected: false,
        }
    }

    fn attacker<'a>(personality: &'a Personality, memory: &'a BotMemory) -> AttackerView<'a> {
        AttackerView {
            id: 1,
            era: Era::Present,
            offense: 1_000.0,
            cross_era: false,
            personality,
            memory,
        }
    }

    #[test]
    fn exclusions_score_zero() {
        let tuning = BotTuning::default();
        let personality = Archetype::Conqueror.personality();
        let memory = BotMemory::default();
        let me = attacker(&personality, &memory);
        assert!(score_target(&me, &view(1, 100.0), None, &tuning).abs() < f64::EPSILON);
        let mut gone = view(2, 100.0);
        gone.eliminated = true;
        assert!(score_target(&me, &gone, None, &tuning).abs() < f64::EPSILON);
        let mut shielded = view(3, 100.0);
        shielded.protected = true;
        assert!(score_target(&me, &shielded, None, &tuning).abs() < f64::EPSILON);
        let mut far = view(4, 100.0);
        far.era = Era::Future;
        assert!(score_target(&me, &far, None, &tuning).abs() < f64::EPSILON);
        assert!(score_target(&me, &view(5, 5_000.0), None, &tuning).abs() < f64::EPSILON);
    }

    #[test]
    fn cross_era_attackers_reach_every_era() {
        let tuning = BotTuning::default();
        let personality = Archetype::Conqueror.personality();
        let memory = BotMemory::default();
        let mut me = attacker(&personality, &memory);
        me.cross_era = true;
        let mut far = view(0, 100.0);
        far.era = Era::Past;
        let near = view(0, 100.0);
        let far_score = score_target(&me, &far, None, &tuning);
        let near_score = score_target(&me, &near, None, &tuning);
        assert!(far_score > 0.0);
        assert!((near_score - far_score - tuning.same_era_bonus).abs() < 1e-9);
    }

    #[test]
    fn player_bias_grudge_and_leader_shape_the_score() {
        let tuning = BotTuning::default();
        let personality = Archetype::Conqueror.personality();
        let mut memory = BotMemory::default();
        memory.record_attack_received(3, 10, 1);
        let me = attacker(&personality, &memory);
        let player = score_target(&me, &view(0, 1_000.0), None, &tuning);
        assert!((player - (4.0 + 3.0)).abs() < 1e-9);
        let grudge = score_target(&me, &view(3, 1_000.0), None, &tuning);
        assert!((grudge - (8.0 + 3.0)).abs() < 1e-9);
        let weak_leader = score_target(&me, &view(2, 500.0), Some(2), &tuning);
        assert!((weak_leader - (3.0 + 6.0) * 1.25).abs() < 1e-9);
    }

    #[test]
    fn selection_prefers_highest_then_lowest_id() {
        let tuning = BotTuning::default();
        let personality = Archetype::Explorer.personality();
        let memory = BotMemory::default();
        let me = attacker(&personality, &memory);
        let views = [view(4, 1_000.0), view(2, 1_000.0), view(1, 10.0)];
        assert_eq!(select_target(&me, &views, &tuning), Some(2));
        assert_eq!(select_target(&me, &[], &tuning), None);
    }

    #[test]
    fn leader_ignores_eliminated_empires() {
        let mut rich = view(3, 10.0);
        rich.networth = 99_999;
        rich.eliminated = true;
        let mut second = view(5, 10.0);
        second.networth = 50_000;
        assert_eq!(networth_leader(&[rich, second, view(2, 1.0)]), Some(5));
    }
}
