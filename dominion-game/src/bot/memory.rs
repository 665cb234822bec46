//! Per-bot memory of opponents.
//!
//! Everything is keyed by opponent id in `BTreeMap`s so iteration order (and
//! therefore every decision derived from it) is stable across runs.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::constants::WEAK_LINE_FACTOR;
use crate::empire::{EmpireId, TroopCounts, TroopKind};
use crate::numbers::{i64_to_f64, u32_to_f64, usize_to_f64};
use crate::spells::IntelSnapshot;

const GRUDGE_PER_ATTACK: f64 = 10.0;
const GRUDGE_PER_SPELL: f64 = 5.0;
const GRUDGE_LAND_DIVISOR: f64 = 100.0;

/// What one opponent has done to this bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentLedger {
    pub attacks_received: u32,
    pub spells_received: u32,
    pub land_lost: i64,
    #[serde(default)]
    pub last_attacked_round: Option<u32>,
}

/// Rolling results of this bot's own attacks on one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatIntel {
    pub wins: u32,
    pub losses: u32,
    pub last_defender_losses: TroopCounts,
    pub cumulative_defender_losses: TroopCounts,
}

impl CombatIntel {
    #[must_use]
    pub const fn attacks(&self) -> u32 {
        self.wins + self.losses
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotMemory {
    #[serde(default)]
    pub ledgers: BTreeMap<EmpireId, OpponentLedger>,
    #[serde(default)]
    pub last_attacked_by: Option<EmpireId>,
    #[serde(default)]
    pub last_attacked_round: Option<u32>,
    #[serde(default)]
    pub combat: BTreeMap<EmpireId, CombatIntel>,
    #[serde(default)]
    pub intel: BTreeMap<EmpireId, IntelSnapshot>,
}

impl BotMemory {
    pub fn record_attack_received(&mut self, from: EmpireId, land_lost: i64, round: u32) {
        let ledger = self.ledgers.entry(from).or_default();
        ledger.attacks_received += 1;
        ledger.land_lost += land_lost.max(0);
        ledger.last_attacked_round = Some(round);
        self.last_attacked_by = Some(from);
        self.last_attacked_round = Some(round);
    }

    pub fn record_spell_received(&mut self, from: EmpireId, _round: u32) {
        self.ledgers.entry(from).or_default().spells_received += 1;
    }

    #[must_use]
    pub fn ledger(&self, id: EmpireId) -> Option<&OpponentLedger> {
        self.ledgers.get(&id)
    }

    /// `10 * attacks + 5 * spells + land_lost / 100`.
    #[must_use]
    pub fn grudge(&self, id: EmpireId) -> f64 {
        self.ledgers.get(&id).map_or(0.0, |ledger| {
            GRUDGE_PER_ATTACK * u32_to_f64(ledger.attacks_received)
                + GRUDGE_PER_SPELL * u32_to_f64(ledger.spells_received)
                + i64_to_f64(ledger.land_lost) / GRUDGE_LAND_DIVISOR
        })
    }

    /// Opponent with the highest positive grudge; ties go to the lowest id.
    #[must_use]
    pub fn top_grudge(&self) -> Option<EmpireId> {
        let mut best: Option<(EmpireId, f64)> = None;
        for id in self.ledgers.keys().copied() {
            let score = self.grudge(id);
            if score <= 0.0 {
                continue;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    /// True when the last recorded attack landed in `round - 1` or later.
    #[must_use]
    pub fn attacked_recently(&self, round: u32) -> bool {
        self.last_attacked_round
            .is_some_and(|last| last >= round.saturating_sub(1))
    }

    pub fn record_combat(&mut self, target: EmpireId, won: bool, defender_losses: &TroopCounts) {
        let intel = self.combat.entry(target).or_default();
        if won {
            intel.wins += 1;
        } else {
            intel.losses += 1;
        }
        intel.last_defender_losses = *defender_losses;
        intel.cumulative_defender_losses.add(defender_losses);
    }

    #[must_use]
    pub fn combat_intel(&self, target: EmpireId) -> Option<&CombatIntel> {
        self.combat.get(&target)
    }

    /// Military lines whose per-attack losses sit below half the per-attack
    /// average across lines. Empty until at least one attack is on record.
    #[must_use]
    pub fn weak_troop_lines(&self, target: EmpireId) -> SmallVec<[TroopKind; 4]> {
        let mut weak = SmallVec::new();
        let Some(intel) = self.combat.get(&target) else {
            return weak;
        };
        let attacks = u32_to_f64(intel.attacks());
        if attacks <= 0.0 {
            return weak;
        }
        let per_attack = |kind: TroopKind| {
            i64_to_f64(intel.cumulative_defender_losses.get(kind)) / attacks
        };
        let lines = TroopKind::MILITARY;
        let average = lines.iter().map(|kind| per_attack(*kind)).sum::<f64>()
            / usize_to_f64(lines.len());
        if average <= 0.0 {
            return weak;
        }
        for kind in lines {
            if per_attack(kind) < average * WEAK_LINE_FACTOR {
                weak.push(kind);
            }
        }
        weak
    }

    /// Store a spy report, keeping whichever snapshot is newer.
    pub fn record_spy(&mut self, snapshot: IntelSnapshot) {
        match self.intel.get(&snapshot.target) {
            Some(existing) if existing.round > snapshot.round => {}
            _ => {
                self.intel.insert(snapshot.target, snapshot);
            }
        }
    }

    /// Intel no older than `window` rounds; stale reports read as absent but
    /// stay stored.
    #[must_use]
    pub fn fresh_intel(&self, target: EmpireId, round: u32, window: u32) -> Option<&IntelSnapshot> {
        self.intel
            .get(&target)
            .filter(|snapshot| snapshot.is_fresh(round, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::empire::Empire;
    use crate::era::Era;
    use crate::race::Race;

    #[test]
    fn grudge_weights_attacks_spells_and_land() {
        let mut memory = BotMemory::default();
        memory.record_attack_received(3, 250, 4);
        memory.record_attack_received(3, 150, 5);
        memory.record_spell_received(3, 5);
        assert!((memory.grudge(3) - (20.0 + 5.0 + 4.0)).abs() < 1e-9);
        assert!(memory.grudge(9).abs() < f64::EPSILON);
        assert_eq!(memory.last_attacked_by, Some(3));
        assert!(memory.attacked_recently(6));
        assert!(!memory.attacked_recently(7));
    }

    #[test]
    fn top_grudge_breaks_ties_toward_lowest_id() {
        let mut memory = BotMemory::default();
        assert_eq!(memory.top_grudge(), None);
        memory.record_spell_received(4, 1);
        memory.record_spell_received(2, 1);
        assert_eq!(memory.top_grudge(), Some(2));
        memory.record_attack_received(4, 0, 2);
        assert_eq!(memory.top_grudge(), Some(4));
    }

    #[test]
    fn weak_lines_follow_per_attack_losses() {
        let mut memory = BotMemory::default();
        assert!(memory.weak_troop_lines(1).is_empty());
        let losses = TroopCounts {
            infantry: 100,
            cavalry: 90,
            aircraft: 10,
            navy: 0,
            wizards: 0,
        };
        memory.record_combat(1, true, &losses);
        memory.record_combat(1, false, &losses);
        let weak = memory.weak_troop_lines(1);
        assert_eq!(weak.as_slice(), &[TroopKind::Aircraft, TroopKind::Navy]);
        let intel = memory.combat_intel(1).unwrap();
        assert_eq!((intel.wins, intel.losses), (1, 1));
        assert_eq!(intel.cumulative_defender_losses.infantry, 200);
    }

    #[test]
    fn spy_reports_keep_newest_and_go_stale() {
        let target = Empire::new(5, "T", Race::Elf, Era::Past);
        let mut memory = BotMemory::default();
        memory.record_spy(IntelSnapshot::capture(&target, 6));
        memory.record_spy(IntelSnapshot::capture(&target, 4));
        assert_eq!(memory.intel[&5].round, 6);
        assert!(memory.fresh_intel(5, 8, 2).is_some());
        assert!(memory.fresh_intel(5, 9, 2).is_none());
        assert!(memory.intel.contains_key(&5));
    }
}
