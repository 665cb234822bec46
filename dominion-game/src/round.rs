//! Round driver: bots act, standings are published and the next round opens.
use log::info;
use serde::{Deserialize, Serialize};

use crate::bot::{BotRoundReport, run_bot_phase};
use crate::bot::phases::PhaseContext;
use crate::catalog::Catalog;
use crate::draft::offer_draft;
use crate::empire::EmpireId;
use crate::world::{RunPhase, WorldState};

/// One empire's line in the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub id: EmpireId,
    pub name: String,
    pub networth: i64,
    /// Change since the previous round's standings
    pub delta: i64,
    pub eliminated: bool,
    /// 1-based, by networth descending then id ascending
    pub rank: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStandings {
    pub round: u32,
    pub entries: Vec<StandingEntry>,
}

impl RoundStandings {
    #[must_use]
    pub fn leader(&self) -> Option<&StandingEntry> {
        self.entries.iter().find(|entry| !entry.eliminated)
    }

    #[must_use]
    pub fn rank_of(&self, id: EmpireId) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.rank)
    }
}

/// Everything that happened between the player's end-of-round and the next
/// round opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub bots: Vec<BotRoundReport>,
    pub standings: RoundStandings,
    pub draft_opened: bool,
    pub finished: bool,
}

fn build_standings(world: &mut WorldState) -> RoundStandings {
    let networths = world.roster.refresh_networths();
    let mut entries: Vec<StandingEntry> = world
        .roster
        .empires()
        .map(|empire| {
            let networth = networths.get(&empire.id).copied().unwrap_or(empire.networth);
            let previous = world
                .networth_snapshot
                .get(&empire.id)
                .copied()
                .unwrap_or(networth);
            StandingEntry {
                id: empire.id,
                name: empire.name.clone(),
                networth,
                delta: networth - previous,
                eliminated: empire.is_eliminated(),
                rank: 0,
            }
        })
        .collect();
    entries.sort_by(|a, b| b.networth.cmp(&a.networth).then(a.id.cmp(&b.id)));
    for (rank, entry) in (1..).zip(entries.iter_mut()) {
        entry.rank = rank;
    }
    world.networth_snapshot = networths;
    RoundStandings {
        round: world.round,
        entries,
    }
}

/// Run the bot phase for the current round, publish standings and open the
/// next round for the player. Finished runs are left untouched.
pub fn advance_round(world: &mut WorldState, catalog: &Catalog) -> Option<RoundSummary> {
    if world.is_finished() {
        return None;
    }
    let round = world.round;
    let ctx = PhaseContext {
        round,
        config: &world.config,
        prices: &world.market,
        modifiers: &world.modifiers,
    };
    let bots = run_bot_phase(&mut world.roster, &ctx, &mut world.news, &mut world.rng);
    let standings = build_standings(world);
    world.last_standings = Some(standings.clone());

    let finished = round >= world.config.max_rounds
        || world.roster.player.is_eliminated()
        || world.roster.bots.iter().all(|bot| bot.empire.is_eliminated());
    let mut draft_opened = false;
    if finished {
        world.phase = RunPhase::Finished;
        world.player_turns_remaining = 0;
        world.draft_options = None;
    } else {
        world.round += 1;
        let next = world.round;
        for empire in world.roster.empires_mut() {
            empire.begin_round(next);
        }
        world.player_turns_remaining = world.config.turns_per_round
            + i64::from(world.roster.player.bonuses.bonus_turns);
        world.market.drift(&mut world.rng);
        if world.config.draft_interval > 0 && next % world.config.draft_interval == 0 {
            offer_draft(world, catalog);
            draft_opened = world.draft_options.is_some();
        }
    }

    info!(
        "round {} closed; leader {:?}; {}",
        round,
        standings.leader().map(|entry| entry.id),
        if finished { "run finished" } else { "next round open" }
    );
    Some(RoundSummary {
        round,
        bots,
        standings,
        draft_opened,
        finished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::race::Race;

    fn world(seed: u64, config: SimConfig) -> (WorldState, Catalog) {
        let catalog = Catalog::builtin().unwrap();
        let world = WorldState::generate("round-test", seed, config, &catalog, "Player", Race::Elf);
        (world, catalog)
    }

    #[test]
    fn advancing_opens_the_next_round() {
        let (mut world, catalog) = world(8, SimConfig::default());
        world.player_turns_remaining = 0;
        world.roster.player.round.attacks = 2;
        let summary = advance_round(&mut world, &catalog).unwrap();
        assert_eq!(summary.round, 1);
        assert_eq!(summary.bots.len(), 5);
        assert!(!summary.finished);
        assert_eq!(world.round, 2);
        assert_eq!(world.player_turns_remaining, 30);
        assert_eq!(world.roster.player.round.attacks, 0);
        assert_eq!(world.last_standings.as_ref(), Some(&summary.standings));
    }

    #[test]
    fn standings_are_ranked_by_networth() {
        let (mut world, catalog) = world(12, SimConfig::default());
        let summary = advance_round(&mut world, &catalog).unwrap();
        let entries = &summary.standings.entries;
        assert_eq!(entries.len(), 6);
        for pair in entries.windows(2) {
            assert!(pair[0].networth >= pair[1].networth);
            assert_eq!(pair[0].rank + 1, pair[1].rank);
        }
        for entry in entries {
            let empire = world.roster.empire(entry.id).unwrap();
            assert_eq!(entry.networth, empire.networth);
        }
    }

    #[test]
    fn drafts_open_on_the_interval() {
        let config = SimConfig {
            draft_interval: 2,
            ..SimConfig::default()
        };
        let (mut world, catalog) = world(3, config);
        let first = advance_round(&mut world, &catalog).unwrap();
        assert!(first.draft_opened);
        assert!(world.draft_options.is_some());
        let second = advance_round(&mut world, &catalog).unwrap();
        assert!(!second.draft_opened);
    }

    #[test]
    fn run_finishes_at_the_round_cap() {
        let config = SimConfig {
            max_rounds: 2,
            ..SimConfig::default()
        };
        let (mut world, catalog) = world(5, config);
        assert!(!advance_round(&mut world, &catalog).unwrap().finished);
        let last = advance_round(&mut world, &catalog).unwrap();
        assert!(last.finished);
        assert!(world.is_finished());
        assert_eq!(world.round, 2);
        assert!(advance_round(&mut world, &catalog).is_none());
    }
}
