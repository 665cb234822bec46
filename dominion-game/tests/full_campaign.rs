use dominion_game::{
    ActionError, ActionKind, ActionOutcome, AttackType, BankOp, BuildingCounts, BuildingKind,
    BuiltinCatalog, Catalog, EmpireId, GameEngine, Good, MarketOrder, MemoryStorage, Race,
    SimConfig, SpellKind, TurnParams, WorldState, attack, bank_transaction, build, cast_spell,
    economy_turn, end_round, market_trade, select_draft,
};

type Engine = GameEngine<BuiltinCatalog, MemoryStorage>;

fn new_run(seed: u64, config: SimConfig) -> (Engine, WorldState) {
    let engine = GameEngine::new(BuiltinCatalog, MemoryStorage::new());
    let world = engine
        .create_run("campaign", seed, config, "Campaigner", Race::Dwarf)
        .unwrap();
    (engine, world)
}

fn weakest_open_target(world: &WorldState) -> Option<EmpireId> {
    world
        .roster
        .bots
        .iter()
        .map(|bot| &bot.empire)
        .filter(|empire| !empire.is_eliminated() && !empire.is_protected(world.round))
        .filter(|empire| empire.era == world.player().era)
        .min_by_key(|empire| (empire.networth, empire.id))
        .map(|empire| empire.id)
}

/// One round of a plain player: grow, build on free land, take the
/// occasional swing and then hand over to the bots.
fn play_round(world: &mut WorldState, catalog: &Catalog) {
    if let Some(options) = world.draft_options.clone()
        && let Some(first) = options.first()
    {
        select_draft(world, catalog, first).unwrap();
    }

    if world.player().resources.food < 5_000 {
        market_trade(world, MarketOrder::buy(Good::Food, 2_000)).ok();
    }
    if world.player().resources.gold > 200_000 {
        bank_transaction(world, BankOp::Deposit(50_000)).unwrap();
    }

    if world.player_turns_remaining >= 4 {
        economy_turn(world, ActionKind::Explore, 4, &TurnParams::default()).unwrap();
    }
    let freeland = world.player().resources.freeland;
    if freeland > 0 && world.player_turns_remaining > 0 {
        let mut order = BuildingCounts::default();
        *order.get_mut(BuildingKind::Homes) = freeland / 2;
        *order.get_mut(BuildingKind::Farms) = freeland - freeland / 2;
        build(world, order).unwrap();
    }

    if world.round % 3 == 0
        && let Some(target) = weakest_open_target(world)
    {
        match attack(world, target, AttackType::Standard) {
            Ok(result) => assert!(matches!(result.outcome, ActionOutcome::Attack(_))),
            Err(ActionError::Attack(_)) => {}
            Err(other) => panic!("unexpected attack error: {other}"),
        }
    }

    for action in [ActionKind::Farm, ActionKind::Cash, ActionKind::Industry] {
        let turns = world.player_turns_remaining.min(6);
        if turns <= 0 {
            break;
        }
        economy_turn(world, action, turns, &TurnParams::default()).unwrap();
    }
}

fn assert_world_is_sane(world: &WorldState) {
    for empire in world.roster.empires() {
        assert!(empire.land_invariant_holds(), "{} breaks land", empire.name);
        assert!(empire.resources.gold >= 0, "{} has negative gold", empire.name);
        assert!(empire.resources.food >= 0);
        assert!(empire.resources.runes >= 0);
        assert!(empire.troops.total() >= 0);
        assert!((0..=100).contains(&empire.health));
        assert!((0..=100).contains(&empire.tax_rate));
    }
    assert!(world.player_turns_remaining >= 0);
}

#[test]
fn full_campaign_runs_to_the_round_cap() {
    let config = SimConfig {
        max_rounds: 12,
        draft_interval: 4,
        ..SimConfig::default()
    };
    let (engine, mut world) = new_run(0x00C0_FFEE, config);
    let catalog = engine.catalog().unwrap();
    let mut standings_seen = 0;

    while !world.is_finished() {
        play_round(&mut world, &catalog);
        assert_world_is_sane(&world);
        let ended = end_round(&mut world, &catalog).unwrap();
        let ActionOutcome::RoundEnded(summary) = ended.outcome else {
            panic!("end_round must report a round summary");
        };
        assert_eq!(summary.standings.entries.len(), 6);
        for report in &summary.bots {
            assert!(report.turns_used <= report.turns_budget);
        }
        standings_seen += 1;
        engine.commit(&mut world).unwrap();
        assert_world_is_sane(&world);
    }

    assert_eq!(standings_seen, 12);
    assert_eq!(world.round, 12);
    assert_eq!(
        end_round(&mut world, &catalog).unwrap_err(),
        ActionError::RunFinished
    );
    assert_eq!(
        economy_turn(&mut world, ActionKind::Cash, 1, &TurnParams::default()).unwrap_err(),
        ActionError::RunFinished
    );
    let stored = engine.load_run("campaign").unwrap().unwrap();
    assert_eq!(stored, world);
    assert!(!world.news.is_empty());
    assert!(!world.player().bonuses.advisors.is_empty());
}

#[test]
fn protection_window_shields_everyone_early() {
    let (engine, mut world) = new_run(42, SimConfig::default());
    let catalog = engine.catalog().unwrap();
    let target = world.roster.bots[0].id();
    let err = attack(&mut world, target, AttackType::Standard).unwrap_err();
    assert!(matches!(err, ActionError::Attack(_)));
    let err = cast_spell(&mut world, SpellKind::Spy, Some(target)).unwrap_err();
    assert!(matches!(err, ActionError::Spell(_)));
    assert_eq!(world.player_turns_remaining, 30);

    end_round(&mut world, &catalog).unwrap();
    let summary = world.last_standings.as_ref().unwrap();
    assert_eq!(summary.round, 1);
    for bot in &world.roster.bots {
        assert!(bot.memory.last_attacked_by.is_none(), "nobody can land a hit in round 1");
        assert!(bot.memory.combat.is_empty());
    }
}

#[test]
fn spying_feeds_player_intel() {
    let config = SimConfig {
        protection_rounds: 0,
        ..SimConfig::default()
    };
    let (engine, mut world) = new_run(7, config);
    let catalog = engine.catalog().unwrap();
    world.roster.player.troops.wizards = 20_000;
    world.roster.player.resources.runes = 100_000;
    end_round(&mut world, &catalog).unwrap();

    let target = world
        .roster
        .bots
        .iter()
        .find(|bot| !bot.empire.is_eliminated() && !bot.empire.is_protected(world.round))
        .map(|bot| bot.id());
    let Some(target) = target else {
        return;
    };
    let result = cast_spell(&mut world, SpellKind::Spy, Some(target)).unwrap();
    assert_eq!(result.turns_spent, world.config.spell_turn_cost);
    assert!(result.upkeep.is_some());
    if let ActionOutcome::Spell(spell) = &result.outcome
        && spell.success
    {
        let intel = world.player_intel_on(target).unwrap();
        assert_eq!(intel.round, world.round);
    }
}
