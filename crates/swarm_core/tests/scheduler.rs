//! Production scheduling against a fake world.

use swarm_core::prelude::*;
use swarm_test_utils::fixtures::{point, FakeWorld, RecordingSink};
use swarm_test_utils::init_tracing;

fn quiet_config() -> AgentConfig {
    AgentConfig {
        opening: Vec::new(),
        ..AgentConfig::default()
    }
}

fn started(config: AgentConfig, world: &FakeWorld) -> Agent {
    init_tracing();
    let mut agent = Agent::new(config);
    agent.on_game_start(world);
    agent
}

fn step(agent: &mut Agent, world: &FakeWorld) -> (StepReport, RecordingSink) {
    let mut sink = RecordingSink::new();
    let report = {
        let mut host = world.host(&mut sink);
        agent.on_step(&mut host)
    };
    (report, sink)
}

fn base_world() -> FakeWorld {
    let mut world = FakeWorld::new().with_supply(14, 30);
    let home = world.start_location;
    world.spawn(UnitKind::Hatchery, Alliance::Own, home);
    world.spawn(UnitKind::Drone, Alliance::Own, home.offset(Fixed::from_num(3), Fixed::ZERO));
    world.spawn(UnitKind::Larva, Alliance::Own, home.offset(Fixed::ZERO, Fixed::from_num(-2)));
    world.add_mineral_line(home.offset(Fixed::from_num(-8), Fixed::ZERO), 4);
    world
}

#[test]
fn test_higher_priority_structure_wins_the_budget() {
    let world = base_world().with_resources(200, 0);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(90, BuildKind::Unit(UnitKind::Zergling), Role::Attack);
    agent.schedule(95, BuildKind::Unit(UnitKind::SpawningPool), Role::Building);

    let (report, sink) = step(&mut agent, &world);

    assert_eq!(report.issued.len(), 1);
    assert_eq!(report.issued[0].kind, BuildKind::Unit(UnitKind::SpawningPool));
    assert_eq!(sink.with_ability(Ability::Build(UnitKind::SpawningPool)).len(), 1);
    let scheduler = agent.scheduler();
    assert_eq!(scheduler.count_queued(BuildKind::Unit(UnitKind::Zergling)), 1);
    assert_eq!(scheduler.count_queued(BuildKind::Unit(UnitKind::SpawningPool)), 0);
    let zergling = scheduler
        .pending()
        .into_iter()
        .find(|r| r.kind == BuildKind::Unit(UnitKind::Zergling))
        .expect("zergling request kept");
    assert_eq!(zergling.priority, 90);
    assert_eq!(zergling.attempts(), 1);
}

#[test]
fn test_structure_builder_leaves_worker_group() {
    let world = base_world().with_resources(200, 0);
    let mut agent = started(quiet_config(), &world);
    let drone = world.own_tags(UnitKind::Drone)[0];
    agent.schedule(95, BuildKind::Unit(UnitKind::SpawningPool), Role::Building);

    step(&mut agent, &world);

    let ids = agent.ids();
    assert_eq!(agent.dispatcher().find_member(drone), Some(ids.intermediate));
    let member = agent
        .dispatcher()
        .group(ids.intermediate)
        .unwrap()
        .member(drone)
        .unwrap();
    assert_eq!(member.task, Task::Unset);
}

#[test]
fn test_structure_requests_register_no_assignment() {
    let world = base_world().with_resources(200, 0);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(95, BuildKind::Unit(UnitKind::SpawningPool), Role::Building);

    step(&mut agent, &world);

    assert_eq!(agent.router().pending(UnitKind::SpawningPool), 0);
}

#[test]
fn test_zergling_pair_registers_two_entries() {
    let mut world = base_world().with_resources(50, 0);
    let home = world.start_location;
    let pool_site = home.offset(Fixed::from_num(5), Fixed::from_num(5));
    world.spawn(UnitKind::SpawningPool, Alliance::Own, pool_site);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(90, BuildKind::Unit(UnitKind::Zergling), Role::Attack);

    let (report, _) = step(&mut agent, &world);

    assert_eq!(report.issued.len(), 1);
    assert_eq!(agent.router().pending(UnitKind::Zergling), 2);
}

#[test]
fn test_budget_is_shared_within_one_drain() {
    let mut world = base_world().with_resources(100, 0);
    let home = world.start_location;
    for dx in [1, 2] {
        let spot = home.offset(Fixed::from_num(dx), Fixed::from_num(-2));
        world.spawn(UnitKind::Larva, Alliance::Own, spot);
    }
    let mut agent = started(quiet_config(), &world);
    agent.schedule(50, BuildKind::Unit(UnitKind::Overlord), Role::Scout);
    agent.schedule(40, BuildKind::Unit(UnitKind::Overlord), Role::Scout);

    let (report, sink) = step(&mut agent, &world);

    assert_eq!(report.issued.len(), 1);
    assert_eq!(report.issued[0].priority, 50);
    assert_eq!(sink.production().len(), 1);
}

#[test]
fn test_each_larva_is_used_once_per_drain() {
    let world = base_world().with_resources(1000, 0);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(50, BuildKind::Unit(UnitKind::Overlord), Role::Scout);
    agent.schedule(40, BuildKind::Unit(UnitKind::Overlord), Role::Scout);

    let (report, sink) = step(&mut agent, &world);

    assert_eq!(report.issued.len(), 1);
    let producers: Vec<_> = sink.production().iter().map(|c| c.units[0]).collect();
    assert_eq!(producers.len(), 1);
}

#[test]
fn test_supply_gate_injects_provider_once() {
    let world = base_world().with_resources(0, 0).with_supply(14, 14);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(90, BuildKind::Unit(UnitKind::Drone), Role::Worker);
    agent.schedule(80, BuildKind::Unit(UnitKind::Drone), Role::Worker);

    let (first, _) = step(&mut agent, &world);
    let (second, _) = step(&mut agent, &world);

    assert_eq!(first.issued.len(), 0);
    let provider = BuildKind::Unit(UnitKind::Overlord);
    assert_eq!(agent.scheduler().count_queued(provider), 1);
    let overlord = agent
        .scheduler()
        .pending()
        .into_iter()
        .find(|r| r.kind == provider)
        .unwrap();
    assert_eq!(overlord.priority, 91);
    assert_eq!(overlord.destination, agent.ids().scout);
    assert_eq!(second.issued.len(), 0);
}

#[test]
fn test_supply_gate_respects_cap_limit() {
    let world = base_world().with_resources(0, 0).with_supply(200, 200);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(90, BuildKind::Unit(UnitKind::Drone), Role::Worker);

    step(&mut agent, &world);

    assert_eq!(agent.scheduler().count_queued(BuildKind::Unit(UnitKind::Overlord)), 0);
}

#[test]
fn test_supply_gate_skips_when_provider_in_flight() {
    let world = base_world().with_resources(100, 0).with_supply(14, 14);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(90, BuildKind::Unit(UnitKind::Overlord), Role::Scout);
    step(&mut agent, &world);
    assert_eq!(agent.router().pending(UnitKind::Overlord), 1);

    agent.schedule(80, BuildKind::Unit(UnitKind::Drone), Role::Worker);
    step(&mut agent, &world);

    assert_eq!(agent.scheduler().count_queued(BuildKind::Unit(UnitKind::Overlord)), 0);
}

#[test]
fn test_backfill_keeps_one_worker_request() {
    let world = base_world().with_resources(0, 0);
    let mut agent = started(quiet_config(), &world);
    let drone = BuildKind::Unit(UnitKind::Drone);

    for _ in 0..5 {
        step(&mut agent, &world);
        assert_eq!(agent.scheduler().count_queued(drone), 1);
    }
    let backfill = agent.scheduler().pending()[0];
    assert_eq!(backfill.priority, 1);
    assert_eq!(backfill.destination, agent.ids().worker);
    assert_eq!(backfill.attempts(), 5);
}

#[test]
fn test_unaffordable_requests_are_never_dropped() {
    let world = base_world().with_resources(0, 0);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(10, BuildKind::Unit(UnitKind::Hatchery), Role::Building);
    agent.schedule(10, BuildKind::Unit(UnitKind::RoachWarren), Role::Building);

    for _ in 0..20 {
        step(&mut agent, &world);
    }

    let pending = agent.scheduler().pending();
    assert_eq!(pending.len(), 3);
    assert_eq!(pending[0].kind, BuildKind::Unit(UnitKind::Hatchery));
    assert_eq!(pending[1].kind, BuildKind::Unit(UnitKind::RoachWarren));
}

#[test]
fn test_missing_placement_defers() {
    let world = base_world()
        .with_resources(500, 0)
        .with_placement(swarm_test_utils::fixtures::PlacementRule::Nowhere);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(95, BuildKind::Unit(UnitKind::SpawningPool), Role::Building);

    let (report, sink) = step(&mut agent, &world);

    assert!(sink.with_ability(Ability::Build(UnitKind::SpawningPool)).is_empty());
    assert_eq!(report.deferred, 1);
    assert_eq!(agent.scheduler().count_queued(BuildKind::Unit(UnitKind::SpawningPool)), 1);
    let drone = world.own_tags(UnitKind::Drone)[0];
    assert_eq!(agent.dispatcher().find_member(drone), Some(agent.ids().worker));
}

#[test]
fn test_extractor_targets_free_geyser() {
    let mut world = base_world().with_resources(25, 0);
    let home = world.start_location;
    let taken = world.spawn(UnitKind::VespeneGeyser, Alliance::Neutral, point(36, 30));
    world.spawn(UnitKind::Extractor, Alliance::Own, point(36, 30));
    let geyser_site = home.offset(Fixed::ZERO, Fixed::from_num(7));
    let free = world.spawn(UnitKind::VespeneGeyser, Alliance::Neutral, geyser_site);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(96, BuildKind::Unit(UnitKind::Extractor), Role::Building);

    let (_, sink) = step(&mut agent, &world);

    let builds = sink.with_ability(Ability::Build(UnitKind::Extractor));
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].target, Target::Unit(free));
    assert_ne!(builds[0].target, Target::Unit(taken));
}

#[test]
fn test_research_waits_for_structure_then_issues() {
    let mut world = base_world().with_resources(100, 100);
    let research = BuildKind::Research {
        upgrade: Upgrade::MetabolicBoost,
        at: UnitKind::SpawningPool,
    };
    let mut agent = started(quiet_config(), &world);
    agent.schedule(80, research, Role::Building);

    let (first, _) = step(&mut agent, &world);
    assert!(first.issued.iter().all(|r| r.kind != research));
    let entries_before = agent.router().total_pending();

    let pool = world.spawn(UnitKind::SpawningPool, Alliance::Own, point(35, 35));
    let (second, sink) = step(&mut agent, &world);

    assert_eq!(second.issued.len(), 1);
    assert_eq!(second.issued[0].producer, pool);
    assert_eq!(sink.with_ability(Ability::Research(Upgrade::MetabolicBoost)).len(), 1);
    assert_eq!(agent.router().total_pending(), entries_before);
}

#[test]
fn test_missing_larva_triggers_inject() {
    let mut world = FakeWorld::new().with_resources(500, 0).with_supply(14, 30);
    let home = world.start_location;
    let hatchery = world.spawn(UnitKind::Hatchery, Alliance::Own, home);
    let queen_site = home.offset(Fixed::from_num(2), Fixed::ZERO);
    let queen = world.spawn(UnitKind::Queen, Alliance::Own, queen_site);
    world.unit_mut(queen).unwrap().energy = Fixed::from_num(50);
    let mut agent = started(quiet_config(), &world);
    agent.schedule(60, BuildKind::Unit(UnitKind::Overlord), Role::Scout);

    let (_, sink) = step(&mut agent, &world);

    let injects = sink.with_ability(Ability::InjectLarva);
    assert_eq!(injects.len(), 1);
    assert_eq!(injects[0].units, vec![queen]);
    assert_eq!(injects[0].target, Target::Unit(hatchery));
}

#[test]
fn test_scripted_mode_runs_head_at_threshold() {
    let world = base_world().with_resources(100, 0).with_supply(12, 30);
    let config = AgentConfig {
        scheduling: SchedulingMode::Scripted,
        opening: vec![OpeningStep {
            priority: 100,
            supply: 13,
            kind: BuildKind::Unit(UnitKind::Overlord),
            role: Role::Scout,
        }],
        ..AgentConfig::default()
    };
    let mut agent = started(config, &world);

    let (below, _) = step(&mut agent, &world);
    assert_eq!(below.issued.len(), 1);
    assert_eq!(below.issued[0].kind, BuildKind::Unit(UnitKind::Drone));
    assert_eq!(agent.script().len(), 1);

    let world = world.with_supply(13, 30);
    let mut fresh = started(
        AgentConfig {
            scheduling: SchedulingMode::Scripted,
            opening: agent.config().opening.clone(),
            ..AgentConfig::default()
        },
        &world,
    );
    let (at, _) = step(&mut fresh, &world);
    assert_eq!(at.issued.len(), 1);
    assert_eq!(at.issued[0].kind, BuildKind::Unit(UnitKind::Overlord));
    assert!(fresh.script().is_empty());
}

#[test]
fn test_scripted_supply_block_puts_provider_at_head() {
    let world = base_world().with_resources(200, 0).with_supply(14, 14);
    let config = AgentConfig {
        scheduling: SchedulingMode::Scripted,
        ..quiet_config()
    };
    let mut agent = started(config, &world);

    let (blocked, _) = step(&mut agent, &world);
    assert!(blocked.issued.is_empty());
    assert_eq!(blocked.deferred, 1);
    let head = agent.script().head().copied().expect("provider queued");
    assert_eq!(head.kind, BuildKind::Unit(UnitKind::Overlord));
    assert_eq!(head.destination, agent.ids().scout);
    assert_eq!(head.supply, 0);
    assert_eq!(agent.script().len(), 1);

    let (provider, _) = step(&mut agent, &world);
    assert_eq!(provider.issued.len(), 1);
    assert_eq!(provider.issued[0].kind, BuildKind::Unit(UnitKind::Overlord));
    assert!(agent.script().is_empty());

    // The provider is in production, so a second block queues nothing.
    let (again, _) = step(&mut agent, &world);
    assert!(again.issued.is_empty());
    assert!(agent.script().is_empty());
}

#[test]
fn test_scripted_supply_block_respects_cap_limit() {
    let world = base_world().with_resources(200, 0).with_supply(14, 14);
    let config = AgentConfig {
        scheduling: SchedulingMode::Scripted,
        supply_cap_limit: 14,
        ..quiet_config()
    };
    let mut agent = started(config, &world);

    step(&mut agent, &world);

    assert!(agent.script().is_empty());
}
