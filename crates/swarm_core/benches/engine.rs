//! Engine benchmarks.
//!
//! Run with: `cargo bench -p swarm_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use swarm_core::prelude::*;
use swarm_core::threat::{self, Locality};
use swarm_test_utils::determinism::MatchHarness;
use swarm_test_utils::fixtures::{point, FakeWorld, RecordingSink, ENEMY_MARINE, ENEMY_VIKING};

fn backlog_agent(world: &FakeWorld) -> Agent {
    let mut agent = Agent::new(AgentConfig {
        opening: Vec::new(),
        ..AgentConfig::default()
    });
    agent.on_game_start(world);
    for i in 0..500 {
        let kind = if i % 3 == 0 {
            UnitKind::Roach
        } else {
            UnitKind::Zergling
        };
        agent.schedule(i % 100, BuildKind::Unit(kind), Role::Attack);
    }
    agent
}

/// Drain a large backlog against a world that can afford some of it.
pub fn backlog_benchmark(c: &mut Criterion) {
    let mut world = FakeWorld::new()
        .with_resources(5_000, 1_000)
        .with_supply(20, 200);
    world.spawn(UnitKind::SpawningPool, Alliance::Own, point(36, 36));
    world.spawn(UnitKind::RoachWarren, Alliance::Own, point(24, 36));
    for i in 0..60 {
        world.spawn(UnitKind::Larva, Alliance::Own, point(20 + i % 10, 20 + i / 10));
    }

    c.bench_function("drain_500_requests", |b| {
        b.iter_batched(
            || backlog_agent(&world),
            |mut agent| {
                let mut sink = RecordingSink::new();
                let mut host = world.host(&mut sink);
                black_box(agent.on_step(&mut host))
            },
            BatchSize::SmallInput,
        );
    });
}

/// Score a crowded battlefield.
pub fn threat_benchmark(c: &mut Criterion) {
    let mut world = FakeWorld::new();
    for i in 0..400 {
        let kind = if i % 4 == 0 { ENEMY_VIKING } else { ENEMY_MARINE };
        world.spawn(kind, Alliance::Enemy, point(40 + i % 20, 40 + i / 20));
    }
    let locality = Locality::NearHome {
        home: point(50, 50),
        radius: Fixed::from_num(30),
    };

    c.bench_function("threat_400_hostiles", |b| {
        b.iter(|| black_box(threat::evaluate(&world, black_box(locality))));
    });
}

/// Play the standard opening for a stretch of ticks.
pub fn match_benchmark(c: &mut Criterion) {
    c.bench_function("standard_match_200_ticks", |b| {
        b.iter_batched(
            MatchHarness::standard,
            |mut harness| {
                harness.run(200);
                black_box(harness.command_hash())
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, backlog_benchmark, threat_benchmark, match_benchmark);
criterion_main!(benches);
