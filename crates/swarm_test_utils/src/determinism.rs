//! Determinism testing utilities.
//!
//! Provides a harness that plays an [`Agent`] against a [`FakeWorld`] and
//! verifies that identical setups produce identical command streams.
//!
//! # Testing Strategy
//!
//! The engine must issue the same commands for the same snapshots. Sources
//! of non-determinism include:
//!
//! - **Floating-point math**: all distances use fixed-point via
//!   [`swarm_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Anything that decides an order iterates host order or sorts.
//!
//! - **Tie-breaking**: equal priorities and equal distances resolve by
//!   insertion or host order, never by address.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use swarm_core::agent::{Agent, MatchOutcome, MatchSummary, StepReport};
use swarm_core::config::AgentConfig;
use swarm_core::units::UnitTag;
use swarm_core::world::{Command, WorldSnapshot};

use crate::fixtures::{FakeWorld, RecordingSink, WorldEvent};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks played.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Engine is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// An agent playing against a [`FakeWorld`].
///
/// Each [`step`](Self::step) runs the agent, applies its commands to the
/// world, reports created units and finished structures back, then advances
/// time.
#[derive(Debug)]
pub struct MatchHarness {
    /// The engine under test.
    pub agent: Agent,
    /// The world it plays in.
    pub world: FakeWorld,
    /// Every command issued so far.
    pub log: Vec<Command>,
    /// Reports from every tick.
    pub reports: Vec<StepReport>,
}

impl MatchHarness {
    /// Create the agent and run its game-start hook.
    #[must_use]
    pub fn new(config: AgentConfig, world: FakeWorld) -> Self {
        let mut agent = Agent::new(config);
        agent.on_game_start(&world);
        Self {
            agent,
            world,
            log: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Standard start with the default configuration.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(AgentConfig::default(), FakeWorld::standard_start())
    }

    /// Play one tick and return its report.
    pub fn step(&mut self) -> &StepReport {
        let mut sink = RecordingSink::new();
        let report = {
            let mut host = self.world.host(&mut sink);
            self.agent.on_step(&mut host)
        };
        let commands = sink.take();
        for command in &commands {
            for event in self.world.apply(command) {
                self.report(event);
            }
        }
        self.log.extend(commands);
        self.world.tick();
        self.reports.push(report);
        &self.reports[self.reports.len() - 1]
    }

    /// Play `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn report(&mut self, event: WorldEvent) {
        let tag = match event {
            WorldEvent::Created(tag) | WorldEvent::BuildingComplete(tag) => tag,
        };
        let Some(view) = self.world.units().iter().find(|u| u.tag == tag).cloned() else {
            return;
        };
        match event {
            WorldEvent::Created(_) => {
                self.agent.on_unit_created(&view);
            }
            WorldEvent::BuildingComplete(_) => self.agent.on_building_complete(&view),
        }
    }

    /// Kill a unit: remove it from the world and tell the agent.
    pub fn destroy(&mut self, tag: UnitTag) -> bool {
        let Some(mut view) = self.world.remove(tag) else {
            return false;
        };
        view.is_alive = false;
        self.agent.on_unit_destroyed(&self.world, &view);
        true
    }

    /// End the match.
    pub fn finish(&mut self, outcome: MatchOutcome) -> MatchSummary {
        self.agent.on_game_end(&self.world, outcome)
    }

    /// Hash of every command issued so far.
    #[must_use]
    pub fn command_hash(&self) -> u64 {
        compute_hash(&self.log)
    }
}

/// Run a setup multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Play the same match `runs` times and compare command streams.
pub fn verify_match_determinism<F>(setup: F, runs: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> MatchHarness,
{
    verify_determinism(runs, ticks, setup, |m| {
        m.step();
    }, MatchHarness::command_hash)
}

/// Play the same match on several threads and compare command streams.
pub fn run_parallel_matches<F>(setup: F, num_matches: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> MatchHarness + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut harness = setup();
                    harness.run(ticks);
                    harness.command_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Play two identical matches side by side and return the first tick whose
/// commands differ.
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> MatchHarness,
{
    let mut left = setup();
    let mut right = setup();

    for tick in 1..=ticks {
        let before = left.log.len();
        left.step();
        right.step();
        if left.log.len() != right.log.len() || left.log[before..] != right.log[before..] {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::point;
    use swarm_core::config::SchedulingMode;

    #[test]
    fn test_identical_matches_issue_identical_commands() {
        let result = verify_match_determinism(MatchHarness::standard, 3, 120);
        result.assert_deterministic();
    }

    #[test]
    fn test_scripted_matches_are_deterministic() {
        let setup = || {
            let config = AgentConfig {
                scheduling: SchedulingMode::Scripted,
                ..AgentConfig::default()
            };
            MatchHarness::new(config, FakeWorld::standard_start())
        };
        verify_match_determinism(setup, 2, 120).assert_deterministic();
    }

    #[test]
    fn test_parallel_matches_agree() {
        run_parallel_matches(MatchHarness::standard, 4, 80).assert_deterministic();
    }

    #[test]
    fn test_no_divergence_with_several_enemy_starts() {
        let setup = || {
            let world = FakeWorld::standard_start()
                .with_enemy_starts(vec![point(98, 98), point(98, 30), point(30, 98)]);
            MatchHarness::new(AgentConfig::default(), world)
        };
        assert_eq!(find_first_divergence(setup, 100), None);
    }

    #[test]
    fn test_harness_produces_units() {
        let mut harness = MatchHarness::standard();
        harness.run(200);
        assert!(!harness.log.is_empty());
        assert!(harness.agent.stats().requests_issued > 0);
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&42u64), compute_hash(&42u64));
        assert_ne!(compute_hash(&1u64), compute_hash(&2u64));
    }
}
