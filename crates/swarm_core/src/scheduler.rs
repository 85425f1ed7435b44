//! Production scheduling.
//!
//! [`ProductionScheduler`] is a priority queue of [`BuildRequest`]s drained
//! once per tick: every queued request is attempted in priority order, FIFO
//! among equals, and whatever fails goes back unchanged. Nothing is ever
//! dropped; a request that keeps failing logs one stall warning.
//!
//! [`ScriptedBuildOrder`] is the simpler supply-threshold script, kept as an
//! alternative selection mode.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::assignment::AssignmentRouter;
use crate::components::{GroupId, GroupIds};
use crate::config::{AgentConfig, OpeningStep};
use crate::production::{BuildError, BuildKind, Issued, ProductionContext};
use crate::units::{UnitKind, UnitTag};
use crate::world::WorldSnapshot;

/// A queued production request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildRequest {
    /// Higher runs first.
    pub priority: i32,
    /// What to build.
    pub kind: BuildKind,
    /// Group the produced units join.
    pub destination: GroupId,
    seq: u64,
    attempts: u32,
}

impl BuildRequest {
    /// Consecutive failed attempts.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Ord for BuildRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for BuildRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A request that went through this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedRequest {
    /// Request priority.
    pub priority: i32,
    /// What was ordered.
    pub kind: BuildKind,
    /// Destination group.
    pub destination: GroupId,
    /// Unit that received the order.
    pub producer: UnitTag,
}

/// Outcome of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Successful requests, in attempt order.
    pub issued: Vec<IssuedRequest>,
    /// Requests put back.
    pub deferred: usize,
    /// Supply provider requests injected by the supply gate.
    pub supply_injections: usize,
}

/// When a supply-blocked request should queue a supply provider.
///
/// Shared by both selection modes: no provider is queued for a blocked
/// provider, while one is already queued or in production, or once the cap
/// has reached its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SupplyGate {
    provider: UnitKind,
    destination: GroupId,
    cap_limit: u32,
}

impl SupplyGate {
    fn new(config: &AgentConfig, ids: GroupIds) -> Self {
        Self {
            provider: config.supply_provider,
            destination: ids.scout,
            cap_limit: config.supply_cap_limit,
        }
    }

    fn provider_kind(self) -> BuildKind {
        BuildKind::Unit(self.provider)
    }

    fn should_inject(
        self,
        blocked: BuildKind,
        queued: bool,
        router: &AssignmentRouter,
        world: &dyn WorldSnapshot,
    ) -> bool {
        blocked != self.provider_kind()
            && !queued
            && router.pending(self.provider) == 0
            && world.supply_cap() < self.cap_limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Backfill {
    kind: BuildKind,
    destination: GroupId,
    priority: i32,
}

/// Register one assignment entry per unit an order will produce.
///
/// Structures, in-place morphs and research produce no new group member.
pub fn register_issued(
    router: &mut AssignmentRouter,
    kind: BuildKind,
    priority: i32,
    destination: GroupId,
    issued: &Issued,
    building_group: GroupId,
) {
    let Some(unit) = kind.unit_kind() else {
        return;
    };
    if !issued.spawns_units || destination == building_group {
        return;
    }
    for _ in 0..issued.yield_count {
        router.register(unit, priority, destination);
    }
}

/// Priority queue of build requests.
#[derive(Debug, Clone)]
pub struct ProductionScheduler {
    queue: BinaryHeap<BuildRequest>,
    next_seq: u64,
    backfill: Backfill,
    supply_gate: SupplyGate,
    stall_warning_attempts: u32,
    building_group: GroupId,
}

impl ProductionScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new(config: &AgentConfig, ids: GroupIds) -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
            backfill: Backfill {
                kind: BuildKind::Unit(config.backfill.kind),
                destination: ids.of(config.backfill.role),
                priority: config.backfill.priority,
            },
            supply_gate: SupplyGate::new(config, ids),
            stall_warning_attempts: config.stall_warning_attempts,
            building_group: ids.building,
        }
    }

    /// Enqueue a request. No validation happens until it is attempted.
    pub fn schedule(&mut self, priority: i32, kind: BuildKind, destination: GroupId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(BuildRequest {
            priority,
            kind,
            destination,
            seq,
            attempts: 0,
        });
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued requests, next to run first.
    #[must_use]
    pub fn pending(&self) -> Vec<BuildRequest> {
        let mut requests: Vec<BuildRequest> = self.queue.iter().copied().collect();
        requests.sort_unstable_by(|a, b| b.cmp(a));
        requests
    }

    /// Queued requests for `kind`.
    #[must_use]
    pub fn count_queued(&self, kind: BuildKind) -> usize {
        self.queue.iter().filter(|r| r.kind == kind).count()
    }

    fn ensure_backfill(&mut self) {
        let Backfill {
            kind,
            destination,
            priority,
        } = self.backfill;
        let present = self
            .queue
            .iter()
            .any(|r| r.kind == kind && r.destination == destination);
        if !present {
            self.schedule(priority, kind, destination);
        }
    }

    /// Attempt every queued request once, highest priority first.
    pub fn drain(
        &mut self,
        ctx: &mut ProductionContext<'_, '_>,
        router: &mut AssignmentRouter,
    ) -> DrainReport {
        self.ensure_backfill();
        let mut backlog = std::mem::take(&mut self.queue);
        let mut report = DrainReport::default();

        while let Some(mut request) = backlog.pop() {
            match ctx.attempt(request.kind) {
                Ok(issued) => {
                    register_issued(
                        router,
                        request.kind,
                        request.priority,
                        request.destination,
                        &issued,
                        self.building_group,
                    );
                    report.issued.push(IssuedRequest {
                        priority: request.priority,
                        kind: request.kind,
                        destination: request.destination,
                        producer: issued.producer,
                    });
                }
                Err(error) => {
                    if error == BuildError::SupplyBlocked
                        && self.gate_supply(&request, &backlog, ctx, router)
                    {
                        report.supply_injections += 1;
                    }
                    request.attempts = request.attempts.saturating_add(1);
                    if request.attempts == self.stall_warning_attempts {
                        tracing::warn!(
                            kind = %request.kind,
                            priority = request.priority,
                            attempts = request.attempts,
                            %error,
                            "Build request stalled"
                        );
                    }
                    self.queue.push(request);
                    report.deferred += 1;
                }
            }
        }
        report
    }

    /// Queue a supply provider ahead of a supply-blocked request unless one
    /// is already queued, already in production, or the cap is maxed.
    fn gate_supply(
        &mut self,
        blocked: &BuildRequest,
        backlog: &BinaryHeap<BuildRequest>,
        ctx: &ProductionContext<'_, '_>,
        router: &AssignmentRouter,
    ) -> bool {
        let gate = self.supply_gate;
        let provider = gate.provider_kind();
        let queued = self
            .queue
            .iter()
            .chain(backlog.iter())
            .any(|r| r.kind == provider);
        if !gate.should_inject(blocked.kind, queued, router, ctx.world()) {
            return false;
        }
        let priority = blocked.priority.saturating_add(1);
        tracing::debug!(blocked = %blocked.kind, priority, "Supply blocked, queueing provider");
        self.schedule(priority, provider, gate.destination);
        true
    }
}

/// One step of a scripted build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStep {
    /// Supply used at which the step becomes eligible.
    pub supply: u32,
    /// What to build.
    pub kind: BuildKind,
    /// Destination group.
    pub destination: GroupId,
    /// Priority given to the produced units' assignment entries.
    pub priority: i32,
}

/// Supply-threshold FIFO build script.
///
/// Each tick the head runs once supply reaches its threshold and is popped on
/// success; below the threshold the backfill worker runs instead. A
/// supply-blocked step puts a supply provider at the head.
#[derive(Debug, Clone)]
pub struct ScriptedBuildOrder {
    steps: VecDeque<ScriptStep>,
    backfill: ScriptStep,
    supply_gate: SupplyGate,
    building_group: GroupId,
}

impl ScriptedBuildOrder {
    /// Create an empty script.
    #[must_use]
    pub fn new(config: &AgentConfig, ids: GroupIds) -> Self {
        Self {
            steps: VecDeque::new(),
            backfill: ScriptStep {
                supply: 0,
                kind: BuildKind::Unit(config.backfill.kind),
                destination: ids.of(config.backfill.role),
                priority: config.backfill.priority,
            },
            supply_gate: SupplyGate::new(config, ids),
            building_group: ids.building,
        }
    }

    /// Load opening steps in order.
    pub fn load(&mut self, opening: &[OpeningStep], ids: GroupIds) {
        self.steps.extend(opening.iter().map(|s| ScriptStep {
            supply: s.supply,
            kind: s.kind,
            destination: ids.of(s.role),
            priority: s.priority,
        }));
    }

    /// Append a step.
    pub fn push_back(&mut self, step: ScriptStep) {
        self.steps.push_back(step);
    }

    /// Put a step at the head.
    pub fn push_front(&mut self, step: ScriptStep) {
        self.steps.push_front(step);
    }

    /// Remaining steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script is finished.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The next step.
    #[must_use]
    pub fn head(&self) -> Option<&ScriptStep> {
        self.steps.front()
    }

    /// Run one tick of the script.
    pub fn execute(
        &mut self,
        ctx: &mut ProductionContext<'_, '_>,
        router: &mut AssignmentRouter,
    ) -> DrainReport {
        let supply = ctx.world().supply_used();
        let mut report = DrainReport::default();
        let (step, from_script) = match self.steps.front() {
            Some(head) if supply >= head.supply => (*head, true),
            Some(_) | None => (self.backfill, false),
        };

        match ctx.attempt(step.kind) {
            Ok(issued) => {
                if from_script {
                    self.steps.pop_front();
                }
                register_issued(
                    router,
                    step.kind,
                    step.priority,
                    step.destination,
                    &issued,
                    self.building_group,
                );
                report.issued.push(IssuedRequest {
                    priority: step.priority,
                    kind: step.kind,
                    destination: step.destination,
                    producer: issued.producer,
                });
            }
            Err(error) => {
                tracing::debug!(kind = %step.kind, %error, "Scripted step deferred");
                report.deferred += 1;
                if error == BuildError::SupplyBlocked && self.gate_supply(&step, ctx, router) {
                    report.supply_injections += 1;
                }
            }
        }
        report
    }

    fn gate_supply(
        &mut self,
        blocked: &ScriptStep,
        ctx: &ProductionContext<'_, '_>,
        router: &AssignmentRouter,
    ) -> bool {
        let gate = self.supply_gate;
        let provider = gate.provider_kind();
        let queued = self.steps.iter().any(|s| s.kind == provider);
        if !gate.should_inject(blocked.kind, queued, router, ctx.world()) {
            return false;
        }
        let priority = blocked.priority.saturating_add(1);
        tracing::debug!(blocked = %blocked.kind, "Supply blocked, provider moved to script head");
        self.steps.push_front(ScriptStep {
            supply: 0,
            kind: provider,
            destination: gate.destination,
            priority,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitKind;

    fn ids() -> GroupIds {
        GroupIds {
            intermediate: GroupId(0),
            scout: GroupId(1),
            attack: GroupId(2),
            worker: GroupId(3),
            building: GroupId(4),
        }
    }

    #[test]
    fn test_pending_orders_by_priority_then_fifo() {
        let mut scheduler = ProductionScheduler::new(&AgentConfig::default(), ids());
        scheduler.schedule(90, BuildKind::Unit(UnitKind::Zergling), GroupId(2));
        scheduler.schedule(95, BuildKind::Unit(UnitKind::SpawningPool), GroupId(4));
        scheduler.schedule(90, BuildKind::Unit(UnitKind::Roach), GroupId(2));

        let order: Vec<_> = scheduler.pending().iter().map(|r| r.kind).collect();
        assert_eq!(
            order,
            vec![
                BuildKind::Unit(UnitKind::SpawningPool),
                BuildKind::Unit(UnitKind::Zergling),
                BuildKind::Unit(UnitKind::Roach),
            ]
        );
    }

    #[test]
    fn test_backfill_inserted_once() {
        let mut scheduler = ProductionScheduler::new(&AgentConfig::default(), ids());
        scheduler.ensure_backfill();
        scheduler.ensure_backfill();
        assert_eq!(scheduler.count_queued(BuildKind::Unit(UnitKind::Drone)), 1);
        assert_eq!(scheduler.pending()[0].priority, 1);
    }

    #[test]
    fn test_register_skips_building_group() {
        let mut router = AssignmentRouter::new(GroupId(0), UnitKind::Larva);
        let issued = Issued {
            producer: UnitTag(1),
            yield_count: 1,
            spawns_units: true,
        };
        register_issued(
            &mut router,
            BuildKind::Unit(UnitKind::SpawningPool),
            95,
            GroupId(4),
            &issued,
            GroupId(4),
        );
        assert_eq!(router.total_pending(), 0);
    }

    #[test]
    fn test_register_one_entry_per_unit() {
        let mut router = AssignmentRouter::new(GroupId(0), UnitKind::Larva);
        let issued = Issued {
            producer: UnitTag(1),
            yield_count: 2,
            spawns_units: true,
        };
        register_issued(
            &mut router,
            BuildKind::Unit(UnitKind::Zergling),
            90,
            GroupId(2),
            &issued,
            GroupId(4),
        );
        assert_eq!(router.pending(UnitKind::Zergling), 2);
    }
}
