//! The agent: owns every engine component and exposes the host lifecycle.
//!
//! Per tick the order is fixed: enemy intel, tactical context, production,
//! dispatch. Units ordered this tick only join groups when the host later
//! reports them through [`Agent::on_unit_created`].

use serde::{Deserialize, Serialize};

use crate::assignment::AssignmentRouter;
use crate::components::{GroupId, GroupIds, Role, Task};
use crate::config::{AgentConfig, SchedulingMode};
use crate::dispatcher::{DispatchReport, GroupDispatcher, TacticalContext};
use crate::error::Result;
use crate::intel::EnemyIntel;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::production::{BuildKind, ProductionContext};
use crate::scheduler::{
    DrainReport, IssuedRequest, ProductionScheduler, ScriptStep, ScriptedBuildOrder,
};
use crate::spatial::SpatialLocator;
use crate::units::{Alliance, UnitKind, UnitTag};
use crate::world::{Host, UnitView, WorldSnapshot};

/// Game loops per real second at normal speed.
const LOOPS_PER_SECOND_NUM: i32 = 112;
const LOOPS_PER_SECOND_DEN: i32 = 5;

/// How the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// This agent won.
    Victory,
    /// This agent lost.
    Defeat,
    /// Draw.
    Tie,
}

/// Running counters for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Production orders issued.
    pub requests_issued: u64,
    /// Own units reported destroyed.
    pub units_lost: u64,
    /// Units enrolled into a group.
    pub units_enrolled: u64,
    /// Replacement requests queued after losses.
    pub replacements: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Game loop of the snapshot.
    pub game_loop: u64,
    /// Production orders issued this tick.
    pub issued: Vec<IssuedRequest>,
    /// Requests put back this tick.
    pub deferred: usize,
    /// Requests still queued after the tick.
    pub pending_requests: usize,
    /// Assignment entries still waiting for units.
    pub pending_assignments: usize,
    /// Dispatch pass outcome.
    pub dispatch: DispatchReport,
}

/// End-of-match summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Final game loop.
    pub game_loop: u64,
    /// Final game time in seconds.
    #[serde(with = "fixed_serde")]
    pub seconds: Fixed,
    /// Result.
    pub outcome: MatchOutcome,
    /// Production orders issued over the match.
    pub requests_issued: u64,
    /// Own units lost over the match.
    pub units_lost: u64,
}

/// The production-scheduling and unit-dispatch engine.
#[derive(Debug, Clone)]
pub struct Agent {
    config: AgentConfig,
    ids: GroupIds,
    dispatcher: GroupDispatcher,
    scheduler: ProductionScheduler,
    script: ScriptedBuildOrder,
    router: AssignmentRouter,
    locator: SpatialLocator,
    intel: EnemyIntel,
    home: Vec2Fixed,
    map_center: Vec2Fixed,
    scout_admissions: usize,
    stats: AgentStats,
}

impl Agent {
    /// Create an agent and its five groups.
    ///
    /// Out-of-range settings are clamped with a warning; use
    /// [`Agent::try_new`] to reject them instead.
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(error) => {
                tracing::warn!(%error, "Invalid agent configuration, clamping");
                config.clamped()
            }
        };
        Self::build(config)
    }

    /// Create an agent, rejecting an invalid configuration.
    pub fn try_new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AgentConfig) -> Self {
        let mut dispatcher = GroupDispatcher::new(&config);
        let ids = GroupIds {
            intermediate: dispatcher.add_group(Role::Intermediate, None),
            scout: dispatcher.add_group(Role::Scout, None),
            attack: dispatcher.add_group(Role::Attack, Some(Task::Rally)),
            worker: dispatcher.add_group(Role::Worker, None),
            building: dispatcher.add_group(Role::Building, None),
        };
        Self {
            scheduler: ProductionScheduler::new(&config, ids),
            script: ScriptedBuildOrder::new(&config, ids),
            router: AssignmentRouter::new(ids.intermediate, config.production_material),
            locator: SpatialLocator::new(&config),
            dispatcher,
            ids,
            intel: EnemyIntel::new(),
            home: Vec2Fixed::ZERO,
            map_center: Vec2Fixed::ZERO,
            scout_admissions: 0,
            stats: AgentStats::default(),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Group ids by role.
    #[must_use]
    pub fn ids(&self) -> GroupIds {
        self.ids
    }

    /// Groups and controllers.
    #[must_use]
    pub fn dispatcher(&self) -> &GroupDispatcher {
        &self.dispatcher
    }

    /// Priority-mode request queue.
    #[must_use]
    pub fn scheduler(&self) -> &ProductionScheduler {
        &self.scheduler
    }

    /// Scripted-mode build order.
    #[must_use]
    pub fn script(&self) -> &ScriptedBuildOrder {
        &self.script
    }

    /// Pending group assignments.
    #[must_use]
    pub fn router(&self) -> &AssignmentRouter {
        &self.router
    }

    /// Enemy base estimate.
    #[must_use]
    pub fn intel(&self) -> &EnemyIntel {
        &self.intel
    }

    /// Match counters.
    #[must_use]
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// The strategic state controllers see this tick.
    #[must_use]
    pub fn tactical_context(&self) -> TacticalContext {
        TacticalContext {
            home: self.home,
            map_center: self.map_center,
            enemy: self.intel.location(),
            attack_committed: self.dispatcher.attack().is_committed(),
        }
    }

    /// Record the map, enroll the starting units and load the opening.
    pub fn on_game_start(&mut self, world: &dyn WorldSnapshot) {
        self.home = world.start_location();
        self.map_center = world.map_center();
        self.locator.set_origin(self.home, self.map_center);

        let candidates = world.enemy_start_locations();
        let scout_trigger = if let [only] = candidates {
            self.intel.set(*only);
            self.dispatcher.scout_mut().record_enemy(*only);
            0
        } else {
            candidates.len()
        };
        if let Ok(scouts) = self.dispatcher.group_mut(self.ids.scout) {
            scouts.size_trigger = scout_trigger;
        }

        for unit in world.own_units() {
            let Some(role) = self.starting_role(world, unit) else {
                continue;
            };
            self.enroll(unit, self.ids.of(role));
        }

        match self.config.scheduling {
            SchedulingMode::Priority => {
                for step in &self.config.opening {
                    self.scheduler
                        .schedule(step.priority, step.kind, self.ids.of(step.role));
                }
            }
            SchedulingMode::Scripted => self.script.load(&self.config.opening, self.ids),
        }

        tracing::info!(
            home_x = %self.home.x,
            home_y = %self.home.y,
            candidates = candidates.len(),
            opening = self.config.opening.len(),
            mode = ?self.config.scheduling,
            "Game started"
        );
    }

    fn starting_role(&self, world: &dyn WorldSnapshot, unit: &UnitView) -> Option<Role> {
        let is_structure =
            unit.kind.is_structure() || world.type_data(unit.kind).is_some_and(|d| d.is_structure);
        let role = match unit.kind {
            UnitKind::Drone | UnitKind::Queen => Role::Worker,
            kind if kind == self.config.supply_provider => Role::Scout,
            kind if kind == self.config.production_material => Role::Intermediate,
            kind if kind.is_combat() => Role::Attack,
            _ if is_structure => Role::Building,
            _ => return None,
        };
        Some(role)
    }

    /// Run one tick.
    pub fn on_step(&mut self, host: &mut Host<'_>) -> StepReport {
        let world = host.world;
        self.intel
            .update(world, self.dispatcher.scout().recorded_enemy());
        let tactics = self.tactical_context();

        let drain = {
            let mut ctx = ProductionContext::new(
                host,
                self.dispatcher.groups_mut(),
                self.ids,
                &mut self.locator,
                &self.config,
            );
            match self.config.scheduling {
                SchedulingMode::Priority => self.scheduler.drain(&mut ctx, &mut self.router),
                SchedulingMode::Scripted => self.script.execute(&mut ctx, &mut self.router),
            }
        };
        let DrainReport {
            issued, deferred, ..
        } = drain;
        self.stats.requests_issued += issued.len() as u64;

        let dispatch = self.dispatcher.step(host, &tactics, &mut self.locator);

        StepReport {
            game_loop: world.game_loop(),
            issued,
            deferred,
            pending_requests: match self.config.scheduling {
                SchedulingMode::Priority => self.scheduler.len(),
                SchedulingMode::Scripted => self.script.len(),
            },
            pending_assignments: self.router.total_pending(),
            dispatch,
        }
    }

    /// Switch a managed unit to another task within its group, for example
    /// an overlord to [`Task::ScoutAll`] for full map coverage.
    pub fn set_task(&mut self, tag: UnitTag, task: Task) -> bool {
        self.dispatcher.set_task(tag, task)
    }

    /// Queue a request for a role's group.
    pub fn schedule(&mut self, priority: i32, kind: BuildKind, role: Role) {
        let destination = self.ids.of(role);
        match self.config.scheduling {
            SchedulingMode::Priority => self.scheduler.schedule(priority, kind, destination),
            SchedulingMode::Scripted => self.script.push_back(ScriptStep {
                supply: 0,
                kind,
                destination,
                priority,
            }),
        }
    }

    fn schedule_replacement(&mut self, kind: UnitKind, role: Role) {
        let structure = role == Role::Building;
        let priority = if structure {
            self.config.structure_replacement_priority
        } else {
            self.config.replacement_priority
        };
        if structure && self.config.scheduling == SchedulingMode::Scripted {
            self.script.push_front(ScriptStep {
                supply: 0,
                kind: BuildKind::Unit(kind),
                destination: self.ids.of(role),
                priority,
            });
        } else {
            self.schedule(priority, BuildKind::Unit(kind), role);
        }
        self.stats.replacements += 1;
        tracing::debug!(?kind, priority, "Replacement queued");
    }

    fn enroll(&mut self, unit: &UnitView, group: GroupId) -> bool {
        let enemy_known = self.intel.is_known();
        let Ok(target) = self.dispatcher.group_mut(group) else {
            return false;
        };
        let task = target.role.default_task(unit.kind, enemy_known);
        let enrolled = target.enroll(unit, task);
        if enrolled {
            self.stats.units_enrolled += 1;
            tracing::debug!(tag = %unit.tag, kind = ?unit.kind, group = group.0, "Enrolled unit");
        }
        enrolled
    }

    /// Route a newly reported own unit to its group.
    ///
    /// Returns the group it joined, or `None` if it stays unmanaged.
    pub fn on_unit_created(&mut self, unit: &UnitView) -> Option<GroupId> {
        if unit.alliance != Alliance::Own {
            return None;
        }
        if let Some(existing) = self.dispatcher.find_member(unit.tag) {
            return Some(existing);
        }
        let mut group = self.router.route(unit.kind)?;
        if group == self.ids.scout && unit.kind != self.config.supply_provider {
            group = self.admit_scout();
        }
        self.enroll(unit, group).then_some(group)
    }

    /// Non-provider scouts are capped by the scout group's size trigger and
    /// stop being admitted once the enemy base is known.
    fn admit_scout(&mut self) -> GroupId {
        let trigger = self
            .dispatcher
            .group(self.ids.scout)
            .map_or(0, |g| g.size_trigger);
        if self.scout_admissions < trigger && !self.intel.is_known() {
            self.scout_admissions += 1;
            self.ids.scout
        } else {
            self.ids.attack
        }
    }

    /// Handle a destroyed unit of any alliance.
    pub fn on_unit_destroyed(&mut self, world: &dyn WorldSnapshot, unit: &UnitView) {
        match unit.alliance {
            Alliance::Enemy => {
                if self.intel.is_base_at_estimate(world, unit) {
                    tracing::info!(tag = %unit.tag, "Enemy base at estimate destroyed");
                    self.intel.clear();
                    self.dispatcher.scout_mut().clear_record();
                }
            }
            Alliance::Own => {
                let managed = self
                    .dispatcher
                    .groups_mut()
                    .iter_mut()
                    .any(|g| g.mark_gone(unit.tag));
                self.stats.units_lost += 1;
                tracing::debug!(tag = %unit.tag, kind = ?unit.kind, managed, "Own unit lost");
                self.replace(unit.kind);
            }
            Alliance::Neutral => {}
        }
    }

    fn replace(&mut self, kind: UnitKind) {
        match kind {
            UnitKind::Zergling | UnitKind::Roach => self.schedule_replacement(kind, Role::Attack),
            UnitKind::Ravager => {
                self.schedule_replacement(UnitKind::Roach, Role::Attack);
                self.schedule_replacement(UnitKind::Ravager, Role::Attack);
            }
            UnitKind::Queen => self.schedule_replacement(kind, Role::Worker),
            UnitKind::Extractor | UnitKind::Hatchery | UnitKind::SpawningPool => {
                self.schedule_replacement(kind, Role::Building);
            }
            _ => {}
        }
    }

    /// Enroll a finished structure; staff a new extractor.
    pub fn on_building_complete(&mut self, unit: &UnitView) {
        if unit.alliance != Alliance::Own {
            return;
        }
        self.enroll(unit, self.ids.building);
        if unit.kind != UnitKind::Extractor {
            return;
        }
        let quota = self.config.extractor_workers as usize;
        let Ok(workers) = self.dispatcher.group_mut(self.ids.worker) else {
            return;
        };
        let (members, _) = workers.parts_mut();
        let mut staffed = 0;
        for member in members
            .iter_mut()
            .filter(|m| m.task == Task::Mine && m.kind == UnitKind::Drone && !m.is_gone())
            .take(quota)
        {
            member.task = Task::Extract;
            staffed += 1;
        }
        tracing::debug!(extractor = %unit.tag, staffed, "Extractor staffed");
    }

    /// Summarize the match.
    pub fn on_game_end(
        &mut self,
        world: &dyn WorldSnapshot,
        outcome: MatchOutcome,
    ) -> MatchSummary {
        let game_loop = world.game_loop();
        let seconds = Fixed::saturating_from_num(game_loop)
            .saturating_mul(Fixed::from_num(LOOPS_PER_SECOND_DEN))
            / Fixed::from_num(LOOPS_PER_SECOND_NUM);
        let summary = MatchSummary {
            game_loop,
            seconds,
            outcome,
            requests_issued: self.stats.requests_issued,
            units_lost: self.stats.units_lost,
        };
        tracing::info!(
            ?outcome,
            game_loop,
            seconds = %seconds,
            requests_issued = summary.requests_issued,
            units_lost = summary.units_lost,
            "Game ended"
        );
        summary
    }
}
