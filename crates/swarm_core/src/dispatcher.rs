//! Group dispatch.
//!
//! Once per tick, after production, every group is walked in creation order.
//! Attack and worker groups first rank the hostiles they care about; then each
//! member is resolved against the snapshot and handed to its role's
//! controller, or evicted if it is gone.

use crate::components::{GroupId, ManagedUnit, Role, Task, UnitGroup};
use crate::config::AgentConfig;
use crate::controllers::{
    AttackController, IdleController, RoleController, ScoutController, WorkerController,
};
use crate::error::{AgentError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::spatial::SpatialLocator;
use crate::threat::{self, Locality, ThreatAssessment};
use crate::units::UnitTag;
use crate::world::{Command, Host, WorldSnapshot};

/// Strategic state shared by every controller for one tick.
///
/// Built once before dispatch; changes made during the tick (the attack group
/// committing, a scout spotting the enemy) show up in the next tick's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TacticalContext {
    /// Own start location.
    pub home: Vec2Fixed,
    /// Center of the playable area.
    pub map_center: Vec2Fixed,
    /// Enemy base estimate.
    pub enemy: Option<Vec2Fixed>,
    /// Whether the attack group has committed.
    pub attack_committed: bool,
}

/// Everything a controller may touch while handling one member.
pub struct DispatchContext<'d, 'h> {
    /// Host interfaces.
    pub host: &'d mut Host<'h>,
    /// This tick's strategic state.
    pub tactics: &'d TacticalContext,
    /// Map search.
    pub locator: &'d mut SpatialLocator,
    /// The group's ranked hostiles.
    pub threats: &'d ThreatAssessment,
    /// The group's shared waypoint rotation.
    pub rotation: &'d mut usize,
}

impl<'d, 'h> DispatchContext<'d, 'h> {
    /// This tick's snapshot.
    #[must_use]
    pub fn world(&self) -> &'h dyn WorldSnapshot {
        self.host.world
    }

    /// Send a command.
    pub fn issue(&mut self, command: Command) {
        self.host.issue(command);
    }
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Members stepped.
    pub stepped: usize,
    /// Members evicted because their unit is gone.
    pub evicted: usize,
}

/// Owns the groups and the role controllers.
#[derive(Debug, Clone)]
pub struct GroupDispatcher {
    groups: Vec<UnitGroup>,
    worker: WorkerController,
    scout: ScoutController,
    attack: AttackController,
    home_defense_radius: Fixed,
}

impl GroupDispatcher {
    /// Create a dispatcher with no groups.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            groups: Vec::new(),
            worker: WorkerController::new(config),
            scout: ScoutController::new(),
            attack: AttackController::new(config),
            home_defense_radius: Fixed::saturating_from_num(config.home_defense_radius),
        }
    }

    /// Create a group and return its id.
    pub fn add_group(&mut self, role: Role, forced_task: Option<Task>) -> GroupId {
        let id = GroupId(self.groups.len());
        let mut group = UnitGroup::new(id, role);
        group.forced_task = forced_task;
        self.groups.push(group);
        id
    }

    /// Look up a group.
    pub fn group(&self, id: GroupId) -> Result<&UnitGroup> {
        self.groups.get(id.0).ok_or(AgentError::UnknownGroup(id))
    }

    /// Look up a group mutably.
    pub fn group_mut(&mut self, id: GroupId) -> Result<&mut UnitGroup> {
        self.groups.get_mut(id.0).ok_or(AgentError::UnknownGroup(id))
    }

    /// All groups in creation order.
    #[must_use]
    pub fn groups(&self) -> &[UnitGroup] {
        &self.groups
    }

    /// All groups in creation order, mutably.
    pub fn groups_mut(&mut self) -> &mut [UnitGroup] {
        &mut self.groups
    }

    /// Scout controller.
    #[must_use]
    pub fn scout(&self) -> &ScoutController {
        &self.scout
    }

    /// Scout controller, mutably.
    pub fn scout_mut(&mut self) -> &mut ScoutController {
        &mut self.scout
    }

    /// Attack controller.
    #[must_use]
    pub fn attack(&self) -> &AttackController {
        &self.attack
    }

    /// Attack controller, mutably.
    pub fn attack_mut(&mut self) -> &mut AttackController {
        &mut self.attack
    }

    /// Which group holds a live member with this tag.
    #[must_use]
    pub fn find_member(&self, tag: UnitTag) -> Option<GroupId> {
        self.groups.iter().find(|g| g.contains(tag)).map(|g| g.id)
    }

    /// Switch a member's task. Returns `false` when no group holds `tag`.
    ///
    /// A forced group task still overrides this on the next pass.
    pub fn set_task(&mut self, tag: UnitTag, task: Task) -> bool {
        let Some(member) = self.groups.iter_mut().find_map(|g| g.member_mut(tag)) else {
            return false;
        };
        tracing::debug!(%tag, from = ?member.task, to = ?task, "Task reassigned");
        member.task = task;
        true
    }

    /// Walk every group once.
    pub fn step(
        &mut self,
        host: &mut Host<'_>,
        tactics: &TacticalContext,
        locator: &mut SpatialLocator,
    ) -> DispatchReport {
        let Self {
            groups,
            worker,
            scout,
            attack,
            home_defense_radius,
        } = self;
        let mut report = DispatchReport::default();

        for group in groups.iter_mut() {
            let threats = match group.role {
                Role::Attack if tactics.attack_committed => {
                    group.forced_task = Some(Task::Attack);
                    match tactics.enemy {
                        Some(enemy) => threat::evaluate(
                            host.world,
                            Locality::EnemyHalf {
                                enemy,
                                home: tactics.home,
                            },
                        ),
                        None => ThreatAssessment::default(),
                    }
                }
                Role::Worker => threat::evaluate(
                    host.world,
                    Locality::NearHome {
                        home: tactics.home,
                        radius: *home_defense_radius,
                    },
                ),
                _ => ThreatAssessment::default(),
            };

            let forced = group.forced_task;
            let role = group.role;
            let (members, rotation) = group.parts_mut();
            let mut ctx = DispatchContext {
                host: &mut *host,
                tactics,
                locator: &mut *locator,
                threats: &threats,
                rotation,
            };
            let pass = match role {
                Role::Worker => dispatch_members(worker, members, forced, &mut ctx),
                Role::Scout => dispatch_members(scout, members, forced, &mut ctx),
                Role::Attack => dispatch_members(attack, members, forced, &mut ctx),
                Role::Building | Role::Intermediate => {
                    dispatch_members(&mut IdleController, members, forced, &mut ctx)
                }
            };
            report.stepped += pass.stepped;
            report.evicted += pass.evicted;
        }
        report
    }
}

/// Step live members and evict gone ones, firing `on_death` exactly once.
fn dispatch_members<C: RoleController>(
    controller: &mut C,
    members: &mut Vec<ManagedUnit>,
    forced: Option<Task>,
    ctx: &mut DispatchContext<'_, '_>,
) -> DispatchReport {
    let world = ctx.world();
    let mut report = DispatchReport::default();
    let mut index = 0;
    while index < members.len() {
        let live = members[index]
            .tag
            .and_then(|tag| world.unit(tag))
            .filter(|u| u.is_alive && u.health > Fixed::ZERO);
        match live {
            Some(view) => {
                let member = &mut members[index];
                if let Some(task) = forced {
                    member.task = task;
                }
                controller.base_step(member, view, ctx);
                member.refresh(view);
                report.stepped += 1;
                index += 1;
            }
            None => {
                let member = members.remove(index);
                controller.on_death(&member, ctx);
                tracing::debug!(kind = ?member.kind, group = member.group.0, "Evicted gone unit");
                report.evicted += 1;
            }
        }
    }
    report
}
