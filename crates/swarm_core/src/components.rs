//! Managed units and the role-tagged groups that own them.
//!
//! A group owns its members outright. Members point back at their group by
//! [`GroupId`] only, and at their game unit by [`UnitTag`] only; the unit
//! itself is re-resolved against the snapshot every tick.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::units::{UnitKind, UnitTag};
use crate::world::UnitView;

// ============================================================================
// Identity
// ============================================================================

/// Index of a group inside the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// What a group is for. Selects the controller that drives its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Finds the enemy and keeps map vision.
    Scout,
    /// Rallies, then fights.
    Attack,
    /// Harvests and defends home.
    Worker,
    /// Completed and in-progress structures.
    Building,
    /// Production material and units between roles (larva, builders).
    Intermediate,
}

impl Role {
    /// Task a freshly enrolled unit of `kind` starts with in this role.
    #[must_use]
    pub fn default_task(self, kind: UnitKind, enemy_known: bool) -> Task {
        match (self, kind) {
            (Self::Worker, UnitKind::Drone) => Task::Mine,
            (Self::Scout, UnitKind::Overlord) => Task::Scout,
            (Self::Scout, _) if enemy_known => Task::Scout,
            (Self::Scout, _) => Task::FastScout,
            (Self::Attack, _) => Task::Rally,
            _ => Task::Unset,
        }
    }
}

/// Per-unit behavior selector inside a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Task {
    /// No behavior.
    #[default]
    Unset,
    /// Engage the most dangerous target.
    Attack,
    /// Gather minerals.
    Mine,
    /// Gather vespene.
    Extract,
    /// Cycle base sites.
    Scout,
    /// Cycle every reachable waypoint.
    ScoutAll,
    /// Cycle candidate enemy start locations.
    FastScout,
    /// Plain movement.
    Move,
    /// Gather short of the enemy base.
    Rally,
}

// ============================================================================
// Managed Unit
// ============================================================================

/// The engine's record of one own unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedUnit {
    /// Game unit, `None` once the host has reported it destroyed.
    pub tag: Option<UnitTag>,
    /// Unit type at enrollment.
    pub kind: UnitKind,
    /// Current behavior selector.
    pub task: Task,
    /// Owning group.
    pub group: GroupId,
    /// Health seen on the previous dispatch pass.
    #[serde(with = "fixed_serde")]
    pub prior_health: Fixed,
    /// Position seen on the previous dispatch pass.
    pub prior_position: Vec2Fixed,
}

impl ManagedUnit {
    /// Start tracking a unit.
    #[must_use]
    pub fn new(view: &UnitView, group: GroupId, task: Task) -> Self {
        Self {
            tag: Some(view.tag),
            kind: view.kind,
            task,
            group,
            prior_health: view.health,
            prior_position: view.position,
        }
    }

    /// Whether the unit has been reported destroyed.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        self.tag.is_none()
    }

    /// Record that the unit no longer exists.
    pub fn mark_gone(&mut self) {
        self.tag = None;
    }

    /// Whether the unit lost health since the previous pass.
    #[must_use]
    pub fn is_under_attack(&self, current: &UnitView) -> bool {
        current.health < self.prior_health
    }

    /// Store this pass's health and position for the next comparison.
    pub fn refresh(&mut self, current: &UnitView) {
        self.prior_health = current.health;
        self.prior_position = current.position;
    }
}

// ============================================================================
// Unit Group
// ============================================================================

/// A role-tagged collection of managed units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGroup {
    /// Index in the dispatcher.
    pub id: GroupId,
    /// Controller selector.
    pub role: Role,
    /// Task written over every member's task each step, when set.
    pub forced_task: Option<Task>,
    /// Admission cap used by the scout group.
    pub size_trigger: usize,
    members: Vec<ManagedUnit>,
    rotation: usize,
}

impl UnitGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new(id: GroupId, role: Role) -> Self {
        Self {
            id,
            role,
            forced_task: None,
            size_trigger: 0,
            members: Vec::new(),
            rotation: 0,
        }
    }

    /// Builder: force a task on every member.
    #[must_use]
    pub fn with_forced_task(mut self, task: Task) -> Self {
        self.forced_task = Some(task);
        self
    }

    /// Enroll a unit. The forced task, when set, wins over `task`.
    ///
    /// Returns `false` without change if the unit is already a member.
    pub fn enroll(&mut self, view: &UnitView, task: Task) -> bool {
        if self.contains(view.tag) {
            return false;
        }
        let task = self.forced_task.unwrap_or(task);
        self.members.push(ManagedUnit::new(view, self.id, task));
        true
    }

    /// Take over a member from another group. The forced task, when set,
    /// wins over `task`.
    pub fn adopt(&mut self, mut member: ManagedUnit, task: Task) {
        member.group = self.id;
        member.task = self.forced_task.unwrap_or(task);
        self.members.push(member);
    }

    /// Whether a live member has this tag.
    #[must_use]
    pub fn contains(&self, tag: UnitTag) -> bool {
        self.members.iter().any(|m| m.tag == Some(tag))
    }

    /// Look up a member by tag.
    #[must_use]
    pub fn member(&self, tag: UnitTag) -> Option<&ManagedUnit> {
        self.members.iter().find(|m| m.tag == Some(tag))
    }

    /// Look up a member by tag, mutably.
    pub fn member_mut(&mut self, tag: UnitTag) -> Option<&mut ManagedUnit> {
        self.members.iter_mut().find(|m| m.tag == Some(tag))
    }

    /// Take a member out of the group.
    pub fn remove(&mut self, tag: UnitTag) -> Option<ManagedUnit> {
        let index = self.members.iter().position(|m| m.tag == Some(tag))?;
        Some(self.members.remove(index))
    }

    /// Mark a member as destroyed. It is evicted on the next dispatch pass.
    pub fn mark_gone(&mut self, tag: UnitTag) -> bool {
        match self.member_mut(tag) {
            Some(member) => {
                member.mark_gone();
                true
            }
            None => false,
        }
    }

    /// All members in enrollment order.
    #[must_use]
    pub fn members(&self) -> &[ManagedUnit] {
        &self.members
    }

    /// Number of members, including ones marked gone.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Shared waypoint rotation index.
    #[must_use]
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// Split borrow of the member list and the rotation index for dispatch.
    pub fn parts_mut(&mut self) -> (&mut Vec<ManagedUnit>, &mut usize) {
        (&mut self.members, &mut self.rotation)
    }
}

/// The fixed set of groups every agent creates, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupIds {
    /// Larva and builders.
    pub intermediate: GroupId,
    /// Scouts.
    pub scout: GroupId,
    /// Army.
    pub attack: GroupId,
    /// Drones and queens.
    pub worker: GroupId,
    /// Structures.
    pub building: GroupId,
}

impl GroupIds {
    /// The group of a role.
    #[must_use]
    pub const fn of(&self, role: Role) -> GroupId {
        match role {
            Role::Intermediate => self.intermediate,
            Role::Scout => self.scout,
            Role::Attack => self.attack,
            Role::Worker => self.worker,
            Role::Building => self.building,
        }
    }
}

/// Advance a rotation index over `len` waypoints and return the new index.
pub fn advance_rotation(rotation: &mut usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    *rotation = (*rotation + 1) % len;
    *rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Alliance;

    fn view(tag: u64, kind: UnitKind) -> UnitView {
        UnitView {
            tag: UnitTag(tag),
            kind,
            alliance: Alliance::Own,
            position: Vec2Fixed::from_num(10, 10),
            health: Fixed::from_num(40),
            shield: Fixed::ZERO,
            energy: Fixed::ZERO,
            is_flying: false,
            is_alive: true,
            build_progress: Fixed::from_num(1),
            orders: Vec::new(),
            assigned_harvesters: 0,
            ideal_harvesters: 0,
            mineral_contents: 0,
        }
    }

    #[test]
    fn test_forced_task_wins_on_enroll() {
        let mut group = UnitGroup::new(GroupId(2), Role::Attack).with_forced_task(Task::Rally);
        assert!(group.enroll(&view(1, UnitKind::Roach), Task::Mine));
        assert_eq!(group.members()[0].task, Task::Rally);
        assert_eq!(group.members()[0].group, GroupId(2));
    }

    #[test]
    fn test_enroll_is_idempotent() {
        let mut group = UnitGroup::new(GroupId(0), Role::Worker);
        assert!(group.enroll(&view(1, UnitKind::Drone), Task::Mine));
        assert!(!group.enroll(&view(1, UnitKind::Drone), Task::Mine));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_under_attack_compares_prior_health() {
        let mut unit = view(1, UnitKind::Zergling);
        let managed = ManagedUnit::new(&unit, GroupId(0), Task::Rally);
        assert!(!managed.is_under_attack(&unit));
        unit.health = Fixed::from_num(30);
        assert!(managed.is_under_attack(&unit));
    }

    #[test]
    fn test_managed_unit_survives_ron() {
        let mut unit = view(3, UnitKind::Roach);
        unit.health = Fixed::from_num(72.5);
        unit.energy = Fixed::from_num(25);
        let managed = ManagedUnit::new(&unit, GroupId(2), Task::Rally);

        let text = ron::to_string(&managed).unwrap();
        let back: ManagedUnit = ron::from_str(&text).unwrap();
        assert_eq!(back, managed);
        assert_eq!(back.prior_health, Fixed::from_num(72.5));

        let text = ron::to_string(&unit).unwrap();
        let back: UnitView = ron::from_str(&text).unwrap();
        assert_eq!(back, unit);
    }

    #[test]
    fn test_mark_gone_clears_tag() {
        let mut group = UnitGroup::new(GroupId(0), Role::Worker);
        group.enroll(&view(7, UnitKind::Drone), Task::Mine);
        assert!(group.mark_gone(UnitTag(7)));
        assert!(group.members()[0].is_gone());
        assert!(!group.contains(UnitTag(7)));
    }

    #[test]
    fn test_advance_rotation_wraps() {
        let mut rotation = 0;
        assert_eq!(advance_rotation(&mut rotation, 3), 1);
        assert_eq!(advance_rotation(&mut rotation, 3), 2);
        assert_eq!(advance_rotation(&mut rotation, 3), 0);
        assert_eq!(advance_rotation(&mut rotation, 0), 0);
    }

    #[test]
    fn test_default_tasks() {
        assert_eq!(Role::Worker.default_task(UnitKind::Drone, false), Task::Mine);
        assert_eq!(Role::Worker.default_task(UnitKind::Queen, false), Task::Unset);
        assert_eq!(Role::Scout.default_task(UnitKind::Overlord, false), Task::Scout);
        assert_eq!(Role::Scout.default_task(UnitKind::Zergling, false), Task::FastScout);
        assert_eq!(Role::Scout.default_task(UnitKind::Zergling, true), Task::Scout);
        assert_eq!(Role::Attack.default_task(UnitKind::Roach, true), Task::Rally);
    }
}
