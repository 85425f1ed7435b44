//! Scouting behavior.

use super::RoleController;
use crate::components::{advance_rotation, ManagedUnit, Task};
use crate::dispatcher::DispatchContext;
use crate::math::Vec2Fixed;
use crate::units::Ability;
use crate::world::{Command, UnitView, WorldSnapshot};

/// Drives the scout group and keeps the scouts' own enemy base estimate.
#[derive(Debug, Clone, Default)]
pub struct ScoutController {
    recorded_enemy: Option<Vec2Fixed>,
}

impl ScoutController {
    /// Create a scout controller with no estimate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The enemy base location recorded by a scout, if any.
    #[must_use]
    pub fn recorded_enemy(&self) -> Option<Vec2Fixed> {
        self.recorded_enemy
    }

    /// Set the estimate directly (single start location maps).
    pub fn record_enemy(&mut self, location: Vec2Fixed) {
        self.recorded_enemy = Some(location);
    }

    /// Forget the estimate.
    pub fn clear_record(&mut self) {
        self.recorded_enemy = None;
    }

    /// A fast scout was hit or killed near `prior`: the closest candidate
    /// start location is probably the enemy's.
    fn infer_enemy(&mut self, world: &dyn WorldSnapshot, prior: Vec2Fixed, known: bool) {
        if known || self.recorded_enemy.is_some() {
            return;
        }
        let nearest = world
            .enemy_start_locations()
            .iter()
            .copied()
            .min_by_key(|loc| loc.distance_squared(prior));
        if let Some(location) = nearest {
            tracing::info!(
                x = %location.x,
                y = %location.y,
                "Enemy base inferred from scout contact"
            );
            self.recorded_enemy = Some(location);
        }
    }

    fn fast_scout(
        &self,
        unit: &mut ManagedUnit,
        view: &UnitView,
        ctx: &mut DispatchContext<'_, '_>,
    ) {
        if !view.is_idle() {
            return;
        }
        if ctx.tactics.enemy.is_some() || self.recorded_enemy.is_some() {
            unit.task = Task::Scout;
            return;
        }
        let candidates = ctx.world().enemy_start_locations();
        if candidates.is_empty() {
            return;
        }
        let index = advance_rotation(ctx.rotation, candidates.len());
        ctx.issue(Command::at_point(view.tag, Ability::Smart, candidates[index]));
    }

    fn scout_bases(view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        if !ctx.tactics.attack_committed || !view.is_idle() {
            return;
        }
        let world = ctx.world();
        let origin = ctx.tactics.enemy.unwrap_or(ctx.tactics.home);
        let mut targets: Vec<Vec2Fixed> = ctx
            .locator
            .base_sites(world)
            .iter()
            .map(|s| s.centroid)
            .collect();
        targets.sort_by_key(|p| p.distance_squared(origin));
        if let Some(enemy) = ctx.tactics.enemy {
            targets.insert(0, enemy);
        }
        if targets.is_empty() {
            return;
        }
        let index = advance_rotation(ctx.rotation, targets.len());
        ctx.issue(Command::at_point(view.tag, Ability::Smart, targets[index]));
    }

    fn scout_all(view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        if !ctx.tactics.attack_committed || !view.is_idle() {
            return;
        }
        let world = ctx.world();
        let waypoint = {
            let waypoints = ctx.locator.scout_waypoints(world, ctx.host.paths);
            if waypoints.is_empty() {
                return;
            }
            let index = advance_rotation(ctx.rotation, waypoints.len());
            waypoints[index]
        };
        ctx.issue(Command::at_point(view.tag, Ability::Smart, waypoint));
    }
}

impl RoleController for ScoutController {
    fn step(&mut self, unit: &mut ManagedUnit, view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        match unit.task {
            Task::FastScout => self.fast_scout(unit, view, ctx),
            Task::Scout => Self::scout_bases(view, ctx),
            Task::ScoutAll => Self::scout_all(view, ctx),
            _ => {}
        }
    }

    fn under_attack(
        &mut self,
        unit: &mut ManagedUnit,
        view: &UnitView,
        ctx: &mut DispatchContext<'_, '_>,
    ) {
        if unit.task == Task::FastScout {
            self.infer_enemy(ctx.world(), unit.prior_position, ctx.tactics.enemy.is_some());
        }
        let home = ctx.tactics.home;
        ctx.issue(Command::at_point(view.tag, Ability::Smart, home));
    }

    fn on_death(&mut self, unit: &ManagedUnit, ctx: &mut DispatchContext<'_, '_>) {
        if unit.task == Task::FastScout {
            self.infer_enemy(ctx.world(), unit.prior_position, ctx.tactics.enemy.is_some());
        }
    }
}
