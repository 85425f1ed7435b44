//! Per-role unit behavior.
//!
//! Each role has one controller. The dispatcher hands it one member at a time
//! together with the resolved unit and a [`DispatchContext`] holding the host,
//! the tick's tactical context and the group's threat assessment.

mod attack;
mod scout;
mod worker;

pub use attack::AttackController;
pub use scout::ScoutController;
pub use worker::WorkerController;

use crate::components::ManagedUnit;
use crate::dispatcher::DispatchContext;
use crate::world::UnitView;

/// Behavior of one role.
pub trait RoleController {
    /// Normal per-tick behavior.
    fn step(&mut self, unit: &mut ManagedUnit, view: &UnitView, ctx: &mut DispatchContext<'_, '_>);

    /// Runs instead of [`Self::step`] on a tick the unit lost health.
    fn under_attack(
        &mut self,
        _unit: &mut ManagedUnit,
        _view: &UnitView,
        _ctx: &mut DispatchContext<'_, '_>,
    ) {
    }

    /// Runs once when a member is found gone, before it is evicted.
    fn on_death(&mut self, _unit: &ManagedUnit, _ctx: &mut DispatchContext<'_, '_>) {}

    /// Pick between [`Self::under_attack`] and [`Self::step`].
    fn base_step(
        &mut self,
        unit: &mut ManagedUnit,
        view: &UnitView,
        ctx: &mut DispatchContext<'_, '_>,
    ) {
        if unit.is_under_attack(view) {
            self.under_attack(unit, view, ctx);
        } else {
            self.step(unit, view, ctx);
        }
    }
}

/// Controller for roles with no unit behavior (structures, larva, builders).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleController;

impl RoleController for IdleController {
    fn step(
        &mut self,
        _unit: &mut ManagedUnit,
        _view: &UnitView,
        _ctx: &mut DispatchContext<'_, '_>,
    ) {
    }
}
