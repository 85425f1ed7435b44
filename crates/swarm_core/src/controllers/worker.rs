//! Worker behavior: harvesting and home defense.

use std::collections::HashMap;

use super::RoleController;
use crate::components::{ManagedUnit, Task};
use crate::config::AgentConfig;
use crate::dispatcher::DispatchContext;
use crate::units::{Ability, Target, UnitKind, UnitTag};
use crate::world::{Command, UnitView, WorldSnapshot};

/// Drives the worker group.
#[derive(Debug, Clone)]
pub struct WorkerController {
    mineral_saturation: u32,
}

impl WorkerController {
    /// Create a worker controller.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            mineral_saturation: config.mineral_saturation,
        }
    }

    fn mine(&self, view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        let world = ctx.world();
        if is_harvesting(world, view, UnitKind::is_mineral_field) {
            return;
        }
        let home = ctx.tactics.home;
        let mut fields: Vec<&UnitView> = world
            .neutral_units()
            .into_iter()
            .filter(|u| u.kind.is_mineral_field() && u.mineral_contents > 0)
            .collect();
        fields.sort_by_key(|u| u.position.distance_squared(home));

        let gatherers = gatherer_counts(world);
        let choice = fields
            .iter()
            .find(|f| gatherers.get(&f.tag).copied().unwrap_or(0) < self.mineral_saturation)
            .or_else(|| fields.first());
        if let Some(field) = choice {
            ctx.issue(Command::at_unit(view.tag, Ability::Smart, field.tag));
        }
    }

    fn extract(view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        let world = ctx.world();
        if is_harvesting(world, view, |k| k == UnitKind::Extractor) {
            return;
        }
        let home = ctx.tactics.home;
        let extractor = world
            .own_units()
            .into_iter()
            .filter(|u| {
                u.kind == UnitKind::Extractor
                    && u.is_complete()
                    && u.assigned_harvesters < u.ideal_harvesters
            })
            .min_by_key(|u| u.position.distance_squared(home));
        if let Some(extractor) = extractor {
            ctx.issue(Command::at_unit(view.tag, Ability::Smart, extractor.tag));
        }
    }
}

impl RoleController for WorkerController {
    fn step(&mut self, unit: &mut ManagedUnit, view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        let threats = *ctx.threats;
        let target = if view.kind == UnitKind::Queen && threats.most_dangerous_all.is_some() {
            threats.most_dangerous_all
        } else if ctx.tactics.attack_committed {
            threats.most_dangerous_ground
        } else {
            None
        };
        if let Some(target) = target {
            ctx.issue(Command::at_unit(view.tag, Ability::Attack, target.tag));
            return;
        }

        match unit.task {
            Task::Mine => self.mine(view, ctx),
            Task::Extract => Self::extract(view, ctx),
            _ => {}
        }
    }
}

/// Whether the unit is already gathering from a node `wanted` accepts, or
/// carrying cargo home.
fn is_harvesting(
    world: &dyn WorldSnapshot,
    view: &UnitView,
    wanted: impl Fn(UnitKind) -> bool,
) -> bool {
    for order in &view.orders {
        match order.ability {
            Ability::HarvestReturn => return true,
            Ability::HarvestGather => {
                return match order.target {
                    Target::Unit(tag) => world.unit(tag).is_some_and(|t| wanted(t.kind)),
                    _ => false,
                };
            }
            _ => {}
        }
    }
    false
}

/// Own units currently gathering from each node.
fn gatherer_counts(world: &dyn WorldSnapshot) -> HashMap<UnitTag, u32> {
    let mut counts = HashMap::new();
    for unit in world.own_units() {
        for order in &unit.orders {
            if let (Ability::HarvestGather, Target::Unit(tag)) = (order.ability, order.target) {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
    }
    counts
}
