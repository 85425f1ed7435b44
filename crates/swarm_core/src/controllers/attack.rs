//! Army behavior: rally short of the enemy, then commit.

use super::RoleController;
use crate::components::{ManagedUnit, Task};
use crate::config::AgentConfig;
use crate::dispatcher::DispatchContext;
use crate::math::{percent, Fixed};
use crate::units::{Ability, UnitKind};
use crate::world::{Command, UnitView};

/// Drives the attack group. Owns the commit flag and the approach distance.
#[derive(Debug, Clone)]
pub struct AttackController {
    approach_distance: Fixed,
    committed: bool,
    trigger: UnitKind,
    air_capable: Vec<UnitKind>,
    rally_fraction: Fixed,
}

impl AttackController {
    /// Create an uncommitted attack controller.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            approach_distance: Fixed::saturating_from_num(config.initial_approach_distance),
            committed: false,
            trigger: config.attack_trigger,
            air_capable: config.air_capable.clone(),
            rally_fraction: percent(config.rally_percent),
        }
    }

    /// Whether the group has committed to the attack.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Current approach distance.
    #[must_use]
    pub fn approach_distance(&self) -> Fixed {
        self.approach_distance
    }

    fn rally(&mut self, view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        let tactics = *ctx.tactics;
        let Some(enemy) = tactics.enemy else {
            ctx.issue(Command::at_point(view.tag, Ability::Move, tactics.map_center));
            return;
        };
        if !view.position.is_within(enemy, self.approach_distance) {
            ctx.issue(Command::at_point(view.tag, Ability::Move, enemy));
            return;
        }
        let rally_point = tactics.home.lerp(enemy, self.rally_fraction);
        ctx.issue(Command::at_point(view.tag, Ability::Move, rally_point));
        if view.kind == self.trigger && !self.committed {
            self.committed = true;
            tracing::info!(trigger = ?view.kind, "Attack committed");
        }
    }

    fn attack(&self, view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        let threats = *ctx.threats;
        if self.air_capable.contains(&view.kind) {
            if let Some(target) = threats.most_dangerous_all {
                ctx.issue(Command::at_unit(view.tag, Ability::Attack, target.tag));
                if view.kind == self.trigger {
                    ctx.issue(Command::at_point(
                        view.tag,
                        Ability::CorrosiveBile,
                        target.position,
                    ));
                }
                return;
            }
        } else if let Some(target) = threats.most_dangerous_ground {
            ctx.issue(Command::at_unit(view.tag, Ability::Attack, target.tag));
            return;
        }
        let destination = ctx.tactics.enemy.unwrap_or(ctx.tactics.map_center);
        ctx.issue(Command::at_point(view.tag, Ability::Attack, destination));
    }
}

impl RoleController for AttackController {
    fn step(&mut self, unit: &mut ManagedUnit, view: &UnitView, ctx: &mut DispatchContext<'_, '_>) {
        match unit.task {
            Task::Rally => self.rally(view, ctx),
            Task::Attack => self.attack(view, ctx),
            _ => {}
        }
    }

    fn under_attack(
        &mut self,
        unit: &mut ManagedUnit,
        view: &UnitView,
        ctx: &mut DispatchContext<'_, '_>,
    ) {
        match unit.task {
            Task::Rally => {
                if let Some(enemy) = ctx.tactics.enemy {
                    let pushed = view.position.distance(enemy) + Fixed::from_num(1);
                    self.approach_distance =
                        (self.approach_distance + Fixed::from_num(1)).max(pushed);
                    tracing::debug!(
                        approach = %self.approach_distance,
                        "Rally contact, approach widened"
                    );
                }
            }
            _ => self.step(unit, view, ctx),
        }
    }
}
