//! The single estimate of where the enemy base is.

use crate::math::Vec2Fixed;
use crate::spatial::is_townhall;
use crate::units::Alliance;
use crate::world::{UnitView, WorldSnapshot};

/// Enemy base estimate, refreshed once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnemyIntel {
    location: Option<Vec2Fixed>,
}

impl EnemyIntel {
    /// Create with no estimate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current estimate.
    #[must_use]
    pub fn location(&self) -> Option<Vec2Fixed> {
        self.location
    }

    /// Whether the enemy base is known.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.location.is_some()
    }

    /// Set the estimate.
    pub fn set(&mut self, location: Vec2Fixed) {
        self.location = Some(location);
    }

    /// Forget the estimate.
    pub fn clear(&mut self) {
        self.location = None;
    }

    /// Refresh the estimate. A scout's record wins; otherwise the first
    /// visible enemy structure; otherwise the estimate is kept.
    pub fn update(
        &mut self,
        world: &dyn WorldSnapshot,
        scouted: Option<Vec2Fixed>,
    ) -> Option<Vec2Fixed> {
        if let Some(location) = scouted {
            self.location = Some(location);
            return self.location;
        }
        let structure = world.enemy_units().into_iter().find(|u| {
            u.kind.is_structure() || world.type_data(u.kind).is_some_and(|d| d.is_structure)
        });
        if let Some(structure) = structure {
            if self.location != Some(structure.position) {
                tracing::info!(
                    x = %structure.position.x,
                    y = %structure.position.y,
                    "Enemy structure found"
                );
                self.location = Some(structure.position);
            }
        }
        self.location
    }

    /// Whether `unit` is an enemy townhall sitting on the estimate.
    #[must_use]
    pub fn is_base_at_estimate(&self, world: &dyn WorldSnapshot, unit: &UnitView) -> bool {
        unit.alliance == Alliance::Enemy
            && is_townhall(world, unit)
            && self.location == Some(unit.position)
    }
}
