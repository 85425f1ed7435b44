//! Hostile threat ranking.
//!
//! `danger = dps / (health + shield)`: a hostile that hits hard and dies fast
//! is the best target. Effective health is clamped to 1 so a unit at zero
//! hit points cannot divide by zero.

use crate::math::{Fixed, Vec2Fixed};
use crate::units::UnitTag;
use crate::world::{UnitView, WorldSnapshot};

/// Which hostiles a scorer considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    /// Strictly closer to the enemy base than to home.
    EnemyHalf {
        /// Enemy base estimate.
        enemy: Vec2Fixed,
        /// Own start location.
        home: Vec2Fixed,
    },
    /// Strictly within `radius` of home.
    NearHome {
        /// Own start location.
        home: Vec2Fixed,
        /// Defense radius.
        radius: Fixed,
    },
}

impl Locality {
    /// Whether a point falls inside this locality.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        match *self {
            Self::EnemyHalf { enemy, home } => {
                point.distance_squared(enemy) < point.distance_squared(home)
            }
            Self::NearHome { home, radius } => point.is_within(home, radius),
        }
    }
}

/// A ranked hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatTarget {
    /// Hostile identity.
    pub tag: UnitTag,
    /// Hostile position this tick.
    pub position: Vec2Fixed,
    /// Danger score.
    pub danger: Fixed,
}

/// The two targets a group cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreatAssessment {
    /// Most dangerous hostile, flying or not.
    pub most_dangerous_all: Option<ThreatTarget>,
    /// Most dangerous hostile on the ground.
    pub most_dangerous_ground: Option<ThreatTarget>,
}

impl ThreatAssessment {
    /// Whether nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.most_dangerous_all.is_none()
    }
}

/// Danger score of one hostile.
#[must_use]
pub fn danger(world: &dyn WorldSnapshot, unit: &UnitView) -> Fixed {
    let dps = world
        .type_data(unit.kind)
        .and_then(|d| d.weapon)
        .map_or(Fixed::ZERO, |w| w.dps());
    let effective_health = unit.total_health().max(Fixed::from_num(1));
    dps / effective_health
}

/// Rank every visible hostile inside `locality`.
///
/// Ties go to the hostile reported first by the snapshot.
#[must_use]
pub fn evaluate(world: &dyn WorldSnapshot, locality: Locality) -> ThreatAssessment {
    let mut assessment = ThreatAssessment::default();
    for unit in world.enemy_units() {
        if !unit.is_alive || !locality.contains(unit.position) {
            continue;
        }
        let target = ThreatTarget {
            tag: unit.tag,
            position: unit.position,
            danger: danger(world, unit),
        };
        if assessment
            .most_dangerous_all
            .map_or(true, |best| target.danger > best.danger)
        {
            assessment.most_dangerous_all = Some(target);
        }
        if !unit.is_flying
            && assessment
                .most_dangerous_ground
                .map_or(true, |best| target.danger > best.danger)
        {
            assessment.most_dangerous_ground = Some(target);
        }
    }
    assessment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_half_is_strict() {
        let locality = Locality::EnemyHalf {
            enemy: Vec2Fixed::from_num(100, 0),
            home: Vec2Fixed::from_num(0, 0),
        };
        assert!(locality.contains(Vec2Fixed::from_num(51, 0)));
        assert!(!locality.contains(Vec2Fixed::from_num(50, 0)));
        assert!(!locality.contains(Vec2Fixed::from_num(10, 0)));
    }

    #[test]
    fn test_near_home() {
        let locality = Locality::NearHome {
            home: Vec2Fixed::from_num(0, 0),
            radius: Fixed::from_num(15),
        };
        assert!(locality.contains(Vec2Fixed::from_num(3, 4)));
        assert!(!locality.contains(Vec2Fixed::from_num(15, 0)));
    }
}
