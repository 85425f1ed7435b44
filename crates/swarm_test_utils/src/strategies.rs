//! Proptest strategies.
//!
//! These generate random but reproducible inputs for property-based tests of
//! scheduling, clustering and threat scoring.

use proptest::prelude::*;
use swarm_core::math::{Fixed, Vec2Fixed};
use swarm_core::production::BuildKind;
use swarm_core::spatial::ResourceNode;
use swarm_core::units::{Alliance, UnitKind, UnitTag};
use swarm_core::world::UnitView;

use crate::fixtures::{unit, ENEMY_MARINE, ENEMY_VIKING};

/// Kinds a larva can turn into.
pub const LARVA_KINDS: [UnitKind; 4] = [
    UnitKind::Drone,
    UnitKind::Overlord,
    UnitKind::Zergling,
    UnitKind::Roach,
];

/// Generate a map coordinate.
///
/// Range: 0 to 200 (typical map size)
pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
    (0i32..200i32).prop_map(Fixed::from_num)
}

/// Generate a map position.
pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
    (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
}

/// Generate a request priority.
pub fn arb_priority() -> impl Strategy<Value = i32> {
    -50i32..150i32
}

/// Generate a larva-produced build kind.
pub fn arb_larva_kind() -> impl Strategy<Value = BuildKind> {
    proptest::sample::select(LARVA_KINDS.to_vec()).prop_map(BuildKind::Unit)
}

/// Generate a list of (priority, kind) requests.
pub fn arb_requests(max_len: usize) -> impl Strategy<Value = Vec<(i32, BuildKind)>> {
    proptest::collection::vec((arb_priority(), arb_larva_kind()), 0..max_len)
}

/// Generate mineral fields scattered over the map.
pub fn arb_resource_nodes(max_len: usize) -> impl Strategy<Value = Vec<ResourceNode>> {
    proptest::collection::vec(arb_position(), 0..max_len).prop_map(|points| {
        points
            .into_iter()
            .enumerate()
            .map(|(i, position)| ResourceNode {
                tag: UnitTag(i as u64 + 1),
                position,
            })
            .collect()
    })
}

/// Generate health values (1-500).
pub fn arb_health() -> impl Strategy<Value = i32> {
    1i32..500i32
}

/// Generate an alive enemy unit, ground or air.
pub fn arb_enemy(tag: u64) -> impl Strategy<Value = UnitView> {
    (arb_position(), arb_health(), any::<bool>()).prop_map(move |(position, health, air)| {
        let kind = if air { ENEMY_VIKING } else { ENEMY_MARINE };
        let mut view = unit(tag, kind, Alliance::Enemy, position);
        view.health = Fixed::from_num(health);
        view
    })
}

/// Generate a list of enemy units with distinct tags.
pub fn arb_enemies(max_len: usize) -> impl Strategy<Value = Vec<UnitView>> {
    (0..max_len).prop_flat_map(|len| {
        (0..len)
            .map(|i| arb_enemy(5000 + i as u64))
            .collect::<Vec<_>>()
    })
}
