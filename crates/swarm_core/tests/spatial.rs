//! Placement search, expansion sites and scouting waypoints.

use std::collections::HashSet;

use swarm_core::prelude::*;
use swarm_core::spatial::free_geyser_near;
use swarm_test_utils::fixtures::{point, FakeWorld, PlacementRule};

fn locator_for(world: &FakeWorld) -> SpatialLocator {
    let mut locator = SpatialLocator::new(&AgentConfig::default());
    locator.set_origin(world.start_location(), world.map_center());
    locator
}

fn only(points: &[Vec2Fixed]) -> PlacementRule {
    PlacementRule::Only(points.iter().copied().collect::<HashSet<_>>())
}

const POOL: Ability = Ability::Build(UnitKind::SpawningPool);
const HATCHERY: Ability = Ability::Build(UnitKind::Hatchery);

#[test]
fn test_spiral_checks_anchor_first() {
    let world = FakeWorld::new();
    let locator = locator_for(&world);

    assert_eq!(
        locator.find_building_site(&world, POOL, point(30, 30)),
        Some(point(30, 30))
    );
}

#[test]
fn test_spiral_leans_toward_map_center() {
    let world = FakeWorld::new().with_placement(only(&[point(31, 31), point(29, 30)]));
    let locator = locator_for(&world);

    assert_eq!(
        locator.find_building_site(&world, POOL, point(30, 30)),
        Some(point(31, 31))
    );
}

#[test]
fn test_spiral_mirrors_past_map_center() {
    let mut world = FakeWorld::new().with_placement(only(&[point(99, 98), point(97, 98)]));
    world.start_location = point(98, 98);
    let locator = locator_for(&world);

    assert_eq!(
        locator.find_building_site(&world, POOL, point(98, 98)),
        Some(point(97, 98))
    );
}

#[test]
fn test_spiral_gives_up_when_nothing_fits() {
    let world = FakeWorld::new().with_placement(PlacementRule::Nowhere);
    let locator = locator_for(&world);

    assert_eq!(locator.find_building_site(&world, POOL, point(30, 30)), None);
}

#[test]
fn test_expansion_skips_occupied_home() {
    let world = FakeWorld::standard_start();
    let mut locator = locator_for(&world);

    let spot = locator
        .find_expansion_site(&world, &world, HATCHERY)
        .expect("second base is free");

    assert!(spot.is_within(point(60, 30), Fixed::from_num(6)));
    assert_eq!(locator.base_sites(&world).len(), 2);
}

#[test]
fn test_expansion_none_when_every_site_taken() {
    let mut world = FakeWorld::standard_start();
    world.spawn(UnitKind::Hatchery, Alliance::Own, point(60, 30));
    let mut locator = locator_for(&world);

    assert_eq!(locator.find_expansion_site(&world, &world, HATCHERY), None);
}

#[test]
fn test_expansion_moves_on_when_site_has_no_spot() {
    let mut world = FakeWorld::standard_start();
    world.add_mineral_line(point(100, 30), 6);
    world.placement = only(&[point(101, 31)]);
    let mut locator = locator_for(&world);

    assert_eq!(
        locator.find_expansion_site(&world, &world, HATCHERY),
        Some(point(101, 31))
    );
}

#[test]
fn test_base_sites_are_cached() {
    let mut world = FakeWorld::standard_start();
    let mut locator = locator_for(&world);
    let before = locator.base_sites(&world).to_vec();

    world.add_mineral_line(point(100, 100), 6);

    assert_eq!(locator.base_sites(&world), before.as_slice());
}

#[test]
fn test_scout_waypoints_start_home_and_skip_unreachable() {
    let mut world = FakeWorld::new();
    world.unreachable.insert(point(15, 15));
    let mut locator = locator_for(&world);

    let waypoints = locator.scout_waypoints(&world, &world).to_vec();

    assert_eq!(waypoints[0], world.start_location);
    assert_eq!(waypoints.len(), 1 + 9 * 9 - 1);
    assert!(!waypoints.contains(&point(15, 15)));
    assert!(waypoints.contains(&point(120, 0)));
}

#[test]
fn test_free_geyser_ignores_far_and_taken() {
    let mut world = FakeWorld::new();
    world.spawn(UnitKind::VespeneGeyser, Alliance::Neutral, point(60, 60));
    let taken = world.spawn(UnitKind::VespeneGeyser, Alliance::Neutral, point(35, 30));
    world.spawn(UnitKind::Extractor, Alliance::Own, point(35, 30));
    let free = world.spawn(UnitKind::RichVespeneGeyser, Alliance::Neutral, point(30, 37));

    let found = free_geyser_near(&world, point(30, 30), Fixed::from_num(15)).map(|g| g.tag);

    assert_eq!(found, Some(free));
    assert_ne!(found, Some(taken));
}

#[test]
fn test_zero_grid_step_still_terminates() {
    let world = FakeWorld::new();
    let config = AgentConfig {
        base_radius: 0,
        ..AgentConfig::default()
    };
    let mut locator = SpatialLocator::new(&config);
    locator.set_origin(world.start_location(), world.map_center());

    let waypoints = locator.scout_waypoints(&world, &world);

    assert_eq!(waypoints[0], world.start_location);
    assert!(waypoints.contains(&point(1, 1)));
}
