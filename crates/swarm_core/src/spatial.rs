//! Spatial search over the map: base sites, building placement, expansion
//! sites and scouting waypoints.
//!
//! Base sites and waypoints depend only on the map, so both are computed once
//! per match and cached.

use crate::config::AgentConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::units::{Ability, Alliance, UnitKind, UnitTag};
use crate::world::{PathOracle, PlacementOracle, UnitView, WorldSnapshot};

/// A resource node folded into a base site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceNode {
    /// Node identity.
    pub tag: UnitTag,
    /// Node position.
    pub position: Vec2Fixed,
}

/// A cluster of resource nodes where a townhall can go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSite {
    /// Running average of member positions.
    pub centroid: Vec2Fixed,
    /// Member nodes in fold order.
    pub members: Vec<ResourceNode>,
}

impl BaseSite {
    /// The member nearest the centroid, first one on ties.
    #[must_use]
    pub fn anchor_node(&self) -> Option<&ResourceNode> {
        let mut best: Option<(&ResourceNode, Fixed)> = None;
        for node in &self.members {
            let d = node.position.distance_squared(self.centroid);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((node, d));
            }
        }
        best.map(|(node, _)| node)
    }
}

/// Online clustering of resource nodes into base sites.
///
/// The first centroid is `home` with no members, so the first node that
/// joins it replaces it outright. Each node joins the first centroid strictly
/// within `radius`, else seeds a new one. Sites are returned nearest-to-home
/// first.
#[must_use]
pub fn cluster_resources(home: Vec2Fixed, nodes: &[ResourceNode], radius: Fixed) -> Vec<BaseSite> {
    let mut sites = vec![BaseSite {
        centroid: home,
        members: Vec::new(),
    }];

    for node in nodes {
        match sites
            .iter_mut()
            .find(|site| site.centroid.is_within(node.position, radius))
        {
            Some(site) => {
                let n = Fixed::from_num(site.members.len());
                site.centroid = (site.centroid.scale(n) + node.position)
                    .div_scalar(n + Fixed::from_num(1));
                site.members.push(*node);
            }
            None => sites.push(BaseSite {
                centroid: node.position,
                members: vec![*node],
            }),
        }
    }

    sites.sort_by_key(|site| site.centroid.distance_squared(home));
    sites
}

/// Map search with per-match caches.
#[derive(Debug, Clone)]
pub struct SpatialLocator {
    home: Vec2Fixed,
    map_center: Vec2Fixed,
    cluster_radius: Fixed,
    base_radius: Fixed,
    expansion_clearance: Fixed,
    placement_search_radius: u32,
    base_sites: Option<Vec<BaseSite>>,
    waypoints: Option<Vec<Vec2Fixed>>,
}

impl SpatialLocator {
    /// Create a locator with no origin yet.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            home: Vec2Fixed::ZERO,
            map_center: Vec2Fixed::ZERO,
            cluster_radius: Fixed::saturating_from_num(config.cluster_radius),
            base_radius: Fixed::saturating_from_num(config.base_radius),
            expansion_clearance: Fixed::saturating_from_num(config.expansion_clearance),
            placement_search_radius: config.placement_search_radius,
            base_sites: None,
            waypoints: None,
        }
    }

    /// Set home and map center and drop cached results.
    pub fn set_origin(&mut self, home: Vec2Fixed, map_center: Vec2Fixed) {
        self.home = home;
        self.map_center = map_center;
        self.base_sites = None;
        self.waypoints = None;
    }

    /// Own start location.
    #[must_use]
    pub fn home(&self) -> Vec2Fixed {
        self.home
    }

    /// Center of the playable area.
    #[must_use]
    pub fn map_center(&self) -> Vec2Fixed {
        self.map_center
    }

    /// Base sites nearest-to-home first, clustered on first use.
    pub fn base_sites(&mut self, world: &dyn WorldSnapshot) -> &[BaseSite] {
        self.ensure_base_sites(world);
        self.base_sites.as_deref().unwrap_or(&[])
    }

    fn ensure_base_sites(&mut self, world: &dyn WorldSnapshot) {
        if self.base_sites.is_some() {
            return;
        }
        let nodes: Vec<ResourceNode> = world
            .neutral_units()
            .into_iter()
            .filter(|u| u.kind.is_resource())
            .map(|u| ResourceNode {
                tag: u.tag,
                position: u.position,
            })
            .collect();
        let sites = cluster_resources(self.home, &nodes, self.cluster_radius);
        tracing::debug!(sites = sites.len(), nodes = nodes.len(), "Clustered base sites");
        self.base_sites = Some(sites);
    }

    fn spiral_directions(&self) -> ([i32; 4], [i32; 4]) {
        let mut dx = [1, 0, -1, 0];
        let mut dy = [0, 1, 0, -1];
        if self.home.x > self.map_center.x {
            dx = [-1, 0, 1, 0];
        }
        if self.home.y > self.map_center.y {
            dy = [0, -1, 0, 1];
        }
        (dx, dy)
    }

    /// Walk outward from `anchor` in rings of growing length, checking each
    /// point before stepping. Leans toward the map center.
    #[must_use]
    pub fn find_building_site(
        &self,
        placement: &dyn PlacementOracle,
        ability: Ability,
        anchor: Vec2Fixed,
    ) -> Option<Vec2Fixed> {
        let (dx, dy) = self.spiral_directions();
        let mut current = anchor;
        for ring in 1..=self.placement_search_radius {
            for dir in 0..4 {
                let step_x = Fixed::from_num(dx[dir]);
                let step_y = Fixed::from_num(dy[dir]);
                for _ in 0..ring {
                    if placement.can_place(ability, current) {
                        return Some(current);
                    }
                    current = current.offset(step_x, step_y);
                }
            }
        }
        None
    }

    /// First free base site, nearest home first, with a legal townhall spot.
    pub fn find_expansion_site(
        &mut self,
        world: &dyn WorldSnapshot,
        placement: &dyn PlacementOracle,
        ability: Ability,
    ) -> Option<Vec2Fixed> {
        self.ensure_base_sites(world);
        let townhalls: Vec<Vec2Fixed> = world
            .own_units()
            .into_iter()
            .filter(|u| is_townhall(world, u))
            .map(|u| u.position)
            .collect();

        let sites = self.base_sites.as_deref().unwrap_or(&[]);
        for site in sites {
            let taken = townhalls
                .iter()
                .any(|t| t.is_within(site.centroid, self.expansion_clearance));
            if taken {
                continue;
            }
            let anchor = site.anchor_node().map_or(site.centroid, |n| n.position);
            if let Some(spot) = self.find_building_site(placement, ability, anchor) {
                return Some(spot);
            }
        }
        None
    }

    /// Start location, then every grid point reachable from the map center.
    pub fn scout_waypoints(
        &mut self,
        world: &dyn WorldSnapshot,
        paths: &dyn PathOracle,
    ) -> &[Vec2Fixed] {
        if self.waypoints.is_none() {
            let min = world.playable_min();
            let max = world.playable_max();
            let stride = self.base_radius.max(Fixed::from_num(1));
            let mut points = vec![world.start_location()];
            let mut x = min.x;
            while x < max.x {
                let mut y = min.y;
                while y < max.y {
                    let waypoint = Vec2Fixed::new(x, y);
                    if paths.is_reachable(self.map_center, waypoint) {
                        points.push(waypoint);
                    }
                    y += stride;
                }
                x += stride;
            }
            tracing::debug!(waypoints = points.len(), "Built scouting grid");
            self.waypoints = Some(points);
        }
        self.waypoints.as_deref().unwrap_or(&[])
    }
}

/// A neutral geyser strictly within `radius` of `anchor` with no own
/// extractor on it.
#[must_use]
pub fn free_geyser_near<'w>(
    world: &'w dyn WorldSnapshot,
    anchor: Vec2Fixed,
    radius: Fixed,
) -> Option<&'w UnitView> {
    let extractors: Vec<Vec2Fixed> = world
        .own_units()
        .into_iter()
        .filter(|u| u.kind == UnitKind::Extractor)
        .map(|u| u.position)
        .collect();
    world.units().iter().find(|u| {
        u.alliance == Alliance::Neutral
            && u.kind.is_geyser()
            && u.position.is_within(anchor, radius)
            && !extractors
                .iter()
                .any(|e| e.is_within(u.position, Fixed::from_num(1)))
    })
}

/// Whether a unit is a townhall, by roster or by host type data.
#[must_use]
pub fn is_townhall(world: &dyn WorldSnapshot, unit: &UnitView) -> bool {
    unit.kind.is_townhall() || world.type_data(unit.kind).is_some_and(|d| d.is_townhall)
}
