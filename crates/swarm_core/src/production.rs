//! Production attempts against one tick's snapshot.
//!
//! A [`ProductionContext`] lives for a single drain. It tracks the resources
//! already committed this tick and the producers already used, so two
//! requests in the same drain can neither spend the same minerals nor order
//! the same larva.
//!
//! All calculations use integer/fixed-point math for deterministic decisions.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{GroupId, GroupIds, Task, UnitGroup};
use crate::config::AgentConfig;
use crate::math::Fixed;
use crate::spatial::{free_geyser_near, is_townhall, SpatialLocator};
use crate::units::{Ability, Placement, Producer, Target, UnitKind, UnitTag, Upgrade};
use crate::world::{Command, Cost, Host, UnitView, WorldSnapshot};

/// What a build request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildKind {
    /// A unit or structure.
    Unit(UnitKind),
    /// An upgrade researched at a structure.
    Research {
        /// Upgrade to research.
        upgrade: Upgrade,
        /// Structure that researches it.
        at: UnitKind,
    },
}

impl BuildKind {
    /// The unit kind produced, if any.
    #[must_use]
    pub const fn unit_kind(self) -> Option<UnitKind> {
        match self {
            Self::Unit(kind) => Some(kind),
            Self::Research { .. } => None,
        }
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(kind) => write!(f, "{kind:?}"),
            Self::Research { upgrade, at } => write!(f, "{upgrade:?} at {at:?}"),
        }
    }
}

/// Why a production attempt did not go through this tick.
///
/// Every variant is a transient shortfall; the request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Supply cap reached.
    #[error("Supply blocked")]
    SupplyBlocked,
    /// Not enough minerals left this tick.
    #[error("Insufficient minerals")]
    InsufficientMinerals,
    /// Not enough vespene left this tick.
    #[error("Insufficient vespene")]
    InsufficientVespene,
    /// Required structure is not complete.
    #[error("Missing prerequisite: {0:?}")]
    MissingPrerequisite(UnitKind),
    /// No idle producer available.
    #[error("No free producer")]
    NoProducer,
    /// No legal location for the structure.
    #[error("No valid placement")]
    NoPlacement,
    /// The host has no cost data for this kind.
    #[error("Unknown cost for {0}")]
    UnknownCost(BuildKind),
    /// The engine has no recipe for this kind.
    #[error("Cannot produce {0:?}")]
    NotProducible(UnitKind),
}

/// Resources and supply still uncommitted in this drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Minerals left.
    pub minerals: u32,
    /// Vespene left.
    pub vespene: u32,
    /// Supply used including this drain's orders.
    pub supply_used: u32,
    /// Supply cap.
    pub supply_cap: u32,
}

impl Budget {
    /// Take the snapshot's bank as the starting budget.
    #[must_use]
    pub fn from_world(world: &dyn WorldSnapshot) -> Self {
        Self {
            minerals: world.minerals(),
            vespene: world.vespene(),
            supply_used: world.supply_used(),
            supply_cap: world.supply_cap(),
        }
    }

    /// Check a cost without spending it.
    pub fn check(&self, cost: &Cost) -> Result<(), BuildError> {
        if cost.supply > 0 && self.supply_used + cost.supply > self.supply_cap {
            return Err(BuildError::SupplyBlocked);
        }
        if self.minerals < cost.minerals {
            return Err(BuildError::InsufficientMinerals);
        }
        if self.vespene < cost.vespene {
            return Err(BuildError::InsufficientVespene);
        }
        Ok(())
    }

    /// Commit a cost.
    pub fn spend(&mut self, cost: &Cost) {
        self.minerals = self.minerals.saturating_sub(cost.minerals);
        self.vespene = self.vespene.saturating_sub(cost.vespene);
        self.supply_used += cost.supply;
    }
}

/// A successful production order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issued {
    /// Unit that received the order.
    pub producer: UnitTag,
    /// Units that will appear.
    pub yield_count: u32,
    /// Whether new units will appear that need a group.
    pub spawns_units: bool,
}

/// Per-drain production state.
pub struct ProductionContext<'p, 'h> {
    host: &'p mut Host<'h>,
    groups: &'p mut [UnitGroup],
    ids: GroupIds,
    locator: &'p mut SpatialLocator,
    config: &'p AgentConfig,
    budget: Budget,
    claimed: HashSet<UnitTag>,
    injected: bool,
}

impl<'p, 'h> ProductionContext<'p, 'h> {
    /// Start a drain.
    pub fn new(
        host: &'p mut Host<'h>,
        groups: &'p mut [UnitGroup],
        ids: GroupIds,
        locator: &'p mut SpatialLocator,
        config: &'p AgentConfig,
    ) -> Self {
        let budget = Budget::from_world(host.world);
        Self {
            host,
            groups,
            ids,
            locator,
            config,
            budget,
            claimed: HashSet::new(),
            injected: false,
        }
    }

    /// Resources still uncommitted.
    #[must_use]
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// The snapshot this drain runs against.
    #[must_use]
    pub fn world(&self) -> &'h dyn WorldSnapshot {
        self.host.world
    }

    /// Try to place one order for `kind`.
    pub fn attempt(&mut self, kind: BuildKind) -> Result<Issued, BuildError> {
        match kind {
            BuildKind::Unit(unit) => self.attempt_unit(unit),
            BuildKind::Research { upgrade, at } => self.attempt_research(upgrade, at),
        }
    }

    fn attempt_unit(&mut self, kind: UnitKind) -> Result<Issued, BuildError> {
        let world = self.host.world;
        let recipe = kind.recipe().ok_or(BuildError::NotProducible(kind))?;
        if let Some(required) = recipe.requires {
            if !has_completed(world, required) {
                return Err(BuildError::MissingPrerequisite(required));
            }
        }
        let cost = world
            .type_data(kind)
            .map(|d| d.cost)
            .ok_or(BuildError::UnknownCost(BuildKind::Unit(kind)))?;
        self.budget.check(&cost)?;

        let (producer, target) = match recipe.producer {
            Producer::Larva => match self.idle_larva() {
                Some(tag) => (tag, Target::None),
                None => {
                    if !self.injected {
                        self.injected = true;
                        self.inject_larva();
                    }
                    return Err(BuildError::NoProducer);
                }
            },
            Producer::Townhall => {
                let townhall = self.idle_townhall().ok_or(BuildError::NoProducer)?;
                (townhall, Target::None)
            }
            Producer::Morph(source) => {
                (self.morph_source(source).ok_or(BuildError::NoProducer)?, Target::None)
            }
            Producer::Worker(placement) => {
                let builder = self.builder().ok_or(BuildError::NoProducer)?;
                let target = self.place(placement, recipe.ability)?;
                self.release_builder(builder);
                (builder, target)
            }
        };

        self.host.issue(Command {
            units: vec![producer],
            ability: recipe.ability,
            target,
        });
        self.budget.spend(&cost);
        self.claimed.insert(producer);
        tracing::debug!(?kind, %producer, "Issued production order");

        Ok(Issued {
            producer,
            yield_count: recipe.yield_count,
            spawns_units: !recipe.morphs_in_place(),
        })
    }

    fn attempt_research(&mut self, upgrade: Upgrade, at: UnitKind) -> Result<Issued, BuildError> {
        let world = self.host.world;
        if !has_completed(world, at) {
            return Err(BuildError::MissingPrerequisite(at));
        }
        let cost = world
            .upgrade_cost(upgrade)
            .ok_or(BuildError::UnknownCost(BuildKind::Research { upgrade, at }))?;
        self.budget.check(&cost)?;

        let producer = world
            .own_units()
            .into_iter()
            .find(|u| u.kind == at && u.is_complete() && u.is_idle() && self.is_free(u))
            .map(|u| u.tag)
            .ok_or(BuildError::NoProducer)?;

        self.host
            .issue(Command::untargeted(producer, Ability::Research(upgrade)));
        self.budget.spend(&cost);
        self.claimed.insert(producer);
        tracing::debug!(?upgrade, %producer, "Issued research order");

        Ok(Issued {
            producer,
            yield_count: 0,
            spawns_units: false,
        })
    }

    fn is_free(&self, unit: &UnitView) -> bool {
        unit.is_alive && !self.claimed.contains(&unit.tag)
    }

    fn group(&self, id: GroupId) -> Option<&UnitGroup> {
        self.groups.get(id.0)
    }

    fn idle_larva(&self) -> Option<UnitTag> {
        let world = self.host.world;
        let material = self.config.production_material;
        self.group(self.ids.intermediate)?
            .members()
            .iter()
            .filter_map(|m| m.tag.and_then(|t| world.unit(t)))
            .find(|u| u.kind == material && u.is_idle() && self.is_free(u))
            .map(|u| u.tag)
    }

    fn idle_townhall(&self) -> Option<UnitTag> {
        let world = self.host.world;
        world
            .own_units()
            .into_iter()
            .find(|u| is_townhall(world, u) && u.is_complete() && u.is_idle() && self.is_free(u))
            .map(|u| u.tag)
    }

    fn morph_source(&self, source: UnitKind) -> Option<UnitTag> {
        self.host
            .world
            .own_units()
            .into_iter()
            .find(|u| u.kind == source && u.is_complete() && self.is_free(u))
            .map(|u| u.tag)
    }

    fn builder(&self) -> Option<UnitTag> {
        let world = self.host.world;
        self.group(self.ids.worker)?
            .members()
            .iter()
            .filter(|m| m.task == Task::Mine)
            .filter_map(|m| m.tag.and_then(|t| world.unit(t)))
            .find(|u| u.kind == UnitKind::Drone && self.is_free(u))
            .map(|u| u.tag)
    }

    fn release_builder(&mut self, builder: UnitTag) {
        let Some(member) = self
            .groups
            .get_mut(self.ids.worker.0)
            .and_then(|g| g.remove(builder))
        else {
            return;
        };
        if let Some(intermediate) = self.groups.get_mut(self.ids.intermediate.0) {
            intermediate.adopt(member, Task::Unset);
        }
    }

    fn place(&mut self, placement: Placement, ability: Ability) -> Result<Target, BuildError> {
        let world = self.host.world;
        let home = self.locator.home();
        let target = match placement {
            Placement::NearHome => self
                .locator
                .find_building_site(self.host.placement, ability, home)
                .map(Target::Point),
            Placement::Expansion => self
                .locator
                .find_expansion_site(world, self.host.placement, ability)
                .map(Target::Point),
            Placement::Geyser => {
                let radius = Fixed::saturating_from_num(self.config.geyser_search_radius);
                free_geyser_near(world, home, radius).map(|g| Target::Unit(g.tag))
            }
        };
        target.ok_or(BuildError::NoPlacement)
    }

    /// Order idle queens with enough energy to inject the nearest townhall
    /// that no queen is injecting yet. Returns the number of orders.
    pub fn inject_larva(&mut self) -> usize {
        let world = self.host.world;
        let energy = Fixed::saturating_from_num(self.config.inject_energy);
        let own = world.own_units();

        let mut queens: Vec<&UnitView> = own
            .iter()
            .copied()
            .filter(|u| {
                u.kind == UnitKind::Queen && u.energy >= energy && u.is_idle() && self.is_free(u)
            })
            .collect();
        if queens.is_empty() {
            return 0;
        }

        let being_injected: HashSet<UnitTag> = own
            .iter()
            .flat_map(|u| u.orders.iter())
            .filter(|o| o.ability == Ability::InjectLarva)
            .filter_map(|o| match o.target {
                Target::Unit(tag) => Some(tag),
                _ => None,
            })
            .collect();

        let mut issued = 0;
        for townhall in own
            .iter()
            .filter(|u| is_townhall(world, u) && u.is_complete())
        {
            if being_injected.contains(&townhall.tag) {
                continue;
            }
            let Some(index) = nearest_index(&queens, townhall) else {
                break;
            };
            let queen = queens.remove(index);
            self.host
                .issue(Command::at_unit(queen.tag, Ability::InjectLarva, townhall.tag));
            self.claimed.insert(queen.tag);
            issued += 1;
            tracing::debug!(queen = %queen.tag, townhall = %townhall.tag, "Injecting larva");
        }
        issued
    }
}

fn nearest_index(units: &[&UnitView], to: &UnitView) -> Option<usize> {
    let mut best: Option<(usize, Fixed)> = None;
    for (i, unit) in units.iter().enumerate() {
        let d = unit.position.distance_squared(to.position);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Whether an own, completed unit of `kind` exists.
#[must_use]
pub fn has_completed(world: &dyn WorldSnapshot, kind: UnitKind) -> bool {
    world
        .own_units()
        .into_iter()
        .any(|u| u.kind == kind && u.is_alive && u.is_complete())
}
