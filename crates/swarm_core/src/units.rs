//! Unit identity, abilities and production recipes.
//!
//! The engine knows the structure of the roster it plays (which unit is
//! trained from larva, which structure gates which unit) but not its balance
//! numbers; costs and weapon data are read from the world snapshot every tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;

/// Opaque identifier the host assigns to every live unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTag(pub u64);

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alliance {
    /// Controlled by this agent.
    Own,
    /// Controlled by the opponent.
    Enemy,
    /// Map features: mineral fields, geysers, rocks.
    Neutral,
}

/// Unit and structure types the engine reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Raw production material spawned by townhalls.
    Larva,
    /// Larva that is morphing into a unit.
    Egg,
    /// Worker; harvests and morphs into structures.
    Drone,
    /// Supply provider; slow flying scout.
    Overlord,
    /// Cheap melee unit, hatches in pairs.
    Zergling,
    /// Townhall-trained caster and anti-air defender.
    Queen,
    /// Armored ranged unit.
    Roach,
    /// Morphed from a roach; carries an area ability.
    Ravager,
    /// Main townhall.
    Hatchery,
    /// Upgraded townhall.
    Lair,
    /// Fully upgraded townhall.
    Hive,
    /// Gas harvesting structure built on a geyser.
    Extractor,
    /// Unlocks zerglings and queens.
    SpawningPool,
    /// Unlocks roaches and ravagers.
    RoachWarren,
    /// Standard mineral patch.
    MineralField,
    /// Reduced mineral patch.
    MineralField750,
    /// Rich mineral patch.
    RichMineralField,
    /// Standard vespene geyser.
    VespeneGeyser,
    /// Rich vespene geyser.
    RichVespeneGeyser,
    /// Any type outside the own roster, identified by the host's numeric id.
    Foreign(u32),
}

impl UnitKind {
    /// Whether this is a mineral patch.
    #[must_use]
    pub const fn is_mineral_field(self) -> bool {
        matches!(
            self,
            Self::MineralField | Self::MineralField750 | Self::RichMineralField
        )
    }

    /// Whether this is a vespene geyser.
    #[must_use]
    pub const fn is_geyser(self) -> bool {
        matches!(self, Self::VespeneGeyser | Self::RichVespeneGeyser)
    }

    /// Whether this is a harvestable resource node.
    #[must_use]
    pub const fn is_resource(self) -> bool {
        self.is_mineral_field() || self.is_geyser()
    }

    /// Whether this is one of the own roster's townhalls.
    #[must_use]
    pub const fn is_townhall(self) -> bool {
        matches!(self, Self::Hatchery | Self::Lair | Self::Hive)
    }

    /// Whether this is one of the own roster's structures.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        self.is_townhall()
            || matches!(self, Self::Extractor | Self::SpawningPool | Self::RoachWarren)
    }

    /// Whether this is an army unit that belongs in the attack group.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(self, Self::Zergling | Self::Roach | Self::Ravager)
    }

    /// How this kind is produced, or `None` if the engine never orders it.
    #[must_use]
    pub const fn recipe(self) -> Option<Recipe> {
        let recipe = match self {
            Self::Drone => Recipe::from_larva(self, None, 1),
            Self::Overlord => Recipe::from_larva(self, None, 1),
            Self::Zergling => Recipe::from_larva(self, Some(Self::SpawningPool), 2),
            Self::Roach => Recipe::from_larva(self, Some(Self::RoachWarren), 1),
            Self::Queen => Recipe {
                producer: Producer::Townhall,
                ability: Ability::Train(self),
                requires: Some(Self::SpawningPool),
                yield_count: 1,
            },
            Self::Ravager => Recipe {
                producer: Producer::Morph(Self::Roach),
                ability: Ability::Morph(self),
                requires: Some(Self::RoachWarren),
                yield_count: 1,
            },
            Self::Hatchery => Recipe::by_worker(self, Placement::Expansion, None),
            Self::Extractor => Recipe::by_worker(self, Placement::Geyser, None),
            Self::SpawningPool => Recipe::by_worker(self, Placement::NearHome, None),
            Self::RoachWarren => {
                Recipe::by_worker(self, Placement::NearHome, Some(Self::SpawningPool))
            }
            _ => return None,
        };
        Some(recipe)
    }
}

/// Researchable upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    /// Zergling movement speed, researched at the spawning pool.
    MetabolicBoost,
    /// Roach movement speed, researched at the roach warren.
    GlialReconstitution,
}

/// Abilities the engine can order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Move without engaging.
    Move,
    /// Attack a unit or attack-move to a point.
    Attack,
    /// Context-dependent right click (gather on a resource, move on ground).
    Smart,
    /// Gather from a resource node.
    HarvestGather,
    /// Carry gathered resources back to a townhall.
    HarvestReturn,
    /// Train a unit from a producer.
    Train(UnitKind),
    /// Morph a worker into a structure.
    Build(UnitKind),
    /// Morph a unit into another unit in place.
    Morph(UnitKind),
    /// Research an upgrade.
    Research(Upgrade),
    /// Queen larva injection on a townhall.
    InjectLarva,
    /// Ravager area ability.
    CorrosiveBile,
}

/// What an order or command is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// No target (train, research, stop).
    None,
    /// A ground location.
    Point(Vec2Fixed),
    /// Another unit.
    Unit(UnitTag),
}

/// An order currently queued on a unit, as reported by the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Ability being executed.
    pub ability: Ability,
    /// Target of the ability.
    pub target: Target,
}

impl Order {
    /// Create a new order.
    #[must_use]
    pub const fn new(ability: Ability, target: Target) -> Self {
        Self { ability, target }
    }
}

/// Where a worker-built structure goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Spiral search around the main townhall.
    NearHome,
    /// Next free base site.
    Expansion,
    /// A free geyser near the main townhall.
    Geyser,
}

/// Which existing unit carries out a production order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Producer {
    /// An idle larva from the intermediate group.
    Larva,
    /// An idle, completed townhall.
    Townhall,
    /// An existing unit of the given kind morphs in place.
    Morph(UnitKind),
    /// A mining worker builds at the given placement.
    Worker(Placement),
}

/// Structural production data for one unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recipe {
    /// Unit that executes the order.
    pub producer: Producer,
    /// Ability ordered on the producer.
    pub ability: Ability,
    /// Completed structure that must exist first.
    pub requires: Option<UnitKind>,
    /// Units that appear per successful order.
    pub yield_count: u32,
}

impl Recipe {
    const fn from_larva(kind: UnitKind, requires: Option<UnitKind>, yield_count: u32) -> Self {
        Self {
            producer: Producer::Larva,
            ability: Ability::Train(kind),
            requires,
            yield_count,
        }
    }

    const fn by_worker(kind: UnitKind, placement: Placement, requires: Option<UnitKind>) -> Self {
        Self {
            producer: Producer::Worker(placement),
            ability: Ability::Build(kind),
            requires,
            yield_count: 1,
        }
    }

    /// Whether the produced unit keeps the producer's identity.
    #[must_use]
    pub const fn morphs_in_place(&self) -> bool {
        matches!(self.producer, Producer::Morph(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zerglings_hatch_in_pairs() {
        let recipe = UnitKind::Zergling.recipe().unwrap();
        assert_eq!(recipe.yield_count, 2);
        assert_eq!(recipe.producer, Producer::Larva);
        assert_eq!(recipe.requires, Some(UnitKind::SpawningPool));
    }

    #[test]
    fn test_ravager_morphs_in_place() {
        let recipe = UnitKind::Ravager.recipe().unwrap();
        assert!(recipe.morphs_in_place());
        assert_eq!(recipe.producer, Producer::Morph(UnitKind::Roach));
    }

    #[test]
    fn test_structures_are_worker_built() {
        for kind in [
            UnitKind::Hatchery,
            UnitKind::Extractor,
            UnitKind::SpawningPool,
            UnitKind::RoachWarren,
        ] {
            let recipe = kind.recipe().unwrap();
            assert!(matches!(recipe.producer, Producer::Worker(_)), "{kind:?}");
            assert!(kind.is_structure());
        }
    }

    #[test]
    fn test_resources_have_no_recipe() {
        assert!(UnitKind::MineralField.recipe().is_none());
        assert!(UnitKind::Foreign(48).recipe().is_none());
        assert!(UnitKind::RichMineralField.is_resource());
        assert!(UnitKind::VespeneGeyser.is_geyser());
    }
}
