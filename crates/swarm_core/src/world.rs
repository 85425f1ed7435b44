//! Host-facing interfaces.
//!
//! The engine never talks to a game client directly. Each tick the host hands
//! it a read-only [`WorldSnapshot`], an [`ActionSink`] for commands, and two
//! query oracles, bundled into a [`Host`].

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::units::{Ability, Alliance, Order, Target, UnitKind, UnitTag, Upgrade};

/// One visible unit as reported by the host this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Host-assigned identity.
    pub tag: UnitTag,
    /// Unit type.
    pub kind: UnitKind,
    /// Owning side.
    pub alliance: Alliance,
    /// Map position.
    pub position: Vec2Fixed,
    /// Current hit points.
    #[serde(with = "fixed_serde")]
    pub health: Fixed,
    /// Current shield points.
    #[serde(with = "fixed_serde")]
    pub shield: Fixed,
    /// Current energy.
    #[serde(with = "fixed_serde")]
    pub energy: Fixed,
    /// Whether the unit is airborne.
    pub is_flying: bool,
    /// Whether the unit is alive.
    pub is_alive: bool,
    /// Construction progress in `[0, 1]`; `1` for completed units.
    #[serde(with = "fixed_serde")]
    pub build_progress: Fixed,
    /// Queued orders, current order first.
    pub orders: Vec<Order>,
    /// Workers assigned to this townhall or extractor.
    pub assigned_harvesters: u32,
    /// Saturation target for this townhall or extractor.
    pub ideal_harvesters: u32,
    /// Minerals left in this patch.
    pub mineral_contents: u32,
}

impl UnitView {
    /// Whether the unit has no orders.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.orders.is_empty()
    }

    /// Whether construction has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.build_progress >= Fixed::from_num(1)
    }

    /// Whether any queued order uses `ability`.
    #[must_use]
    pub fn has_order(&self, ability: Ability) -> bool {
        self.orders.iter().any(|o| o.ability == ability)
    }

    /// Effective hit points (health plus shield).
    #[must_use]
    pub fn total_health(&self) -> Fixed {
        self.health + self.shield
    }
}

/// Resource and supply cost of a unit or upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Mineral cost.
    pub minerals: u32,
    /// Vespene cost.
    pub vespene: u32,
    /// Supply consumed.
    pub supply: u32,
}

impl Cost {
    /// Create a new cost.
    #[must_use]
    pub const fn new(minerals: u32, vespene: u32, supply: u32) -> Self {
        Self {
            minerals,
            vespene,
            supply,
        }
    }
}

/// Primary weapon figures for a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponData {
    /// Damage per attack.
    #[serde(with = "fixed_serde")]
    pub damage: Fixed,
    /// Attacks per volley.
    #[serde(with = "fixed_serde")]
    pub attacks: Fixed,
    /// Volleys per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
}

impl WeaponData {
    /// Damage per second.
    #[must_use]
    pub fn dps(&self) -> Fixed {
        self.damage * self.attacks * self.speed
    }
}

/// Static per-type data served by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeData {
    /// Production cost.
    pub cost: Cost,
    /// Primary weapon, `None` for unarmed types.
    pub weapon: Option<WeaponData>,
    /// Whether this type is a structure.
    pub is_structure: bool,
    /// Whether this type is a resource-drop townhall.
    pub is_townhall: bool,
}

/// Read-only view of the match for one tick.
pub trait WorldSnapshot {
    /// Banked minerals.
    fn minerals(&self) -> u32;
    /// Banked vespene.
    fn vespene(&self) -> u32;
    /// Supply in use, including units in production.
    fn supply_used(&self) -> u32;
    /// Supply provided.
    fn supply_cap(&self) -> u32;
    /// Every visible unit, in host order.
    fn units(&self) -> &[UnitView];
    /// Lower-left corner of the playable area.
    fn playable_min(&self) -> Vec2Fixed;
    /// Upper-right corner of the playable area.
    fn playable_max(&self) -> Vec2Fixed;
    /// Own start location.
    fn start_location(&self) -> Vec2Fixed;
    /// Candidate enemy start locations.
    fn enemy_start_locations(&self) -> &[Vec2Fixed];
    /// Current game loop.
    fn game_loop(&self) -> u64;
    /// Static data for a unit type, if the host knows it.
    fn type_data(&self, kind: UnitKind) -> Option<TypeData>;
    /// Cost of an upgrade, if the host knows it.
    fn upgrade_cost(&self, upgrade: Upgrade) -> Option<Cost>;

    /// Resolve a tag against this snapshot.
    fn unit(&self, tag: UnitTag) -> Option<&UnitView> {
        self.units().iter().find(|u| u.tag == tag)
    }

    /// Own units in host order.
    fn own_units(&self) -> Vec<&UnitView> {
        self.units_of(Alliance::Own)
    }

    /// Enemy units in host order.
    fn enemy_units(&self) -> Vec<&UnitView> {
        self.units_of(Alliance::Enemy)
    }

    /// Neutral units in host order.
    fn neutral_units(&self) -> Vec<&UnitView> {
        self.units_of(Alliance::Neutral)
    }

    /// Units of one alliance in host order.
    fn units_of(&self, alliance: Alliance) -> Vec<&UnitView> {
        self.units()
            .iter()
            .filter(|u| u.alliance == alliance)
            .collect()
    }

    /// Center of the playable area.
    fn map_center(&self) -> Vec2Fixed {
        self.playable_min().midpoint(self.playable_max())
    }
}

/// A command for one or more own units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    /// Units receiving the command.
    pub units: Vec<UnitTag>,
    /// Ability to execute.
    pub ability: Ability,
    /// Ability target.
    pub target: Target,
}

impl Command {
    /// Command a single unit with no target.
    #[must_use]
    pub fn untargeted(unit: UnitTag, ability: Ability) -> Self {
        Self {
            units: vec![unit],
            ability,
            target: Target::None,
        }
    }

    /// Command a single unit at a point.
    #[must_use]
    pub fn at_point(unit: UnitTag, ability: Ability, point: Vec2Fixed) -> Self {
        Self {
            units: vec![unit],
            ability,
            target: Target::Point(point),
        }
    }

    /// Command a single unit at another unit.
    #[must_use]
    pub fn at_unit(unit: UnitTag, ability: Ability, target: UnitTag) -> Self {
        Self {
            units: vec![unit],
            ability,
            target: Target::Unit(target),
        }
    }
}

/// Fire-and-forget command output.
pub trait ActionSink {
    /// Queue a command for the host to send.
    fn issue(&mut self, command: Command);
}

/// Building placement queries.
pub trait PlacementOracle {
    /// Whether `ability` may place a structure at `point` right now.
    fn can_place(&self, ability: Ability, point: Vec2Fixed) -> bool;
}

/// Ground pathing queries.
pub trait PathOracle {
    /// Ground path length between two points. `None` or a non-positive value
    /// means unreachable.
    fn path_distance(&self, from: Vec2Fixed, to: Vec2Fixed) -> Option<Fixed>;

    /// Whether `to` can be reached on the ground from `from`.
    fn is_reachable(&self, from: Vec2Fixed, to: Vec2Fixed) -> bool {
        self.path_distance(from, to)
            .is_some_and(|d| d > Fixed::ZERO)
    }
}

/// Everything the engine borrows from the host for one call.
pub struct Host<'a> {
    /// This tick's snapshot.
    pub world: &'a dyn WorldSnapshot,
    /// Command output.
    pub actions: &'a mut dyn ActionSink,
    /// Placement queries.
    pub placement: &'a dyn PlacementOracle,
    /// Pathing queries.
    pub paths: &'a dyn PathOracle,
}

impl<'a> Host<'a> {
    /// Bundle the host interfaces.
    pub fn new(
        world: &'a dyn WorldSnapshot,
        actions: &'a mut dyn ActionSink,
        placement: &'a dyn PlacementOracle,
        paths: &'a dyn PathOracle,
    ) -> Self {
        Self {
            world,
            actions,
            placement,
            paths,
        }
    }

    /// Send a command to the action sink.
    pub fn issue(&mut self, command: Command) {
        self.actions.issue(command);
    }
}
