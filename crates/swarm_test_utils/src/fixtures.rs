//! Test fixtures and helpers.
//!
//! [`FakeWorld`] implements every host interface the engine needs and can
//! resolve the commands the engine issues, so a whole match can be played
//! without a game client.

use std::collections::{HashMap, HashSet};

use swarm_core::math::{Fixed, Vec2Fixed};
use swarm_core::units::{Ability, Alliance, Order, Target, UnitKind, UnitTag, Upgrade};
use swarm_core::world::{
    ActionSink, Command, Cost, Host, PathOracle, PlacementOracle, TypeData, UnitView, WeaponData,
    WorldSnapshot,
};

/// Enemy infantry used as a ground threat.
pub const ENEMY_MARINE: UnitKind = UnitKind::Foreign(48);
/// Enemy air unit, only visible to anti-air.
pub const ENEMY_VIKING: UnitKind = UnitKind::Foreign(35);
/// Enemy townhall.
pub const ENEMY_TOWNHALL: UnitKind = UnitKind::Foreign(18);
/// Enemy supply structure.
pub const ENEMY_DEPOT: UnitKind = UnitKind::Foreign(19);

/// Game loops advanced by one [`FakeWorld::tick`].
pub const LOOPS_PER_TICK: u64 = 8;
/// Ticks between natural larva spawns per townhall.
pub const LARVA_INTERVAL: u64 = 11;
/// Larva cap per townhall.
pub const LARVA_CAP: usize = 3;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: engine code never uses floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Integer map point.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::new(fixed(x), fixed(y))
}

fn weapon(damage: i32, attacks: i32, speed: f64) -> Option<WeaponData> {
    Some(WeaponData {
        damage: fixed(damage),
        attacks: fixed(attacks),
        speed: fixed_f(speed),
    })
}

fn unit_data(cost: Cost, weapon: Option<WeaponData>) -> TypeData {
    TypeData {
        cost,
        weapon,
        is_structure: false,
        is_townhall: false,
    }
}

fn structure_data(minerals: u32, townhall: bool) -> TypeData {
    TypeData {
        cost: Cost::new(minerals, 0, 0),
        weapon: None,
        is_structure: true,
        is_townhall: townhall,
    }
}

/// Type data for every kind the fixtures use.
#[must_use]
pub fn zerg_catalog() -> HashMap<UnitKind, TypeData> {
    HashMap::from([
        (UnitKind::Larva, unit_data(Cost::default(), None)),
        (UnitKind::Egg, unit_data(Cost::default(), None)),
        (UnitKind::Drone, unit_data(Cost::new(50, 0, 1), weapon(5, 1, 0.93))),
        (UnitKind::Overlord, unit_data(Cost::new(100, 0, 0), None)),
        (UnitKind::Zergling, unit_data(Cost::new(50, 0, 1), weapon(5, 1, 1.4))),
        (UnitKind::Queen, unit_data(Cost::new(150, 0, 2), weapon(4, 2, 1.0))),
        (UnitKind::Roach, unit_data(Cost::new(75, 25, 2), weapon(16, 1, 0.7))),
        (UnitKind::Ravager, unit_data(Cost::new(25, 75, 1), weapon(16, 1, 0.8))),
        (UnitKind::Hatchery, structure_data(300, true)),
        (UnitKind::Lair, structure_data(150, true)),
        (UnitKind::Hive, structure_data(200, true)),
        (UnitKind::Extractor, structure_data(25, false)),
        (UnitKind::SpawningPool, structure_data(200, false)),
        (UnitKind::RoachWarren, structure_data(150, false)),
        (ENEMY_MARINE, unit_data(Cost::new(50, 0, 1), weapon(6, 1, 1.6))),
        (ENEMY_VIKING, unit_data(Cost::new(150, 75, 2), weapon(10, 2, 0.7))),
        (ENEMY_TOWNHALL, structure_data(400, true)),
        (ENEMY_DEPOT, structure_data(100, false)),
    ])
}

/// Upgrade costs.
#[must_use]
pub fn upgrade_catalog() -> HashMap<Upgrade, Cost> {
    HashMap::from([
        (Upgrade::MetabolicBoost, Cost::new(100, 100, 0)),
        (Upgrade::GlialReconstitution, Cost::new(100, 100, 0)),
    ])
}

/// A complete, alive, idle unit with 100 health.
#[must_use]
pub fn unit(tag: u64, kind: UnitKind, alliance: Alliance, position: Vec2Fixed) -> UnitView {
    UnitView {
        tag: UnitTag(tag),
        kind,
        alliance,
        position,
        health: fixed(100),
        shield: Fixed::ZERO,
        energy: Fixed::ZERO,
        is_flying: matches!(kind, UnitKind::Overlord) || kind == ENEMY_VIKING,
        is_alive: true,
        build_progress: fixed(1),
        orders: Vec::new(),
        assigned_harvesters: 0,
        ideal_harvesters: if kind == UnitKind::Extractor { 3 } else { 0 },
        mineral_contents: if kind.is_mineral_field() { 1500 } else { 0 },
    }
}

/// Which points accept a structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlacementRule {
    /// Any point.
    #[default]
    Anywhere,
    /// No point.
    Nowhere,
    /// Only the listed points.
    Only(HashSet<Vec2Fixed>),
    /// Any point except the listed ones.
    Except(HashSet<Vec2Fixed>),
}

/// Something the host would report back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEvent {
    /// A new own unit appeared.
    Created(UnitTag),
    /// An own structure finished.
    BuildingComplete(UnitTag),
}

/// In-memory world implementing [`WorldSnapshot`], [`PlacementOracle`] and
/// [`PathOracle`].
#[derive(Debug, Clone)]
pub struct FakeWorld {
    /// Banked minerals.
    pub minerals: u32,
    /// Banked vespene.
    pub vespene: u32,
    /// Supply used.
    pub supply_used: u32,
    /// Supply cap.
    pub supply_cap: u32,
    /// Visible units.
    pub units: Vec<UnitView>,
    /// Playable area lower-left.
    pub playable_min: Vec2Fixed,
    /// Playable area upper-right.
    pub playable_max: Vec2Fixed,
    /// Own start location.
    pub start_location: Vec2Fixed,
    /// Enemy start candidates.
    pub enemy_starts: Vec<Vec2Fixed>,
    /// Current game loop.
    pub game_loop: u64,
    /// Unit type data.
    pub catalog: HashMap<UnitKind, TypeData>,
    /// Upgrade costs.
    pub upgrades: HashMap<Upgrade, Cost>,
    /// Completed research.
    pub researched: HashSet<Upgrade>,
    /// Placement oracle behavior.
    pub placement: PlacementRule,
    /// Points the ground pathing oracle reports as unreachable.
    pub unreachable: HashSet<Vec2Fixed>,
    next_tag: u64,
    ticks: u64,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeWorld {
    /// An empty 128x128 map with home at (30, 30) and one enemy start at
    /// (98, 98).
    #[must_use]
    pub fn new() -> Self {
        Self {
            minerals: 50,
            vespene: 0,
            supply_used: 12,
            supply_cap: 14,
            units: Vec::new(),
            playable_min: point(0, 0),
            playable_max: point(128, 128),
            start_location: point(30, 30),
            enemy_starts: vec![point(98, 98)],
            game_loop: 0,
            catalog: zerg_catalog(),
            upgrades: upgrade_catalog(),
            researched: HashSet::new(),
            placement: PlacementRule::Anywhere,
            unreachable: HashSet::new(),
            next_tag: 1000,
            ticks: 0,
        }
    }

    /// The usual opening position: a hatchery, three larva, twelve drones and
    /// an overlord at home; a mineral line and two geysers near home; a second
    /// resource cluster for expanding; an unseen enemy.
    #[must_use]
    pub fn standard_start() -> Self {
        let mut world = Self::new();
        let home = world.start_location;
        world.spawn(UnitKind::Hatchery, Alliance::Own, home);
        for i in 0..3 {
            world.spawn(UnitKind::Larva, Alliance::Own, home.offset(fixed(i), fixed(-2)));
        }
        for i in 0..12 {
            world.spawn(UnitKind::Drone, Alliance::Own, home.offset(fixed(i % 4), fixed(2)));
        }
        world.spawn(UnitKind::Overlord, Alliance::Own, home.offset(fixed(0), fixed(4)));
        world.add_mineral_line(home.offset(fixed(-8), fixed(0)), 8);
        world.spawn(UnitKind::VespeneGeyser, Alliance::Neutral, home.offset(fixed(6), fixed(-6)));
        world.spawn(UnitKind::VespeneGeyser, Alliance::Neutral, home.offset(fixed(-6), fixed(6)));
        world.add_mineral_line(point(60, 30), 8);
        world
    }

    /// Set banked resources.
    #[must_use]
    pub fn with_resources(mut self, minerals: u32, vespene: u32) -> Self {
        self.minerals = minerals;
        self.vespene = vespene;
        self
    }

    /// Set supply.
    #[must_use]
    pub fn with_supply(mut self, used: u32, cap: u32) -> Self {
        self.supply_used = used;
        self.supply_cap = cap;
        self
    }

    /// Set enemy start candidates.
    #[must_use]
    pub fn with_enemy_starts(mut self, starts: Vec<Vec2Fixed>) -> Self {
        self.enemy_starts = starts;
        self
    }

    /// Set the placement oracle behavior.
    #[must_use]
    pub fn with_placement(mut self, rule: PlacementRule) -> Self {
        self.placement = rule;
        self
    }

    /// Add a unit with a fresh tag and return the tag.
    pub fn spawn(&mut self, kind: UnitKind, alliance: Alliance, position: Vec2Fixed) -> UnitTag {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.units.push(unit(tag, kind, alliance, position));
        UnitTag(tag)
    }

    /// Add a prepared unit as-is.
    pub fn push(&mut self, view: UnitView) {
        self.next_tag = self.next_tag.max(view.tag.0 + 1);
        self.units.push(view);
    }

    /// Add `count` mineral fields in a column starting at `origin`.
    pub fn add_mineral_line(&mut self, origin: Vec2Fixed, count: i32) -> Vec<UnitTag> {
        (0..count)
            .map(|i| {
                self.spawn(
                    UnitKind::MineralField,
                    Alliance::Neutral,
                    origin.offset(fixed(i % 2), fixed(i - count / 2)),
                )
            })
            .collect()
    }

    /// Mutable access to a unit.
    pub fn unit_mut(&mut self, tag: UnitTag) -> Option<&mut UnitView> {
        self.units.iter_mut().find(|u| u.tag == tag)
    }

    /// Remove a unit, returning its last view.
    pub fn remove(&mut self, tag: UnitTag) -> Option<UnitView> {
        let index = self.units.iter().position(|u| u.tag == tag)?;
        Some(self.units.remove(index))
    }

    /// Tags of own units of one kind, in host order.
    #[must_use]
    pub fn own_tags(&self, kind: UnitKind) -> Vec<UnitTag> {
        self.units
            .iter()
            .filter(|u| u.alliance == Alliance::Own && u.kind == kind)
            .map(|u| u.tag)
            .collect()
    }

    /// Count own units of one kind.
    #[must_use]
    pub fn count_own(&self, kind: UnitKind) -> usize {
        self.own_tags(kind).len()
    }

    /// Bundle this world with a sink into a [`Host`].
    pub fn host<'a>(&'a self, sink: &'a mut RecordingSink) -> Host<'a> {
        Host::new(self, sink, self, self)
    }

    /// Advance time: income, larva, queen energy.
    pub fn tick(&mut self) {
        self.ticks += 1;
        self.game_loop += LOOPS_PER_TICK;

        let own = |u: &&UnitView| u.alliance == Alliance::Own;
        let miners = self
            .units
            .iter()
            .filter(own)
            .filter(|u| u.kind == UnitKind::Drone && u.has_order(Ability::HarvestGather))
            .count() as u32;
        let extractors = self
            .units
            .iter()
            .filter(own)
            .filter(|u| u.kind == UnitKind::Extractor)
            .count() as u32;
        self.minerals += 5 + miners;
        self.vespene += extractors * 2;

        for queen in self
            .units
            .iter_mut()
            .filter(|u| u.alliance == Alliance::Own && u.kind == UnitKind::Queen)
        {
            queen.energy = (queen.energy + fixed(1)).min(fixed(200));
        }

        if self.ticks % LARVA_INTERVAL == 0 {
            let hatcheries: Vec<(UnitTag, Vec2Fixed)> = self
                .units
                .iter()
                .filter(|u| u.alliance == Alliance::Own && u.kind.is_townhall())
                .map(|u| (u.tag, u.position))
                .collect();
            for (_, position) in hatcheries {
                if self.larva_near(position) < LARVA_CAP {
                    let spot = position.offset(fixed(1), fixed(-2));
                    self.spawn(UnitKind::Larva, Alliance::Own, spot);
                }
            }
        }
    }

    fn larva_near(&self, position: Vec2Fixed) -> usize {
        self.units
            .iter()
            .filter(|u| u.alliance == Alliance::Own && u.kind == UnitKind::Larva)
            .filter(|u| u.position.is_within(position, fixed(5)))
            .count()
    }

    fn cost_of(&self, kind: UnitKind) -> Cost {
        self.catalog.get(&kind).map(|d| d.cost).unwrap_or_default()
    }

    fn pay(&mut self, cost: Cost) -> bool {
        if self.minerals < cost.minerals || self.vespene < cost.vespene {
            return false;
        }
        self.minerals -= cost.minerals;
        self.vespene -= cost.vespene;
        self.supply_used += cost.supply;
        true
    }

    fn add_supply_for(&mut self, kind: UnitKind) {
        let extra = match kind {
            UnitKind::Overlord => 8,
            k if k.is_townhall() => 6,
            _ => 0,
        };
        self.supply_cap = (self.supply_cap + extra).min(200);
    }

    /// Carry out one command the way a game would, instantly. Returns what
    /// the host should report back.
    pub fn apply(&mut self, command: &Command) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        for &tag in &command.units {
            let Some(actor) = self.units.iter().find(|u| u.tag == tag).cloned() else {
                continue;
            };
            match command.ability {
                Ability::Train(kind) => self.train(&actor, kind, &mut events),
                Ability::Build(kind) => self.build(&actor, kind, command.target, &mut events),
                Ability::Morph(kind) => {
                    if self.pay(self.cost_of(kind)) {
                        if let Some(view) = self.unit_mut(tag) {
                            view.kind = kind;
                        }
                    }
                }
                Ability::Research(upgrade) => {
                    let cost = self.upgrades.get(&upgrade).copied().unwrap_or_default();
                    if self.pay(cost) {
                        self.researched.insert(upgrade);
                    }
                }
                Ability::InjectLarva => self.inject(tag, command.target, &mut events),
                ability => self.order(tag, ability, command.target),
            }
        }
        events
    }

    fn train(&mut self, actor: &UnitView, kind: UnitKind, events: &mut Vec<WorldEvent>) {
        if !self.pay(self.cost_of(kind)) {
            return;
        }
        let yield_count = kind.recipe().map_or(1, |r| r.yield_count);
        if actor.kind == UnitKind::Larva {
            self.remove(actor.tag);
        }
        for _ in 0..yield_count {
            let tag = self.spawn(kind, Alliance::Own, actor.position);
            self.add_supply_for(kind);
            events.push(WorldEvent::Created(tag));
        }
    }

    fn build(
        &mut self,
        actor: &UnitView,
        kind: UnitKind,
        target: Target,
        events: &mut Vec<WorldEvent>,
    ) {
        let site = match target {
            Target::Point(p) => p,
            Target::Unit(geyser) => match self.units.iter().find(|u| u.tag == geyser) {
                Some(g) => g.position,
                None => return,
            },
            Target::None => return,
        };
        if !self.pay(self.cost_of(kind)) {
            return;
        }
        self.remove(actor.tag);
        self.supply_used = self.supply_used.saturating_sub(1);
        let tag = self.spawn(kind, Alliance::Own, site);
        self.add_supply_for(kind);
        events.push(WorldEvent::Created(tag));
        events.push(WorldEvent::BuildingComplete(tag));
    }

    fn inject(&mut self, queen: UnitTag, target: Target, events: &mut Vec<WorldEvent>) {
        let Target::Unit(townhall) = target else {
            return;
        };
        let position = self.units.iter().find(|u| u.tag == townhall).map(|u| u.position);
        let Some(position) = position else {
            return;
        };
        if let Some(view) = self.unit_mut(queen) {
            view.energy -= fixed(25);
        }
        for i in 0..3 {
            let spot = position.offset(fixed(i), fixed(-3));
            let tag = self.spawn(UnitKind::Larva, Alliance::Own, spot);
            events.push(WorldEvent::Created(tag));
        }
    }

    fn order(&mut self, tag: UnitTag, ability: Ability, target: Target) {
        let gather_target = match target {
            Target::Unit(t) => self
                .units
                .iter()
                .find(|u| u.tag == t)
                .is_some_and(|u| u.kind.is_mineral_field() || u.kind == UnitKind::Extractor),
            _ => false,
        };
        let Some(view) = self.unit_mut(tag) else {
            return;
        };
        match (ability, target) {
            (Ability::Smart, Target::Unit(_)) if gather_target => {
                view.orders = vec![Order::new(Ability::HarvestGather, target)];
            }
            (Ability::Move | Ability::Smart, Target::Point(p)) => {
                view.position = p;
                view.orders.clear();
            }
            _ => view.orders = vec![Order::new(ability, target)],
        }
    }
}

impl WorldSnapshot for FakeWorld {
    fn minerals(&self) -> u32 {
        self.minerals
    }

    fn vespene(&self) -> u32 {
        self.vespene
    }

    fn supply_used(&self) -> u32 {
        self.supply_used
    }

    fn supply_cap(&self) -> u32 {
        self.supply_cap
    }

    fn units(&self) -> &[UnitView] {
        &self.units
    }

    fn playable_min(&self) -> Vec2Fixed {
        self.playable_min
    }

    fn playable_max(&self) -> Vec2Fixed {
        self.playable_max
    }

    fn start_location(&self) -> Vec2Fixed {
        self.start_location
    }

    fn enemy_start_locations(&self) -> &[Vec2Fixed] {
        &self.enemy_starts
    }

    fn game_loop(&self) -> u64 {
        self.game_loop
    }

    fn type_data(&self, kind: UnitKind) -> Option<TypeData> {
        self.catalog.get(&kind).copied()
    }

    fn upgrade_cost(&self, upgrade: Upgrade) -> Option<Cost> {
        self.upgrades.get(&upgrade).copied()
    }
}

impl PlacementOracle for FakeWorld {
    fn can_place(&self, _ability: Ability, point: Vec2Fixed) -> bool {
        match &self.placement {
            PlacementRule::Anywhere => true,
            PlacementRule::Nowhere => false,
            PlacementRule::Only(points) => points.contains(&point),
            PlacementRule::Except(points) => !points.contains(&point),
        }
    }
}

impl PathOracle for FakeWorld {
    fn path_distance(&self, from: Vec2Fixed, to: Vec2Fixed) -> Option<Fixed> {
        if self.unreachable.contains(&to) {
            return None;
        }
        Some(from.distance(to))
    }
}

/// Action sink that keeps every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    /// Commands in issue order.
    pub commands: Vec<Command>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands addressed to one unit.
    #[must_use]
    pub fn for_unit(&self, tag: UnitTag) -> Vec<&Command> {
        self.commands.iter().filter(|c| c.units.contains(&tag)).collect()
    }

    /// Commands using one ability.
    #[must_use]
    pub fn with_ability(&self, ability: Ability) -> Vec<&Command> {
        self.commands.iter().filter(|c| c.ability == ability).collect()
    }

    /// Production orders (train, build, morph, research) in issue order.
    #[must_use]
    pub fn production(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c.ability,
                    Ability::Train(_) | Ability::Build(_) | Ability::Morph(_) | Ability::Research(_)
                )
            })
            .collect()
    }
}

impl ActionSink for RecordingSink {
    fn issue(&mut self, command: Command) {
        self.commands.push(command);
    }
}
