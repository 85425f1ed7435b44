//! Agent configuration.
//!
//! Every tunable the engine uses lives in [`AgentConfig`]. The defaults
//! reproduce the stock roach-ravager opening; a RON file can override any of
//! them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::Role;
use crate::error::{AgentError, Result};
use crate::production::BuildKind;
use crate::units::{UnitKind, Upgrade};

/// How production requests are chosen each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchedulingMode {
    /// Priority queue drained every tick.
    #[default]
    Priority,
    /// Supply-gated FIFO script with a backfill worker.
    Scripted,
}

/// One entry of the opening build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStep {
    /// Request priority in priority mode.
    pub priority: i32,
    /// Supply threshold in scripted mode.
    pub supply: u32,
    /// What to build.
    pub kind: BuildKind,
    /// Destination role for the produced unit.
    pub role: Role,
}

impl OpeningStep {
    const fn unit(priority: i32, supply: u32, kind: UnitKind, role: Role) -> Self {
        Self {
            priority,
            supply,
            kind: BuildKind::Unit(kind),
            role,
        }
    }
}

/// Low-priority request kept in the queue so idle production is never wasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Unit to train.
    pub kind: UnitKind,
    /// Destination role.
    pub role: Role,
    /// Request priority.
    pub priority: i32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            kind: UnitKind::Drone,
            role: Role::Worker,
            priority: 1,
        }
    }
}

/// Largest accepted distance setting, in map cells.
pub const MAX_DISTANCE: u32 = 1000;

/// Largest accepted energy threshold.
pub const MAX_ENERGY: u32 = 200;

/// Engine tunables. Distances are in whole map units, fractions in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Resource nodes closer than this to a centroid join its base site.
    pub cluster_radius: u32,
    /// Grid step for exhaustive scouting waypoints.
    pub base_radius: u32,
    /// Own townhall within this distance of a site means the site is taken.
    pub expansion_clearance: u32,
    /// Spiral rings tried around an anchor before giving up.
    pub placement_search_radius: u32,
    /// Worker-group threat radius around home.
    pub home_defense_radius: u32,
    /// Geyser search radius around home.
    pub geyser_search_radius: u32,
    /// Starting approach distance for rallying units.
    pub initial_approach_distance: u32,
    /// Rally point position between home (0) and the enemy base (100).
    pub rally_percent: u32,
    /// Unit kind whose arrival commits the attack group.
    pub attack_trigger: UnitKind,
    /// Unit kinds that can shoot flying targets.
    pub air_capable: Vec<UnitKind>,
    /// Unit kind routed to the intermediate group when no entry is pending.
    pub production_material: UnitKind,
    /// Unit kind injected when supply blocks production.
    pub supply_provider: UnitKind,
    /// Workers moved to a freshly completed extractor.
    pub extractor_workers: u32,
    /// Gatherers per mineral patch before workers spill to the next patch.
    pub mineral_saturation: u32,
    /// Queen energy needed to inject larva.
    pub inject_energy: u32,
    /// Supply cap at which no more supply providers are requested.
    pub supply_cap_limit: u32,
    /// Consecutive failures before a request logs a stall warning.
    pub stall_warning_attempts: u32,
    /// Priority for replacing lost units.
    pub replacement_priority: i32,
    /// Priority for replacing lost structures.
    pub structure_replacement_priority: i32,
    /// Always-present low-priority worker request.
    pub backfill: BackfillConfig,
    /// Production selection mode.
    pub scheduling: SchedulingMode,
    /// Requests loaded at game start.
    pub opening: Vec<OpeningStep>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cluster_radius: 20,
            base_radius: 15,
            expansion_clearance: 10,
            placement_search_radius: 15,
            home_defense_radius: 15,
            geyser_search_radius: 15,
            initial_approach_distance: 30,
            rally_percent: 50,
            attack_trigger: UnitKind::Ravager,
            air_capable: vec![UnitKind::Queen, UnitKind::Ravager, UnitKind::Roach],
            production_material: UnitKind::Larva,
            supply_provider: UnitKind::Overlord,
            extractor_workers: 3,
            mineral_saturation: 2,
            inject_energy: 25,
            supply_cap_limit: 200,
            stall_warning_attempts: 600,
            replacement_priority: 0,
            structure_replacement_priority: 100,
            backfill: BackfillConfig::default(),
            scheduling: SchedulingMode::Priority,
            opening: default_opening(),
        }
    }
}

fn default_opening() -> Vec<OpeningStep> {
    use Role::{Attack, Building, Scout, Worker};
    use UnitKind::{
        Extractor, Hatchery, Overlord, Queen, Ravager, Roach, RoachWarren, SpawningPool,
        Zergling,
    };

    let mut opening = vec![
        OpeningStep::unit(100, 13, Overlord, Scout),
        OpeningStep::unit(96, 16, Extractor, Building),
        OpeningStep::unit(95, 16, SpawningPool, Building),
        OpeningStep::unit(94, 17, Hatchery, Building),
    ];
    opening.extend([OpeningStep::unit(90, 16, Zergling, Scout); 3]);
    opening.push(OpeningStep::unit(85, 19, Queen, Worker));
    opening.push(OpeningStep::unit(80, 21, RoachWarren, Building));
    opening.push(OpeningStep {
        priority: 80,
        supply: 21,
        kind: BuildKind::Research {
            upgrade: Upgrade::MetabolicBoost,
            at: SpawningPool,
        },
        role: Building,
    });
    opening.push(OpeningStep::unit(75, 21, Overlord, Scout));
    opening.extend([OpeningStep::unit(70, 21, Roach, Attack); 4]);
    opening.push(OpeningStep::unit(65, 29, Overlord, Scout));
    opening.extend([OpeningStep::unit(60, 29, Zergling, Attack); 5]);
    opening.push(OpeningStep::unit(55, 34, Ravager, Attack));
    opening.extend([OpeningStep::unit(50, 29, Zergling, Attack); 5]);
    opening.push(OpeningStep::unit(45, 19, Queen, Worker));
    opening
}

impl AgentConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AgentError::ConfigNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string. Missing fields take their defaults.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| AgentError::InvalidConfig(e.to_string()))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.distances() {
            if value > MAX_DISTANCE {
                return Err(AgentError::InvalidConfig(format!(
                    "{name} {value} exceeds {MAX_DISTANCE}"
                )));
            }
        }
        if self.cluster_radius == 0 {
            return Err(AgentError::InvalidConfig(
                "cluster_radius must be positive".to_string(),
            ));
        }
        if self.base_radius == 0 {
            return Err(AgentError::InvalidConfig(
                "base_radius must be positive".to_string(),
            ));
        }
        if self.inject_energy > MAX_ENERGY {
            return Err(AgentError::InvalidConfig(format!(
                "inject_energy {} exceeds {MAX_ENERGY}",
                self.inject_energy
            )));
        }
        if self.rally_percent > 100 {
            return Err(AgentError::InvalidConfig(format!(
                "rally_percent {} exceeds 100",
                self.rally_percent
            )));
        }
        if self.supply_cap_limit == 0 {
            return Err(AgentError::InvalidConfig(
                "supply_cap_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Pull every bounded field into its accepted range.
    ///
    /// A clamped configuration always passes [`AgentConfig::validate`].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        for field in [&mut self.cluster_radius, &mut self.base_radius] {
            *field = (*field).clamp(1, MAX_DISTANCE);
        }
        for field in [
            &mut self.expansion_clearance,
            &mut self.placement_search_radius,
            &mut self.home_defense_radius,
            &mut self.geyser_search_radius,
            &mut self.initial_approach_distance,
        ] {
            *field = (*field).min(MAX_DISTANCE);
        }
        self.inject_energy = self.inject_energy.min(MAX_ENERGY);
        self.rally_percent = self.rally_percent.min(100);
        self.supply_cap_limit = self.supply_cap_limit.max(1);
        self
    }

    fn distances(&self) -> [(&'static str, u32); 7] {
        [
            ("cluster_radius", self.cluster_radius),
            ("base_radius", self.base_radius),
            ("expansion_clearance", self.expansion_clearance),
            ("placement_search_radius", self.placement_search_radius),
            ("home_defense_radius", self.home_defense_radius),
            ("geyser_search_radius", self.geyser_search_radius),
            ("initial_approach_distance", self.initial_approach_distance),
        ]
    }
}
