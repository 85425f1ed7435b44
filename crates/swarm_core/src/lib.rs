//! # Swarm Core
//!
//! Production scheduling and unit dispatch for a real-time strategy bot.
//!
//! The engine never talks to a game directly. Every tick the host hands it a
//! [`world::WorldSnapshot`] plus the oracles it needs, and the engine answers
//! with [`world::Command`]s pushed into an [`world::ActionSink`]. All distance
//! math is fixed-point, so identical snapshots produce identical commands.
//!
//! ## Crate Structure
//!
//! - [`agent`] - Lifecycle entry points wiring everything together
//! - [`scheduler`] - Priority queue and scripted build order
//! - [`production`] - Affordability, producers and placement for one request
//! - [`assignment`] - Routes newly created units to their group
//! - [`dispatcher`] - Per-tick walk over groups and role controllers
//! - [`controllers`] - Worker, scout and attack behavior
//! - [`spatial`] - Base clustering, placement search, scout waypoints
//! - [`threat`] - Most dangerous enemy in a locality
//! - [`world`] - Host-facing snapshot, command and oracle types

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod assignment;
pub mod components;
pub mod config;
pub mod controllers;
pub mod dispatcher;
pub mod error;
pub mod intel;
pub mod math;
pub mod production;
pub mod scheduler;
pub mod spatial;
pub mod threat;
pub mod units;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentStats, MatchOutcome, MatchSummary, StepReport};
    pub use crate::assignment::AssignmentRouter;
    pub use crate::components::*;
    pub use crate::config::{AgentConfig, BackfillConfig, OpeningStep, SchedulingMode};
    pub use crate::dispatcher::{DispatchReport, GroupDispatcher, TacticalContext};
    pub use crate::error::{AgentError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::production::{BuildError, BuildKind, Budget, Issued};
    pub use crate::scheduler::{
        BuildRequest, DrainReport, IssuedRequest, ProductionScheduler, ScriptStep,
        ScriptedBuildOrder,
    };
    pub use crate::spatial::{BaseSite, ResourceNode, SpatialLocator};
    pub use crate::threat::{Locality, ThreatAssessment, ThreatTarget};
    pub use crate::units::{
        Ability, Alliance, Order, Placement, Producer, Recipe, Target, UnitKind, UnitTag, Upgrade,
    };
    pub use crate::world::{
        ActionSink, Command, Cost, Host, PathOracle, PlacementOracle, TypeData, UnitView,
        WeaponData, WorldSnapshot,
    };
}
