//! Configuration loading from disk.

use std::io::Write;

use swarm_core::agent::Agent;
use swarm_core::config::{AgentConfig, SchedulingMode, MAX_DISTANCE};
use swarm_core::error::AgentError;
use swarm_core::units::UnitKind;
use swarm_test_utils::determinism::MatchHarness;
use swarm_test_utils::fixtures::FakeWorld;

#[test]
fn test_config_file_round_trip() {
    let config = AgentConfig {
        scheduling: SchedulingMode::Scripted,
        rally_percent: 40,
        attack_trigger: UnitKind::Roach,
        ..AgentConfig::default()
    };
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.to_ron_string().unwrap().as_bytes())
        .unwrap();

    let loaded = AgentConfig::load(file.path()).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_takes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.ron");
    std::fs::write(&path, "(mineral_saturation: 3, scheduling: Scripted)").unwrap();

    let loaded = AgentConfig::load(&path).unwrap();

    assert_eq!(loaded.mineral_saturation, 3);
    assert_eq!(loaded.scheduling, SchedulingMode::Scripted);
    assert_eq!(loaded.opening, AgentConfig::default().opening);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.ron");

    let err = AgentConfig::load(&path).unwrap_err();

    assert!(matches!(err, AgentError::ConfigNotFound(_)));
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    std::fs::write(&path, "(cluster_radius: \"wide\")").unwrap();

    let err = AgentConfig::load(&path).unwrap_err();

    assert!(matches!(err, AgentError::ConfigParse(_)));
}

#[test]
fn test_invalid_values_in_file_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invalid.ron");
    std::fs::write(&path, "(cluster_radius: 0)").unwrap();

    let err = AgentConfig::load(&path).unwrap_err();

    assert!(matches!(err, AgentError::InvalidConfig(_)));
}

#[test]
fn test_oversized_distances_are_rejected() {
    for ron in [
        "(cluster_radius: 50000)",
        "(home_defense_radius: 3000000000)",
        "(placement_search_radius: 1001)",
        "(inject_energy: 4000000000)",
    ] {
        let err = AgentConfig::from_ron_str(ron).unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig(_)), "{ron}");
    }
    assert!(AgentConfig::from_ron_str("(initial_approach_distance: 1000)").is_ok());
}

#[test]
fn test_clamped_config_validates() {
    let config = AgentConfig {
        cluster_radius: 50_000,
        base_radius: 0,
        home_defense_radius: 3_000_000_000,
        rally_percent: 250,
        supply_cap_limit: 0,
        ..AgentConfig::default()
    };
    assert!(config.validate().is_err());

    let clamped = config.clamped();

    clamped.validate().unwrap();
    assert_eq!(clamped.cluster_radius, MAX_DISTANCE);
    assert_eq!(clamped.base_radius, 1);
    assert_eq!(clamped.home_defense_radius, MAX_DISTANCE);
    assert_eq!(clamped.rally_percent, 100);
    assert_eq!(clamped.supply_cap_limit, 1);
}

#[test]
fn test_agent_construction_guards_config() {
    let config = AgentConfig {
        base_radius: 0,
        home_defense_radius: 3_000_000_000,
        ..AgentConfig::default()
    };

    assert!(matches!(
        Agent::try_new(config.clone()),
        Err(AgentError::InvalidConfig(_))
    ));
    let agent = Agent::new(config);
    assert_eq!(agent.config().base_radius, 1);
    assert_eq!(agent.config().home_defense_radius, MAX_DISTANCE);
}

#[test]
fn test_agent_with_clamped_config_runs_a_match() {
    let config = AgentConfig {
        cluster_radius: 50_000,
        base_radius: 0,
        ..AgentConfig::default()
    };
    let mut harness = MatchHarness::new(config, FakeWorld::standard_start());

    harness.run(5);

    assert_eq!(harness.reports.len(), 5);
}
