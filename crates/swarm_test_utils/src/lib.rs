//! # Swarm Test Utilities
//!
//! Shared testing utilities for the engine crates:
//! - In-memory fake world implementing every host interface
//! - Recording action sink
//! - Match harness and determinism checks
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod strategies;

use std::sync::Once;

/// Re-export proptest for convenience.
pub use proptest;

static TRACING: Once = Once::new();

/// Install a test-writer tracing subscriber once per process.
///
/// Honours `RUST_LOG`; silent when it is unset.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
