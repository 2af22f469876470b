//! Conformance harness for a schema-drifting HTTP JSON gateway
//!
//! This library provides the test-orchestration engine: scenario groups
//! of ordered, dependent API calls, multi-shape response validation, an
//! offline mock backend, and per-test artifact persistence.

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod common;
pub mod endpoints;
pub mod ledger;
pub mod mock;
pub mod scenario;
pub mod shapes;
pub mod transport;

// Re-export commonly used types for tests
pub use common::{Error, Result, RunConfig};
pub use endpoints::Endpoint;
pub use scenario::{CapturedState, ScenarioGroup, StepOutcome};
