//! Scenario orchestration
//!
//! Ordered, dependent test steps grouped into named scenarios, with the
//! captured-state accumulator that threads identifiers between them.

pub mod engine;
pub mod state;
pub mod steps;

pub use engine::{execute_step, run, ScenarioGroup, StepOutcome};
pub use state::{CapturedState, StateKey};
