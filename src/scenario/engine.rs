//! Scenario execution
//!
//! Runs the ordered steps of a scenario group: plan, call, validate,
//! record, capture. A step failure is recorded and the run continues —
//! the point of a conformance sweep is to report every deviation in one
//! pass, not to stop at the first.

use clap::ValueEnum;
use colored::Colorize;
use tracing::{debug, warn};

use crate::artifacts::ArtifactStore;
use crate::common::{Result, RunConfig};
use crate::ledger::Ledger;
use crate::shapes::{validate, Validation};
use crate::transport::{CallResult, Transport, STATUS_TRANSPORT_FAILURE};

use super::state::CapturedState;
use super::steps::{Plan, StepSpec, ASSISTANTS, EMBED, FILES, SMOKE, STATE};

/// Named scenario groups, each a fixed ordered step sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioGroup {
    /// Model discovery plus a chat round-trip
    Smoke,
    /// Embedding-based retrieval
    Embed,
    /// File upload, query, and tagging
    Files,
    /// Shared-state export and import
    State,
    /// Assistant lifecycle
    Assistants,
    /// Every group, in order
    All,
}

impl ScenarioGroup {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioGroup::Smoke => "smoke",
            ScenarioGroup::Embed => "embed",
            ScenarioGroup::Files => "files",
            ScenarioGroup::State => "state",
            ScenarioGroup::Assistants => "assistants",
            ScenarioGroup::All => "all",
        }
    }

    /// Ordered steps for this group
    pub fn steps(&self) -> Vec<&'static StepSpec> {
        match self {
            ScenarioGroup::Smoke => SMOKE.iter().collect(),
            ScenarioGroup::Embed => EMBED.iter().collect(),
            ScenarioGroup::Files => FILES.iter().collect(),
            ScenarioGroup::State => STATE.iter().collect(),
            ScenarioGroup::Assistants => ASSISTANTS.iter().collect(),
            ScenarioGroup::All => [SMOKE, EMBED, FILES, STATE, ASSISTANTS]
                .iter()
                .flat_map(|group| group.iter())
                .collect(),
        }
    }
}

/// Terminal state of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Precondition unmet; counts as a pass, never touched the network
    Skipped { reason: String },
    /// Response matched a known shape
    Validated { shape: &'static str },
    /// Transport failure, server-signaled error, or unknown shape
    ValidationFailed { diagnostic: String },
}

/// Execute one step against the transport
pub async fn execute_step(
    step: &StepSpec,
    config: &RunConfig,
    state: &mut CapturedState,
    transport: &Transport,
) -> StepOutcome {
    if step.destructive && !config.destructive {
        warn!(step = step.name, "skipping: destructive actions disabled");
        return StepOutcome::Skipped {
            reason: "destructive actions disabled".to_string(),
        };
    }

    let call = match (step.plan)(config, state) {
        Plan::Skip { reason } => {
            warn!(step = step.name, %reason, "skipping");
            return StepOutcome::Skipped { reason };
        }
        Plan::Invoke { body } => transport.invoke(step.name, step.endpoint, body).await,
        Plan::Upload { file, metadata } => {
            transport.upload(step.name, step.endpoint, &file, metadata).await
        }
    };

    let call = match call {
        Ok(call) => call,
        Err(e) => {
            return StepOutcome::ValidationFailed {
                diagnostic: format!("artifact persistence failed: {e}"),
            }
        }
    };

    evaluate(step, call, state)
}

/// Turn a finished call into a step outcome, capturing identifiers
fn evaluate(step: &StepSpec, call: CallResult, state: &mut CapturedState) -> StepOutcome {
    if call.status == STATUS_TRANSPORT_FAILURE {
        return StepOutcome::ValidationFailed {
            diagnostic: "no HTTP response (connection error or timeout)".to_string(),
        };
    }
    if call.status != step.endpoint.success_status() {
        return StepOutcome::ValidationFailed {
            diagnostic: format!("HTTP {}", call.status),
        };
    }

    let Some(body) = call.body else {
        return StepOutcome::ValidationFailed {
            diagnostic: "response did not parse as JSON".to_string(),
        };
    };

    match validate(&body, step.shapes) {
        Validation::Matched { shape, extracted } => {
            for (key, value) in extracted {
                debug!(step = step.name, ?key, %value, "captured");
                state.set(key, value);
            }
            StepOutcome::Validated { shape }
        }
        Validation::ServerError { message } => StepOutcome::ValidationFailed {
            diagnostic: message,
        },
        Validation::NoMatch { tried } => StepOutcome::ValidationFailed {
            diagnostic: format!("no known shape matched (tried: {})", tried.join(", ")),
        },
    }
}

/// Run a full scenario and return the process exit status
pub async fn run(config: &RunConfig) -> Result<i32> {
    let store = ArtifactStore::create(&config.output_dir)?;
    let transport = Transport::new(config, store)?;
    let mut state = CapturedState::default();
    let mut ledger = Ledger::new();

    println!(
        "\n{} {}{}",
        "Running scenario:".blue().bold(),
        config.scenario.name().white().bold(),
        if config.dry_run {
            " (dry-run)".dimmed().to_string()
        } else {
            String::new()
        }
    );

    for step in config.scenario.steps() {
        let outcome = execute_step(step, config, &mut state, &transport).await;
        ledger.record(step.name, &outcome);
    }

    Ok(ledger.finalize())
}
