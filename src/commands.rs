//! CLI command definitions
//!
//! Defines the clap commands for the conformance CLI.

use clap::Subcommand;
use std::path::PathBuf;

use crate::scenario::ScenarioGroup;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario group against the gateway
    Run {
        /// Scenario group to run
        #[arg(value_enum)]
        scenario: ScenarioGroup,

        /// Gateway base URL (e.g. https://gateway.example.com/api/v1)
        #[arg(long)]
        base_url: Option<String>,

        /// API token (falls back to CONFORM_TOKEN, then token_command)
        #[arg(long)]
        token: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Directory for request/response artifacts
        #[arg(long, short, default_value = "conformance-out")]
        output_dir: PathBuf,

        /// Synthesize responses locally instead of calling the gateway
        #[arg(long)]
        dry_run: bool,

        /// Allow delete operations to execute
        #[arg(long)]
        destructive: bool,

        /// Preferred model id (wins over the captured one)
        #[arg(long)]
        model: Option<String>,

        /// Data source id for chat and retrieval requests
        /// Can be specified multiple times: --data-source ds-1 --data-source ds-2
        #[arg(long = "data-source")]
        data_sources: Vec<String>,

        /// Sample file for the upload step
        #[arg(long)]
        file: Option<PathBuf>,

        /// Question sent to chat endpoints
        #[arg(long)]
        question: Option<String>,

        /// Email address to share the created assistant with
        #[arg(long)]
        share_with: Option<String>,

        /// State key for the shared-state load step
        #[arg(long)]
        state_key: Option<String>,

        /// Tag applied by the set-tags step
        /// Can be specified multiple times: --tag a --tag b
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Verbose output (request bodies, matched shapes)
        #[arg(long, short)]
        verbose: bool,
    },

    /// List scenario groups and their steps
    List,
}
