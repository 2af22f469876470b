//! CLI command handling
//!
//! Builds the run configuration from flags, environment, and the config
//! file, then hands off to the scenario engine.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::{self, FileConfig};
use crate::common::{Error, Result, RunConfig};
use crate::scenario::{self, ScenarioGroup};

/// Dispatch a CLI command, returning the process exit status
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            scenario,
            base_url,
            token,
            timeout,
            output_dir,
            dry_run,
            destructive,
            model,
            data_sources,
            file,
            question,
            share_with,
            state_key,
            tags,
            verbose: _,
        } => {
            let file_config = FileConfig::load()?;

            // Dry-run never dials out, so neither token nor URL is required.
            let token = if dry_run {
                token.unwrap_or_else(|| "dry-run".to_string())
            } else {
                config::resolve_token(token, file_config.token_command.as_deref()).await?
            };

            let base_url = match base_url.or(file_config.base_url) {
                Some(url) => url,
                None if dry_run => "http://localhost:0".to_string(),
                None => return Err(Error::Config("no base URL configured".to_string())),
            };

            let timeout_secs = timeout
                .or(file_config.timeout_secs)
                .unwrap_or_else(config::default_timeout_secs);

            let run_config = RunConfig {
                token,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                scenario,
                destructive,
                dry_run,
                output_dir: resolve_output_dir(output_dir, file_config.output_dir),
                model: model.or(file_config.model),
                data_sources: if data_sources.is_empty() {
                    file_config.data_sources
                } else {
                    data_sources
                },
                file: file.or(file_config.file),
                question: question
                    .or(file_config.question)
                    .unwrap_or_else(config::default_question),
                share_with: share_with.or(file_config.share_with),
                state_key: state_key.or(file_config.state_key),
                tags: if tags.is_empty() {
                    file_config.tags
                } else {
                    tags
                },
            };

            scenario::run(&run_config).await
        }

        Commands::List => {
            list_scenarios();
            Ok(0)
        }
    }
}

/// The CLI default is relative; an explicit config-file path wins over it
/// only when the flag was left at its default.
fn resolve_output_dir(flag: PathBuf, from_file: Option<PathBuf>) -> PathBuf {
    if flag == PathBuf::from("conformance-out") {
        from_file.unwrap_or(flag)
    } else {
        flag
    }
}

fn list_scenarios() {
    for group in [
        ScenarioGroup::Smoke,
        ScenarioGroup::Embed,
        ScenarioGroup::Files,
        ScenarioGroup::State,
        ScenarioGroup::Assistants,
        ScenarioGroup::All,
    ] {
        println!("{}", group.name().white().bold());
        if group == ScenarioGroup::All {
            println!("  {}", "every group above, in order".dimmed());
            continue;
        }
        for step in group.steps() {
            let marker = if step.destructive {
                " [destructive]".red().to_string()
            } else {
                String::new()
            };
            println!(
                "  {} {} {}{}",
                step.name,
                "→".dimmed(),
                step.endpoint.path().dimmed(),
                marker
            );
        }
    }
}
