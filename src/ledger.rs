//! Run result accumulation
//!
//! One line per step as it completes, aggregate counts at the end, and
//! the process exit status. Skipped steps count as passes: an unmet
//! precondition is expected housekeeping, not a conformance deviation.

use colored::Colorize;

use crate::scenario::StepOutcome;

/// Pass/fail accumulator for one run
#[derive(Debug, Default)]
pub struct Ledger {
    passed: u32,
    failed: u32,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step outcome and print its report line
    pub fn record(&mut self, name: &str, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Validated { shape } => {
                self.passed += 1;
                println!("  {} {} ({})", "PASS".green().bold(), name, shape.dimmed());
            }
            StepOutcome::Skipped { reason } => {
                self.passed += 1;
                println!(
                    "  {} {} ({})",
                    "SKIP".yellow().bold(),
                    name,
                    reason.dimmed()
                );
            }
            StepOutcome::ValidationFailed { diagnostic } => {
                self.failed += 1;
                println!("  {} {}: {}", "FAIL".red().bold(), name, diagnostic);
            }
        }
    }

    pub fn passed(&self) -> u32 {
        self.passed
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    /// Print the summary and return the process exit status
    pub fn finalize(&self) -> i32 {
        let total = self.passed + self.failed;
        println!();
        if self.failed == 0 {
            println!(
                "{} {} passed, {} failed ({} total)",
                "✓".green().bold(),
                self.passed,
                self.failed,
                total
            );
            0
        } else {
            println!(
                "{} {} passed, {} failed ({} total)",
                "✗".red().bold(),
                self.passed,
                self.failed,
                total
            );
            1
        }
    }
}
