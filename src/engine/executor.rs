//! Execution engine - caixa-specific executor with UI integration

use colored::Colorize;
use declarative::{
    ApplyAction, ApplyResult, Backend, ConfirmCallback, ExecuteOptions, ExecuteSummary, Plan,
    ProgressCallback, StateDocument,
};
use indicatif::ProgressBar;

use super::differ::display_plan;
use crate::progress;

/// Options for execution (caixa-specific, includes `yes` for confirmation skip)
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Hide the progress bar
    pub quiet: bool,
    /// Verbose output
    pub verbose: bool,
}

/// Show the plan, confirm, then apply it with a progress bar.
///
/// `state` is advanced in place, including on error, so the caller can
/// persist whatever completed.
pub fn execute(
    backend: &dyn Backend,
    plan: &Plan,
    state: &mut StateDocument,
    opts: &ApplyOptions,
) -> declarative::Result<ExecuteSummary> {
    display_plan(plan);

    if plan.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    let mut progress = BarProgress::new(opts.quiet);
    let mut confirm = TerminalConfirm {
        assume_yes: opts.yes,
    };
    let exec_opts = ExecuteOptions {
        dry_run: opts.dry_run,
        verbose: opts.verbose,
    };

    let summary =
        declarative::execute(backend, plan, state, &exec_opts, &mut progress, &mut confirm)?;

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.skipped > 0 {
        println!();
        println!("  {} Aborted", "✗".red());
    } else {
        print_summary(&summary);
    }

    Ok(summary)
}

/// Confirmation through a dialoguer prompt
pub struct TerminalConfirm {
    pub assume_yes: bool,
}

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> declarative::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| declarative::Error::Prompt {
                source: std::io::Error::other(e),
            })
    }
}

/// Progress reporting through an indicatif bar
pub struct BarProgress {
    quiet: bool,
    bar: Option<ProgressBar>,
    total: usize,
    done: usize,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            bar: None,
            total: 0,
            done: 0,
        }
    }

    /// Whether the run stopped before every entry completed
    fn stopped_early(&self) -> bool {
        self.done < self.total
    }
}

impl ProgressCallback for BarProgress {
    fn on_start(&mut self, total: usize) {
        let pb = if self.quiet {
            progress::hidden()
        } else {
            progress::bar(total as u64, "Applying")
        };
        self.bar = Some(pb);
        self.total = total;
        self.done = 0;
    }

    fn on_resource_start(&mut self, name: &str, action: ApplyAction) {
        let symbol = match action {
            ApplyAction::Create => "+",
            ApplyAction::Update => "~",
        };
        if let Some(pb) = &self.bar {
            pb.set_message(format!("{symbol} {name}"));
        }
    }

    fn on_resource_complete(&mut self, name: &str, result: &ApplyResult) {
        log::debug!("{name}: {result:?}");
        self.done += 1;
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn on_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            if self.stopped_early() {
                progress::finish_error(&pb, "Apply stopped");
            } else {
                pb.finish_and_clear();
            }
        }
    }
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    println!(
        "  {} Configuration applied successfully!",
        "✓".green().bold()
    );

    if summary.created > 0 {
        println!("    • {} buckets created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} buckets updated", summary.modified);
    }
}
