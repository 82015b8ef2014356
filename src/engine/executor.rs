//! Execution engine - berks-deploy executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyContext, ApplyResult, AutoConfirm, CommandRunner, ConfirmCallback, ExecuteOptions,
    ExecuteSummary, ExecutionPlan, ProgressCallback, compute_diffs, execute_with_diffs,
};
use indicatif::ProgressBar;

use super::differ::display_diff;
use crate::progress;

/// Options for a converge run, including `yes` for confirmation skip
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
}

/// Spinner per step, replaced by a status line when the step finishes
#[derive(Default)]
struct TerminalProgress {
    current: Option<(ProgressBar, String)>,
}

impl ProgressCallback for TerminalProgress {
    fn on_resource_start(&mut self, _id: &str, description: &str) {
        self.current = Some((progress::spinner(description), description.to_string()));
    }

    fn on_resource_complete(&mut self, _id: &str, result: &ApplyResult) {
        let Some((pb, description)) = self.current.take() else {
            return;
        };
        progress::finish_clear(&pb);
        match result {
            ApplyResult::NoChange => println!("    {} {}", "○".dimmed(), description.dimmed()),
            ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => {
                println!("    {} {}", "✓".green(), description);
            }
            ApplyResult::Skipped { reason } => {
                println!("    {} {} ({reason})", "⊘".yellow(), description);
            }
        }
    }

    fn on_resource_failed(&mut self, _id: &str, error: &anyhow::Error) {
        if let Some((pb, description)) = self.current.take() {
            progress::finish_clear(&pb);
            println!("    {} {}: {error:#}", "✗".red(), description);
        }
    }
}

/// Interactive confirmation via dialoguer
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new().with_prompt(prompt).default(true).interact()?;
        Ok(confirmed)
    }
}

/// Execute a plan with berks-deploy's UI integration
pub fn run(
    plan: &ExecutionPlan,
    opts: &RunOptions,
    runner: &dyn CommandRunner,
) -> Result<ExecuteSummary> {
    let ctx = ApplyContext::new(opts.dry_run, opts.verbose, runner);
    let diffs = compute_diffs(&plan.steps, &ctx);
    display_diff(&plan.name, &diffs);
    display_notes(plan);

    let exec_opts = ExecuteOptions {
        dry_run: opts.dry_run,
        verbose: opts.verbose,
    };

    println!();
    let mut progress = TerminalProgress::default();
    let summary = if opts.yes {
        execute_with_diffs(plan, &diffs, &exec_opts, runner, &mut progress, &mut AutoConfirm)?
    } else {
        execute_with_diffs(plan, &diffs, &exec_opts, runner, &mut progress, &mut PromptConfirm)?
    };

    if opts.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else {
        print_summary(&summary);
    }
    Ok(summary)
}

fn display_notes(plan: &ExecutionPlan) {
    if plan.notes.is_empty() {
        return;
    }
    println!();
    println!("  {} Left in place:", "ℹ".blue());
    for note in &plan.notes {
        println!("    • {note}");
    }
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    if summary.total_changes() == 0 && summary.skipped == 0 {
        return;
    }

    println!();
    if summary.skipped > 0 && summary.total_changes() == 0 {
        println!("  {} Aborted", "✗".red());
    } else {
        println!("  {} Server converged", "✓".green().bold());
    }

    if summary.created > 0 {
        println!("    • {} steps created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} steps modified", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} steps removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} steps skipped", summary.skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::SystemGroup;
    use crate::testing::FakeHost;

    fn plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new("install /srv/berks");
        plan.push(Box::new(SystemGroup::present("berkshelf")));
        plan
    }

    #[test]
    fn test_yes_applies_without_prompt() {
        let host = FakeHost::new();
        let opts = RunOptions {
            yes: true,
            ..Default::default()
        };
        let summary = run(&plan(), &opts, &host).unwrap();
        assert_eq!(summary.created, 1);
        assert!(host.has_group("berkshelf"));
    }

    #[test]
    fn test_each_step_probed_once_before_and_once_during_run() {
        let host = FakeHost::new();
        let opts = RunOptions {
            yes: true,
            ..Default::default()
        };
        run(&plan(), &opts, &host).unwrap();
        let probes = host
            .commands()
            .iter()
            .filter(|c| *c == "getent group berkshelf")
            .count();
        assert_eq!(probes, 2);
    }

    #[test]
    fn test_dry_run_leaves_host_untouched() {
        let host = FakeHost::new();
        let opts = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = run(&plan(), &opts, &host).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(!host.has_group("berkshelf"));
    }

    #[test]
    fn test_progress_clears_state_on_completion() {
        let mut progress = TerminalProgress::default();
        progress.on_resource_start("berkshelf", "Create group berkshelf");
        assert!(progress.current.is_some());
        progress.on_resource_complete("berkshelf", &ApplyResult::Created);
        assert!(progress.current.is_none());
    }
}
