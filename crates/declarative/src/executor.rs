//! Execution engine - converges a plan's steps one at a time, in order

use crate::context::{ApplyContext, CommandRunner, ConfirmCallback, ProgressCallback};
use crate::diff::{ResourceDiff, compute_diffs};
use crate::error::Error;
use crate::planner::ExecutionPlan;
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;

/// Execute a plan with the given options and callbacks
///
/// Steps run sequentially in plan order. A step whose current state already
/// matches its desired state is not applied. The first failing step aborts
/// the run with [`Error::StepFailed`]; nothing after it is attempted.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, verbose)
/// * `runner` - Runner for every external command
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
///
/// # Returns
/// Summary of execution results
pub fn execute<P, C>(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    runner: &dyn CommandRunner,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let ctx = ApplyContext::new(opts.dry_run, opts.verbose, runner);
    let diffs = compute_diffs(&plan.steps, &ctx);
    execute_with_diffs(plan, &diffs, opts, runner, progress, confirm)
}

/// Execute a plan whose diffs the caller has already computed
///
/// `diffs` decide whether there is anything to converge and what the
/// confirmation prompt counts. Each step is still probed right before it
/// runs, since earlier steps change what later ones see.
pub fn execute_with_diffs<P, C>(
    plan: &ExecutionPlan,
    diffs: &[ResourceDiff],
    opts: &ExecuteOptions,
    runner: &dyn CommandRunner,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let ctx = ApplyContext::new(opts.dry_run, opts.verbose, runner);
    let pending = diffs.len();

    if pending == 0 {
        log::info!("{}: nothing to converge", plan.name);
        return Ok(ExecuteSummary {
            no_change: plan.len(),
            ..Default::default()
        });
    }

    if opts.dry_run {
        return Ok(ExecuteSummary {
            skipped: pending,
            no_change: plan.len() - pending,
            ..Default::default()
        });
    }

    if !confirm.confirm(&format!("Apply {pending} change(s) for {}?", plan.name))? {
        return Ok(ExecuteSummary {
            skipped: pending,
            no_change: plan.len() - pending,
            ..Default::default()
        });
    }

    let mut summary = ExecuteSummary::default();
    for step in &plan.steps {
        progress.on_resource_start(&step.id(), &step.description());
        match converge_step(step.as_ref(), &ctx) {
            Ok(result) => {
                progress.on_resource_complete(&step.id(), &result);
                summary.add_result(&result);
            }
            Err(e) => {
                log::error!("{}: {e:#}", step.description());
                progress.on_resource_failed(&step.id(), &e);
                return Err(Error::StepFailed {
                    id: step.id(),
                    description: step.description(),
                    source: e.into(),
                }
                .into());
            }
        }
    }

    Ok(summary)
}

/// Converge a single resource
fn converge_step(resource: &dyn Resource, ctx: &ApplyContext) -> Result<ApplyResult> {
    if !resource.needs_apply(ctx)? {
        log::debug!("{} already converged", resource.id());
        return Ok(ApplyResult::NoChange);
    }
    resource.apply(ctx)
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    runner: &dyn CommandRunner,
) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, opts, runner, &mut NoProgress, &mut AutoConfirm)
}
