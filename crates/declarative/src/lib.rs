//! # Declarative
//!
//! A framework for declarative resource management.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging systems to match the desired state.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (users, packages, files)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: An ordered pipeline of resources
//! - **Executor**: Converges each step in order, aborting on the first failure
//!
//! Every step is expected to be idempotent: a converged step reports the same
//! current and desired state and is skipped on the next run.
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`CommandRunner`]: Runs external commands on the target system
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks or process spawning, and lets tests script
//! the target system entirely in memory.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, CommandRunner, ConfirmCallback, NoProgress,
    ProgressCallback,
};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use error::Error;
pub use executor::{execute, execute_simple, execute_with_diffs};
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource};
pub use types::{
    ApplyResult, CommandOutput, CommandSpec, ExecuteOptions, ExecuteSummary, ResourceState,
};
