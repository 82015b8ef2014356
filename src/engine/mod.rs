//! Execution engine for berks-deploy
//!
//! The engine orchestrates:
//! 1. Planning - Build the ordered step list from a server descriptor
//! 2. Diffing - Compute current vs desired state for display
//! 3. Executing - Converge the steps one at a time, stopping at the first failure

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{RunOptions, run};
pub use planner::{install_plan, uninstall_plan};
