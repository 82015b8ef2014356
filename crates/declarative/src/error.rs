//! Error types for plan execution

use thiserror::Error;

/// Errors raised while converging a plan
#[derive(Debug, Error)]
pub enum Error {
    /// A step failed; the remaining steps were not run
    #[error("{description} failed")]
    StepFailed {
        /// Identifier of the failing resource
        id: String,
        /// Description of the failing resource
        description: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    /// Identifier of the resource that caused the error
    pub fn resource_id(&self) -> &str {
        match self {
            Self::StepFailed { id, .. } => id,
        }
    }
}
