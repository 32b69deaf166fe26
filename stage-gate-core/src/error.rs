//! Error types for stage gate operations.

use crate::aws::AwsError;
use crate::types::ExecutionStatus;
use thiserror::Error;

/// Errors that end a stage gate invocation.
///
/// Every variant except [`StageGateError::Report`] is turned into a CodePipeline
/// failure report; `Report` means the report itself could not be filed.
#[derive(Debug, Error)]
pub enum StageGateError {
    /// The pipeline job carried unusable input.
    #[error("{0}")]
    InvalidInput(String),

    /// A provider call in the chain failed.
    #[error("Failed to {step}: {source}")]
    Upstream {
        step: &'static str,
        #[source]
        source: AwsError,
    },

    /// A provider response did not have the expected shape.
    #[error("{0}")]
    DataShape(String),

    /// The wait-workflow did not reach SUCCEEDED.
    #[error("workflow {execution_arn} {detail}")]
    IncompleteWorkflow {
        execution_arn: String,
        status: ExecutionStatus,
        detail: String,
    },

    /// Stage gate configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filing the job result with CodePipeline failed.
    #[error("Failed to report job result: {0}")]
    Report(#[source] AwsError),
}

impl StageGateError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::DataShape(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn upstream(step: &'static str, source: AwsError) -> Self {
        Self::Upstream { step, source }
    }
}

pub type StageGateResult<T> = Result<T, StageGateError>;
