//! Step Functions-backed wait-workflow service

use async_trait::async_trait;
use aws_sdk_sfn::error::DisplayErrorContext;
use aws_sdk_sfn::types::ExecutionStatus as SfnExecutionStatus;
use aws_sdk_sfn::Client as SfnClient;

use crate::aws::{AwsError, AwsResult};
use crate::backends::WorkflowService;
use crate::types::{ExecutionDescription, ExecutionStatus, WorkflowHandle};

pub struct StepFunctionsWorkflows {
    client: SfnClient,
}

impl StepFunctionsWorkflows {
    pub fn new(client: SfnClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkflowService for StepFunctionsWorkflows {
    async fn start(&self, state_machine_arn: &str, input: String) -> AwsResult<WorkflowHandle> {
        let response = self
            .client
            .start_execution()
            .state_machine_arn(state_machine_arn)
            .input(input)
            .send()
            .await
            .map_err(|e| {
                AwsError::StepFunctions(format!(
                    "Failed to start execution of '{state_machine_arn}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(WorkflowHandle::new(response.execution_arn))
    }

    async fn describe(&self, handle: &WorkflowHandle) -> AwsResult<ExecutionDescription> {
        let response = self
            .client
            .describe_execution()
            .execution_arn(&handle.execution_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::StepFunctions(format!(
                    "Failed to describe execution '{}': {}",
                    handle.execution_arn,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(ExecutionDescription {
            status: map_status(&response.status),
            error: response.error,
            cause: response.cause,
        })
    }
}

fn map_status(status: &SfnExecutionStatus) -> ExecutionStatus {
    match status {
        SfnExecutionStatus::Running => ExecutionStatus::Running,
        SfnExecutionStatus::Succeeded => ExecutionStatus::Succeeded,
        SfnExecutionStatus::Failed => ExecutionStatus::Failed,
        SfnExecutionStatus::TimedOut => ExecutionStatus::TimedOut,
        SfnExecutionStatus::Aborted => ExecutionStatus::Aborted,
        SfnExecutionStatus::PendingRedrive => ExecutionStatus::PendingRedrive,
        other => ExecutionStatus::Other(other.as_str().to_string()),
    }
}
