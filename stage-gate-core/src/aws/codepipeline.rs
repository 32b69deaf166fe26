//! CodePipeline job result reporting

use async_trait::async_trait;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::{ExecutionDetails, FailureDetails, FailureType};
use aws_sdk_codepipeline::Client as CodePipelineClient;

use crate::aws::{AwsError, AwsResult};
use crate::backends::PipelineReporter;
use crate::types::FailureReport;

pub struct CodePipelineReporter {
    client: CodePipelineClient,
}

impl CodePipelineReporter {
    pub fn new(client: CodePipelineClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PipelineReporter for CodePipelineReporter {
    async fn report_success(
        &self,
        job_id: &str,
        summary: &str,
        continuation_token: Option<String>,
    ) -> AwsResult<()> {
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .set_continuation_token(continuation_token)
            .execution_details(ExecutionDetails::builder().summary(summary).build())
            .send()
            .await
            .map_err(|e| {
                AwsError::CodePipeline(format!(
                    "Failed to put job success result for job '{job_id}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn report_failure(&self, job_id: &str, failure: &FailureReport) -> AwsResult<()> {
        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(failure_details(failure)?)
            .send()
            .await
            .map_err(|e| {
                AwsError::CodePipeline(format!(
                    "Failed to put job failure result for job '{job_id}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

fn failure_details(failure: &FailureReport) -> AwsResult<FailureDetails> {
    FailureDetails::builder()
        .r#type(FailureType::JobFailed)
        .message(&failure.message)
        .external_execution_id(&failure.external_execution_id)
        .build()
        .map_err(|e| AwsError::CodePipeline(format!("Failed to build failure details: {e}")))
}
