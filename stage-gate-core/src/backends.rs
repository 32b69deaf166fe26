//! Collaborator seams of the stage gate.
//!
//! The orchestration only talks to these traits. The `aws` module provides the
//! SDK-backed implementations; tests provide in-memory ones.

use std::sync::Arc;

use async_trait::async_trait;

use crate::aws::AwsResult;
use crate::types::{ExecutionDescription, FailureReport, RegistryPage, WorkflowHandle};

/// Source of deployed stack templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Processed (post-transform) template body of a stack, if the service returned one.
    async fn processed_template(&self, stack_name: &str) -> AwsResult<Option<String>>;
}

/// Paginated listing of REST APIs.
#[async_trait]
pub trait ApiRegistry: Send + Sync {
    async fn list_apis(&self, page_size: u32, position: Option<String>)
        -> AwsResult<RegistryPage>;
}

/// Starts and describes wait-workflow executions.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn start(&self, state_machine_arn: &str, input: String) -> AwsResult<WorkflowHandle>;

    async fn describe(&self, handle: &WorkflowHandle) -> AwsResult<ExecutionDescription>;
}

/// Files job results with the invoking pipeline.
#[async_trait]
pub trait PipelineReporter: Send + Sync {
    /// Mark the job successful. With a continuation token the pipeline invokes
    /// the action again instead of completing it.
    async fn report_success(
        &self,
        job_id: &str,
        summary: &str,
        continuation_token: Option<String>,
    ) -> AwsResult<()>;

    async fn report_failure(&self, job_id: &str, failure: &FailureReport) -> AwsResult<()>;
}

/// The full set of collaborators a [`crate::StageGateService`] needs.
#[derive(Clone)]
pub struct Backends {
    pub templates: Arc<dyn TemplateStore>,
    pub registry: Arc<dyn ApiRegistry>,
    pub workflows: Arc<dyn WorkflowService>,
    pub reporter: Arc<dyn PipelineReporter>,
}
