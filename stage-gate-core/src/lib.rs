//! This crate provides the core logic of the API readiness stage gate:
//! - CodePipeline job event decoding
//! - REST API name extraction from a stack's processed template
//! - REST API id resolution against the API Gateway listing
//! - Wait-workflow start and status polling, and job result reporting
//!

mod aws;
pub mod backends;
pub mod commands;
mod config;
mod error;
mod template;
mod types;

#[cfg(test)]
mod testing;

// Re-exports for a small, focused public API
pub use aws::{load_backends, AwsError, AwsResult};
pub use backends::{ApiRegistry, Backends, PipelineReporter, TemplateStore, WorkflowService};
pub use commands::{find_api_id, StageGateService};
pub use config::{
    StageGateConfig, DEFAULT_API_RESOURCE, DEFAULT_REGISTRY_MAX_PAGES, DEFAULT_REGISTRY_PAGE_SIZE,
    MAX_REGISTRY_PAGE_SIZE,
};
pub use error::{StageGateError, StageGateResult};
pub use template::extract_api_name;
pub use types::{
    ActionConfiguration, ActionConfigurationValues, ApiDescriptor, Continuation,
    ExecutionDescription, ExecutionStatus, FailureReport, PipelineJob, PipelineJobData,
    PipelineJobEvent, RegistryPage, StageOutcome, StageRequest, WorkflowHandle,
    MAX_FAILURE_MESSAGE_CHARS, MISSING_STACK_NAME, SUCCESS_MESSAGE,
};
