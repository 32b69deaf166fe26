//! Stage gate configuration

use std::time::Duration;

use crate::error::{StageGateError, StageGateResult};

/// Logical id of the REST API resource looked up in the template by default.
pub const DEFAULT_API_RESOURCE: &str = "CCTApi";
pub const DEFAULT_REGISTRY_PAGE_SIZE: u32 = 20;
pub const DEFAULT_REGISTRY_MAX_PAGES: u32 = 25;
/// API Gateway rejects `GetRestApis` limits above this.
pub const MAX_REGISTRY_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGateConfig {
    /// ARN of the wait-workflow state machine started for the resolved API.
    pub state_machine_arn: String,
    /// Template resource whose `Properties.Name` holds the REST API name.
    pub api_resource: String,
    /// Maximum descriptors requested per registry page.
    pub registry_page_size: u32,
    /// Maximum registry pages scanned before giving up.
    pub registry_max_pages: u32,
    /// Status polls per invocation; at least one.
    pub status_poll_attempts: u32,
    pub status_poll_interval: Duration,
    /// Hand a still-running workflow back to CodePipeline with a continuation
    /// token instead of failing the job.
    pub continue_while_running: bool,
}

impl StageGateConfig {
    pub fn new(state_machine_arn: impl Into<String>) -> Self {
        Self {
            state_machine_arn: state_machine_arn.into(),
            api_resource: DEFAULT_API_RESOURCE.to_string(),
            registry_page_size: DEFAULT_REGISTRY_PAGE_SIZE,
            registry_max_pages: DEFAULT_REGISTRY_MAX_PAGES,
            status_poll_attempts: 1,
            status_poll_interval: Duration::ZERO,
            continue_while_running: true,
        }
    }

    pub fn validate(&self) -> StageGateResult<()> {
        if self.state_machine_arn.trim().is_empty() {
            return Err(StageGateError::config("state machine ARN must not be empty"));
        }
        if self.api_resource.trim().is_empty() {
            return Err(StageGateError::config("API resource name must not be empty"));
        }
        if !(1..=MAX_REGISTRY_PAGE_SIZE).contains(&self.registry_page_size) {
            return Err(StageGateError::config(format!(
                "registry page size must be between 1 and {MAX_REGISTRY_PAGE_SIZE}, got {}",
                self.registry_page_size
            )));
        }
        if self.registry_max_pages == 0 {
            return Err(StageGateError::config("registry max pages must be at least 1"));
        }
        if self.status_poll_attempts == 0 {
            return Err(StageGateError::config("status poll attempts must be at least 1"));
        }
        Ok(())
    }
}
