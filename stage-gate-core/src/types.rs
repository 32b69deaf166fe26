//! Request-scoped values passed along the stage gate chain.

use crate::error::{StageGateError, StageGateResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message reported when the job carries no stack name.
pub const MISSING_STACK_NAME: &str = "The UserParameters field must contain the Stack Name!";

/// Summary attached to the success report.
pub const SUCCESS_MESSAGE: &str = "Success";

const CONTINUATION_PREFIX: &str = "execution:";

/// Lambda payload delivered by a CodePipeline "Invoke" action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineJobEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub data: PipelineJobData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJobData {
    #[serde(default)]
    pub action_configuration: ActionConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionConfiguration {
    #[serde(default)]
    pub configuration: ActionConfigurationValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionConfigurationValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_parameters: Option<String>,
}

impl PipelineJobEvent {
    /// Decode a raw Lambda payload.
    pub fn from_value(value: serde_json::Value) -> StageGateResult<Self> {
        serde_json::from_value(value).map_err(|e| {
            StageGateError::invalid_input(format!("Malformed CodePipeline job event: {e}"))
        })
    }
}

/// Where an invocation picks up a job that is already in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Resume polling a wait-workflow started by an earlier invocation.
    Execution(WorkflowHandle),
}

impl Continuation {
    /// Token handed to CodePipeline so the next invocation can resume.
    pub fn to_token(&self) -> String {
        match self {
            Continuation::Execution(handle) => {
                format!("{CONTINUATION_PREFIX}{}", handle.execution_arn)
            }
        }
    }

    /// Decode a token produced by [`Continuation::to_token`].
    ///
    /// Returns `None` for tokens written by anything else.
    pub fn from_token(token: &str) -> Option<Self> {
        let arn = token.strip_prefix(CONTINUATION_PREFIX)?.trim();
        if arn.is_empty() {
            return None;
        }
        Some(Continuation::Execution(WorkflowHandle::new(arn)))
    }
}

/// Stage gate input for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub job_id: String,
    pub stack_name: String,
    pub invocation_id: String,
    pub continuation: Option<Continuation>,
}

impl StageRequest {
    /// Build a request from a job event and the host's invocation id.
    ///
    /// An unrecognised continuation token is dropped with a warning and the
    /// job runs from the start.
    pub fn from_event(event: PipelineJobEvent, invocation_id: impl Into<String>) -> Self {
        let PipelineJob { id, data, .. } = event.job;
        let stack_name = data
            .action_configuration
            .configuration
            .user_parameters
            .map(|p| p.trim().to_string())
            .unwrap_or_default();

        let continuation = data.continuation_token.and_then(|token| {
            let decoded = Continuation::from_token(&token);
            if decoded.is_none() {
                log::warn!("Ignoring unrecognised continuation token for job {id}: {token}");
            }
            decoded
        });

        Self {
            job_id: id,
            stack_name,
            invocation_id: invocation_id.into(),
            continuation,
        }
    }
}

/// One entry of the REST API listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDescriptor {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl ApiDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }
}

/// A page of the REST API listing and the cursor for the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryPage {
    pub items: Vec<ApiDescriptor>,
    pub position: Option<String>,
}

/// A started wait-workflow execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowHandle {
    pub execution_arn: String,
}

impl WorkflowHandle {
    pub fn new(execution_arn: impl Into<String>) -> Self {
        Self {
            execution_arn: execution_arn.into(),
        }
    }
}

/// Execution status as reported by the workflow service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
    PendingRedrive,
    Other(String),
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::TimedOut => "TIMED_OUT",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::PendingRedrive => "PENDING_REDRIVE",
            ExecutionStatus::Other(s) => s,
        }
    }

    /// Whether the execution can no longer change status on its own.
    ///
    /// `PENDING_REDRIVE` is not terminal: a redrive may still move it back to
    /// `RUNNING`.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ExecutionStatus::Running | ExecutionStatus::PendingRedrive
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionDescription {
    pub status: ExecutionStatus,
    pub error: Option<String>,
    pub cause: Option<String>,
}

impl ExecutionDescription {
    pub fn with_status(status: ExecutionStatus) -> Self {
        Self {
            status,
            error: None,
            cause: None,
        }
    }
}

/// CodePipeline rejects failure messages longer than this.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5000;

const TRUNCATION_MARKER: &str = "...";

/// Payload of a CodePipeline failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub message: String,
    pub external_execution_id: String,
}

impl FailureReport {
    /// Build a report, cutting `message` to [`MAX_FAILURE_MESSAGE_CHARS`]
    /// characters on a char boundary.
    pub fn new(message: &str, external_execution_id: impl Into<String>) -> Self {
        Self {
            message: truncate_message(message),
            external_execution_id: external_execution_id.into(),
        }
    }
}

fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_FAILURE_MESSAGE_CHARS {
        return message.to_string();
    }
    let keep = MAX_FAILURE_MESSAGE_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// The single report an invocation filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The wait-workflow succeeded and the job was marked successful.
    Succeeded { execution_arn: String },
    /// The wait-workflow is still running; CodePipeline will invoke again.
    InProgress { execution_arn: String },
    /// A failure report was filed.
    Failed { message: String },
    /// No report could be filed; CodePipeline will time the job out.
    Unreported { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_event(user_parameters: serde_json::Value) -> serde_json::Value {
        json!({
            "CodePipeline.job": {
                "id": "job-1",
                "accountId": "123456789012",
                "data": {
                    "actionConfiguration": {
                        "configuration": {
                            "FunctionName": "stage-gate",
                            "UserParameters": user_parameters
                        }
                    },
                    "inputArtifacts": [],
                    "outputArtifacts": []
                }
            }
        })
    }

    #[test]
    fn test_request_from_event() {
        let event = PipelineJobEvent::from_value(job_event(json!("my-stack"))).unwrap();
        let request = StageRequest::from_event(event, "req-1");
        assert_eq!(request.job_id, "job-1");
        assert_eq!(request.stack_name, "my-stack");
        assert_eq!(request.invocation_id, "req-1");
        assert_eq!(request.continuation, None);
    }

    #[test]
    fn test_request_trims_stack_name() {
        let event = PipelineJobEvent::from_value(job_event(json!("  my-stack \n"))).unwrap();
        assert_eq!(StageRequest::from_event(event, "req-1").stack_name, "my-stack");
    }

    #[test]
    fn test_missing_user_parameters_gives_empty_stack_name() {
        let event = PipelineJobEvent::from_value(json!({
            "CodePipeline.job": {
                "id": "job-1",
                "data": { "actionConfiguration": { "configuration": {} } }
            }
        }))
        .unwrap();
        assert_eq!(StageRequest::from_event(event, "req-1").stack_name, "");
    }

    #[test]
    fn test_malformed_event_is_invalid_input() {
        let result = PipelineJobEvent::from_value(json!({ "Records": [] }));
        match result {
            Err(StageGateError::InvalidInput(msg)) => {
                assert!(msg.contains("Malformed CodePipeline job event"), "{msg}");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_continuation_token_round_trip() {
        let arn = "arn:aws:states:us-east-2:123456789012:execution:WaitStage:abc";
        let continuation = Continuation::Execution(WorkflowHandle::new(arn));
        let token = continuation.to_token();
        assert_eq!(token, format!("execution:{arn}"));
        assert_eq!(Continuation::from_token(&token), Some(continuation));
    }

    #[test]
    fn test_foreign_continuation_token_is_dropped() {
        let mut value = job_event(json!("my-stack"));
        value["CodePipeline.job"]["data"]["continuationToken"] = json!("something-else");
        let event = PipelineJobEvent::from_value(value).unwrap();
        assert_eq!(StageRequest::from_event(event, "req-1").continuation, None);

        assert_eq!(Continuation::from_token("execution:"), None);
    }

    #[test]
    fn test_continuation_token_is_decoded_from_event() {
        let mut value = job_event(json!("my-stack"));
        value["CodePipeline.job"]["data"]["continuationToken"] =
            json!("execution:arn:aws:states:us-east-2:123456789012:execution:WaitStage:abc");
        let event = PipelineJobEvent::from_value(value).unwrap();
        let request = StageRequest::from_event(event, "req-1");
        assert_eq!(
            request.continuation,
            Some(Continuation::Execution(WorkflowHandle::new(
                "arn:aws:states:us-east-2:123456789012:execution:WaitStage:abc"
            )))
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(!ExecutionStatus::PendingRedrive.is_terminal());
        assert!(ExecutionStatus::Succeeded.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::TimedOut.is_terminal());
        assert!(ExecutionStatus::Aborted.is_terminal());
        assert_eq!(ExecutionStatus::TimedOut.to_string(), "TIMED_OUT");
    }

    #[test]
    fn test_failure_report_keeps_short_message() {
        let report = FailureReport::new(MISSING_STACK_NAME, "req-1");
        assert_eq!(report.message, MISSING_STACK_NAME);
        assert_eq!(report.external_execution_id, "req-1");
    }

    #[test]
    fn test_failure_report_truncates_on_char_boundary() {
        let exact = "a".repeat(MAX_FAILURE_MESSAGE_CHARS);
        assert_eq!(FailureReport::new(&exact, "req-1").message, exact);

        // Multi-byte characters must not be split.
        let long = "é".repeat(MAX_FAILURE_MESSAGE_CHARS + 1);
        let report = FailureReport::new(&long, "req-1");
        assert_eq!(report.message.chars().count(), MAX_FAILURE_MESSAGE_CHARS);
        assert!(report.message.starts_with("éé"));
        assert!(report.message.ends_with("..."));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = StageOutcome::InProgress {
            execution_arn: "arn:exec".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            json!({ "outcome": "in_progress", "execution_arn": "arn:exec" })
        );
    }
}
