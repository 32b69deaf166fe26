//! Stage gate chain for the stage gate service

use log::{error, info, warn};
use serde_json::json;

use crate::error::{StageGateError, StageGateResult};
use crate::template::extract_api_name;
use crate::types::{
    Continuation, ExecutionDescription, ExecutionStatus, FailureReport, StageOutcome, StageRequest,
    WorkflowHandle, MISSING_STACK_NAME, SUCCESS_MESSAGE,
};

/// Where the wait-workflow stood when polling stopped.
enum WorkflowProgress {
    Succeeded(WorkflowHandle),
    StillRunning(WorkflowHandle),
}

impl super::service::StageGateService {
    /// Run the stage gate for one pipeline job and file exactly one report.
    ///
    /// Every failure along the chain becomes a CodePipeline failure report and
    /// a [`StageOutcome::Failed`]. An `Err` is returned only when the report
    /// itself could not be filed.
    pub async fn run(&self, request: &StageRequest) -> StageGateResult<StageOutcome> {
        let progress = match &request.continuation {
            // The stack name is still checked so a resumed job with empty
            // parameters fails the same way as a fresh one.
            Some(Continuation::Execution(handle)) if !request.stack_name.is_empty() => {
                info!(
                    "Resuming job {} at workflow execution {}",
                    request.job_id, handle.execution_arn
                );
                self.await_workflow(handle.clone()).await
            }
            _ => self.gate(request).await,
        };

        match progress {
            Ok(WorkflowProgress::Succeeded(handle)) => {
                self.report_success(request, None).await?;
                Ok(StageOutcome::Succeeded {
                    execution_arn: handle.execution_arn,
                })
            }
            Ok(WorkflowProgress::StillRunning(handle)) => {
                let token = Continuation::Execution(handle.clone()).to_token();
                self.report_success(request, Some(token)).await?;
                Ok(StageOutcome::InProgress {
                    execution_arn: handle.execution_arn,
                })
            }
            Err(e) => {
                let message = self.report_failure(request, &e).await?;
                Ok(StageOutcome::Failed { message })
            }
        }
    }

    /// [`run`](Self::run) for hosts that retry failed invocations.
    ///
    /// A failed report is logged and returned as [`StageOutcome::Unreported`]
    /// rather than as an error, so an asynchronous retry cannot start a second
    /// wait-workflow for the same job.
    pub async fn run_to_outcome(&self, request: &StageRequest) -> StageOutcome {
        match self.run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Job {} left without a report: {e}", request.job_id);
                StageOutcome::Unreported {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn gate(&self, request: &StageRequest) -> StageGateResult<WorkflowProgress> {
        if request.stack_name.is_empty() {
            return Err(StageGateError::invalid_input(MISSING_STACK_NAME));
        }

        info!(
            "Job {}: fetching processed template of stack {}",
            request.job_id, request.stack_name
        );
        let template_body = self
            .backends
            .templates
            .processed_template(&request.stack_name)
            .await
            .map_err(|e| StageGateError::upstream("fetch template", e))?
            .ok_or_else(|| {
                StageGateError::data_shape(format!(
                    "Stack {} returned no template body",
                    request.stack_name
                ))
            })?;

        let api_name = extract_api_name(&template_body, &self.config.api_resource)?;
        info!("Stack {} declares REST API '{api_name}'", request.stack_name);

        let api_id = self.resolve_api_id(&api_name).await?;

        let input = json!({ "apiId": api_id }).to_string();
        let handle = self
            .backends
            .workflows
            .start(&self.config.state_machine_arn, input)
            .await
            .map_err(|e| StageGateError::upstream("start wait-workflow", e))?;
        info!(
            "Started wait-workflow execution {} for REST API {api_id}",
            handle.execution_arn
        );

        self.await_workflow(handle).await
    }

    /// Poll the execution up to `status_poll_attempts` times, stopping early
    /// once it reaches a terminal status.
    async fn await_workflow(&self, handle: WorkflowHandle) -> StageGateResult<WorkflowProgress> {
        let attempts = self.config.status_poll_attempts.max(1);
        let mut description = self.describe(&handle).await?;

        for _ in 1..attempts {
            if description.status.is_terminal() {
                break;
            }
            if !self.config.status_poll_interval.is_zero() {
                tokio::time::sleep(self.config.status_poll_interval).await;
            }
            description = self.describe(&handle).await?;
        }

        let status = &description.status;
        if status.is_terminal() {
            if *status == ExecutionStatus::Succeeded {
                return Ok(WorkflowProgress::Succeeded(handle));
            }
            return Err(StageGateError::IncompleteWorkflow {
                detail: finished_detail(&description),
                status: description.status,
                execution_arn: handle.execution_arn,
            });
        }

        if self.config.continue_while_running {
            info!(
                "Execution {} is {status}; handing the job back to CodePipeline",
                handle.execution_arn
            );
            return Ok(WorkflowProgress::StillRunning(handle));
        }

        Err(StageGateError::IncompleteWorkflow {
            detail: format!("did not complete; last status {status}"),
            status: description.status,
            execution_arn: handle.execution_arn,
        })
    }

    async fn describe(&self, handle: &WorkflowHandle) -> StageGateResult<ExecutionDescription> {
        let description = self
            .backends
            .workflows
            .describe(handle)
            .await
            .map_err(|e| StageGateError::upstream("describe wait-workflow", e))?;
        info!(
            "Execution {} status: {}",
            handle.execution_arn, description.status
        );
        Ok(description)
    }

    async fn report_success(
        &self,
        request: &StageRequest,
        continuation_token: Option<String>,
    ) -> StageGateResult<()> {
        info!(
            "Reporting success for job {} (continuing: {})",
            request.job_id,
            continuation_token.is_some()
        );
        self.backends
            .reporter
            .report_success(&request.job_id, SUCCESS_MESSAGE, continuation_token)
            .await
            .map_err(StageGateError::Report)
    }

    /// File a failure report and return the message as reported.
    async fn report_failure(
        &self,
        request: &StageRequest,
        cause: &StageGateError,
    ) -> StageGateResult<String> {
        error!("Job {} failed: {cause}", request.job_id);
        let failure = FailureReport::new(&cause.to_string(), request.invocation_id.as_str());
        self.backends
            .reporter
            .report_failure(&request.job_id, &failure)
            .await
            .map_err(|e| {
                warn!("Could not file failure report for job {}", request.job_id);
                StageGateError::Report(e)
            })?;
        Ok(failure.message)
    }
}

fn finished_detail(description: &ExecutionDescription) -> String {
    let mut detail = format!("finished with status {}", description.status);
    match (&description.error, &description.cause) {
        (Some(error), Some(cause)) => detail.push_str(&format!(" ({error}: {cause})")),
        (Some(only), None) | (None, Some(only)) => detail.push_str(&format!(" ({only})")),
        (None, None) => {}
    }
    detail
}
