//! In-memory collaborators that record every call, for orchestration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::aws::{AwsError, AwsResult};
use crate::backends::{ApiRegistry, Backends, PipelineReporter, TemplateStore, WorkflowService};
use crate::types::{
    ApiDescriptor, ExecutionDescription, ExecutionStatus, FailureReport, RegistryPage,
    WorkflowHandle,
};

pub(crate) const EXECUTION_ARN: &str =
    "arn:aws:states:us-east-2:123456789012:execution:WaitStage:run-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    GetTemplate(String),
    ListApis {
        page_size: u32,
        position: Option<String>,
    },
    StartExecution {
        state_machine_arn: String,
        input: String,
    },
    DescribeExecution(String),
    ReportSuccess {
        job_id: String,
        summary: String,
        continuation_token: Option<String>,
    },
    ReportFailure {
        job_id: String,
        failure: FailureReport,
    },
}

impl Call {
    pub(crate) fn is_report(&self) -> bool {
        matches!(self, Call::ReportSuccess { .. } | Call::ReportFailure { .. })
    }
}

type CallLog = Arc<Mutex<Vec<Call>>>;

fn record(log: &CallLog, call: Call) {
    log.lock().unwrap().push(call);
}

/// Scripted collaborators sharing one call log.
pub(crate) struct Fakes {
    pub template: AwsResult<Option<String>>,
    /// Pages keyed by the position that requests them; the first has `None`.
    pub pages: Vec<(Option<String>, AwsResult<RegistryPage>)>,
    pub start: AwsResult<WorkflowHandle>,
    pub statuses: VecDeque<AwsResult<ExecutionDescription>>,
    pub report_fails: bool,
    pub log: CallLog,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            template: Ok(Some(template_naming("MyApi"))),
            pages: vec![(
                None,
                Ok(RegistryPage {
                    items: vec![
                        ApiDescriptor::new("zzz999", "OtherApi"),
                        ApiDescriptor::new("abc123", "MyApi"),
                    ],
                    position: None,
                }),
            )],
            start: Ok(WorkflowHandle::new(EXECUTION_ARN)),
            statuses: VecDeque::from([Ok(ExecutionDescription::with_status(
                ExecutionStatus::Succeeded,
            ))]),
            report_fails: false,
            log: Arc::default(),
        }
    }
}

impl Fakes {
    pub(crate) fn with_statuses(mut self, statuses: Vec<ExecutionStatus>) -> Self {
        self.statuses = statuses
            .into_iter()
            .map(|s| Ok(ExecutionDescription::with_status(s)))
            .collect();
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn backends(&mut self) -> Backends {
        let log = self.log.clone();
        Backends {
            templates: Arc::new(FakeTemplates {
                body: Mutex::new(Some(std::mem::replace(&mut self.template, Ok(None)))),
                log: log.clone(),
            }),
            registry: Arc::new(FakeRegistry {
                pages: Mutex::new(std::mem::take(&mut self.pages)),
                log: log.clone(),
            }),
            workflows: Arc::new(FakeWorkflows {
                start: Mutex::new(Some(std::mem::replace(
                    &mut self.start,
                    Err(AwsError::StepFunctions("already started".into())),
                ))),
                statuses: Mutex::new(std::mem::take(&mut self.statuses)),
                log: log.clone(),
            }),
            reporter: Arc::new(FakeReporter {
                fails: self.report_fails,
                log,
            }),
        }
    }
}

pub(crate) fn template_naming(api_name: &str) -> String {
    json!({
        "Resources": {
            "CCTApi": {
                "Type": "AWS::ApiGateway::RestApi",
                "Properties": { "Name": api_name }
            }
        }
    })
    .to_string()
}

struct FakeTemplates {
    body: Mutex<Option<AwsResult<Option<String>>>>,
    log: CallLog,
}

#[async_trait]
impl TemplateStore for FakeTemplates {
    async fn processed_template(&self, stack_name: &str) -> AwsResult<Option<String>> {
        record(&self.log, Call::GetTemplate(stack_name.to_string()));
        self.body
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(AwsError::CloudFormation("template already fetched".into())))
    }
}

struct FakeRegistry {
    pages: Mutex<Vec<(Option<String>, AwsResult<RegistryPage>)>>,
    log: CallLog,
}

#[async_trait]
impl ApiRegistry for FakeRegistry {
    async fn list_apis(
        &self,
        page_size: u32,
        position: Option<String>,
    ) -> AwsResult<RegistryPage> {
        record(
            &self.log,
            Call::ListApis {
                page_size,
                position: position.clone(),
            },
        );
        let mut pages = self.pages.lock().unwrap();
        match pages.iter().position(|(key, _)| *key == position) {
            Some(index) => pages.remove(index).1,
            None => Err(AwsError::ApiGateway(format!(
                "no scripted page for position {position:?}"
            ))),
        }
    }
}

struct FakeWorkflows {
    start: Mutex<Option<AwsResult<WorkflowHandle>>>,
    statuses: Mutex<VecDeque<AwsResult<ExecutionDescription>>>,
    log: CallLog,
}

#[async_trait]
impl WorkflowService for FakeWorkflows {
    async fn start(&self, state_machine_arn: &str, input: String) -> AwsResult<WorkflowHandle> {
        record(
            &self.log,
            Call::StartExecution {
                state_machine_arn: state_machine_arn.to_string(),
                input,
            },
        );
        self.start
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(AwsError::StepFunctions("already started".into())))
    }

    async fn describe(&self, handle: &WorkflowHandle) -> AwsResult<ExecutionDescription> {
        record(
            &self.log,
            Call::DescribeExecution(handle.execution_arn.clone()),
        );
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecutionDescription::with_status(ExecutionStatus::Running)))
    }
}

struct FakeReporter {
    fails: bool,
    log: CallLog,
}

#[async_trait]
impl PipelineReporter for FakeReporter {
    async fn report_success(
        &self,
        job_id: &str,
        summary: &str,
        continuation_token: Option<String>,
    ) -> AwsResult<()> {
        record(
            &self.log,
            Call::ReportSuccess {
                job_id: job_id.to_string(),
                summary: summary.to_string(),
                continuation_token,
            },
        );
        if self.fails {
            return Err(AwsError::CodePipeline("JobNotFoundException".into()));
        }
        Ok(())
    }

    async fn report_failure(&self, job_id: &str, failure: &FailureReport) -> AwsResult<()> {
        record(
            &self.log,
            Call::ReportFailure {
                job_id: job_id.to_string(),
                failure: failure.clone(),
            },
        );
        if self.fails {
            return Err(AwsError::CodePipeline("JobNotFoundException".into()));
        }
        Ok(())
    }
}
