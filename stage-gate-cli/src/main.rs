use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use log::info;
use stage_gate_core::{
    PipelineJobEvent, StageGateConfig, StageGateResult, StageGateService, StageOutcome,
    StageRequest, DEFAULT_API_RESOURCE, DEFAULT_REGISTRY_MAX_PAGES, DEFAULT_REGISTRY_PAGE_SIZE,
};

/// Set by the Lambda execution environment.
const LAMBDA_RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[derive(Parser, Debug)]
#[command(
    name = "stage-gate",
    version,
    about = "Gate a CodePipeline stage on the readiness of a stack's REST API"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve CodePipeline job events from the AWS Lambda runtime
    Lambda {
        #[command(flatten)]
        gate: GateArgs,
    },

    /// Run the stage gate once for a CodePipeline job event stored in a file
    Invoke {
        /// Path to the CodePipeline job event JSON
        #[arg(long)]
        event: PathBuf,

        #[command(flatten)]
        gate: GateArgs,
    },
}

#[derive(Args, Debug)]
struct GateArgs {
    /// ARN of the wait-workflow state machine to start
    #[arg(long, env = "STAGE_GATE_STATE_MACHINE_ARN")]
    state_machine_arn: String,

    /// Logical id of the REST API resource in the processed template
    #[arg(long, env = "STAGE_GATE_API_RESOURCE", default_value = DEFAULT_API_RESOURCE)]
    api_resource: String,

    /// Maximum REST APIs requested per listing page (1-500)
    #[arg(long, env = "STAGE_GATE_REGISTRY_PAGE_SIZE", default_value_t = DEFAULT_REGISTRY_PAGE_SIZE)]
    registry_page_size: u32,

    /// Maximum listing pages scanned for the REST API
    #[arg(long, env = "STAGE_GATE_REGISTRY_MAX_PAGES", default_value_t = DEFAULT_REGISTRY_MAX_PAGES)]
    registry_max_pages: u32,

    /// Status polls per invocation
    #[arg(long, env = "STAGE_GATE_STATUS_POLL_ATTEMPTS", default_value_t = 1)]
    status_poll_attempts: u32,

    /// Seconds to wait between status polls
    #[arg(long, env = "STAGE_GATE_STATUS_POLL_INTERVAL_SECS", default_value_t = 0)]
    status_poll_interval_secs: u64,

    /// Fail the job when the workflow is still running instead of asking
    /// CodePipeline to invoke the action again
    #[arg(long, env = "STAGE_GATE_NO_CONTINUATION")]
    no_continuation: bool,
}

impl From<GateArgs> for StageGateConfig {
    fn from(args: GateArgs) -> Self {
        Self {
            state_machine_arn: args.state_machine_arn,
            api_resource: args.api_resource,
            registry_page_size: args.registry_page_size,
            registry_max_pages: args.registry_max_pages,
            status_poll_attempts: args.status_poll_attempts,
            status_poll_interval: Duration::from_secs(args.status_poll_interval_secs),
            continue_while_running: !args.no_continuation,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let in_lambda = std::env::var_os(LAMBDA_RUNTIME_API_ENV).is_some();
    let cli = parse_cli(std::env::args_os().len(), in_lambda);
    match cli.command {
        Commands::Lambda { gate } => serve(gate.into()).await,
        Commands::Invoke { event, gate } => invoke(&event, gate.into()).await,
    }
}

/// A custom runtime starts `bootstrap` with no arguments; inside Lambda that
/// means the `lambda` subcommand, configured from the environment.
fn parse_cli(arg_count: usize, in_lambda: bool) -> Cli {
    if arg_count <= 1 && in_lambda {
        Cli::parse_from(["stage-gate", "lambda"])
    } else {
        Cli::parse()
    }
}

async fn build_service(config: StageGateConfig) -> Result<StageGateService> {
    let service = StageGateService::from_environment(config)
        .await
        .context("Failed to initialize stage gate")?;
    info!(
        "Stage gate ready: state machine {}, API resource {}",
        service.config().state_machine_arn,
        service.config().api_resource
    );
    Ok(service)
}

async fn serve(config: StageGateConfig) -> Result<()> {
    let service = build_service(config).await?;
    let service = &service;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| async move {
        handle(service, event).await
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))
}

/// Report failures never surface as errors here: Lambda retries failed
/// asynchronous invocations, which would start another wait-workflow.
async fn handle(
    service: &StageGateService,
    event: LambdaEvent<serde_json::Value>,
) -> Result<StageOutcome, lambda_runtime::Error> {
    let request = stage_request(event)?;
    Ok(service.run_to_outcome(&request).await)
}

/// Decode the job event, attributing failures to the Lambda request id.
fn stage_request(event: LambdaEvent<serde_json::Value>) -> StageGateResult<StageRequest> {
    let (payload, context) = event.into_parts();
    let job_event = PipelineJobEvent::from_value(payload)?;
    Ok(StageRequest::from_event(job_event, context.request_id))
}

async fn invoke(event_path: &Path, config: StageGateConfig) -> Result<()> {
    let raw = tokio::fs::read_to_string(event_path)
        .await
        .with_context(|| format!("Failed to read event file {}", event_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Event file {} is not valid JSON", event_path.display()))?;
    let job_event = PipelineJobEvent::from_value(value)?;
    let request = StageRequest::from_event(job_event, uuid::Uuid::new_v4().to_string());

    let service = build_service(config).await?;
    let outcome = service.run(&request).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );
    Ok(())
}
