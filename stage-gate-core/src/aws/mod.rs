//! AWS SDK integration: one thin wrapper per service behind the backend traits.

pub(crate) mod apigateway;
pub(crate) mod cloudformation;
pub(crate) mod codepipeline;
pub(crate) mod sfn;

use std::sync::Arc;

use thiserror::Error;

use crate::backends::Backends;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("CloudFormation error: {0}")]
    CloudFormation(String),
    #[error("API Gateway error: {0}")]
    ApiGateway(String),
    #[error("Step Functions error: {0}")]
    StepFunctions(String),
    #[error("CodePipeline error: {0}")]
    CodePipeline(String),
}

pub type AwsResult<T> = Result<T, AwsError>;

/// Build SDK-backed collaborators from the standard credential provider chain.
pub async fn load_backends() -> Backends {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    Backends {
        templates: Arc::new(cloudformation::CloudFormationTemplates::new(
            aws_sdk_cloudformation::Client::new(&config),
        )),
        registry: Arc::new(apigateway::ApiGatewayRegistry::new(
            aws_sdk_apigateway::Client::new(&config),
        )),
        workflows: Arc::new(sfn::StepFunctionsWorkflows::new(
            aws_sdk_sfn::Client::new(&config),
        )),
        reporter: Arc::new(codepipeline::CodePipelineReporter::new(
            aws_sdk_codepipeline::Client::new(&config),
        )),
    }
}
