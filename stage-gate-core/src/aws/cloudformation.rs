//! CloudFormation-backed template store

use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::TemplateStage;
use aws_sdk_cloudformation::Client as CloudFormationClient;

use crate::aws::{AwsError, AwsResult};
use crate::backends::TemplateStore;

pub struct CloudFormationTemplates {
    client: CloudFormationClient,
}

impl CloudFormationTemplates {
    pub fn new(client: CloudFormationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TemplateStore for CloudFormationTemplates {
    async fn processed_template(&self, stack_name: &str) -> AwsResult<Option<String>> {
        // The processed stage has transforms (SAM, macros) already expanded.
        let response = self
            .client
            .get_template()
            .stack_name(stack_name)
            .template_stage(TemplateStage::Processed)
            .send()
            .await
            .map_err(|e| {
                AwsError::CloudFormation(format!(
                    "Failed to get template for stack '{stack_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(response.template_body)
    }
}
