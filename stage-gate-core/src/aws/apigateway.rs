//! API Gateway-backed REST API registry

use async_trait::async_trait;
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::types::RestApi;
use aws_sdk_apigateway::Client as ApiGatewayClient;

use crate::aws::{AwsError, AwsResult};
use crate::backends::ApiRegistry;
use crate::types::{ApiDescriptor, RegistryPage};

pub struct ApiGatewayRegistry {
    client: ApiGatewayClient,
}

impl ApiGatewayRegistry {
    pub fn new(client: ApiGatewayClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiRegistry for ApiGatewayRegistry {
    async fn list_apis(
        &self,
        page_size: u32,
        position: Option<String>,
    ) -> AwsResult<RegistryPage> {
        let limit = i32::try_from(page_size)
            .map_err(|_| AwsError::ApiGateway(format!("Page size {page_size} is out of range")))?;

        let response = self
            .client
            .get_rest_apis()
            .limit(limit)
            .set_position(position)
            .send()
            .await
            .map_err(|e| {
                AwsError::ApiGateway(format!(
                    "Failed to list REST APIs: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(RegistryPage {
            items: response
                .items
                .unwrap_or_default()
                .into_iter()
                .map(to_descriptor)
                .collect(),
            position: response.position,
        })
    }
}

fn to_descriptor(api: RestApi) -> ApiDescriptor {
    ApiDescriptor {
        id: api.id,
        name: api.name,
    }
}
