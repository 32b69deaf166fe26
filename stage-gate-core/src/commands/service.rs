//! Stage Gate Service Layer
//!
//! The service holds the injected collaborators and the configuration, and
//! provides the `run` operation used by both the Lambda handler and the local
//! runner.

use crate::aws::load_backends;
use crate::backends::Backends;
use crate::config::StageGateConfig;
use crate::error::StageGateResult;

/// Main service struct that holds collaborators and runs the stage gate chain
pub struct StageGateService {
    pub(crate) config: StageGateConfig,
    pub(crate) backends: Backends,
}

impl StageGateService {
    /// Create a service over explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: StageGateConfig, backends: Backends) -> StageGateResult<Self> {
        config.validate()?;
        Ok(Self { config, backends })
    }

    /// Create a service backed by AWS SDK clients.
    ///
    /// The configuration is validated before the AWS SDK configuration is
    /// loaded from the default credential provider chain.
    pub async fn from_environment(config: StageGateConfig) -> StageGateResult<Self> {
        config.validate()?;
        let backends = load_backends().await;
        Self::new(config, backends)
    }

    pub fn config(&self) -> &StageGateConfig {
        &self.config
    }

    // run() method implementation is in run.rs
    // resolve_api_id() method implementation is in resolve.rs
}
