//! Project number lookup seam

use async_trait::async_trait;
use launchpad_client::{ClientError, MetadataClient};

/// Resolves the numeric project id used in predicted service URLs
#[async_trait]
pub trait ProjectResolver: Send + Sync {
    async fn project_number(&self) -> Result<u64, ClientError>;
}

/// Project number known from configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedProject(pub u64);

#[async_trait]
impl ProjectResolver for FixedProject {
    async fn project_number(&self) -> Result<u64, ClientError> {
        Ok(self.0)
    }
}

#[async_trait]
impl ProjectResolver for MetadataClient {
    async fn project_number(&self) -> Result<u64, ClientError> {
        MetadataClient::project_number(self).await
    }
}
