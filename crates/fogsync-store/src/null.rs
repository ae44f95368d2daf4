use async_trait::async_trait;
use fogsync_domain::DeploymentMetadata;
use tracing::debug;

use crate::error::StoreError;
use crate::store::MetadataStore;

/// Placeholder backend for deployments without metadata-dependent features.
/// Everything succeeds and nothing is kept; `is_placeholder` tells callers
/// to disable event registration, incident policies and analytics
/// operators rather than run them against an empty source of truth.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        NullStore
    }
}

#[async_trait]
impl MetadataStore for NullStore {
    async fn store(&self, meta: &DeploymentMetadata) -> Result<(), StoreError> {
        debug!(deployment_id = %meta.deployment_id, "placeholder storage, metadata dropped");
        Ok(())
    }

    async fn remove(&self, _deployment_id: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn read(
        &self,
        _deployment_id: &str,
    ) -> Result<Option<DeploymentMetadata>, StoreError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<DeploymentMetadata>, StoreError> {
        Ok(Vec::new())
    }

    async fn ensure_known(
        &self,
        _deployment_ids: &[String],
    ) -> Result<Vec<DeploymentMetadata>, StoreError> {
        Ok(Vec::new())
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}
