use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fogsync_domain::DeploymentMetadata;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::MetadataStore;

/// In-memory implementation of [`MetadataStore`]. All data is lost on
/// process exit; used by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<HashMap<String, DeploymentMetadata>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn store(&self, meta: &DeploymentMetadata) -> Result<(), StoreError> {
        if meta.deployment_id.is_empty() {
            return Err(StoreError::MissingDeploymentId);
        }
        let mut guard = self.inner.write().await;
        guard.insert(meta.deployment_id.clone(), meta.clone());
        Ok(())
    }

    async fn remove(&self, deployment_id: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.remove(deployment_id);
        Ok(())
    }

    async fn read(
        &self,
        deployment_id: &str,
    ) -> Result<Option<DeploymentMetadata>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.get(deployment_id).cloned())
    }

    async fn list(&self) -> Result<Vec<DeploymentMetadata>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.values().cloned().collect())
    }

    async fn ensure_known(
        &self,
        deployment_ids: &[String],
    ) -> Result<Vec<DeploymentMetadata>, StoreError> {
        let mut guard = self.inner.write().await;
        guard.retain(|id, _| deployment_ids.contains(id));
        Ok(guard.values().cloned().collect())
    }
}
