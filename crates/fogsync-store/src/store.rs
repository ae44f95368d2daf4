use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fogsync_domain::DeploymentMetadata;
use tracing::info;

use crate::error::StoreError;
use crate::null::NullStore;
use crate::postgres_store::PostgresStore;
use crate::redb_store::RedbStore;

/// Durable key/value of deployment metadata, keyed by the engine-assigned
/// deployment id.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// Upsert by engine deployment id. Rejects records with an empty id.
    async fn store(&self, meta: &DeploymentMetadata) -> Result<(), StoreError>;

    /// Idempotent delete.
    async fn remove(&self, deployment_id: &str) -> Result<(), StoreError>;

    async fn read(&self, deployment_id: &str)
        -> Result<Option<DeploymentMetadata>, StoreError>;

    /// All records; used to rebuild the in-memory projections on startup.
    async fn list(&self) -> Result<Vec<DeploymentMetadata>, StoreError>;

    /// Atomically delete every record whose key is not in `deployment_ids`
    /// and return the survivors. The reconciler's retain-only sweep.
    async fn ensure_known(
        &self,
        deployment_ids: &[String],
    ) -> Result<Vec<DeploymentMetadata>, StoreError>;

    /// True when no durable backend is configured. Callers must then skip
    /// every feature that derives in-memory state from the store, since the
    /// store is the only source of truth for those.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Select a backend from the configured storage location:
/// a `postgres://` URL, a file path (directories get a `metadata.redb`
/// file inside), or empty for the placeholder store.
pub async fn open(selector: &str) -> Result<Arc<dyn MetadataStore>, StoreError> {
    if selector.is_empty() {
        info!("metadata storage not configured, metadata-derived features are disabled");
        return Ok(Arc::new(NullStore::new()));
    }
    if selector.starts_with("postgres://") || selector.starts_with("postgresql://") {
        info!("using postgres metadata storage");
        return Ok(Arc::new(PostgresStore::connect(selector).await?));
    }
    info!(path = selector, "using embedded metadata storage");
    let path = Path::new(selector);
    let file: PathBuf = if path.extension().is_some_and(|e| e == "db") {
        path.to_path_buf()
    } else {
        path.join("metadata.redb")
    };
    Ok(Arc::new(RedbStore::open(&file)?))
}
