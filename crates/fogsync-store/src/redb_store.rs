use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fogsync_domain::DeploymentMetadata;
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::store::MetadataStore;

const METADATA: TableDefinition<&str, &[u8]> = TableDefinition::new("deployment_metadata");

/// Metadata store backed by a redb database file. The single-file embedded
/// backend for gateways without a database service.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database at `path`; parent directories are
    /// created automatically.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(internal)?;
        }
        let db = Database::create(path).map_err(internal)?;
        {
            let wtxn = db.begin_write().map_err(internal)?;
            wtxn.open_table(METADATA).map_err(internal)?;
            wtxn.commit().map_err(internal)?;
        }
        Ok(Self { db: Arc::new(db) })
    }
}

fn internal(e: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(e.to_string())
}

#[async_trait]
impl MetadataStore for RedbStore {
    async fn store(&self, meta: &DeploymentMetadata) -> Result<(), StoreError> {
        if meta.deployment_id.is_empty() {
            return Err(StoreError::MissingDeploymentId);
        }
        let bytes = serde_json::to_vec(meta)?;
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(METADATA).map_err(internal)?;
            table
                .insert(meta.deployment_id.as_str(), bytes.as_slice())
                .map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn remove(&self, deployment_id: &str) -> Result<(), StoreError> {
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(METADATA).map_err(internal)?;
            table.remove(deployment_id).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn read(
        &self,
        deployment_id: &str,
    ) -> Result<Option<DeploymentMetadata>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(METADATA).map_err(internal)?;
        match table.get(deployment_id).map_err(internal)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<DeploymentMetadata>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(METADATA).map_err(internal)?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            results.push(serde_json::from_slice(v.value())?);
        }
        Ok(results)
    }

    async fn ensure_known(
        &self,
        deployment_ids: &[String],
    ) -> Result<Vec<DeploymentMetadata>, StoreError> {
        let requested: HashSet<&str> = deployment_ids.iter().map(String::as_str).collect();
        let wtxn = self.db.begin_write().map_err(internal)?;
        let mut known = Vec::new();
        {
            let mut table = wtxn.open_table(METADATA).map_err(internal)?;
            let mut stale = Vec::new();
            for entry in table.iter().map_err(internal)? {
                let (k, v) = entry.map_err(internal)?;
                if requested.contains(k.value()) {
                    known.push(serde_json::from_slice(v.value())?);
                } else {
                    stale.push(k.value().to_string());
                }
            }
            for id in stale {
                table.remove(id.as_str()).map_err(internal)?;
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(known)
    }
}
