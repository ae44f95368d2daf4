use std::collections::HashMap;

use fogsync_domain::{DeploymentMetadata, EventDescriptor, USER_ID};
use tokio::sync::RwLock;
use tracing::warn;

// local-device-id → local-service-id → descriptors
type EventIndex = HashMap<String, HashMap<String, Vec<EventDescriptor>>>;

/// In-memory index of event descriptors, keyed by the gateway-local
/// device/service id pair. A pure projection of the metadata store: it is
/// rebuilt from `list()` on startup and mutated only through deployment
/// add/remove.
#[derive(Debug, Default)]
pub struct EventRegistry {
    index: RwLock<EventIndex>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every descriptor of the deployment. Global device/service ids
    /// are resolved through the deployment's mapping tables; descriptors
    /// that do not resolve are dropped.
    pub async fn add_deployment(&self, meta: &DeploymentMetadata) {
        let mut index = self.index.write().await;
        add_deployment(&mut index, meta);
    }

    /// Rebuild the index without the descriptors of `deployment_id`.
    pub async fn remove_deployment(&self, deployment_id: &str) {
        let mut index = self.index.write().await;
        let mut rebuilt = EventIndex::new();
        for (device_id, services) in index.iter() {
            for (service_id, descriptors) in services {
                for descriptor in descriptors {
                    if descriptor.deployment_id != deployment_id {
                        add_event(&mut rebuilt, device_id, service_id, descriptor.clone());
                    }
                }
            }
        }
        *index = rebuilt;
    }

    /// Replace the whole index with the projection of `metas`. Used by the
    /// reconciler after the metadata sweep, so descriptors of deployments
    /// the engine no longer knows cannot outlive their metadata.
    pub async fn rebuild(&self, metas: &[DeploymentMetadata]) {
        let mut index = self.index.write().await;
        let mut rebuilt = EventIndex::new();
        for meta in metas {
            add_deployment(&mut rebuilt, meta);
        }
        *index = rebuilt;
    }

    /// Exact-match lookup; always returns a list, never null.
    pub async fn find(
        &self,
        local_device_id: &str,
        local_service_id: &str,
    ) -> Vec<EventDescriptor> {
        let index = self.index.read().await;
        index
            .get(local_device_id)
            .and_then(|services| services.get(local_service_id))
            .cloned()
            .unwrap_or_default()
    }
}

fn add_deployment(index: &mut EventIndex, meta: &DeploymentMetadata) {
    for descriptor in &meta.deployment.event_descriptions {
        let Some(local_device_id) = meta
            .deployment
            .device_id_to_local_id
            .get(&descriptor.device_id)
        else {
            warn!(
                device_id = %descriptor.device_id,
                "no local device id, event descriptor dropped"
            );
            continue;
        };
        let Some(local_service_id) = meta
            .deployment
            .service_id_to_local_id
            .get(&descriptor.service_id)
        else {
            warn!(
                service_id = %descriptor.service_id,
                "no local service id, event descriptor dropped"
            );
            continue;
        };
        let mut descriptor = descriptor.clone();
        descriptor.deployment_id = meta.deployment_id.clone();
        add_event(index, local_device_id, local_service_id, descriptor);
    }
}

fn add_event(
    index: &mut EventIndex,
    local_device_id: &str,
    local_service_id: &str,
    mut descriptor: EventDescriptor,
) {
    descriptor.user_id = USER_ID.to_string();
    index
        .entry(local_device_id.to_string())
        .or_default()
        .entry(local_service_id.to_string())
        .or_default()
        .push(descriptor);
}
