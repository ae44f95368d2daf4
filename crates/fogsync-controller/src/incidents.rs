use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use fogsync_broker::StateSink;
use fogsync_domain::{EngineIncident, Incident, IncidentHandling, USER_ID, WORKER_ID};
use fogsync_engine::EngineClient;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ControllerError;
use crate::notification::Notifier;

const DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Per-definition incident handling policy.
#[derive(Debug, Clone, Copy)]
pub struct IncidentPolicy {
    pub restart: bool,
    pub notify: bool,
}

/// Handles engine incidents according to the policy attached to their
/// deployment: notify, stop the instance, optionally restart it.
///
/// The policy map is a pure projection of the metadata store; it is filled
/// on deployment creation and rebuilt from the store at startup. A
/// per-process-instance cache suppresses repeated handling of the same
/// failure within a 5 minute window.
pub struct IncidentSupervisor {
    engine: EngineClient,
    notifier: Notifier,
    sink: Arc<dyn StateSink>,
    policies: RwLock<HashMap<String, IncidentPolicy>>,
    recently_handled: Mutex<HashMap<String, Instant>>,
}

impl IncidentSupervisor {
    pub fn new(engine: EngineClient, notifier: Notifier, sink: Arc<dyn StateSink>) -> Self {
        Self {
            engine,
            notifier,
            sink,
            policies: RwLock::new(HashMap::new()),
            recently_handled: Mutex::new(HashMap::new()),
        }
    }

    /// Register the deployment's policy for every definition it produced.
    pub async fn register_deployment(
        &self,
        deployment_id: &str,
        handling: IncidentHandling,
    ) -> Result<(), ControllerError> {
        let definitions = self.engine.definitions_by_deployment(deployment_id).await?;
        if definitions.is_empty() {
            warn!(deployment_id, "no definitions for deployment, no incident handling deployed");
        }
        let mut policies = self.policies.write().await;
        for definition in definitions {
            policies.insert(
                definition.id,
                IncidentPolicy {
                    restart: handling.restart,
                    notify: handling.notify,
                },
            );
        }
        Ok(())
    }

    pub async fn handle(&self, incident: &Incident) -> Result<(), ControllerError> {
        if !self.first_in_window(&incident.process_instance_id).await {
            return Ok(());
        }
        let policy = {
            let policies = self.policies.read().await;
            policies.get(&incident.process_definition_id).copied()
        };
        let Some(policy) = policy else {
            info!(deployment_name = %incident.deployment_name, "unhandled incident");
            return Ok(());
        };
        info!(
            deployment_name = %incident.deployment_name,
            notify = policy.notify,
            restart = policy.restart,
            "handling incident"
        );

        if policy.notify {
            let mut message = incident.error_message.clone();
            if policy.restart {
                message.push_str("\n\nprocess will be restarted");
            }
            self.notifier
                .send(
                    format!("Fog Process-Incident in {}", incident.deployment_name),
                    message,
                )
                .await;
        }

        if let Err(e) = self
            .engine
            .stop_instance(&incident.process_instance_id)
            .await
        {
            warn!(
                process_instance_id = %incident.process_instance_id,
                error = %e,
                "unable to stop process instance after incident"
            );
        }

        if policy.restart {
            if let Err(e) = self
                .engine
                .start(&incident.process_definition_id, None, &HashMap::new())
                .await
            {
                warn!(
                    process_definition_id = %incident.process_definition_id,
                    error = %e,
                    "unable to restart process after incident"
                );
                self.notifier
                    .send(
                        format!(
                            "Fog ERROR: unable to restart process after incident in: {}",
                            incident.deployment_name
                        ),
                        format!(
                            "Restart-Error: {e}\n\nIncident: {}",
                            incident.error_message
                        ),
                    )
                    .await;
            }
        }
        Ok(())
    }

    /// Poll the engine's incident list, publish every incident and feed it
    /// through [`handle`]. Returns the number observed.
    pub async fn rescan(&self) -> Result<usize, ControllerError> {
        let engine_incidents = self.engine.list_incidents(USER_ID).await?;
        let mut ids = Vec::new();
        for raw in &engine_incidents {
            let incident = self.enrich(raw).await;
            ids.push(incident.id.clone());
            self.sink.send_incident(&incident).await?;
            if let Err(e) = self.handle(&incident).await {
                warn!(
                    process_instance_id = %incident.process_instance_id,
                    error = %e,
                    "incident handling failed"
                );
            }
        }
        self.sink.send_incident_known(&ids).await?;
        Ok(engine_incidents.len())
    }

    // The incident row lacks the deployment name and business key; both are
    // looked up from the engine, best effort.
    async fn enrich(&self, raw: &EngineIncident) -> Incident {
        let deployment_name = match self.engine.get_definition(&raw.process_definition_id).await
        {
            Ok(definition) => match self.engine.get_deployment(&definition.deployment_id).await {
                Ok(deployment) => deployment.name,
                Err(_) => definition.name,
            },
            Err(e) => {
                warn!(
                    process_definition_id = %raw.process_definition_id,
                    error = %e,
                    "unable to resolve deployment name for incident"
                );
                String::new()
            }
        };
        let business_key = self
            .engine
            .get_instance(&raw.process_instance_id)
            .await
            .ok()
            .and_then(|instance| instance.business_key)
            .unwrap_or_default();
        Incident {
            id: Uuid::new_v4().to_string(),
            external_task_id: raw.activity_id.clone().unwrap_or_default(),
            process_instance_id: raw.process_instance_id.clone(),
            process_definition_id: raw.process_definition_id.clone(),
            worker_id: WORKER_ID.to_string(),
            error_message: raw.incident_message.clone().unwrap_or_default(),
            time: Utc::now(),
            tenant_id: raw.tenant_id.clone().unwrap_or_else(|| USER_ID.to_string()),
            deployment_name,
            business_key,
        }
    }

    // Check-and-mark on the dedup cache; expired entries are purged on the way.
    async fn first_in_window(&self, process_instance_id: &str) -> bool {
        let mut seen = self.recently_handled.lock().await;
        let now = Instant::now();
        seen.retain(|_, handled_at| now.duration_since(*handled_at) < DEDUP_WINDOW);
        if seen.contains_key(process_instance_id) {
            return false;
        }
        seen.insert(process_instance_id.to_string(), now);
        true
    }
}
