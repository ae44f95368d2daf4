use std::collections::HashMap;

use fogsync_cdc::rows::DeploymentRow;
use fogsync_domain::{
    Deployment, DeploymentMessage, DeploymentMetadata, EventDescriptionsUpdate, StartMessage,
    Variable, USER_ID,
};
use fogsync_engine::{bpmn, templates};
use tracing::{debug, warn};

use crate::controller::Controller;
use crate::error::ControllerError;

const DEPLOYMENT_SOURCE: &str = "senergy";

impl Controller {
    // ── Command handlers ──────────────────────────────────────────────────────

    /// Deploy a process sent by the cloud controller: clean up any stale
    /// engine deployment under the incoming id, rewrite the BPMN, deploy,
    /// register incident policies, persist the metadata and publish it.
    pub async fn handle_create_deployment(
        &self,
        msg: DeploymentMessage,
    ) -> Result<(), ControllerError> {
        if let Err(e) = self.engine.undeploy(&msg.id).await {
            warn!(deployment_id = %msg.id, error = %e, "cleanup of previous deployment failed");
        }

        let mut xml = bpmn::substitute_placeholder(
            &msg.diagram.xml_deployed,
            &self.config.notification_url_placeholder,
            &self.config.notification_url,
        );
        let mut svg = msg.diagram.svg.clone();
        if bpmn::is_valid(&xml) {
            xml = bpmn::replace_task_topics(&xml, &self.config.task_topic_replace)?;
        } else {
            warn!(deployment_id = %msg.id, "got invalid bpmn, replacing with blank process");
            xml = templates::blank_bpmn();
            svg = templates::BLANK_SVG.to_string();
        }
        if self.config.debug {
            debug!(deployment_id = %msg.id, name = %msg.name, xml = %xml, "deploying process");
        }

        let engine_id = self
            .engine
            .deploy(&msg.name, &xml, &svg, USER_ID, DEPLOYMENT_SOURCE)
            .await?;

        if let Some(handling) = msg.incident_handling {
            if let Err(e) = self.incidents.register_deployment(&engine_id, handling).await {
                // keep engine and policy map consistent: take the deployment
                // back out before reporting the failure
                if let Err(undeploy_err) = self.engine.undeploy(&engine_id).await {
                    warn!(
                        deployment_id = %engine_id,
                        error = %undeploy_err,
                        "rollback undeploy failed"
                    );
                }
                return Err(e);
            }
        }

        let process_parameter = match self.fetch_process_parameters(&engine_id).await {
            Ok(parameter) => parameter,
            Err(e) => {
                warn!(deployment_id = %engine_id, error = %e, "unable to get process parameters");
                HashMap::new()
            }
        };

        let meta = DeploymentMetadata {
            deployment: msg,
            process_parameter,
            deployment_id: engine_id.clone(),
        };
        if let Err(e) = self.store.store(&meta).await {
            warn!(deployment_id = %engine_id, error = %e, "unable to store deployment metadata");
        }
        if !self.store.is_placeholder() {
            self.registry.remove_deployment(&engine_id).await;
            self.registry.add_deployment(&meta).await;
            if let Err(e) = self.analytics.start_operators(&meta).await {
                warn!(deployment_id = %engine_id, error = %e, "unable to start analytics operators");
            }
        } else if !meta.deployment.event_descriptions.is_empty() {
            warn!("no metadata storage configured, event handling disabled for this deployment");
        }
        self.sink.send_deployment_metadata(&meta).await?;
        Ok(())
    }

    async fn fetch_process_parameters(
        &self,
        deployment_id: &str,
    ) -> Result<HashMap<String, Variable>, ControllerError> {
        let definitions = self.engine.definitions_by_deployment(deployment_id).await?;
        let Some(definition) = definitions.first() else {
            return Err(ControllerError::NoDefinitionForDeployment(
                deployment_id.to_string(),
            ));
        };
        Ok(self.engine.process_parameters(&definition.id).await?)
    }

    pub async fn handle_start_deployment(&self, msg: StartMessage) -> Result<(), ControllerError> {
        let definitions = self
            .engine
            .definitions_by_deployment(&msg.deployment_id)
            .await?;
        let Some(definition) = definitions.first() else {
            return Err(ControllerError::NoDefinitionForDeployment(msg.deployment_id));
        };
        self.engine
            .start(&definition.id, msg.business_key.as_deref(), &msg.parameter)
            .await?;
        Ok(())
    }

    /// Undeploy at the engine; the CDC delete observation drives the state
    /// publication and local cleanup.
    pub async fn handle_delete_deployment(&self, id: &str) -> Result<(), ControllerError> {
        self.engine.undeploy(id).await?;
        Ok(())
    }

    pub async fn handle_update_deployment_events(
        &self,
        msg: EventDescriptionsUpdate,
    ) -> Result<(), ControllerError> {
        if self.store.is_placeholder() {
            return Ok(());
        }
        let Some(mut meta) = self.store.read(&msg.deployment_id).await? else {
            warn!(deployment_id = %msg.deployment_id, "event update for unknown deployment");
            return Ok(());
        };
        meta.deployment.event_descriptions = msg.event_descriptions;
        meta.deployment.device_id_to_local_id = msg.device_id_to_local_id;
        meta.deployment.service_id_to_local_id = msg.service_id_to_local_id;
        self.store.store(&meta).await?;

        self.registry.remove_deployment(&msg.deployment_id).await;
        self.registry.add_deployment(&meta).await;

        self.sink.send_deployment_metadata(&meta).await?;
        Ok(())
    }

    // ── CDC handlers ──────────────────────────────────────────────────────────

    pub async fn handle_deployment_set(&self, payload: &str) {
        let row: DeploymentRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode deployment row image");
                return;
            }
        };
        let deployment = Deployment {
            id: row.id,
            name: row.name,
            source: row.source.unwrap_or_default(),
            deployment_time: row.deploy_time,
            tenant_id: row.tenant_id,
        };
        if let Err(e) = self.sink.send_deployment_update(&deployment).await {
            warn!(deployment_id = %deployment.id, error = %e, "unable to publish deployment update");
        }
    }

    pub async fn handle_deployment_delete(&self, payload: &str) {
        let row: DeploymentRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode deployment row image");
                return;
            }
        };
        if let Err(e) = self.sink.send_deployment_delete(&row.id).await {
            warn!(deployment_id = %row.id, error = %e, "unable to publish deployment delete");
        }
        if !self.store.is_placeholder() {
            // stop the operators while the metadata still names them
            match self.store.read(&row.id).await {
                Ok(Some(meta)) => {
                    if let Err(e) = self.analytics.stop_operators(&meta).await {
                        warn!(deployment_id = %row.id, error = %e, "unable to stop analytics operators");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(deployment_id = %row.id, error = %e, "unable to read metadata"),
            }
            self.registry.remove_deployment(&row.id).await;
        }
        if let Err(e) = self.store.remove(&row.id).await {
            warn!(deployment_id = %row.id, error = %e, "unable to remove deployment metadata");
        }
    }

    // ── Reconciliation ────────────────────────────────────────────────────────

    /// Publish every engine deployment plus the known-id list, then sweep
    /// the metadata store down to that set and republish the survivors.
    pub(crate) async fn reconcile_deployments(&self) -> Result<(), ControllerError> {
        let deployments = self.engine.list_deployments(USER_ID, &[]).await?;
        let mut ids = Vec::with_capacity(deployments.len());
        for deployment in &deployments {
            ids.push(deployment.id.clone());
            self.sink.send_deployment_update(deployment).await?;
        }
        self.sink.send_deployment_known(&ids).await?;

        let known = self.store.ensure_known(&ids).await?;
        if !self.store.is_placeholder() {
            self.registry.rebuild(&known).await;
        }
        for meta in &known {
            self.sink.send_deployment_metadata(meta).await?;
        }
        Ok(())
    }
}
