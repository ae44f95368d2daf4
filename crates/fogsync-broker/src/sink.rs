use async_trait::async_trait;
use fogsync_domain::{
    ControlCommand, Deployment, DeploymentMetadata, HistoricProcessInstance, Incident,
    ProcessDefinition, ProcessInstance,
};

use crate::error::BrokerError;

/// Outbound half of the state protocol. The controller publishes through
/// this seam only, so tests can record what would have gone to the broker.
#[async_trait]
pub trait StateSink: Send + Sync + 'static {
    async fn send_deployment_update(&self, deployment: &Deployment) -> Result<(), BrokerError>;
    async fn send_deployment_delete(&self, id: &str) -> Result<(), BrokerError>;
    async fn send_deployment_known(&self, ids: &[String]) -> Result<(), BrokerError>;
    async fn send_deployment_metadata(
        &self,
        metadata: &DeploymentMetadata,
    ) -> Result<(), BrokerError>;

    async fn send_definition_update(
        &self,
        definition: &ProcessDefinition,
    ) -> Result<(), BrokerError>;
    async fn send_definition_delete(&self, id: &str) -> Result<(), BrokerError>;
    async fn send_definition_known(&self, ids: &[String]) -> Result<(), BrokerError>;

    async fn send_instance_update(&self, instance: &ProcessInstance) -> Result<(), BrokerError>;
    async fn send_instance_delete(&self, id: &str) -> Result<(), BrokerError>;
    async fn send_instance_known(&self, ids: &[String]) -> Result<(), BrokerError>;

    async fn send_history_update(
        &self,
        history: &HistoricProcessInstance,
    ) -> Result<(), BrokerError>;
    async fn send_history_delete(&self, id: &str) -> Result<(), BrokerError>;
    async fn send_history_known(&self, ids: &[String]) -> Result<(), BrokerError>;

    async fn send_incident(&self, incident: &Incident) -> Result<(), BrokerError>;
    async fn send_incident_known(&self, ids: &[String]) -> Result<(), BrokerError>;

    async fn send_analytics_control(&self, command: &ControlCommand)
        -> Result<(), BrokerError>;
}
