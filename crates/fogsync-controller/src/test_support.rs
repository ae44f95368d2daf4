use std::sync::Mutex;

use async_trait::async_trait;
use fogsync_broker::{BrokerError, StateSink};
use fogsync_domain::{
    ControlCommand, Deployment, DeploymentMetadata, HistoricProcessInstance, Incident,
    ProcessDefinition, ProcessInstance,
};

/// Everything a controller under test would have published.
#[derive(Debug, Clone)]
pub enum SinkRecord {
    DeploymentUpdate(Deployment),
    DeploymentDelete(String),
    DeploymentKnown(Vec<String>),
    DeploymentMetadata(DeploymentMetadata),
    DefinitionUpdate(ProcessDefinition),
    DefinitionDelete(String),
    DefinitionKnown(Vec<String>),
    InstanceUpdate(ProcessInstance),
    InstanceDelete(String),
    InstanceKnown(Vec<String>),
    HistoryUpdate(HistoricProcessInstance),
    HistoryDelete(String),
    HistoryKnown(Vec<String>),
    Incident(Incident),
    IncidentKnown(Vec<String>),
    AnalyticsControl(ControlCommand),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SinkRecord>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().unwrap().clone()
    }

    fn push(&self, record: SinkRecord) -> Result<(), BrokerError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

#[async_trait]
impl StateSink for RecordingSink {
    async fn send_deployment_update(&self, deployment: &Deployment) -> Result<(), BrokerError> {
        self.push(SinkRecord::DeploymentUpdate(deployment.clone()))
    }

    async fn send_deployment_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.push(SinkRecord::DeploymentDelete(id.to_string()))
    }

    async fn send_deployment_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.push(SinkRecord::DeploymentKnown(ids.to_vec()))
    }

    async fn send_deployment_metadata(
        &self,
        metadata: &DeploymentMetadata,
    ) -> Result<(), BrokerError> {
        self.push(SinkRecord::DeploymentMetadata(metadata.clone()))
    }

    async fn send_definition_update(
        &self,
        definition: &ProcessDefinition,
    ) -> Result<(), BrokerError> {
        self.push(SinkRecord::DefinitionUpdate(definition.clone()))
    }

    async fn send_definition_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.push(SinkRecord::DefinitionDelete(id.to_string()))
    }

    async fn send_definition_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.push(SinkRecord::DefinitionKnown(ids.to_vec()))
    }

    async fn send_instance_update(&self, instance: &ProcessInstance) -> Result<(), BrokerError> {
        self.push(SinkRecord::InstanceUpdate(instance.clone()))
    }

    async fn send_instance_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.push(SinkRecord::InstanceDelete(id.to_string()))
    }

    async fn send_instance_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.push(SinkRecord::InstanceKnown(ids.to_vec()))
    }

    async fn send_history_update(
        &self,
        history: &HistoricProcessInstance,
    ) -> Result<(), BrokerError> {
        self.push(SinkRecord::HistoryUpdate(history.clone()))
    }

    async fn send_history_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.push(SinkRecord::HistoryDelete(id.to_string()))
    }

    async fn send_history_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.push(SinkRecord::HistoryKnown(ids.to_vec()))
    }

    async fn send_incident(&self, incident: &Incident) -> Result<(), BrokerError> {
        self.push(SinkRecord::Incident(incident.clone()))
    }

    async fn send_incident_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.push(SinkRecord::IncidentKnown(ids.to_vec()))
    }

    async fn send_analytics_control(
        &self,
        command: &ControlCommand,
    ) -> Result<(), BrokerError> {
        self.push(SinkRecord::AnalyticsControl(command.clone()))
    }
}
