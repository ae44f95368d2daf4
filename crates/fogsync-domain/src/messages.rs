use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analytics::AnalyticsRecord;
use crate::camunda::Variable;

// Broker command payloads and the durable deployment metadata record.
// These are the agent's own wire shapes and use snake_case field names.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagram {
    pub xml_raw: String,
    pub xml_deployed: String,
    pub svg: String,
}

/// Per-deployment incident handling policy as carried in the deployment
/// command and persisted with the metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentHandling {
    pub restart: bool,
    pub notify: bool,
}

/// Descriptor of a device event a downstream event worker should watch for.
/// Device and service ids arrive as platform-global ids; the registry
/// resolves them to gateway-local ids through the deployment's mapping
/// tables before indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDescriptor {
    pub deployment_id: String,
    pub event_id: String,
    pub device_id: String,
    pub service_id: String,
    pub device_group_id: String,
    pub script: String,
    pub value_variable_name: String,
    pub user_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployment command from the cloud controller. Only the fields the agent
/// acts on are typed; everything else in the deployment model rides along
/// in `extra` and is persisted and republished verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentMessage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: i64,
    pub executable: bool,
    pub diagram: Diagram,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_handling: Option<IncidentHandling>,
    pub event_descriptions: Vec<EventDescriptor>,
    pub analytics_records: Vec<AnalyticsRecord>,
    pub device_id_to_local_id: HashMap<String, String>,
    pub service_id_to_local_id: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartMessage {
    pub deployment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_key: Option<String>,
    pub parameter: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDescriptionsUpdate {
    pub deployment_id: String,
    pub event_descriptions: Vec<EventDescriptor>,
    pub device_id_to_local_id: HashMap<String, String>,
    pub service_id_to_local_id: HashMap<String, String>,
}

/// Canonical local record of a deployment, keyed by the id the engine
/// assigned. Survives restarts and is the source from which the event
/// registry, incident policies and analytics operators are re-derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentMetadata {
    pub deployment: DeploymentMessage,
    pub process_parameter: HashMap<String, Variable>,
    pub deployment_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_message_keeps_unknown_fields() {
        let raw = r#"{
            "id": "test", "name": "test", "version": 3,
            "diagram": {"xml_raw": "<a/>", "xml_deployed": "<a/>", "svg": "<svg/>"},
            "executable": true,
            "incident_handling": {"restart": true, "notify": false},
            "device_id_to_local_id": {"did1": "ldid1"},
            "pipeline_info": {"flows": []}
        }"#;
        let msg: DeploymentMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id, "test");
        assert!(msg.incident_handling.unwrap().restart);
        assert_eq!(msg.device_id_to_local_id["did1"], "ldid1");
        // opaque remainder survives a round trip
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["pipeline_info"]["flows"], serde_json::json!([]));
    }

    #[test]
    fn start_message_defaults() {
        let msg: StartMessage =
            serde_json::from_str(r#"{"deployment_id":"d1"}"#).unwrap();
        assert_eq!(msg.deployment_id, "d1");
        assert!(msg.business_key.is_none());
        assert!(msg.parameter.is_empty());
    }

    #[test]
    fn start_message_with_business_key() {
        let msg: StartMessage = serde_json::from_str(
            r#"{"deployment_id":"d1","business_key":"testbid","parameter":{"a":1}}"#,
        )
        .unwrap();
        assert_eq!(msg.business_key.as_deref(), Some("testbid"));
        assert_eq!(msg.parameter["a"], 1);
    }
}
