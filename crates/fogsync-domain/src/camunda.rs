use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Entities mirroring the engine's REST representation. The engine spells
// field names in camelCase; outbound state messages reuse that spelling so
// the cloud side sees exactly what the engine reports.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    pub source: String,
    pub deployment_time: Option<String>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessDefinition {
    pub id: String,
    pub key: String,
    pub category: String,
    pub description: Option<String>,
    pub name: String,
    pub version: i64,
    pub resource: String,
    pub deployment_id: String,
    pub diagram: Option<String>,
    pub suspended: bool,
    pub tenant_id: Option<String>,
    pub version_tag: Option<String>,
    pub history_time_to_live: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessInstance {
    pub id: String,
    pub definition_id: String,
    pub business_key: Option<String>,
    pub case_instance_id: Option<String>,
    pub ended: bool,
    pub suspended: bool,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoricProcessInstance {
    pub id: String,
    pub super_process_instance_id: Option<String>,
    pub super_case_instance_id: Option<String>,
    pub case_instance_id: Option<String>,
    pub process_definition_name: Option<String>,
    pub process_definition_key: Option<String>,
    pub process_definition_version: Option<f64>,
    pub process_definition_id: String,
    pub business_key: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_in_millis: Option<f64>,
    pub start_user_id: Option<String>,
    pub start_activity_id: Option<String>,
    pub delete_reason: Option<String>,
    pub tenant_id: Option<String>,
    pub state: Option<String>,
}

/// A process start-form variable as returned by the engine's
/// `form-variables` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
}

/// Row shape of the engine's `/incident` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineIncident {
    pub id: String,
    pub process_definition_id: String,
    pub process_instance_id: String,
    pub activity_id: Option<String>,
    pub incident_message: Option<String>,
    pub incident_type: Option<String>,
    pub incident_timestamp: Option<String>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub count: i64,
}

/// Incident record as reported outward by the agent. Unlike the engine
/// entities this is the agent's own shape: the id is generated locally so
/// it stays unique across engine restarts, and the occurrence time is the
/// agent's wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub external_task_id: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub worker_id: String,
    pub error_message: String,
    pub time: DateTime<Utc>,
    pub tenant_id: String,
    pub deployment_name: String,
    pub business_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_decodes_engine_response() {
        let raw = r#"{"id":"685ee9f0","name":"test","source":"senergy",
            "deploymentTime":"2021-02-22T12:33:03.214","tenantId":"senergy"}"#;
        let d: Deployment = serde_json::from_str(raw).unwrap();
        assert_eq!(d.id, "685ee9f0");
        assert_eq!(d.deployment_time.as_deref(), Some("2021-02-22T12:33:03.214"));
    }

    #[test]
    fn definition_tolerates_missing_fields() {
        let d: ProcessDefinition =
            serde_json::from_str(r#"{"id":"Example:1:abc","version":1}"#).unwrap();
        assert_eq!(d.version, 1);
        assert!(d.history_time_to_live.is_none());
    }

    #[test]
    fn variable_round_trips_type_keyword() {
        let v = Variable {
            value: serde_json::json!(42),
            value_type: "Integer".into(),
            readonly: None,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Integer");
        let back: Variable = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
