use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// Analytics records carried inside a deployment command, and the control
// payloads published to the fog analytics platform to start and stop the
// operators those records describe.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_event: Option<DeviceEventAnalyticsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_event: Option<GroupEventAnalyticsRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceEventAnalyticsRecord {
    pub label: String,
    pub deployment_id: String,
    pub flow_id: String,
    pub event_id: String,
    pub device_id: String,
    pub service_id: String,
    pub value: String,
    pub path: String,
    pub cast_from: String,
    pub cast_to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupEventAnalyticsRecord {
    pub label: String,
    pub event_id: String,
    pub deployment_id: String,
    pub flow_id: String,
    pub device_group_id: String,
    pub operator_value: String,
    pub service_ids: Vec<String>,
    pub service_to_device_ids_mapping: HashMap<String, Vec<String>>,
    pub service_to_path_mapping: HashMap<String, String>,
}

// The fog analytics platform spells its control protocol in camelCase.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlCommand {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    pub data: OperatorJob,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorJob {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_id: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub operator_config: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_topics: Vec<InputTopic>,
    pub config: FogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FogConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pipeline_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_topic: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operator_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputTopic {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter_value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<TopicMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicMapping {
    pub dest: String,
    pub source: String,
}
