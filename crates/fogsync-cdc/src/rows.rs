use serde::Deserialize;

// Row images as serialized by `row_to_json` over the engine's tables.
// Column names carry the engine schema's trailing underscore.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeploymentRow {
    #[serde(rename = "id_")]
    pub id: String,
    #[serde(rename = "name_")]
    pub name: String,
    #[serde(rename = "deploy_time_")]
    pub deploy_time: Option<String>,
    #[serde(rename = "source_")]
    pub source: Option<String>,
    #[serde(rename = "tenant_id_")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessDefinitionRow {
    #[serde(rename = "id_")]
    pub id: String,
    #[serde(rename = "key_")]
    pub key: String,
    #[serde(rename = "category_")]
    pub category: Option<String>,
    #[serde(rename = "name_")]
    pub name: Option<String>,
    #[serde(rename = "version_")]
    pub version: i64,
    #[serde(rename = "resource_name_")]
    pub resource_name: Option<String>,
    #[serde(rename = "deployment_id_")]
    pub deployment_id: String,
    #[serde(rename = "dgrm_resource_name_")]
    pub diagram_resource_name: Option<String>,
    #[serde(rename = "suspension_state_")]
    pub suspension_state: i64,
    #[serde(rename = "tenant_id_")]
    pub tenant_id: Option<String>,
    #[serde(rename = "version_tag_")]
    pub version_tag: Option<String>,
    #[serde(rename = "history_ttl_")]
    pub history_ttl: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessInstanceRow {
    #[serde(rename = "id_")]
    pub id: String,
    #[serde(rename = "proc_def_id_")]
    pub definition_id: String,
    #[serde(rename = "business_key_")]
    pub business_key: Option<String>,
    #[serde(rename = "case_inst_id_")]
    pub case_instance_id: Option<String>,
    #[serde(rename = "is_active_")]
    pub active: bool,
    #[serde(rename = "tenant_id_")]
    pub tenant_id: Option<String>,
    #[serde(rename = "end_time_")]
    pub end_time: Option<String>,
    /// Null for root instances; the only instances reported outward.
    #[serde(rename = "parent_id_")]
    pub parent_instance_id: Option<String>,
}

impl ProcessInstanceRow {
    pub fn is_root(&self) -> bool {
        self.parent_instance_id.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryRow {
    #[serde(rename = "id_")]
    pub id: String,
    #[serde(rename = "super_process_instance_id_")]
    pub super_process_instance_id: Option<String>,
    #[serde(rename = "super_case_instance_id_")]
    pub super_case_instance_id: Option<String>,
    #[serde(rename = "case_inst_id_")]
    pub case_instance_id: Option<String>,
    #[serde(rename = "proc_def_key_")]
    pub process_definition_key: Option<String>,
    #[serde(rename = "proc_def_id_")]
    pub process_definition_id: String,
    #[serde(rename = "business_key_")]
    pub business_key: Option<String>,
    #[serde(rename = "start_time_")]
    pub start_time: Option<String>,
    #[serde(rename = "end_time_")]
    pub end_time: Option<String>,
    #[serde(rename = "duration_")]
    pub duration_in_millis: Option<f64>,
    #[serde(rename = "start_user_id_")]
    pub start_user_id: Option<String>,
    #[serde(rename = "start_act_id_")]
    pub start_activity_id: Option<String>,
    #[serde(rename = "delete_reason_")]
    pub delete_reason: Option<String>,
    #[serde(rename = "tenant_id_")]
    pub tenant_id: Option<String>,
    #[serde(rename = "state_")]
    pub state: Option<String>,
}
