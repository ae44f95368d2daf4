use std::collections::HashMap;
use std::time::Duration;

use fogsync_domain::{
    Count, Deployment, EngineIncident, HistoricProcessInstance, ProcessDefinition,
    ProcessInstance, Variable,
};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::templates;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Which slice of the process-instance history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFilter {
    All,
    Finished,
    Unfinished,
}

/// Typed client for the engine's REST API.
///
/// Every call carries a 5 s timeout; non-2xx responses surface as
/// [`EngineError::Http`] with status and body so callers can decide
/// between retry and report.
#[derive(Clone)]
pub struct EngineClient {
    base_url: String,
    client: reqwest::Client,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    // ── Deployments ───────────────────────────────────────────────────────────

    /// Multipart deploy of a BPMN + SVG pair. If the engine rejects the
    /// document with its parse-error class, retry once with the generated
    /// blank process; the returned id is the engine-assigned deployment id.
    pub async fn deploy(
        &self,
        name: &str,
        bpmn_xml: &str,
        svg: &str,
        tenant: &str,
        source: &str,
    ) -> Result<String, EngineError> {
        let response = self.try_deploy(name, bpmn_xml, svg, tenant, source).await?;
        if let Some(id) = response["id"].as_str() {
            return Ok(id.to_string());
        }
        if response["type"] == "ProcessEngineException" {
            warn!(deployment_name = name, "engine rejected bpmn, deploying blank process");
            let blank = templates::blank_bpmn();
            let response = self
                .try_deploy(name, &blank, templates::BLANK_SVG, tenant, source)
                .await?;
            if let Some(id) = response["id"].as_str() {
                return Ok(id.to_string());
            }
            return Err(EngineError::DeployRejected);
        }
        Err(EngineError::UnexpectedResponse(response))
    }

    async fn try_deploy(
        &self,
        name: &str,
        bpmn_xml: &str,
        svg: &str,
        tenant: &str,
        source: &str,
    ) -> Result<Value, EngineError> {
        let source = if source.is_empty() { "senergy" } else { source };
        let form = Form::new()
            .part(
                "data",
                Part::text(bpmn_xml.to_string())
                    .file_name(format!("{name}.bpmn"))
                    .mime_str("text/xml")?,
            )
            .part(
                "diagram",
                Part::text(svg.to_string())
                    .file_name(format!("{name}.svg"))
                    .mime_str("image/svg+xml")?,
            )
            .text("deployment-name", name.to_string())
            .text("deployment-source", source.to_string())
            .text("tenant-id", tenant.to_string());

        let resp = self
            .client
            .post(format!("{}/engine-rest/deployment/create", self.base_url))
            .multipart(form)
            .send()
            .await?;
        // The engine answers parse failures with a JSON error body; decode
        // regardless of status so the caller can inspect the error class.
        let status = resp.status();
        match resp.json::<Value>().await {
            Ok(value) => Ok(value),
            Err(_) => Err(EngineError::Http {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    /// Idempotent undeploy: a deployment the engine no longer knows counts
    /// as successfully removed.
    pub async fn undeploy(&self, deployment_id: &str) -> Result<(), EngineError> {
        let count: Count = self
            .get_json(
                "/engine-rest/deployment/count",
                &[("id", deployment_id)],
            )
            .await?;
        if count.count == 0 {
            debug!(deployment_id, "deployment already gone, nothing to undeploy");
            return Ok(());
        }
        let resp = self
            .client
            .delete(format!(
                "{}/engine-rest/deployment/{}",
                self.base_url, deployment_id
            ))
            .query(&[("cascade", "true"), ("skipIoMappings", "true")])
            .send()
            .await?;
        expect_no_content(resp).await
    }

    pub async fn list_deployments(
        &self,
        tenant: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Deployment>, EngineError> {
        let mut query = vec![("tenantIdIn", tenant)];
        query.extend_from_slice(filters);
        self.get_json("/engine-rest/deployment", &query).await
    }

    pub async fn get_deployment(&self, id: &str) -> Result<Deployment, EngineError> {
        self.get_json(&format!("/engine-rest/deployment/{id}"), &[])
            .await
    }

    // ── Definitions ───────────────────────────────────────────────────────────

    pub async fn definitions_by_deployment(
        &self,
        deployment_id: &str,
    ) -> Result<Vec<ProcessDefinition>, EngineError> {
        self.get_json(
            "/engine-rest/process-definition",
            &[("deploymentId", deployment_id)],
        )
        .await
    }

    pub async fn get_definition(&self, id: &str) -> Result<ProcessDefinition, EngineError> {
        self.get_json(&format!("/engine-rest/process-definition/{id}"), &[])
            .await
    }

    pub async fn list_definitions(&self) -> Result<Vec<ProcessDefinition>, EngineError> {
        self.get_json("/engine-rest/process-definition", &[]).await
    }

    /// Start-form variables of a definition, used as the process-parameter
    /// description stored with the deployment metadata.
    pub async fn process_parameters(
        &self,
        definition_id: &str,
    ) -> Result<HashMap<String, Variable>, EngineError> {
        self.get_json(
            &format!("/engine-rest/process-definition/{definition_id}/form-variables"),
            &[],
        )
        .await
    }

    /// Submit the start form of a definition. An empty parameter map and no
    /// business key produce an empty body object.
    pub async fn start(
        &self,
        definition_id: &str,
        business_key: Option<&str>,
        parameter: &HashMap<String, Value>,
    ) -> Result<(), EngineError> {
        let mut body = serde_json::Map::new();
        if !parameter.is_empty() {
            let variables: serde_json::Map<String, Value> = parameter
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::json!({ "value": v })))
                .collect();
            body.insert("variables".to_string(), Value::Object(variables));
        }
        if let Some(key) = business_key {
            body.insert("businessKey".to_string(), Value::String(key.to_string()));
        }
        let resp = self
            .client
            .post(format!(
                "{}/engine-rest/process-definition/{}/submit-form",
                self.base_url, definition_id
            ))
            .json(&Value::Object(body))
            .send()
            .await?;
        expect_no_content(resp).await
    }

    // ── Instances ─────────────────────────────────────────────────────────────

    pub async fn list_instances(&self, tenant: &str) -> Result<Vec<ProcessInstance>, EngineError> {
        self.get_json("/engine-rest/process-instance", &[("tenantIdIn", tenant)])
            .await
    }

    pub async fn get_instance(&self, id: &str) -> Result<ProcessInstance, EngineError> {
        self.get_json(&format!("/engine-rest/process-instance/{id}"), &[])
            .await
    }

    pub async fn stop_instance(&self, id: &str) -> Result<(), EngineError> {
        let resp = self
            .client
            .delete(format!("{}/engine-rest/process-instance/{}", self.base_url, id))
            .query(&[("skipIoMappings", "true")])
            .send()
            .await?;
        expect_no_content(resp).await
    }

    // ── History ───────────────────────────────────────────────────────────────

    pub async fn list_history(
        &self,
        tenant: &str,
        filter: HistoryFilter,
    ) -> Result<Vec<HistoricProcessInstance>, EngineError> {
        let mut query = vec![("tenantIdIn", tenant)];
        match filter {
            HistoryFilter::All => {}
            HistoryFilter::Finished => query.push(("finished", "true")),
            HistoryFilter::Unfinished => query.push(("unfinished", "true")),
        }
        self.get_json("/engine-rest/history/process-instance", &query)
            .await
    }

    pub async fn remove_history(&self, id: &str) -> Result<(), EngineError> {
        let resp = self
            .client
            .delete(format!(
                "{}/engine-rest/history/process-instance/{}",
                self.base_url, id
            ))
            .send()
            .await?;
        expect_no_content(resp).await
    }

    // ── Incidents ─────────────────────────────────────────────────────────────

    pub async fn list_incidents(&self, tenant: &str) -> Result<Vec<EngineIncident>, EngineError> {
        self.get_json("/engine-rest/incident", &[("tenantIdIn", tenant)])
            .await
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, EngineError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::Http {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }
}

async fn expect_no_content(resp: reqwest::Response) -> Result<(), EngineError> {
    match resp.status() {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
        status => Err(EngineError::Http {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> EngineClient {
        EngineClient::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn deploy_returns_engine_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/engine-rest/deployment/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "dep-1",
                "name": "test",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .await
            .deploy("test", "<bpmn/>", "<svg/>", "senergy", "senergy")
            .await
            .unwrap();
        assert_eq!(id, "dep-1");
    }

    #[tokio::test]
    async fn deploy_falls_back_to_blank_process_on_parse_error() {
        let server = MockServer::start().await;
        // first attempt: the engine rejects the document
        Mock::given(method("POST"))
            .and(path("/engine-rest/deployment/create"))
            .and(body_string_contains("broken"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "type": "ProcessEngineException",
                "message": "ENGINE-09005 Could not parse BPMN process",
            })))
            .expect(1)
            .mount(&server)
            .await;
        // second attempt carries the generated blank process id
        Mock::given(method("POST"))
            .and(path("/engine-rest/deployment/create"))
            .and(body_string_contains("id_"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "dep-blank" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .await
            .deploy("test", "broken", "<svg/>", "senergy", "senergy")
            .await
            .unwrap();
        assert_eq!(id, "dep-blank");
    }

    #[tokio::test]
    async fn undeploy_skips_delete_when_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/deployment/count"))
            .and(query_param("id", "gone"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "count": 0 })),
            )
            .expect(1)
            .mount(&server)
            .await;
        // no DELETE mock mounted — a delete request would fail the call

        client(&server).await.undeploy("gone").await.unwrap();
    }

    #[tokio::test]
    async fn undeploy_cascades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/deployment/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "count": 1 })),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/engine-rest/deployment/dep-1"))
            .and(query_param("cascade", "true"))
            .and(query_param("skipIoMappings", "true"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).await.undeploy("dep-1").await.unwrap();
    }

    #[tokio::test]
    async fn start_sends_empty_object_without_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/engine-rest/process-definition/def-1/submit-form"))
            .and(body_json(serde_json::json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .start("def-1", None, &HashMap::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn start_wraps_parameters_and_business_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/engine-rest/process-definition/def-1/submit-form"))
            .and(body_json(serde_json::json!({
                "businessKey": "testbid",
                "variables": { "speed": { "value": 7 } },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut parameter = HashMap::new();
        parameter.insert("speed".to_string(), serde_json::json!(7));
        client(&server)
            .await
            .start("def-1", Some("testbid"), &parameter)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn errors_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/process-definition/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("definition not found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .get_definition("missing")
            .await
            .unwrap_err();
        match err {
            EngineError::Http { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("definition not found"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn process_parameters_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/process-definition/def-1/form-variables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "speed": { "type": "Integer", "value": 3 },
            })))
            .mount(&server)
            .await;

        let params = client(&server).await.process_parameters("def-1").await.unwrap();
        assert_eq!(params["speed"].value_type, "Integer");
        assert_eq!(params["speed"].value, serde_json::json!(3));
    }

    #[tokio::test]
    async fn list_incidents_decodes_engine_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-rest/incident"))
            .and(query_param("tenantIdIn", "senergy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": "inc-1",
                "processDefinitionId": "def-1",
                "processInstanceId": "pi-1",
                "activityId": "Task_1",
                "incidentMessage": "boom",
                "tenantId": "senergy",
            }])))
            .mount(&server)
            .await;

        let incidents = client(&server).await.list_incidents("senergy").await.unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].activity_id.as_deref(), Some("Task_1"));
    }
}
