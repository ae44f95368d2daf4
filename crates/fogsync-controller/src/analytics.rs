use std::sync::Arc;

use fogsync_broker::StateSink;
use fogsync_domain::{
    AnalyticsRecord, ControlCommand, DeploymentMetadata, FogConfig, InputTopic, OperatorJob,
    TopicMapping,
};
use tracing::warn;

use crate::error::ControllerError;

/// Manages the fog analytics operators a deployment's analytics records
/// describe: started when the deployment is created, stopped when the
/// engine reports its deletion. Skipped entirely on placeholder storage,
/// since the stored metadata is the only record of what was started.
pub struct AnalyticsOperators {
    sink: Arc<dyn StateSink>,
}

impl AnalyticsOperators {
    pub fn new(sink: Arc<dyn StateSink>) -> Self {
        Self { sink }
    }

    pub async fn start_operators(&self, meta: &DeploymentMetadata) -> Result<(), ControllerError> {
        for record in &meta.deployment.analytics_records {
            match operator_job(meta, record) {
                Some(job) => {
                    self.sink
                        .send_analytics_control(&ControlCommand {
                            command: "startOperator".to_string(),
                            data: job,
                        })
                        .await?;
                }
                None => warn!(
                    deployment_id = %meta.deployment_id,
                    "analytics record without event, operator skipped"
                ),
            }
        }
        Ok(())
    }

    pub async fn stop_operators(&self, meta: &DeploymentMetadata) -> Result<(), ControllerError> {
        for record in &meta.deployment.analytics_records {
            if let Some(job) = operator_job(meta, record) {
                self.sink
                    .send_analytics_control(&ControlCommand {
                        command: "stopOperator".to_string(),
                        data: job,
                    })
                    .await?;
            }
        }
        Ok(())
    }
}

// The operator id doubles as the event id so start and stop address the
// same pipeline element.
fn operator_job(meta: &DeploymentMetadata, record: &AnalyticsRecord) -> Option<OperatorJob> {
    if let Some(event) = &record.device_event {
        return Some(OperatorJob {
            input_topics: vec![InputTopic {
                name: event.service_id.replace(':', "_"),
                filter_type: "DeviceId".to_string(),
                filter_value: event.device_id.clone(),
                mappings: vec![TopicMapping {
                    source: event.path.clone(),
                    dest: "value".to_string(),
                }],
            }],
            operator_config: [("value".to_string(), event.value.clone())]
                .into_iter()
                .collect(),
            config: FogConfig {
                pipeline_id: meta.deployment_id.clone(),
                output_topic: format!("analytics-{}", event.event_id),
                operator_id: event.event_id.clone(),
            },
            ..Default::default()
        });
    }
    if let Some(event) = &record.group_event {
        let input_topics = event
            .service_ids
            .iter()
            .map(|service_id| InputTopic {
                name: service_id.replace(':', "_"),
                filter_type: "OperatorId".to_string(),
                filter_value: event.device_group_id.clone(),
                mappings: event
                    .service_to_path_mapping
                    .get(service_id)
                    .map(|path| {
                        vec![TopicMapping {
                            source: path.clone(),
                            dest: "value".to_string(),
                        }]
                    })
                    .unwrap_or_default(),
            })
            .collect();
        return Some(OperatorJob {
            input_topics,
            operator_config: [("value".to_string(), event.operator_value.clone())]
                .into_iter()
                .collect(),
            config: FogConfig {
                pipeline_id: meta.deployment_id.clone(),
                output_topic: format!("analytics-{}", event.event_id),
                operator_id: event.event_id.clone(),
            },
            ..Default::default()
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSink, SinkRecord};
    use fogsync_domain::{DeploymentMessage, DeviceEventAnalyticsRecord};

    fn meta_with_device_event() -> DeploymentMetadata {
        DeploymentMetadata {
            deployment: DeploymentMessage {
                analytics_records: vec![AnalyticsRecord {
                    device_event: Some(DeviceEventAnalyticsRecord {
                        label: "temp high".into(),
                        event_id: "ev-1".into(),
                        device_id: "did1".into(),
                        service_id: "svc:1".into(),
                        value: "42".into(),
                        path: "value.temperature".into(),
                        ..Default::default()
                    }),
                    group_event: None,
                }],
                ..Default::default()
            },
            process_parameter: Default::default(),
            deployment_id: "dep-1".into(),
        }
    }

    #[tokio::test]
    async fn start_and_stop_address_the_same_operator() {
        let sink = Arc::new(RecordingSink::default());
        let ops = AnalyticsOperators::new(sink.clone());
        let meta = meta_with_device_event();

        ops.start_operators(&meta).await.unwrap();
        ops.stop_operators(&meta).await.unwrap();

        let records = sink.records();
        let commands: Vec<&ControlCommand> = records
            .iter()
            .filter_map(|r| match r {
                SinkRecord::AnalyticsControl(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command, "startOperator");
        assert_eq!(commands[1].command, "stopOperator");
        assert_eq!(commands[0].data.config.operator_id, "ev-1");
        assert_eq!(
            commands[0].data.config.operator_id,
            commands[1].data.config.operator_id
        );
        assert_eq!(commands[0].data.config.pipeline_id, "dep-1");
        assert_eq!(commands[0].data.input_topics[0].name, "svc_1");
    }
}
