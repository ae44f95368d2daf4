use fogsync_domain::{DeploymentMessage, EventDescriptionsUpdate, StartMessage};

use crate::error::BrokerError;
use crate::topics::Topics;

/// A decoded command from the cloud controller.
#[derive(Debug, Clone)]
pub enum Command {
    CreateDeployment(Box<DeploymentMessage>),
    StartDeployment(StartMessage),
    DeleteDeployment(String),
    UpdateDeploymentEvents(Box<EventDescriptionsUpdate>),
    DeleteProcessInstance(String),
    DeleteProcessHistory(String),
}

/// Decode an inbound publish by its topic. Delete topics carry a bare id
/// string; everything else is a JSON object.
pub fn decode(topics: &Topics, topic: &str, payload: &[u8]) -> Result<Command, BrokerError> {
    if topic == topics.cmd_deployment() {
        return Ok(Command::CreateDeployment(Box::new(serde_json::from_slice(
            payload,
        )?)));
    }
    if topic == topics.cmd_deployment_start() {
        return Ok(Command::StartDeployment(serde_json::from_slice(payload)?));
    }
    if topic == topics.cmd_deployment_delete() {
        return Ok(Command::DeleteDeployment(bare_id(topic, payload)?));
    }
    if topic == topics.cmd_deployment_event_descriptions() {
        return Ok(Command::UpdateDeploymentEvents(Box::new(
            serde_json::from_slice(payload)?,
        )));
    }
    if topic == topics.cmd_process_instance_delete() {
        return Ok(Command::DeleteProcessInstance(bare_id(topic, payload)?));
    }
    if topic == topics.cmd_process_history_delete() {
        return Ok(Command::DeleteProcessHistory(bare_id(topic, payload)?));
    }
    Err(BrokerError::UnknownTopic(topic.to_string()))
}

fn bare_id(topic: &str, payload: &[u8]) -> Result<String, BrokerError> {
    std::str::from_utf8(payload)
        .map(|s| s.trim().trim_matches('"').to_string())
        .map_err(|_| BrokerError::Payload(topic.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new("")
    }

    #[test]
    fn decodes_deployment_command() {
        let payload = br#"{"id":"test","name":"test","version":3,
            "diagram":{"xml_raw":"<a/>","xml_deployed":"<a/>","svg":"<svg/>"}}"#;
        let cmd = decode(&topics(), "processes/cmd/deployment", payload).unwrap();
        match cmd {
            Command::CreateDeployment(msg) => assert_eq!(msg.id, "test"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn decodes_start_command() {
        let payload = br#"{"deployment_id":"d1","business_key":"testbid","parameter":{}}"#;
        let cmd = decode(&topics(), "processes/cmd/deployment/start", payload).unwrap();
        match cmd {
            Command::StartDeployment(msg) => {
                assert_eq!(msg.deployment_id, "d1");
                assert_eq!(msg.business_key.as_deref(), Some("testbid"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn delete_topics_take_bare_ids() {
        let cmd = decode(&topics(), "processes/cmd/deployment/delete", b"dep-1").unwrap();
        assert!(matches!(cmd, Command::DeleteDeployment(id) if id == "dep-1"));

        // a JSON-quoted id is tolerated
        let cmd =
            decode(&topics(), "processes/cmd/process-instance/delete", b"\"pi-1\"").unwrap();
        assert!(matches!(cmd, Command::DeleteProcessInstance(id) if id == "pi-1"));

        let cmd = decode(
            &topics(),
            "processes/cmd/process-instance-history/delete",
            b"hi-1",
        )
        .unwrap();
        assert!(matches!(cmd, Command::DeleteProcessHistory(id) if id == "hi-1"));
    }

    #[test]
    fn decodes_event_descriptions_update() {
        let payload = br#"{"deployment_id":"d1","event_descriptions":[
            {"event_id":"e1","device_id":"did1","service_id":"sid1"}],
            "device_id_to_local_id":{"did1":"ldid1"},
            "service_id_to_local_id":{"sid1":"lsid1"}}"#;
        let cmd = decode(
            &topics(),
            "processes/cmd/deployment/event-descriptions",
            payload,
        )
        .unwrap();
        match cmd {
            Command::UpdateDeploymentEvents(msg) => {
                assert_eq!(msg.deployment_id, "d1");
                assert_eq!(msg.event_descriptions.len(), 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_topic_is_an_error() {
        let err = decode(&topics(), "processes/state/deployment", b"{}").unwrap_err();
        assert!(matches!(err, BrokerError::UnknownTopic(_)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(decode(&topics(), "processes/cmd/deployment", b"not json").is_err());
    }
}
