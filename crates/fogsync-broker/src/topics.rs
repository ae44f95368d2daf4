/// Topic names of the five synchronized entities.
pub const DEPLOYMENT: &str = "deployment";
pub const PROCESS_DEFINITION: &str = "process-definition";
pub const PROCESS_INSTANCE: &str = "process-instance";
pub const PROCESS_INSTANCE_HISTORY: &str = "process-instance-history";
pub const INCIDENT: &str = "incident";

/// Control channel of the fog analytics platform.
pub const ANALYTICS_CONTROL: &str = "fog/control";

/// Topic scheme of the command/state protocol.
///
/// The base is `processes`, extended to `processes/<network-id>` when the
/// gateway is addressed as part of a larger network. Commands live under
/// `<base>/cmd/...`, published state under `<base>/state/...`.
#[derive(Debug, Clone)]
pub struct Topics {
    base: String,
}

impl Topics {
    pub fn new(network_id: &str) -> Self {
        let base = if network_id.is_empty() {
            "processes".to_string()
        } else {
            format!("processes/{network_id}")
        };
        Topics { base }
    }

    // ── Commands (subscribed) ─────────────────────────────────────────────────

    pub fn cmd_deployment(&self) -> String {
        format!("{}/cmd/{}", self.base, DEPLOYMENT)
    }

    pub fn cmd_deployment_start(&self) -> String {
        format!("{}/cmd/{}/start", self.base, DEPLOYMENT)
    }

    pub fn cmd_deployment_delete(&self) -> String {
        format!("{}/cmd/{}/delete", self.base, DEPLOYMENT)
    }

    pub fn cmd_deployment_event_descriptions(&self) -> String {
        format!("{}/cmd/{}/event-descriptions", self.base, DEPLOYMENT)
    }

    pub fn cmd_process_instance_delete(&self) -> String {
        format!("{}/cmd/{}/delete", self.base, PROCESS_INSTANCE)
    }

    pub fn cmd_process_history_delete(&self) -> String {
        format!("{}/cmd/{}/delete", self.base, PROCESS_INSTANCE_HISTORY)
    }

    pub fn command_topics(&self) -> Vec<String> {
        vec![
            self.cmd_deployment(),
            self.cmd_deployment_start(),
            self.cmd_deployment_delete(),
            self.cmd_deployment_event_descriptions(),
            self.cmd_process_instance_delete(),
            self.cmd_process_history_delete(),
        ]
    }

    // ── State (published) ─────────────────────────────────────────────────────

    pub fn state(&self, entity: &str) -> String {
        format!("{}/state/{}", self.base, entity)
    }

    pub fn state_delete(&self, entity: &str) -> String {
        format!("{}/state/{}/delete", self.base, entity)
    }

    pub fn state_known(&self, entity: &str) -> String {
        format!("{}/state/{}/known", self.base, entity)
    }

    pub fn state_deployment_metadata(&self) -> String {
        format!("{}/state/{}/metadata", self.base, DEPLOYMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_without_network_id() {
        let topics = Topics::new("");
        assert_eq!(topics.cmd_deployment(), "processes/cmd/deployment");
        assert_eq!(topics.state(DEPLOYMENT), "processes/state/deployment");
        assert_eq!(
            topics.state_delete(PROCESS_INSTANCE),
            "processes/state/process-instance/delete"
        );
        assert_eq!(
            topics.state_known(PROCESS_INSTANCE_HISTORY),
            "processes/state/process-instance-history/known"
        );
        assert_eq!(
            topics.state_deployment_metadata(),
            "processes/state/deployment/metadata"
        );
    }

    #[test]
    fn network_id_extends_the_base() {
        let topics = Topics::new("net-1");
        assert_eq!(
            topics.cmd_deployment_start(),
            "processes/net-1/cmd/deployment/start"
        );
        assert_eq!(
            topics.state(INCIDENT),
            "processes/net-1/state/incident"
        );
    }

    #[test]
    fn all_command_topics_enumerated() {
        let topics = Topics::new("");
        let all = topics.command_topics();
        assert_eq!(all.len(), 6);
        assert!(all.contains(&"processes/cmd/deployment/event-descriptions".to_string()));
        assert!(all.contains(&"processes/cmd/process-instance/delete".to_string()));
        assert!(all.contains(&"processes/cmd/process-instance-history/delete".to_string()));
    }
}
