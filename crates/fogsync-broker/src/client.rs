use std::time::Duration;

use async_trait::async_trait;
use fogsync_domain::{
    ControlCommand, Deployment, DeploymentMetadata, HistoricProcessInstance, Incident,
    ProcessDefinition, ProcessInstance,
};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{self, Command};
use crate::error::BrokerError;
use crate::sink::StateSink;
use crate::topics::{self, Topics};

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const EVENT_LOOP_CAPACITY: usize = 64;
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct BrokerConfig {
    /// `tcp://host:port` or plain `host:port`.
    pub broker_url: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Accepted for config compatibility; in-flight session state lives in
    /// memory, durable delivery comes from the broker-side persistent
    /// session (clean_session = false).
    pub session_file: String,
    /// Optional topic prefix component.
    pub network_id: String,
    pub debug: bool,
}

/// Persistent QoS-2 session to the command/state broker.
///
/// Command subscriptions are replayed on every reconnect; inbound
/// publishes are decoded and fanned into the returned channel. Publishing
/// is fire-and-await-ack with no application-level resend.
#[derive(Clone)]
pub struct BrokerClient {
    client: AsyncClient,
    topics: Topics,
    debug: bool,
}

impl BrokerClient {
    pub fn connect(
        config: &BrokerConfig,
        cancel: CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<Command>), BrokerError> {
        let (host, port) = parse_broker_addr(&config.broker_url)?;
        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_clean_session(false);
        options.set_keep_alive(Duration::from_secs(30));
        if !config.username.is_empty() {
            options.set_credentials(&config.username, &config.password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, EVENT_LOOP_CAPACITY);
        let topics = Topics::new(&config.network_id);
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let pump_client = client.clone();
        let pump_topics = topics.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = pump_client.disconnect().await;
                        debug!("broker pump stopped");
                        return;
                    }
                    event = eventloop.poll() => match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("connected to broker");
                            for topic in pump_topics.command_topics() {
                                if let Err(e) = pump_client
                                    .subscribe(topic.clone(), QoS::ExactlyOnce)
                                    .await
                                {
                                    warn!(topic = %topic, error = %e, "subscribe failed");
                                }
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            match command::decode(&pump_topics, &publish.topic, &publish.payload) {
                                Ok(cmd) => {
                                    if tx.send(cmd).await.is_err() {
                                        return;
                                    }
                                }
                                Err(e) => {
                                    warn!(topic = %publish.topic, error = %e, "dropping undecodable command");
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "broker connection lost, retrying");
                            tokio::select! {
                                _ = cancel.cancelled() => return,
                                _ = tokio::time::sleep(RECONNECT_PAUSE) => {}
                            }
                        }
                    }
                }
            }
        });

        Ok((
            Self {
                client,
                topics,
                debug: config.debug,
            },
            rx,
        ))
    }

    async fn publish_json<T: Serialize>(
        &self,
        topic: String,
        payload: &T,
    ) -> Result<(), BrokerError> {
        let bytes = serde_json::to_vec(payload)?;
        if self.debug {
            debug!(topic = %topic, payload = %String::from_utf8_lossy(&bytes), "publish");
        }
        self.client
            .publish(topic, QoS::ExactlyOnce, false, bytes)
            .await?;
        Ok(())
    }

    async fn publish_id(&self, topic: String, id: &str) -> Result<(), BrokerError> {
        if self.debug {
            debug!(topic = %topic, payload = id, "publish");
        }
        self.client
            .publish(topic, QoS::ExactlyOnce, false, id.as_bytes())
            .await?;
        Ok(())
    }
}

fn parse_broker_addr(url: &str) -> Result<(String, u16), BrokerError> {
    let trimmed = url
        .strip_prefix("tcp://")
        .or_else(|| url.strip_prefix("mqtt://"))
        .unwrap_or(url);
    let (host, port) = trimmed
        .split_once(':')
        .ok_or_else(|| BrokerError::InvalidBrokerUrl(url.to_string()))?;
    if host.is_empty() {
        return Err(BrokerError::InvalidBrokerUrl(url.to_string()));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| BrokerError::InvalidBrokerUrl(url.to_string()))?;
    Ok((host.to_string(), port))
}

#[async_trait]
impl StateSink for BrokerClient {
    async fn send_deployment_update(&self, deployment: &Deployment) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state(topics::DEPLOYMENT), deployment)
            .await
    }

    async fn send_deployment_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.publish_id(self.topics.state_delete(topics::DEPLOYMENT), id)
            .await
    }

    async fn send_deployment_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state_known(topics::DEPLOYMENT), &ids)
            .await
    }

    async fn send_deployment_metadata(
        &self,
        metadata: &DeploymentMetadata,
    ) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state_deployment_metadata(), metadata)
            .await
    }

    async fn send_definition_update(
        &self,
        definition: &ProcessDefinition,
    ) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state(topics::PROCESS_DEFINITION), definition)
            .await
    }

    async fn send_definition_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.publish_id(self.topics.state_delete(topics::PROCESS_DEFINITION), id)
            .await
    }

    async fn send_definition_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state_known(topics::PROCESS_DEFINITION), &ids)
            .await
    }

    async fn send_instance_update(&self, instance: &ProcessInstance) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state(topics::PROCESS_INSTANCE), instance)
            .await
    }

    async fn send_instance_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.publish_id(self.topics.state_delete(topics::PROCESS_INSTANCE), id)
            .await
    }

    async fn send_instance_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state_known(topics::PROCESS_INSTANCE), &ids)
            .await
    }

    async fn send_history_update(
        &self,
        history: &HistoricProcessInstance,
    ) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state(topics::PROCESS_INSTANCE_HISTORY), history)
            .await
    }

    async fn send_history_delete(&self, id: &str) -> Result<(), BrokerError> {
        self.publish_id(
            self.topics.state_delete(topics::PROCESS_INSTANCE_HISTORY),
            id,
        )
        .await
    }

    async fn send_history_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.publish_json(
            self.topics.state_known(topics::PROCESS_INSTANCE_HISTORY),
            &ids,
        )
        .await
    }

    async fn send_incident(&self, incident: &Incident) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state(topics::INCIDENT), incident)
            .await
    }

    async fn send_incident_known(&self, ids: &[String]) -> Result<(), BrokerError> {
        self.publish_json(self.topics.state_known(topics::INCIDENT), &ids)
            .await
    }

    async fn send_analytics_control(
        &self,
        command: &ControlCommand,
    ) -> Result<(), BrokerError> {
        self.publish_json(topics::ANALYTICS_CONTROL.to_string(), command)
            .await
    }
}
