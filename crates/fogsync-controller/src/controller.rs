use std::sync::Arc;

use fogsync_broker::{BrokerClient, BrokerConfig, Command, StateSink};
use fogsync_config::{parse_optional_duration, Config};
use fogsync_engine::EngineClient;
use fogsync_events::EventRegistry;
use fogsync_store::MetadataStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analytics::AnalyticsOperators;
use crate::cleanup::HistoryCleanup;
use crate::error::ControllerError;
use crate::incidents::IncidentSupervisor;
use crate::notification::Notifier;

// Watched engine tables and the channel-name component of their triggers.
const WATCHED_TABLES: [(&str, &str); 4] = [
    ("deployment", "ACT_RE_DEPLOYMENT"),
    ("definition", "ACT_RE_PROCDEF"),
    ("instance", "ACT_RU_EXECUTION"),
    ("history", "ACT_HI_PROCINST"),
];

/// Wires the CDC stream, the broker protocol, the engine client and the
/// local stores together.
pub struct Controller {
    pub(crate) config: Config,
    pub(crate) engine: EngineClient,
    pub(crate) store: Arc<dyn MetadataStore>,
    pub(crate) registry: Arc<EventRegistry>,
    pub(crate) incidents: IncidentSupervisor,
    pub(crate) analytics: AnalyticsOperators,
    pub(crate) sink: Arc<dyn StateSink>,
}

impl Controller {
    /// Bring the agent up: open the stores, install CDC, connect the
    /// broker, serve the event api, then publish the first full state and
    /// start the periodic reconciler.
    pub async fn start(
        config: Config,
        cancel: CancellationToken,
    ) -> Result<Arc<Self>, ControllerError> {
        let store = fogsync_store::open(&config.deployment_metadata_storage).await?;

        let broker_config = BrokerConfig {
            broker_url: config.mqtt_broker.clone(),
            client_id: config.mqtt_client_id.clone(),
            username: config.mqtt_user.clone(),
            password: config.mqtt_pw.clone(),
            session_file: config.mqtt_file_store_location.clone(),
            network_id: config.network_id.clone(),
            debug: config.debug,
        };
        let (broker, commands) = BrokerClient::connect(&broker_config, cancel.clone())?;

        let controller = Self::assemble(config, store, Arc::new(broker))?;

        controller.warm_up_from_store().await?;
        controller.install_cdc(&cancel).await?;
        controller.spawn_event_api(&cancel);
        controller.clone().spawn_command_loop(commands, cancel.clone());

        // grace period for stale unacked commands from a previous session
        match parse_optional_duration(&controller.config.initial_wait_duration) {
            Ok(Some(wait)) => tokio::time::sleep(wait).await,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "unable to parse initial wait duration"),
        }

        if let Err(e) = controller.reconcile().await {
            warn!(error = %e, "initial full-state publication failed, next tick retries");
        }
        controller.clone().spawn_reconcile_ticker(cancel.clone());
        controller.clone().spawn_history_cleanup(cancel);

        Ok(controller)
    }

    /// Construct a controller around already-opened collaborators. The
    /// seam `start` and the tests share.
    pub fn assemble(
        config: Config,
        store: Arc<dyn MetadataStore>,
        sink: Arc<dyn StateSink>,
    ) -> Result<Arc<Self>, ControllerError> {
        let engine = EngineClient::new(&config.camunda_url)?;
        let notifier = Notifier::new(&config.notification_url)?;
        let incidents = IncidentSupervisor::new(engine.clone(), notifier, sink.clone());
        let analytics = AnalyticsOperators::new(sink.clone());
        Ok(Arc::new(Self {
            config,
            engine,
            store,
            registry: Arc::new(EventRegistry::new()),
            incidents,
            analytics,
            sink,
        }))
    }

    // Rebuild the in-memory projections from the durable metadata.
    async fn warm_up_from_store(&self) -> Result<(), ControllerError> {
        if self.store.is_placeholder() {
            return Ok(());
        }
        for meta in self.store.list().await? {
            self.registry.add_deployment(&meta).await;
            if let Some(handling) = meta.deployment.incident_handling {
                if let Err(e) = self
                    .incidents
                    .register_deployment(&meta.deployment_id, handling)
                    .await
                {
                    warn!(
                        deployment_id = %meta.deployment_id,
                        error = %e,
                        "unable to restore incident handling"
                    );
                }
            }
        }
        Ok(())
    }

    async fn install_cdc(self: &Arc<Self>, cancel: &CancellationToken) -> Result<(), ControllerError> {
        for (entity, table) in WATCHED_TABLES {
            let set_channel = format!("senergy_{entity}_set");
            let delete_channel = format!("senergy_{entity}_delete");
            fogsync_cdc::install_notifier(
                &self.config.camunda_db,
                &set_channel,
                &delete_channel,
                table,
            )
            .await?;
            let set_rx =
                fogsync_cdc::listen(&self.config.camunda_db, &set_channel, cancel.clone()).await?;
            let delete_rx =
                fogsync_cdc::listen(&self.config.camunda_db, &delete_channel, cancel.clone())
                    .await?;
            self.clone().spawn_cdc_consumer(entity, true, set_rx);
            self.clone().spawn_cdc_consumer(entity, false, delete_rx);
        }
        Ok(())
    }

    fn spawn_cdc_consumer(
        self: Arc<Self>,
        entity: &'static str,
        is_set: bool,
        mut rx: mpsc::Receiver<String>,
    ) {
        tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                match (entity, is_set) {
                    ("deployment", true) => self.handle_deployment_set(&payload).await,
                    ("deployment", false) => self.handle_deployment_delete(&payload).await,
                    ("definition", true) => self.handle_definition_set(&payload).await,
                    ("definition", false) => self.handle_definition_delete(&payload).await,
                    ("instance", true) => self.handle_instance_set(&payload).await,
                    ("instance", false) => self.handle_instance_delete(&payload).await,
                    ("history", true) => self.handle_history_set(&payload).await,
                    ("history", false) => self.handle_history_delete(&payload).await,
                    _ => {}
                }
            }
        });
    }

    fn spawn_event_api(&self, cancel: &CancellationToken) {
        let registry = self.registry.clone();
        let port = self.config.event_api_port.clone();
        let log_requests = !self.config.disable_event_api_http_logger;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) =
                fogsync_events::serve(registry, &port, log_requests, cancel.clone()).await
            {
                error!(error = %e, "event api failed");
                cancel.cancel();
            }
        });
    }

    // One task per command: a slow handler must not stall the broker pump,
    // and a poisoned command must not affect the others. Handlers are
    // idempotent, so the resulting loss of per-topic ordering is safe.
    fn spawn_command_loop(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<Command>,
        cancel: CancellationToken,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    command = commands.recv() => {
                        let Some(command) = command else { return };
                        let controller = self.clone();
                        tokio::spawn(async move { controller.dispatch(command).await });
                    }
                }
            }
        });
    }

    async fn dispatch(&self, command: Command) {
        let result = match command {
            Command::CreateDeployment(msg) => self.handle_create_deployment(*msg).await,
            Command::StartDeployment(msg) => self.handle_start_deployment(msg).await,
            Command::DeleteDeployment(id) => self.handle_delete_deployment(&id).await,
            Command::UpdateDeploymentEvents(msg) => {
                self.handle_update_deployment_events(*msg).await
            }
            Command::DeleteProcessInstance(id) => {
                self.engine.stop_instance(&id).await.map_err(Into::into)
            }
            Command::DeleteProcessHistory(id) => {
                self.engine.remove_history(&id).await.map_err(Into::into)
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "command handler failed");
        }
    }

    /// One full-state pass: publish every entity's current rows and known
    /// ids, sweep the metadata store, rescan incidents. The backstop that
    /// closes any drift window left by missed CDC events.
    pub async fn reconcile(&self) -> Result<(), ControllerError> {
        self.reconcile_deployments().await?;
        self.reconcile_definitions().await?;
        self.reconcile_instances().await?;
        self.reconcile_histories().await?;
        let incidents = self.incidents.rescan().await?;
        debug!(incidents, "full-state publication complete");
        Ok(())
    }

    fn spawn_reconcile_ticker(self: Arc<Self>, cancel: CancellationToken) {
        let interval = match parse_optional_duration(&self.config.full_update_interval) {
            Ok(Some(interval)) => interval,
            Ok(None) => {
                info!("no full update interval configured, periodic reconciliation disabled");
                return;
            }
            Err(e) => {
                warn!(error = %e, "unable to parse full update interval");
                return;
            }
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // immediate first tick already ran at startup
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        if let Err(e) = self.reconcile().await {
                            warn!(error = %e, "reconciliation pass failed, next tick retries");
                        }
                    }
                }
            }
        });
    }

    fn spawn_history_cleanup(self: Arc<Self>, cancel: CancellationToken) {
        let interval = match parse_optional_duration(&self.config.history_cleanup_interval) {
            Ok(Some(interval)) => interval,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "unable to parse history cleanup interval");
                return;
            }
        };
        if self.config.history_cleanup_location.is_empty() {
            warn!("history cleanup interval set but no cleanup location configured");
            return;
        }
        let cleanup = match HistoryCleanup::new(
            &self.config.history_cleanup_location,
            &self.config.history_cleanup_max_age,
            self.config.history_cleanup_batch_size,
            self.config.history_cleanup_filter_locally,
        ) {
            Ok(cleanup) => cleanup,
            Err(e) => {
                warn!(error = %e, "unable to set up history cleanup");
                return;
            }
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        if let Err(e) = cleanup.run_once().await {
                            warn!(error = %e, "history cleanup run failed");
                        }
                    }
                }
            }
        });
    }
}
