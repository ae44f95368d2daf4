mod duration;
mod error;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

pub use duration::{parse_duration, parse_optional_duration};
pub use error::ConfigError;

/// Agent configuration, loaded from a JSON file with every field
/// overridable by the upper-snake-case environment variable of the same
/// name (`camunda_url` → `CAMUNDA_URL`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub event_api_port: String,
    pub disable_event_api_http_logger: bool,

    /// Connection string of the engine's Postgres store (CDC source).
    pub camunda_db: String,
    /// Base URL of the engine's REST API.
    pub camunda_url: String,

    /// Metadata backend selector: `postgres://` URL, a file path, or empty
    /// for the placeholder backend.
    pub deployment_metadata_storage: String,

    /// Grace period before the first full-state publication, so stale
    /// unacked commands from a previous session are handled first.
    pub initial_wait_duration: String,

    pub debug: bool,

    pub mqtt_broker: String,
    pub mqtt_client_id: String,
    pub mqtt_user: String,
    pub mqtt_pw: String,
    pub mqtt_file_store_location: String,
    pub network_id: String,
    pub full_update_interval: String,

    pub history_cleanup_interval: String,
    pub history_cleanup_max_age: String,
    pub history_cleanup_batch_size: i64,
    pub history_cleanup_filter_locally: bool,
    pub history_cleanup_location: String,

    pub notification_url: String,
    pub notification_url_placeholder: String,

    pub task_topic_replace: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            event_api_port: "8080".into(),
            disable_event_api_http_logger: false,
            camunda_db: String::new(),
            camunda_url: String::new(),
            deployment_metadata_storage: String::new(),
            initial_wait_duration: "2s".into(),
            debug: false,
            mqtt_broker: String::new(),
            mqtt_client_id: String::new(),
            mqtt_user: String::new(),
            mqtt_pw: String::new(),
            mqtt_file_store_location: String::new(),
            network_id: String::new(),
            full_update_interval: "60s".into(),
            history_cleanup_interval: String::new(),
            history_cleanup_max_age: String::new(),
            history_cleanup_batch_size: 100,
            history_cleanup_filter_locally: false,
            history_cleanup_location: String::new(),
            notification_url: String::new(),
            notification_url_placeholder: String::new(),
            task_topic_replace: HashMap::new(),
        }
    }
}

/// Load the config file at `path` and apply environment overrides.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut config: Config =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
    apply_env(&mut config);
    Ok(config)
}

// Environment overrides mirror the config fields one to one. Secrets are
// masked when the override is logged.
fn apply_env(config: &mut Config) {
    env_string("EVENT_API_PORT", &mut config.event_api_port, false);
    env_bool(
        "DISABLE_EVENT_API_HTTP_LOGGER",
        &mut config.disable_event_api_http_logger,
    );
    env_string("CAMUNDA_DB", &mut config.camunda_db, false);
    env_string("CAMUNDA_URL", &mut config.camunda_url, false);
    env_string(
        "DEPLOYMENT_METADATA_STORAGE",
        &mut config.deployment_metadata_storage,
        false,
    );
    env_string(
        "INITIAL_WAIT_DURATION",
        &mut config.initial_wait_duration,
        false,
    );
    env_bool("DEBUG", &mut config.debug);
    env_string("MQTT_BROKER", &mut config.mqtt_broker, false);
    env_string("MQTT_CLIENT_ID", &mut config.mqtt_client_id, false);
    env_string("MQTT_USER", &mut config.mqtt_user, true);
    env_string("MQTT_PW", &mut config.mqtt_pw, true);
    env_string(
        "MQTT_FILE_STORE_LOCATION",
        &mut config.mqtt_file_store_location,
        false,
    );
    env_string("NETWORK_ID", &mut config.network_id, false);
    env_string(
        "FULL_UPDATE_INTERVAL",
        &mut config.full_update_interval,
        false,
    );
    env_string(
        "HISTORY_CLEANUP_INTERVAL",
        &mut config.history_cleanup_interval,
        false,
    );
    env_string(
        "HISTORY_CLEANUP_MAX_AGE",
        &mut config.history_cleanup_max_age,
        false,
    );
    env_i64(
        "HISTORY_CLEANUP_BATCH_SIZE",
        &mut config.history_cleanup_batch_size,
    );
    env_bool(
        "HISTORY_CLEANUP_FILTER_LOCALLY",
        &mut config.history_cleanup_filter_locally,
    );
    env_string(
        "HISTORY_CLEANUP_LOCATION",
        &mut config.history_cleanup_location,
        false,
    );
    env_string("NOTIFICATION_URL", &mut config.notification_url, false);
    env_string(
        "NOTIFICATION_URL_PLACEHOLDER",
        &mut config.notification_url_placeholder,
        false,
    );
    env_map("TASK_TOPIC_REPLACE", &mut config.task_topic_replace);
}

fn env_string(name: &str, target: &mut String, secret: bool) {
    if let Ok(value) = std::env::var(name) {
        if value.is_empty() {
            return;
        }
        let logged = if secret { "***" } else { value.as_str() };
        info!(name, value = logged, "use environment variable");
        *target = value;
    }
}

fn env_bool(name: &str, target: &mut bool) {
    if let Ok(value) = std::env::var(name) {
        if let Ok(parsed) = value.parse() {
            info!(name, value, "use environment variable");
            *target = parsed;
        }
    }
}

fn env_i64(name: &str, target: &mut i64) {
    if let Ok(value) = std::env::var(name) {
        if let Ok(parsed) = value.parse() {
            info!(name, value, "use environment variable");
            *target = parsed;
        }
    }
}

// Map overrides use the form "from:to,from2:to2".
fn env_map(name: &str, target: &mut HashMap<String, String>) {
    if let Ok(value) = std::env::var(name) {
        if value.is_empty() {
            return;
        }
        info!(name, value, "use environment variable");
        let mut map = HashMap::new();
        for element in value.split(',') {
            if let Some((key, val)) = element.split_once(':') {
                map.insert(key.trim().to_string(), val.trim().to_string());
            }
        }
        *target = map;
    }
}
