use fogsync_cdc::rows::HistoryRow;
use fogsync_domain::{HistoricProcessInstance, USER_ID};
use fogsync_engine::HistoryFilter;
use tracing::warn;

use crate::controller::Controller;
use crate::error::ControllerError;

impl Controller {
    pub async fn handle_history_set(&self, payload: &str) {
        let row: HistoryRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode history row image");
                return;
            }
        };
        let mut history = HistoricProcessInstance {
            id: row.id,
            super_process_instance_id: row.super_process_instance_id,
            super_case_instance_id: row.super_case_instance_id,
            case_instance_id: row.case_instance_id,
            process_definition_key: row.process_definition_key,
            process_definition_id: row.process_definition_id,
            business_key: row.business_key,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_in_millis: row.duration_in_millis,
            start_user_id: row.start_user_id,
            start_activity_id: row.start_activity_id,
            delete_reason: row.delete_reason,
            tenant_id: row.tenant_id,
            state: row.state,
            ..Default::default()
        };
        // cross-fields not present in the row image
        match self.engine.get_definition(&history.process_definition_id).await {
            Ok(definition) => {
                history.process_definition_name = Some(definition.name);
                history.process_definition_version = Some(definition.version as f64);
            }
            Err(e) => {
                warn!(
                    definition_id = %history.process_definition_id,
                    error = %e,
                    "unable to enrich history with definition"
                );
            }
        }
        if let Err(e) = self.sink.send_history_update(&history).await {
            warn!(history_id = %history.id, error = %e, "unable to publish history update");
        }
    }

    pub async fn handle_history_delete(&self, payload: &str) {
        let row: HistoryRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode history row image");
                return;
            }
        };
        if let Err(e) = self.sink.send_history_delete(&row.id).await {
            warn!(history_id = %row.id, error = %e, "unable to publish history delete");
        }
    }

    pub(crate) async fn reconcile_histories(&self) -> Result<(), ControllerError> {
        let histories = self.engine.list_history(USER_ID, HistoryFilter::All).await?;
        let mut ids = Vec::with_capacity(histories.len());
        for history in &histories {
            ids.push(history.id.clone());
            self.sink.send_history_update(history).await?;
        }
        self.sink.send_history_known(&ids).await?;
        Ok(())
    }
}
