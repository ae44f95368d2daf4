use fogsync_cdc::rows::ProcessInstanceRow;
use fogsync_domain::{ProcessInstance, USER_ID};
use tracing::warn;

use crate::controller::Controller;
use crate::error::ControllerError;

impl Controller {
    /// Only root instances propagate outward. The row's (active, end_time)
    /// pair translates to (suspended, ended): an inactive row without an
    /// end time is a suspended instance.
    pub async fn handle_instance_set(&self, payload: &str) {
        let row: ProcessInstanceRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode process instance row image");
                return;
            }
        };
        if !row.is_root() {
            return;
        }
        let instance = ProcessInstance {
            id: row.id,
            definition_id: row.definition_id,
            business_key: row.business_key,
            case_instance_id: row.case_instance_id,
            ended: row.end_time.is_some(),
            suspended: !row.active,
            tenant_id: row.tenant_id,
        };
        if let Err(e) = self.sink.send_instance_update(&instance).await {
            warn!(instance_id = %instance.id, error = %e, "unable to publish instance update");
        }
    }

    pub async fn handle_instance_delete(&self, payload: &str) {
        let row: ProcessInstanceRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode process instance row image");
                return;
            }
        };
        if !row.is_root() {
            return;
        }
        if let Err(e) = self.sink.send_instance_delete(&row.id).await {
            warn!(instance_id = %row.id, error = %e, "unable to publish instance delete");
        }
    }

    pub(crate) async fn reconcile_instances(&self) -> Result<(), ControllerError> {
        let instances = self.engine.list_instances(USER_ID).await?;
        let mut ids = Vec::with_capacity(instances.len());
        for instance in &instances {
            ids.push(instance.id.clone());
            self.sink.send_instance_update(instance).await?;
        }
        self.sink.send_instance_known(&ids).await?;
        Ok(())
    }
}
