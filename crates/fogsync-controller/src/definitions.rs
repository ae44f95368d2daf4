use fogsync_cdc::rows::ProcessDefinitionRow;
use tracing::warn;

use crate::controller::Controller;
use crate::error::ControllerError;

impl Controller {
    /// The row image lacks fields the cloud expects (description,
    /// startability), so the full definition is fetched from the engine.
    pub async fn handle_definition_set(&self, payload: &str) {
        let row: ProcessDefinitionRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode process definition row image");
                return;
            }
        };
        let definition = match self.engine.get_definition(&row.id).await {
            Ok(definition) => definition,
            Err(e) => {
                warn!(definition_id = %row.id, error = %e, "unable to fetch process definition");
                return;
            }
        };
        if let Err(e) = self.sink.send_definition_update(&definition).await {
            warn!(definition_id = %definition.id, error = %e, "unable to publish definition update");
        }
    }

    pub async fn handle_definition_delete(&self, payload: &str) {
        let row: ProcessDefinitionRow = match serde_json::from_str(payload) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "unable to decode process definition row image");
                return;
            }
        };
        if let Err(e) = self.sink.send_definition_delete(&row.id).await {
            warn!(definition_id = %row.id, error = %e, "unable to publish definition delete");
        }
    }

    pub(crate) async fn reconcile_definitions(&self) -> Result<(), ControllerError> {
        let definitions = self.engine.list_definitions().await?;
        let mut ids = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            ids.push(definition.id.clone());
            self.sink.send_definition_update(definition).await?;
        }
        self.sink.send_definition_known(&ids).await?;
        Ok(())
    }
}
