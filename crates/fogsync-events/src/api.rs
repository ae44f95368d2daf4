use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use fogsync_domain::EventDescriptor;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::EventsError;
use crate::registry::EventRegistry;

#[derive(Clone)]
struct ApiState {
    registry: Arc<EventRegistry>,
}

/// Read surface for downstream event workers.
pub fn build_app(registry: Arc<EventRegistry>, log_requests: bool) -> Router {
    let router = Router::new()
        .route("/event-descriptions", get(find_event_descriptions))
        .with_state(ApiState { registry })
        .layer(CorsLayer::permissive());
    if log_requests {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Bind and serve the event api until the token cancels.
pub async fn serve(
    registry: Arc<EventRegistry>,
    port: &str,
    log_requests: bool,
    cancel: CancellationToken,
) -> Result<(), EventsError> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(EventsError::Bind)?;
    info!(addr, "event api listening");
    axum::serve(listener, build_app(registry, log_requests))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(EventsError::Serve)
}

#[derive(Debug, Deserialize)]
struct FindQuery {
    #[serde(default)]
    local_device_id: String,
    #[serde(default)]
    local_service_id: String,
}

async fn find_event_descriptions(
    State(state): State<ApiState>,
    Query(query): Query<FindQuery>,
) -> Json<Vec<EventDescriptor>> {
    Json(
        state
            .registry
            .find(&query.local_device_id, &query.local_service_id)
            .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use fogsync_domain::{DeploymentMessage, DeploymentMetadata};
    use tower::util::ServiceExt;

    async fn registry_with_one_descriptor() -> Arc<EventRegistry> {
        let registry = Arc::new(EventRegistry::new());
        let mut deployment = DeploymentMessage::default();
        deployment.event_descriptions = vec![EventDescriptor {
            event_id: "e1".into(),
            device_id: "did1".into(),
            service_id: "sid1".into(),
            ..Default::default()
        }];
        deployment
            .device_id_to_local_id
            .insert("did1".into(), "ldid1".into());
        deployment
            .service_id_to_local_id
            .insert("sid1".into(), "lsid1".into());
        registry
            .add_deployment(&DeploymentMetadata {
                deployment,
                process_parameter: Default::default(),
                deployment_id: "dep-1".into(),
            })
            .await;
        registry
    }

    #[tokio::test]
    async fn returns_matching_descriptors() {
        let app = build_app(registry_with_one_descriptor().await, false);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/event-descriptions?local_device_id=ldid1&local_service_id=lsid1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let descriptors: Vec<EventDescriptor> = serde_json::from_slice(&body).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].deployment_id, "dep-1");
    }

    #[tokio::test]
    async fn unknown_pair_returns_empty_array_not_null() {
        let app = build_app(Arc::new(EventRegistry::new()), false);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/event-descriptions?local_device_id=x&local_service_id=y")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"[]");
    }

    #[tokio::test]
    async fn missing_query_parameters_default_to_empty() {
        let app = build_app(Arc::new(EventRegistry::new()), false);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/event-descriptions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
