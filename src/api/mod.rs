// HTTP surface: router, shared state and request handlers

pub mod check;
pub mod options;
pub mod process;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::config;
use crate::error::ApiError;
use crate::processor::{BulkEditService, Collaborators};
use crate::services::{CachingResolver, CatalogError, InMemoryCatalog};
use crate::types::{EntityType, TenantId};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: BulkEditService,
    pub collaborators: Collaborators,
    /// Acting tenant when a request names none
    pub central_tenant: Option<TenantId>,
}

impl AppState {
    pub fn new(service: BulkEditService, catalog: Arc<InMemoryCatalog>) -> Self {
        let resolver = Arc::new(CachingResolver::new(catalog.clone()));
        Self {
            service,
            collaborators: Collaborators::from_catalog(catalog).with_resolver(resolver),
            central_tenant: None,
        }
    }

    pub fn with_central_tenant(mut self, tenant: Option<TenantId>) -> Self {
        self.central_tenant = tenant;
        self
    }

    /// Standard registry over the configured catalog fixture (empty when none is configured)
    pub fn from_config() -> anyhow::Result<Self> {
        let config = config();
        let catalog = match &config.catalog.fixture_path {
            Some(path) => {
                tracing::info!("Loading catalog fixture from {}", path);
                InMemoryCatalog::from_path(path)?
            }
            None => InMemoryCatalog::new(),
        };
        let service = BulkEditService::from_config()?;
        Ok(Self::new(service, Arc::new(catalog))
            .with_central_tenant(config.consortium.central_tenant.clone().map(TenantId::new)))
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        tracing::error!("Catalog error: {}", err);
        ApiError::internal_server_error("Catalog data is unavailable")
    }
}

pub fn parse_entity(entity: &str) -> Result<EntityType, ApiError> {
    entity.parse().map_err(ApiError::not_found)
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/bulk-edit/:entity/options", get(options::get))
        .route("/api/bulk-edit/:entity/check", post(check::post))
        .route("/api/bulk-edit/:entity/process", post(process::post))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config().api.max_request_size_bytes))
        .layer(CorsLayer::permissive());

    if config().api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

async fn health() -> axum::response::Json<Value> {
    let entities: Vec<&str> = EntityType::ALL.iter().map(|e| e.as_str()).collect();
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "version": env!("CARGO_PKG_VERSION"),
            "entities": entities
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = BulkEditService::from_config().unwrap();
        router(AppState::new(service, Arc::new(InMemoryCatalog::new())))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn holdings_options_are_grouped() {
        let response = app()
            .oneshot(Request::get("/api/bulk-edit/holdings/options").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let options = body["data"]["options"].as_array().unwrap();
        let location = options.iter().find(|o| o["option"] == "PERMANENT_LOCATION").unwrap();
        assert_eq!(location["actions"], json!(["REPLACE_WITH", "CLEAR_FIELD"]));
    }

    #[tokio::test]
    async fn process_without_any_tenant_is_bad_request() {
        let request = Request::post("/api/bulk-edit/item/process")
            .header("content-type", "application/json")
            .body(Body::from(json!({"rules": {"bulkOperationRules": []}, "records": []}).to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "An acting tenant is required");
    }
}
