use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_entity, AppState};
use crate::error::ApiError;
use crate::processor::{BatchRecord, ProcessingContext};
use crate::rules::RuleCollection;
use crate::services::TracingErrorSink;
use crate::tenant::{batch_tenant_context, ActingIdentity};
use crate::types::TenantId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub affiliations: Option<Vec<TenantId>>,
    pub rules: RuleCollection,
    pub records: Vec<BatchRecord>,
    /// Skip associated record propagation
    #[serde(default)]
    pub preview: bool,
    /// Reject the whole batch when any rule combination is unsupported
    #[serde(default)]
    pub strict: bool,
}

/// POST /api/bulk-edit/:entity/process - Apply rules to a batch of records
pub async fn post(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let entity = parse_entity(&entity)?;
    let Json(request) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    if request.strict {
        let unsupported = state.service.registry().check_rules(entity, &request.rules)?;
        if !unsupported.is_empty() {
            return Err(ApiError::unsupported_rules(unsupported));
        }
    }

    let identity = ActingIdentity {
        tenant: request.tenant_id,
        user_id: request.user_id,
        affiliations: request.affiliations,
    };
    let tenant = batch_tenant_context(
        identity,
        state.central_tenant.as_ref(),
        request.records.iter().map(|r| &r.tenant_id),
        state.collaborators.fetcher.as_ref(),
    )
    .await
    .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let mut ctx = ProcessingContext::from_config(tenant, state.collaborators.clone());
    if request.preview {
        ctx = ctx.preview_only();
    }

    let report = state
        .service
        .process_batch(entity, request.records, &request.rules, &ctx)
        .await?;
    report.report(&TracingErrorSink);

    Ok(Json(json!({
        "success": true,
        "data": report
    })))
}
