use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde_json::{json, Value};

use super::{parse_entity, AppState};
use crate::error::ApiError;
use crate::rules::RuleCollection;

/// POST /api/bulk-edit/:entity/check - Report rule combinations the processor cannot apply
pub async fn post(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    body: Result<Json<RuleCollection>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let entity = parse_entity(&entity)?;
    let Json(rules) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let unsupported = state.service.registry().check_rules(entity, &rules)?;
    tracing::debug!("Checked {} {} rules: {} unsupported", rules.len(), entity, unsupported.len());

    Ok(Json(json!({
        "success": true,
        "data": {
            "entityType": entity,
            "supported": unsupported.is_empty(),
            "unsupported": unsupported
        }
    })))
}
