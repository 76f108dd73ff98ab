use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{parse_entity, AppState};
use crate::error::ApiError;
use crate::processor::SupportedCombination;
use crate::types::{UpdateActionType, UpdateOptionType};

#[derive(Debug, Serialize)]
pub struct OptionActions {
    pub option: UpdateOptionType,
    pub actions: Vec<UpdateActionType>,
}

/// Group combinations by option, keeping first-seen option order
pub fn group_by_option(combinations: &[SupportedCombination]) -> Vec<OptionActions> {
    let mut grouped: Vec<OptionActions> = Vec::new();
    for combination in combinations {
        match grouped.iter_mut().find(|g| g.option == combination.option) {
            Some(group) => group.actions.push(combination.action),
            None => grouped.push(OptionActions {
                option: combination.option,
                actions: vec![combination.action],
            }),
        }
    }
    grouped
}

/// GET /api/bulk-edit/:entity/options - Supported options and their actions
pub async fn get(State(state): State<AppState>, Path(entity): Path<String>) -> Result<Json<Value>, ApiError> {
    let entity = parse_entity(&entity)?;
    let combinations = state.service.registry().options(entity)?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "entityType": entity,
            "options": group_by_option(&combinations)
        }
    })))
}
