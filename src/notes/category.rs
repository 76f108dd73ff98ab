use std::fmt;

use crate::model::CirculationNoteType;
use crate::processor::error::RuleError;
use crate::rules::{keys, Action};
use crate::types::UpdateOptionType;

/// Physical note collection plus the sub-type that selects entries within it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteCategory {
    /// Plain strings without type or staff-only metadata
    Administrative,
    /// Typed notes of one note type id
    Typed(String),
    Circulation(CirculationNoteType),
}

impl NoteCategory {
    /// Category a note option edits; typed options read their type id from the action
    pub fn from_option(option: UpdateOptionType, action: &Action) -> Result<Self, RuleError> {
        match option {
            UpdateOptionType::AdministrativeNote => Ok(NoteCategory::Administrative),
            UpdateOptionType::CheckInNote => Ok(NoteCategory::Circulation(CirculationNoteType::CheckIn)),
            UpdateOptionType::CheckOutNote => Ok(NoteCategory::Circulation(CirculationNoteType::CheckOut)),
            UpdateOptionType::ItemNote
            | UpdateOptionType::HoldingsNote
            | UpdateOptionType::InstanceNote => {
                let key = type_parameter_key(option).unwrap_or(keys::ITEM_NOTE_TYPE_ID);
                action
                    .parameter(key)
                    .filter(|id| !id.trim().is_empty())
                    .map(|id| NoteCategory::Typed(id.to_string()))
                    .ok_or_else(|| RuleError::validation(format!("Parameter {} is required for {}", key, option)))
            }
            other => Err(RuleError::validation(format!("{} is not a note option", other))),
        }
    }

    /// Destination of a CHANGE_TYPE action: a category name or a note type id
    pub fn destination(action: &Action) -> Result<Self, RuleError> {
        match action.updated_value() {
            Some("ADMINISTRATIVE_NOTE") => Ok(NoteCategory::Administrative),
            Some("CHECK_IN_NOTE") => Ok(NoteCategory::Circulation(CirculationNoteType::CheckIn)),
            Some("CHECK_OUT_NOTE") => Ok(NoteCategory::Circulation(CirculationNoteType::CheckOut)),
            Some(type_id) => Ok(NoteCategory::Typed(type_id.to_string())),
            None => Err(RuleError::validation("Destination note type is required")),
        }
    }

    pub fn is_administrative(&self) -> bool {
        matches!(self, NoteCategory::Administrative)
    }

    pub fn type_id(&self) -> Option<&str> {
        match self {
            NoteCategory::Typed(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteCategory::Administrative => f.write_str("administrative note"),
            NoteCategory::Typed(id) => write!(f, "note type {}", id),
            NoteCategory::Circulation(t) => write!(f, "{} note", t),
        }
    }
}

/// Parameter key carrying the note type id for a typed note option
pub fn type_parameter_key(option: UpdateOptionType) -> Option<&'static str> {
    match option {
        UpdateOptionType::ItemNote => Some(keys::ITEM_NOTE_TYPE_ID),
        UpdateOptionType::HoldingsNote => Some(keys::HOLDINGS_NOTE_TYPE_ID),
        UpdateOptionType::InstanceNote => Some(keys::INSTANCE_NOTE_TYPE_ID),
        _ => None,
    }
}
