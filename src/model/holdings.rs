use serde::{Deserialize, Serialize};

use super::note::{Note, NoteBearing};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectronicAccess {
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials_specification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrid: Option<String>,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_suppress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_location_id: Option<String>,
    #[serde(default)]
    pub administrative_notes: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub electronic_access: Vec<ElectronicAccess>,
    #[serde(default)]
    pub statistical_code_ids: Vec<String>,
}

impl Holdings {
    /// Effective location is the temporary location when set, else the permanent one
    pub fn recompute_effective_location(&mut self) {
        self.effective_location_id = self
            .temporary_location_id
            .clone()
            .or_else(|| self.permanent_location_id.clone());
    }

    pub fn is_suppressed(&self) -> bool {
        self.discovery_suppress.unwrap_or(false)
    }
}

impl NoteBearing for Holdings {
    fn administrative_notes(&self) -> &[String] {
        &self.administrative_notes
    }

    fn set_administrative_notes(&mut self, notes: Vec<String>) {
        self.administrative_notes = notes;
    }

    fn typed_notes(&self) -> &[Note] {
        &self.notes
    }

    fn set_typed_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }
}
