use serde::{Deserialize, Serialize};

use super::holdings::ElectronicAccess;
use super::note::{CirculationNote, Note, NoteBearing};

/// Reference embedded by id and display name (locations, loan types)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamedReference {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl NamedReference {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemStatus {
    pub name: String,
}

impl ItemStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default)]
    pub holdings_record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_suppress: Option<bool>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_location: Option<NamedReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_location: Option<NamedReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_location: Option<NamedReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_loan_type: Option<NamedReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_loan_type: Option<NamedReference>,
    #[serde(default)]
    pub administrative_notes: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub circulation_notes: Vec<CirculationNote>,
    #[serde(default)]
    pub electronic_access: Vec<ElectronicAccess>,
    #[serde(default)]
    pub statistical_code_ids: Vec<String>,
}

impl NoteBearing for Item {
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

    fn circulation_notes(&self) -> &[CirculationNote] {
        &self.circulation_notes
    }

    fn set_circulation_notes(&mut self, notes: Vec<CirculationNote>) {
        self.circulation_notes = notes;
    }

    fn supports_circulation_notes(&self) -> bool {
        true
    }
}
