use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed note shared by items, holdings and instances.
///
/// The type id serializes as `noteTypeId` and accepts the per-record field names
/// used by the catalog services on input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(
        default,
        alias = "itemNoteTypeId",
        alias = "holdingsNoteTypeId",
        alias = "instanceNoteTypeId"
    )]
    pub note_type_id: Option<String>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub staff_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl Note {
    pub fn new(note_type_id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            note_type_id: Some(note_type_id.into()),
            note: note.into(),
            staff_only: false,
            tenant_id: None,
        }
    }

    pub fn staff_only(mut self, staff_only: bool) -> Self {
        self.staff_only = staff_only;
        self
    }

    pub fn has_type(&self, type_id: &str) -> bool {
        self.note_type_id.as_deref() == Some(type_id)
    }
}

/// Check in / check out sub-type of a circulation note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CirculationNoteType {
    #[serde(rename = "Check in")]
    CheckIn,
    #[serde(rename = "Check out")]
    CheckOut,
}

impl CirculationNoteType {
    pub fn opposite(&self) -> Self {
        match self {
            CirculationNoteType::CheckIn => CirculationNoteType::CheckOut,
            CirculationNoteType::CheckOut => CirculationNoteType::CheckIn,
        }
    }
}

impl fmt::Display for CirculationNoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CirculationNoteType::CheckIn => f.write_str("Check in"),
            CirculationNoteType::CheckOut => f.write_str("Check out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CirculationNote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub note_type: CirculationNoteType,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub staff_only: bool,
}

impl CirculationNote {
    pub fn new(note_type: CirculationNoteType, note: impl Into<String>) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            note_type,
            note: note.into(),
            staff_only: false,
        }
    }
}

/// Uniform access to the note collections a record carries.
///
/// Setters take ownership of a freshly built list; callers never edit the
/// borrowed slices in place.
pub trait NoteBearing {
    fn administrative_notes(&self) -> &[String];
    fn set_administrative_notes(&mut self, notes: Vec<String>);

    fn typed_notes(&self) -> &[Note];
    fn set_typed_notes(&mut self, notes: Vec<Note>);

    fn circulation_notes(&self) -> &[CirculationNote] {
        &[]
    }

    fn set_circulation_notes(&mut self, _notes: Vec<CirculationNote>) {}

    /// Whether the record has a circulation note list at all
    fn supports_circulation_notes(&self) -> bool {
        false
    }

    /// Total number of notes across every category
    fn note_count(&self) -> usize {
        self.administrative_notes().len() + self.typed_notes().len() + self.circulation_notes().len()
    }
}
