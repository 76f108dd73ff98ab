use serde::{Deserialize, Serialize};

use super::note::{Note, NoteBearing};

/// Instance source owned by an external cataloging format
pub const MARC_SOURCE: &str = "MARC";

/// Prefix the catalog adds to the source of instances shared across a consortium
pub const CONSORTIUM_SOURCE_PREFIX: &str = "CONSORTIUM-";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrid: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_suppress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_suppress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub administrative_notes: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub statistical_code_ids: Vec<String>,
}

impl Instance {
    /// Source with any consortium prefix removed
    pub fn base_source(&self) -> &str {
        self.source
            .strip_prefix(CONSORTIUM_SOURCE_PREFIX)
            .unwrap_or(&self.source)
    }

    pub fn is_marc(&self) -> bool {
        self.base_source().eq_ignore_ascii_case(MARC_SOURCE)
    }

    /// Shared instances live in the central tenant with holdings in member tenants
    pub fn is_shared(&self) -> bool {
        self.source.starts_with(CONSORTIUM_SOURCE_PREFIX)
    }
}

impl NoteBearing for Instance {
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
