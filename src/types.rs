/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record types the engine knows how to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Instance,
    Holdings,
    Item,
    User,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Instance,
        EntityType::Holdings,
        EntityType::Item,
        EntityType::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Instance => "instance",
            EntityType::Holdings => "holdings",
            EntityType::Item => "item",
            EntityType::User => "user",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instance" | "instances" => Ok(EntityType::Instance),
            "holdings" | "holdings_record" | "holdings-record" => Ok(EntityType::Holdings),
            "item" | "items" => Ok(EntityType::Item),
            "user" | "users" => Ok(EntityType::User),
            other => Err(format!("Unknown entity type: {}", other)),
        }
    }
}

/// The logical field or aspect a rule targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateOptionType {
    // Users
    PatronGroup,
    ExpirationDate,
    EmailAddress,

    // Locations and loan types
    PermanentLocation,
    TemporaryLocation,
    PermanentLoanType,
    TemporaryLoanType,

    // Item status
    Status,

    // Flags
    SuppressFromDiscovery,
    StaffSuppress,
    SetRecordsForDelete,

    // Notes
    AdministrativeNote,
    ItemNote,
    CheckInNote,
    CheckOutNote,
    HoldingsNote,
    InstanceNote,

    StatisticalCode,

    // Electronic access
    ElectronicAccessUri,
    ElectronicAccessLinkText,
    ElectronicAccessMaterialsSpecified,
    ElectronicAccessUrlPublicNote,
    ElectronicAccessUrlRelationship,
}

impl UpdateOptionType {
    /// Wire name, e.g. `PERMANENT_LOCATION`
    pub fn as_str(&self) -> &'static str {
        use UpdateOptionType::*;
        match self {
            PatronGroup => "PATRON_GROUP",
            ExpirationDate => "EXPIRATION_DATE",
            EmailAddress => "EMAIL_ADDRESS",
            PermanentLocation => "PERMANENT_LOCATION",
            TemporaryLocation => "TEMPORARY_LOCATION",
            PermanentLoanType => "PERMANENT_LOAN_TYPE",
            TemporaryLoanType => "TEMPORARY_LOAN_TYPE",
            Status => "STATUS",
            SuppressFromDiscovery => "SUPPRESS_FROM_DISCOVERY",
            StaffSuppress => "STAFF_SUPPRESS",
            SetRecordsForDelete => "SET_RECORDS_FOR_DELETE",
            AdministrativeNote => "ADMINISTRATIVE_NOTE",
            ItemNote => "ITEM_NOTE",
            CheckInNote => "CHECK_IN_NOTE",
            CheckOutNote => "CHECK_OUT_NOTE",
            HoldingsNote => "HOLDINGS_NOTE",
            InstanceNote => "INSTANCE_NOTE",
            StatisticalCode => "STATISTICAL_CODE",
            ElectronicAccessUri => "ELECTRONIC_ACCESS_URI",
            ElectronicAccessLinkText => "ELECTRONIC_ACCESS_LINK_TEXT",
            ElectronicAccessMaterialsSpecified => "ELECTRONIC_ACCESS_MATERIALS_SPECIFIED",
            ElectronicAccessUrlPublicNote => "ELECTRONIC_ACCESS_URL_PUBLIC_NOTE",
            ElectronicAccessUrlRelationship => "ELECTRONIC_ACCESS_URL_RELATIONSHIP",
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(
            self,
            UpdateOptionType::AdministrativeNote
                | UpdateOptionType::ItemNote
                | UpdateOptionType::CheckInNote
                | UpdateOptionType::CheckOutNote
                | UpdateOptionType::HoldingsNote
                | UpdateOptionType::InstanceNote
        )
    }

    pub fn is_electronic_access(&self) -> bool {
        matches!(
            self,
            UpdateOptionType::ElectronicAccessUri
                | UpdateOptionType::ElectronicAccessLinkText
                | UpdateOptionType::ElectronicAccessMaterialsSpecified
                | UpdateOptionType::ElectronicAccessUrlPublicNote
                | UpdateOptionType::ElectronicAccessUrlRelationship
        )
    }
}

impl fmt::Display for UpdateOptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit instruction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateActionType {
    ReplaceWith,
    ClearField,
    SetToTrue,
    SetToFalse,
    AddToExisting,
    RemoveAll,
    RemoveSome,
    FindAndRemoveThese,
    FindAndReplace,
    MarkAsStaffOnly,
    RemoveMarkAsStaffOnly,
    ChangeType,
    Duplicate,
    Find,
    Append,
}

impl UpdateActionType {
    pub const ALL: [UpdateActionType; 15] = [
        UpdateActionType::ReplaceWith,
        UpdateActionType::ClearField,
        UpdateActionType::SetToTrue,
        UpdateActionType::SetToFalse,
        UpdateActionType::AddToExisting,
        UpdateActionType::RemoveAll,
        UpdateActionType::RemoveSome,
        UpdateActionType::FindAndRemoveThese,
        UpdateActionType::FindAndReplace,
        UpdateActionType::MarkAsStaffOnly,
        UpdateActionType::RemoveMarkAsStaffOnly,
        UpdateActionType::ChangeType,
        UpdateActionType::Duplicate,
        UpdateActionType::Find,
        UpdateActionType::Append,
    ];

    pub fn as_str(&self) -> &'static str {
        use UpdateActionType::*;
        match self {
            ReplaceWith => "REPLACE_WITH",
            ClearField => "CLEAR_FIELD",
            SetToTrue => "SET_TO_TRUE",
            SetToFalse => "SET_TO_FALSE",
            AddToExisting => "ADD_TO_EXISTING",
            RemoveAll => "REMOVE_ALL",
            RemoveSome => "REMOVE_SOME",
            FindAndRemoveThese => "FIND_AND_REMOVE_THESE",
            FindAndReplace => "FIND_AND_REPLACE",
            MarkAsStaffOnly => "MARK_AS_STAFF_ONLY",
            RemoveMarkAsStaffOnly => "REMOVE_MARK_AS_STAFF_ONLY",
            ChangeType => "CHANGE_TYPE",
            Duplicate => "DUPLICATE",
            Find => "FIND",
            Append => "APPEND",
        }
    }
}

impl fmt::Display for UpdateActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a tenant in the shared catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
