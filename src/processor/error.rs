use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{UpdateActionType, UpdateOptionType};

/// Message reported once for a record whose rules left it unchanged
pub const NO_CHANGE_MESSAGE: &str = "No change in value required";

/// Failure of a single action against a single record
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Rule is not applicable to this record in its current state
    #[error("{0}")]
    Validation(String),

    #[error("Combination {option} and {action} isn't supported yet")]
    UnsupportedCombination {
        option: UpdateOptionType,
        action: UpdateActionType,
    },

    /// Reference data could not be resolved
    #[error("{0}")]
    ExternalLookup(String),

    /// Tenant switch or cross-tenant check failed
    #[error("{0}")]
    Permission(String),

    /// A collaborator failed to store a record
    #[error("Failed to persist record: {0}")]
    Persistence(String),
}

impl RuleError {
    pub fn validation(message: impl Into<String>) -> Self {
        RuleError::Validation(message.into())
    }

    pub fn unsupported(option: UpdateOptionType, action: UpdateActionType) -> Self {
        RuleError::UnsupportedCombination { option, action }
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        RuleError::ExternalLookup(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        RuleError::Permission(message.into())
    }

    pub fn severity(&self) -> Severity {
        match self {
            RuleError::Validation(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Permission failures skip the rest of the rule's actions for the record
    pub fn aborts_rule(&self) -> bool {
        matches!(self, RuleError::Permission(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            RuleError::Validation(_) => "VALIDATION_ERROR",
            RuleError::UnsupportedCombination { .. } => "UNSUPPORTED_COMBINATION",
            RuleError::ExternalLookup(_) => "EXTERNAL_LOOKUP_ERROR",
            RuleError::Permission(_) => "PERMISSION_ERROR",
            RuleError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Error,
}

/// One reportable failure, keyed by the record's business identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub operation_id: Uuid,
    pub identifier: String,
    pub message: String,
    pub severity: Severity,
}

impl ErrorEntry {
    pub fn new(
        operation_id: Uuid,
        identifier: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            operation_id,
            identifier: identifier.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn from_rule_error(operation_id: Uuid, identifier: &str, error: &RuleError) -> Self {
        Self::new(operation_id, identifier, error.to_string(), error.severity())
    }

    pub fn no_change(operation_id: Uuid, identifier: &str) -> Self {
        Self::new(operation_id, identifier, NO_CHANGE_MESSAGE, Severity::Warning)
    }

    pub fn is_no_change(&self) -> bool {
        self.severity == Severity::Warning && self.message == NO_CHANGE_MESSAGE
    }
}
