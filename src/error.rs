// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::processor::{BatchError, SupportedCombination};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 422 Unprocessable Entity (rules reference combinations no processor supports)
    UnsupportedRules {
        message: String,
        unsupported: Vec<SupportedCombination>,
    },

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::UnsupportedRules { .. } => 422,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::UnsupportedRules { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UnsupportedRules { message, unsupported } => json!({
                "error": true,
                "message": message,
                "code": self.error_code(),
                "unsupported": unsupported
            }),
            _ => json!({
                "error": true,
                "message": self.message(),
                "code": self.error_code()
            }),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::UnsupportedRules { .. } => "UNSUPPORTED_COMBINATION",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unsupported_rules(unsupported: Vec<SupportedCombination>) -> Self {
        let pairs: Vec<String> = unsupported
            .iter()
            .map(|c| format!("{} {}", c.option, c.action))
            .collect();
        ApiError::UnsupportedRules {
            message: format!("Unsupported rule combinations: {}", pairs.join(", ")),
            unsupported,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert other error types to ApiError
impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::UnknownEntity(entity) => ApiError::not_found(format!("No processor registered for {}", entity)),
            BatchError::InvalidRecord { .. } => ApiError::invalid_json(err.to_string()),
            BatchError::Serialization { .. } | BatchError::Dispatch(_) => {
                // Log the real error but return generic message
                tracing::error!("Bulk edit failure: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

    #[test]
    fn unknown_entity_is_not_found() {
        let err: ApiError = BatchError::UnknownEntity(EntityType::User).into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_json()["code"], "NOT_FOUND");
    }

    #[test]
    fn unsupported_rules_list_pairs() {
        let err = ApiError::unsupported_rules(vec![SupportedCombination {
            option: UpdateOptionType::Status,
            action: UpdateActionType::ClearField,
        }]);
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.message(), "Unsupported rule combinations: STATUS CLEAR_FIELD");
    }
}
