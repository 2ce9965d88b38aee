//! # API Error Type
//!
//! Unified error type for back office commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Filamento                              │
//! │                                                                         │
//! │  Screen                      Command                                    │
//! │  ──────                      ───────                                    │
//! │                                                                         │
//! │  register_sale(...)                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │                                                                  │  │
//! │  │  No session?  ─── SessionManager ──────────► SESSION_EXPIRED     │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad input?   ─── ValidationError ─────────► VALIDATION_ERROR    │  │
//! │  │               ─── CoreError::InsufficientStock ► INSUFFICIENT_STOCK│ │
//! │  │         │                                                        │  │
//! │  │         ▼     (no store call has happened yet)                   │  │
//! │  │  Store fails? ─── DbError ─────────────────► DATABASE_ERROR /    │  │
//! │  │                                              NOT_FOUND           │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries a machine-readable `code` and a human-readable
//! `message`, serialized as `{ "code": "...", "message": "..." }`.

use serde::Serialize;

use filamento_core::{CoreError, ValidationError};
use filamento_db::{AuthError, DbError};

/// Error returned from back office commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Maceta: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Sale quantity above the product's stock
    InsufficientStock,

    /// Store operation failed
    DatabaseError,

    /// No valid session at operation start
    SessionExpired,

    /// Wrong credentials or rejected sign-up
    AuthFailed,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// The session is gone; the user must sign in again.
    pub fn session_expired() -> Self {
        ApiError::new(
            ErrorCode::SessionExpired,
            "Your session has expired. Please sign in again.",
        )
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::StockConflict {
                product_id,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} requested",
                    product_id, requested
                ),
            ),
            e @ DbError::StockOverflow { .. } => ApiError::validation(e.to_string()),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::ProductInactive(id) => {
                ApiError::validation(format!("Product {} is no longer active", id))
            }
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts session provider errors to API errors.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            e @ (AuthError::InvalidCredentials
            | AuthError::InactiveUser
            | AuthError::EmailTaken(_)) => ApiError::new(ErrorCode::AuthFailed, e.to_string()),
            AuthError::InvalidToken(_) => ApiError::session_expired(),
            AuthError::Validation(e) => e.into(),
            AuthError::Store(e) => e.into(),
            AuthError::Hash(e) => {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal("Could not process credentials")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_code_and_message() {
        let err = ApiError::session_expired();
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "SESSION_EXPIRED");
        assert!(json["message"].as_str().unwrap().contains("sign in"));
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        let stock: ApiError = CoreError::InsufficientStock {
            product: "Maceta".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert_eq!(stock.code, ErrorCode::InsufficientStock);
        assert!(stock.message.contains("Maceta"));

        let validation: ApiError = CoreError::Validation(ValidationError::required("name")).into();
        assert_eq!(validation.code, ErrorCode::ValidationError);
        assert_eq!(validation.message, "name is required");
    }

    #[test]
    fn test_db_errors_hide_details() {
        let err: ApiError = DbError::QueryFailed("no such table: products".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("products"));

        let missing: ApiError = DbError::not_found("Material", "m-1").into();
        assert_eq!(missing.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_auth_errors() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(err.code, ErrorCode::AuthFailed);

        let err: ApiError = AuthError::EmailTaken("ana@taller3d.cl".to_string()).into();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }
}
