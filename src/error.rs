//! Error types for media-depot
//!
//! This module provides comprehensive error handling for the library, including:
//! - Domain-specific error types (task lifecycle, provider, artifact validation)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//! - Context information (task id, status, retry delay, etc.)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{TaskId, TaskStatus};

/// Result type alias for media-depot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-depot
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "storage_dir")
        key: Option<String>,
    },

    /// Task not found in the registry
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was not found
        id: TaskId,
    },

    /// Artifact requested before the task reached Completed
    #[error("file not ready, current status: {status}")]
    NotReady {
        /// The task whose artifact was requested
        id: TaskId,
        /// The status that prevented delivery
        status: TaskStatus,
    },

    /// Completed task whose artifact is gone from storage
    #[error("artifact for task {id} is missing from storage")]
    MissingArtifact {
        /// The task whose artifact disappeared
        id: TaskId,
    },

    /// Completed task whose artifact is empty or unreadable
    #[error("artifact for task {id} is empty or invalid")]
    CorruptArtifact {
        /// The task whose artifact failed validation
        id: TaskId,
    },

    /// Requested status change violates the task state machine
    #[error("cannot move task {id} from {from} to {to}")]
    InvalidTransition {
        /// The task whose transition was refused
        id: TaskId,
        /// Status the task currently holds
        from: TaskStatus,
        /// Status the caller asked for
        to: TaskStatus,
    },

    /// Priority outside the accepted 1..=5 range
    #[error("invalid priority {value}: must be between 1 and 5")]
    InvalidPriority {
        /// The rejected priority value
        value: u8,
    },

    /// Media provider error
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by a [`MediaProvider`](crate::provider::MediaProvider)
/// implementation
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Referenced message does not exist or carries no downloadable media
    #[error("message not found or does not contain media")]
    MissingMedia,

    /// Provider asked us to back off for a specific duration
    #[error("rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited {
        /// How long the provider told us to wait before retrying
        retry_after: Duration,
    },

    /// Transient transport failure (connection reset, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// Permanent refusal (revoked access, invalid peer, ...)
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// Whether a retry of the same call could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Transport(_)
        )
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 7a1e... not found",
///     "details": {
///       "task_id": "7a1e..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    ///
    /// This can include fields like task_id, current status, retry delays, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create a "conflict" error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "service unavailable" error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::NotReady { .. } => 400,
            Error::InvalidPriority { .. } => 400,

            // 404 Not Found
            Error::NotFound { .. } => 404,
            Error::Provider(ProviderError::MissingMedia) => 404,

            // 409 Conflict - state machine refused the change
            Error::InvalidTransition { .. } => 409,

            // 429 Too Many Requests - provider back-pressure
            Error::Provider(ProviderError::RateLimited { .. }) => 429,

            // 500 Internal Server Error - Server-side issues
            Error::MissingArtifact { .. } => 500,
            Error::CorruptArtifact { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Provider(ProviderError::Transport(_)) => 502,
            Error::Provider(ProviderError::Rejected(_)) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NotFound { .. } => "task_not_found",
            Error::NotReady { .. } => "not_ready",
            Error::MissingArtifact { .. } => "missing_artifact",
            Error::CorruptArtifact { .. } => "corrupt_artifact",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::InvalidPriority { .. } => "invalid_priority",
            Error::Provider(e) => match e {
                ProviderError::MissingMedia => "media_not_found",
                ProviderError::RateLimited { .. } => "rate_limited",
                ProviderError::Transport(_) => "provider_transport_error",
                ProviderError::Rejected(_) => "provider_rejected",
            },
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::NotFound { id } => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::NotReady { id, status } => Some(serde_json::json!({
                "task_id": id,
                "current_status": status,
            })),
            Error::MissingArtifact { id } | Error::CorruptArtifact { id } => {
                Some(serde_json::json!({
                    "task_id": id,
                }))
            }
            Error::InvalidTransition { id, from, to } => Some(serde_json::json!({
                "task_id": id,
                "from": from,
                "to": to,
            })),
            Error::InvalidPriority { value } => Some(serde_json::json!({
                "value": value,
                "min": crate::types::Priority::MIN,
                "max": crate::types::Priority::MAX,
            })),
            Error::Provider(ProviderError::RateLimited { retry_after }) => {
                Some(serde_json::json!({
                    "retry_after_seconds": retry_after.as_secs(),
                }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn task_id() -> TaskId {
        TaskId::new()
    }

    // -----------------------------------------------------------------------
    // Helpers: construct every Error variant for status/error_code tests
    // -----------------------------------------------------------------------

    /// Returns a vec of (Error, expected_status_code, expected_error_code) for
    /// every reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("storage_dir".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::NotReady {
                    id: task_id(),
                    status: TaskStatus::Processing,
                },
                400,
                "not_ready",
            ),
            (
                Error::InvalidPriority { value: 9 },
                400,
                "invalid_priority",
            ),
            (Error::NotFound { id: task_id() }, 404, "task_not_found"),
            (
                Error::Provider(ProviderError::MissingMedia),
                404,
                "media_not_found",
            ),
            (
                Error::InvalidTransition {
                    id: task_id(),
                    from: TaskStatus::Expired,
                    to: TaskStatus::Completed,
                },
                409,
                "invalid_transition",
            ),
            (
                Error::Provider(ProviderError::RateLimited {
                    retry_after: Duration::from_secs(30),
                }),
                429,
                "rate_limited",
            ),
            (
                Error::MissingArtifact { id: task_id() },
                500,
                "missing_artifact",
            ),
            (
                Error::CorruptArtifact { id: task_id() },
                500,
                "corrupt_artifact",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
            (
                Error::Provider(ProviderError::Transport("connection reset".into())),
                502,
                "provider_transport_error",
            ),
            (
                Error::Provider(ProviderError::Rejected("revoked session".into())),
                502,
                "provider_rejected",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    // -----------------------------------------------------------------------
    // 1. Every Error variant -> correct HTTP status code
    // -----------------------------------------------------------------------

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // 2. Every Error variant -> correct machine-readable error code
    // -----------------------------------------------------------------------

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Targeted status code tests for boundary categories to catch regressions
    // if someone moves a variant between match arms.
    // -----------------------------------------------------------------------

    #[test]
    fn not_ready_is_400_not_409() {
        let err = Error::NotReady {
            id: task_id(),
            status: TaskStatus::Pending,
        };
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn missing_and_corrupt_artifacts_are_500_not_404() {
        // Delivery-time validation failures are server faults: the registry
        // said Completed, so the client request itself was well-formed.
        assert_eq!(Error::MissingArtifact { id: task_id() }.status_code(), 500);
        assert_eq!(Error::CorruptArtifact { id: task_id() }.status_code(), 500);
    }

    #[test]
    fn invalid_transition_is_409_conflict() {
        let err = Error::InvalidTransition {
            id: task_id(),
            from: TaskStatus::Completed,
            to: TaskStatus::Processing,
        };
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn rate_limited_is_429() {
        let err = Error::Provider(ProviderError::RateLimited {
            retry_after: Duration::from_secs(5),
        });
        assert_eq!(err.status_code(), 429);
    }

    #[test]
    fn shutting_down_is_503() {
        assert_eq!(Error::ShuttingDown.status_code(), 503);
    }

    // -----------------------------------------------------------------------
    // 3. ProviderError transience classification
    // -----------------------------------------------------------------------

    #[test]
    fn rate_limit_and_transport_are_transient() {
        assert!(
            ProviderError::RateLimited {
                retry_after: Duration::from_secs(1)
            }
            .is_transient()
        );
        assert!(ProviderError::Transport("timeout".into()).is_transient());
    }

    #[test]
    fn missing_media_and_rejection_are_permanent() {
        assert!(!ProviderError::MissingMedia.is_transient());
        assert!(!ProviderError::Rejected("banned".into()).is_transient());
    }

    // -----------------------------------------------------------------------
    // 4. Error -> ApiError preserves structured details
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_from_not_found_has_task_id() {
        let id = task_id();
        let api: ApiError = Error::NotFound { id }.into();

        assert_eq!(api.error.code, "task_not_found");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["task_id"], id.to_string());
    }

    #[test]
    fn api_error_from_not_ready_names_current_status() {
        let id = task_id();
        let err = Error::NotReady {
            id,
            status: TaskStatus::Processing,
        };
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "not_ready");
        assert!(
            api.error.message.contains("processing"),
            "message must name the blocking status, got: {}",
            api.error.message
        );
        let details = api.error.details.expect("should have details");
        assert_eq!(details["current_status"], "processing");
    }

    #[test]
    fn api_error_from_invalid_transition_has_from_and_to() {
        let id = task_id();
        let err = Error::InvalidTransition {
            id,
            from: TaskStatus::Expired,
            to: TaskStatus::Completed,
        };
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "invalid_transition");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["from"], "expired");
        assert_eq!(details["to"], "completed");
    }

    #[test]
    fn api_error_from_invalid_priority_has_bounds() {
        let api: ApiError = Error::InvalidPriority { value: 0 }.into();

        assert_eq!(api.error.code, "invalid_priority");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["value"], 0);
        assert_eq!(details["min"], 1);
        assert_eq!(details["max"], 5);
    }

    #[test]
    fn api_error_from_rate_limited_has_retry_delay() {
        let err = Error::Provider(ProviderError::RateLimited {
            retry_after: Duration::from_secs(42),
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "rate_limited");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["retry_after_seconds"], 42);
    }

    #[test]
    fn api_error_from_io_has_no_details() {
        let err = Error::Io(std::io::Error::other("disk fail"));
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "io_error");
        assert!(
            api.error.details.is_none(),
            "Io errors should not have structured details"
        );
    }

    #[test]
    fn api_error_from_shutting_down_has_no_details() {
        let api: ApiError = Error::ShuttingDown.into();

        assert_eq!(api.error.code, "shutting_down");
        assert!(
            api.error.details.is_none(),
            "ShuttingDown should not have structured details"
        );
    }

    // -----------------------------------------------------------------------
    // 5. ApiError factory methods produce correct codes and messages
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_not_found_factory() {
        let api = ApiError::not_found("Task 123");

        assert_eq!(api.error.code, "not_found");
        assert_eq!(api.error.message, "Task 123 not found");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_validation_factory() {
        let api = ApiError::validation("chat_id is required");

        assert_eq!(api.error.code, "validation_error");
        assert_eq!(api.error.message, "chat_id is required");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_service_unavailable_factory() {
        let api = ApiError::service_unavailable("provider unreachable");

        assert_eq!(api.error.code, "service_unavailable");
        assert_eq!(api.error.message, "provider unreachable");
        assert!(api.error.details.is_none());
    }

    // -----------------------------------------------------------------------
    // 6. ApiError serialization shape
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api = ApiError::new("test_code", "test message");

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        // skip_serializing_if = "Option::is_none" should omit the field entirely
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }

    #[test]
    fn api_error_round_trips_through_json() {
        let original = ApiError::with_details(
            "not_ready",
            "file not ready",
            serde_json::json!({"current_status": "pending"}),
        );

        let json_str = serde_json::to_string(&original).unwrap();
        let deserialized: ApiError = serde_json::from_str(&json_str).unwrap();

        assert_eq!(deserialized.error.code, original.error.code);
        assert_eq!(deserialized.error.message, original.error.message);
        assert_eq!(deserialized.error.details, original.error.details);
    }

    // -----------------------------------------------------------------------
    // Verify that Error -> ApiError preserves the Display message
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::InvalidTransition {
            id: task_id(),
            from: TaskStatus::Failed,
            to: TaskStatus::Processing,
        };
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(
            api.error.message, display_msg,
            "ApiError message should match the Error's Display output"
        );
    }

    #[test]
    fn provider_error_display_includes_retry_delay() {
        let err = ProviderError::RateLimited {
            retry_after: Duration::from_secs(17),
        };
        assert!(
            err.to_string().contains("17"),
            "rate limit message must carry the wait in seconds, got: {err}"
        );
    }
}
