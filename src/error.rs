//! Error types for cloudmail-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (link resolution, transfer agent)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for cloudmail-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cloudmail-dl
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
        /// The configuration key that caused the error (e.g., "proxy")
        key: Option<String>,
    },

    /// Share link resolution failed
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// External transfer agent failed
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// Operation was canceled through its cancellation token
    #[error("operation canceled")]
    Canceled,

    /// Job not found
    #[error("job not found: {0}")]
    NotFound(String),

    /// Caller supplied an unusable argument (empty link list, etc.)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Share link resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Input does not contain a `/public/<segment>/<segment>` path
    #[error("invalid public link: {link}")]
    InvalidLink {
        /// The rejected input
        link: String,
    },

    /// The share page did not contain a page session token
    #[error("page session not found for {link}")]
    SessionNotFound {
        /// The share link whose page was scanned
        link: String,
    },

    /// The dispatcher response carried no transfer base URL
    #[error("transfer base URL not found for {link}")]
    BaseUrlNotFound {
        /// The share link being resolved
        link: String,
    },

    /// Network failure or non-success HTTP status
    #[error("request to {url} failed: {reason}")]
    Transfer {
        /// The requested URL
        url: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Failure description
        reason: String,
    },

    /// Response body could not be decoded
    #[error("malformed {endpoint} response: {reason}")]
    Decode {
        /// Which API endpoint produced the body ("dispatcher", "folder")
        endpoint: String,
        /// Decoder message
        reason: String,
    },
}

/// External transfer agent errors
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent binary could not be started
    #[error("failed to launch {binary}: {reason}")]
    Launch {
        /// Binary that was executed
        binary: String,
        /// Spawn failure description
        reason: String,
    },

    /// The agent exited unsuccessfully
    #[error("agent exited with {}", describe_exit(.code))]
    Exit {
        /// Exit code, absent when terminated by a signal
        code: Option<i32>,
    },

    /// Writing the transfer manifest failed
    #[error("failed to write transfer manifest: {reason}")]
    Manifest {
        /// The underlying I/O failure
        reason: String,
    },

    /// Resolution produced no files to transfer
    #[error("empty file list")]
    EmptyManifest,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
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
///     "code": "not_found",
///     "message": "job not found: job-1700000000-000001"
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
    /// Machine-readable error code (e.g., "not_found", "invalid_link")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
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

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
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
            Error::InvalidArgument(_) => 400,
            Error::Resolve(ResolveError::InvalidLink { .. }) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict - the operation was stopped underneath the request
            Error::Canceled => 409,

            // 502 Bad Gateway - the share host misbehaved
            Error::Resolve(ResolveError::SessionNotFound { .. }) => 502,
            Error::Resolve(ResolveError::BaseUrlNotFound { .. }) => 502,
            Error::Resolve(ResolveError::Transfer { .. }) => 502,
            Error::Resolve(ResolveError::Decode { .. }) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::Agent(AgentError::Launch { .. }) => 503,

            // 500 Internal Server Error - Server-side issues
            Error::Agent(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Resolve(e) => match e {
                ResolveError::InvalidLink { .. } => "invalid_link",
                ResolveError::SessionNotFound { .. } => "session_not_found",
                ResolveError::BaseUrlNotFound { .. } => "base_url_not_found",
                ResolveError::Transfer { .. } => "transfer_error",
                ResolveError::Decode { .. } => "decode_error",
            },
            Error::Agent(e) => match e {
                AgentError::Launch { .. } => "agent_launch_failed",
                AgentError::Exit { .. } => "agent_exit_failed",
                AgentError::Manifest { .. } => "manifest_error",
                AgentError::EmptyManifest => "empty_file_list",
            },
            Error::Canceled => "canceled",
            Error::NotFound(_) => "not_found",
            Error::InvalidArgument(_) => "validation_error",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Resolve(ResolveError::InvalidLink { link })
            | Error::Resolve(ResolveError::SessionNotFound { link })
            | Error::Resolve(ResolveError::BaseUrlNotFound { link }) => Some(serde_json::json!({
                "link": link,
            })),
            Error::Resolve(ResolveError::Transfer { url, status, .. }) => {
                Some(serde_json::json!({
                    "url": url,
                    "status": status,
                }))
            }
            Error::Agent(AgentError::Exit { code }) => Some(serde_json::json!({
                "exit_code": code,
            })),
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
