//! Error types module
//!
//! `QuotaRejection` is the typed result of a refused attachment change. It is a
//! value returned to the calling workflow, never a fault: no rejection ends the
//! upload session.
//!
//! `AppError` unifies everything else the client can run into (API failures,
//! invalid input, configuration) and self-describes how it should be shown to
//! the user through `ErrorMetadata`.

use std::io;

use crate::models::ServiceId;
use crate::validation::FieldError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like quota limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error presentation
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same action may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Quota dimension that hit its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaResource {
    Files,
}

impl std::fmt::Display for QuotaResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaResource::Files => write!(f, "files"),
        }
    }
}

/// Why an attachment change or submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuotaRejection {
    #[error("Limit reached: at most {limit} {resource} per upload")]
    LimitReached { resource: QuotaResource, limit: usize },

    #[error("File too large: {name} is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Aggregate limit exceeded: {attempted} bytes would exceed {limit} bytes")]
    AggregateLimitExceeded { attempted: u64, limit: u64 },

    #[error("Duplicate file: {name} is already attached to service {service_id}")]
    DuplicateFile { service_id: ServiceId, name: String },

    #[error("Empty submission: no files attached")]
    EmptySubmission,
}

impl QuotaRejection {
    /// Short title for an alert dialog.
    pub fn title(&self) -> &'static str {
        match self {
            QuotaRejection::LimitReached { .. } => "File Limit Exceeded",
            QuotaRejection::FileTooLarge { .. } => "File Too Large",
            QuotaRejection::AggregateLimitExceeded { .. } => "Total Size Exceeded",
            QuotaRejection::DuplicateFile { .. } => "Duplicate File",
            QuotaRejection::EmptySubmission => "No files selected",
        }
    }
}

impl ErrorMetadata for QuotaRejection {
    fn error_code(&self) -> &'static str {
        match self {
            QuotaRejection::LimitReached { .. } => "LIMIT_REACHED",
            QuotaRejection::FileTooLarge { .. } => "FILE_TOO_LARGE",
            QuotaRejection::AggregateLimitExceeded { .. } => "AGGREGATE_LIMIT_EXCEEDED",
            QuotaRejection::DuplicateFile { .. } => "DUPLICATE_FILE",
            QuotaRejection::EmptySubmission => "EMPTY_SUBMISSION",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            QuotaRejection::LimitReached { .. } => Some("Remove a file before adding another"),
            QuotaRejection::FileTooLarge { .. } => Some("Pick a smaller file"),
            QuotaRejection::AggregateLimitExceeded { .. } => {
                Some("Remove a file or pick a smaller one")
            }
            QuotaRejection::DuplicateFile { .. } => Some("Pick a different file"),
            QuotaRejection::EmptySubmission => Some("Attach at least one file"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            QuotaRejection::LimitReached { limit, .. } => {
                format!("You can only select up to {} files.", limit)
            }
            QuotaRejection::FileTooLarge { name, limit, .. } => {
                format!("{} exceeds the {} limit per file.", name, format_bytes(*limit))
            }
            QuotaRejection::AggregateLimitExceeded { limit, .. } => {
                format!("Selected files cannot exceed {} in total.", format_bytes(*limit))
            }
            QuotaRejection::DuplicateFile { name, .. } => {
                format!("{} is already selected for this service.", name)
            }
            QuotaRejection::EmptySubmission => {
                "Please select at least one file to upload.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Render a byte count the way the upload screen states its limits ("50MB").
pub fn format_bytes(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Quota(#[from] QuotaRejection),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::Validation(vec![err])
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(FieldError::from_validation_errors(&err))
    }
}

impl AppError {
    /// Classify a non-success HTTP status from the backend.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => AppError::Unauthorized(message),
            404 => AppError::NotFound(message),
            _ => AppError::Api { status, message },
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Api { status, .. } if *status >= 500 => (
            "SERVER_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Api { .. } => (
            "REQUEST_REJECTED",
            false,
            Some("Check the request and try again"),
            LogLevel::Warn,
        ),
        AppError::Network(_) => (
            "NETWORK_ERROR",
            true,
            Some("Check your connection and retry"),
            LogLevel::Warn,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the entered values and try again"),
            LogLevel::Debug,
        ),
        AppError::Validation(_) => (
            "VALIDATION_FAILED",
            false,
            Some("Correct the highlighted fields"),
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            "UNAUTHORIZED",
            false,
            Some("Sign in again"),
            LogLevel::Debug,
        ),
        AppError::Quota(rejection) => (
            rejection.error_code(),
            rejection.is_recoverable(),
            rejection.suggested_action(),
            rejection.log_level(),
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check environment configuration"),
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Api { status, .. } if *status >= 500 => {
                "The server could not process the request".to_string()
            }
            AppError::Api { message, .. } => message.clone(),
            AppError::Network(_) => "Could not reach the server".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Validation(errors) => join_field_errors(errors),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Quota(rejection) => rejection.client_message(),
            AppError::Config(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
