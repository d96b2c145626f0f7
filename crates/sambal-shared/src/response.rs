//! JSON response envelopes: `{success, message, ...}`.

use serde::Serialize;

/// Successful response: `success: true`, a message, and any extra fields of `T` inlined.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Failure envelope: `success: false` plus a user-facing message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,

    /// Field-level validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,

    /// Seconds until a rate-limited client may retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    /// Request ID for debugging purposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Shown for anything the caller cannot fix.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            retry_after: None,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    pub fn validation(errors: Vec<String>) -> Self {
        let message = errors
            .first()
            .cloned()
            .unwrap_or_else(|| "Invalid request".to_string());
        Self {
            errors: Some(errors),
            ..Self::new(message)
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after: Some(retry_after_secs),
            ..Self::new(format!(
                "Rate limit exceeded. Please try again in {} seconds.",
                retry_after_secs
            ))
        }
    }

    pub fn internal_error() -> Self {
        Self::new(GENERIC_FAILURE)
    }
}
