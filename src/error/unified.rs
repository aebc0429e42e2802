//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};

/// Machine-readable error code reported by the assistants API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidApiKey,
    InsufficientQuota,
    RateLimitExceeded,
    InvalidRequest,
    ActiveRunExists,
    NotFound,
    ServerError,
    Unknown,
}

impl ErrorCode {
    /// Map the `error.code` / `error.type` strings of an API error body.
    pub fn from_provider(code: &str) -> Self {
        match code {
            "invalid_api_key" => Self::InvalidApiKey,
            "insufficient_quota" => Self::InsufficientQuota,
            "rate_limit_exceeded" => Self::RateLimitExceeded,
            "invalid_request_error" => Self::InvalidRequest,
            "not_found" | "not_found_error" => Self::NotFound,
            "server_error" => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    Run,
    Unknown,
}

/// Structured details returned by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: Option<ErrorCode>,
    pub provider_code: Option<String>,
    pub param: Option<String>,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    CheckToolImplementation,
    RetryTurn,
    ContactSupport,
}
