//! Provider status codes and errors.
//!
//! 配送サービスが返すエラーをそのまま表す型です。ドメインエラーへの
//! 変換は `errors::TaskQueueError::from_api` が行います。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status codes reported by the dispatch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl ApiCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiCode::Cancelled => "CANCELLED",
            ApiCode::Unknown => "UNKNOWN",
            ApiCode::InvalidArgument => "INVALID_ARGUMENT",
            ApiCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ApiCode::NotFound => "NOT_FOUND",
            ApiCode::AlreadyExists => "ALREADY_EXISTS",
            ApiCode::PermissionDenied => "PERMISSION_DENIED",
            ApiCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ApiCode::FailedPrecondition => "FAILED_PRECONDITION",
            ApiCode::Aborted => "ABORTED",
            ApiCode::OutOfRange => "OUT_OF_RANGE",
            ApiCode::Unimplemented => "UNIMPLEMENTED",
            ApiCode::Internal => "INTERNAL",
            ApiCode::Unavailable => "UNAVAILABLE",
            ApiCode::DataLoss => "DATA_LOSS",
            ApiCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for ApiCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a `CloudTasksClient` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ApiCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_services_wire_names() {
        assert_eq!(ApiCode::AlreadyExists.to_string(), "ALREADY_EXISTS");
        let json = serde_json::to_string(&ApiCode::FailedPrecondition).unwrap();
        assert_eq!(json, "\"FAILED_PRECONDITION\"");
        let err = ApiError::new(ApiCode::NotFound, "Queue does not exist");
        assert_eq!(err.to_string(), "NOT_FOUND: Queue does not exist");
    }
}
