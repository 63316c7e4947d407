//! Errors - エラー型と分類
//!
//! 呼び出し側が区別する必要があるのは 4 種類だけです。
//! - InvalidArgument: 入力検証エラー（リトライ無意味）
//! - Config: project / location が解決できない（起動時の設定ミス）
//! - TaskAlreadyExists: 名前付きタスクの重複（冪等な再投入として扱える）
//! - Service: それ以外のサービス側エラー（コード付きでそのまま返す）

use thiserror::Error;

use super::api_error::{ApiCode, ApiError};

/// Configuration problems detected while building a mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Cloud Tasks project_id not set")]
    MissingProjectId,

    #[error("Cloud Tasks location_id not set")]
    MissingLocationId,

    #[error("no CloudTasksClient supplied")]
    MissingClient,

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Classification of service failures other than a duplicate task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    UnknownQueue,
    PermissionDenied,
    InvalidRequest,
    Transient,
    QuotaExceeded,
    InvalidQueueMode,
    Internal,
    Other,
}

impl From<ApiCode> for ServiceErrorKind {
    fn from(code: ApiCode) -> Self {
        match code {
            ApiCode::NotFound => ServiceErrorKind::UnknownQueue,
            ApiCode::PermissionDenied | ApiCode::Unauthenticated => {
                ServiceErrorKind::PermissionDenied
            }
            ApiCode::InvalidArgument => ServiceErrorKind::InvalidRequest,
            ApiCode::Unavailable | ApiCode::DeadlineExceeded | ApiCode::Aborted => {
                ServiceErrorKind::Transient
            }
            ApiCode::ResourceExhausted => ServiceErrorKind::QuotaExceeded,
            ApiCode::FailedPrecondition => ServiceErrorKind::InvalidQueueMode,
            ApiCode::Internal | ApiCode::DataLoss => ServiceErrorKind::Internal,
            _ => ServiceErrorKind::Other,
        }
    }
}

/// Error surfaced by every public push-queue operation.
#[derive(Debug, Error)]
pub enum TaskQueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The explicit task name is already taken in the queue. The task was
    /// enqueued by this or an earlier call.
    #[error("task already exists: {name}")]
    TaskAlreadyExists { name: String },

    #[error("task queue operation failed: {message} (code: {code})")]
    Service {
        kind: ServiceErrorKind,
        code: ApiCode,
        message: String,
    },
}

impl TaskQueueError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TaskQueueError::InvalidArgument(message.into())
    }

    /// Service kind for `Service` errors.
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            TaskQueueError::Service { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether retrying the same call later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.service_kind(), Some(ServiceErrorKind::Transient))
    }

    /// Translate a provider error. `name` is the task name involved, if any.
    pub fn from_api(err: ApiError, name: Option<&str>) -> Self {
        match err.code {
            ApiCode::AlreadyExists => TaskQueueError::TaskAlreadyExists {
                name: name.map(str::to_string).unwrap_or(err.message),
            },
            code => TaskQueueError::Service {
                kind: code.into(),
                code,
                message: err.message,
            },
        }
    }
}
