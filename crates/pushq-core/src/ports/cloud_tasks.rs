//! CloudTasksClient port - 外部の配送サービス（Cloud Tasks v2）への入口
//!
//! 通信・認証・ワイヤプロトコルはすべてこの trait の実装側の責務です。
//! このクレートは要求の組み立てと結果の解釈だけを行います。
//!
//! # 実装
//! - **InMemoryCloudTasks**: テスト・デモ用（`impls::inmem_cloud_tasks`）

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::domain::api_error::{ApiCode, ApiError};
use crate::domain::names::{LocationName, QueueName, TaskName};
use crate::domain::HttpMethod;

/// A destination queue as the service describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
}

/// Request shape routed to the App Engine app (URL relative to the app root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEngineHttpRequest {
    pub relative_uri: String,
    pub http_method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// Request shape for an arbitrary absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub url: String,
    pub http_method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRequest {
    AppEngine(AppEngineHttpRequest),
    Http(HttpRequest),
}

impl TaskRequest {
    pub fn http_method(&self) -> HttpMethod {
        match self {
            TaskRequest::AppEngine(r) => r.http_method,
            TaskRequest::Http(r) => r.http_method,
        }
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        match self {
            TaskRequest::AppEngine(r) => &r.headers,
            TaskRequest::Http(r) => &r.headers,
        }
    }

    pub fn body(&self) -> Option<&[u8]> {
        match self {
            TaskRequest::AppEngine(r) => r.body.as_deref(),
            TaskRequest::Http(r) => r.body.as_deref(),
        }
    }
}

/// One task as submitted to `create_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudTask {
    /// Set only for explicitly named tasks; the service assigns one otherwise.
    pub name: Option<TaskName>,
    pub schedule_time: DateTime<Utc>,
    pub request: TaskRequest,
}

/// Response of `create_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub name: String,
    pub schedule_time: DateTime<Utc>,
}

/// CloudTasksClient は配送サービスの queue 管理 API と task 作成 API を抽象化
///
/// # Thread Safety
/// - `Send + Sync` を要求（mapper は複数の queue handle から共有される）
#[async_trait]
pub trait CloudTasksClient: Send + Sync {
    /// List queues under `parent`. `filter` uses the service's `name=<fq>` syntax.
    async fn list_queues(
        &self,
        parent: &LocationName,
        filter: &str,
    ) -> Result<Vec<Queue>, ApiError>;

    async fn create_queue(&self, parent: &LocationName, queue: Queue) -> Result<Queue, ApiError>;

    /// Create one task. Not idempotent unless `task.name` is set.
    async fn create_task(&self, parent: &QueueName, task: CloudTask)
    -> Result<CreatedTask, ApiError>;
}
