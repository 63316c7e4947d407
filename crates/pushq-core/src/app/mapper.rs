//! CloudTasksMapper - PushTask を配送サービスの要求に変換して送信
//!
//! # 流れ
//! 1. （ensure_queues 有効時）queue の存在確認・作成
//! 2. App Engine 形式 / 汎用 HTTP 形式の要求を組み立て
//! 3. 名前付きタスクなら完全修飾名を設定（重複検出の仕組み）
//! 4. schedule_time = base_time + delay_seconds
//! 5. create_task を 1 タスクにつき 1 回呼ぶ
//!
//! バッチ全体の原子性はありません。途中で失敗すると、それ以前のタスクは
//! 送信済みのまま、以降のタスクは送信されません。

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::app::builder::MapperBuilder;
use crate::app::config::{CloudTasksConfig, ResolvedConfig};
use crate::app::ensured_queues::EnsuredQueues;
use crate::domain::{PushTask, QueueName};
use crate::ports::{
    ApiCode, ApiError, AppEngineHttpRequest, Clock, CloudTask, CloudTasksClient, HttpRequest,
    Queue, TaskRequest,
};

/// A provider error together with the explicit task name it concerns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source}")]
pub struct MapperError {
    pub task_name: Option<String>,
    #[source]
    pub source: ApiError,
}

impl MapperError {
    fn new(task_name: Option<&str>, source: ApiError) -> Self {
        Self {
            task_name: task_name.map(str::to_string),
            source,
        }
    }
}

struct Inner {
    config: ResolvedConfig,
    client: Arc<dyn CloudTasksClient>,
    clock: Arc<dyn Clock>,
    ensured_queues: Arc<EnsuredQueues>,
}

/// Translates validated tasks into dispatch-service requests and submits them.
///
/// Cheap to clone; clones share the client and the existence cache.
#[derive(Clone)]
pub struct CloudTasksMapper {
    inner: Arc<Inner>,
}

impl CloudTasksMapper {
    pub fn builder(config: CloudTasksConfig) -> MapperBuilder {
        MapperBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: ResolvedConfig,
        client: Arc<dyn CloudTasksClient>,
        clock: Arc<dyn Clock>,
        ensured_queues: Arc<EnsuredQueues>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                client,
                clock,
                ensured_queues,
            }),
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.inner.config
    }

    pub fn ensured_queues(&self) -> &Arc<EnsuredQueues> {
        &self.inner.ensured_queues
    }

    /// Fully-qualified name of the queue `queue_id` in the configured location.
    pub fn queue_name(&self, queue_id: &str) -> QueueName {
        self.inner.config.location.queue(queue_id)
    }

    /// Submit `tasks` in order, all scheduled relative to one base time.
    /// Stops at the first failure.
    pub async fn add_tasks(
        &self,
        queue: &QueueName,
        tasks: &[PushTask],
    ) -> Result<Vec<String>, MapperError> {
        let base_time = self.inner.clock.now();
        let mut names = Vec::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            let name = self.add_task_at(queue, task, base_time).await.inspect_err(|e| {
                warn!(
                    queue = %queue,
                    submitted = i,
                    remaining = tasks.len() - i,
                    error = %e,
                    "batch stopped on failed task"
                );
            })?;
            names.push(name);
        }
        Ok(names)
    }

    pub async fn add_task(
        &self,
        queue: &QueueName,
        task: &PushTask,
    ) -> Result<String, MapperError> {
        self.add_task_at(queue, task, self.inner.clock.now()).await
    }

    pub async fn add_task_at(
        &self,
        queue: &QueueName,
        task: &PushTask,
        base_time: DateTime<Utc>,
    ) -> Result<String, MapperError> {
        if self.inner.config.ensure_queues {
            self.ensure_queue(queue).await?;
        }

        let cloud_task = self.build_task(queue, task, base_time);
        let task_name = task.has_name().then(|| task.name());
        let created = self
            .inner
            .client
            .create_task(queue, cloud_task)
            .await
            .map_err(|e| MapperError::new(task_name, e))?;

        debug!(
            queue = %queue,
            task = %created.name,
            method = %task.method(),
            url = task.url(),
            "task created"
        );
        Ok(created.name)
    }

    /// The `CloudTask` that `add_task_at` would submit.
    pub fn build_task(
        &self,
        queue: &QueueName,
        task: &PushTask,
        base_time: DateTime<Utc>,
    ) -> CloudTask {
        CloudTask {
            name: task.has_name().then(|| queue.task(task.name())),
            schedule_time: base_time + delay(task.delay_seconds()),
            request: self.build_request(task),
        }
    }

    fn build_request(&self, task: &PushTask) -> TaskRequest {
        let http_method = task.method();
        let headers = parse_headers(task.headers());
        let body = (http_method.has_body() && task.has_payload())
            .then(|| task.payload().encode().into_bytes());

        match &self.inner.config.http_target {
            Some(target) => TaskRequest::Http(HttpRequest {
                url: format!("{target}{}", task.url()),
                http_method,
                headers,
                body,
            }),
            None => TaskRequest::AppEngine(AppEngineHttpRequest {
                relative_uri: task.url().to_string(),
                http_method,
                headers,
                body,
            }),
        }
    }

    /// Make sure `queue` exists, creating it if the service does not list it.
    /// Checked once per queue for the life of the existence cache.
    pub async fn ensure_queue(&self, queue: &QueueName) -> Result<(), MapperError> {
        let ensured = &self.inner.ensured_queues;
        if ensured.contains(queue) {
            return Ok(());
        }

        let location = queue.location();
        let filter = format!("name={queue}");
        let queues = self
            .inner
            .client
            .list_queues(&location, &filter)
            .await
            .map_err(|e| MapperError::new(None, e))?;

        if queues.iter().any(|q| q.name == queue.as_str()) {
            debug!(queue = %queue, "queue exists");
        } else {
            let new_queue = Queue {
                name: queue.to_string(),
            };
            match self.inner.client.create_queue(&location, new_queue).await {
                Ok(_) => info!(queue = %queue, "queue created"),
                // Someone else created it between list and create.
                Err(e) if e.code == ApiCode::AlreadyExists => {
                    debug!(queue = %queue, "queue appeared concurrently")
                }
                Err(e) => return Err(MapperError::new(None, e)),
            }
        }

        ensured.insert(queue);
        Ok(())
    }
}

fn delay(seconds: f64) -> Duration {
    Duration::milliseconds((seconds * 1000.0).round() as i64)
}

/// `key: value` lines into a map. Later keys overwrite earlier ones.
fn parse_headers(lines: &[String]) -> BTreeMap<String, String> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
