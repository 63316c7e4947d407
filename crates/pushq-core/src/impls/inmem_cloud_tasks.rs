//! InMemoryCloudTasks - 開発・テスト用の配送サービス
//!
//! # 振る舞い
//! - queue の一覧・作成、task の作成を Mutex 内の状態で再現
//! - 名前付き task の再作成は ALREADY_EXISTS を返す
//! - 受け取った呼び出しをすべて記録（テストで送信内容を検証できる）
//! - 任意の create_task 呼び出しに失敗を注入できる

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::names::{LocationName, QueueName};
use crate::ports::{
    ApiCode, ApiError, CloudTask, CloudTasksClient, CreatedTask, Queue, SystemClock,
    TaskIdGenerator, UlidGenerator,
};

/// One call received by the in-memory service.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    ListQueues { parent: String, filter: String },
    CreateQueue { parent: String, name: String },
    CreateTask { parent: String, task: CloudTask },
}

#[derive(Default)]
struct State {
    queues: HashSet<String>,
    task_names: HashSet<String>,
    tasks: Vec<(CloudTask, String)>,
    calls: Vec<RecordedCall>,
    create_task_calls: usize,
    failures: HashMap<usize, ApiError>,
}

/// InMemoryCloudTasks は `CloudTasksClient` の開発用実装
///
/// # 使用例
/// ```ignore
/// let service = Arc::new(InMemoryCloudTasks::new());
/// let mapper = CloudTasksMapper::builder(config).client(service.clone()).build()?;
/// mapper.default_queue()?.add_tasks(&tasks).await?;
/// assert_eq!(service.tasks().len(), tasks.len());
/// ```
pub struct InMemoryCloudTasks {
    state: Mutex<State>,
    id_gen: UlidGenerator<SystemClock>,
    strict_queues: bool,
}

impl InMemoryCloudTasks {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            id_gen: UlidGenerator::new(SystemClock),
            strict_queues: false,
        }
    }

    /// Reject tasks for queues that were never created (NOT_FOUND).
    pub fn strict_queues(mut self) -> Self {
        self.strict_queues = true;
        self
    }

    /// Register an already-existing queue.
    pub fn with_queue(self, queue: &QueueName) -> Self {
        self.lock().queues.insert(queue.as_str().to_string());
        self
    }

    /// Make the `nth` call to `create_task` (1-based, counted over the
    /// service's lifetime) fail with `err`.
    pub fn fail_create_task(&self, nth: usize, err: ApiError) {
        self.lock().failures.insert(nth, err);
    }

    /// Tasks accepted so far, in submission order.
    pub fn tasks(&self) -> Vec<CloudTask> {
        self.lock().tasks.iter().map(|(t, _)| t.clone()).collect()
    }

    /// Names the service returned for the accepted tasks.
    pub fn task_names(&self) -> Vec<String> {
        self.lock().tasks.iter().map(|(_, n)| n.clone()).collect()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn has_queue(&self, queue: &QueueName) -> bool {
        self.lock().queues.contains(queue.as_str())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryCloudTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudTasksClient for InMemoryCloudTasks {
    async fn list_queues(
        &self,
        parent: &LocationName,
        filter: &str,
    ) -> Result<Vec<Queue>, ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::ListQueues {
            parent: parent.to_string(),
            filter: filter.to_string(),
        });

        let prefix = format!("{}/queues/", parent.as_str());
        let wanted = filter.strip_prefix("name=");
        let mut queues: Vec<Queue> = state
            .queues
            .iter()
            .filter(|q| q.starts_with(&prefix))
            .filter(|q| wanted.is_none_or(|w| q.as_str() == w))
            .map(|q| Queue { name: q.clone() })
            .collect();
        queues.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(queues)
    }

    async fn create_queue(&self, parent: &LocationName, queue: Queue) -> Result<Queue, ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::CreateQueue {
            parent: parent.to_string(),
            name: queue.name.clone(),
        });

        if !queue.name.starts_with(&format!("{}/queues/", parent.as_str())) {
            return Err(ApiError::new(
                ApiCode::InvalidArgument,
                format!("queue {} is not under {}", queue.name, parent),
            ));
        }
        if !state.queues.insert(queue.name.clone()) {
            return Err(ApiError::new(
                ApiCode::AlreadyExists,
                format!("Queue {} already exists", queue.name),
            ));
        }
        Ok(queue)
    }

    async fn create_task(
        &self,
        parent: &QueueName,
        task: CloudTask,
    ) -> Result<CreatedTask, ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::CreateTask {
            parent: parent.to_string(),
            task: task.clone(),
        });
        state.create_task_calls += 1;
        let call_no = state.create_task_calls;

        if let Some(err) = state.failures.remove(&call_no) {
            return Err(err);
        }
        if self.strict_queues && !state.queues.contains(parent.as_str()) {
            return Err(ApiError::new(
                ApiCode::NotFound,
                format!("Queue {parent} does not exist"),
            ));
        }

        let name = match &task.name {
            Some(name) => {
                if !name.as_str().starts_with(parent.as_str()) {
                    return Err(ApiError::new(
                        ApiCode::InvalidArgument,
                        format!("task {name} is not under {parent}"),
                    ));
                }
                if state.task_names.contains(name.as_str()) {
                    return Err(ApiError::new(
                        ApiCode::AlreadyExists,
                        "Requested entity already exists",
                    ));
                }
                name.to_string()
            }
            None => parent.task(&self.id_gen.generate_task_id()).to_string(),
        };

        state.task_names.insert(name.clone());
        let created = CreatedTask {
            name: name.clone(),
            schedule_time: task.schedule_time,
        };
        state.tasks.push((task, name));
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HttpMethod;
    use crate::ports::{AppEngineHttpRequest, TaskRequest};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn queue() -> QueueName {
        QueueName::new("p", "l", "default")
    }

    fn cloud_task(name: Option<&str>) -> CloudTask {
        CloudTask {
            name: name.map(|n| queue().task(n)),
            schedule_time: Utc::now(),
            request: TaskRequest::AppEngine(AppEngineHttpRequest {
                relative_uri: "/work".to_string(),
                http_method: HttpMethod::Post,
                headers: BTreeMap::new(),
                body: None,
            }),
        }
    }

    #[tokio::test]
    async fn unnamed_tasks_get_generated_names() {
        let service = InMemoryCloudTasks::new();
        let a = service.create_task(&queue(), cloud_task(None)).await.unwrap();
        let b = service.create_task(&queue(), cloud_task(None)).await.unwrap();

        assert_ne!(a.name, b.name);
        assert!(a.name.starts_with("projects/p/locations/l/queues/default/tasks/"));
        assert_eq!(service.tasks().len(), 2);
    }

    #[tokio::test]
    async fn named_task_twice_is_already_exists() {
        let service = InMemoryCloudTasks::new();
        service.create_task(&queue(), cloud_task(Some("t1"))).await.unwrap();
        let err = service
            .create_task(&queue(), cloud_task(Some("t1")))
            .await
            .unwrap_err();

        assert_eq!(err.code, ApiCode::AlreadyExists);
        assert_eq!(service.tasks().len(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_exact_name() {
        let location = LocationName::new("p", "l");
        let service = InMemoryCloudTasks::new()
            .with_queue(&location.queue("a"))
            .with_queue(&location.queue("ab"));

        let filter = format!("name={}", location.queue("a"));
        let found = service.list_queues(&location, &filter).await.unwrap();
        assert_eq!(found, vec![Queue { name: location.queue("a").to_string() }]);

        let all = service.list_queues(&location, "").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn create_queue_twice_is_already_exists() {
        let location = LocationName::new("p", "l");
        let queue = Queue { name: location.queue("q").to_string() };
        let service = InMemoryCloudTasks::new();

        service.create_queue(&location, queue.clone()).await.unwrap();
        let err = service.create_queue(&location, queue).await.unwrap_err();
        assert_eq!(err.code, ApiCode::AlreadyExists);
        assert!(service.has_queue(&location.queue("q")));
    }

    #[tokio::test]
    async fn strict_mode_rejects_unknown_queue() {
        let service = InMemoryCloudTasks::new().strict_queues();
        let err = service.create_task(&queue(), cloud_task(None)).await.unwrap_err();
        assert_eq!(err.code, ApiCode::NotFound);
    }

    #[tokio::test]
    async fn injected_failure_hits_only_that_call() {
        let service = InMemoryCloudTasks::new();
        service.fail_create_task(2, ApiError::new(ApiCode::Unavailable, "blip"));

        assert!(service.create_task(&queue(), cloud_task(None)).await.is_ok());
        let err = service.create_task(&queue(), cloud_task(None)).await.unwrap_err();
        assert_eq!(err.code, ApiCode::Unavailable);
        assert!(service.create_task(&queue(), cloud_task(None)).await.is_ok());

        assert_eq!(service.tasks().len(), 2);
        assert_eq!(service.calls().len(), 3);
    }
}
