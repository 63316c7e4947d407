//! PushQueue - 名前付きの配送先ハンドル
//!
//! バッチ単位の検証（件数上限）を行ったうえで mapper に委譲し、
//! mapper のエラーを呼び出し側向けのエラーに変換します。
//! 「タスクが既に存在する」だけは別扱いで返します
//! （名前付きタスクの再投入を無害として扱えるように）。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::mapper::{CloudTasksMapper, MapperError};
use crate::domain::{PushTask, QueueName, TaskQueueError};

/// The maximum number of tasks in a single `add_tasks` call.
pub const MAX_TASKS_PER_ADD: usize = 100;

pub const DEFAULT_QUEUE: &str = "default";

/// Queue ids accepted by the dispatch service.
pub const MAX_QUEUE_NAME_LENGTH: usize = 100;

static QUEUE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("queue name regex"));

#[derive(Clone)]
pub struct PushQueue {
    name: String,
    fq_name: QueueName,
    mapper: CloudTasksMapper,
}

impl PushQueue {
    pub fn new(name: impl Into<String>, mapper: &CloudTasksMapper) -> Result<Self, TaskQueueError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TaskQueueError::invalid("queue name must not be empty"));
        }
        if name.len() > MAX_QUEUE_NAME_LENGTH {
            return Err(TaskQueueError::invalid(format!(
                "queue name exceeds maximum length of {MAX_QUEUE_NAME_LENGTH}. Actual length: {}",
                name.len()
            )));
        }
        if !QUEUE_NAME_PATTERN.is_match(&name) {
            return Err(TaskQueueError::invalid(format!(
                "queue name must match pattern: {}. name: {name}",
                QUEUE_NAME_PATTERN.as_str()
            )));
        }

        Ok(Self {
            fq_name: mapper.queue_name(&name),
            name,
            mapper: mapper.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fq_name(&self) -> &QueueName {
        &self.fq_name
    }

    /// Add tasks to the queue.
    ///
    /// Returns the name of each task added, in the same order as `tasks`.
    ///
    /// # Errors
    /// - `InvalidArgument` for more than `MAX_TASKS_PER_ADD` tasks, before
    ///   anything is sent.
    /// - `TaskAlreadyExists` if a task with the same explicit name is already
    ///   in the queue. The task was added by this or an earlier call.
    /// - `Service` for any other failure. Tasks before the failing one stay
    ///   submitted.
    pub async fn add_tasks(&self, tasks: &[PushTask]) -> Result<Vec<String>, TaskQueueError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        if tasks.len() > MAX_TASKS_PER_ADD {
            return Err(TaskQueueError::invalid(format!(
                "tasks must contain at most {MAX_TASKS_PER_ADD} tasks. Actual size: {}",
                tasks.len()
            )));
        }

        self.mapper
            .add_tasks(&self.fq_name, tasks)
            .await
            .map_err(translate)
    }

    pub async fn add_task(&self, task: &PushTask) -> Result<String, TaskQueueError> {
        self.mapper
            .add_task(&self.fq_name, task)
            .await
            .map_err(translate)
    }
}

fn translate(err: MapperError) -> TaskQueueError {
    TaskQueueError::from_api(err.source, err.task_name.as_deref())
}

impl CloudTasksMapper {
    pub fn queue(&self, name: impl Into<String>) -> Result<PushQueue, TaskQueueError> {
        PushQueue::new(name, self)
    }

    pub fn default_queue(&self) -> Result<PushQueue, TaskQueueError> {
        PushQueue::new(DEFAULT_QUEUE, self)
    }
}

impl PushTask {
    /// Add this task to the queue `queue_name` and return the task's name.
    pub async fn add(
        &self,
        mapper: &CloudTasksMapper,
        queue_name: &str,
    ) -> Result<String, TaskQueueError> {
        PushQueue::new(queue_name, mapper)?.add_task(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::CloudTasksConfig;
    use crate::domain::{HttpMethod, Payload, PushTaskOptions, ServiceErrorKind};
    use crate::impls::InMemoryCloudTasks;
    use crate::ports::{ApiCode, ApiError, TaskRequest};
    use chrono::Utc;
    use rstest::rstest;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryCloudTasks>, CloudTasksMapper) {
        let service = Arc::new(InMemoryCloudTasks::new());
        let mapper = CloudTasksMapper::builder(
            CloudTasksConfig::new()
                .project_id("my-project")
                .location_id("europe-west2"),
        )
        .client(service.clone())
        .build()
        .unwrap();
        (service, mapper)
    }

    fn task(path: &str) -> PushTask {
        PushTask::new(path, Payload::new(), PushTaskOptions::new()).unwrap()
    }

    fn named(path: &str, name: &str) -> PushTask {
        PushTask::new(path, Payload::new(), PushTaskOptions::new().name(name)).unwrap()
    }

    #[tokio::test]
    async fn empty_batch_never_contacts_the_service() {
        let (service, mapper) = setup();
        let names = mapper.default_queue().unwrap().add_tasks(&[]).await.unwrap();
        assert!(names.is_empty());
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_any_call() {
        let (service, mapper) = setup();
        let tasks: Vec<PushTask> = (0..=MAX_TASKS_PER_ADD).map(|_| task("/work")).collect();
        assert_eq!(tasks.len(), 101);

        let err = mapper.default_queue().unwrap().add_tasks(&tasks).await.unwrap_err();
        assert!(matches!(err, TaskQueueError::InvalidArgument(ref m) if m.contains("at most 100")));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn full_batch_is_accepted_in_order() {
        let (service, mapper) = setup();
        let tasks: Vec<PushTask> = (0..MAX_TASKS_PER_ADD)
            .map(|i| task(&format!("/work/{i}")))
            .collect();

        let names = mapper.default_queue().unwrap().add_tasks(&tasks).await.unwrap();

        assert_eq!(names.len(), MAX_TASKS_PER_ADD);
        assert_eq!(names, service.task_names());
        let uris: Vec<String> = service
            .tasks()
            .into_iter()
            .map(|t| match t.request {
                TaskRequest::AppEngine(r) => r.relative_uri,
                TaskRequest::Http(r) => r.url,
            })
            .collect();
        assert_eq!(uris[0], "/work/0");
        assert_eq!(uris[99], "/work/99");
    }

    #[tokio::test]
    async fn duplicate_name_is_task_already_exists() {
        let (service, mapper) = setup();
        let queue = mapper.queue("mail").unwrap();

        let first = queue.add_tasks(&[named("/send", "welcome-42")]).await.unwrap();
        assert_eq!(
            first,
            vec!["projects/my-project/locations/europe-west2/queues/mail/tasks/welcome-42"]
        );

        let err = queue
            .add_tasks(&[named("/send", "welcome-42")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TaskQueueError::TaskAlreadyExists { ref name } if name == "welcome-42"
        ));
        assert_eq!(service.tasks().len(), 1);
    }

    #[tokio::test]
    async fn other_service_errors_are_generic_failures() {
        let (service, mapper) = setup();
        service.fail_create_task(1, ApiError::new(ApiCode::PermissionDenied, "no access"));

        let err = mapper
            .default_queue()
            .unwrap()
            .add_tasks(&[task("/work")])
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("task queue operation failed"));
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::PermissionDenied));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn unknown_queue_maps_to_unknown_queue_kind() {
        let service = Arc::new(InMemoryCloudTasks::new().strict_queues());
        let config = CloudTasksConfig::new().project_id("p").location_id("l");
        let mapper = CloudTasksMapper::builder(config)
            .client(service)
            .build()
            .unwrap();

        let err = mapper.queue("missing").unwrap().add_task(&task("/work")).await.unwrap_err();
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::UnknownQueue));
    }

    #[tokio::test]
    async fn ensure_queues_makes_strict_service_accept_tasks() {
        let service = Arc::new(InMemoryCloudTasks::new().strict_queues());
        let mapper = CloudTasksMapper::builder(
            CloudTasksConfig::new().project_id("p").location_id("l").ensure_queues(true),
        )
        .client(service.clone())
        .build()
        .unwrap();

        let queue = mapper.queue("reports").unwrap();
        queue.add_task(&task("/work")).await.unwrap();
        assert!(service.has_queue(queue.fq_name()));
    }

    #[tokio::test]
    async fn end_to_end_post_with_payload() {
        let (service, mapper) = setup();
        let task = PushTask::new(
            "/work",
            [("x", "1")].into_iter().collect(),
            PushTaskOptions::new(),
        )
        .unwrap();

        let before = Utc::now();
        let name = task.add(&mapper, DEFAULT_QUEUE).await.unwrap();

        let prefix = "projects/my-project/locations/europe-west2/queues/default/tasks/";
        assert!(name.starts_with(prefix), "{name}");
        let sent = service.tasks();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request.http_method(), HttpMethod::Post);
        assert_eq!(sent[0].request.body(), Some(b"x=1".as_slice()));
        assert!(sent[0].schedule_time >= before);
    }

    #[rstest]
    #[case::empty("")]
    #[case::underscore("my_queue")]
    #[case::space("my queue")]
    fn invalid_queue_names_are_rejected(#[case] name: &str) {
        let (_, mapper) = setup();
        assert!(matches!(
            mapper.queue(name),
            Err(TaskQueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn long_queue_name_is_rejected() {
        let (_, mapper) = setup();
        assert!(mapper.queue("q".repeat(MAX_QUEUE_NAME_LENGTH)).is_ok());
        assert!(mapper.queue("q".repeat(MAX_QUEUE_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn queue_exposes_names() {
        let (_, mapper) = setup();
        let queue = mapper.default_queue().unwrap();
        assert_eq!(queue.name(), "default");
        assert_eq!(
            queue.fq_name().as_str(),
            "projects/my-project/locations/europe-west2/queues/default"
        );
    }
}
