//! Fully-qualified resource names.
//!
//! 配送サービスは project / location / queue / task を連結したパスで
//! リソースを識別します。
//! - LocationName: `projects/{project}/locations/{location}`
//! - QueueName: `{location}/queues/{queue}`
//! - TaskName: `{queue}/tasks/{task}`
//!
//! それぞれ別の型にすることで、queue 名を渡すべき場所に task 名を
//! 渡すような取り違えをコンパイル時に防ぎます。

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationName(String);

impl LocationName {
    pub fn new(project_id: &str, location_id: &str) -> Self {
        Self(format!("projects/{project_id}/locations/{location_id}"))
    }

    pub fn queue(&self, queue_id: &str) -> QueueName {
        QueueName(format!("{}/queues/{queue_id}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueName(String);

impl QueueName {
    pub fn new(project_id: &str, location_id: &str, queue_id: &str) -> Self {
        LocationName::new(project_id, location_id).queue(queue_id)
    }

    pub fn task(&self, task_id: &str) -> TaskName {
        TaskName(format!("{}/tasks/{task_id}", self.0))
    }

    /// The parent location of this queue.
    pub fn location(&self) -> LocationName {
        let end = self.0.rfind("/queues/").unwrap_or(self.0.len());
        LocationName(self.0[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compose_like_the_service_expects() {
        let queue = QueueName::new("my-project", "europe-west2", "default");
        assert_eq!(
            queue.as_str(),
            "projects/my-project/locations/europe-west2/queues/default"
        );

        let task = queue.task("my-awesome-task");
        assert_eq!(
            task.to_string(),
            "projects/my-project/locations/europe-west2/queues/default/tasks/my-awesome-task"
        );
    }

    #[test]
    fn queue_knows_its_location() {
        let queue = QueueName::new("p", "l", "q");
        assert_eq!(queue.location(), LocationName::new("p", "l"));
    }

    #[test]
    fn names_serialize_as_plain_strings() {
        let task = QueueName::new("p", "l", "q").task("t");
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, "\"projects/p/locations/l/queues/q/tasks/t\"");
    }
}
