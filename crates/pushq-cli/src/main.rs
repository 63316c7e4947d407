use std::sync::Arc;

use pushq_core::app::{CloudTasksConfig, CloudTasksMapper, DEFAULT_QUEUE};
use pushq_core::domain::{HttpMethod, PushTask, PushTaskOptions, TaskQueueError};
use pushq_core::impls::InMemoryCloudTasks;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn demo_tasks() -> Result<Vec<PushTask>, TaskQueueError> {
    Ok(vec![
        PushTask::new("/someUrl1", Default::default(), PushTaskOptions::new())?,
        PushTask::new(
            "/someUrl2",
            [("data", "value")].into_iter().collect(),
            PushTaskOptions::new(),
        )?,
        PushTask::new("/someUrl3", Default::default(), PushTaskOptions::new().delay_seconds(30.0))?,
        PushTask::new(
            "/someUrl4",
            Default::default(),
            PushTaskOptions::new().header("X-Test: SomeValue"),
        )?,
        PushTask::new(
            "/someUrl5",
            [("page", "2")].into_iter().collect(),
            PushTaskOptions::new().method(HttpMethod::Get).name("my-awesome-task"),
        )?,
    ])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // (A) 設定: PUSHQ_* 環境変数、なければデモ用の値
    let mut config = CloudTasksConfig::from_env()?;
    if config.project_id.is_none() {
        config = config.project_id("demo-project");
    }
    if config.location_id.is_none() {
        config = config.location_id("europe-west2");
    }

    // (B) 配送サービス（デモなので in-memory）と mapper を用意
    let service = Arc::new(InMemoryCloudTasks::new());
    let mapper = CloudTasksMapper::builder(config)
        .client(service.clone())
        .build()?;

    // (C) タスク投入
    let queue = mapper.queue(DEFAULT_QUEUE)?;
    let names = queue.add_tasks(&demo_tasks()?).await?;
    for name in &names {
        println!("{name}");
    }

    // (D) 同じ名前で再投入すると TaskAlreadyExists（冪等な再投入として扱える）
    let again = PushTask::new(
        "/someUrl5",
        Default::default(),
        PushTaskOptions::new().name("my-awesome-task"),
    )?;
    match again.add(&mapper, DEFAULT_QUEUE).await {
        Err(TaskQueueError::TaskAlreadyExists { name }) => {
            info!(task = %name, "already enqueued, skipping")
        }
        other => println!("unexpected result: {other:?}"),
    }

    // (E) 実際に送信された要求を表示
    println!("{}", serde_json::to_string_pretty(&service.tasks())?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}
