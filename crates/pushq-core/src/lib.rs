//! pushq-core
//!
//! Legacy push-queue API (`PushTask`, `PushQueue`) on top of a managed
//! task-dispatch service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（PushTask, Payload, HttpMethod, resource names, errors）
//! - **ports**: 抽象化レイヤー（CloudTasksClient, Clock, TaskIdGenerator, ProjectIdSource）
//! - **app**: アプリケーションロジック（config, builder, mapper, push_queue）
//! - **impls**: 実装（InMemoryCloudTasks など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{CloudTasksConfig, CloudTasksMapper, PushQueue};
pub use domain::{HttpMethod, Payload, PushTask, PushTaskOptions, TaskQueueError};
