//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（配送サービス、時計、認証情報）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod clock;
pub mod cloud_tasks;
pub mod credentials;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::cloud_tasks::{
    ApiCode, ApiError, AppEngineHttpRequest, CloudTask, CloudTasksClient, CreatedTask, HttpRequest,
    Queue, TaskRequest,
};
pub use self::credentials::{AmbientCredentials, NoCredentials, ProjectIdSource};
pub use self::id_generator::{TaskIdGenerator, UlidGenerator};
