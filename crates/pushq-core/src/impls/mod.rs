//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryCloudTasks**: 開発用の配送サービス
//!
//! # 本番用実装
//! 実際のサービスへの通信は別クレートで `CloudTasksClient` を実装します。

pub mod inmem_cloud_tasks;

// 主要な型を再エクスポート
pub use self::inmem_cloud_tasks::{InMemoryCloudTasks, RecordedCall};
