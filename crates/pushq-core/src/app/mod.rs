//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **CloudTasksConfig**: 配送先の設定（project / location / HTTP target）
//! - **MapperBuilder**: mapper の構築とワイヤリング
//! - **CloudTasksMapper**: PushTask → CloudTask の変換と送信
//! - **EnsuredQueues**: queue 存在確認のキャッシュ
//! - **PushQueue**: 名前付き配送先ハンドル

pub mod builder;
pub mod config;
pub mod ensured_queues;
pub mod mapper;
pub mod push_queue;

// 主要な型を再エクスポート
pub use self::builder::MapperBuilder;
pub use self::config::{CloudTasksConfig, ResolvedConfig};
pub use self::ensured_queues::EnsuredQueues;
pub use self::mapper::{CloudTasksMapper, MapperError};
pub use self::push_queue::{DEFAULT_QUEUE, MAX_TASKS_PER_ADD, PushQueue};
