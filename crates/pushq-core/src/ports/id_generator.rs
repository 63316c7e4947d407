//! TaskIdGenerator port - タスク ID 生成の抽象化
//!
//! 名前を指定されなかったタスクにはサービス側が ID を割り当てます。
//! InMemoryCloudTasks はこの trait を使ってその振る舞いを再現します。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース

use crate::ports::Clock;
use ulid::Ulid;

/// TaskIdGenerator はサービス側のタスク ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
pub trait TaskIdGenerator: Send + Sync {
    fn generate_task_id(&self) -> String;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// FixedClock を渡すと timestamp 部分が固定されます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> TaskIdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> String {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ulid.to_string().to_lowercase()
    }
}
