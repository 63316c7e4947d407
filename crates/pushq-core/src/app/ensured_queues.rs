//! EnsuredQueues - 存在確認済み queue のキャッシュ
//!
//! 一度確認（または作成）した queue はプロセスの寿命の間は存在し続けると
//! みなし、再確認しません。キャッシュを取りこぼしても余分な確認が
//! 1 回増えるだけで、結果は変わりません。

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::QueueName;

/// Set of fully-qualified queue names known to exist.
///
/// Owned by a mapper; share one between mappers by cloning the `Arc` that
/// holds it.
#[derive(Debug, Default)]
pub struct EnsuredQueues {
    seen: Mutex<HashSet<String>>,
}

impl EnsuredQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, queue: &QueueName) -> bool {
        self.lock().contains(queue.as_str())
    }

    /// Returns `false` if the queue was already recorded.
    pub fn insert(&self, queue: &QueueName) -> bool {
        self.lock().insert(queue.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
