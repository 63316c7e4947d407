//! MapperBuilder - CloudTasksMapper の構築とワイヤリング
//!
//! # 設計
//! - client / clock / cache / 認証情報を差し替え可能にする
//! - build() 時に project / location を解決（Fail-fast）
//! - 不足があれば ConfigError を返す

use std::sync::Arc;

use crate::app::config::CloudTasksConfig;
use crate::app::ensured_queues::EnsuredQueues;
use crate::app::mapper::CloudTasksMapper;
use crate::domain::ConfigError;
use crate::ports::{AmbientCredentials, Clock, CloudTasksClient, ProjectIdSource, SystemClock};

/// MapperBuilder は CloudTasksMapper を構築
///
/// # 使用例
/// ```ignore
/// let mapper = CloudTasksMapper::builder(config)
///     .client(Arc::new(InMemoryCloudTasks::new()))
///     .build()?;
/// ```
pub struct MapperBuilder {
    config: CloudTasksConfig,
    client: Option<Arc<dyn CloudTasksClient>>,
    clock: Arc<dyn Clock>,
    ensured_queues: Arc<EnsuredQueues>,
    credentials: Box<dyn ProjectIdSource>,
}

impl MapperBuilder {
    pub fn new(config: CloudTasksConfig) -> Self {
        Self {
            config,
            client: None,
            clock: Arc::new(SystemClock),
            ensured_queues: Arc::new(EnsuredQueues::new()),
            credentials: Box::new(AmbientCredentials),
        }
    }

    /// The dispatch client, usually pre-configured with auth.
    pub fn client(mut self, client: Arc<dyn CloudTasksClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share an existence cache with other mappers.
    pub fn ensured_queues(mut self, ensured_queues: Arc<EnsuredQueues>) -> Self {
        self.ensured_queues = ensured_queues;
        self
    }

    /// Where to look for a project id when the config has none.
    pub fn project_id_source(mut self, source: impl ProjectIdSource + 'static) -> Self {
        self.credentials = Box::new(source);
        self
    }

    pub fn build(self) -> Result<CloudTasksMapper, ConfigError> {
        let config = self.config.resolve(self.credentials.as_ref())?;
        let client = self.client.ok_or(ConfigError::MissingClient)?;
        Ok(CloudTasksMapper::from_parts(
            config,
            client,
            self.clock,
            self.ensured_queues,
        ))
    }
}
