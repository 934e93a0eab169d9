//! TodoAppBuilder - Service の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - Store / Clock は外から注入する（グローバルなクライアントは持たない）

use std::sync::Arc;

use super::config::ServiceConfig;
use super::service::TodoService;
use crate::ports::{Clock, SystemClock, TodoStore};

/// TodoAppBuilder は TodoService を構築
///
/// # 使用例
/// ```ignore
/// let service = TodoAppBuilder::new()
///     .store(Arc::new(InMemoryTodoStore::new()))
///     .config(ServiceConfig::default())
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store が未設定なら BuildError::MissingStore
/// - 設定値が矛盾していれば BuildError::InvalidConfig
pub struct TodoAppBuilder<S: ?Sized> {
    store: Option<Arc<S>>,
    clock: Option<Arc<dyn Clock>>,
    config: ServiceConfig,
}

/// BuildError は Service 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no todo store was configured")]
    MissingStore,

    #[error("invalid service config: {0}")]
    InvalidConfig(String),
}

impl<S: TodoStore + ?Sized> TodoAppBuilder<S> {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            config: ServiceConfig::default(),
        }
    }

    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// 省略時は SystemClock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<TodoService<S>, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        if self.config.max_text_len == 0 {
            return Err(BuildError::InvalidConfig(
                "max_text_len must be at least 1".to_string(),
            ));
        }
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(TodoService::new(store, clock, self.config))
    }
}

impl<S: TodoStore + ?Sized> Default for TodoAppBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryTodoStore;

    #[test]
    fn test_build_success() {
        let service = TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::new()))
            .build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_build_missing_store() {
        let service = TodoAppBuilder::<InMemoryTodoStore>::new().build();
        assert!(matches!(service, Err(BuildError::MissingStore)));
    }

    #[test]
    fn test_build_rejects_zero_text_limit() {
        let service = TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::new()))
            .config(ServiceConfig {
                max_text_len: 0,
                ..ServiceConfig::default()
            })
            .build();
        assert!(matches!(service, Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_accepts_trait_object_store() {
        let store: Arc<dyn TodoStore> = Arc::new(InMemoryTodoStore::new());
        let service = TodoAppBuilder::new().store(store).build().unwrap();
        assert_eq!(service.subscriber_count(), 0);
    }
}
