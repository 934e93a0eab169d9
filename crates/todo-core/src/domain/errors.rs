//! Errors - エラー型と分類
//!
//! - `StoreError`: Store 実装が返すエラー（ports 側で re-export）
//! - `TodoError`: Service が呼び出し側に返すエラー
//! - `ErrorKind`: 呼び出し側が分岐するための分類

use thiserror::Error;

use super::ids::TodoId;

/// ErrorKind は Service エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 存在しない id を指定した
    NotFound,
    /// 入力が不正（空文字の text など）
    InvalidArgument,
    /// Store がトランザクションを完了できなかった
    StoreUnavailable,
}

/// `TodoStore` 実装が返すエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// 最大の order が `i64::MAX` で、末尾に追加できない
    #[error("order space exhausted: reorder the list before adding")]
    OrderExhausted,

    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// `TodoService` の各操作が返すエラー
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    StoreUnavailable(StoreError),
}

impl TodoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TodoError::NotFound(_) => ErrorKind::NotFound,
            TodoError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TodoError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        TodoError::InvalidArgument(message.into())
    }
}

impl From<StoreError> for TodoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TodoError::NotFound(id),
            StoreError::OrderExhausted => {
                TodoError::InvalidArgument(StoreError::OrderExhausted.to_string())
            }
            other => TodoError::StoreUnavailable(other),
        }
    }
}
