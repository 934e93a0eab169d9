//! Events - 変更通知の原因
//!
//! Subscription の Snapshot に「何が起きたか」として載せます。

use serde::{Deserialize, Serialize};

use super::ids::TodoId;

/// TodoEvent は成功した mutation 1 回分の内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TodoEvent {
    /// 初期スナップショット（まだ mutation がない）
    Initial,
    Added { id: TodoId },
    Toggled { id: TodoId, completed: bool },
    Deleted { id: TodoId },
    ClearedCompleted { removed: usize },
    Reordered { patched: usize },
}
