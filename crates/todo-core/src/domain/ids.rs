//! ドメインの識別子
//!
//! # ULID ベースの TodoId
//! Todo の ID は Store が採番する ULID です。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 同じ order / created_at の Todo を並べるときの最終キーに使える
//! - **分散生成可能**: 調整なしで複数ノードで生成できる
//! - **UUID互換**: 128-bit
//!
//! 表示形式は `todo-<ULID>`。パース時はプレフィックスなしの ULID も受け付けます
//! （CLI で手入力しやすくするため）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const PREFIX: &str = "todo-";

/// Todo の識別子。レコードが存在する間は変わらない
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Ulid);

impl TodoId {
    /// ULID から TodoId を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TodoId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

/// TodoId の文字列表現が壊れているときのエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid todo id '{input}': {reason}")]
pub struct ParseTodoIdError {
    input: String,
    reason: String,
}

impl FromStr for TodoId {
    type Err = ParseTodoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix(PREFIX).unwrap_or(raw);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|e| ParseTodoIdError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}
