//! Todo レコードと、その更新・追加用の型

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TodoId;

/// 一覧の 1 項目
///
/// 設計:
/// - `id` と `text` は作成後に変わらない
/// - 変更は `TodoPatch` 経由（completed と order のみ）
/// - 並び順は `list_order()` で決まる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    /// 昇順で一覧上の位置になる。連番とは限らない
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// 新規 Todo（completed = false）
    pub fn new(id: TodoId, fields: NewTodo, order: i64) -> Self {
        Self {
            id,
            text: fields.text,
            completed: false,
            order,
            created_at: fields.created_at,
        }
    }

    /// 部分更新を適用
    pub fn apply(&mut self, patch: &TodoPatch) {
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
    }

    /// 一覧の全順序：`order`、`created_at`、`id` の順に比較
    ///
    /// 同時 add で order が重複した場合でも結果が決定的になるように、
    /// created_at と id（ULID）で tie-break する。
    pub fn list_order(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// insert 時に渡すフィールド。`id`（`append` では `order` も）は Store が決める
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl NewTodo {
    pub fn new(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            created_at,
        }
    }
}

/// 部分更新。`text` は作成後に変わらないので含まない
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub completed: Option<bool>,
    pub order: Option<i64>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }
}

/// `set_order` バッチの 1 要素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAssignment {
    pub id: TodoId,
    pub order: i64,
}

impl OrderAssignment {
    pub fn new(id: TodoId, order: i64) -> Self {
        Self { id, order }
    }
}

/// 新規 Todo の order: 既存の最大値 + 1（空なら 0）
///
/// 最大値が `i64::MAX` のときは末尾に置ける値がないので `None`。
pub fn next_order(existing: impl IntoIterator<Item = i64>) -> Option<i64> {
    match existing.into_iter().max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

/// `Todo::list_order` で並べ替える
pub fn sort_for_list(todos: &mut [Todo]) {
    todos.sort_by(Todo::list_order);
}
