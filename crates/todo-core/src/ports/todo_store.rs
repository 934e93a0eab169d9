//! TodoStore port - Todo の正本（source of truth）
//!
//! TodoStore は以下を管理します：
//! - identity（id の採番）
//! - 並び順（order）
//! - 完了状態（completed）
//!
//! # 実装
//! - `InMemoryTodoStore`: テスト・開発用
//! - `JsonFileTodoStore`: 単一 JSON ファイルに永続化

use async_trait::async_trait;

use crate::domain::{NewTodo, ScanQuery, Todo, TodoId, TodoPatch, next_order};

pub use crate::domain::StoreError;

/// TodoStore は単一ドキュメント単位で atomic な get/insert/patch/delete と、
/// 一貫した走査（scan）を提供する
///
/// # 設計原則
/// - 1 メソッド呼び出し = 1 トランザクション
/// - delete は冪等（存在しない id でもエラーにしない）
/// - append は「max(order) を読んで +1 で insert」を 1 トランザクションで行うべき
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn get(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    /// 指定した `order` で insert（id は Store が採番）
    async fn insert(&self, fields: NewTodo, order: i64) -> Result<TodoId, StoreError>;

    /// 既存のどのレコードよりも後ろに insert
    ///
    /// デフォルト実装は最大値の読み取りと insert の 2 ステップなので、同時に
    /// append すると order が重複しうる。両方を 1 つのロック内で行える Store は
    /// override すること。最大値が `i64::MAX` なら `StoreError::OrderExhausted`。
    async fn append(&self, fields: NewTodo) -> Result<TodoId, StoreError> {
        let existing = self.scan(ScanQuery::all().descending()).await?;
        let order =
            next_order(existing.first().map(|t| t.order)).ok_or(StoreError::OrderExhausted)?;
        self.insert(fields, order).await
    }

    /// `id` がなければ `StoreError::NotFound`
    async fn patch(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError>;

    /// 冪等
    async fn delete(&self, id: TodoId) -> Result<(), StoreError>;

    async fn scan(&self, query: ScanQuery) -> Result<Vec<Todo>, StoreError>;
}

