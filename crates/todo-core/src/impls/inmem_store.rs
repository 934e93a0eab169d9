//! InMemoryTodoStore - 開発・テスト用の Store
//!
//! # 実装詳細
//! - HashMap<TodoId, Todo> が正本
//! - tokio::sync::Mutex で排他制御（1 メソッド = 1 ロック = 1 トランザクション）
//! - append は max(order) の計算と insert を同じロック内で行う

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{NewTodo, ScanQuery, Todo, TodoId, TodoPatch, next_order};
use crate::ports::{IdGenerator, StoreError, SystemClock, TodoStore, UlidGenerator};

/// メモリ上の状態
#[derive(Default)]
pub(crate) struct InMemoryState {
    pub(crate) todos: HashMap<TodoId, Todo>,
}

impl InMemoryState {
    pub(crate) fn from_records(records: impl IntoIterator<Item = Todo>) -> Self {
        Self {
            todos: records.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    pub(crate) fn insert(&mut self, id: TodoId, fields: NewTodo, order: i64) {
        self.todos.insert(id, Todo::new(id, fields, order));
    }

    pub(crate) fn next_order(&self) -> Result<i64, StoreError> {
        next_order(self.todos.values().map(|t| t.order)).ok_or(StoreError::OrderExhausted)
    }

    pub(crate) fn patch(&mut self, id: TodoId, patch: &TodoPatch) -> Result<Todo, StoreError> {
        let todo = self.todos.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        todo.apply(patch);
        Ok(todo.clone())
    }

    /// 実際に削除したかどうかを返す
    pub(crate) fn delete(&mut self, id: TodoId) -> bool {
        self.todos.remove(&id).is_some()
    }

    pub(crate) fn scan(&self, query: &ScanQuery) -> Vec<Todo> {
        query.apply(self.todos.values())
    }
}

/// メモリ上の `TodoStore`
pub struct InMemoryTodoStore {
    state: Mutex<InMemoryState>,
    ids: Box<dyn IdGenerator>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::with_id_generator(UlidGenerator::new(SystemClock))
    }

    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self {
            state: Mutex::new(InMemoryState::default()),
            ids: Box::new(ids),
        }
    }

    /// 既存のレコードで初期化（id と order はそのまま）
    pub fn with_records(records: impl IntoIterator<Item = Todo>) -> Self {
        Self {
            state: Mutex::new(InMemoryState::from_records(records)),
            ids: Box::new(UlidGenerator::new(SystemClock)),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.todos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn get(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.todos.get(&id).cloned())
    }

    async fn insert(&self, fields: NewTodo, order: i64) -> Result<TodoId, StoreError> {
        let id = self.ids.generate_todo_id();
        let mut state = self.state.lock().await;
        state.insert(id, fields, order);
        debug!(todo_id = %id, order, "inserted todo");
        Ok(id)
    }

    async fn append(&self, fields: NewTodo) -> Result<TodoId, StoreError> {
        let id = self.ids.generate_todo_id();
        let mut state = self.state.lock().await;
        let order = state.next_order()?;
        state.insert(id, fields, order);
        debug!(todo_id = %id, order, "appended todo");
        Ok(id)
    }

    async fn patch(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError> {
        let mut state = self.state.lock().await;
        state.patch(id, &patch)
    }

    async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.delete(id) {
            debug!(todo_id = %id, "delete of absent todo ignored");
        }
        Ok(())
    }

    async fn scan(&self, query: ScanQuery) -> Result<Vec<Todo>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.scan(&query))
    }
}
