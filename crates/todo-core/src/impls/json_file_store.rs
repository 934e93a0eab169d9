//! JsonFileTodoStore - 単一 JSON ファイルに永続化する Store
//!
//! # 永続化
//! 1. メモリ上の状態をコピーして変更を適用
//! 2. temp ファイルに書いて fsync
//! 3. rename で本体と置き換え（POSIX で atomic）
//! 4. 成功したらメモリ上の状態を差し替え
//!
//! 書き込みに失敗した場合、メモリもファイルも直前のコミット状態のまま。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::inmem_store::InMemoryState;
use crate::domain::{NewTodo, ScanQuery, Todo, TodoId, TodoPatch};
use crate::ports::{IdGenerator, StoreError, SystemClock, TodoStore, UlidGenerator};

const FORMAT_VERSION: u32 = 1;

/// ファイル上のドキュメント
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    todos: Vec<Todo>,
}

/// 1 つの JSON ドキュメントに永続化する `TodoStore`
pub struct JsonFileTodoStore {
    path: PathBuf,
    state: Mutex<InMemoryState>,
    ids: Box<dyn IdGenerator>,
}

impl JsonFileTodoStore {
    /// `path` の Store を開く（ファイルがなければ空の Store）
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_id_generator(path, UlidGenerator::new(SystemClock)).await
    }

    pub async fn open_with_id_generator(
        path: impl Into<PathBuf>,
        ids: impl IdGenerator + 'static,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: StoreFile = serde_json::from_slice(&bytes)?;
                if file.version != FORMAT_VERSION {
                    return Err(StoreError::Unavailable(format!(
                        "unsupported store format version {} in {}",
                        file.version,
                        path.display()
                    )));
                }
                file.todos
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), todos = records.len(), "opened todo store");
        Ok(Self {
            path,
            state: Mutex::new(InMemoryState::from_records(records)),
            ids: Box::new(ids),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "todos.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, state: &InMemoryState) -> Result<(), StoreError> {
        let file = StoreFile {
            version: FORMAT_VERSION,
            todos: state.scan(&ScanQuery::all()),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        if let Err(e) = Self::replace_with(&temp, &self.path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %temp.display(), error = %cleanup, "failed to remove temp file");
            }
            return Err(e.into());
        }

        // rename 自体を永続化するためディレクトリも fsync（開けない環境では諦める）
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if let Ok(dir) = tokio::fs::File::open(dir).await
            && let Err(e) = dir.sync_all().await
        {
            debug!(error = %e, "directory fsync failed");
        }

        debug!(path = %self.path.display(), todos = file.todos.len(), "persisted todo store");
        Ok(())
    }

    /// temp に書いて fsync し、`target` に rename
    async fn replace_with(temp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut out = tokio::fs::File::create(temp).await?;
        out.write_all(bytes).await?;
        out.sync_all().await?;
        drop(out);
        tokio::fs::rename(temp, target).await
    }

    async fn commit<T>(
        &self,
        f: impl FnOnce(&mut InMemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        self.commit_locked(&mut state, f).await
    }

    /// 状態のコピーに `f` を適用し、永続化できたらメモリ側を差し替える
    ///
    /// 呼び出し側が `state` のロックを保持していること。
    async fn commit_locked<T>(
        &self,
        state: &mut InMemoryState,
        f: impl FnOnce(&mut InMemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = InMemoryState {
            todos: state.todos.clone(),
        };
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(out)
    }
}

#[async_trait]
impl TodoStore for JsonFileTodoStore {
    async fn get(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.todos.get(&id).cloned())
    }

    async fn insert(&self, fields: NewTodo, order: i64) -> Result<TodoId, StoreError> {
        let id = self.ids.generate_todo_id();
        self.commit(|state| {
            state.insert(id, fields, order);
            Ok(id)
        })
        .await
    }

    async fn append(&self, fields: NewTodo) -> Result<TodoId, StoreError> {
        let id = self.ids.generate_todo_id();
        self.commit(|state| {
            let order = state.next_order()?;
            state.insert(id, fields, order);
            Ok(id)
        })
        .await
    }

    async fn patch(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError> {
        self.commit(|state| state.patch(id, &patch)).await
    }

    async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.todos.contains_key(&id) {
            debug!(todo_id = %id, "delete of absent todo ignored");
            return Ok(());
        }
        self.commit_locked(&mut state, |next| {
            next.delete(id);
            Ok(())
        })
        .await
    }

    async fn scan(&self, query: ScanQuery) -> Result<Vec<Todo>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.scan(&query))
    }
}
