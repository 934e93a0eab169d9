//! Subscription - list() の購読ハンドル
//!
//! Service は mutation が成功するたびに最新の一覧を `Snapshot` として publish します。
//! `tokio::sync::watch` を使うので、遅い購読者は途中のスナップショットを飛ばして
//! 最新だけを受け取ります（キューは溜まらない）。

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::{Todo, TodoEvent};

/// ある時点の全件一覧（一覧順）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// publish された mutation ごとに 1 ずつ増える
    pub revision: u64,
    pub cause: TodoEvent,
    pub todos: Vec<Todo>,
}

impl Snapshot {
    pub(crate) fn initial(revision: u64, todos: Vec<Todo>) -> Self {
        Self {
            revision,
            cause: TodoEvent::Initial,
            todos,
        }
    }
}

/// 購読ハンドル。drop または `cancel()` で購読解除。
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Arc<Snapshot>>,
    latest: Arc<Snapshot>,
}

impl Subscription {
    /// `rx` は現在値を既読にしてあること。`latest` は購読後に読んだ一覧
    pub(crate) fn new(rx: watch::Receiver<Arc<Snapshot>>, latest: Snapshot) -> Self {
        Self {
            rx,
            latest: Arc::new(latest),
        }
    }

    /// このハンドルが最後に受け取った snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.latest.clone()
    }

    /// 次の snapshot を待つ
    ///
    /// Service が drop されたら `None`。
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        let snapshot = self.rx.borrow_and_update().clone();
        self.latest = snapshot.clone();
        Some(snapshot)
    }

    /// `current()` より新しい snapshot が publish 済みか
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn cancel(self) {}
}
