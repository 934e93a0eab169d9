//! TodoService - 一覧・追加・完了切り替え・削除・完了済み一括削除・並べ替え
//!
//! Service は TodoStore の上の薄いマッピング層です。
//!
//! # 設計原則
//! - 各操作は Store に対する 1 ステップ（途中状態を呼び出し側に見せない）
//! - ロック・リトライ・バックグラウンドタスクは持たない
//! - 複数件の操作（clear_completed / set_order）はバッチとして atomic ではない。
//!   途中で失敗した場合、成功した分はそのまま残る（再実行して問題ない）
//! - mutation が成功したら購読者へ最新の一覧を publish

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use super::config::ServiceConfig;
use super::reorder::{move_within, plan_reorder};
use super::subscription::{Snapshot, Subscription};
use super::view::ListView;
use crate::domain::{
    Filter, NewTodo, OrderAssignment, ScanQuery, Todo, TodoError, TodoEvent, TodoId, TodoPatch,
};
use crate::ports::{Clock, StoreError, TodoStore};

/// 並び順つき Todo リストのサービス（Store は注入）
pub struct TodoService<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
    updates: watch::Sender<Arc<Snapshot>>,
    /// publish の「list() を読む → send」を直列化する
    publishing: Mutex<()>,
}

impl<S: TodoStore + ?Sized> TodoService<S> {
    /// 通常は `TodoAppBuilder` 経由で作る
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        let (updates, _) = watch::channel(Arc::new(Snapshot::initial(0, Vec::new())));
        Self {
            store,
            clock,
            config,
            updates,
            publishing: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// 全件を `(order, created_at, id)` の昇順で返す
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        Ok(self.store.scan(ScanQuery::all()).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_filtered(&self, filter: Filter) -> Result<Vec<Todo>, TodoError> {
        Ok(self.store.scan(ScanQuery::filtered(filter)).await?)
    }

    /// フィルタ後の一覧と残件数
    pub async fn view(&self, filter: Filter) -> Result<ListView, TodoError> {
        let todos = self.list().await?;
        Ok(ListView::new(&todos, filter))
    }

    /// 一覧の末尾に Todo を追加
    ///
    /// # Errors
    /// text が空白のみ・長すぎる・order に空きがない場合は `InvalidArgument`。
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn add(&self, text: &str) -> Result<TodoId, TodoError> {
        let text = self.validate_text(text)?;
        let id = self
            .store
            .append(NewTodo::new(text, self.clock.now()))
            .await?;
        info!(todo_id = %id, "added todo");
        self.publish(TodoEvent::Added { id }).await;
        Ok(id)
    }

    /// `completed` を反転し、更新後のレコードを返す
    #[instrument(skip(self))]
    pub async fn toggle(&self, id: TodoId) -> Result<Todo, TodoError> {
        let current = self.store.get(id).await?.ok_or(TodoError::NotFound(id))?;
        let updated = self
            .store
            .patch(id, TodoPatch::completed(!current.completed))
            .await?;
        info!(todo_id = %id, completed = updated.completed, "toggled todo");
        self.publish(TodoEvent::Toggled {
            id,
            completed: updated.completed,
        })
        .await;
        Ok(updated)
    }

    /// 存在しない id の削除も成功扱い
    #[instrument(skip(self))]
    pub async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        self.store.delete(id).await?;
        info!(todo_id = %id, "deleted todo");
        self.publish(TodoEvent::Deleted { id }).await;
        Ok(())
    }

    /// scan 時点で完了済みの Todo をすべて削除し、削除件数を返す
    #[instrument(skip(self))]
    pub async fn clear_completed(&self) -> Result<usize, TodoError> {
        let completed = self
            .store
            .scan(ScanQuery::filtered(Filter::Completed))
            .await?;

        let mut removed = 0;
        for todo in &completed {
            if let Err(e) = self.store.delete(todo.id).await {
                warn!(todo_id = %todo.id, removed, error = %e, "clear completed stopped early");
                if removed > 0 {
                    self.publish(TodoEvent::ClearedCompleted { removed }).await;
                }
                return Err(e.into());
            }
            removed += 1;
        }

        info!(removed, "cleared completed todos");
        self.publish(TodoEvent::ClearedCompleted { removed }).await;
        Ok(removed)
    }

    /// 各割り当ての `order` を書き込み、更新した件数を返す
    ///
    /// 存在しない id の割り当ては飛ばす。途中失敗や同時削除の後でも同じバッチを
    /// 再実行できる。
    #[instrument(skip(self, assignments), fields(count = assignments.len()))]
    pub async fn set_order(&self, assignments: &[OrderAssignment]) -> Result<usize, TodoError> {
        let mut patched = 0;
        for assignment in assignments {
            match self
                .store
                .patch(assignment.id, TodoPatch::order(assignment.order))
                .await
            {
                Ok(_) => patched += 1,
                Err(StoreError::NotFound(id)) => {
                    debug!(todo_id = %id, "set_order skipped missing todo");
                }
                Err(e) => {
                    warn!(patched, error = %e, "set_order stopped early");
                    if patched > 0 {
                        self.publish(TodoEvent::Reordered { patched }).await;
                    }
                    return Err(e.into());
                }
            }
        }

        info!(patched, "reordered todos");
        self.publish(TodoEvent::Reordered { patched }).await;
        Ok(patched)
    }

    /// `filter` の表示に新しい順序を適用し、全体を振り直す
    ///
    /// 非表示の Todo の扱いは `reorder::plan_reorder` を参照。
    pub async fn reorder_visible(
        &self,
        filter: Filter,
        new_visible: &[TodoId],
    ) -> Result<usize, TodoError> {
        let full = self.list().await?;
        let plan = plan_reorder(&full, filter, new_visible)?;
        self.set_order(&plan).await
    }

    /// `filter` の表示内で Todo を 1 件 `position` に移動
    pub async fn move_to(
        &self,
        id: TodoId,
        position: usize,
        filter: Filter,
    ) -> Result<usize, TodoError> {
        let full = self.list().await?;
        let sequence = move_within(&full, filter, id, position)?;
        let plan = plan_reorder(&full, filter, &sequence)?;
        self.set_order(&plan).await
    }

    /// `list()` を購読する
    ///
    /// ハンドルは現在の一覧から始まり、mutation が成功するたびに新しい
    /// snapshot を受け取る。
    pub async fn subscribe(&self) -> Result<Subscription, TodoError> {
        let rx = self.updates.subscribe();
        let revision = rx.borrow().revision;
        let todos = self.list().await?;
        Ok(Subscription::new(rx, Snapshot::initial(revision, todos)))
    }

    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }

    fn validate_text(&self, text: &str) -> Result<String, TodoError> {
        if text.trim().is_empty() {
            return Err(TodoError::invalid("todo text must not be blank"));
        }
        let text = if self.config.trim_text {
            text.trim()
        } else {
            text
        };
        let len = text.chars().count();
        if len > self.config.max_text_len {
            return Err(TodoError::invalid(format!(
                "todo text is {len} characters, limit is {}",
                self.config.max_text_len
            )));
        }
        Ok(text.to_string())
    }

    async fn publish(&self, cause: TodoEvent) {
        if self.updates.receiver_count() == 0 {
            return;
        }
        // 読んだ順に send する。最後に送られる snapshot が最後に読んだ一覧になる
        let _publishing = self.publishing.lock().await;
        match self.list().await {
            Ok(todos) => self.updates.send_modify(|snapshot| {
                *snapshot = Arc::new(Snapshot {
                    revision: snapshot.revision + 1,
                    cause,
                    todos,
                });
            }),
            Err(e) => warn!(error = %e, "failed to refresh subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ServiceConfig, TodoAppBuilder, assignments_for};
    use crate::domain::{ErrorKind, NewTodo};
    use crate::impls::InMemoryTodoStore;
    use crate::ports::FixedClock;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ulid::Ulid;

    fn service() -> TodoService<InMemoryTodoStore> {
        TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::new()))
            .build()
            .unwrap()
    }

    fn service_with(records: Vec<Todo>) -> TodoService<InMemoryTodoStore> {
        TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::with_records(records)))
            .build()
            .unwrap()
    }

    fn record(text: &str, order: i64, completed: bool) -> Todo {
        let mut t = Todo::new(
            TodoId::from_ulid(Ulid::new()),
            NewTodo::new(text, Utc::now()),
            order,
        );
        t.completed = completed;
        t
    }

    fn texts(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.text.as_str()).collect()
    }

    /// 更新系の呼び出しが `budget` 回成功した後は失敗する InMemoryTodoStore
    struct FlakyStore {
        inner: InMemoryTodoStore,
        budget: AtomicUsize,
    }

    impl FlakyStore {
        fn new(inner: InMemoryTodoStore, budget: usize) -> Self {
            Self {
                inner,
                budget: AtomicUsize::new(budget),
            }
        }

        fn spend(&self) -> Result<(), StoreError> {
            self.budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1))
                .map(|_| ())
                .map_err(|_| StoreError::Unavailable("injected failure".to_string()))
        }
    }

    #[async_trait]
    impl TodoStore for FlakyStore {
        async fn get(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
            self.inner.get(id).await
        }

        async fn insert(&self, fields: NewTodo, order: i64) -> Result<TodoId, StoreError> {
            self.spend()?;
            self.inner.insert(fields, order).await
        }

        async fn append(&self, fields: NewTodo) -> Result<TodoId, StoreError> {
            self.spend()?;
            self.inner.append(fields).await
        }

        async fn patch(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError> {
            self.spend()?;
            self.inner.patch(id, patch).await
        }

        async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
            self.spend()?;
            self.inner.delete(id).await
        }

        async fn scan(&self, query: ScanQuery) -> Result<Vec<Todo>, StoreError> {
            self.inner.scan(query).await
        }
    }

    /// `slow_scan` 回目（0 始まり）の scan だけ、読んだ後に `delay` 待ってから返す
    struct SlowScanStore {
        inner: InMemoryTodoStore,
        scans: AtomicUsize,
        slow_scan: usize,
        delay: std::time::Duration,
    }

    #[async_trait]
    impl TodoStore for SlowScanStore {
        async fn get(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
            self.inner.get(id).await
        }

        async fn insert(&self, fields: NewTodo, order: i64) -> Result<TodoId, StoreError> {
            self.inner.insert(fields, order).await
        }

        async fn append(&self, fields: NewTodo) -> Result<TodoId, StoreError> {
            self.inner.append(fields).await
        }

        async fn patch(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError> {
            self.inner.patch(id, patch).await
        }

        async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }

        async fn scan(&self, query: ScanQuery) -> Result<Vec<Todo>, StoreError> {
            let n = self.scans.fetch_add(1, Ordering::SeqCst);
            let todos = self.inner.scan(query).await?;
            if n == self.slow_scan {
                tokio::time::sleep(self.delay).await;
            }
            Ok(todos)
        }
    }

    fn flaky(records: Vec<Todo>, budget: usize) -> TodoService<FlakyStore> {
        TodoAppBuilder::new()
            .store(Arc::new(FlakyStore::new(
                InMemoryTodoStore::with_records(records),
                budget,
            )))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn list_on_empty_store_is_empty() {
        let svc = service();
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_appends_after_every_existing_todo() {
        let svc = service_with(vec![record("x", 5, false), record("y", -3, true)]);
        let before = svc.list().await.unwrap();

        let id = svc.add("buy milk").await.unwrap();

        let after = svc.list().await.unwrap();
        let added: Vec<&Todo> = after.iter().filter(|t| t.id == id).collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].text, "buy milk");
        assert!(!added[0].completed);
        assert!(before.iter().all(|t| t.order < added[0].order));
        assert_eq!(after.last().map(|t| t.id), Some(id));
    }

    #[tokio::test]
    async fn add_after_single_item_gets_order_one() {
        let svc = service_with(vec![record("a", 0, false)]);

        let id = svc.add("b").await.unwrap();

        let list = svc.list().await.unwrap();
        assert_eq!(texts(&list), vec!["a", "b"]);
        assert_eq!(list[1].id, id);
        assert_eq!(list[1].order, 1);
    }

    #[tokio::test]
    async fn add_uses_injected_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(at));
        let svc = TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::new()))
            .clock(clock.clone())
            .build()
            .unwrap();

        svc.add("first").await.unwrap();
        clock.advance(Duration::minutes(5));
        svc.add("second").await.unwrap();

        let list = svc.list().await.unwrap();
        assert_eq!(list[0].created_at, at);
        assert_eq!(list[1].created_at, at + Duration::minutes(5));
    }

    #[rstest]
    #[case::empty("")]
    #[case::spaces("   ")]
    #[case::whitespace("\t\n ")]
    #[tokio::test]
    async fn add_rejects_blank_text(#[case] text: &str) {
        let svc = service();
        let err = svc.add(text).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_trims_text_by_default() {
        let svc = service();
        svc.add("  walk the dog \n").await.unwrap();
        assert_eq!(texts(&svc.list().await.unwrap()), vec!["walk the dog"]);
    }

    #[tokio::test]
    async fn add_keeps_text_when_trimming_is_off() {
        let svc = TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::new()))
            .config(ServiceConfig {
                trim_text: false,
                ..ServiceConfig::default()
            })
            .build()
            .unwrap();
        svc.add(" padded ").await.unwrap();
        assert_eq!(texts(&svc.list().await.unwrap()), vec![" padded "]);
    }

    #[tokio::test]
    async fn add_enforces_length_limit_in_characters() {
        let svc = TodoAppBuilder::new()
            .store(Arc::new(InMemoryTodoStore::new()))
            .config(ServiceConfig {
                max_text_len: 3,
                ..ServiceConfig::default()
            })
            .build()
            .unwrap();

        // 3 文字（バイト数ではなく文字数で数える）
        svc.add("日本語").await.unwrap();
        let err = svc.add("abcd").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn add_after_max_order_is_invalid_argument() {
        let svc = service_with(vec![record("last", i64::MAX, false)]);

        let err = svc.add("b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(texts(&svc.list().await.unwrap()), vec!["last"]);

        // 並べ直せば再び追加できる
        let id = svc.list().await.unwrap()[0].id;
        svc.set_order(&[OrderAssignment::new(id, 0)]).await.unwrap();
        svc.add("b").await.unwrap();
        assert_eq!(texts(&svc.list().await.unwrap()), vec!["last", "b"]);
    }

    #[tokio::test]
    async fn double_toggle_restores_completed() {
        let svc = service();
        let id = svc.add("a").await.unwrap();

        let once = svc.toggle(id).await.unwrap();
        assert!(once.completed);
        let twice = svc.toggle(id).await.unwrap();
        assert!(!twice.completed);

        assert_eq!(svc.list().await.unwrap()[0].completed, false);
    }

    #[tokio::test]
    async fn toggle_missing_is_not_found() {
        let svc = service();
        let missing = TodoId::from_ulid(Ulid::new());

        let err = svc.toggle(missing).await.unwrap_err();
        assert!(matches!(err, TodoError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let svc = service();
        let a = svc.add("a").await.unwrap();
        let b = svc.add("b").await.unwrap();

        svc.delete(a).await.unwrap();
        assert!(svc.list().await.unwrap().iter().all(|t| t.id != a));
        svc.delete(a).await.unwrap();

        let list = svc.list().await.unwrap();
        assert_eq!(list.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b]);
    }

    #[tokio::test]
    async fn clear_completed_returns_count_and_keeps_active() {
        let svc = service_with(vec![
            record("a", 0, false),
            record("b", 1, true),
            record("c", 2, false),
        ]);

        assert_eq!(svc.clear_completed().await.unwrap(), 1);

        let list = svc.list().await.unwrap();
        assert_eq!(texts(&list), vec!["a", "c"]);
        assert!(list.iter().all(|t| !t.completed));
    }

    #[tokio::test]
    async fn clear_completed_on_nothing_completed_is_zero() {
        let svc = service_with(vec![record("a", 0, false)]);
        assert_eq!(svc.clear_completed().await.unwrap(), 0);
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[rstest]
    #[case::identity(vec![0, 1, 2, 3])]
    #[case::reversed(vec![3, 2, 1, 0])]
    #[case::rotated(vec![1, 2, 3, 0])]
    #[case::swapped(vec![0, 2, 1, 3])]
    #[tokio::test]
    async fn set_order_reproduces_permutation(#[case] permutation: Vec<usize>) {
        let svc = service();
        let mut ids = Vec::new();
        for text in ["a", "b", "c", "d"] {
            ids.push(svc.add(text).await.unwrap());
        }
        let wanted: Vec<TodoId> = permutation.iter().map(|&i| ids[i]).collect();

        let patched = svc.set_order(&assignments_for(&wanted)).await.unwrap();

        assert_eq!(patched, 4);
        let got: Vec<TodoId> = svc.list().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(got, wanted);
    }

    #[tokio::test]
    async fn set_order_skips_missing_ids() {
        let svc = service();
        let a = svc.add("a").await.unwrap();
        let b = svc.add("b").await.unwrap();
        let gone = svc.add("gone").await.unwrap();
        svc.delete(gone).await.unwrap();

        let patched = svc
            .set_order(&assignments_for(&[b, gone, a]))
            .await
            .unwrap();

        assert_eq!(patched, 2);
        let got: Vec<TodoId> = svc.list().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(got, vec![b, a]);
    }

    #[tokio::test]
    async fn set_order_leaves_unlisted_todos_alone() {
        let svc = service_with(vec![
            record("a", 0, false),
            record("b", 1, false),
            record("c", 2, false),
        ]);
        let list = svc.list().await.unwrap();

        svc.set_order(&[OrderAssignment::new(list[0].id, 10)])
            .await
            .unwrap();

        let after = svc.list().await.unwrap();
        assert_eq!(texts(&after), vec!["b", "c", "a"]);
        assert_eq!(after[0].order, 1);
        assert_eq!(after[1].order, 2);
    }

    #[tokio::test]
    async fn duplicate_orders_are_listed_by_creation_time() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut late = record("late", 0, false);
        late.created_at = base + Duration::seconds(1);
        let mut early = record("early", 0, false);
        early.created_at = base;

        let svc = service_with(vec![late, early]);
        assert_eq!(texts(&svc.list().await.unwrap()), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn reorder_visible_keeps_hidden_slots() {
        let svc = service_with(vec![
            record("a", 0, false),
            record("b", 1, true),
            record("c", 2, false),
        ]);
        let list = svc.list().await.unwrap();
        let (a, c) = (list[0].id, list[2].id);

        svc.reorder_visible(Filter::Active, &[c, a]).await.unwrap();

        assert_eq!(texts(&svc.list().await.unwrap()), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn move_to_moves_within_filtered_view() {
        let svc = service_with(vec![
            record("a", 0, true),
            record("b", 1, false),
            record("c", 2, true),
            record("d", 3, false),
        ]);
        let list = svc.list().await.unwrap();
        let c = list[2].id;

        // Completed view: [a, c] -> [c, a]
        svc.move_to(c, 0, Filter::Completed).await.unwrap();

        assert_eq!(texts(&svc.list().await.unwrap()), vec!["c", "b", "a", "d"]);
    }

    #[tokio::test]
    async fn view_counts_items_left_across_filters() {
        let svc = service_with(vec![
            record("a", 0, false),
            record("b", 1, true),
            record("c", 2, false),
        ]);

        let view = svc.view(Filter::Completed).await.unwrap();
        assert_eq!(texts(&view.visible), vec!["b"]);
        assert_eq!(view.items_left, 2);

        let active = svc.list_filtered(Filter::Active).await.unwrap();
        assert_eq!(texts(&active), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_store_unavailable() {
        let svc = flaky(vec![], 0);

        let err = svc.add("a").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(err.to_string().contains("injected failure"));
    }

    #[tokio::test]
    async fn partial_clear_completed_keeps_what_succeeded() {
        let svc = flaky(
            vec![
                record("a", 0, true),
                record("b", 1, true),
                record("c", 2, true),
            ],
            1,
        );

        let err = svc.clear_completed().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(svc.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn partial_set_order_can_be_reissued() {
        let records = vec![record("a", 0, false), record("b", 1, false), record("c", 2, false)];
        let ids: Vec<TodoId> = records.iter().map(|t| t.id).collect();
        let svc = flaky(records, 1);
        let wanted = vec![ids[2], ids[1], ids[0]];

        assert!(svc.set_order(&assignments_for(&wanted)).await.is_err());

        svc.store().budget.store(usize::MAX, Ordering::SeqCst);
        svc.set_order(&assignments_for(&wanted)).await.unwrap();
        let got: Vec<TodoId> = svc.list().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(got, wanted);
    }

    #[tokio::test]
    async fn subscriber_sees_snapshot_after_each_mutation() {
        let svc = service_with(vec![record("seed", 0, false)]);
        let mut sub = svc.subscribe().await.unwrap();

        let initial = sub.current();
        assert_eq!(initial.cause, TodoEvent::Initial);
        assert_eq!(texts(&initial.todos), vec!["seed"]);

        let id = svc.add("b").await.unwrap();
        let snap = sub.changed().await.unwrap();
        assert_eq!(snap.cause, TodoEvent::Added { id });
        assert_eq!(texts(&snap.todos), vec!["seed", "b"]);
        assert_eq!(snap.revision, initial.revision + 1);

        svc.toggle(id).await.unwrap();
        let snap = sub.changed().await.unwrap();
        assert_eq!(snap.cause, TodoEvent::Toggled { id, completed: true });

        svc.clear_completed().await.unwrap();
        let snap = sub.changed().await.unwrap();
        assert_eq!(snap.cause, TodoEvent::ClearedCompleted { removed: 1 });
        assert_eq!(texts(&snap.todos), vec!["seed"]);
        assert_eq!(sub.current(), snap);
    }

    #[tokio::test]
    async fn failed_mutation_publishes_nothing() {
        let svc = service();
        let sub = svc.subscribe().await.unwrap();

        assert!(svc.add("   ").await.is_err());
        assert!(svc.toggle(TodoId::from_ulid(Ulid::new())).await.is_err());

        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn cancelled_subscription_is_released() {
        let svc = service();
        let sub = svc.subscribe().await.unwrap();
        assert_eq!(svc.subscriber_count(), 1);

        sub.cancel();
        assert_eq!(svc.subscriber_count(), 0);

        // 購読者がいなくても mutation は成功する
        svc.add("a").await.unwrap();
    }

    #[tokio::test]
    async fn subscription_ends_when_service_is_dropped() {
        let svc = service();
        let mut sub = svc.subscribe().await.unwrap();
        drop(svc);
        assert!(sub.changed().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_adds_keep_distinct_positions() {
        let svc = Arc::new(service());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.add(&format!("t{i}")).await.unwrap() })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        let orders: Vec<i64> = svc.list().await.unwrap().iter().map(|t| t.order).collect();
        assert_eq!(orders, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn slow_refresh_does_not_overwrite_newer_snapshot() {
        // scan 0 は subscribe、scan 1 は add("A") の publish
        let store = SlowScanStore {
            inner: InMemoryTodoStore::new(),
            scans: AtomicUsize::new(0),
            slow_scan: 1,
            delay: std::time::Duration::from_millis(100),
        };
        let svc = Arc::new(TodoAppBuilder::new().store(Arc::new(store)).build().unwrap());
        let mut sub = svc.subscribe().await.unwrap();

        let first = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.add("A").await.unwrap() })
        };
        // A の publish が遅い scan に入るまで待つ
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        svc.add("B").await.unwrap();
        first.await.unwrap();

        let latest = sub.changed().await.unwrap();
        assert_eq!(texts(&latest.todos), vec!["A", "B"]);
        assert_eq!(latest.todos, svc.list().await.unwrap());
        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn concurrent_adds_leave_subscriber_with_full_list() {
        let svc = Arc::new(service());
        let mut sub = svc.subscribe().await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.add(&format!("t{i}")).await.unwrap() })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        let latest = sub.changed().await.unwrap();
        assert_eq!(latest.revision, 8);
        assert_eq!(latest.todos, svc.list().await.unwrap());
    }
}
