//! Reorder - ドラッグ並べ替えの結果を OrderAssignment に変換
//!
//! # フィルタ中の並べ替え
//! 表示中（フィルタ後）の一覧だけを並べ替えた場合でも、常にフィルタなしの全体を基準に
//! 番号を振り直します。
//! 1. 全体の中で「表示中の Todo が占めていた位置（slot）」を記録
//! 2. その slot を新しい表示順で埋め直す（非表示の Todo は自分の slot のまま）
//! 3. 全体を 0..n で振り直す
//!
//! これにより、非表示の Todo と表示中の Todo の相対位置は並べ替えの前後で変わりません。

use std::collections::{HashMap, HashSet};

use crate::domain::{Filter, OrderAssignment, Todo, TodoError, TodoId};

/// ドラッグ終了時の対応付け：表示順の各要素に `(id, 位置)` を割り当てる
pub fn assignments_for(sequence: &[TodoId]) -> Vec<OrderAssignment> {
    sequence
        .iter()
        .enumerate()
        .map(|(position, id)| OrderAssignment::new(*id, position as i64))
        .collect()
}

/// フィルタ後の新しい表示順 `new_visible` を、全体一覧に対する order 割り当てに変換
///
/// 現在の `order` が変わるものだけを返す。
///
/// # Errors
/// `new_visible` が `filter` で現在表示されている id の並べ替えになっていなければ
/// `InvalidArgument`。
pub fn plan_reorder(
    full: &[Todo],
    filter: Filter,
    new_visible: &[TodoId],
) -> Result<Vec<OrderAssignment>, TodoError> {
    let slots: Vec<usize> = full
        .iter()
        .enumerate()
        .filter(|(_, t)| filter.matches(t))
        .map(|(i, _)| i)
        .collect();

    if slots.len() != new_visible.len() {
        return Err(TodoError::invalid(format!(
            "reorder lists {} todos but the {filter} view shows {}",
            new_visible.len(),
            slots.len()
        )));
    }

    let visible: HashSet<TodoId> = slots.iter().map(|&i| full[i].id).collect();
    let mut seen = HashSet::with_capacity(new_visible.len());
    for id in new_visible {
        if !visible.contains(id) {
            return Err(TodoError::invalid(format!(
                "{id} is not in the {filter} view"
            )));
        }
        if !seen.insert(*id) {
            return Err(TodoError::invalid(format!("{id} listed more than once")));
        }
    }

    let mut sequence: Vec<TodoId> = full.iter().map(|t| t.id).collect();
    for (&slot, &id) in slots.iter().zip(new_visible) {
        sequence[slot] = id;
    }

    let current: HashMap<TodoId, i64> = full.iter().map(|t| (t.id, t.order)).collect();
    Ok(assignments_for(&sequence)
        .into_iter()
        .filter(|a| current.get(&a.id) != Some(&a.order))
        .collect())
}

/// `filter` の表示内で `id` を `position` に移動し、新しい表示順を返す
///
/// `position` が末尾を超えていれば最後に置く。
pub fn move_within(
    full: &[Todo],
    filter: Filter,
    id: TodoId,
    position: usize,
) -> Result<Vec<TodoId>, TodoError> {
    let mut visible: Vec<TodoId> = full
        .iter()
        .filter(|t| filter.matches(t))
        .map(|t| t.id)
        .collect();
    let from = visible
        .iter()
        .position(|v| *v == id)
        .ok_or(TodoError::NotFound(id))?;
    let moved = visible.remove(from);
    let to = position.min(visible.len());
    visible.insert(to, moved);
    Ok(visible)
}
