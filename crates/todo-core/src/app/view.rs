//! ListView - 表示用に絞り込んだ一覧と件数

use serde::Serialize;

use crate::domain::{Filter, Todo};

/// 1 つのフィルタ選択に対する一覧画面の内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    pub filter: Filter,
    /// `filter` を通った Todo（一覧順）
    pub visible: Vec<Todo>,
    /// フィルタに関係なく、全体のうち未完了の件数
    pub items_left: usize,
    pub completed_count: usize,
}

impl ListView {
    /// `todos` は一覧順に並んでいること
    pub fn new(todos: &[Todo], filter: Filter) -> Self {
        let completed_count = todos.iter().filter(|t| t.completed).count();
        Self {
            filter,
            visible: todos.iter().filter(|t| filter.matches(t)).cloned().collect(),
            items_left: todos.len() - completed_count,
            completed_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
