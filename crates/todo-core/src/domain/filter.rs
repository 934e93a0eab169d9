//! Filter / ScanQuery - 一覧の絞り込みと走査条件

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::todo::Todo;

/// 完了状態のフィルタ（All / Active / Completed タブ）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !todo.completed,
            Filter::Completed => todo.completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected all, active or completed)")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            _ => Err(ParseFilterError(s.to_string())),
        }
    }
}

/// 一覧順に対する走査方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// TodoStore::scan の条件
///
/// sort key は常に `Todo::list_order`（order → created_at → id）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanQuery {
    pub filter: Filter,
    pub direction: Direction,
}

impl ScanQuery {
    /// 全件・昇順
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn descending(mut self) -> Self {
        self.direction = Direction::Descending;
        self
    }

    /// 順不同のレコード集合をこのクエリで絞り込み、並べる
    pub fn apply<'a>(&self, todos: impl IntoIterator<Item = &'a Todo>) -> Vec<Todo> {
        let mut out: Vec<Todo> = todos
            .into_iter()
            .filter(|t| self.filter.matches(t))
            .cloned()
            .collect();
        match self.direction {
            Direction::Ascending => out.sort_by(Todo::list_order),
            Direction::Descending => out.sort_by(|a, b| b.list_order(a)),
        }
        out
    }
}
