//! todo-core
//!
//! 並び順つき Todo リストのサービス層。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, todo, filter, errors, events）
//! - **ports**: 抽象化レイヤー（TodoStore, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryTodoStore, JsonFileTodoStore）
//! - **app**: アプリケーションロジック（TodoService, builder, subscription, reorder, view）
//!
//! # 使用例
//! ```no_run
//! use std::sync::Arc;
//! use todo_core::app::TodoAppBuilder;
//! use todo_core::impls::InMemoryTodoStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TodoAppBuilder::new()
//!     .store(Arc::new(InMemoryTodoStore::new()))
//!     .build()?;
//!
//! let id = service.add("buy milk").await?;
//! service.toggle(id).await?;
//! assert_eq!(service.clear_completed().await?, 1);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{TodoAppBuilder, TodoService};
pub use domain::{Filter, Todo, TodoError, TodoId};
