//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Service は具体的な Store を知らず、ここの trait だけに依存します。
//! テストでは InMemory 実装を差し込みます。

pub mod clock;
pub mod id_generator;
pub mod todo_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::todo_store::{StoreError, TodoStore};
