//! App - アプリケーション層
//!
//! ports を組み合わせて Todo の操作を提供します。
//!
//! # 主要コンポーネント
//! - **TodoAppBuilder**: Service の構築とワイヤリング
//! - **TodoService**: list / add / toggle / delete / clear_completed / set_order
//! - **Subscription**: 一覧の購読（mutation ごとに Snapshot を受け取る）
//! - **ListView / reorder**: 表示側のヘルパー（フィルタ・残件数・並べ替え計画）

pub mod builder;
pub mod config;
pub mod reorder;
pub mod service;
pub mod subscription;
pub mod view;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, TodoAppBuilder};
pub use self::config::ServiceConfig;
pub use self::reorder::{assignments_for, move_within, plan_reorder};
pub use self::service::TodoService;
pub use self::subscription::{Snapshot, Subscription};
pub use self::view::ListView;
