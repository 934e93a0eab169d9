//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTodoStore**: テスト・開発用の正本
//! - **JsonFileTodoStore**: CLI が使う単一ファイルの正本
//!
//! ホスト型のドキュメント DB に繋ぐ場合は、`TodoStore` を実装した
//! 別クレートとして追加します。

pub mod inmem_store;
pub mod json_file_store;

// 主要な型を再エクスポート
pub use self::inmem_store::InMemoryTodoStore;
pub use self::json_file_store::JsonFileTodoStore;
