//! ServiceConfig - Service の入力検証ポリシー

use serde::{Deserialize, Serialize};

/// text の長さ上限の既定値（文字数）
pub const DEFAULT_MAX_TEXT_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `add` の text の前後の空白を取り除いてから保存する
    pub trim_text: bool,

    /// `add` が受け付ける最大文字数
    pub max_text_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            trim_text: true,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
        }
    }
}
