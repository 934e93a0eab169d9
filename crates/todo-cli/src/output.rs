//! 結果の表示（テキスト / JSON）

use serde::Serialize;
use todo_core::app::ListView;
use todo_core::domain::Todo;

pub fn todo_line(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!("[{mark}] {}  {}", todo.id, todo.text)
}

pub fn render_view(view: &ListView) -> String {
    let mut out = String::new();
    if view.is_empty() {
        out.push_str(&format!("(no {} todos)\n", view.filter));
    }
    for todo in &view.visible {
        out.push_str(&todo_line(todo));
        out.push('\n');
    }
    let noun = if view.items_left == 1 { "item" } else { "items" };
    out.push_str(&format!("{} {noun} left", view.items_left));
    out
}

pub fn print<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
