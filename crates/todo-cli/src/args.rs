//! コマンドライン引数
//!
//! `///` は `--help` にそのまま出る。

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use todo_core::domain::{Filter, TodoId};

pub const DEFAULT_DATA_FILE: &str = "todos.json";

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Ordered todo list backed by a JSON file")]
pub struct Cli {
    /// Store file
    #[arg(long, env = "TODO_DATA_FILE", default_value = DEFAULT_DATA_FILE, global = true)]
    pub data_file: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter (tracing EnvFilter syntax), written to stderr
    #[arg(long, env = "TODO_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the list
    List {
        #[arg(long, short, default_value_t)]
        filter: Filter,
    },

    /// Add a todo at the end of the list
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Flip a todo between active and completed
    Toggle { id: TodoId },

    /// Delete a todo (absent ids are ignored)
    Delete { id: TodoId },

    /// Delete every completed todo
    ClearCompleted,

    /// Give the full new order of the filtered view
    Reorder {
        #[arg(long, short, default_value_t)]
        filter: Filter,

        #[arg(required = true)]
        ids: Vec<TodoId>,
    },

    /// Move one todo to a position (0-based) within the filtered view
    Move {
        id: TodoId,
        position: usize,

        #[arg(long, short, default_value_t)]
        filter: Filter,
    },

    /// Walk through every operation against an in-memory store
    Demo,
}
