mod args;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use todo_core::app::{Subscription, TodoAppBuilder, TodoService};
use todo_core::domain::{ErrorKind, Filter, TodoError};
use todo_core::impls::{InMemoryTodoStore, JsonFileTodoStore};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};
use crate::output::{print, render_view, todo_line};

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// エラー種別ごとの終了コード（2: NotFound, 3: InvalidArgument, 4: StoreUnavailable）
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<TodoError>().map(TodoError::kind) {
        Some(ErrorKind::NotFound) => 2,
        Some(ErrorKind::InvalidArgument) => 3,
        Some(ErrorKind::StoreUnavailable) => 4,
        None => 1,
    }
}

async fn open_service(data_file: &Path) -> anyhow::Result<TodoService<JsonFileTodoStore>> {
    debug!(path = %data_file.display(), "opening store");
    let store = JsonFileTodoStore::open(data_file)
        .await
        .map_err(TodoError::from)
        .with_context(|| format!("opening {}", data_file.display()))?;
    Ok(TodoAppBuilder::new().store(Arc::new(store)).build()?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Command::Demo => return demo().await,
        Command::List { filter } => {
            let service = open_service(&cli.data_file).await?;
            let view = service.view(filter).await?;
            print(json, &view, || render_view(&view))?;
        }
        Command::Add { text } => {
            let service = open_service(&cli.data_file).await?;
            let id = service.add(&text.join(" ")).await?;
            print(json, &json!({ "id": id }), || format!("added {id}"))?;
        }
        Command::Toggle { id } => {
            let service = open_service(&cli.data_file).await?;
            let todo = service.toggle(id).await?;
            print(json, &todo, || todo_line(&todo))?;
        }
        Command::Delete { id } => {
            let service = open_service(&cli.data_file).await?;
            service.delete(id).await?;
            print(json, &json!({ "deleted": id }), || format!("deleted {id}"))?;
        }
        Command::ClearCompleted => {
            let service = open_service(&cli.data_file).await?;
            let removed = service.clear_completed().await?;
            print(json, &json!({ "removed": removed }), || {
                format!("removed {removed} completed")
            })?;
        }
        Command::Reorder { filter, ids } => {
            let service = open_service(&cli.data_file).await?;
            let patched = service.reorder_visible(filter, &ids).await?;
            let view = service.view(filter).await?;
            print(json, &json!({ "patched": patched, "view": view }), || {
                render_view(&view)
            })?;
        }
        Command::Move {
            id,
            position,
            filter,
        } => {
            let service = open_service(&cli.data_file).await?;
            service.move_to(id, position, filter).await?;
            let view = service.view(filter).await?;
            print(json, &view, || render_view(&view))?;
        }
    }
    Ok(())
}

async fn next_snapshot(sub: &mut Subscription) -> anyhow::Result<()> {
    let snapshot = sub
        .changed()
        .await
        .context("service dropped while demo was running")?;
    println!(
        "  -> revision {} after {:?}: {} todos",
        snapshot.revision,
        snapshot.cause,
        snapshot.todos.len()
    );
    Ok(())
}

async fn demo() -> anyhow::Result<()> {
    let service = TodoAppBuilder::new()
        .store(Arc::new(InMemoryTodoStore::new()))
        .build()?;
    let mut sub = service.subscribe().await?;

    println!("adding todos");
    let mut ids = Vec::new();
    for text in [
        "Complete online course",
        "Jog around the park",
        "Read for 1 hour",
        "Pick up groceries",
    ] {
        ids.push(service.add(text).await?);
        next_snapshot(&mut sub).await?;
    }

    println!("completing the first one");
    service.toggle(ids[0]).await?;
    next_snapshot(&mut sub).await?;

    println!("moving the last active todo to the top of the active view");
    service.move_to(ids[3], 0, Filter::Active).await?;
    next_snapshot(&mut sub).await?;
    println!("{}", render_view(&service.view(Filter::All).await?));

    println!("clearing completed");
    let removed = service.clear_completed().await?;
    next_snapshot(&mut sub).await?;
    println!("removed {removed}");
    println!("{}", render_view(&service.view(Filter::All).await?));

    sub.cancel();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
