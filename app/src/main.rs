//! Interactive terminal front end for the live todo view.
//!
//! Commands: `new`, `del <n>`, `signout`, `metrics`, `help`, `quit`.
//! Logs go to stderr; the rendered view goes to stdout.

use anyhow::Context;
use live_todo::{
    render, AppConfig, InMemoryAuth, InMemoryBackend, TodoAction, TodoEnvironment, TodoReducer,
    TodoState,
};
use live_todo_core::environment::{Clock, SystemClock};
use live_todo_runtime::metrics::MetricsRecorder;
use live_todo_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type TodoStore = Store<
    TodoState,
    TodoAction,
    TodoEnvironment<InMemoryBackend, InMemoryAuth>,
    TodoReducer<InMemoryBackend, InMemoryAuth>,
>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const HELP: &str = "Commands: new | del <n> | signout | metrics | help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut recorder = MetricsRecorder::new();
    if config.metrics_enabled {
        recorder.install().context("failed to install metrics recorder")?;
        live_todo::metrics::describe();
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = Arc::new(InMemoryBackend::with_seed(
        Arc::clone(&clock),
        config.seed.iter().cloned(),
    ));
    let env = TodoEnvironment::new(backend, Arc::new(InMemoryAuth::new()), clock);
    let store: TodoStore = Store::with_config(
        TodoState::new(),
        TodoReducer::new(),
        env,
        config.store_config(),
    );

    tracing::info!(seed = config.seed.len(), "starting live todo");

    let first = store
        .send_and_wait_for(
            TodoAction::Mount,
            |a| {
                matches!(
                    a,
                    TodoAction::SnapshotReceived { .. } | TodoAction::SubscriptionFailed { .. }
                )
            },
            REQUEST_TIMEOUT,
        )
        .await;
    if let Err(error) = first {
        tracing::warn!(%error, "no initial snapshot");
    }

    let watcher = tokio::spawn(redraw_on_snapshots(store.clone()));

    print_view(&store).await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("new"), _) => create(&store, &mut lines).await?,
            (Some("del"), Some(position)) => delete(&store, position).await,
            (Some("signout"), _) => {
                if sign_out(&store).await {
                    break;
                }
            },
            (Some("metrics"), _) => match recorder.render() {
                Some(text) => println!("{text}"),
                None => println!("Metrics are disabled (set LIVE_TODO_METRICS=true)."),
            },
            (Some("quit" | "exit"), _) => break,
            (Some("help"), _) => println!("{HELP}"),
            (None, _) => print_view(&store).await,
            _ => println!("Unknown command. {HELP}"),
        }
    }

    watcher.abort();
    let _ = store.send(TodoAction::Unmount).await?;
    store
        .shutdown(config.shutdown_timeout)
        .await
        .context("shutdown did not complete")?;

    tracing::info!("bye");
    Ok(())
}

async fn print_view(store: &TodoStore) {
    let text = store.state(render).await;
    print!("{text}");
}

/// Redraw whenever the live query changes what is on screen
async fn redraw_on_snapshots(store: TodoStore) {
    let mut actions = store.subscribe_actions();
    while let Ok(action) = actions.recv().await {
        if matches!(
            action,
            TodoAction::SnapshotReceived { .. }
                | TodoAction::SubscriptionFailed { .. }
                | TodoAction::SubscriptionClosed
        ) {
            println!();
            print_view(&store).await;
        }
    }
}

/// Blocking prompt: EOF cancels, an empty line is sent as empty content
async fn create(store: &TodoStore, lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Todo content: ").await?;
    stdout.flush().await?;

    let content = lines.next_line().await?;
    if content.as_deref().is_none_or(str::is_empty) {
        // Nothing will come back; the reducer drops it.
        let _ = store.send(TodoAction::CreateTodo { content }).await?;
        return Ok(());
    }

    let outcome = store
        .send_and_wait_for(
            TodoAction::CreateTodo { content },
            |a| matches!(a, TodoAction::TodoCreated { .. } | TodoAction::CreateFailed { .. }),
            REQUEST_TIMEOUT,
        )
        .await;

    match outcome {
        Ok(TodoAction::CreateFailed { error }) => println!("{error}"),
        Ok(_) => {},
        Err(error) => tracing::warn!(%error, "create did not complete"),
    }
    Ok(())
}

async fn delete(store: &TodoStore, position: &str) {
    let Ok(position) = position.parse::<usize>() else {
        println!("Usage: del <n>");
        return;
    };
    let Some(id) = store
        .state(|state| state.nth(position).map(|todo| todo.id.clone()))
        .await
    else {
        println!("No todo at position {position}.");
        return;
    };

    let outcome = store
        .send_and_wait_for(
            TodoAction::DeleteTodo { id },
            |a| matches!(a, TodoAction::TodoDeleted { .. } | TodoAction::DeleteFailed { .. }),
            REQUEST_TIMEOUT,
        )
        .await;

    match outcome {
        Ok(TodoAction::DeleteFailed { error, .. }) => println!("{error}"),
        Ok(_) => {},
        Err(error) => tracing::warn!(%error, "delete did not complete"),
    }
}

/// Returns true once the session has ended
async fn sign_out(store: &TodoStore) -> bool {
    let outcome = store
        .send_and_wait_for(
            TodoAction::SignOut,
            |a| matches!(a, TodoAction::SignedOut | TodoAction::SignOutFailed { .. }),
            REQUEST_TIMEOUT,
        )
        .await;

    match outcome {
        Ok(TodoAction::SignedOut) => {
            print_view(store).await;
            true
        },
        Ok(TodoAction::SignOutFailed { error }) => {
            println!("{error}");
            false
        },
        Ok(_) => false,
        Err(error) => {
            tracing::warn!(%error, "sign-out did not complete");
            false
        },
    }
}
