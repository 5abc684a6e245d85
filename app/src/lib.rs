//! Live todo list mirroring a remote data service.
//!
//! The view keeps no list of its own making: it subscribes to a live query
//! on the remote collection and shows exactly the latest snapshot. Creating
//! and deleting items only sends requests; the list changes when the
//! service pushes the next snapshot.
//!
//! - Mount/unmount hold and release the live query as a cancellable stream effect
//! - Create and delete are one-shot future effects with failure feedback
//! - Sign-out tears the view down
//!
//! # Quick Start
//!
//! ```no_run
//! use live_todo::{
//!     InMemoryAuth, InMemoryBackend, TodoAction, TodoEnvironment, TodoReducer, TodoState,
//! };
//! use live_todo_core::environment::{Clock, SystemClock};
//! use live_todo_runtime::Store;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let backend = Arc::new(InMemoryBackend::with_seed(Arc::clone(&clock), ["milk"]));
//! let env = TodoEnvironment::new(backend, Arc::new(InMemoryAuth::new()), clock);
//! let reducer: TodoReducer<InMemoryBackend, InMemoryAuth> = TodoReducer::new();
//! let store = Store::new(TodoState::new(), reducer, env);
//!
//! store
//!     .send_and_wait_for(
//!         TodoAction::Mount,
//!         |a| matches!(a, TodoAction::SnapshotReceived { .. }),
//!         Duration::from_secs(1),
//!     )
//!     .await?;
//!
//! println!("{}", live_todo::render(&store.state(Clone::clone).await));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod reducer;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use backend::{InMemoryAuth, InMemoryBackend};
pub use config::AppConfig;
pub use environment::{AuthService, TodoEnvironment, TodoService};
pub use error::{ConfigError, ServiceError, ViewError};
pub use reducer::{TodoReducer, SUBSCRIPTION_ID};
pub use types::{
    SessionStatus, Snapshot, SubscriptionStatus, Todo, TodoAction, TodoId, TodoState,
};
pub use view::render;
