//! In-memory stand-ins for the remote data and auth services.
//!
//! [`InMemoryBackend`] honours the [`TodoService`] contract: every live query
//! receives the full list on subscribe and after each write, and dropping
//! the query stream releases the subscription. It also records every call
//! and can be told to fail, which makes it the test double for the view.

use crate::environment::{AuthService, TodoService};
use crate::error::{Result, ServiceError};
use crate::types::{Snapshot, Todo, TodoId};
use futures::stream::BoxStream;
use live_todo_core::environment::Clock;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// What live queries currently see
#[derive(Clone, Debug)]
enum Feed {
    Open(Snapshot),
    Failed(ServiceError),
    Closed,
}

#[derive(Debug, Default)]
struct Collection {
    todos: Vec<Todo>,
    held: bool,
    create_calls: Vec<String>,
    delete_calls: Vec<TodoId>,
    next_create_failure: Option<ServiceError>,
    next_delete_failure: Option<ServiceError>,
}

struct Shared {
    collection: Mutex<Collection>,
    feed: watch::Sender<Feed>,
    subscribed: AtomicUsize,
    released: AtomicUsize,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Collection> {
        self.collection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push `collection` to open queries, unless held or not open
    ///
    /// Callers hold the collection lock across the send, so concurrent
    /// writes reach the feed in the order they were applied.
    fn publish(&self, collection: &Collection) {
        if collection.held {
            return;
        }
        self.feed.send_if_modified(|feed| match feed {
            Feed::Open(current) => {
                *current = Snapshot::synced(collection.todos.clone());
                true
            },
            Feed::Failed(_) | Feed::Closed => false,
        });
    }
}

/// Counts one subscription on creation and one release on drop
struct SubscriptionGuard(Arc<Shared>);

impl SubscriptionGuard {
    fn open(shared: Arc<Shared>) -> Self {
        let id = shared.subscribed.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(subscription = id, "live query subscribed");
        Self(shared)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let released = self.0.released.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(released, "live query released");
    }
}

/// In-memory todo collection with live queries
#[derive(Clone)]
pub struct InMemoryBackend {
    shared: Arc<Shared>,
}

impl InMemoryBackend {
    /// Creates an empty collection
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (feed, _) = watch::channel(Feed::Open(Snapshot::synced(Vec::new())));
        Self {
            shared: Arc::new(Shared {
                collection: Mutex::new(Collection::default()),
                feed,
                subscribed: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                clock,
            }),
        }
    }

    /// Creates a collection holding one todo per entry of `seed`
    #[must_use]
    pub fn with_seed<I>(clock: Arc<dyn Clock>, seed: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let backend = Self::new(clock);
        for content in seed {
            backend.insert(content);
        }
        backend
    }

    /// Writes a todo directly, as another client of the service would
    pub fn insert(&self, content: impl Into<String>) -> Todo {
        let todo = Todo::new(TodoId::generate(), content, self.shared.clock.now());
        let mut collection = self.shared.lock();
        collection.todos.push(todo.clone());
        self.shared.publish(&collection);
        todo
    }

    /// Current contents of the collection
    #[must_use]
    pub fn todos(&self) -> Vec<Todo> {
        self.shared.lock().todos.clone()
    }

    /// Number of live queries opened so far
    #[must_use]
    pub fn subscribe_count(&self) -> usize {
        self.shared.subscribed.load(Ordering::SeqCst)
    }

    /// Number of live queries released so far
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.shared.released.load(Ordering::SeqCst)
    }

    /// Number of live queries currently open
    #[must_use]
    pub fn open_subscriptions(&self) -> usize {
        self.subscribe_count().saturating_sub(self.release_count())
    }

    /// Content of every create request, in call order
    #[must_use]
    pub fn create_calls(&self) -> Vec<String> {
        self.shared.lock().create_calls.clone()
    }

    /// Id of every delete request, in call order
    #[must_use]
    pub fn delete_calls(&self) -> Vec<TodoId> {
        self.shared.lock().delete_calls.clone()
    }

    /// Make the next create request fail with `error`
    pub fn fail_next_create(&self, error: ServiceError) {
        self.shared.lock().next_create_failure = Some(error);
    }

    /// Make the next delete request fail with `error`
    pub fn fail_next_delete(&self, error: ServiceError) {
        self.shared.lock().next_delete_failure = Some(error);
    }

    /// Deliver `error` to every live query, which then ends
    ///
    /// Queries opened before [`InMemoryBackend::restore_feed`] fail at once.
    pub fn fail_feed(&self, error: ServiceError) {
        self.shared.feed.send_replace(Feed::Failed(error));
    }

    /// End every live query without an error
    pub fn close_feed(&self) {
        self.shared.feed.send_replace(Feed::Closed);
    }

    /// Reopen the feed after a failure or close
    pub fn restore_feed(&self) {
        let collection = self.shared.lock();
        let snapshot = Snapshot::synced(collection.todos.clone());
        self.shared.feed.send_replace(Feed::Open(snapshot));
    }

    /// Stop pushing snapshots; writes still apply
    pub fn hold_snapshots(&self) {
        self.shared.lock().held = true;
    }

    /// Resume pushing and deliver the current list
    pub fn release_snapshots(&self) {
        let mut collection = self.shared.lock();
        collection.held = false;
        self.shared.publish(&collection);
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("todos", &self.shared.lock().todos.len())
            .field("open_subscriptions", &self.open_subscriptions())
            .finish_non_exhaustive()
    }
}

impl TodoService for InMemoryBackend {
    fn observe_query(&self) -> BoxStream<'static, Result<Snapshot>> {
        let shared = Arc::clone(&self.shared);

        Box::pin(async_stream::stream! {
            let mut feed = shared.feed.subscribe();
            let _subscription = SubscriptionGuard::open(Arc::clone(&shared));

            loop {
                let current = feed.borrow_and_update().clone();
                match current {
                    Feed::Open(snapshot) => yield Ok(snapshot),
                    Feed::Failed(error) => {
                        yield Err(error);
                        break;
                    },
                    Feed::Closed => break,
                }

                if feed.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn create(&self, content: String) -> impl Future<Output = Result<Todo>> + Send {
        let shared = Arc::clone(&self.shared);

        async move {
            let mut collection = shared.lock();
            collection.create_calls.push(content.clone());
            if let Some(error) = collection.next_create_failure.take() {
                return Err(error);
            }
            let todo = Todo::new(TodoId::generate(), content, shared.clock.now());
            collection.todos.push(todo.clone());
            shared.publish(&collection);
            Ok(todo)
        }
    }

    fn delete(&self, id: TodoId) -> impl Future<Output = Result<Todo>> + Send {
        let shared = Arc::clone(&self.shared);

        async move {
            let mut collection = shared.lock();
            collection.delete_calls.push(id.clone());
            if let Some(error) = collection.next_delete_failure.take() {
                return Err(error);
            }
            let Some(index) = collection.todos.iter().position(|todo| todo.id == id) else {
                return Err(ServiceError::NotFound(id.to_string()));
            };
            let removed = collection.todos.remove(index);
            shared.publish(&collection);
            Ok(removed)
        }
    }
}

/// In-memory session that records sign-out calls
#[derive(Debug)]
pub struct InMemoryAuth {
    signed_in: AtomicBool,
    sign_out_calls: AtomicUsize,
    next_failure: Mutex<Option<ServiceError>>,
}

impl InMemoryAuth {
    /// Creates a signed-in session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signed_in: AtomicBool::new(true),
            sign_out_calls: AtomicUsize::new(0),
            next_failure: Mutex::new(None),
        }
    }

    /// Returns true until a sign-out succeeds
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    /// Number of sign-out requests received
    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Make the next sign-out fail with `error`
    pub fn fail_next_sign_out(&self, error: ServiceError) {
        *self.next_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }
}

impl Default for InMemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthService for InMemoryAuth {
    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            let failure = self
                .next_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            match failure {
                Some(error) => Err(error),
                None => {
                    self.signed_in.store(false, Ordering::SeqCst);
                    Ok(())
                },
            }
        }
    }
}
