//! Injected collaborators for the todo view.
//!
//! The reducer never reaches for a global client. Everything remote sits
//! behind these traits and is handed to [`TodoEnvironment::new`].

use crate::error::Result;
use crate::types::{Snapshot, Todo, TodoId};
use futures::stream::BoxStream;
use live_todo_core::environment::Clock;
use std::future::Future;
use std::sync::Arc;

/// Remote todo collection.
///
/// # Implementation Notes
///
/// - `observe_query` pushes the full list on subscribe and after every
///   change. Dropping the stream releases the subscription.
/// - `create` and `delete` only issue the request. The list changes when
///   the next snapshot arrives, never from their results.
pub trait TodoService: Send + Sync {
    /// Open a live query over every todo.
    ///
    /// Each item is either a full snapshot or a delivery failure.
    fn observe_query(&self) -> BoxStream<'static, Result<Snapshot>>;

    /// Create a todo.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The service is unreachable
    /// - The service rejects the content
    fn create(&self, content: String) -> impl Future<Output = Result<Todo>> + Send;

    /// Delete a todo.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The service is unreachable
    /// - No todo has this id → `ServiceError::NotFound`
    fn delete(&self, id: TodoId) -> impl Future<Output = Result<Todo>> + Send;
}

/// Authentication collaborator.
pub trait AuthService: Send + Sync {
    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot end the session.
    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Environment dependencies for the todo reducer
pub struct TodoEnvironment<S, A> {
    /// Remote todo collection
    pub todos: Arc<S>,
    /// Authentication service
    pub auth: Arc<A>,
    /// Clock for stamping snapshot arrival
    pub clock: Arc<dyn Clock>,
}

impl<S, A> TodoEnvironment<S, A> {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(todos: Arc<S>, auth: Arc<A>, clock: Arc<dyn Clock>) -> Self {
        Self { todos, auth, clock }
    }
}

impl<S, A> Clone for TodoEnvironment<S, A> {
    fn clone(&self) -> Self {
        Self {
            todos: Arc::clone(&self.todos),
            auth: Arc::clone(&self.auth),
            clock: Arc::clone(&self.clock),
        }
    }
}
