//! Domain types for the live todo view.
//!
//! The remote service owns every `Todo`: ids and timestamps are assigned
//! there, and the local list is only ever a copy of the latest snapshot.

use chrono::{DateTime, Utc};
use live_todo_macros::{Action, State};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the remote service
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps an identifier received from the remote service
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single todo record as the remote service stores it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// Free text entered by the user
    pub content: String,
    /// Set by the service on creation
    pub created_at: DateTime<Utc>,
    /// Set by the service on every write
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a record stamped with the same creation and update time
    #[must_use]
    pub fn new(id: TodoId, content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id,
            content: content.into(),
            created_at: at,
            updated_at: at,
        }
    }
}

/// Full list pushed by the live query
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Every item matching the query, in service order
    pub items: Vec<Todo>,
    /// True once the service has caught up with its backing store
    #[serde(rename = "isSynced")]
    pub synced: bool,
}

impl Snapshot {
    /// Creates a synced snapshot from a list of items
    #[must_use]
    pub const fn synced(items: Vec<Todo>) -> Self {
        Self { items, synced: true }
    }
}

/// Whether the live query is currently held open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    /// No subscription; snapshots are ignored
    #[default]
    Idle,
    /// Subscribed and accepting snapshots
    Active,
}

impl SubscriptionStatus {
    /// Returns true while subscribed
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Authentication state of the current user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Signed in; the view is live
    #[default]
    SignedIn,
    /// Signed out; the view is torn down
    SignedOut,
}

impl SessionStatus {
    /// Returns true once the user has signed out
    #[must_use]
    pub const fn is_signed_out(self) -> bool {
        matches!(self, Self::SignedOut)
    }
}

/// State of the todo view
///
/// `todos` is always exactly the last accepted snapshot. Nothing in the
/// view reorders, filters or patches it locally.
#[derive(State, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// Items of the latest snapshot, in service order
    pub todos: Vec<Todo>,
    /// True between mount and the first snapshot or failure
    #[loading]
    pub is_loading: bool,
    /// Last failure message, replaced by each new failure
    #[last_error]
    pub error: Option<String>,
    /// Live query status
    pub subscription: SubscriptionStatus,
    /// Session status
    pub session: SessionStatus,
    /// When the latest snapshot was applied
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

impl TodoState {
    /// Creates an empty, unmounted view
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    /// Returns the todo shown at a 1-based position
    #[must_use]
    pub fn nth(&self, position: usize) -> Option<&Todo> {
        position.checked_sub(1).and_then(|index| self.todos.get(index))
    }
}

/// Actions for the todo view
///
/// Intents come from the user; feedback comes back from effects.
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    // Intents
    /// The view appeared; open the live query
    #[intent]
    Mount,

    /// The view went away; release the live query
    #[intent]
    Unmount,

    /// Create a todo from prompt input (`None` when the prompt was cancelled)
    #[intent]
    CreateTodo {
        /// Text entered in the prompt
        content: Option<String>,
    },

    /// Delete the clicked todo
    #[intent]
    DeleteTodo {
        /// Item to delete
        id: TodoId,
    },

    /// Sign the user out
    #[intent]
    SignOut,

    /// Hide the current error message
    #[intent]
    DismissError,

    // Feedback
    /// The live query pushed a new snapshot
    #[feedback]
    SnapshotReceived {
        /// Full list as the service sees it
        snapshot: Snapshot,
    },

    /// The live query reported a delivery failure
    #[feedback]
    SubscriptionFailed {
        /// Error message
        error: String,
    },

    /// The live query ended from the remote side
    #[feedback]
    SubscriptionClosed,

    /// Create request succeeded
    #[feedback]
    TodoCreated {
        /// Record returned by the service
        todo: Todo,
    },

    /// Create request failed
    #[feedback]
    CreateFailed {
        /// Error message
        error: String,
    },

    /// Delete request succeeded
    #[feedback]
    TodoDeleted {
        /// Deleted item
        id: TodoId,
    },

    /// Delete request failed
    #[feedback]
    DeleteFailed {
        /// Item the request was for
        id: TodoId,
        /// Error message
        error: String,
    },

    /// Sign-out completed
    #[feedback]
    SignedOut,

    /// Sign-out failed
    #[feedback]
    SignOutFailed {
        /// Error message
        error: String,
    },
}
