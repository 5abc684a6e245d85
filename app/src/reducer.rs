//! Reducer logic for the todo view.
//!
//! The list is a mirror: it is replaced wholesale by each accepted snapshot
//! and never touched by create or delete results. Remote calls run as
//! effects, and their outcomes come back as feedback actions.

use crate::environment::{AuthService, TodoEnvironment, TodoService};
use crate::error::ViewError;
use crate::metrics::{RequestMetrics, SubscriptionMetrics};
use crate::types::{SessionStatus, SubscriptionStatus, TodoAction, TodoId, TodoState};
use futures::StreamExt;
use live_todo_core::{
    async_effect, effect::Effect, reducer::Reducer, smallvec, stream_effect, EffectId, SmallVec,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// Cancellation id of the live query effect
pub const SUBSCRIPTION_ID: &str = "todo-subscription";

/// Reducer for the todo view
pub struct TodoReducer<S, A> {
    _services: PhantomData<fn() -> (S, A)>,
}

impl<S, A> TodoReducer<S, A>
where
    S: TodoService + 'static,
    A: AuthService + 'static,
{
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _services: PhantomData,
        }
    }

    /// Opens the live query as a cancellable stream of feedback actions
    fn subscribe(env: &TodoEnvironment<S, A>) -> Effect<TodoAction> {
        let feed = env
            .todos
            .observe_query()
            .map(|delivery| match delivery {
                Ok(snapshot) => TodoAction::SnapshotReceived { snapshot },
                Err(error) => TodoAction::SubscriptionFailed {
                    error: ViewError::SubscriptionDelivery(error).to_string(),
                },
            })
            .chain(futures::stream::once(async { TodoAction::SubscriptionClosed }));

        stream_effect!(feed).cancellable(SUBSCRIPTION_ID)
    }

    fn create(env: &TodoEnvironment<S, A>, content: String) -> Effect<TodoAction> {
        RequestMetrics::record_issued("create");
        let todos = Arc::clone(&env.todos);
        async_effect! {
            match todos.create(content).await {
                Ok(todo) => Some(TodoAction::TodoCreated { todo }),
                Err(error) => {
                    RequestMetrics::record_failure("create");
                    Some(TodoAction::CreateFailed {
                        error: ViewError::CreateRequest(error).to_string(),
                    })
                },
            }
        }
    }

    fn delete(env: &TodoEnvironment<S, A>, id: TodoId) -> Effect<TodoAction> {
        RequestMetrics::record_issued("delete");
        let todos = Arc::clone(&env.todos);
        async_effect! {
            match todos.delete(id.clone()).await {
                Ok(_) => Some(TodoAction::TodoDeleted { id }),
                Err(error) => {
                    RequestMetrics::record_failure("delete");
                    Some(TodoAction::DeleteFailed {
                        id,
                        error: ViewError::DeleteRequest(error).to_string(),
                    })
                },
            }
        }
    }

    fn sign_out(env: &TodoEnvironment<S, A>) -> Effect<TodoAction> {
        RequestMetrics::record_issued("sign_out");
        let auth = Arc::clone(&env.auth);
        async_effect! {
            match auth.sign_out().await {
                Ok(()) => Some(TodoAction::SignedOut),
                Err(error) => {
                    RequestMetrics::record_failure("sign_out");
                    Some(TodoAction::SignOutFailed {
                        error: ViewError::SignOut(error).to_string(),
                    })
                },
            }
        }
    }

    /// Marks the subscription idle, returning the cancel effect if it was live
    fn unsubscribe(state: &mut TodoState) -> Option<Effect<TodoAction>> {
        if !state.subscription.is_active() {
            return None;
        }
        state.subscription = SubscriptionStatus::Idle;
        state.set_loading(false);
        Some(Effect::Cancel(EffectId::new(SUBSCRIPTION_ID)))
    }

    /// Feedback from the live query only counts while it is held open
    fn accepts_feed(state: &TodoState) -> bool {
        state.subscription.is_active() && !state.session.is_signed_out()
    }
}

impl<S, A> Default for TodoReducer<S, A>
where
    S: TodoService + 'static,
    A: AuthService + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Clone for TodoReducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            _services: PhantomData,
        }
    }
}

impl<S, A> std::fmt::Debug for TodoReducer<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TodoReducer")
    }
}

impl<S, A> Reducer for TodoReducer<S, A>
where
    S: TodoService + 'static,
    A: AuthService + 'static,
{
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment<S, A>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(action = action.name(), intent = action.is_intent(), "reducing");

        if action.is_intent()
            && state.session.is_signed_out()
            && !matches!(action, TodoAction::DismissError)
        {
            tracing::debug!(action = action.name(), "ignoring intent after sign-out");
            return SmallVec::new();
        }

        match action {
            // ========== Intents ==========
            TodoAction::Mount => {
                if state.subscription.is_active() {
                    return SmallVec::new();
                }
                state.subscription = SubscriptionStatus::Active;
                state.set_loading(true);
                tracing::debug!("opening live query");
                smallvec![Self::subscribe(env)]
            },

            TodoAction::Unmount => Self::unsubscribe(state).into_iter().collect(),

            TodoAction::CreateTodo { content } => match content {
                Some(content) if !content.is_empty() => smallvec![Self::create(env, content)],
                _ => SmallVec::new(),
            },

            TodoAction::DeleteTodo { id } => smallvec![Self::delete(env, id)],

            TodoAction::SignOut => smallvec![Self::sign_out(env)],

            TodoAction::DismissError => {
                state.clear_error();
                SmallVec::new()
            },

            // ========== Feedback ==========
            TodoAction::SnapshotReceived { snapshot } => {
                if !Self::accepts_feed(state) {
                    tracing::trace!("dropping snapshot delivered after unsubscribe");
                    return SmallVec::new();
                }
                SubscriptionMetrics::record_snapshot(snapshot.items.len());
                tracing::debug!(
                    items = snapshot.items.len(),
                    synced = snapshot.synced,
                    "snapshot received"
                );
                state.todos = snapshot.items;
                state.set_loading(false);
                state.last_snapshot_at = Some(env.clock.now());
                SmallVec::new()
            },

            TodoAction::SubscriptionFailed { error } => {
                if Self::accepts_feed(state) {
                    tracing::warn!(%error, "live query failed");
                    state.record_error(error);
                }
                SmallVec::new()
            },

            TodoAction::SubscriptionClosed => {
                if Self::accepts_feed(state) {
                    tracing::debug!("live query closed by the service");
                    state.subscription = SubscriptionStatus::Idle;
                    state.set_loading(false);
                }
                SmallVec::new()
            },

            TodoAction::TodoCreated { todo } => {
                tracing::debug!(id = %todo.id, "todo created");
                SmallVec::new()
            },

            TodoAction::TodoDeleted { id } => {
                tracing::debug!(%id, "todo deleted");
                SmallVec::new()
            },

            TodoAction::CreateFailed { error } | TodoAction::SignOutFailed { error } => {
                tracing::warn!(%error, "request failed");
                state.error = Some(error);
                SmallVec::new()
            },

            TodoAction::DeleteFailed { id, error } => {
                tracing::warn!(%id, %error, "delete failed");
                state.error = Some(error);
                SmallVec::new()
            },

            TodoAction::SignedOut => {
                tracing::info!("signed out");
                let cancel = Self::unsubscribe(state);
                state.session = SessionStatus::SignedOut;
                state.todos.clear();
                state.last_snapshot_at = None;
                cancel.into_iter().collect()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryAuth, InMemoryBackend};
    use crate::error::ServiceError;
    use crate::types::{Snapshot, Todo};
    use live_todo_core::environment::Clock;
    use live_todo_testing::{assertions, test_clock, ReducerTest};

    type TestEnv = TodoEnvironment<InMemoryBackend, InMemoryAuth>;
    type TestReducer = TodoReducer<InMemoryBackend, InMemoryAuth>;

    fn create_test_env() -> (TestEnv, Arc<InMemoryBackend>, Arc<InMemoryAuth>) {
        let clock: Arc<dyn Clock> = Arc::new(test_clock());
        let backend = Arc::new(InMemoryBackend::new(Arc::clone(&clock)));
        let auth = Arc::new(InMemoryAuth::new());
        let env = TodoEnvironment::new(Arc::clone(&backend), Arc::clone(&auth), clock);
        (env, backend, auth)
    }

    fn todo(id: &str, content: &str) -> Todo {
        Todo::new(TodoId::new(id), content, test_clock().now())
    }

    fn mounted() -> TodoState {
        TodoState {
            subscription: SubscriptionStatus::Active,
            is_loading: true,
            ..TodoState::new()
        }
    }

    /// Runs the single future effect and returns the action it produced
    #[allow(clippy::panic)]
    fn run_future(mut effects: SmallVec<[Effect<TodoAction>; 4]>) -> Option<TodoAction> {
        assert_eq!(effects.len(), 1, "expected exactly one effect");
        match effects.remove(0) {
            Effect::Future(fut) => tokio_test::block_on(fut),
            other => panic!("expected a future effect, got {other:?}"),
        }
    }

    #[test]
    fn test_mount_opens_subscription() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .when_action(TodoAction::Mount)
            .then_state(|state| {
                assert!(state.is_loading);
                assert!(state.subscription.is_active());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_stream_effect(effects);
                assertions::assert_cancellable(effects, SUBSCRIPTION_ID);
            })
            .run();
    }

    #[test]
    fn test_mount_twice_subscribes_once() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![TodoAction::Mount])
            .when_action(TodoAction::Mount)
            .then_state(|state| assert!(state.subscription.is_active()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_unmount_cancels_subscription() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![TodoAction::Mount])
            .when_action(TodoAction::Unmount)
            .then_state(|state| {
                assert_eq!(state.subscription, SubscriptionStatus::Idle);
                assert!(!state.is_loading);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_cancels(effects, SUBSCRIPTION_ID);
            })
            .run();
    }

    #[test]
    fn test_unmount_when_idle_is_noop() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![TodoAction::Mount, TodoAction::Unmount])
            .when_action(TodoAction::Unmount)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_snapshot_replaces_list_in_order() {
        let (env, _, _) = create_test_env();
        let snapshot = Snapshot::synced(vec![todo("2", "eggs"), todo("1", "milk")]);
        let expected = snapshot.items.clone();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                todos: vec![todo("1", "milk"), todo("3", "bread")],
                ..mounted()
            })
            .when_action(TodoAction::SnapshotReceived { snapshot })
            .then_state(move |state| {
                assert_eq!(state.todos, expected);
                assert!(!state.is_loading);
                assert_eq!(state.last_snapshot_at, Some(test_clock().now()));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_empty_snapshot_clears_list() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                todos: vec![todo("1", "milk")],
                ..mounted()
            })
            .when_action(TodoAction::SnapshotReceived {
                snapshot: Snapshot::default(),
            })
            .then_state(|state| assert!(state.todos.is_empty()))
            .run();
    }

    #[test]
    fn test_snapshot_after_unmount_is_ignored() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![TodoAction::Mount, TodoAction::Unmount])
            .when_action(TodoAction::SnapshotReceived {
                snapshot: Snapshot::synced(vec![todo("1", "milk")]),
            })
            .then_state(|state| {
                assert!(state.todos.is_empty());
                assert_eq!(state.last_snapshot_at, None);
            })
            .run();
    }

    #[test]
    fn test_failure_after_unmount_is_ignored() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![TodoAction::Mount, TodoAction::Unmount])
            .when_action(TodoAction::SubscriptionFailed {
                error: "Could not load todos: Service unavailable: offline".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.error, None);
                assert!(!state.is_loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_close_after_unmount_is_ignored() {
        let (env, _, _) = create_test_env();
        let list = vec![todo("1", "milk")];
        let expected = list.clone();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![
                TodoAction::Mount,
                TodoAction::SnapshotReceived {
                    snapshot: Snapshot::synced(list),
                },
                TodoAction::Unmount,
            ])
            .when_action(TodoAction::SubscriptionClosed)
            .then_state(move |state| {
                assert_eq!(state.todos, expected);
                assert!(!state.subscription.is_active());
                assert!(!state.is_loading);
                assert_eq!(state.error, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_snapshot_after_sign_out_is_ignored() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState::new())
            .given_actions(vec![TodoAction::Mount, TodoAction::SignedOut])
            .when_action(TodoAction::SnapshotReceived {
                snapshot: Snapshot::synced(vec![todo("1", "milk")]),
            })
            .then_state(|state| {
                assert!(state.todos.is_empty());
                assert!(state.session.is_signed_out());
                assert_eq!(state.last_snapshot_at, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_subscription_failure_sets_error_and_stops_loading() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(mounted())
            .when_action(TodoAction::SubscriptionFailed {
                error: "Could not load todos: Service unavailable: offline".to_string(),
            })
            .then_state(|state| {
                assert!(!state.is_loading);
                assert!(state.error.as_deref().is_some_and(|e| !e.is_empty()));
            })
            .run();
    }

    #[test]
    fn test_subscription_closed_goes_idle_and_keeps_list() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                todos: vec![todo("1", "milk")],
                ..mounted()
            })
            .when_action(TodoAction::SubscriptionClosed)
            .then_state(|state| {
                assert_eq!(state.subscription, SubscriptionStatus::Idle);
                assert!(!state.is_loading);
                assert_eq!(state.count(), 1);
            })
            .run();
    }

    #[test]
    fn test_create_without_content_does_nothing() {
        for content in [None, Some(String::new())] {
            let (env, _, _) = create_test_env();

            ReducerTest::new(TestReducer::new())
                .with_env(env)
                .given_state(mounted())
                .when_action(TodoAction::CreateTodo { content })
                .then_state(|state| assert_eq!(*state, mounted()))
                .then_effects(assertions::assert_no_effects)
                .run();
        }
    }

    #[test]
    fn test_create_issues_one_request() {
        let (env, backend, _) = create_test_env();
        let mut state = mounted();

        let effects = TestReducer::new().reduce(
            &mut state,
            TodoAction::CreateTodo {
                content: Some("milk".to_string()),
            },
            &env,
        );

        assert_eq!(state, mounted(), "create must not touch the list");
        let feedback = run_future(effects);
        assert!(matches!(
            feedback,
            Some(TodoAction::TodoCreated { ref todo }) if todo.content == "milk"
        ));
        assert_eq!(backend.create_calls(), vec!["milk".to_string()]);
    }

    #[test]
    fn test_whitespace_content_is_sent() {
        let (env, backend, _) = create_test_env();
        let mut state = mounted();

        let effects = TestReducer::new().reduce(
            &mut state,
            TodoAction::CreateTodo {
                content: Some("  ".to_string()),
            },
            &env,
        );

        let _ = run_future(effects);
        assert_eq!(backend.create_calls(), vec!["  ".to_string()]);
    }

    #[test]
    fn test_delete_issues_one_request() {
        let (env, backend, _) = create_test_env();
        let existing = backend.insert("milk");
        let mut state = TodoState {
            todos: vec![existing.clone()],
            ..mounted()
        };

        let effects = TestReducer::new().reduce(
            &mut state,
            TodoAction::DeleteTodo {
                id: existing.id.clone(),
            },
            &env,
        );

        assert_eq!(state.todos, vec![existing.clone()]);
        assert_eq!(
            run_future(effects),
            Some(TodoAction::TodoDeleted {
                id: existing.id.clone()
            })
        );
        assert_eq!(backend.delete_calls(), vec![existing.id]);
    }

    #[test]
    #[allow(clippy::panic)]
    fn test_delete_failure_reports_error() {
        let (env, backend, _) = create_test_env();
        let mut state = mounted();

        let effects = TestReducer::new().reduce(
            &mut state,
            TodoAction::DeleteTodo { id: "missing".into() },
            &env,
        );

        let Some(TodoAction::DeleteFailed { id, error }) = run_future(effects) else {
            panic!("expected DeleteFailed");
        };
        assert_eq!(id, TodoId::new("missing"));
        assert!(error.contains("not found"));
        assert_eq!(backend.delete_calls().len(), 1);
    }

    #[test]
    fn test_request_results_leave_list_alone() {
        let (env, _, _) = create_test_env();
        let list = vec![todo("1", "milk")];
        let expected = list.clone();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                todos: list,
                ..mounted()
            })
            .given_actions(vec![TodoAction::TodoCreated {
                todo: todo("2", "eggs"),
            }])
            .when_action(TodoAction::TodoDeleted { id: "1".into() })
            .then_state(move |state| assert_eq!(state.todos, expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_failure_keeps_list_and_loading() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                todos: vec![todo("1", "milk")],
                ..mounted()
            })
            .given_actions(vec![TodoAction::CreateFailed {
                error: "first".to_string(),
            }])
            .when_action(TodoAction::CreateFailed {
                error: "second".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.error.as_deref(), Some("second"));
                assert_eq!(state.count(), 1);
                assert!(state.is_loading, "request failures do not end the load");
            })
            .run();
    }

    #[test]
    fn test_dismiss_error() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                error: Some("boom".to_string()),
                ..TodoState::new()
            })
            .when_action(TodoAction::DismissError)
            .then_state(|state| assert_eq!(state.error, None))
            .run();
    }

    #[test]
    fn test_sign_out_calls_auth_service() {
        let (env, _, auth) = create_test_env();
        let mut state = mounted();

        let effects = TestReducer::new().reduce(&mut state, TodoAction::SignOut, &env);

        assert_eq!(run_future(effects), Some(TodoAction::SignedOut));
        assert_eq!(auth.sign_out_calls(), 1);
    }

    #[test]
    fn test_sign_out_failure_reports_error() {
        let (env, _, auth) = create_test_env();
        auth.fail_next_sign_out(ServiceError::Unavailable("offline".to_string()));
        let mut state = mounted();

        let effects = TestReducer::new().reduce(&mut state, TodoAction::SignOut, &env);

        assert_eq!(
            run_future(effects),
            Some(TodoAction::SignOutFailed {
                error: "Could not sign out: Service unavailable: offline".to_string()
            })
        );
    }

    #[test]
    fn test_signed_out_tears_down_view() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                todos: vec![todo("1", "milk")],
                ..mounted()
            })
            .when_action(TodoAction::SignedOut)
            .then_state(|state| {
                assert!(state.todos.is_empty());
                assert!(state.session.is_signed_out());
                assert!(!state.subscription.is_active());
            })
            .then_effects(|effects| assertions::assert_cancels(effects, SUBSCRIPTION_ID))
            .run();
    }

    #[test]
    fn test_intents_after_sign_out_are_ignored() {
        let (env, _, _) = create_test_env();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(TodoState {
                session: SessionStatus::SignedOut,
                ..TodoState::new()
            })
            .when_action(TodoAction::Mount)
            .then_state(|state| assert!(!state.subscription.is_active()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
