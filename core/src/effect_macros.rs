//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants, in
//! particular the boxing and pinning that futures and streams need.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use live_todo_core::async_effect;
///
/// async_effect! {
///     match client.delete(&id).await {
///         Ok(todo) => Some(TodoAction::TodoDeleted { id: todo.id }),
///         Err(error) => Some(TodoAction::DeleteFailed { error: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Stream` from any `Stream<Item = Action> + Send + 'static`
///
/// # Example
///
/// ```rust,ignore
/// use live_todo_core::stream_effect;
/// use futures::StreamExt;
///
/// stream_effect!(client.observe_query().map(TodoAction::from_delivery))
/// ```
#[macro_export]
macro_rules! stream_effect {
    ($stream:expr) => {
        $crate::effect::Effect::Stream(::std::boxed::Box::pin($stream))
    };
}
