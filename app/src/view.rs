//! Text rendering of the todo view.

use crate::types::TodoState;
use std::fmt::Write as _;

/// Notice shown under the list once the app is deployed
pub const HOSTING_NOTICE: &str = "🥳 App successfully hosted. Try creating a new todo.";

/// Follow-up line under the hosting notice
pub const NEXT_STEP: &str = "Review next step of this tutorial.";

/// Where [`NEXT_STEP`] points
pub const NEXT_STEP_URL: &str =
    "https://docs.amplify.aws/react/start/quickstart/#make-frontend-updates";

/// Render the view as plain text.
///
/// Items are numbered from 1 in snapshot order; `del <n>` refers to these
/// numbers. A signed-out view renders only a short notice.
#[must_use]
pub fn render(state: &TodoState) -> String {
    let mut out = String::new();

    if state.session.is_signed_out() {
        out.push_str("Signed out.\n");
        return out;
    }

    out.push_str("My todos\n");
    out.push_str("[+ new]\n");

    for (index, todo) in state.todos.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, todo.content);
    }

    if state.is_loading() {
        out.push_str("Loading...\n");
    }
    if let Some(error) = state.error() {
        let _ = writeln!(out, "Error: {error}");
    }

    let _ = writeln!(out, "{HOSTING_NOTICE}");
    let _ = writeln!(out, "{NEXT_STEP} <{NEXT_STEP_URL}>");
    out.push_str("[Sign out]\n");
    out
}
