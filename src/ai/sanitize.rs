//! Chat History Sanitization
//!
//! The chat API rejects histories that do not open with a user turn, but
//! transcripts routinely start with canned model greetings. Sanitization
//! strips leading model turns until the first user turn (or the history is
//! empty) so every submitted history satisfies the contract.

use crate::types::{ChatRole, ChatTurn};

/// Drop leading model turns so the history starts with a user turn.
///
/// The result is either empty or begins with `ChatRole::User`. Turns after
/// the first user turn are preserved untouched, whatever their roles.
pub fn sanitize_history(turns: Vec<ChatTurn>) -> Vec<ChatTurn> {
    let skip = turns
        .iter()
        .take_while(|t| t.role == ChatRole::Model)
        .count();

    if skip > 0 {
        tracing::debug!(stripped = skip, "Stripped leading model turns from chat history");
    }

    turns.into_iter().skip(skip).collect()
}

/// Check the invariant the sanitizer guarantees.
pub fn starts_with_user(turns: &[ChatTurn]) -> bool {
    turns
        .first()
        .map(|t| t.role == ChatRole::User)
        .unwrap_or(true)
}
