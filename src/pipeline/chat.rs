//! Grounded Chat
//!
//! Answers questions against the published documentation of one repository.
//! Context is rebuilt from the store on every call (published sections
//! only), history is sanitized to the starts-with-user contract, and the
//! answer streams back chunk-by-chunk.

use tracing::debug;

use crate::ai::provider::{ChatRequest, ChunkStream, GenerationProvider};
use crate::ai::sanitize::sanitize_history;
use crate::context::published_sections_context;
use crate::storage::DocumentStore;
use crate::types::{ChatTurn, OwnerId, RepoId, Result};

/// Stream a grounded answer over the repository's published pages.
///
/// The returned stream is finite and not restartable; abandoning it mid-way
/// is safe and rolls nothing back. Oversized context truncates rather than
/// erroring.
pub async fn answer_in_context(
    provider: &dyn GenerationProvider,
    store: &DocumentStore,
    owner: &OwnerId,
    repo: &RepoId,
    history: Vec<ChatTurn>,
    query: impl Into<String>,
) -> Result<ChunkStream> {
    let published: Vec<_> = store
        .list_published(owner, repo)?
        .into_iter()
        .map(|r| r.into_unit())
        .collect();

    debug!(repo = %repo, sections = published.len(), "Building chat context");
    let context = published_sections_context(repo, &published);
    let history = sanitize_history(history);

    provider
        .chat_stream(ChatRequest {
            history,
            context,
            query: query.into(),
        })
        .await
}
