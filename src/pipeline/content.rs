//! Content Phase
//!
//! An explicit work queue over the persisted plan: the first `Planned` page
//! in plan order is generated at a time, strictly sequentially, and every
//! outcome is written back through the idempotency key. Failures degrade to
//! a visible `Failed` page rather than an empty one, and are only retried
//! through an explicit regenerate.

use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::provider::{ContentRequest, SharedProvider};
use crate::storage::DocumentStore;
use crate::types::{
    DocloomError, GenerationUnit, OwnerId, RepoId, Result, UnitKey, UnitStatus,
};

/// Tally of one queue drain
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub failed: usize,
}

/// Drains `Planned` pages one at a time for a repository.
pub struct ContentGenerator {
    store: Arc<DocumentStore>,
    provider: SharedProvider,
    owner: OwnerId,
}

impl ContentGenerator {
    pub fn new(store: Arc<DocumentStore>, provider: SharedProvider, owner: OwnerId) -> Self {
        Self {
            store,
            provider,
            owner,
        }
    }

    fn key(&self, repo: &RepoId, title: &str) -> UnitKey {
        UnitKey::new(self.owner.as_str(), repo.as_str(), title)
    }

    /// The next page eligible for generation: first `Planned` in plan order.
    ///
    /// Pages already `Generating` or `Generated` are never selected here;
    /// a stuck `Generating` page (crashed run) needs an explicit
    /// [`reset`](Self::reset) to re-enter the queue.
    pub fn next_planned(&self, repo: &RepoId) -> Result<Option<GenerationUnit>> {
        Ok(self
            .store
            .list(&self.owner, repo)?
            .into_iter()
            .map(|r| r.into_unit())
            .find(|u| u.status == UnitStatus::Planned))
    }

    /// Generate content for one page and persist the outcome.
    ///
    /// A generation-service failure is not an error of this call: the page
    /// is marked `Failed` with the error text as its visible content, and
    /// the drain moves on. Only store failures propagate.
    pub async fn generate_unit(
        &self,
        repo: &RepoId,
        repo_name: &str,
        unit: &GenerationUnit,
        context: &str,
    ) -> Result<GenerationUnit> {
        let key = self.key(repo, &unit.title);
        self.store.set_status(&key, UnitStatus::Generating)?;

        let mut done = unit.clone();
        match self
            .provider
            .page_content(&ContentRequest {
                repo_name: repo_name.to_string(),
                title: unit.title.clone(),
                description: unit.description.clone(),
                context: context.to_string(),
            })
            .await
        {
            Ok(markdown) => {
                self.store
                    .save_content(&key, &markdown, UnitStatus::Generated)?;
                done.content = markdown;
                done.status = UnitStatus::Generated;
                info!(title = %unit.title, "Page generated");
            }
            Err(e) => {
                let body = failure_content(&e);
                self.store.save_content(&key, &body, UnitStatus::Failed)?;
                done.content = body;
                done.status = UnitStatus::Failed;
                warn!(title = %unit.title, error = %e, "Page generation failed");
            }
        }

        Ok(done)
    }

    /// Drain the queue: generate every `Planned` page, one at a time, in
    /// plan order. Per-page failures are isolated; the drain continues.
    pub async fn run(&self, repo: &RepoId, repo_name: &str, context: &str) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while let Some(unit) = self.next_planned(repo)? {
            let done = self.generate_unit(repo, repo_name, &unit, context).await?;
            match done.status {
                UnitStatus::Generated => summary.generated += 1,
                UnitStatus::Failed => summary.failed += 1,
                _ => {}
            }
        }

        info!(
            repo = %repo,
            generated = summary.generated,
            failed = summary.failed,
            "Content queue drained"
        );
        Ok(summary)
    }

    /// Explicit regenerate: move a page back to `Planned` so the next drain
    /// picks it up. Works from any state, including `Generated` and `Failed`.
    pub fn reset(&self, repo: &RepoId, title: &str) -> Result<()> {
        let key = self.key(repo, title);
        if self.store.find(&key)?.is_none() {
            return Err(DocloomError::Storage(format!("no persisted page for {}", key)));
        }
        self.store.set_status(&key, UnitStatus::Planned)
    }
}

/// Visible error body for a failed page; shown in place of content.
fn failure_content(error: &DocloomError) -> String {
    format!(
        "> **Error**: Failed to generate content for this section.\n> \n> *{}*",
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{
        ChatRequest, ChunkStream, GenerationProvider, PlanRequest, PlannedSection,
    };
    use crate::storage::Database;
    use crate::types::GenerationPhase;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that fails any title containing "broken" and records calls.
    struct MockProvider {
        content_calls: AtomicUsize,
        in_flight: AtomicUsize,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                content_calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for MockProvider {
        async fn plan_structure(&self, _request: &PlanRequest) -> Result<Vec<PlannedSection>> {
            unimplemented!("not used by content tests")
        }

        async fn page_content(&self, request: &ContentRequest) -> Result<String> {
            // Sequentiality check: no overlapping content calls
            assert_eq!(self.in_flight.fetch_add(1, Ordering::SeqCst), 0);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.content_calls.fetch_add(1, Ordering::SeqCst);
            if request.title.contains("broken") {
                return Err(DocloomError::generation(
                    GenerationPhase::Content,
                    "model exploded",
                ));
            }
            Ok(format!("## {}\n\ngenerated body", request.title))
        }

        async fn chat_stream(&self, _request: ChatRequest) -> Result<ChunkStream> {
            unimplemented!("not used by content tests")
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn fixture() -> (ContentGenerator, Arc<DocumentStore>, Arc<MockProvider>, RepoId) {
        let store = Arc::new(DocumentStore::new(Arc::new(
            Database::open_in_memory().unwrap(),
        )));
        let provider = Arc::new(MockProvider::new());
        let generator = ContentGenerator::new(
            Arc::clone(&store),
            provider.clone(),
            OwnerId::new("alice"),
        );
        (generator, store, provider, RepoId::new("acme/widgets"))
    }

    fn seed(store: &DocumentStore, repo: &RepoId, titles: &[&str]) {
        for title in titles {
            store
                .upsert_planned(
                    &UnitKey::new("alice", repo.as_str(), *title),
                    "Cat",
                    "desc",
                )
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_run_drains_in_plan_order() {
        let (generator, store, provider, repo) = fixture();
        seed(&store, &repo, &["First", "Second", "Third"]);

        let summary = generator.run(&repo, "widgets", "ctx").await.unwrap();
        assert_eq!(summary, RunSummary { generated: 3, failed: 0 });
        assert_eq!(provider.content_calls.load(Ordering::SeqCst), 3);

        let records = store
            .list(&OwnerId::new("alice"), &repo)
            .unwrap();
        assert!(records.iter().all(|r| r.status == UnitStatus::Generated));
        assert!(records[0].content.contains("## First"));
    }

    #[tokio::test]
    async fn test_failure_degrades_to_visible_failed_page() {
        let (generator, store, _provider, repo) = fixture();
        seed(&store, &repo, &["Fine", "broken page", "Also fine"]);

        let summary = generator.run(&repo, "widgets", "ctx").await.unwrap();
        assert_eq!(summary, RunSummary { generated: 2, failed: 1 });

        let failed = store
            .find(&UnitKey::new("alice", repo.as_str(), "broken page"))
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, UnitStatus::Failed);
        assert!(failed.content.contains("**Error**"));
        assert!(failed.content.contains("model exploded"));
    }

    #[tokio::test]
    async fn test_second_drain_is_a_no_op() {
        let (generator, store, provider, repo) = fixture();
        seed(&store, &repo, &["Only"]);

        generator.run(&repo, "widgets", "ctx").await.unwrap();
        let summary = generator.run(&repo, "widgets", "ctx").await.unwrap();

        assert_eq!(summary, RunSummary::default());
        assert_eq!(provider.content_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_page_not_auto_retried() {
        let (generator, store, provider, repo) = fixture();
        seed(&store, &repo, &["broken one"]);

        generator.run(&repo, "widgets", "ctx").await.unwrap();
        generator.run(&repo, "widgets", "ctx").await.unwrap();

        // One attempt, despite two drains
        assert_eq!(provider.content_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_requeues_any_state() {
        let (generator, store, provider, repo) = fixture();
        seed(&store, &repo, &["Page"]);

        generator.run(&repo, "widgets", "ctx").await.unwrap();
        generator.reset(&repo, "Page").unwrap();
        let summary = generator.run(&repo, "widgets", "ctx").await.unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(provider.content_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_unknown_page_errors() {
        let (generator, _store, _provider, repo) = fixture();
        assert!(generator.reset(&repo, "Ghost").is_err());
    }

    #[tokio::test]
    async fn test_next_planned_skips_non_planned() {
        let (generator, store, _provider, repo) = fixture();
        seed(&store, &repo, &["A", "B"]);
        store
            .set_status(
                &UnitKey::new("alice", repo.as_str(), "A"),
                UnitStatus::Generating,
            )
            .unwrap();

        let next = generator.next_planned(&repo).unwrap().unwrap();
        assert_eq!(next.title, "B");
    }
}
