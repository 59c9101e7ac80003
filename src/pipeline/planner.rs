//! Plan Phase
//!
//! Drives the structural-planning half of the pipeline. Planning is
//! intent-aware: opening an existing project hydrates persisted pages and
//! spends no generation calls, while an explicit regenerate re-plans and
//! refreshes the stored structure through idempotency-key upserts.

use std::sync::Arc;

use tracing::{debug, info};

use crate::ai::provider::{PlanRequest, SharedProvider};
use crate::connector::Connector;
use crate::constants::ranking;
use crate::context::ContextAssembler;
use crate::storage::DocumentStore;
use crate::types::{
    GenerationUnit, OwnerId, ProjectMetadata, RepoId, Result, UnitKey,
};

/// Caller intent for a plan invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanIntent {
    /// Resume an existing project: hydrate persisted pages when any exist
    Open,
    /// Start over: always re-plan, refreshing stored titles/categories
    Regenerate,
}

/// Result of a plan invocation
#[derive(Debug)]
pub struct PlanOutcome {
    /// Ordered units; order defines content-phase scheduling
    pub units: Vec<GenerationUnit>,
    /// Assembled deep context (empty when fully hydrated from the store)
    pub context: String,
    /// Canonical repository identity the units are keyed under
    pub repo: RepoId,
    /// Present when the source was actually contacted
    pub metadata: Option<ProjectMetadata>,
}

/// Plans documentation structure for a project source.
pub struct DocPlanner {
    store: Arc<DocumentStore>,
    provider: SharedProvider,
    owner: OwnerId,
    rank_limit: usize,
}

impl DocPlanner {
    pub fn new(store: Arc<DocumentStore>, provider: SharedProvider, owner: OwnerId) -> Self {
        Self {
            store,
            provider,
            owner,
            rank_limit: ranking::DEFAULT_LIMIT,
        }
    }

    pub fn with_rank_limit(mut self, limit: usize) -> Self {
        self.rank_limit = limit;
        self
    }

    /// Run the plan phase against a connector.
    ///
    /// Under `Open` intent the persistent store is consulted first - via the
    /// connector's network-free identity hint - and any persisted pages
    /// short-circuit planning entirely. The source is contacted only to
    /// backfill context while empty drafts remain. A plan-call failure
    /// aborts before any persistence.
    pub async fn plan(&self, connector: &dyn Connector, intent: PlanIntent) -> Result<PlanOutcome> {
        if intent == PlanIntent::Open {
            if let Some(repo) = connector.identity_hint() {
                if let Some(outcome) = self.hydrate(connector, &repo).await? {
                    return Ok(outcome);
                }
            }
        }

        // Contact the source for real
        let metadata = connector.connect().await?;
        let repo = canonical_repo(&metadata);

        // The hint may have missed records keyed under the canonical identity
        if intent == PlanIntent::Open && connector.identity_hint().as_ref() != Some(&repo) {
            if let Some(outcome) = self.hydrate(connector, &repo).await? {
                return Ok(outcome);
            }
        }

        let tree_text = connector.tree_text().await?;
        let ranked = connector.important_files(self.rank_limit).await?;
        let context = ContextAssembler::new(connector).assemble(&ranked).await?;
        let manifest = connector.get_file_content("package.json").await.ok();

        info!(repo = %repo, files = ranked.len(), "Requesting documentation plan");
        let sections = self
            .provider
            .plan_structure(&PlanRequest {
                repo_name: metadata.name.clone(),
                tree_text,
                manifest,
                context: context.clone(),
            })
            .await?;

        // Persist drafts; existing rows only get their plan fields refreshed
        let mut units = Vec::with_capacity(sections.len());
        for section in sections {
            let key = UnitKey::new(self.owner.as_str(), repo.as_str(), section.title.as_str());
            let record =
                self.store
                    .upsert_planned(&key, &section.category, &section.description)?;

            units.push(GenerationUnit {
                id: section.id,
                title: section.title,
                category: section.category,
                description: section.description,
                content: record.content,
                status: record.status,
                document_id: Some(record.id),
                published: record.published,
            });
        }

        info!(repo = %repo, units = units.len(), "Documentation plan persisted");
        Ok(PlanOutcome {
            units,
            context,
            repo,
            metadata: Some(metadata),
        })
    }

    /// Hydrate persisted pages for a repository, if any exist.
    ///
    /// Context is re-assembled only while empty drafts remain (they still
    /// need generation); fully generated projects skip the source entirely.
    async fn hydrate(
        &self,
        connector: &dyn Connector,
        repo: &RepoId,
    ) -> Result<Option<PlanOutcome>> {
        let records = self.store.list(&self.owner, repo)?;
        if records.is_empty() {
            return Ok(None);
        }

        let units: Vec<GenerationUnit> =
            records.into_iter().map(|r| r.into_unit()).collect();
        let has_drafts = units.iter().any(|u| u.is_draft());

        if !has_drafts {
            debug!(repo = %repo, units = units.len(), "Restored fully generated pages from store");
            return Ok(Some(PlanOutcome {
                units,
                context: String::new(),
                repo: repo.clone(),
                metadata: None,
            }));
        }

        debug!(repo = %repo, "Drafts remain; assembling context for backfill");
        let metadata = connector.connect().await?;
        let ranked = connector.important_files(self.rank_limit).await?;
        let context = ContextAssembler::new(connector).assemble(&ranked).await?;

        Ok(Some(PlanOutcome {
            units,
            context,
            repo: repo.clone(),
            metadata: Some(metadata),
        }))
    }
}

/// Canonical repository identity: `owner/repo` when the source provides
/// one, the project name otherwise.
fn canonical_repo(metadata: &ProjectMetadata) -> RepoId {
    if metadata.id.contains('/') {
        RepoId::new(metadata.id.clone())
    } else {
        RepoId::new(metadata.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{
        ChatRequest, ChunkStream, ContentRequest, GenerationProvider, PlannedSection,
        SharedProvider,
    };
    use crate::connector::{SourceKind, tree::FlatEntry};
    use crate::storage::Database;
    use crate::types::{DocloomError, NodeKind, UnitStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockConnector {
        repo: String,
        files: HashMap<String, String>,
        connect_calls: AtomicUsize,
    }

    impl MockConnector {
        fn new(repo: &str) -> Self {
            let mut files = HashMap::new();
            files.insert("src/api.ts".to_string(), "export route".to_string());
            files.insert("README.md".to_string(), "# Widgets".to_string());
            files.insert(
                "package.json".to_string(),
                r#"{"dependencies": {"react": "18.0.0"}}"#.to_string(),
            );
            Self {
                repo: repo.to_string(),
                files,
                connect_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl crate::connector::Connector for MockConnector {
        fn kind(&self) -> SourceKind {
            SourceKind::GitHub
        }

        fn identity_hint(&self) -> Option<RepoId> {
            Some(RepoId::new(self.repo.clone()))
        }

        async fn connect(&self) -> Result<ProjectMetadata> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProjectMetadata {
                id: self.repo.clone(),
                name: self.repo.rsplit('/').next().unwrap_or(&self.repo).to_string(),
                framework: Some("React".to_string()),
                package_manager: None,
                entry_points: Vec::new(),
                env_files: Vec::new(),
                readme: None,
                created_at: Utc::now(),
            })
        }

        async fn scan(&self) -> Result<Vec<crate::types::FileNode>> {
            Ok(crate::connector::build_forest(vec![
                FlatEntry::new("src", NodeKind::Directory),
                FlatEntry::new("src/api.ts", NodeKind::File),
                FlatEntry::new("README.md", NodeKind::File),
            ]))
        }

        async fn get_file_content(&self, path: &str) -> Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| DocloomError::not_found(path))
        }

        async fn cached_tree(&self) -> Result<std::sync::Arc<Vec<crate::types::FileNode>>> {
            Ok(std::sync::Arc::new(self.scan().await?))
        }
    }

    struct MockProvider {
        plan_calls: AtomicUsize,
        sections: Vec<PlannedSection>,
    }

    impl MockProvider {
        fn new(sections: Vec<PlannedSection>) -> Self {
            Self {
                plan_calls: AtomicUsize::new(0),
                sections,
            }
        }
    }

    fn section(title: &str, category: &str) -> PlannedSection {
        PlannedSection {
            id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            category: category.to_string(),
            description: format!("{} description", title),
        }
    }

    #[async_trait]
    impl GenerationProvider for MockProvider {
        async fn plan_structure(&self, _request: &PlanRequest) -> Result<Vec<PlannedSection>> {
            self.plan_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.sections.clone())
        }

        async fn page_content(&self, _request: &ContentRequest) -> Result<String> {
            unimplemented!("not used by planner tests")
        }

        async fn chat_stream(&self, _request: ChatRequest) -> Result<ChunkStream> {
            unimplemented!("not used by planner tests")
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    struct Fixture {
        store: Arc<DocumentStore>,
        provider: Arc<MockProvider>,
        planner: DocPlanner,
    }

    fn fixture_with(sections: Vec<PlannedSection>) -> Fixture {
        let store = Arc::new(DocumentStore::new(Arc::new(
            Database::open_in_memory().unwrap(),
        )));
        let provider = Arc::new(MockProvider::new(sections));
        let planner = DocPlanner::new(
            Arc::clone(&store),
            Arc::clone(&provider) as SharedProvider,
            OwnerId::new("alice"),
        );
        Fixture {
            store,
            provider,
            planner,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(vec![
            section("Quick Start", "Getting Started"),
            section("Architecture", "Architecture"),
        ])
    }

    #[tokio::test]
    async fn test_first_plan_persists_drafts_with_context() {
        let f = fixture();
        let connector = MockConnector::new("acme/widgets");

        let outcome = f.planner.plan(&connector, PlanIntent::Open).await.unwrap();

        assert_eq!(outcome.repo.as_str(), "acme/widgets");
        assert_eq!(outcome.units.len(), 2);
        assert!(outcome.units.iter().all(|u| u.status == UnitStatus::Planned));
        assert!(outcome.units.iter().all(|u| u.document_id.is_some()));
        assert!(outcome.context.contains("--- FILE: src/api.ts ---"));
        assert!(outcome.context.contains("--- README.md ---"));
        assert_eq!(f.provider.plan_calls.load(Ordering::SeqCst), 1);

        let rows = f
            .store
            .list(&OwnerId::new("alice"), &outcome.repo)
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_open_intent_short_circuits_without_source_calls() {
        let f = fixture();
        let repo = RepoId::new("acme/widgets");

        // Seed a fully generated project
        let connector = MockConnector::new("acme/widgets");
        f.planner.plan(&connector, PlanIntent::Open).await.unwrap();
        for title in ["Quick Start", "Architecture"] {
            f.store
                .save_content(
                    &UnitKey::new("alice", repo.as_str(), title),
                    "body",
                    UnitStatus::Generated,
                )
                .unwrap();
        }

        // A fresh connector observes no traffic at all
        let cold = MockConnector::new("acme/widgets");
        let outcome = f.planner.plan(&cold, PlanIntent::Open).await.unwrap();

        assert_eq!(cold.connect_calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.provider.plan_calls.load(Ordering::SeqCst), 1);
        assert!(outcome.context.is_empty());
        assert!(outcome.metadata.is_none());
        assert_eq!(outcome.units.len(), 2);
        assert!(outcome.units.iter().all(|u| u.status == UnitStatus::Generated));
    }

    #[tokio::test]
    async fn test_open_intent_backfills_context_for_drafts() {
        let f = fixture();

        let connector = MockConnector::new("acme/widgets");
        f.planner.plan(&connector, PlanIntent::Open).await.unwrap();

        // Drafts remain empty; reopening must reconnect for context but not re-plan
        let warm = MockConnector::new("acme/widgets");
        let outcome = f.planner.plan(&warm, PlanIntent::Open).await.unwrap();

        assert_eq!(warm.connect_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.provider.plan_calls.load(Ordering::SeqCst), 1);
        assert!(outcome.context.contains("src/api.ts"));
        assert!(outcome.metadata.is_some());
    }

    #[tokio::test]
    async fn test_plan_idempotence_no_duplicate_rows() {
        let f = fixture();
        let connector = MockConnector::new("acme/widgets");

        let first = f.planner.plan(&connector, PlanIntent::Open).await.unwrap();
        let second = f.planner.plan(&connector, PlanIntent::Open).await.unwrap();

        let rows = f.store.list(&OwnerId::new("alice"), &first.repo).unwrap();
        assert_eq!(rows.len(), 2);

        let titles = |units: &[GenerationUnit]| {
            units.iter().map(|u| u.title.clone()).collect::<Vec<_>>()
        };
        assert_eq!(titles(&first.units), titles(&second.units));
    }

    #[tokio::test]
    async fn test_regenerate_replans_and_updates_categories() {
        let f = fixture();
        let connector = MockConnector::new("acme/widgets");
        f.planner.plan(&connector, PlanIntent::Open).await.unwrap();

        // New plan produces a different category for an existing title
        let replanner = DocPlanner::new(
            Arc::clone(&f.store),
            Arc::new(MockProvider::new(vec![section("Quick Start", "Guides")]))
                as SharedProvider,
            OwnerId::new("alice"),
        );
        let outcome = replanner
            .plan(&connector, PlanIntent::Regenerate)
            .await
            .unwrap();

        assert_eq!(outcome.units[0].category, "Guides");

        // Still two rows: regenerate updated, never duplicated
        let rows = f.store.list(&OwnerId::new("alice"), &outcome.repo).unwrap();
        assert_eq!(rows.len(), 2);
        let quick_start = rows.iter().find(|r| r.title == "Quick Start").unwrap();
        assert_eq!(quick_start.category.as_deref(), Some("Guides"));
    }

    #[tokio::test]
    async fn test_regenerate_preserves_generated_content() {
        let f = fixture();
        let connector = MockConnector::new("acme/widgets");
        let first = f.planner.plan(&connector, PlanIntent::Open).await.unwrap();

        f.store
            .save_content(
                &UnitKey::new("alice", first.repo.as_str(), "Quick Start"),
                "precious body",
                UnitStatus::Generated,
            )
            .unwrap();

        let outcome = f
            .planner
            .plan(&connector, PlanIntent::Regenerate)
            .await
            .unwrap();

        let unit = outcome
            .units
            .iter()
            .find(|u| u.title == "Quick Start")
            .unwrap();
        assert_eq!(unit.content, "precious body");
        assert_eq!(unit.status, UnitStatus::Generated);
    }

    #[tokio::test]
    async fn test_plan_failure_persists_nothing() {
        struct FailingProvider;

        #[async_trait]
        impl GenerationProvider for FailingProvider {
            async fn plan_structure(
                &self,
                _request: &PlanRequest,
            ) -> Result<Vec<PlannedSection>> {
                Err(DocloomError::generation(
                    crate::types::GenerationPhase::Plan,
                    "invalid JSON",
                ))
            }
            async fn page_content(&self, _request: &ContentRequest) -> Result<String> {
                unimplemented!()
            }
            async fn chat_stream(&self, _request: ChatRequest) -> Result<ChunkStream> {
                unimplemented!()
            }
            fn name(&self) -> &str {
                "failing"
            }
            fn model(&self) -> &str {
                "mock-model"
            }
        }

        let store = Arc::new(DocumentStore::new(Arc::new(
            Database::open_in_memory().unwrap(),
        )));
        let planner = DocPlanner::new(
            Arc::clone(&store),
            Arc::new(FailingProvider) as SharedProvider,
            OwnerId::new("alice"),
        );

        let connector = MockConnector::new("acme/widgets");
        let err = planner.plan(&connector, PlanIntent::Open).await.unwrap_err();
        assert!(matches!(err, DocloomError::Generation { .. }));

        let rows = store
            .list(&OwnerId::new("alice"), &RepoId::new("acme/widgets"))
            .unwrap();
        assert!(rows.is_empty());
    }
}
