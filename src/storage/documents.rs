//! Document Store
//!
//! Narrow persistence contract over the `documents` table: find, upsert,
//! delete, and list operations keyed by the `(owner, repo, title)`
//! idempotency triple. Every write is an upsert, so retried or duplicate
//! invocations are safe without extra locking.

use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use super::database::SharedDatabase;
use crate::types::{GenerationUnit, OwnerId, RepoId, Result, UnitKey, UnitStatus};

/// One persisted documentation page row
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: String,
    pub owner: String,
    pub repo: String,
    pub title: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub status: UnitStatus,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRecord {
    /// Hydrate a pipeline unit from a stored row.
    pub fn into_unit(self) -> GenerationUnit {
        GenerationUnit {
            id: self.id.clone(),
            title: self.title,
            category: self.category.unwrap_or_else(|| "Project Docs".to_string()),
            description: self
                .description
                .unwrap_or_else(|| "Existing documentation".to_string()),
            content: self.content,
            status: self.status,
            document_id: Some(self.id),
            published: self.published,
        }
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let status: String = row.get("status")?;
    Ok(DocumentRecord {
        id: row.get("id")?,
        owner: row.get("owner")?,
        repo: row.get("repo")?,
        title: row.get("title")?,
        category: row.get("category")?,
        description: row.get("description")?,
        content: row.get("content")?,
        status: UnitStatus::parse_or_default(&status),
        published: row.get::<_, i64>("published")? != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

const SELECT_COLUMNS: &str = "id, owner, repo, title, category, description, content, status,
     published, created_at, updated_at";

/// Store for documentation page records.
pub struct DocumentStore {
    db: SharedDatabase,
}

impl DocumentStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Find one record by its idempotency key.
    pub fn find(&self, key: &UnitKey) -> Result<Option<DocumentRecord>> {
        let conn = self.db.conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM documents WHERE owner = ?1 AND repo = ?2 AND title = ?3",
                    SELECT_COLUMNS
                ),
                params![key.owner, key.repo, key.title],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// List every record for a repository in plan order (insertion order).
    pub fn list(&self, owner: &OwnerId, repo: &RepoId) -> Result<Vec<DocumentRecord>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE owner = ?1 AND repo = ?2
             ORDER BY created_at ASC, rowid ASC",
            SELECT_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![owner.as_str(), repo.as_str()], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// List only published records for a repository.
    pub fn list_published(&self, owner: &OwnerId, repo: &RepoId) -> Result<Vec<DocumentRecord>> {
        Ok(self
            .list(owner, repo)?
            .into_iter()
            .filter(|r| r.published)
            .collect())
    }

    /// Distinct repositories an owner has pages for, with page counts.
    pub fn list_repos(&self, owner: &OwnerId) -> Result<Vec<(String, usize)>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT repo, COUNT(*) FROM documents WHERE owner = ?1
             GROUP BY repo ORDER BY repo",
        )?;

        let repos = stmt
            .query_map(params![owner.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(repos)
    }

    /// Insert a planned page or refresh the plan fields of an existing one.
    ///
    /// On conflict with the idempotency key only the mutable plan fields
    /// (category, description) move; content, status, and the publish flag
    /// are untouched so re-planning never destroys generated work.
    pub fn upsert_planned(
        &self,
        key: &UnitKey,
        category: &str,
        description: &str,
    ) -> Result<DocumentRecord> {
        let conn = self.db.conn()?;
        let now = Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO documents
                 (id, owner, repo, title, category, description, content, status,
                  published, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, '', 'planned', 0, ?7, ?7)
             ON CONFLICT (owner, repo, title) DO UPDATE SET
                 category = excluded.category,
                 description = excluded.description,
                 updated_at = excluded.updated_at",
            params![id, key.owner, key.repo, key.title, category, description, now],
        )?;

        drop(conn);
        self.find(key)?.ok_or_else(|| {
            crate::types::DocloomError::Storage(format!("upsert lost record for {}", key))
        })
    }

    /// Store generated (or failed) content for a page.
    pub fn save_content(&self, key: &UnitKey, content: &str, status: UnitStatus) -> Result<()> {
        let updated = self.db.conn()?.execute(
            "UPDATE documents SET content = ?4, status = ?5, updated_at = ?6
             WHERE owner = ?1 AND repo = ?2 AND title = ?3",
            params![
                key.owner,
                key.repo,
                key.title,
                content,
                status.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;

        if updated == 0 {
            return Err(crate::types::DocloomError::Storage(format!(
                "no persisted page for {}",
                key
            )));
        }
        Ok(())
    }

    /// Move a page through its lifecycle without touching content.
    pub fn set_status(&self, key: &UnitKey, status: UnitStatus) -> Result<()> {
        self.db.conn()?.execute(
            "UPDATE documents SET status = ?4, updated_at = ?5
             WHERE owner = ?1 AND repo = ?2 AND title = ?3",
            params![
                key.owner,
                key.repo,
                key.title,
                status.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Flip the publish flag for a page.
    pub fn set_published(&self, key: &UnitKey, published: bool) -> Result<()> {
        self.db.conn()?.execute(
            "UPDATE documents SET published = ?4, updated_at = ?5
             WHERE owner = ?1 AND repo = ?2 AND title = ?3",
            params![
                key.owner,
                key.repo,
                key.title,
                published as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Remove a page record.
    pub fn delete(&self, key: &UnitKey) -> Result<()> {
        self.db.conn()?.execute(
            "DELETE FROM documents WHERE owner = ?1 AND repo = ?2 AND title = ?3",
            params![key.owner, key.repo, key.title],
        )?;
        Ok(())
    }
}
