//! `docloom status` - show persisted pages and their lifecycle states.

use crate::cli::AppContext;
use crate::cli::output::Output;
use crate::types::{RepoId, Result, UnitStatus};

pub fn run(ctx: &AppContext, repo: Option<&str>) -> Result<()> {
    let out = Output::new();

    let Some(repo) = repo else {
        let repos = ctx.store.list_repos(&ctx.owner)?;
        if repos.is_empty() {
            out.info("No documentation projects yet; start with `docloom plan`");
            return Ok(());
        }
        out.header("Documentation projects");
        for (repo, pages) in repos {
            out.item(&format!("{} page(s)", pages), &repo);
        }
        return Ok(());
    };

    let repo = RepoId::new(repo);
    let records = ctx.store.list(&ctx.owner, &repo)?;
    if records.is_empty() {
        out.info(&format!("No pages recorded for {}", repo));
        return Ok(());
    }

    out.header(&format!("Pages for {}", repo));
    let mut generated = 0usize;
    let mut failed = 0usize;
    for record in &records {
        let flag = if record.published { " (published)" } else { "" };
        out.item(
            &format!("[{}]", record.status.as_str()),
            &format!("{}{}", record.title, flag),
        );
        match record.status {
            UnitStatus::Generated => generated += 1,
            UnitStatus::Failed => failed += 1,
            _ => {}
        }
    }

    out.info(&format!(
        "{} total, {} generated, {} failed",
        records.len(),
        generated,
        failed
    ));
    Ok(())
}
