//! `docloom chat` - ask a question against published documentation.

use std::io::Write;

use futures::StreamExt;

use crate::cli::AppContext;
use crate::cli::output::Output;
use crate::pipeline::answer_in_context;
use crate::types::{RepoId, Result};

pub async fn run(ctx: &AppContext, repo: &str, query: &str) -> Result<()> {
    let out = Output::new();
    let repo = RepoId::new(repo);

    let published = ctx.store.list_published(&ctx.owner, &repo)?;
    if published.is_empty() {
        out.warning(&format!(
            "No published pages for {}; publish some first with `docloom publish`",
            repo
        ));
    }

    let mut stream = answer_in_context(
        ctx.provider.as_ref(),
        &ctx.store,
        &ctx.owner,
        &repo,
        Vec::new(),
        query,
    )
    .await?;

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
    }
    println!();

    Ok(())
}
