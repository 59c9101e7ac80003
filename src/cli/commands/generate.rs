//! `docloom generate` - drain the content queue for a source.

use std::sync::Arc;

use crate::cli::output::Output;
use crate::cli::{AppContext, make_connector};
use crate::context::ContextAssembler;
use crate::pipeline::{ContentGenerator, DocPlanner, PlanIntent};
use crate::types::{Result, UnitKey, UnitStatus};

pub async fn run(
    ctx: &AppContext,
    source: &str,
    title: Option<&str>,
    regenerate: bool,
) -> Result<()> {
    let out = Output::new();
    let connector = make_connector(source, &ctx.config)?;

    let planner = DocPlanner::new(
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.provider),
        ctx.owner.clone(),
    )
    .with_rank_limit(ctx.config.scan.rank_limit);

    let outcome = planner.plan(connector.as_ref(), PlanIntent::Open).await?;
    let repo_name = outcome.repo.short_name().to_string();

    let generator = ContentGenerator::new(
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.provider),
        ctx.owner.clone(),
    );

    if regenerate {
        match title {
            Some(title) => generator.reset(&outcome.repo, title)?,
            None => {
                for unit in &outcome.units {
                    generator.reset(&outcome.repo, &unit.title)?;
                }
            }
        }
    }

    // Hydrated plans arrive without context; requeued pages still need it
    let mut context = outcome.context;
    if context.is_empty() && generator.next_planned(&outcome.repo)?.is_some() {
        connector.connect().await?;
        let ranked = connector
            .important_files(ctx.config.scan.rank_limit)
            .await?;
        context = ContextAssembler::new(connector.as_ref())
            .with_limits(ctx.config.context.limits())
            .assemble(&ranked)
            .await?;
    }

    let summary = match title {
        Some(title) => {
            // Fresh store state: the plan outcome predates any reset above
            let key = UnitKey::new(ctx.owner.as_str(), outcome.repo.as_str(), title);
            let Some(unit) = ctx.store.find(&key)?.map(|r| r.into_unit()) else {
                out.error(&format!("No page titled '{}' in the plan", title));
                return Ok(());
            };
            if unit.status != UnitStatus::Planned {
                out.warning(&format!(
                    "'{}' is {}; pass --regenerate to requeue it",
                    title,
                    unit.status.as_str()
                ));
                return Ok(());
            }
            let done = generator
                .generate_unit(&outcome.repo, &repo_name, &unit, &context)
                .await?;
            crate::pipeline::RunSummary {
                generated: (done.status == UnitStatus::Generated) as usize,
                failed: (done.status == UnitStatus::Failed) as usize,
            }
        }
        None => generator.run(&outcome.repo, &repo_name, &context).await?,
    };

    if summary.failed > 0 {
        out.warning(&format!(
            "{} page(s) generated, {} failed (re-run with --regenerate --title <title>)",
            summary.generated, summary.failed
        ));
    } else if summary.generated > 0 {
        out.success(&format!("{} page(s) generated", summary.generated));
    } else {
        out.info("Nothing to generate");
    }

    Ok(())
}
