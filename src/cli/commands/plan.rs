//! `docloom plan` - run the structural-planning phase for a source.

use crate::cli::output::Output;
use crate::cli::{AppContext, make_connector};
use crate::pipeline::{DocPlanner, PlanIntent};
use crate::types::{Result, UnitStatus};
use std::sync::Arc;

pub async fn run(ctx: &AppContext, source: &str, regenerate: bool) -> Result<()> {
    let out = Output::new();
    let connector = make_connector(source, &ctx.config)?;

    let intent = if regenerate {
        PlanIntent::Regenerate
    } else {
        PlanIntent::Open
    };

    let planner = DocPlanner::new(
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.provider),
        ctx.owner.clone(),
    )
    .with_rank_limit(ctx.config.scan.rank_limit);

    let outcome = planner.plan(connector.as_ref(), intent).await?;

    out.header(&format!("Documentation plan for {}", outcome.repo));
    let mut current_category = String::new();
    for unit in &outcome.units {
        if unit.category != current_category {
            out.section(&unit.category);
            current_category = unit.category.clone();
        }
        let marker = match unit.status {
            UnitStatus::Generated => "generated",
            UnitStatus::Failed => "failed",
            UnitStatus::Generating => "generating",
            UnitStatus::Planned => "draft",
        };
        out.item(&format!("[{}]", marker), &unit.title);
    }

    let drafts = outcome.units.iter().filter(|u| u.is_draft()).count();
    if drafts > 0 {
        out.info(&format!(
            "{} draft page(s) pending; run `docloom generate --source {}`",
            drafts, source
        ));
    } else {
        out.success("All pages generated");
    }

    Ok(())
}
