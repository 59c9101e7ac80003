//! `docloom publish` - flip the publish flag on a generated page.

use crate::cli::AppContext;
use crate::cli::output::Output;
use crate::types::{DocloomError, Result, UnitKey, UnitStatus};

pub fn run(ctx: &AppContext, repo: &str, title: &str, unpublish: bool) -> Result<()> {
    let out = Output::new();
    let key = UnitKey::new(ctx.owner.as_str(), repo, title);

    let record = ctx
        .store
        .find(&key)?
        .ok_or_else(|| DocloomError::Storage(format!("no persisted page for {}", key)))?;

    if !unpublish && record.status != UnitStatus::Generated {
        out.warning(&format!(
            "'{}' is {}; only generated pages can be published",
            title,
            record.status.as_str()
        ));
        return Ok(());
    }

    ctx.store.set_published(&key, !unpublish)?;
    if unpublish {
        out.success(&format!("Unpublished '{}'", title));
    } else {
        out.success(&format!("Published '{}'", title));
    }
    Ok(())
}
