//! Export command
//!
//! Handles `sentinel export`: fetches activity for each target repository
//! and overwrites its export cache artifact. Needs no LLM provider.

use super::{build_collector, export_cache, print_failures, resolve_span, target_repos};
use crate::app::AppContext;
use crate::SpanArgs;
use anyhow::Result;
use sentinel_core::export_all;

pub async fn run(ctx: &AppContext, args: &SpanArgs) -> Result<()> {
    let span = resolve_span(args)?;
    let repos = target_repos(ctx, args)?;
    let collector = build_collector(ctx)?;
    let cache = export_cache(ctx);

    println!("Exporting {} repositories for {}...", repos.len(), span);
    let summary = export_all(collector.as_ref(), &cache, &repos, &span).await;

    for item in &summary.items {
        if let Ok(path) = &item.result {
            println!("  ✓ {}: {}", item.repo, path.display());
        }
    }
    print_failures(&summary);
    println!("Export finished: {}", summary.tally());
    Ok(())
}
