//! Workflow command
//!
//! Handles `sentinel workflow`: refreshes the export cache for each target
//! repository, then generates reports from the fresh artifacts.

use super::{build_collector, export_cache, print_failures, report, resolve_span, target_repos};
use crate::app::AppContext;
use crate::SpanArgs;
use anyhow::Result;
use sentinel_core::{export_all, FetchPolicy, RepositoryRef};

pub async fn run(ctx: &AppContext, args: &SpanArgs) -> Result<()> {
    let span = resolve_span(args)?;
    let repos = target_repos(ctx, args)?;

    println!("Step 1/2: exporting {} repositories for {}", repos.len(), span);
    let collector = build_collector(ctx)?;
    let exported = export_all(collector.as_ref(), &export_cache(ctx), &repos, &span).await;
    print_failures(&exported);
    println!("Export finished: {}", exported.tally());

    if !ctx.config.reports.enabled {
        println!("Report generation is disabled ([reports] enabled = false)");
        return Ok(());
    }

    // Failed exports are not retried
    let ready: Vec<RepositoryRef> = exported
        .items
        .iter()
        .filter(|item| item.result.is_ok())
        .map(|item| item.repo.clone())
        .collect();
    if ready.is_empty() {
        println!("Nothing exported; skipping reports");
        return Ok(());
    }

    println!("Step 2/2: generating reports");
    report::generate(ctx, &ready, &span, FetchPolicy::Unconditional).await?;
    Ok(())
}
