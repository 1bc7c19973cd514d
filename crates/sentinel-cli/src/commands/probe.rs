//! Provider probe command
//!
//! Handles `sentinel probe`: checks the configured LLM provider without
//! generating a report.

use super::build_llm;
use crate::app::AppContext;
use anyhow::{bail, Result};

pub async fn run(ctx: &AppContext) -> Result<()> {
    let provider = build_llm(ctx)?;

    println!(
        "Probing {} ({})...",
        provider.kind().display_name(),
        provider.model()
    );
    let outcome = provider.probe().await;
    if !outcome.available {
        eprintln!("{}", outcome.message);
        bail!("{} is not available", provider.kind().display_name());
    }

    println!("✓ {}", outcome.message);
    Ok(())
}
