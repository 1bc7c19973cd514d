//! Subscription management commands
//!
//! Handles `sentinel add`, `sentinel remove` and `sentinel list`.

use crate::app::AppContext;
use anyhow::Result;
use sentinel_core::RepositoryRef;

pub fn add(ctx: &AppContext, repo: &RepositoryRef) -> Result<()> {
    if ctx.subscriptions().add(repo)? {
        println!("Subscribed to {}", repo);
    } else {
        println!("Already subscribed to {}", repo);
    }
    Ok(())
}

pub fn remove(ctx: &AppContext, repo: &RepositoryRef) -> Result<()> {
    if ctx.subscriptions().remove(repo)? {
        println!("Unsubscribed from {}", repo);
    } else {
        println!("Not subscribed to {}", repo);
    }
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let repos = ctx.subscriptions().list()?;
    if repos.is_empty() {
        println!("No subscriptions. Add one with: sentinel add <owner/name>");
        return Ok(());
    }

    println!("Subscribed repositories ({}):", repos.len());
    for repo in &repos {
        println!("  - {}", repo);
    }
    Ok(())
}
