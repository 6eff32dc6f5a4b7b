use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use thought_chain::{
    FileThoughtRepository, RecentThoughtCache, ThoughtChainSettings, ThoughtRecord,
};

const RECENT_LISTING_LIMIT: usize = 25;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = ThoughtChainSettings::load()?;
    settings.validate()?;

    let repository = Arc::new(FileThoughtRepository::new(&settings.storage.root_path)?);
    let cache = RecentThoughtCache::new(repository.clone(), settings.cache.freshness());

    let recent = cache.recently_completed(RECENT_LISTING_LIMIT).await?;
    let incomplete = cache.incomplete().await?;

    println!("Recently completed thoughts ({}):", recent.len());
    for thought in &recent {
        print_thought(thought);
    }

    println!();
    println!("Incomplete thoughts ({}):", incomplete.len());
    for thought in &incomplete {
        print_thought(thought);
    }

    Ok(())
}

fn print_thought(thought: &ThoughtRecord) {
    let rationale = thought
        .kickoff
        .as_ref()
        .map(|k| k.rationale.as_str())
        .unwrap_or("(not yet classified)");
    println!(
        "  {}  [{}]  model={} steps={} updated={}",
        thought.id,
        thought.status(),
        thought.model,
        thought.steps.len(),
        thought.updated_at
    );
    println!("      {}", rationale);
}
