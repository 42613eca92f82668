use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use selector_synth::{DomSnapshot, SelectorPathResolver};
use tokio::fs;
use tracing::debug;

#[derive(Args, Clone, Debug)]
pub struct SelectorArgs {
    /// HTML document to load
    #[arg(long, value_name = "FILE")]
    pub html: PathBuf,

    /// CSS selector of the element to describe
    #[arg(long)]
    pub target_selector: String,

    /// Also print how the selector was found
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn cmd_selector(args: SelectorArgs) -> Result<()> {
    let html = fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let snapshot = DomSnapshot::parse(&html);
    debug!(?snapshot, "parsed document");

    let target = snapshot
        .query_first(&args.target_selector)
        .with_context(|| format!("evaluating {}", args.target_selector))?
        .ok_or_else(|| anyhow!("no element matches {}", args.target_selector))?;

    let resolver = SelectorPathResolver::new(snapshot);
    let synthesis = resolver.synthesize(&target).await;
    println!("{}", synthesis.selector);
    if args.verbose {
        println!("source: {:?}", synthesis.source);
        println!("queries: {}", synthesis.queries);
    }
    Ok(())
}
