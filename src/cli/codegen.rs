use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use recorder_codegen::Language;
use tokio::fs;
use tracing::info;

use crate::cli::context::CliContext;
use crate::events::read_event_log;
use crate::ports::DryRunBrowser;
use crate::session::{build_output, replay};

#[derive(Args, Clone, Debug)]
pub struct CodegenArgs {
    /// JSON-lines event log to replay
    #[arg(long, value_name = "FILE")]
    pub events: PathBuf,

    /// Target language (javascript, python, python-async, csharp)
    #[arg(short, long)]
    pub target: Option<Language>,

    /// Script file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Browser the script launches
    #[arg(long)]
    pub browser: Option<String>,

    /// Device descriptor to emulate
    #[arg(long)]
    pub device: Option<String>,

    /// Do not echo the script to stdout
    #[arg(long)]
    pub quiet: bool,
}

pub async fn cmd_codegen(args: CodegenArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    if let Some(target) = args.target {
        config.target = target;
    }
    if let Some(output) = args.output {
        config.output = Some(output);
    }
    if let Some(browser) = args.browser {
        config.browser = browser;
    }
    if let Some(device) = args.device {
        config.device = Some(device);
    }
    if args.quiet {
        config.echo = false;
    }

    let raw = fs::read_to_string(&args.events)
        .await
        .with_context(|| format!("reading {}", args.events.display()))?;
    let events = read_event_log(raw.as_bytes())
        .with_context(|| format!("parsing {}", args.events.display()))?;

    let browser = Arc::new(DryRunBrowser::new());
    let output = build_output(&config);
    let (_, stats) = replay(&config, events, browser.clone(), output).await?;

    info!(
        events = stats.events,
        browser_calls = browser.calls().len(),
        target = %config.target,
        "script generated"
    );
    if let Some(path) = &config.output {
        info!("Script written to {}", path.display());
    }
    Ok(())
}
