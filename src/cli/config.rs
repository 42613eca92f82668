use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::fs;

use crate::cli::context::CliContext;
use crate::config::RecorderConfig;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Validate the configuration file
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path();
    match args.action {
        ConfigAction::Show => {
            if ctx.config_from_file() {
                println!("Current configuration ({}):", path.display());
            } else {
                println!("Default configuration ({} not found):", path.display());
            }
            println!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Validate => {
            if fs::try_exists(path).await? {
                let raw = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                RecorderConfig::from_yaml(path, &raw)
                    .with_context(|| format!("parsing {}", path.display()))?;
                println!("Configuration file {} is valid", path.display());
            } else {
                println!(
                    "Configuration file {} does not exist, defaults apply",
                    path.display()
                );
            }
        }
    }
    Ok(())
}
