use super::codegen::cmd_codegen;
use super::config::cmd_config;
use super::env::CliArgs;
use super::selector::cmd_selector;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Codegen(args) => cmd_codegen(args, ctx).await,
        Commands::Selector(args) => cmd_selector(args).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
