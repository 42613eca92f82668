use clap::Subcommand;

use super::codegen::CodegenArgs;
use super::config::ConfigArgs;
use super::selector::SelectorArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Generate a script from a recorded event log
    Codegen(CodegenArgs),

    /// Synthesize the selector for an element of an HTML document
    Selector(SelectorArgs),

    /// Inspect recorder configuration
    Config(ConfigArgs),
}
