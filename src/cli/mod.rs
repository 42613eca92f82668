pub mod app;
pub mod codegen;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod runtime;
pub mod selector;

pub use codegen::{cmd_codegen, CodegenArgs};
pub use selector::{cmd_selector, SelectorArgs};
