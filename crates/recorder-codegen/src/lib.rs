//! Recorder code generation
//!
//! Turns a stream of recorded actions into a replayable script:
//! - [`actions`]: the closed action model and its signals
//! - [`augment`]: merge, replace and suppress policy between actions
//! - [`generator`]: the two-slot state machine that prints and erases blocks
//! - [`languages`]: JavaScript, Python (sync and async) and C# renderers
//! - [`output`]: file, terminal, in-memory and fan-out sinks

pub mod actions;
pub mod augment;
pub mod errors;
pub mod generator;
pub mod languages;
pub mod options;
pub mod output;

pub use actions::{
    Action, ActionInContext, FrameRef, Modifiers, MouseButton, NavigationKind, Signal,
};
pub use augment::{decide, AugmentDecision};
pub use errors::CodegenError;
pub use generator::{CodeGenerator, SignalDisposition};
pub use languages::{Language, LanguageGenerator};
pub use options::{
    ColorScheme, ContextOptions, Geolocation, LaunchOptions, OptionValue, ScriptHeader, Viewport,
};
pub use output::{CodeOutput, FileOutput, MemoryOutput, OutputMultiplexer, TerminalOutput};
