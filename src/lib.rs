//! SoulBrowser recorder
//!
//! Records browser interactions and turns them into replayable scripts.
//! Selector synthesis lives in `selector-synth`, the action model and
//! language generators in `recorder-codegen`; this crate wires them to the
//! browser through the controller and ships the `soulrecorder` CLI.

pub mod cli;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod interpreter;
pub mod listeners;
pub mod ports;
pub mod session;

pub use config::{load_config, LoadedConfig, RecorderConfig};
pub use controller::{ControllerHandle, ControllerMessage, Flow, RecorderController};
pub use errors::RecorderError;
pub use events::{read_event_log, RecorderEvent};
pub use interpreter::{InputState, PageCommand, PageEvent, PageRecorder, Reaction};
pub use listeners::{ListenerHost, ListenerRegistry};
pub use ports::{BrowserPort, ClickOptions, DryRunBrowser};
pub use session::{build_output, replay, ReplayStats};
