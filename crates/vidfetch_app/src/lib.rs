//! Command-line front end: configuration, effect execution and the run loop
//! that drives one fetch job from submission to a saved file.
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod effects;
pub mod render;

pub use cli::Cli;
pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE};
pub use coordinator::{Coordinator, RunOutcome};
pub use effects::{map_event, start_request, EffectRunner};
pub use render::{render_lines, TerminalRenderer};
