//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Wiring use cases to infrastructure (dependency injection)
//! - Progress and result rendering (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - Command-line definition
//! - `overrides` - Override flags to `OverrideSet`
//! - `factory` - Registry selection and context construction
//! - `commands` - Validation and dispatch
//! - `console` / `output` - Progress on stderr, results on stdout
//! - `terminal` / `theme` - Color and icon selection

pub mod cli;
pub mod commands;
pub mod console;
pub mod factory;
pub mod output;
mod overrides;
pub mod terminal;
pub mod theme;

pub use cli::Cli;
pub use commands::{execute, Invocation};
