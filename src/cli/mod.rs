//! CLI module for the Cadence command-line interface.
//!
//! Commands run locally against the store described by the configuration.

mod commands;
mod local;
mod output;
pub mod types;

pub use commands::*;
