//! Core traits for record reconciliation
//!
//! - [`CommandRunner`]: Run the external lookup and update tools

pub mod command_runner;

pub use command_runner::{CommandOutput, CommandRunner};
