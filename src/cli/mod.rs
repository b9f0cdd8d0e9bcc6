//! Local/offline CLI driving the same [`crate::pipeline::Pipeline`] the HTTP
//! surface uses, against an in-process session store. Useful for scripting
//! and for runs with no network access to the API.

pub mod commands;

pub use commands::{execute_command, Cli, Commands, OutputFormat};
