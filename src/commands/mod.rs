//! CLI subcommand handlers.
//!
//! This module groups the implementations of the profile download and the
//! auxiliary `instagram-dl` subcommands, keeping `cli.rs` focused on argument
//! definitions.

pub mod completions;
pub mod download;
pub mod version;
