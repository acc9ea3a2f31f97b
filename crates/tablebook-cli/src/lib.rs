//! Table reservation CLI library.
//!
//! Subcommand handlers, listing output and terminal styling used by the
//! `tablebook-cli` binary.

pub mod commands;
pub mod output;
pub mod terminal;
