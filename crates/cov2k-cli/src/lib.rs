//! Library side of the `cov2k` binary: argument definitions, logging setup
//! and the subcommand implementations.

pub mod cli;
pub mod commands;
pub mod logging;
