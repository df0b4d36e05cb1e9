//! taskmill CLI library
//!
//! Exposes the CLI commands and output formatting for use in integration
//! tests. The binary is in `main.rs` and uses this library.

pub mod commands;
pub mod output;

pub use commands::*;
