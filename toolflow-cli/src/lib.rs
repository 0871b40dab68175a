//! toolflow-cli library: command parsing and the commands behind the `toolflow` binary.
//!
//! Reads gateway config from env (.env supported), builds a gateway around the echo
//! orchestrator, and renders output the way each protocol would put it on the wire.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let gateway = toolflow_cli::build_gateway()?;
//! for line in toolflow_cli::run_request(&gateway, &opts, "hello").await? {
//!     println!("{}", line);
//! }
//! ```

mod args;
mod commands;

pub use args::{Cli, Command, RequestOptions};
pub use commands::{analyze, build_gateway, list_tools, run_request, Error};

#[cfg(test)]
mod tests;
