//! Command-line arguments.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "toolflow")]
#[command(about = "Tool-filtering agent gateway: list tools, preview filters, run requests")]
pub struct Cli {
    /// Log gateway internals to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered tools.
    Tools,
    /// Show which tools a request would get.
    Analyze {
        #[command(flatten)]
        options: RequestOptions,
    },
    /// Run one request and print the wire output.
    Run {
        #[command(flatten)]
        options: RequestOptions,

        /// Protocol to render with: http, sse or websocket.
        #[arg(short, long, default_value = "http")]
        protocol: String,

        /// Request input.
        #[arg(required = true, trailing_var_arg = true)]
        input: Vec<String>,
    },
}

/// Filter options shared by `analyze` and `run`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Named filter strategy (default: the configured default policy).
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Keep only tools carrying any of these tags (repeatable).
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}
