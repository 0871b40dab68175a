//! `toolflow` binary: parse the command line, build the gateway, print results.

use clap::Parser;
use toolflow_cli::{analyze, build_gateway, list_tools, run_request, Cli, Command};

fn init_logging(verbose: bool) {
    let default = if verbose { "info,toolflow=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let gateway = match build_gateway() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Tools => Ok(list_tools(&gateway)),
        Command::Analyze { options } => analyze(&gateway, options),
        Command::Run {
            options,
            protocol,
            input,
        } => run_request(&gateway, options, protocol, &input.join(" ")).await,
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
