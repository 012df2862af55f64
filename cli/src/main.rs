mod analyze;
mod build;
mod cli;
mod config;
mod icon;
mod input;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();
    init_logging(args.verbose);

    let config = match config::Config::from_env() {
        Ok(v) => v,
        Err(e) => return cli::render_err(args.json, cli::CliError::operational(format!("{e:#}"))),
    };

    let res: Result<(), cli::CliError> = match args.cmd {
        cli::Cmd::Build(b) => build::build(&config, args.json, args.verbose, b).await,
        cli::Cmd::Analyze(a) => analyze::analyze(&config, args.json, args.verbose, a).await,
        cli::Cmd::Icon(i) => icon::icon(&config, args.json, args.verbose, i).await,
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::render_err(args.json, e),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,wrapkit=debug,wrapkit_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
