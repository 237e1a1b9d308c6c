use clap::Parser;
use tracing_subscriber::EnvFilter;
use tradetrainer::cli::{log_filter, run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(&cli))),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}
