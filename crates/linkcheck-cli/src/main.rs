//! linkcheck CLI binary.
//!
//! This is the entry point for the `linkcheck` command-line tool. It
//! initializes logging via `tracing`, parses arguments with `clap`, and
//! dispatches to the appropriate command handler. Exit codes: `0` no
//! problems, `1` problems found, `2` input/resolution error.

mod cli;
mod commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = cli::parse();
    match commands::dispatch(args).await {
        Ok(outcome) => std::process::exit(outcome.code()),
        Err(report) => {
            eprintln!("{report:?}");
            std::process::exit(2);
        }
    }
}
