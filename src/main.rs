use clap::Parser;
use tabfold::cli::commands::Cli;
use tabfold::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_env("TABFOLD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
