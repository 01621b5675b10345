mod app;
mod cli;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    multifetch::observability::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch(args) => app::run(args).await?,
    }

    Ok(())
}
