use anyhow::Result;
use clap::Parser;
use lotgrid::app;
use lotgrid::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    app::run(cli).await
}
