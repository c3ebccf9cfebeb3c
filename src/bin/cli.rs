use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;

use pinlist::cli::Cli;
use pinlist::logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.log_level, cli.no_color);
    cli.run().await
}
