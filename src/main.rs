use anyhow::Result;
use clap::Parser;
use groundchat::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    groundchat::run(args).await
}
