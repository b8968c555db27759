use anyhow::Result;
use clap::Parser;
use codemate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    codemate::run(args).await
}
