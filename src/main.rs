use anyhow::Result;
use digibot::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
