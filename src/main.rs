use anyhow::Result;
use plancal::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
