use anyhow::Result;
use clap::Command;
use tokio_util::sync::CancellationToken;

use embrace::Config;

pub fn cmd() -> Command {
    Command::new("serve")
        .display_order(1)
        .about("Start the web server")
}

pub async fn run(config: Config, cancel: CancellationToken) -> Result<()> {
    embrace::axum::start_with(config, async move { cancel.cancelled().await }).await?;
    Ok(())
}
