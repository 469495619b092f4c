use anyhow::Context;
use tracing_subscriber::EnvFilter;

use kraft_broker::config::{AppConfig, ServerSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kraft_broker=info")),
        )
        .init();

    let settings = ServerSettings::from_env().context("invalid broker configuration")?;
    let config = AppConfig::load(settings)
        .await
        .context("failed to load cluster metadata")?;

    let adapter = config.tcp_adapter().await.context("failed to bind listener")?;
    adapter.run().await?;

    Ok(())
}
