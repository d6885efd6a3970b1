use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use quotedeck_proxy::{router, ProxyState, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("quotedeck_proxy=info,tower_http=warn")),
        )
        .init();

    let settings = Settings::from_env()?;
    info!(?settings, "starting quotedeck proxy");

    let bind_addr = settings.bind_addr;
    let state = Arc::new(ProxyState::new(settings));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
