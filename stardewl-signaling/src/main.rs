use std::time::Duration;

use stardewl_signaling::room::{run_reaper, RoomManager};
use stardewl_signaling::build_app;
use tracing_subscriber::EnvFilter;

const REAPER_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port: u16 = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);

    let rooms = RoomManager::new();
    tokio::spawn(run_reaper(rooms.clone(), REAPER_INTERVAL));

    let app = build_app(rooms);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(%port, "stardewl signaling service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
