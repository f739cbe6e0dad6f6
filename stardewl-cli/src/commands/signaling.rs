//! `stardewl signaling` — run the signaling service in the foreground.
//!
//! Equivalent to running the `stardewl-signaling` binary directly; bundled
//! here so a single installed binary can play both roles.

use std::time::Duration;

use anyhow::Result;
use stardewl_signaling::build_app;
use stardewl_signaling::room::{run_reaper, RoomManager};

const REAPER_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub async fn run() -> Result<()> {
    let port: u16 = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);

    let rooms = RoomManager::new();
    tokio::spawn(run_reaper(rooms.clone(), REAPER_INTERVAL));

    let app = build_app(rooms);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(%port, "stardewl signaling service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
