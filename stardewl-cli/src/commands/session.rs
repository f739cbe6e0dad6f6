//! Drives one [`P2pConnector`] session to a mod comparison result, shared by
//! the `host` and `join` commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use stardewl_connector::{P2pConnector, P2pConnectorConfig};
use stardewl_core::{ModComparison, RoomCode};
use stardewl_mods::format_comparison;
use tokio::sync::mpsc;

const DEFAULT_ICE_SERVERS: &[&str] = &["stun:stun.l.google.com:19302"];

pub async fn run(
    is_host: bool,
    signaling_url: &str,
    room_code: RoomCode,
    mods_path: PathBuf,
    timeout_secs: u64,
) -> Result<()> {
    let config = P2pConnectorConfig {
        signaling_url: signaling_url.to_string(),
        room_code,
        is_host,
        mods_path,
        ice_servers: DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
    };

    println!("{}", "Connecting to signaling service...".dimmed());
    let connector = P2pConnector::connect(config).await.context("failed to establish the P2P session")?;
    println!("{}", "Signaling connected, negotiating WebRTC handshake...".dimmed());

    let (checked_tx, mut checked_rx) = mpsc::unbounded_channel::<ModComparison>();
    let (disconnected_tx, mut disconnected_rx) = mpsc::unbounded_channel::<()>();

    connector
        .set_callbacks(
            Arc::new(move |comparison: ModComparison| {
                let _ = checked_tx.send(comparison);
            }),
            Arc::new(move || {
                let _ = disconnected_tx.send(());
            }),
        )
        .await;

    let wait_for_outcome = async {
        tokio::select! {
            Some(comparison) = checked_rx.recv() => Some(comparison),
            Some(()) = disconnected_rx.recv() => None,
        }
    };

    let outcome = if timeout_secs == 0 {
        wait_for_outcome.await
    } else {
        match tokio::time::timeout(Duration::from_secs(timeout_secs), wait_for_outcome).await {
            Ok(outcome) => outcome,
            Err(_) => {
                connector.close().await;
                bail!("timed out after {timeout_secs}s waiting for the mod comparison");
            }
        }
    };

    connector.close().await;

    match outcome {
        Some(comparison) => {
            println!();
            println!("{}", format_comparison(&comparison));
            Ok(())
        }
        None => bail!("the other side disconnected before mods were compared"),
    }
}
