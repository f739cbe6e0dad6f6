//! `stardewl join <code>` — join an existing room by its 6-digit code.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use stardewl_core::RoomCode;

use crate::{commands::session, mods_path, room_client, signaling_url};

pub async fn run(
    signaling_ws_url: &str,
    code: String,
    mods_path_override: Option<PathBuf>,
    timeout_secs: u64,
) -> Result<()> {
    let mods_path = mods_path::resolve(mods_path_override)?;
    let http_base = signaling_url::http_base(signaling_ws_url)?;
    let code = RoomCode::new(code).context("room code must be 6 digits")?;

    let ready = room_client::room_ready(&http_base, &code).await?;
    if !ready {
        println!("{}", "Room exists but the host hasn't connected yet, waiting...".dimmed());
    }

    session::run(false, signaling_ws_url, code, mods_path, timeout_secs).await
}
