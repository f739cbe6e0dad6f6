//! `stardewl host` — create a room and wait for a joiner to connect.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::{commands::session, mods_path, room_client, signaling_url};

pub async fn run(signaling_ws_url: &str, mods_path_override: Option<PathBuf>, timeout_secs: u64) -> Result<()> {
    let mods_path = mods_path::resolve(mods_path_override)?;
    let http_base = signaling_url::http_base(signaling_ws_url)?;

    let code = room_client::create_room(&http_base).await?;
    println!("Room code: {}", code.to_string().bold().green());
    println!("{}", "Share this code with the other player, then wait here...".dimmed());

    session::run(true, signaling_ws_url, code, mods_path, timeout_secs).await
}
