//! `stardewl mods list` — inspect the local mod set without a connection.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use stardewl_mods::scan;

use crate::mods_path;

pub fn list(path_override: Option<PathBuf>) -> Result<()> {
    let path = mods_path::resolve(path_override)?;
    let mods = scan(&path).with_context(|| format!("failed to scan {}", path.display()))?;

    if mods.is_empty() {
        println!("No mods found under {}.", path.display());
        return Ok(());
    }

    println!("{} mods under {}:", mods.len(), path.display());
    for m in &mods {
        println!(
            "  {} {} ({} bytes, checksum {})",
            m.name.bold(),
            m.version.as_deref().unwrap_or(""),
            m.size,
            &m.checksum[..8.min(m.checksum.len())],
        );
    }
    Ok(())
}
