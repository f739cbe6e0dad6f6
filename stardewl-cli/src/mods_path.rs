use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::Input;
use stardewl_mods::default_stardew_valley_mods_path;

/// Resolves the effective Mods folder: the explicit override if given, else
/// the first per-OS default that exists on disk, else an interactive prompt
/// (the spec's CLI is a collaborator free to ask the user directly).
pub fn resolve(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    if let Some(path) = default_stardew_valley_mods_path() {
        return Ok(path);
    }
    if !atty_stdin() {
        anyhow::bail!("could not find a Stardew Valley Mods folder; pass --mods-path");
    }

    let path: String = Input::new()
        .with_prompt("Couldn't auto-detect your Stardew Valley Mods folder, enter its path")
        .interact_text()
        .context("failed to read Mods folder path")?;
    Ok(PathBuf::from(path))
}

fn atty_stdin() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}
