use std::path::PathBuf;

/// Probes the per-OS default install locations for Stardew Valley's `Mods`
/// directory, returning the first one that exists on disk.
pub fn default_stardew_valley_mods_path() -> Option<PathBuf> {
    candidates().into_iter().find(|p| p.exists())
}

fn candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();

    if let Some(data) = dirs::data_dir() {
        // Windows: %AppData%\Roaming\StardewValley\Mods
        out.push(data.join("StardewValley").join("Mods"));
    }

    if let Some(home) = dirs::home_dir() {
        // macOS
        out.push(
            home.join("Library")
                .join("Application Support")
                .join("StardewValley")
                .join("Mods"),
        );
        // Linux
        out.push(home.join(".local").join("share").join("StardewValley").join("Mods"));
        // Steam Deck / Flatpak Steam, running Stardew Valley through Proton:
        // the prefix puts the game's AppData under compatdata/413150 (the
        // Steam app ID), not under the Flatpak's own data directory.
        out.push(
            home.join(".var")
                .join("app")
                .join("com.valvesoftware.Steam")
                .join(".local")
                .join("share")
                .join("Steam")
                .join("steamapps")
                .join("compatdata")
                .join("413150")
                .join("pfx")
                .join("drive_c")
                .join("users")
                .join("steamuser")
                .join("AppData")
                .join("Roaming")
                .join("StardewValley")
                .join("Mods"),
        );
    }

    out
}
