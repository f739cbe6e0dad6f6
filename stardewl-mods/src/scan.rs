use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use stardewl_core::{ModComparison, ModDiff, ModInfo};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },
}

const RECOGNIZED_EXTENSIONS: &[&str] = &["mod", "dll", "zip"];

/// Recursively walks `path`, hashing every recognized mod file. Returns an
/// empty list (not an error) if `path` does not exist, mirroring the
/// original scanner's "nothing installed yet" behavior.
pub fn scan(path: &Path) -> Result<Vec<ModInfo>, ScanError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut mods = Vec::new();
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if entry.path() == path || !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let Some(ext) = ext else { continue };
        if !RECOGNIZED_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        mods.push(mod_info_for(entry.path(), path)?);
    }

    mods.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(mods)
}

fn mod_info_for(file: &Path, root: &Path) -> Result<ModInfo, ScanError> {
    let mut f = File::open(file).map_err(|e| io_err(file, e))?;
    let size = f.metadata().map_err(|e| io_err(file, e))?.len();

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = f.read(&mut buf).map_err(|e| io_err(file, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let checksum = hex::encode(hasher.finalize());

    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(ModInfo {
        name,
        version: None,
        checksum,
        size,
        path: file.strip_prefix(root).ok().map(|p| p.display().to_string()),
    })
}

fn io_err(path: &Path, source: io::Error) -> ScanError {
    ScanError::Io { path: path.display().to_string(), source }
}

/// Joins two mod lists by name. Same iff checksum and size both match.
/// All four output buckets are sorted by name.
pub fn compare(local: &[ModInfo], remote: &[ModInfo]) -> ModComparison {
    let local_map: HashMap<&str, &ModInfo> = local.iter().map(|m| (m.name.as_str(), m)).collect();
    let remote_map: HashMap<&str, &ModInfo> =
        remote.iter().map(|m| (m.name.as_str(), m)).collect();

    let mut only_in_local = Vec::new();
    let mut different = Vec::new();
    let mut same = Vec::new();

    for m in local {
        match remote_map.get(m.name.as_str()) {
            None => only_in_local.push(m.clone()),
            Some(r) => {
                if m.checksum == r.checksum && m.size == r.size {
                    same.push(m.clone());
                } else {
                    different.push(ModDiff {
                        name: m.name.clone(),
                        local: m.clone(),
                        remote: (*r).clone(),
                    });
                }
            }
        }
    }

    let mut only_in_remote: Vec<ModInfo> = remote
        .iter()
        .filter(|m| !local_map.contains_key(m.name.as_str()))
        .cloned()
        .collect();

    only_in_local.sort_by(|a, b| a.name.cmp(&b.name));
    only_in_remote.sort_by(|a, b| a.name.cmp(&b.name));
    different.sort_by(|a, b| a.name.cmp(&b.name));
    same.sort_by(|a, b| a.name.cmp(&b.name));

    ModComparison { only_in_local, only_in_remote, different, same }
}
