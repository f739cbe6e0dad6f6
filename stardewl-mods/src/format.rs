use std::fmt::Write as _;

use stardewl_core::ModComparison;

/// Renders a comparison result as a short human-readable summary, the way
/// the CLI prints it after a completed handshake.
pub fn format_comparison(cmp: &ModComparison) -> String {
    let mut out = String::new();

    if cmp.same.is_empty()
        && cmp.different.is_empty()
        && cmp.only_in_local.is_empty()
        && cmp.only_in_remote.is_empty()
    {
        return "No mods found on either side.".to_string();
    }

    let _ = writeln!(out, "Matching mods: {}", cmp.same.len());

    if !cmp.different.is_empty() {
        let _ = writeln!(out, "Different versions ({}):", cmp.different.len());
        for d in &cmp.different {
            let _ = writeln!(
                out,
                "  {} — local {} ({} bytes) vs remote {} ({} bytes)",
                d.name,
                &d.local.checksum[..8.min(d.local.checksum.len())],
                d.local.size,
                &d.remote.checksum[..8.min(d.remote.checksum.len())],
                d.remote.size,
            );
        }
    }

    if !cmp.only_in_local.is_empty() {
        let _ = writeln!(out, "Only installed locally ({}):", cmp.only_in_local.len());
        for m in &cmp.only_in_local {
            let _ = writeln!(out, "  {}", m.name);
        }
    }

    if !cmp.only_in_remote.is_empty() {
        let _ = writeln!(out, "Only installed on the remote side ({}):", cmp.only_in_remote.len());
        for m in &cmp.only_in_remote {
            let _ = writeln!(out, "  {}", m.name);
        }
    }

    out
}
