//! `stardewl version` — print version information.

use anyhow::Result;

pub fn run() -> Result<()> {
    println!("stardewl {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
