//! Filesystem mod scanning and comparison — a collaborator the P2P connector
//! calls through two pure functions, [`scan`] and [`compare`].

mod format;
mod paths;
mod scan;

pub use format::format_comparison;
pub use paths::default_stardew_valley_mods_path;
pub use scan::{compare, scan, ScanError};
