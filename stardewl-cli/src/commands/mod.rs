//! One module per CLI subcommand (`SPEC_FULL.md` §6 "CLI surface").

pub mod host;
pub mod join;
pub mod mods;
pub mod session;
pub mod signaling;
pub mod version;
