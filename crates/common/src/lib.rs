//! Process-level plumbing shared by the binaries.

pub mod logging;
