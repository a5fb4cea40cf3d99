//! Desert recovery: derives leaf effects from posted pubdata and replays
//! them onto a forest, verifying each block against its posted state root.

mod effects;
mod errors;
mod replay;

pub use effects::derive_record;
pub use errors::{RecoveryError, RecoveryResult};
pub use replay::{DesertReplayer, ReplayBlock};
