//! Versioned sparse Merkle tree over a [`TreeStore`](zkl2_db_types::TreeStore).
//!
//! Every tree lives under its own [`Namespace`](zkl2_db_types::Namespace)
//! and keeps uncommitted writes in memory. A commit persists the dirty
//! entries together with an undo journal for the new version, which is what
//! makes rollback and historic reads possible on every driver.

mod errors;
mod keys;
mod nil;
mod proof;
mod tree;

pub use errors::{SmtError, SmtResult};
pub use nil::NilHashes;
pub use proof::{verify_proof, MerkleProof};
pub use tree::SparseMerkleTree;
