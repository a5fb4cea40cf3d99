//! Primitive types shared by the state commitment crates: the 32-byte digest
//! type, BN254 field canonicalization, the MiMC hasher and protocol constants.

pub mod buf;
pub mod constants;
pub mod errors;
pub mod field;
pub mod mimc;

pub use buf::Buf32;
pub use errors::{CodecError, CodecResult};
