use std::{fmt, str::FromStr};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// A 32-byte buffer, used for every digest and tree root in the forest.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Buf32(#[serde(with = "hex::serde")] [u8; 32]);

impl Buf32 {
    pub const LEN: usize = 32;

    pub const fn new(inner: [u8; 32]) -> Self {
        Self(inner)
    }

    pub const fn zero() -> Self {
        Self([0; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub const fn into_inner(self) -> [u8; 32] {
        self.0
    }

    /// Parses a buffer from a slice that must be exactly 32 bytes long.
    pub fn try_from_slice(field: &'static str, bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CodecError::InvalidLength {
            field,
            expected: Self::LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for Buf32 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl From<Buf32> for [u8; 32] {
    fn from(value: Buf32) -> Self {
        value.0
    }
}

impl AsRef<[u8]> for Buf32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buf32({})", hex::encode(self.0))
    }
}

impl FromStr for Buf32 {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::try_from_slice("buf32", &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let buf = Buf32::new([0xab; 32]);
        let s = buf.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(s.parse::<Buf32>().unwrap(), buf);
        assert_eq!(format!("0x{s}").parse::<Buf32>().unwrap(), buf);
    }

    #[test]
    fn test_rejects_short_hex() {
        let err = "abcd".parse::<Buf32>().unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidLength {
                field: "buf32",
                expected: 32,
                got: 2
            }
        );
    }

    #[test]
    fn test_serde_as_hex() {
        let buf = Buf32::new([1; 32]);
        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: Buf32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buf);
    }
}
