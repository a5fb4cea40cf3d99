//! Canonicalization of leaf inputs into 32-byte BN254 field blocks.
//!
//! Numeric values are reduced modulo the scalar field modulus and left-padded
//! to 32 bytes. Raw byte inputs (addresses, hashes, keys) are size-checked and
//! left-padded without reduction; the hasher reduces every block on absorb.

use alloy_primitives::U256;
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

use crate::errors::{CodecError, CodecResult};

/// Width of one canonical field block.
pub const FIELD_BLOCK_LEN: usize = 32;

/// The BN254 scalar field modulus `r`.
pub const FIELD_MODULUS: U256 = U256::from_limbs([
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);

/// Parses an unsigned decimal string.
pub fn parse_decimal(s: &str) -> CodecResult<U256> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::MalformedNumber(s.to_owned()));
    }
    U256::from_str_radix(s, 10).map_err(|_| CodecError::MalformedNumber(s.to_owned()))
}

/// Reduces a value modulo `r` and returns its 32-byte big-endian encoding.
pub fn reduce_to_block(value: U256) -> [u8; FIELD_BLOCK_LEN] {
    (value % FIELD_MODULUS).to_be_bytes::<FIELD_BLOCK_LEN>()
}

/// Parses a decimal string and canonicalizes it into a field block.
pub fn decimal_to_block(s: &str) -> CodecResult<[u8; FIELD_BLOCK_LEN]> {
    parse_decimal(s).map(reduce_to_block)
}

pub fn u64_to_block(value: u64) -> [u8; FIELD_BLOCK_LEN] {
    let mut out = [0; FIELD_BLOCK_LEN];
    out[FIELD_BLOCK_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Checks that `bytes` is exactly `expected` long and left-pads it into a
/// field block.
pub fn pad_block(
    field: &'static str,
    bytes: &[u8],
    expected: usize,
) -> CodecResult<[u8; FIELD_BLOCK_LEN]> {
    if bytes.len() != expected || expected > FIELD_BLOCK_LEN {
        return Err(CodecError::InvalidLength {
            field,
            expected,
            got: bytes.len(),
        });
    }
    let mut out = [0; FIELD_BLOCK_LEN];
    out[FIELD_BLOCK_LEN - expected..].copy_from_slice(bytes);
    Ok(out)
}

pub(crate) fn fr_from_block(block: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(block)
}

pub(crate) fn fr_to_block(value: Fr) -> [u8; FIELD_BLOCK_LEN] {
    let raw = value.into_bigint().to_bytes_be();
    let mut out = [0; FIELD_BLOCK_LEN];
    out[FIELD_BLOCK_LEN - raw.len()..].copy_from_slice(&raw);
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_modulus_matches_ark() {
        let ark_modulus = Fr::MODULUS.to_bytes_be();
        assert_eq!(FIELD_MODULUS.to_be_bytes::<32>().to_vec(), ark_modulus);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        for bad in ["", "-1", "12a", " 1", "0x10", "1.5"] {
            assert!(
                matches!(parse_decimal(bad), Err(CodecError::MalformedNumber(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reduce_wraps_modulus() {
        assert_eq!(reduce_to_block(FIELD_MODULUS), [0; 32]);
        assert_eq!(
            reduce_to_block(FIELD_MODULUS + U256::from(5)),
            u64_to_block(5)
        );
    }

    #[test]
    fn test_pad_block_checks_size() {
        let addr = [0x11u8; 20];
        let padded = pad_block("l1_address", &addr, 20).unwrap();
        assert_eq!(&padded[..12], &[0u8; 12]);
        assert_eq!(&padded[12..], &addr);

        let err = pad_block("l1_address", &addr[..19], 20).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidLength {
                field: "l1_address",
                expected: 20,
                got: 19
            }
        );
    }

    proptest! {
        #[test]
        fn proptest_decimal_block_matches_u64(v in any::<u64>()) {
            prop_assert_eq!(decimal_to_block(&v.to_string()).unwrap(), u64_to_block(v));
        }

        #[test]
        fn proptest_fr_block_roundtrip(bytes in any::<[u8; 32]>()) {
            let reduced = reduce_to_block(U256::from_be_bytes(bytes));
            prop_assert_eq!(fr_to_block(fr_from_block(&bytes)), reduced);
        }
    }
}
