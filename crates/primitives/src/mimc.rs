//! MiMC sponge over the BN254 scalar field.
//!
//! Compatible with the gnark-crypto `bn254/fr/mimc` construction: 91 rounds of
//! `x -> (x + k + c_i)^7` with round constants derived by iterating keccak256
//! from the seed `"seed"`, chained with Miyaguchi-Preneel compression.

use std::sync::OnceLock;

use alloy_primitives::keccak256;
use ark_bn254::Fr;
use ark_ff::{Field, Zero};

use crate::{
    buf::Buf32,
    field::{fr_from_block, fr_to_block, FIELD_BLOCK_LEN},
};

const MIMC_ROUNDS: usize = 91;
const MIMC_SEED: &[u8] = b"seed";

fn round_constants() -> &'static [Fr] {
    static CONSTANTS: OnceLock<Vec<Fr>> = OnceLock::new();
    CONSTANTS.get_or_init(|| {
        let mut rnd = keccak256(MIMC_SEED);
        (0..MIMC_ROUNDS)
            .map(|_| {
                rnd = keccak256(rnd);
                fr_from_block(rnd.as_slice())
            })
            .collect()
    })
}

fn encrypt(mut m: Fr, key: Fr) -> Fr {
    for c in round_constants() {
        let t = m + key + c;
        // t^7 = ((t^2 * t)^2) * t
        m = t.square() * t;
        m = m.square() * t;
    }
    m + key
}

/// Streaming MiMC hasher.
///
/// Input is absorbed as 32-byte big-endian blocks, each reduced modulo `r`.
/// When the total input is not a multiple of 32 bytes the trailing partial
/// block is left-padded with zeros.
#[derive(Clone, Debug, Default)]
pub struct MimcHasher {
    data: Vec<u8>,
}

impl MimcHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn finalize(mut self) -> Buf32 {
        let rem = self.data.len() % FIELD_BLOCK_LEN;
        if rem != 0 {
            let split = self.data.len() - rem;
            let tail = self.data.split_off(split);
            self.data.resize(split + FIELD_BLOCK_LEN - rem, 0);
            self.data.extend_from_slice(&tail);
        }

        let mut h = Fr::zero();
        for block in self.data.chunks_exact(FIELD_BLOCK_LEN) {
            let x = fr_from_block(block);
            let r = encrypt(x, h);
            h = r + h + x;
        }
        Buf32::new(fr_to_block(h))
    }
}

/// Hashes a sequence of canonical field blocks.
pub fn hash_blocks(blocks: &[[u8; FIELD_BLOCK_LEN]]) -> Buf32 {
    let mut hasher = MimcHasher::new();
    for block in blocks {
        hasher.update(block);
    }
    hasher.finalize()
}

/// Hashes two child digests into their parent node.
pub fn hash_pair(left: &Buf32, right: &Buf32) -> Buf32 {
    hash_blocks(&[left.into_inner(), right.into_inner()])
}
