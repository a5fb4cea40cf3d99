//! On-chain block commitment.

use alloy_primitives::{keccak256, U256};
use zkl2_primitives::{
    constants::CHUNK_BYTES,
    field::{reduce_to_block, u64_to_block},
    Buf32,
};

/// Inputs of the block commitment posted to L1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCommitmentInput<'a> {
    pub height: u64,
    /// Block creation time in milliseconds.
    pub created_at: u64,
    pub old_state_root: Buf32,
    pub new_state_root: Buf32,
    pub pubdata: &'a [u8],
    pub on_chain_ops_count: u64,
}

/// Reduces every 32-byte chunk of `bytes` modulo `r`. Inputs of at most one
/// chunk are left-padded first; a trailing partial chunk of a longer input
/// is dropped.
fn reduce_chunks(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() <= CHUNK_BYTES {
        let mut block = [0u8; CHUNK_BYTES];
        block[CHUNK_BYTES - bytes.len()..].copy_from_slice(bytes);
        return reduce_to_block(U256::from_be_bytes(block)).to_vec();
    }
    bytes
        .chunks_exact(CHUNK_BYTES)
        .flat_map(|chunk| {
            let mut block = [0u8; CHUNK_BYTES];
            block.copy_from_slice(chunk);
            reduce_to_block(U256::from_be_bytes(block))
        })
        .collect()
}

/// `keccak256(height ‖ createdAt ‖ oldRoot ‖ newRoot ‖ pubdata ‖ onChainOpsCount)`
/// with integers as 32-byte big-endian words and every byte field reduced
/// chunk-wise modulo `r`.
pub fn block_commitment(input: &BlockCommitmentInput<'_>) -> Buf32 {
    let mut buf = Vec::with_capacity(CHUNK_BYTES * 5 + input.pubdata.len());
    buf.extend_from_slice(&u64_to_block(input.height));
    buf.extend_from_slice(&u64_to_block(input.created_at));
    buf.extend(reduce_chunks(input.old_state_root.as_bytes()));
    buf.extend(reduce_chunks(input.new_state_root.as_bytes()));
    buf.extend(reduce_chunks(input.pubdata));
    buf.extend_from_slice(&u64_to_block(input.on_chain_ops_count));
    Buf32::new(keccak256(&buf).0)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use zkl2_primitives::field::FIELD_MODULUS;

    use super::*;

    fn input(pubdata: &[u8]) -> BlockCommitmentInput<'_> {
        BlockCommitmentInput {
            height: 12,
            created_at: 1_700_000_000_000,
            old_state_root: Buf32::new([1; 32]),
            new_state_root: Buf32::new([2; 32]),
            pubdata,
            on_chain_ops_count: 1,
        }
    }

    #[test]
    fn test_commitment_layout() {
        let pubdata = [7u8; 64];
        let mut expected = Vec::new();
        expected.extend_from_slice(&u64_to_block(12));
        expected.extend_from_slice(&u64_to_block(1_700_000_000_000));
        expected.extend_from_slice(&[1; 32]);
        expected.extend_from_slice(&[2; 32]);
        expected.extend_from_slice(&pubdata);
        expected.extend_from_slice(&u64_to_block(1));
        assert_eq!(
            block_commitment(&input(&pubdata)),
            Buf32::new(keccak256(&expected).0)
        );
    }

    #[test]
    fn test_chunks_reduced_mod_r() {
        let modulus = FIELD_MODULUS.to_be_bytes::<32>();
        let mut over = [0u8; 64];
        over[..32].copy_from_slice(&(FIELD_MODULUS + U256::from(1)).to_be_bytes::<32>());
        let mut reduced = [0u8; 64];
        reduced[31] = 1;
        assert_eq!(reduce_chunks(&over), reduced.to_vec());
        assert_eq!(reduce_chunks(&modulus), vec![0; 32]);
    }

    #[test]
    fn test_commitment_sensitive_to_ops_count() {
        let pubdata = [0u8; 192];
        let mut other = input(&pubdata);
        other.on_chain_ops_count = 2;
        assert_ne!(block_commitment(&input(&pubdata)), block_commitment(&other));
    }
}
