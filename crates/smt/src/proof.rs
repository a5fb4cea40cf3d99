use serde::{Deserialize, Serialize};
use zkl2_primitives::{mimc::hash_pair, Buf32};

use crate::errors::{SmtError, SmtResult};

/// Sibling path for one leaf, ordered from the leaf level up to the child of
/// the root. Its length always equals the tree height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub index: u64,
    pub siblings: Vec<Buf32>,
}

impl MerkleProof {
    pub fn new(index: u64, siblings: Vec<Buf32>) -> Self {
        Self { index, siblings }
    }

    /// Recomputes the root implied by `leaf` sitting at this proof's index.
    pub fn compute_root(&self, leaf: &Buf32) -> Buf32 {
        let mut cur = *leaf;
        let mut idx = self.index;
        for sibling in &self.siblings {
            cur = if idx & 1 == 0 {
                hash_pair(&cur, sibling)
            } else {
                hash_pair(sibling, &cur)
            };
            idx >>= 1;
        }
        cur
    }

    /// Fails unless the proof has exactly `height` siblings.
    pub fn check_height(&self, height: u8) -> SmtResult<()> {
        if self.siblings.len() != height as usize {
            return Err(SmtError::ProofLength {
                expected: height as usize,
                got: self.siblings.len(),
            });
        }
        Ok(())
    }
}

/// Verifies that `leaf` is at `proof.index` under `root` in a tree of the
/// given height.
pub fn verify_proof(root: &Buf32, leaf: &Buf32, proof: &MerkleProof, height: u8) -> SmtResult<bool> {
    proof.check_height(height)?;
    Ok(proof.compute_root(leaf) == *root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_length_is_error() {
        let proof = MerkleProof::new(0, vec![Buf32::zero(); 3]);
        let err = verify_proof(&Buf32::zero(), &Buf32::zero(), &proof, 4).unwrap_err();
        assert_eq!(err, SmtError::ProofLength { expected: 4, got: 3 });
    }

    #[test]
    fn test_compute_root_orders_by_index_bit() {
        let leaf = Buf32::new([1; 32]);
        let sib = Buf32::new([2; 32]);
        let left = MerkleProof::new(0, vec![sib]);
        let right = MerkleProof::new(1, vec![sib]);
        assert_eq!(left.compute_root(&leaf), hash_pair(&leaf, &sib));
        assert_eq!(right.compute_root(&leaf), hash_pair(&sib, &leaf));
    }
}
