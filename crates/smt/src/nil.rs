use zkl2_primitives::{mimc::hash_pair, Buf32};

/// Digests of fully empty subtrees at every depth of a tree.
///
/// `at(height)` is the empty-leaf digest and `at(0)` the nil root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NilHashes {
    hashes: Vec<Buf32>,
}

impl NilHashes {
    pub fn new(height: u8, empty_leaf: Buf32) -> Self {
        let mut hashes = vec![Buf32::zero(); height as usize + 1];
        let mut cur = empty_leaf;
        hashes[height as usize] = cur;
        for depth in (0..height as usize).rev() {
            cur = hash_pair(&cur, &cur);
            hashes[depth] = cur;
        }
        Self { hashes }
    }

    pub fn height(&self) -> u8 {
        (self.hashes.len() - 1) as u8
    }

    /// Empty subtree digest for a node at `depth` (0 = root).
    pub fn at(&self, depth: u8) -> Buf32 {
        self.hashes[depth as usize]
    }

    pub fn root(&self) -> Buf32 {
        self.hashes[0]
    }

    pub fn empty_leaf(&self) -> Buf32 {
        self.hashes[self.hashes.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_chain() {
        let leaf = Buf32::new([3; 32]);
        let nil = NilHashes::new(3, leaf);
        assert_eq!(nil.height(), 3);
        assert_eq!(nil.empty_leaf(), leaf);
        assert_eq!(nil.at(2), hash_pair(&leaf, &leaf));
        assert_eq!(nil.at(1), hash_pair(&nil.at(2), &nil.at(2)));
        assert_eq!(nil.root(), hash_pair(&nil.at(1), &nil.at(1)));
    }
}
