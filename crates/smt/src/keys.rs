//! Tree-local key suffixes. The namespace prefix is prepended when talking
//! to the store.

use zkl2_db_types::Version;

const NODE_TAG: u8 = b'n';
const PREIMAGE_TAG: u8 = b'p';
const AUX_TAG: u8 = b'a';
const JOURNAL_TAG: u8 = b'v';
const META_TAG: u8 = b'm';

pub(crate) fn node_key(depth: u8, index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(10);
    key.push(NODE_TAG);
    key.push(depth);
    key.extend_from_slice(&index.to_be_bytes());
    key
}

pub(crate) fn preimage_key(index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(PREIMAGE_TAG);
    key.extend_from_slice(&index.to_be_bytes());
    key
}

pub(crate) fn aux_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(AUX_TAG);
    key.extend_from_slice(name.as_bytes());
    key
}

pub(crate) fn journal_key(version: Version) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(JOURNAL_TAG);
    key.extend_from_slice(&version.to_be_bytes());
    key
}

pub(crate) fn meta_key() -> Vec<u8> {
    vec![META_TAG]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_disjoint() {
        let keys = [
            node_key(0, 0),
            preimage_key(0),
            aux_key("count"),
            journal_key(0),
            meta_key(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a[0], b[0]);
            }
        }
    }

    #[test]
    fn test_journal_keys_sort_by_version() {
        assert!(journal_key(2) < journal_key(10));
        assert!(journal_key(255) < journal_key(256));
    }
}
