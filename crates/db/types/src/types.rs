use std::fmt;

/// Tree version. The forest commits every tree at the block height it just
/// applied, so versions line up with L2 block heights.
pub type Version = u64;

/// Key prefix isolating one logical tree inside a shared physical store.
///
/// Rendered as `"{name}:{namespace}/"`, e.g. `zkl2:asset:7/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: String,
    namespace: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Raw key prefix shared by every entry of this tree.
    pub fn prefix(&self) -> Vec<u8> {
        format!("{}:{}/", self.name, self.namespace).into_bytes()
    }

    /// Builds a full key from this namespace and a tree-local suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.prefix();
        key.extend_from_slice(suffix);
        key
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.namespace)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Ordered set of writes applied atomically by a driver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put(key, value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete(key));
    }

    /// Puts `value` when present, otherwise deletes the key.
    pub fn write(&mut self, key: Vec<u8>, value: Option<Vec<u8>>) {
        match value {
            Some(v) => self.put(key, v),
            None => self.delete(key),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefix() {
        let ns = Namespace::new("zkl2", "asset:7");
        assert_eq!(ns.prefix(), b"zkl2:asset:7/".to_vec());
        assert_eq!(ns.key(b"m"), b"zkl2:asset:7/m".to_vec());
        assert_eq!(ns.to_string(), "zkl2:asset:7");
    }

    #[test]
    fn test_sibling_namespaces_do_not_overlap() {
        // "asset:1/" must not be a prefix of "asset:10/".
        let a = Namespace::new("zkl2", "asset:1").prefix();
        let b = Namespace::new("zkl2", "asset:10").prefix();
        assert!(!b.starts_with(&a));
    }

    #[test]
    fn test_write_batch_write() {
        let mut batch = WriteBatch::new();
        batch.write(b"a".to_vec(), Some(b"1".to_vec()));
        batch.write(b"b".to_vec(), None);
        assert_eq!(
            batch.into_ops(),
            vec![
                BatchOp::Put(b"a".to_vec(), b"1".to_vec()),
                BatchOp::Delete(b"b".to_vec())
            ]
        );
    }
}
