pub(crate) mod bootstrap;
pub(crate) mod decode;
pub(crate) mod replay;
pub(crate) mod rollback;
pub(crate) mod root;
