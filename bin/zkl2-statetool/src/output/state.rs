use serde::Serialize;
use zkl2_primitives::Buf32;
use zkl2_pubdata::TxPubData;

use super::{helpers::porcelain_field, traits::Formattable};

/// Committed state root at one height.
#[derive(Debug, Serialize)]
pub(crate) struct RootInfo {
    pub(crate) height: u64,
    pub(crate) state_root: Buf32,
    pub(crate) account_count: u64,
}

impl Formattable for RootInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("height", self.height),
            porcelain_field("state_root", self.state_root),
            porcelain_field("account_count", self.account_count),
        ]
        .join("\n")
    }
}

/// Outcome of a desert replay run.
#[derive(Debug, Serialize)]
pub(crate) struct ReplayInfo {
    pub(crate) from_height: u64,
    pub(crate) height: u64,
    pub(crate) blocks: usize,
    pub(crate) state_root: Buf32,
}

impl Formattable for ReplayInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("from_height", self.from_height),
            porcelain_field("height", self.height),
            porcelain_field("blocks_replayed", self.blocks),
            porcelain_field("state_root", self.state_root),
        ]
        .join("\n")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RollbackInfo {
    pub(crate) from_height: u64,
    pub(crate) height: u64,
    pub(crate) state_root: Buf32,
}

impl Formattable for RollbackInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("from_height", self.from_height),
            porcelain_field("height", self.height),
            porcelain_field("state_root", self.state_root),
        ]
        .join("\n")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BootstrapInfo {
    pub(crate) height: u64,
    pub(crate) account_count: u64,
    pub(crate) state_root: Buf32,
}

impl Formattable for BootstrapInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("height", self.height),
            porcelain_field("account_count", self.account_count),
            porcelain_field("state_root", self.state_root),
        ]
        .join("\n")
    }
}

/// One decoded pubdata chunk.
#[derive(Debug, Serialize)]
pub(crate) struct DecodedTx {
    pub(crate) index: usize,
    pub(crate) tx_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) signer: Option<u32>,
    pub(crate) pubdata: TxPubData,
}

impl DecodedTx {
    pub(crate) fn new(index: usize, pubdata: TxPubData) -> Self {
        Self {
            index,
            tx_type: format!("{:?}", pubdata.tx_type()),
            signer: pubdata.signer_account_index(),
            pubdata,
        }
    }
}

impl Formattable for DecodedTx {
    fn format_porcelain(&self) -> String {
        let prefix = format!("tx[{}]", self.index);
        let mut output = vec![porcelain_field(&format!("{prefix}.type"), &self.tx_type)];
        if let Some(signer) = self.signer {
            output.push(porcelain_field(&format!("{prefix}.signer"), signer));
        }
        output.join("\n")
    }
}
