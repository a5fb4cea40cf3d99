use anyhow::Context;
use argh::FromArgs;
use zkl2_pubdata::{decode_batch, TxPubData};

use crate::{
    cli::OutputFormat,
    output::{output, DecodedTx},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "decode-pubdata")]
/// Decode hex block pubdata into transaction records
pub(crate) struct DecodePubdataArgs {
    /// hex encoded pubdata, with or without 0x
    #[argh(positional)]
    pub(crate) pubdata: String,

    /// skip empty padding records
    #[argh(switch)]
    pub(crate) skip_empty: bool,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

pub(crate) fn decode_pubdata(args: DecodePubdataArgs) -> anyhow::Result<()> {
    let txs = decode_hex_pubdata(&args.pubdata, args.skip_empty)?;
    output(&txs, args.output_format)
}

fn decode_hex_pubdata(pubdata: &str, skip_empty: bool) -> anyhow::Result<Vec<DecodedTx>> {
    let raw = pubdata.trim();
    let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).context("decoding hex")?;
    Ok(decode_batch(&bytes)?
        .into_iter()
        .enumerate()
        .filter(|(_, tx)| !(skip_empty && *tx == TxPubData::Empty))
        .map(|(i, tx)| DecodedTx::new(i, tx))
        .collect())
}

#[cfg(test)]
mod tests {
    use zkl2_pubdata::{encode_batch, CancelOfferPubData, GasFee};

    use super::*;

    fn sample() -> String {
        let txs = [
            TxPubData::CancelOffer(CancelOfferPubData {
                account_index: 2,
                offer_id: 9,
                gas: GasFee::default(),
            }),
            TxPubData::Empty,
        ];
        format!("0x{}", hex::encode(encode_batch(&txs).unwrap()))
    }

    #[test]
    fn test_decode_keeps_positions() {
        let txs = decode_hex_pubdata(&sample(), false).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].tx_type, "CancelOffer");
        assert_eq!(txs[0].signer, Some(2));
        assert_eq!(txs[1].index, 1);
    }

    #[test]
    fn test_decode_skip_empty() {
        let txs = decode_hex_pubdata(&sample(), true).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].index, 0);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode_hex_pubdata("0xzz", false).is_err());
        assert!(decode_hex_pubdata("0x00ff", false).is_err());
    }
}
