//! Big-endian cursor helpers for fixed-width pubdata records.

use alloy_primitives::{Address, U256};
use zkl2_primitives::{Buf32, CodecError};

use crate::{
    errors::{PubDataError, PubDataResult},
    packed::{PackedAmount, PackedFee},
};

/// Appends fixed-width big-endian fields to a record.
#[derive(Debug, Default)]
pub(crate) struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub(crate) fn put_u24(&mut self, field: &'static str, v: u32) -> PubDataResult<()> {
        self.put_uint(field, v.into(), 3)
    }

    pub(crate) fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub(crate) fn put_u40(&mut self, field: &'static str, v: u64) -> PubDataResult<()> {
        self.put_uint(field, v, 5)
    }

    pub(crate) fn put_u128(&mut self, v: u128) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub(crate) fn put_u256(&mut self, v: &U256) {
        self.buf.extend_from_slice(&v.to_be_bytes::<32>());
    }

    pub(crate) fn put_buf32(&mut self, v: &Buf32) {
        self.buf.extend_from_slice(v.as_bytes());
    }

    pub(crate) fn put_address(&mut self, v: &Address) {
        self.buf.extend_from_slice(v.as_slice());
    }

    pub(crate) fn put_amount(&mut self, v: PackedAmount) {
        // Packed amounts are always 40 bits wide.
        self.buf.extend_from_slice(&v.raw().to_be_bytes()[3..]);
    }

    pub(crate) fn put_fee(&mut self, v: PackedFee) {
        self.put_u16(v.raw());
    }

    fn put_uint(&mut self, field: &'static str, v: u64, width: usize) -> PubDataResult<()> {
        let bits = (width * 8) as u32;
        if v >> bits != 0 {
            return Err(CodecError::Overflow { field, bits }.into());
        }
        self.buf.extend_from_slice(&v.to_be_bytes()[8 - width..]);
        Ok(())
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads fixed-width big-endian fields from a record.
#[derive(Debug)]
pub(crate) struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, n: usize) -> PubDataResult<&'a [u8]> {
        let remaining = self.buf.len() - self.offset;
        if n > remaining {
            return Err(PubDataError::Truncated {
                needed: n,
                remaining,
            });
        }
        let out = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    fn read_uint(&mut self, width: usize) -> PubDataResult<u64> {
        let mut raw = [0u8; 8];
        raw[8 - width..].copy_from_slice(self.take(width)?);
        Ok(u64::from_be_bytes(raw))
    }

    pub(crate) fn read_u8(&mut self) -> PubDataResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16(&mut self) -> PubDataResult<u16> {
        Ok(self.read_uint(2)? as u16)
    }

    pub(crate) fn read_u24(&mut self) -> PubDataResult<u32> {
        Ok(self.read_uint(3)? as u32)
    }

    pub(crate) fn read_u32(&mut self) -> PubDataResult<u32> {
        Ok(self.read_uint(4)? as u32)
    }

    pub(crate) fn read_u40(&mut self) -> PubDataResult<u64> {
        self.read_uint(5)
    }

    pub(crate) fn read_u128(&mut self) -> PubDataResult<u128> {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(self.take(16)?);
        Ok(u128::from_be_bytes(raw))
    }

    pub(crate) fn read_u256(&mut self) -> PubDataResult<U256> {
        Ok(U256::from_be_slice(self.take(32)?))
    }

    pub(crate) fn read_buf32(&mut self) -> PubDataResult<Buf32> {
        Ok(Buf32::try_from_slice("buf32", self.take(32)?)?)
    }

    pub(crate) fn read_address(&mut self) -> PubDataResult<Address> {
        Ok(Address::from_slice(self.take(20)?))
    }

    pub(crate) fn read_amount(&mut self) -> PubDataResult<PackedAmount> {
        PackedAmount::from_raw(self.read_u40()?)
    }

    pub(crate) fn read_fee(&mut self) -> PubDataResult<PackedFee> {
        Ok(PackedFee::from_raw(self.read_u16()?))
    }

    pub(crate) fn position(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_widths_roundtrip() {
        let mut w = RecordWriter::default();
        w.put_u24("offer_id", 0x00ab_cdef).unwrap();
        w.put_u40("nft_index", 0x12_3456_789a).unwrap();
        let raw = w.into_inner();
        assert_eq!(raw, vec![0xab, 0xcd, 0xef, 0x12, 0x34, 0x56, 0x78, 0x9a]);

        let mut r = RecordReader::new(&raw);
        assert_eq!(r.read_u24().unwrap(), 0x00ab_cdef);
        assert_eq!(r.read_u40().unwrap(), 0x12_3456_789a);
        assert_eq!(r.position(), 8);
    }

    #[test]
    fn test_overflowing_field_rejected() {
        let mut w = RecordWriter::default();
        assert_eq!(
            w.put_u24("offer_id", 1 << 24).unwrap_err(),
            PubDataError::Codec(CodecError::Overflow {
                field: "offer_id",
                bits: 24
            })
        );
        assert!(w.put_u40("nft_index", 1 << 40).is_err());
    }

    #[test]
    fn test_short_read() {
        let mut r = RecordReader::new(&[1, 2]);
        assert_eq!(
            r.read_u32().unwrap_err(),
            PubDataError::Truncated {
                needed: 4,
                remaining: 2
            }
        );
    }
}
