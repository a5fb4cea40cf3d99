//! Floating-point style packed amounts.
//!
//! A packed value is `mantissa << 5 | exponent` and represents
//! `mantissa * 10^exponent`. Packing picks the largest representable value
//! not above the input and encodes it with the smallest exponent, so every
//! value has exactly one packed form.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use zkl2_primitives::{field::parse_decimal, CodecError};

use crate::errors::{PubDataError, PubDataResult};

const EXPONENT_BITS: u32 = 5;
const EXPONENT_MASK: u64 = (1 << EXPONENT_BITS) - 1;
const MAX_EXPONENT: u64 = EXPONENT_MASK;

/// Largest mantissa of a packed amount, `2^35 - 1`.
pub const PACKED_AMOUNT_MAX_MANTISSA: u64 = (1 << 35) - 1;

/// Largest mantissa of a packed fee, `2^11 - 1`.
pub const PACKED_FEE_MAX_MANTISSA: u64 = (1 << 11) - 1;

fn max_packable(max_mantissa: u64) -> U256 {
    U256::from(max_mantissa) * U256::from(10u64).pow(U256::from(MAX_EXPONENT))
}

fn pack(kind: &'static str, value: U256, max_mantissa: u64) -> PubDataResult<u64> {
    if value > max_packable(max_mantissa) {
        return Err(PubDataError::Unpackable {
            kind,
            value: value.to_string(),
        });
    }
    let ten = U256::from(10u64);
    let limit = U256::from(max_mantissa);
    let mut mantissa = value;
    let mut exponent = 0u64;
    while mantissa > limit {
        mantissa /= ten;
        exponent += 1;
    }
    // A full mantissa one exponent lower can still beat the truncated value.
    if exponent > 0
        && limit * ten.pow(U256::from(exponent - 1)) > mantissa * ten.pow(U256::from(exponent))
    {
        mantissa = limit;
        exponent -= 1;
    }
    while exponent > 0 && mantissa * ten <= limit {
        mantissa *= ten;
        exponent -= 1;
    }
    Ok(mantissa.as_limbs()[0] << EXPONENT_BITS | exponent)
}

fn unpack(raw: u64) -> U256 {
    let mantissa = U256::from(raw >> EXPONENT_BITS);
    let exponent = U256::from(raw & EXPONENT_MASK);
    mantissa * U256::from(10u64).pow(exponent)
}

fn parse_unsigned(kind: &'static str, s: &str) -> PubDataResult<U256> {
    if s.starts_with('-') {
        return Err(PubDataError::NegativeAmount {
            kind,
            value: s.to_owned(),
        });
    }
    Ok(parse_decimal(s)?)
}

/// A 40-bit packed transfer amount.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedAmount(u64);

impl PackedAmount {
    pub const BITS: u32 = 40;

    /// Packs `amount`, rounding down to the representable value.
    pub fn pack(amount: U256) -> PubDataResult<Self> {
        pack("amount", amount, PACKED_AMOUNT_MAX_MANTISSA).map(Self)
    }

    /// Packs a decimal amount string.
    pub fn pack_decimal(amount: &str) -> PubDataResult<Self> {
        Self::pack(parse_unsigned("amount", amount)?)
    }

    /// Wraps a raw 40-bit wire value.
    pub fn from_raw(raw: u64) -> PubDataResult<Self> {
        if raw >> Self::BITS != 0 {
            return Err(CodecError::Overflow {
                field: "packed_amount",
                bits: Self::BITS,
            }
            .into());
        }
        Ok(Self(raw))
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn mantissa(self) -> u64 {
        self.0 >> EXPONENT_BITS
    }

    pub fn exponent(self) -> u8 {
        (self.0 & EXPONENT_MASK) as u8
    }

    /// The amount this value stands for.
    pub fn amount(self) -> U256 {
        unpack(self.0)
    }

    /// Largest representable amount not above `amount`.
    pub fn round_down(amount: U256) -> PubDataResult<U256> {
        Self::pack(amount).map(Self::amount)
    }
}

/// A 16-bit packed fee.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedFee(u16);

impl PackedFee {
    pub const BITS: u32 = 16;

    pub fn pack(fee: U256) -> PubDataResult<Self> {
        // Mantissa is at most 11 bits, so the packed value fits in 16.
        pack("fee", fee, PACKED_FEE_MAX_MANTISSA).map(|raw| Self(raw as u16))
    }

    pub fn pack_decimal(fee: &str) -> PubDataResult<Self> {
        Self::pack(parse_unsigned("fee", fee)?)
    }

    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn amount(self) -> U256 {
        unpack(self.0.into())
    }

    pub fn round_down(fee: U256) -> PubDataResult<U256> {
        Self::pack(fee).map(Self::amount)
    }
}
