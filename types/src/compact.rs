use crate::BigTarget;

/// The 32-bit packed "nBits" representation of a [`BigTarget`].
///
/// Layout: the most significant byte is a base-256 exponent `e`; the low
/// three bytes are a 24-bit signed mantissa `m` (bit 23 is the sign). The
/// decoded value is `m * 256^(e-3)`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct CompactBits(pub u32);

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

impl std::fmt::Debug for CompactBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompactBits({:#010x})", self.0)
    }
}

/// The outcome of decoding a [`CompactBits`] value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedTarget {
    pub value: BigTarget,
    pub negative: bool,
    pub overflow: bool,
}

impl CompactBits {
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        CompactBits(bits)
    }

    /// Decode into a [`BigTarget`] plus the `negative`/`overflow` flags.
    ///
    /// Mirrors `arith_uint256::SetCompact` from the Bitcoin lineage:
    /// out-of-range exponents are detected via `overflow` rather than
    /// panicking, so verification code can reject the block instead of
    /// the decoder trapping on adversarial input.
    #[must_use]
    pub fn decode(self) -> DecodedTarget {
        let exponent = self.0 >> 24;
        let mantissa = self.0 & MANTISSA_MASK;

        let value = if exponent <= 3 {
            BigTarget::from_u64(u64::from(mantissa >> (8 * (3 - exponent))))
        } else {
            BigTarget::from_u64(u64::from(mantissa)) << (8 * (exponent - 3))
        };

        let negative = mantissa != 0 && (self.0 & SIGN_BIT) != 0;
        let overflow = mantissa != 0
            && (exponent > 34
                || (mantissa > 0xff && exponent > 33)
                || (mantissa > 0xffff && exponent > 32));

        DecodedTarget {
            value,
            negative,
            overflow,
        }
    }

    /// Decode the plain magnitude, ignoring sign/overflow. Convenience for
    /// call sites that only care about the numeric target.
    #[must_use]
    pub fn decode_value(self) -> BigTarget {
        self.decode().value
    }

    /// Encode a [`BigTarget`] into its canonical compact representation.
    #[must_use]
    pub fn encode(value: BigTarget) -> Self {
        let mut size = value.bit_len().div_ceil(8);
        let mut compact: u32 = if size <= 3 {
            let shift = 8 * (3 - size);
            low_u32(value << shift)
        } else {
            low_u32(value >> (8 * (size - 3))) & MANTISSA_MASK
        };

        // If the top bit of the 24-bit mantissa would be set, the encoding
        // would look negative on decode; shift one more byte to keep it
        // positive, bumping the exponent to compensate.
        if compact & SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        compact |= size << 24;
        CompactBits(compact)
    }
}

fn low_u32(v: BigTarget) -> u32 {
    // Callers only ever pass values already shifted down to fit within the
    // low 24 (or 32, pre-mask) bits, so truncation loses nothing.
    v.low_u64() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_genesis_bits() {
        let bits = CompactBits::new(0x1d00_ffff);
        let decoded = bits.decode();
        assert!(!decoded.negative);
        assert!(!decoded.overflow);
        assert_eq!(CompactBits::encode(decoded.value).0, bits.0);
    }

    #[test]
    fn round_trips_low_exponent() {
        let bits = CompactBits::new(0x0300_0001);
        assert_eq!(bits.decode().value, BigTarget::from_u64(1));

        let bits2 = CompactBits::new(0x0300_0080);
        assert_eq!(bits2.decode().value, BigTarget::from_u64(0x80));
    }

    #[test]
    fn negative_flag_set_when_sign_bit_and_nonzero_mantissa() {
        let bits = CompactBits::new(0x0180_0001);
        let decoded = bits.decode();
        assert!(decoded.negative);
    }

    #[test]
    fn overflow_flag_set_for_out_of_range_exponent() {
        let bits = CompactBits::new(0x2300_0001);
        assert!(bits.decode().overflow);
    }

    #[test]
    fn encode_avoids_spurious_negative_flag() {
        // A value whose top mantissa byte would have the sign bit set.
        let value = BigTarget::from_u64(0x00ff_ffff);
        let encoded = CompactBits::encode(value);
        let decoded = encoded.decode();
        assert!(!decoded.negative);
        assert_eq!(decoded.value, value);
    }

    #[test]
    fn zero_round_trips() {
        let encoded = CompactBits::encode(BigTarget::ZERO);
        assert_eq!(encoded.decode().value, BigTarget::ZERO);
    }
}
