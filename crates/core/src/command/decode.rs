//! Strict string-to-number decoders.
//!
//! Every decoder requires the whole input to be consumed: empty strings,
//! surrounding whitespace, trailing characters and out-of-range magnitudes
//! are all rejected.

use std::num::IntErrorKind;

/// Why a value failed to decode.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input (or its digit run) was empty.
    #[error("empty value")]
    Empty,
    /// The input contains characters that are not part of the number.
    #[error("not a number")]
    Malformed,
    /// The magnitude does not fit the target width.
    #[error("value exceeds {max}")]
    Overflow {
        /// Largest value the target width can hold.
        max: u64,
    },
}

/// Decode an unsigned 16-bit integer.
///
/// `base` 0 auto-detects the radix from the prefix (`0x` hex, leading `0`
/// octal, decimal otherwise); 8, 10 and 16 force a radix.
pub fn decode_u16(text: &str, base: u32) -> Result<u16, DecodeError> {
    let max = u64::from(u16::MAX);
    let v = decode_unsigned(text, base).map_err(|e| at_width(e, max))?;
    u16::try_from(v).map_err(|_| DecodeError::Overflow { max })
}

/// Decode an unsigned 32-bit integer. See [`decode_u16`] for `base`.
pub fn decode_u32(text: &str, base: u32) -> Result<u32, DecodeError> {
    let max = u64::from(u32::MAX);
    let v = decode_unsigned(text, base).map_err(|e| at_width(e, max))?;
    u32::try_from(v).map_err(|_| DecodeError::Overflow { max })
}

/// Decode a single-precision float.
///
/// Accepts the forms understood by `f32::from_str` (`0.875`, `.5`, `1e-3`,
/// `inf`, ...). No range restriction is applied here.
pub fn decode_float(text: &str) -> Result<f32, DecodeError> {
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    text.parse::<f32>().map_err(|_| DecodeError::Malformed)
}

fn decode_unsigned(text: &str, base: u32) -> Result<u64, DecodeError> {
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    let (radix, digits) = split_radix(unsigned, base);
    if !(2..=36).contains(&radix) || digits.is_empty() {
        return Err(DecodeError::Malformed);
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(DecodeError::Malformed);
    }
    u64::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => DecodeError::Overflow { max: u64::MAX },
        IntErrorKind::Empty => DecodeError::Empty,
        _ => DecodeError::Malformed,
    })
}

/// Report an overflow against the caller's width, not the 64-bit scratch.
fn at_width(err: DecodeError, max: u64) -> DecodeError {
    match err {
        DecodeError::Overflow { .. } => DecodeError::Overflow { max },
        other => other,
    }
}

/// Resolve the effective radix and strip its prefix.
fn split_radix(text: &str, base: u32) -> (u32, &str) {
    let hex_digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"));
    match base {
        0 => {
            if let Some(rest) = hex_digits {
                (16, rest)
            } else if text.len() > 1 && text.starts_with('0') {
                (8, &text[1..])
            } else {
                (10, text)
            }
        }
        16 => (16, hex_digits.unwrap_or(text)),
        other => (other, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_values() {
        assert_eq!(decode_u32("0", 0), Ok(0));
        assert_eq!(decode_u32("500000", 0), Ok(500_000));
        assert_eq!(decode_u32("4294967295", 0), Ok(u32::MAX));
        assert_eq!(decode_u16("65535", 0), Ok(u16::MAX));
        assert_eq!(decode_u32("+42", 10), Ok(42));
    }

    #[test]
    fn radix_prefixes() {
        assert_eq!(decode_u32("0x1F", 0), Ok(0x1f));
        assert_eq!(decode_u32("0XfF", 0), Ok(0xff));
        assert_eq!(decode_u32("010", 0), Ok(8));
        assert_eq!(decode_u32("ff", 16), Ok(0xff));
        assert_eq!(decode_u32("0xff", 16), Ok(0xff));
        assert_eq!(decode_u32("010", 10), Ok(10));
    }

    #[test]
    fn overflow_is_rejected() {
        assert_eq!(
            decode_u16("70000", 0),
            Err(DecodeError::Overflow { max: 65535 })
        );
        assert_eq!(
            decode_u32("4294967296", 0),
            Err(DecodeError::Overflow {
                max: 4_294_967_295
            })
        );
    }

    #[test]
    fn huge_values_report_the_target_width() {
        assert_eq!(
            decode_u32("99999999999999999999", 0),
            Err(DecodeError::Overflow {
                max: 4_294_967_295
            })
        );
        assert_eq!(
            decode_u16("0xffffffffffffffffff", 0),
            Err(DecodeError::Overflow { max: 65535 })
        );
        assert_eq!(
            decode_u32("99999999999999999999", 0)
                .unwrap_err()
                .to_string(),
            "value exceeds 4294967295"
        );
    }

    #[test]
    fn partial_consumption_is_rejected() {
        for bad in ["12abc", "1 ", " 1", "0x", "08", "1.5", "--1", "-1", "++1", "+", "0x-1"] {
            assert!(decode_u32(bad, 0).is_err(), "{bad:?} should not decode");
        }
        assert_eq!(decode_u32("", 0), Err(DecodeError::Empty));
    }

    #[test]
    fn floats() {
        assert_eq!(decode_float("0.875"), Ok(0.875));
        assert_eq!(decode_float(".5"), Ok(0.5));
        assert_eq!(decode_float("1e-1"), Ok(0.1));
        assert_eq!(decode_float(""), Err(DecodeError::Empty));
        assert_eq!(decode_float("0.8x"), Err(DecodeError::Malformed));
        assert_eq!(decode_float(" 0.8"), Err(DecodeError::Malformed));
    }
}
