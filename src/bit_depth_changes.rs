#![forbid(unsafe_code)]

//! The sample scaling rules shared by every stage.
//!
//! * To *increase* bit depth the current bit pattern becomes the top bits of
//!   the new value, and is then copied down as many times as needed to fill
//!   the newly added bits ("left bit replication"). For 1, 2, and 4 bit
//!   samples going to 8 bits this is the same as multiplying by 255, 85, and
//!   17 respectively. PROM can alternately ask for the new low bits to be zero.
//! * To *decrease* bit depth just keep the top bits. 16-bit to 8-bit keeps the
//!   high byte, it never rounds.

use bitfrob::u8_replicate_bits;

/// The multiplier that scales a sample of the given depth up to 8 bits.
///
/// ## Panics
/// * If `bits` is not 1, 2, 4, or 8.
#[inline]
#[must_use]
pub const fn replicate_multiplier(bits: u8) -> u8 {
  match bits {
    1 => 255,
    2 => 85,
    4 => 17,
    8 => 1,
    _ => panic!("illegal source depth"),
  }
}

/// Makes a 1, 2, 4, or 8 bit sample be 8 bits by bit replication.
#[inline]
#[must_use]
pub fn replicate_to_8(bits: u8, value: u8) -> u8 {
  if bits >= 8 {
    value
  } else {
    u8_replicate_bits(u32::from(bits), value)
  }
}

/// Takes the high byte of a 16-bit channel.
#[inline]
#[must_use]
pub const fn high_byte(value: u16) -> u8 {
  (value >> 8) as u8
}

/// Widens an 8-bit channel to 16 bits by replication (`0xAB` becomes `0xABAB`).
#[inline]
#[must_use]
pub const fn widen(value: u8) -> u16 {
  u16::from_be_bytes([value, value])
}

/// How new low bits get filled when a sample's depth increases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FillMethod {
  /// Copy the existing bit pattern down into the new bits.
  #[default]
  LeftBitReplicate = 0,
  /// Leave the new low bits as zero.
  ZeroFill = 1,
}
impl TryFrom<u8> for FillMethod {
  type Error = crate::MngPixelError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(Self::LeftBitReplicate),
      1 => Ok(Self::ZeroFill),
      _ => Err(crate::MngPixelError::ContractViolation("unknown fill method")),
    }
  }
}

/// Changes a sample from one legal depth (1, 2, 4, 8, or 16) to another.
#[inline]
#[must_use]
pub fn scale_sample(value: u16, from_bits: u8, to_bits: u8, fill: FillMethod) -> u16 {
  use core::cmp::Ordering;
  match from_bits.cmp(&to_bits) {
    Ordering::Equal => value,
    Ordering::Greater => value >> (from_bits - to_bits),
    Ordering::Less => match fill {
      FillMethod::ZeroFill => value << (to_bits - from_bits),
      FillMethod::LeftBitReplicate => {
        // `from_bits` is at most 8 here, so the value fits in a byte.
        let v8 = replicate_to_8(from_bits, value as u8);
        if to_bits <= 8 {
          u16::from(v8 >> (8 - to_bits))
        } else {
          widen(v8)
        }
      }
    },
  }
}

/// Changes a sample from `from_bits` to 8 bits with left bit replication or
/// high byte truncation.
#[inline]
#[must_use]
pub fn sample_to_8(value: u16, from_bits: u8) -> u8 {
  scale_sample(value, from_bits, 8, FillMethod::LeftBitReplicate) as u8
}

#[test]
fn test_replication_matches_multiplier_table() {
  for bits in [1_u8, 2, 4, 8] {
    for v in 0..(1_u16 << bits) {
      let expected = (v as u8).wrapping_mul(replicate_multiplier(bits));
      assert_eq!(replicate_to_8(bits, v as u8), expected, "bits:{bits} v:{v}");
    }
  }
}

#[test]
fn test_scale_sample() {
  let lbr = FillMethod::LeftBitReplicate;
  assert_eq!(scale_sample(1, 1, 2, lbr), 0b11);
  assert_eq!(scale_sample(0b10, 2, 4, lbr), 0b1010);
  assert_eq!(scale_sample(0xA, 4, 8, lbr), 0xAA);
  assert_eq!(scale_sample(0xAB, 8, 16, lbr), 0xABAB);
  assert_eq!(scale_sample(1, 1, 16, lbr), 0xFFFF);
  assert_eq!(scale_sample(0x80FF, 16, 8, lbr), 0x80);
  assert_eq!(scale_sample(0xFF, 8, 1, lbr), 1);
  assert_eq!(scale_sample(0b0111_1111, 8, 1, lbr), 0);
  assert_eq!(scale_sample(0xC, 4, 8, FillMethod::ZeroFill), 0xC0);
  assert_eq!(scale_sample(1, 1, 16, FillMethod::ZeroFill), 0x8000);
  assert_eq!(high_byte(0x80FF), 0x80);
  assert_eq!(widen(0x12), 0x1212);
}
