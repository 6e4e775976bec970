#![forbid(unsafe_code)]

//! The canonical row: 4 channels per pixel, at 8 or 16 bits per channel.
//!
//! Every decoded scanline gets turned into this shape before it's composited
//! onto a canvas or applied as a color/alpha delta. The row is scratch space
//! owned by the session: it's sized once per image and overwritten every row.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::{high_byte, widen, MngResult};

/// A channel value within a canonical row: either `u8` or `u16`.
///
/// All the fixed-point alpha math is written once against this trait.
pub trait Channel: Copy + Debug + Default + Eq + Ord {
  /// Bits per channel.
  const BITS: u32;
  /// The maximum value (fully opaque alpha, full intensity color).
  const MAX: Self;

  /// Widens to `u64` for intermediate math.
  fn to_u64(self) -> u64;

  /// Narrows from `u64`. The value must already be in range.
  fn from_u64(v: u64) -> Self;

  /// Converts an 8-bit canvas channel into this width.
  fn from_canvas(v: u8) -> Self;

  /// Converts into an 8-bit canvas channel by truncation.
  fn to_canvas(self) -> u8;

  /// Rounded division by [`Channel::MAX`], for products of two channels.
  ///
  /// This is a shift-and-add identity that exactly equals `(x + MAX/2) /
  /// MAX` over the product range `0..=MAX*MAX`.
  fn round_div_max(x: u64) -> u64;

  /// `MAX` as a `u64`.
  #[inline]
  #[must_use]
  fn max_u64() -> u64 {
    Self::MAX.to_u64()
  }
}

impl Channel for u8 {
  const BITS: u32 = 8;
  const MAX: Self = u8::MAX;
  #[inline]
  fn to_u64(self) -> u64 {
    u64::from(self)
  }
  #[inline]
  fn from_u64(v: u64) -> Self {
    v as u8
  }
  #[inline]
  fn from_canvas(v: u8) -> Self {
    v
  }
  #[inline]
  fn to_canvas(self) -> u8 {
    self
  }
  #[inline]
  fn round_div_max(x: u64) -> u64 {
    let t = x + 0x80;
    ((t >> 8) + t) >> 8
  }
}

impl Channel for u16 {
  const BITS: u32 = 16;
  const MAX: Self = u16::MAX;
  #[inline]
  fn to_u64(self) -> u64 {
    u64::from(self)
  }
  #[inline]
  fn from_u64(v: u64) -> Self {
    v as u16
  }
  #[inline]
  fn from_canvas(v: u8) -> Self {
    widen(v)
  }
  #[inline]
  fn to_canvas(self) -> u8 {
    high_byte(self)
  }
  #[inline]
  fn round_div_max(x: u64) -> u64 {
    let t = x + 0x8000;
    ((t >> 16) + t) >> 16
  }
}

/// The pixels of a canonical row, at one of the two channel widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPixels {
  /// 8 bits per channel.
  Rgba8(Vec<[u8; 4]>),
  /// 16 bits per channel.
  Rgba16(Vec<[u16; 4]>),
}

/// One row of RGBA pixels plus the "every pixel is opaque" flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRow {
  pixels: RowPixels,
  /// Set when every pixel's alpha is the channel maximum.
  pub is_opaque: bool,
}
impl Default for CanonicalRow {
  #[inline]
  fn default() -> Self {
    Self { pixels: RowPixels::Rgba8(Vec::new()), is_opaque: true }
  }
}
impl CanonicalRow {
  /// Allocates a row that can hold up to `capacity` pixels without
  /// reallocating.
  pub fn try_with_capacity(capacity: usize, wide: bool) -> MngResult<Self> {
    let pixels = if wide {
      let mut v = Vec::new();
      v.try_reserve_exact(capacity)?;
      RowPixels::Rgba16(v)
    } else {
      let mut v = Vec::new();
      v.try_reserve_exact(capacity)?;
      RowPixels::Rgba8(v)
    };
    Ok(Self { pixels, is_opaque: true })
  }

  /// Makes an 8-bit row from the given pixels.
  #[must_use]
  pub fn from_rgba8(pixels: Vec<[u8; 4]>) -> Self {
    let mut row = Self { pixels: RowPixels::Rgba8(pixels), is_opaque: true };
    row.update_opacity();
    row
  }

  /// Makes a 16-bit row from the given pixels.
  #[must_use]
  pub fn from_rgba16(pixels: Vec<[u16; 4]>) -> Self {
    let mut row = Self { pixels: RowPixels::Rgba16(pixels), is_opaque: true };
    row.update_opacity();
    row
  }

  /// The pixel data.
  #[inline]
  #[must_use]
  pub fn pixels(&self) -> &RowPixels {
    &self.pixels
  }

  /// If the channels are 16-bit.
  #[inline]
  #[must_use]
  pub fn is_wide(&self) -> bool {
    matches!(self.pixels, RowPixels::Rgba16(_))
  }

  /// Number of pixels in the row.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    match &self.pixels {
      RowPixels::Rgba8(v) => v.len(),
      RowPixels::Rgba16(v) => v.len(),
    }
  }

  /// If the row holds no pixels.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Gets the 8-bit pixels, if this is an 8-bit row.
  #[inline]
  #[must_use]
  pub fn as_rgba8(&self) -> Option<&[[u8; 4]]> {
    match &self.pixels {
      RowPixels::Rgba8(v) => Some(v),
      RowPixels::Rgba16(_) => None,
    }
  }

  /// Gets the 16-bit pixels, if this is a 16-bit row.
  #[inline]
  #[must_use]
  pub fn as_rgba16(&self) -> Option<&[[u16; 4]]> {
    match &self.pixels {
      RowPixels::Rgba8(_) => None,
      RowPixels::Rgba16(v) => Some(v),
    }
  }

  /// Gets pixel `i` with every channel narrowed to 8 bits (by truncation).
  #[inline]
  #[must_use]
  pub fn get_rgba8(&self, i: usize) -> Option<[u8; 4]> {
    match &self.pixels {
      RowPixels::Rgba8(v) => v.get(i).copied(),
      RowPixels::Rgba16(v) => v.get(i).map(|p| p.map(high_byte)),
    }
  }

  /// Clears the row and resizes it to `len` zeroed 8-bit pixels.
  ///
  /// Existing capacity is kept when the channel width doesn't change.
  pub(crate) fn reset_rgba8(&mut self, len: usize) -> MngResult<&mut [[u8; 4]]> {
    if !matches!(self.pixels, RowPixels::Rgba8(_)) {
      self.pixels = RowPixels::Rgba8(Vec::new());
    }
    match &mut self.pixels {
      RowPixels::Rgba8(v) => {
        v.clear();
        v.try_reserve(len)?;
        v.resize(len, [0; 4]);
        Ok(v.as_mut_slice())
      }
      RowPixels::Rgba16(_) => unreachable!(),
    }
  }

  /// Clears the row and resizes it to `len` zeroed 16-bit pixels.
  pub(crate) fn reset_rgba16(&mut self, len: usize) -> MngResult<&mut [[u16; 4]]> {
    if !matches!(self.pixels, RowPixels::Rgba16(_)) {
      self.pixels = RowPixels::Rgba16(Vec::new());
    }
    match &mut self.pixels {
      RowPixels::Rgba16(v) => {
        v.clear();
        v.try_reserve(len)?;
        v.resize(len, [0; 4]);
        Ok(v.as_mut_slice())
      }
      RowPixels::Rgba8(_) => unreachable!(),
    }
  }

  /// Recomputes [`is_opaque`](Self::is_opaque) from the alpha channel.
  pub fn update_opacity(&mut self) -> bool {
    self.is_opaque = match &self.pixels {
      RowPixels::Rgba8(v) => all_opaque(v),
      RowPixels::Rgba16(v) => all_opaque(v),
    };
    self.is_opaque
  }
}

#[inline]
fn all_opaque<C: Channel>(pixels: &[[C; 4]]) -> bool {
  pixels.iter().all(|p| p[3] == C::MAX)
}

#[test]
fn test_round_div_max_is_exact_for_u8_products() {
  for x in 0..=(255_u64 * 255) {
    assert_eq!(u8::round_div_max(x), (x + 127) / 255, "x:{x}");
  }
}

#[test]
fn test_round_div_max_u16_samples() {
  let max = 65535_u64;
  for a in (0..=max).step_by(257) {
    for b in [0, 1, 2, 127, 128, 32767, 32768, 65534, 65535] {
      let x = a * b;
      assert_eq!(u16::round_div_max(x), (x + 32767) / 65535, "x:{x}");
    }
  }
  assert_eq!(u16::round_div_max(max * max), max);
}

#[test]
fn test_opacity_flag() {
  let mut row = CanonicalRow::from_rgba8(alloc::vec![[1, 2, 3, 255], [4, 5, 6, 255]]);
  assert!(row.is_opaque);
  row = CanonicalRow::from_rgba16(alloc::vec![[1, 2, 3, 0xFFFF], [4, 5, 6, 0xFFFE]]);
  assert!(!row.is_opaque);
  assert_eq!(row.get_rgba8(1), Some([0, 0, 0, 0xFF]));
}
