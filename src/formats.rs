#![forbid(unsafe_code)]

//! The native sample formats that rows arrive in and that image buffers keep.
//!
//! There's two main factors with a format:
//! * **Channels:** gray ("Y"), gray + alpha, RGB, RGBA, or a palette index.
//! * **Bit Depth:** how many bits per channel. Depths below 8 only exist for
//!   gray and indexed data, and those pack several pixels into each byte of a
//!   raw row (the high bits are the leftmost pixel).
//!
//! Raw rows use the packed layout. Image buffers keep sub-byte samples
//! unpacked, one sample per byte, and 16-bit channels as two big-endian bytes.

use crate::{MngPixelError, MngResult};

/// The types of color that PNG (and so MNG) supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette has RGB8 data. Transparency data, if any, holds one alpha
  /// value per palette entry.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl ColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// If the samples carry an explicit alpha channel.
  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::YA | Self::RGBA)
  }

  /// If the samples carry separate red, green, and blue channels.
  #[inline]
  #[must_use]
  pub const fn is_rgb(self) -> bool {
    matches!(self, Self::RGB | Self::RGBA)
  }

  /// If the samples carry a single gray channel.
  #[inline]
  #[must_use]
  pub const fn is_gray(self) -> bool {
    matches!(self, Self::Y | Self::YA)
  }
}
impl TryFrom<u8> for ColorType {
  type Error = MngPixelError;
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => ColorType::Y,
      2 => ColorType::RGB,
      3 => ColorType::Index,
      4 => ColorType::YA,
      6 => ColorType::RGBA,
      _ => return Err(MngPixelError::InvalidFormat { color_type: value, bit_depth: 0 }),
    })
  }
}

/// Every legal combination of color type and bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum RawFormat {
  Y1,
  Y2,
  Y4,
  Y8,
  Y16,
  RGB8,
  RGB16,
  I1,
  I2,
  I4,
  I8,
  YA8,
  YA16,
  RGBA8,
  RGBA16,
}
impl RawFormat {
  /// Looks up the format for a color type and bit depth pair.
  pub const fn new(color_type: ColorType, bit_depth: u8) -> MngResult<Self> {
    Ok(match (color_type, bit_depth) {
      (ColorType::Y, 1) => Self::Y1,
      (ColorType::Y, 2) => Self::Y2,
      (ColorType::Y, 4) => Self::Y4,
      (ColorType::Y, 8) => Self::Y8,
      (ColorType::Y, 16) => Self::Y16,
      (ColorType::RGB, 8) => Self::RGB8,
      (ColorType::RGB, 16) => Self::RGB16,
      (ColorType::Index, 1) => Self::I1,
      (ColorType::Index, 2) => Self::I2,
      (ColorType::Index, 4) => Self::I4,
      (ColorType::Index, 8) => Self::I8,
      (ColorType::YA, 8) => Self::YA8,
      (ColorType::YA, 16) => Self::YA16,
      (ColorType::RGBA, 8) => Self::RGBA8,
      (ColorType::RGBA, 16) => Self::RGBA16,
      _ => {
        return Err(MngPixelError::InvalidFormat { color_type: color_type as u8, bit_depth })
      }
    })
  }

  /// As [`RawFormat::new`], from the numeric header codes.
  pub fn from_codes(color_type: u8, bit_depth: u8) -> MngResult<Self> {
    let ct = ColorType::try_from(color_type)
      .map_err(|_| MngPixelError::InvalidFormat { color_type, bit_depth })?;
    Self::new(ct, bit_depth)
  }

  /// The color type of this format.
  #[inline]
  #[must_use]
  pub const fn color_type(self) -> ColorType {
    match self {
      Self::Y1 | Self::Y2 | Self::Y4 | Self::Y8 | Self::Y16 => ColorType::Y,
      Self::RGB8 | Self::RGB16 => ColorType::RGB,
      Self::I1 | Self::I2 | Self::I4 | Self::I8 => ColorType::Index,
      Self::YA8 | Self::YA16 => ColorType::YA,
      Self::RGBA8 | Self::RGBA16 => ColorType::RGBA,
    }
  }

  /// Bits per channel.
  #[inline]
  #[must_use]
  pub const fn bit_depth(self) -> u8 {
    match self {
      Self::Y1 | Self::I1 => 1,
      Self::Y2 | Self::I2 => 2,
      Self::Y4 | Self::I4 => 4,
      Self::Y8 | Self::I8 | Self::RGB8 | Self::YA8 | Self::RGBA8 => 8,
      Self::Y16 | Self::RGB16 | Self::YA16 | Self::RGBA16 => 16,
    }
  }

  /// If channels are 16 bits wide (which makes the canonical row 16-bit).
  #[inline]
  #[must_use]
  pub const fn is_wide(self) -> bool {
    self.bit_depth() == 16
  }

  /// Bits per pixel in a raw (packed) row.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(self) -> usize {
    (self.bit_depth() as usize) * self.color_type().channel_count()
  }

  /// Bytes needed for `samples` pixels of a raw (packed) row.
  ///
  /// When pixels are less than 8 bits it's possible to end up with a partial
  /// byte on the end, so this rounds up.
  #[inline]
  #[must_use]
  pub const fn raw_row_bytes(self, samples: usize) -> usize {
    (self.bits_per_pixel().saturating_mul(samples)).saturating_add(7) / 8
  }

  /// Bytes per pixel inside an image buffer (sub-byte samples are unpacked).
  #[inline]
  #[must_use]
  pub const fn stored_sample_size(self) -> usize {
    let channel_bytes = if self.is_wide() { 2 } else { 1 };
    channel_bytes * self.color_type().channel_count()
  }

  /// The same color type at another bit depth, if that's a legal format.
  #[inline]
  pub const fn with_bit_depth(self, bit_depth: u8) -> MngResult<Self> {
    Self::new(self.color_type(), bit_depth)
  }
}

#[test]
fn test_raw_row_bytes() {
  assert_eq!(RawFormat::Y1.raw_row_bytes(9), 2);
  assert_eq!(RawFormat::I2.raw_row_bytes(5), 2);
  assert_eq!(RawFormat::Y4.raw_row_bytes(3), 2);
  assert_eq!(RawFormat::RGB16.raw_row_bytes(2), 12);
  assert_eq!(RawFormat::RGBA8.raw_row_bytes(0), 0);
  assert_eq!(RawFormat::Y2.stored_sample_size(), 1);
  assert_eq!(RawFormat::YA16.stored_sample_size(), 4);
}

#[test]
fn test_format_codes() {
  assert_eq!(RawFormat::from_codes(3, 4), Ok(RawFormat::I4));
  assert_eq!(RawFormat::from_codes(6, 16), Ok(RawFormat::RGBA16));
  assert!(RawFormat::from_codes(2, 4).is_err());
  assert!(RawFormat::from_codes(5, 8).is_err());
  assert_eq!(RawFormat::Y4.with_bit_depth(16), Ok(RawFormat::Y16));
}
