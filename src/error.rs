#![forbid(unsafe_code)]

//! The crate error type.

use core::fmt;

/// An error from the `mngpix` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MngPixelError {
  /// An indexed sample referenced a palette entry that doesn't exist.
  ///
  /// This is fatal for the row. The caller decides if the rest of the image
  /// (or the rest of the stream) should still be processed.
  PaletteIndex {
    /// The sample value that was read.
    index: u8,
    /// How many entries the palette actually has.
    palette_len: usize,
  },

  /// The allocator couldn't give us enough space.
  Alloc,

  /// A delta kind, promotion, or row was combined with an image buffer whose
  /// representation can't accept it.
  ContractViolation(&'static str),

  /// The color type and bit depth combination isn't a legal PNG format.
  InvalidFormat {
    /// color type code
    color_type: u8,
    /// bits per channel
    bit_depth: u8,
  },

  /// The canvas code isn't one of the supported canvas styles.
  UnsupportedCanvas(u32),

  /// A row or canvas line was requested that doesn't exist, or a supplied row
  /// is shorter than its format requires.
  RowOutOfBounds,

  /// The declared width and/or height of this image is 0.
  WidthOrHeightZero,

  /// The image is too large to address.
  DimensionsTooLarge,
}

/// Shorthand for results with a [`MngPixelError`].
pub type MngResult<T> = Result<T, MngPixelError>;

impl From<alloc::collections::TryReserveError> for MngPixelError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
impl From<core::num::TryFromIntError> for MngPixelError {
  #[inline]
  fn from(_: core::num::TryFromIntError) -> Self {
    Self::DimensionsTooLarge
  }
}

impl fmt::Display for MngPixelError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PaletteIndex { index, palette_len } => {
        write!(f, "palette index {index} out of range (palette has {palette_len} entries)")
      }
      Self::Alloc => f.write_str("allocation failed"),
      Self::ContractViolation(what) => write!(f, "contract violation: {what}"),
      Self::InvalidFormat { color_type, bit_depth } => {
        write!(f, "invalid format: color type {color_type} at bit depth {bit_depth}")
      }
      Self::UnsupportedCanvas(code) => write!(f, "unsupported canvas style 0x{code:08X}"),
      Self::RowOutOfBounds => f.write_str("row out of bounds"),
      Self::WidthOrHeightZero => f.write_str("width or height is zero"),
      Self::DimensionsTooLarge => f.write_str("image dimensions too large"),
    }
  }
}

impl core::error::Error for MngPixelError {}
