#![forbid(unsafe_code)]

//! Persistent image buffers: the full pixel data of an image object, plus
//! the palette and transparency data that go with it.

use alloc::vec::Vec;

use bytemuck::{Pod, Zeroable};

use crate::{ColorType, MngPixelError, MngResult, RawFormat};

/// An RGB value, 8-bits per channel. This is a palette entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// Parses raw `PLTE` chunk bytes into palette entries.
///
/// Fails if the length isn't a multiple of 3, or there's more than 256
/// entries.
pub fn palette_from_bytes(data: &[u8]) -> MngResult<&[RGB8]> {
  let entries: &[RGB8] = bytemuck::try_cast_slice(data)
    .map_err(|_| MngPixelError::ContractViolation("palette length must be a multiple of 3"))?;
  if entries.len() > 256 {
    return Err(MngPixelError::ContractViolation("palette has more than 256 entries"));
  }
  Ok(entries)
}

/// Transparency data (`tRNS`), in the shape that fits the color type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Transparency {
  /// No transparency data.
  #[default]
  None,
  /// Gray samples exactly equal to this value are fully transparent.
  Y(u16),
  /// RGB samples exactly equal to this triple are fully transparent.
  RGB([u16; 3]),
  /// Alpha values for palette entries, by index. Entries beyond the end of
  /// this list are opaque.
  Alphas(Vec<u8>),
}
impl Transparency {
  /// Parses raw `tRNS` chunk bytes for an image of the given color type.
  ///
  /// Color types that carry their own alpha channel can't have transparency
  /// data.
  pub fn from_chunk(color_type: ColorType, data: &[u8]) -> MngResult<Self> {
    Ok(match (color_type, data) {
      (ColorType::Y, [y0, y1]) => Self::Y(u16::from_be_bytes([*y0, *y1])),
      (ColorType::RGB, [r0, r1, g0, g1, b0, b1]) => Self::RGB([
        u16::from_be_bytes([*r0, *r1]),
        u16::from_be_bytes([*g0, *g1]),
        u16::from_be_bytes([*b0, *b1]),
      ]),
      (ColorType::Index, alphas) if alphas.len() <= 256 => {
        let mut v = Vec::new();
        v.try_reserve_exact(alphas.len())?;
        v.extend_from_slice(alphas);
        Self::Alphas(v)
      }
      _ => return Err(MngPixelError::ContractViolation("tRNS data doesn't fit the color type")),
    })
  }

  /// The transparent gray value, if any.
  #[inline]
  #[must_use]
  pub fn gray(&self) -> Option<u16> {
    match self {
      Self::Y(y) => Some(*y),
      _ => None,
    }
  }

  /// The transparent RGB triple, if any.
  #[inline]
  #[must_use]
  pub fn rgb(&self) -> Option<[u16; 3]> {
    match self {
      Self::RGB(rgb) => Some(*rgb),
      _ => None,
    }
  }

  /// The per-index alpha values (empty if this isn't palette transparency).
  #[inline]
  #[must_use]
  pub fn alphas(&self) -> &[u8] {
    match self {
      Self::Alphas(a) => a,
      _ => &[],
    }
  }

  /// If there's any transparency data at all.
  #[inline]
  #[must_use]
  pub fn is_some(&self) -> bool {
    !matches!(self, Self::None)
  }
}

/// The full pixel data of one image object, in its native format.
///
/// Samples are stored one per byte for depths of 8 or less (so 1, 2, and 4 bit
/// samples are unpacked), and 16-bit channels are stored as big-endian byte
/// pairs. Rows are `width * format.stored_sample_size()` bytes, with no
/// padding between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
  width: u32,
  height: u32,
  format: RawFormat,
  row_size: usize,
  data: Vec<u8>,
  /// Palette entries (indexed color only).
  pub palette: Vec<RGB8>,
  /// Transparency data.
  pub transparency: Transparency,
  /// If the object should be displayed.
  pub is_viewable: bool,
}
impl ImageBuffer {
  /// Allocates a zeroed buffer.
  pub fn try_new(width: u32, height: u32, format: RawFormat) -> MngResult<Self> {
    if width == 0 || height == 0 {
      return Err(MngPixelError::WidthOrHeightZero);
    }
    let row_size = usize::try_from(width)?
      .checked_mul(format.stored_sample_size())
      .ok_or(MngPixelError::DimensionsTooLarge)?;
    let total =
      row_size.checked_mul(usize::try_from(height)?).ok_or(MngPixelError::DimensionsTooLarge)?;
    let mut data = Vec::new();
    data.try_reserve_exact(total)?;
    data.resize(total, 0);
    Ok(Self {
      width,
      height,
      format,
      row_size,
      data,
      palette: Vec::new(),
      transparency: Transparency::None,
      is_viewable: true,
    })
  }

  /// Makes a metadata-only buffer (no pixel storage).
  ///
  /// This is how an "object zero" image is described when rows are only
  /// being displayed on the fly rather than stored.
  #[must_use]
  pub fn metadata_only(width: u32, height: u32, format: RawFormat) -> Self {
    Self {
      width,
      height,
      format,
      row_size: 0,
      data: Vec::new(),
      palette: Vec::new(),
      transparency: Transparency::None,
      is_viewable: true,
    }
  }

  /// Sets the palette from raw `PLTE` bytes.
  pub fn set_palette_bytes(&mut self, data: &[u8]) -> MngResult<()> {
    let entries = palette_from_bytes(data)?;
    self.palette.clear();
    self.palette.try_reserve_exact(entries.len())?;
    self.palette.extend_from_slice(entries);
    Ok(())
  }

  /// Sets the transparency from raw `tRNS` bytes.
  pub fn set_transparency_bytes(&mut self, data: &[u8]) -> MngResult<()> {
    self.transparency = Transparency::from_chunk(self.format.color_type(), data)?;
    Ok(())
  }

  /// Width in pixels.
  #[inline]
  #[must_use]
  pub fn width(&self) -> u32 {
    self.width
  }

  /// Height in pixels.
  #[inline]
  #[must_use]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// The native format of the stored samples.
  #[inline]
  #[must_use]
  pub fn format(&self) -> RawFormat {
    self.format
  }

  /// Bytes per stored row.
  #[inline]
  #[must_use]
  pub fn row_size(&self) -> usize {
    self.row_size
  }

  /// If pixel storage exists (it doesn't for [`metadata_only`](Self::metadata_only)
  /// buffers).
  #[inline]
  #[must_use]
  pub fn has_pixels(&self) -> bool {
    !self.data.is_empty()
  }

  /// All of the stored bytes.
  #[inline]
  #[must_use]
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// All of the stored bytes, mutably.
  #[inline]
  #[must_use]
  pub fn data_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }

  /// The stored bytes of row `y`.
  ///
  /// Buffers without pixel storage have no rows at all.
  #[inline]
  pub fn row(&self, y: u32) -> MngResult<&[u8]> {
    if !self.has_pixels() {
      return Err(MngPixelError::RowOutOfBounds);
    }
    let start = (y as usize).checked_mul(self.row_size).ok_or(MngPixelError::RowOutOfBounds)?;
    self.data.get(start..start + self.row_size).ok_or(MngPixelError::RowOutOfBounds)
  }

  /// The stored bytes of row `y`, mutably.
  #[inline]
  pub fn row_mut(&mut self, y: u32) -> MngResult<&mut [u8]> {
    if !self.has_pixels() {
      return Err(MngPixelError::RowOutOfBounds);
    }
    let start = (y as usize).checked_mul(self.row_size).ok_or(MngPixelError::RowOutOfBounds)?;
    let row_size = self.row_size;
    self.data.get_mut(start..start + row_size).ok_or(MngPixelError::RowOutOfBounds)
  }
}

#[test]
fn test_palette_from_bytes() {
  let pal = palette_from_bytes(&[1, 2, 3, 4, 5, 6]).unwrap();
  assert_eq!(pal, &[RGB8 { r: 1, g: 2, b: 3 }, RGB8 { r: 4, g: 5, b: 6 }]);
  assert!(palette_from_bytes(&[1, 2]).is_err());
}

#[test]
fn test_transparency_from_chunk() {
  assert_eq!(Transparency::from_chunk(ColorType::Y, &[0, 7]), Ok(Transparency::Y(7)));
  assert_eq!(
    Transparency::from_chunk(ColorType::RGB, &[0, 1, 0, 2, 1, 0]),
    Ok(Transparency::RGB([1, 2, 256]))
  );
  assert_eq!(
    Transparency::from_chunk(ColorType::Index, &[9, 8]).unwrap().alphas(),
    &[9, 8]
  );
  assert!(Transparency::from_chunk(ColorType::RGBA, &[0, 0]).is_err());
}

#[test]
fn test_buffer_rows() {
  let mut buf = ImageBuffer::try_new(3, 2, RawFormat::RGB16).unwrap();
  assert_eq!(buf.row_size(), 18);
  buf.row_mut(1).unwrap()[0] = 9;
  assert_eq!(buf.data()[18], 9);
  assert!(buf.row(2).is_err());
  assert_eq!(ImageBuffer::try_new(0, 2, RawFormat::Y8), Err(MngPixelError::WidthOrHeightZero));
}

#[test]
fn test_metadata_only_buffer_has_no_rows() {
  let mut buf = ImageBuffer::metadata_only(2, 1, RawFormat::Y8);
  assert!(!buf.has_pixels());
  assert_eq!(buf.row(0), Err(MngPixelError::RowOutOfBounds));
  assert_eq!(buf.row_mut(0), Err(MngPixelError::RowOutOfBounds));
}
