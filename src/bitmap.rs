#![forbid(unsafe_code)]

//! Owned RGBA snapshots of stored images.

use alloc::vec::Vec;

use pixel_formats::r8g8b8a8_Srgb;

use crate::{retrieve_row, CanonicalRow, ImageBuffer, MngResult};

/// An owned direct-color image.
///
/// The fields are public, but if you put them together weirdly the methods of
/// this type might return `None` when you didn't expect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct Bitmap<P = r8g8b8a8_Srgb> {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<P>,
}
impl<P> Bitmap<P> {
  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&P> {
    if x < self.width && y < self.height {
      self.pixels.get(y as usize * self.width as usize + x as usize)
    } else {
      None
    }
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut P> {
    if x < self.width && y < self.height {
      self.pixels.get_mut(y as usize * self.width as usize + x as usize)
    } else {
      None
    }
  }
}

impl ImageBuffer {
  /// Snapshots the buffer as RGBA8 pixels.
  ///
  /// Rows are read back with [`retrieve_row`], so palette and transparency
  /// data apply. 16-bit channels keep their high byte.
  pub fn to_bitmap(&self) -> MngResult<Bitmap> {
    let width = self.width() as usize;
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(width.saturating_mul(self.height() as usize))?;
    let mut row = CanonicalRow::try_with_capacity(width, self.format().is_wide())?;
    for y in 0..self.height() {
      retrieve_row(self, y, &mut row)?;
      let rgba = (0..width).filter_map(|x| row.get_rgba8(x));
      pixels.extend(rgba.map(|[r, g, b, a]| r8g8b8a8_Srgb { r, g, b, a }));
    }
    Ok(Bitmap { width: self.width(), height: self.height(), pixels })
  }
}

#[test]
fn test_to_bitmap() {
  let mut buf = ImageBuffer::try_new(2, 2, crate::RawFormat::YA16).unwrap();
  buf
    .data_mut()
    .copy_from_slice(&[0x80, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0x12, 0x34, 0x56, 0x78, 1, 1, 1, 1]);
  let bitmap = buf.to_bitmap().unwrap();
  assert_eq!(bitmap.pixels.len(), 4);
  assert_eq!(bitmap.get(0, 0), Some(&r8g8b8a8_Srgb { r: 0x80, g: 0x80, b: 0x80, a: 0xFF }));
  assert_eq!(bitmap.get(0, 1), Some(&r8g8b8a8_Srgb { r: 0x12, g: 0x12, b: 0x12, a: 0x56 }));
  assert_eq!(bitmap.get(2, 0), None);
}
