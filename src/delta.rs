#![forbid(unsafe_code)]

//! Delta images: changes applied onto an existing image buffer.
//!
//! A delta image is sent as ordinary rows, and the [`DeltaKind`] says what to
//! do with them:
//! * **Pixel** deltas work on whole native pixels. They need rows in exactly
//!   the target's format, so a delta sent at another bit depth goes through
//!   [`scale_row`] first. See [`apply_delta_pixels`].
//! * **Color** and **alpha** deltas only touch some channels, and they work
//!   from the canonical form of the delta row. See [`apply_delta_canonical`].
//!
//! "Add" deltas wrap around at the channel's bit depth. They never saturate.
//!
//! Rows are placed with their top left at the block origin. Any part that
//! falls outside the target is clipped.

use alloc::vec::Vec;

use crate::{
  packed_sample, put_raw_channel, put_stored_channel, raw_channel, scale_sample, stored_channel,
  CanonicalRow, ColorType, FillMethod, ImageBuffer, MngPixelError, MngResult, RawFormat, RowPixels,
  RowPosition,
};

/// What a delta image does to its target.
///
/// The discriminants are the delta type codes of the `DHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeltaKind {
  /// Replaces the whole image.
  Replace = 0,
  /// Adds to every channel of a block of pixels.
  PixelAdd = 1,
  /// Adds to the alpha channel of a block.
  AlphaAdd = 2,
  /// Adds to the color channels of a block.
  ColorAdd = 3,
  /// Replaces a block of pixels.
  PixelReplace = 4,
  /// Replaces the alpha channel of a block.
  AlphaReplace = 5,
  /// Replaces the color channels of a block.
  ColorReplace = 6,
  /// Changes nothing (the delta only carries ancillary data).
  NoChange = 7,
}
impl TryFrom<u8> for DeltaKind {
  type Error = MngPixelError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::Replace,
      1 => Self::PixelAdd,
      2 => Self::AlphaAdd,
      3 => Self::ColorAdd,
      4 => Self::PixelReplace,
      5 => Self::AlphaReplace,
      6 => Self::ColorReplace,
      7 => Self::NoChange,
      _ => return Err(MngPixelError::ContractViolation("unknown delta type")),
    })
  }
}
impl DeltaKind {
  /// If this kind adds rather than replaces.
  #[inline]
  #[must_use]
  pub const fn is_add(self) -> bool {
    matches!(self, Self::PixelAdd | Self::AlphaAdd | Self::ColorAdd)
  }

  /// If this kind works on whole native pixels.
  #[inline]
  #[must_use]
  pub const fn is_pixel(self) -> bool {
    matches!(self, Self::Replace | Self::PixelAdd | Self::PixelReplace)
  }

  /// If this kind works on the color channels only.
  #[inline]
  #[must_use]
  pub const fn is_color(self) -> bool {
    matches!(self, Self::ColorAdd | Self::ColorReplace)
  }

  /// If this kind works on the alpha channel only.
  #[inline]
  #[must_use]
  pub const fn is_alpha(self) -> bool {
    matches!(self, Self::AlphaAdd | Self::AlphaReplace)
  }
}

/// One delta image: its kind, and where its block goes in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeltaDescriptor {
  /// What to do.
  pub kind: DeltaKind,
  /// Target column of the block's left edge.
  pub block_x: u32,
  /// Target row of the block's top edge.
  pub block_y: u32,
}
impl DeltaDescriptor {
  /// A whole image replacement.
  #[inline]
  #[must_use]
  pub const fn replace() -> Self {
    Self { kind: DeltaKind::Replace, block_x: 0, block_y: 0 }
  }
}

/// Checks that a delta in `delta` format can be applied to a `target` format
/// buffer.
///
/// * Pixel deltas need the same color type (and, for indexed color, the same
///   bit depth). Other bit depth differences are fixed up by [`scale_row`].
///   A whole image replacement can change the format entirely.
/// * Color deltas need gray onto gray, or RGB onto RGB (alpha or not). They
///   can't target indexed color.
/// * Alpha deltas need a target with an alpha channel, and a delta carrying
///   gray (used as alpha) or its own alpha.
pub fn check_delta_target(kind: DeltaKind, delta: RawFormat, target: RawFormat) -> MngResult<()> {
  let (dct, tct) = (delta.color_type(), target.color_type());
  let ok = match kind {
    DeltaKind::NoChange | DeltaKind::Replace => true,
    DeltaKind::PixelAdd | DeltaKind::PixelReplace => {
      dct == tct && (tct != ColorType::Index || delta.bit_depth() == target.bit_depth())
    }
    DeltaKind::ColorAdd | DeltaKind::ColorReplace => {
      (dct.is_gray() && tct.is_gray()) || (dct.is_rgb() && tct.is_rgb())
    }
    DeltaKind::AlphaAdd | DeltaKind::AlphaReplace => {
      tct.has_alpha() && matches!(dct, ColorType::Y | ColorType::YA | ColorType::RGBA)
    }
  };
  if ok {
    Ok(())
  } else {
    Err(MngPixelError::ContractViolation("delta type doesn't fit the target image"))
  }
}

/// Converts a raw row to another bit depth of the same color type.
///
/// Increases use left bit replication, decreases keep the high bits. The new
/// raw row goes into `out` and its format is returned.
///
/// Indexed rows can't change depth.
pub fn scale_row(
  raw: &[u8], samples: usize, from: RawFormat, to_bits: u8, out: &mut Vec<u8>,
) -> MngResult<RawFormat> {
  let to = from.with_bit_depth(to_bits)?;
  if from.color_type() == ColorType::Index && from != to {
    return Err(MngPixelError::ContractViolation("indexed rows can't change depth"));
  }
  if raw.len() < from.raw_row_bytes(samples) {
    return Err(MngPixelError::RowOutOfBounds);
  }
  let n = to.raw_row_bytes(samples);
  out.clear();
  out.try_reserve(n)?;
  out.resize(n, 0);
  let from_bits = from.bit_depth();
  let channel_samples = samples * from.color_type().channel_count();
  for i in 0..channel_samples {
    let v = raw_channel(raw, from_bits, i);
    let scaled = scale_sample(v, from_bits, to_bits, FillMethod::LeftBitReplicate);
    put_raw_channel(out, to_bits, i, scaled);
  }
  Ok(to)
}

/// Target columns for a delta row, stopping at the right edge.
#[inline]
fn target_columns(
  pos: RowPosition, block_x: u32, samples: usize, width: u32,
) -> impl Iterator<Item = usize> {
  let start = (block_x as usize).saturating_add(pos.col as usize);
  (start..width as usize).step_by(pos.col_inc.max(1) as usize).take(samples)
}

/// Applies a pixel delta row (replace or add) to the target.
///
/// `raw` holds `samples` pixels in the target's exact format. `pos` is the
/// row's position within the delta image, which is offset by the block
/// origin.
///
/// ## Failure
/// * [`MngPixelError::ContractViolation`] if `kind` isn't a pixel kind, or the
///   formats don't match.
/// * [`MngPixelError::RowOutOfBounds`] if `raw` is too short.
#[allow(clippy::too_many_arguments)]
pub fn apply_delta_pixels(
  kind: DeltaKind, raw: &[u8], samples: usize, delta_format: RawFormat, target: &mut ImageBuffer,
  pos: RowPosition, block_x: u32, block_y: u32,
) -> MngResult<()> {
  if kind == DeltaKind::NoChange {
    return Ok(());
  }
  if !kind.is_pixel() {
    return Err(MngPixelError::ContractViolation("not a pixel delta"));
  }
  let format = target.format();
  if delta_format != format {
    return Err(MngPixelError::ContractViolation("pixel delta format must match the target"));
  }
  if raw.len() < format.raw_row_bytes(samples) {
    return Err(MngPixelError::RowOutOfBounds);
  }
  let y = match pos.row.checked_add(block_y) {
    Some(y) if y < target.height() => y,
    _ => return Ok(()),
  };
  let add = kind.is_add();
  let bits = format.bit_depth();
  let mask = ((1_u32 << bits) - 1) as u16;
  let sample_size = format.stored_sample_size();
  let channels = format.color_type().channel_count();
  let columns = target_columns(pos, block_x, samples, target.width());
  let row = target.row_mut(y)?;
  if bits < 8 {
    for (i, x) in columns.enumerate() {
      let v = packed_sample(raw, bits, i);
      row[x] = if add { row[x].wrapping_add(v) & (mask as u8) } else { v };
    }
  } else {
    for (src, x) in raw.chunks_exact(sample_size).zip(columns) {
      let dst = &mut row[x * sample_size..(x + 1) * sample_size];
      if add {
        for c in 0..channels {
          let sum = stored_channel(dst, bits, c).wrapping_add(stored_channel(src, bits, c));
          put_stored_channel(dst, bits, c, sum & mask);
        }
      } else {
        dst.copy_from_slice(src);
      }
    }
  }
  Ok(())
}

/// Applies a color or alpha delta row (replace or add) to the target.
///
/// The delta row is given in canonical form. Values are scaled from the
/// canonical channel width to the target's bit depth before they're used.
///
/// * Color deltas onto gray targets use the red channel.
/// * Alpha deltas take alpha from the delta's alpha channel when
///   `delta_has_alpha` is set, and from its gray (red) channel otherwise.
pub fn apply_delta_canonical(
  kind: DeltaKind, row: &CanonicalRow, delta_has_alpha: bool, target: &mut ImageBuffer,
  pos: RowPosition, block_x: u32, block_y: u32,
) -> MngResult<()> {
  if kind == DeltaKind::NoChange {
    return Ok(());
  }
  let format = target.format();
  let ct = format.color_type();
  let channels: &[usize] = if kind.is_color() {
    match ct {
      ColorType::Y | ColorType::YA => &[0],
      ColorType::RGB | ColorType::RGBA => &[0, 1, 2],
      ColorType::Index => {
        return Err(MngPixelError::ContractViolation("color delta onto indexed color"))
      }
    }
  } else if kind.is_alpha() {
    match ct {
      ColorType::YA => &[1],
      ColorType::RGBA => &[3],
      _ => return Err(MngPixelError::ContractViolation("alpha delta onto an image without alpha")),
    }
  } else {
    return Err(MngPixelError::ContractViolation("not a color or alpha delta"));
  };
  let y = match pos.row.checked_add(block_y) {
    Some(y) if y < target.height() => y,
    _ => return Ok(()),
  };
  let add = kind.is_add();
  let bits = format.bit_depth();
  let canon_bits = if row.is_wide() { 16 } else { 8 };
  let mask = ((1_u32 << bits) - 1) as u16;
  let sample_size = format.stored_sample_size();
  let columns = target_columns(pos, block_x, row.len(), target.width());
  let dst_row = target.row_mut(y)?;
  for (i, x) in columns.enumerate() {
    let Some(px) = wide_pixel(row, i) else { break };
    let dst = &mut dst_row[x * sample_size..(x + 1) * sample_size];
    for (k, &c) in channels.iter().enumerate() {
      let src = if kind.is_alpha() {
        if delta_has_alpha {
          px[3]
        } else {
          px[0]
        }
      } else {
        px[k]
      };
      let v = scale_sample(src, canon_bits, bits, FillMethod::LeftBitReplicate);
      let out = if add { stored_channel(dst, bits, c).wrapping_add(v) & mask } else { v };
      put_stored_channel(dst, bits, c, out);
    }
  }
  Ok(())
}

#[inline]
fn wide_pixel(row: &CanonicalRow, i: usize) -> Option<[u16; 4]> {
  match row.pixels() {
    RowPixels::Rgba8(v) => v.get(i).map(|p| p.map(u16::from)),
    RowPixels::Rgba16(v) => v.get(i).copied(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloc::vec;

  fn at(row: u32) -> RowPosition {
    RowPosition { row, col: 0, col_inc: 1 }
  }

  #[test]
  fn test_kind_codes() {
    for code in 0..=7_u8 {
      assert_eq!(DeltaKind::try_from(code).unwrap() as u8, code);
    }
    assert!(DeltaKind::try_from(8).is_err());
  }

  #[test]
  fn test_pixel_add_wraps() {
    let mut target = ImageBuffer::try_new(1, 1, RawFormat::Y8).unwrap();
    target.data_mut()[0] = 200;
    apply_delta_pixels(DeltaKind::PixelAdd, &[100], 1, RawFormat::Y8, &mut target, at(0), 0, 0)
      .unwrap();
    assert_eq!(target.data(), &[44]);
  }

  #[test]
  fn test_sub_byte_add_wraps_at_depth() {
    let mut target = ImageBuffer::try_new(4, 1, RawFormat::Y1).unwrap();
    target.data_mut().copy_from_slice(&[0, 1, 0, 1]);
    let delta = [0b0011_0000];
    apply_delta_pixels(DeltaKind::PixelAdd, &delta, 4, RawFormat::Y1, &mut target, at(0), 0, 0)
      .unwrap();
    assert_eq!(target.data(), &[0, 1, 1, 0]);
  }

  #[test]
  fn test_sixteen_bit_add_wraps() {
    let mut target = ImageBuffer::try_new(1, 1, RawFormat::YA16).unwrap();
    target.data_mut().copy_from_slice(&[0xFF, 0xF0, 0x00, 0x01]);
    let delta = [0x00, 0x20, 0x00, 0x02];
    apply_delta_pixels(DeltaKind::PixelAdd, &delta, 1, RawFormat::YA16, &mut target, at(0), 0, 0)
      .unwrap();
    assert_eq!(target.data(), &[0x00, 0x10, 0x00, 0x03]);
  }

  #[test]
  fn test_whole_replace_is_verbatim() {
    let mut target = ImageBuffer::try_new(3, 2, RawFormat::Y8).unwrap();
    target.data_mut().fill(0x55);
    let rows = [[1_u8, 2, 3], [4, 5, 6]];
    for (y, r) in rows.iter().enumerate() {
      apply_delta_pixels(DeltaKind::Replace, r, 3, RawFormat::Y8, &mut target, at(y as u32), 0, 0)
        .unwrap();
    }
    assert_eq!(target.data(), &[1, 2, 3, 4, 5, 6]);
  }

  #[test]
  fn test_block_is_clipped() {
    let mut target = ImageBuffer::try_new(3, 2, RawFormat::Y8).unwrap();
    let d = DeltaKind::PixelReplace;
    apply_delta_pixels(d, &[7, 8], 2, RawFormat::Y8, &mut target, at(0), 2, 1).unwrap();
    apply_delta_pixels(d, &[9, 9], 2, RawFormat::Y8, &mut target, at(1), 2, 1).unwrap();
    assert_eq!(target.data(), &[0, 0, 0, 0, 0, 7]);
  }

  #[test]
  fn test_pixel_delta_needs_matching_format() {
    let mut target = ImageBuffer::try_new(1, 1, RawFormat::Y8).unwrap();
    let err =
      apply_delta_pixels(DeltaKind::PixelAdd, &[0, 0], 1, RawFormat::Y16, &mut target, at(0), 0, 0);
    assert!(matches!(err, Err(MngPixelError::ContractViolation(_))));
  }

  #[test]
  fn test_check_delta_target() {
    use RawFormat::*;
    assert!(check_delta_target(DeltaKind::PixelAdd, Y4, Y8).is_ok());
    assert!(check_delta_target(DeltaKind::PixelAdd, I4, I8).is_err());
    assert!(check_delta_target(DeltaKind::PixelReplace, RGB8, RGBA8).is_err());
    assert!(check_delta_target(DeltaKind::ColorReplace, RGB8, RGBA16).is_ok());
    assert!(check_delta_target(DeltaKind::ColorAdd, Y8, RGB8).is_err());
    assert!(check_delta_target(DeltaKind::AlphaReplace, Y8, RGBA8).is_ok());
    assert!(check_delta_target(DeltaKind::AlphaReplace, RGB8, RGBA8).is_err());
    assert!(check_delta_target(DeltaKind::AlphaAdd, YA8, RGB8).is_err());
    assert!(check_delta_target(DeltaKind::Replace, I1, RGBA16).is_ok());
    assert!(check_delta_target(DeltaKind::NoChange, I1, RGBA16).is_ok());
  }

  #[test]
  fn test_scale_row() {
    let mut out = Vec::new();
    assert_eq!(scale_row(&[0b1011_0000], 4, RawFormat::Y1, 8, &mut out), Ok(RawFormat::Y8));
    assert_eq!(out, [255, 0, 255, 255]);
    let scaled = scale_row(&[0x80, 0xFF, 0x12, 0x34], 2, RawFormat::Y16, 8, &mut out);
    assert_eq!(scaled, Ok(RawFormat::Y8));
    assert_eq!(out, [0x80, 0x12]);
    let scaled = scale_row(&[0xAB, 0x01, 0x02], 1, RawFormat::RGB8, 16, &mut out);
    assert_eq!(scaled, Ok(RawFormat::RGB16));
    assert_eq!(out, [0xAB, 0xAB, 0x01, 0x01, 0x02, 0x02]);
    assert!(scale_row(&[0], 1, RawFormat::I4, 8, &mut out).is_err());
  }

  #[test]
  fn test_color_replace_keeps_alpha() {
    let mut target = ImageBuffer::try_new(2, 1, RawFormat::RGBA8).unwrap();
    target.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let row = CanonicalRow::from_rgba8(vec![[10, 20, 30, 255], [40, 50, 60, 0]]);
    apply_delta_canonical(DeltaKind::ColorReplace, &row, false, &mut target, at(0), 0, 0).unwrap();
    assert_eq!(target.data(), &[10, 20, 30, 4, 40, 50, 60, 8]);
  }

  #[test]
  fn test_alpha_add_from_gray_delta() {
    let mut target = ImageBuffer::try_new(1, 1, RawFormat::YA8).unwrap();
    target.data_mut().copy_from_slice(&[9, 200]);
    let row = CanonicalRow::from_rgba8(vec![[100, 100, 100, 255]]);
    apply_delta_canonical(DeltaKind::AlphaAdd, &row, false, &mut target, at(0), 0, 0).unwrap();
    assert_eq!(target.data(), &[9, 44]);
  }

  #[test]
  fn test_color_delta_onto_sixteen_bit_gray() {
    let mut target = ImageBuffer::try_new(1, 1, RawFormat::Y16).unwrap();
    let row = CanonicalRow::from_rgba8(vec![[0xAB, 0xAB, 0xAB, 255]]);
    apply_delta_canonical(DeltaKind::ColorReplace, &row, false, &mut target, at(0), 0, 0).unwrap();
    assert_eq!(target.data(), &[0xAB, 0xAB]);
    let err = apply_delta_canonical(DeltaKind::AlphaReplace, &row, false, &mut target, at(0), 0, 0);
    assert!(err.is_err());
  }
}
