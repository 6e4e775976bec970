#![forbid(unsafe_code)]

//! Promoting an image buffer to another color type and/or bit depth.
//!
//! Supported promotions (plus any bit depth change within one color type,
//! other than for indexed color):
//!
//! | from  | to                          |
//! |-------|-----------------------------|
//! | Y     | Y, YA, RGB, RGBA            |
//! | YA    | YA, RGBA                    |
//! | RGB   | RGB, RGBA                   |
//! | Index | RGB, RGBA                   |
//! | RGBA  | RGBA                        |
//!
//! Missing channels get synthesized: gray gets copied into all of R, G, and B,
//! indexed pixels are looked up in the palette, and alpha is opaque unless
//! the pixel exactly matches the transparency data.

use alloc::vec::Vec;

use crate::{
  put_stored_channel, scale_sample, stored_channel, ColorType, FillMethod, ImageBuffer,
  MngPixelError, MngResult, RawFormat, Transparency, RGB8,
};

/// If a promotion from one color type to another is supported.
#[inline]
#[must_use]
pub const fn promotion_is_supported(from: RawFormat, to: RawFormat) -> bool {
  use ColorType::*;
  match (from.color_type(), to.color_type()) {
    (Index, Index) => from.bit_depth() == to.bit_depth(),
    (Y, Y | YA | RGB | RGBA) | (YA, YA | RGBA) | (RGB, RGB | RGBA) | (Index, RGB | RGBA) => true,
    (RGBA, RGBA) => true,
    _ => false,
  }
}

/// Makes a new buffer holding `src` promoted to the `to` format.
///
/// * Palette entries are scaled from 8 bits to the new depth.
/// * The palette is dropped unless the result is still indexed.
/// * Transparency data is dropped when alpha was synthesized from it, and
///   is rescaled to the new depth otherwise.
///
/// ## Failure
/// * [`MngPixelError::ContractViolation`] for unsupported promotions.
/// * [`MngPixelError::PaletteIndex`] if an indexed pixel is past the end of
///   the palette.
pub fn promote(src: &ImageBuffer, to: RawFormat, fill: FillMethod) -> MngResult<ImageBuffer> {
  let from = src.format();
  if !promotion_is_supported(from, to) {
    return Err(MngPixelError::ContractViolation("unsupported promotion"));
  }
  log::debug!("promoting {}x{} image from {from:?} to {to:?}", src.width(), src.height());
  let mut out = ImageBuffer::try_new(src.width(), src.height(), to)?;
  out.is_viewable = src.is_viewable;
  if to.color_type() == ColorType::Index {
    out.palette.try_reserve_exact(src.palette.len())?;
    out.palette.extend_from_slice(&src.palette);
  }
  out.transparency = promoted_transparency(src, to, fill)?;
  if !src.has_pixels() {
    return Ok(out);
  }
  let from_bits = from.bit_depth();
  // indexed samples are looked up as 8-bit palette colors
  let color_bits = if from.color_type() == ColorType::Index { 8 } else { from_bits };
  let to_bits = to.bit_depth();
  let to_max = ((1_u32 << to_bits) - 1) as u16;
  let scale = |v: u16, bits: u8| scale_sample(v, bits, to_bits, fill);
  let (src_size, dst_size) = (from.stored_sample_size(), to.stored_sample_size());
  let trns_y = src.transparency.gray();
  let trns_rgb = src.transparency.rgb();
  let alphas = src.transparency.alphas();
  let pixels = src.data().chunks_exact(src_size).zip(out.data_mut().chunks_exact_mut(dst_size));
  for (src_px, dst_px) in pixels {
    let ch = |c: usize| stored_channel(src_px, from_bits, c);
    // source pixel as [r, g, b, a], with alpha already at the target depth
    let [r, g, b, a] = match from.color_type() {
      ColorType::Y => {
        let y = ch(0);
        let a = if trns_y == Some(y) { 0 } else { to_max };
        let y = scale(y, color_bits);
        [y, y, y, a]
      }
      ColorType::YA => {
        let y = scale(ch(0), color_bits);
        [y, y, y, scale(ch(1), from_bits)]
      }
      ColorType::RGB => {
        let rgb = [ch(0), ch(1), ch(2)];
        let a = if trns_rgb == Some(rgb) { 0 } else { to_max };
        [scale(rgb[0], color_bits), scale(rgb[1], color_bits), scale(rgb[2], color_bits), a]
      }
      ColorType::RGBA => {
        [
          scale(ch(0), color_bits),
          scale(ch(1), color_bits),
          scale(ch(2), color_bits),
          scale(ch(3), from_bits),
        ]
      }
      ColorType::Index => {
        let index = ch(0) as u8;
        if to.color_type() == ColorType::Index {
          dst_px[0] = index;
          continue;
        }
        let i = usize::from(index);
        let RGB8 { r, g, b } = *src
          .palette
          .get(i)
          .ok_or(MngPixelError::PaletteIndex { index, palette_len: src.palette.len() })?;
        let a = alphas.get(i).map_or(to_max, |a| scale(u16::from(*a), 8));
        [scale(u16::from(r), 8), scale(u16::from(g), 8), scale(u16::from(b), 8), a]
      }
    };
    let channels: &[u16] = match to.color_type() {
      ColorType::Y | ColorType::Index => &[r],
      ColorType::YA => &[r, a],
      ColorType::RGB => &[r, g, b],
      ColorType::RGBA => &[r, g, b, a],
    };
    for (c, v) in channels.iter().enumerate() {
      put_stored_channel(dst_px, to_bits, c, *v);
    }
  }
  Ok(out)
}

/// Promotes a buffer in place, see [`promote`].
pub fn promote_in_place(
  buffer: &mut ImageBuffer, to: RawFormat, fill: FillMethod,
) -> MngResult<()> {
  if buffer.format() == to {
    return Ok(());
  }
  *buffer = promote(buffer, to, fill)?;
  Ok(())
}

fn promoted_transparency(
  src: &ImageBuffer, to: RawFormat, fill: FillMethod,
) -> MngResult<Transparency> {
  let (from_bits, to_bits) = (src.format().bit_depth(), to.bit_depth());
  let scale = |v: u16| scale_sample(v, from_bits, to_bits, fill);
  Ok(match (&src.transparency, to.color_type()) {
    (_, ColorType::YA | ColorType::RGBA) => Transparency::None,
    (Transparency::Y(y), ColorType::Y) => Transparency::Y(scale(*y)),
    (Transparency::Y(y), ColorType::RGB) => {
      let s = scale(*y);
      Transparency::RGB([s, s, s])
    }
    (Transparency::RGB(rgb), ColorType::RGB) => Transparency::RGB(rgb.map(scale)),
    (Transparency::Alphas(a), ColorType::Index) => {
      let mut v = Vec::new();
      v.try_reserve_exact(a.len())?;
      v.extend_from_slice(a);
      Transparency::Alphas(v)
    }
    _ => Transparency::None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::retrieve_row;
  use crate::CanonicalRow;

  #[test]
  fn test_gray_to_gray_alpha_uses_transparency() {
    let mut src = ImageBuffer::try_new(3, 1, RawFormat::Y8).unwrap();
    src.data_mut().copy_from_slice(&[7, 8, 9]);
    src.transparency = Transparency::Y(8);
    let out = promote(&src, RawFormat::YA8, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(out.data(), &[7, 255, 8, 0, 9, 255]);
    assert_eq!(out.transparency, Transparency::None);
  }

  #[test]
  fn test_gray_depth_increase() {
    let mut src = ImageBuffer::try_new(2, 1, RawFormat::Y4).unwrap();
    src.data_mut().copy_from_slice(&[0xA, 0x3]);
    let out = promote(&src, RawFormat::Y8, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(out.data(), &[0xAA, 0x33]);
    let out = promote(&src, RawFormat::Y8, FillMethod::ZeroFill).unwrap();
    assert_eq!(out.data(), &[0xA0, 0x30]);
    let out = promote(&src, RawFormat::RGB16, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(
      out.data(),
      &[0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x33, 0x33, 0x33, 0x33, 0x33, 0x33]
    );
  }

  #[test]
  fn test_sixteen_to_eight_keeps_high_byte() {
    let mut src = ImageBuffer::try_new(1, 1, RawFormat::RGBA16).unwrap();
    src.data_mut().copy_from_slice(&[0x80, 0xFF, 0x12, 0x34, 0x00, 0xFF, 0xFE, 0xFF]);
    let out = promote(&src, RawFormat::RGBA8, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(out.data(), &[0x80, 0x12, 0x00, 0xFE]);
  }

  #[test]
  fn test_indexed_to_rgba() {
    let mut src = ImageBuffer::try_new(3, 1, RawFormat::I2).unwrap();
    src.set_palette_bytes(&[1, 2, 3, 4, 5, 6]).unwrap();
    src.transparency = Transparency::Alphas(alloc::vec![0x40]);
    src.data_mut().copy_from_slice(&[1, 0, 1]);
    let out = promote(&src, RawFormat::RGBA8, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(out.data(), &[4, 5, 6, 255, 1, 2, 3, 0x40, 4, 5, 6, 255]);
    assert!(out.palette.is_empty());
    let out = promote(&src, RawFormat::RGB16, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(&out.data()[..6], &[4, 4, 5, 5, 6, 6]);
    src.data_mut()[2] = 3;
    let err = promote(&src, RawFormat::RGB8, FillMethod::LeftBitReplicate);
    assert_eq!(err, Err(MngPixelError::PaletteIndex { index: 3, palette_len: 2 }));
  }

  #[test]
  fn test_transparency_is_rescaled() {
    let mut src = ImageBuffer::try_new(1, 1, RawFormat::Y2).unwrap();
    src.transparency = Transparency::Y(0b10);
    let out = promote(&src, RawFormat::RGB8, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(out.transparency, Transparency::RGB([0xAA; 3]));
    // the promoted buffer still reads back the same way
    src.data_mut()[0] = 0b10;
    let out = promote(&src, RawFormat::RGB8, FillMethod::LeftBitReplicate).unwrap();
    let mut row = CanonicalRow::default();
    assert!(!retrieve_row(&out, 0, &mut row).unwrap());
  }

  #[test]
  fn test_unsupported_promotions() {
    let src = ImageBuffer::try_new(1, 1, RawFormat::RGBA8).unwrap();
    assert!(promote(&src, RawFormat::RGB8, FillMethod::LeftBitReplicate).is_err());
    assert!(!promotion_is_supported(RawFormat::YA8, RawFormat::RGB8));
    assert!(!promotion_is_supported(RawFormat::I2, RawFormat::I8));
    assert!(promotion_is_supported(RawFormat::I8, RawFormat::RGBA16));
  }

  #[test]
  fn test_promote_in_place() {
    let mut buf = ImageBuffer::try_new(1, 1, RawFormat::Y8).unwrap();
    buf.data_mut()[0] = 0x42;
    promote_in_place(&mut buf, RawFormat::RGBA16, FillMethod::LeftBitReplicate).unwrap();
    assert_eq!(buf.format(), RawFormat::RGBA16);
    assert_eq!(buf.data(), &[0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0xFF, 0xFF]);
  }
}
