#![forbid(unsafe_code)]

//! Storing JNG rows.
//!
//! A JNG image is JPEG color data plus an optional PNG-style alpha channel.
//! The JPEG decoder hands over rows of 8-bit gray or RGB samples, and those
//! go into the color channels of an image buffer. The alpha rows go into the
//! alpha channel separately.

use crate::{
  put_stored_channel, raw_channel, scale_sample, ColorType, FillMethod, ImageBuffer, MngPixelError,
  MngResult,
};

/// Stores one row of 8-bit JPEG samples into the color channels of row `y`.
///
/// `jpeg_color` is [`ColorType::Y`] or [`ColorType::RGB`], and must match the
/// buffer's color channels (gray into gray or gray + alpha, RGB into RGB or
/// RGBA). Samples are widened when the buffer is 16-bit. Alpha is left as is.
pub fn store_jpeg_row(
  buffer: &mut ImageBuffer, y: u32, jpeg_color: ColorType, samples: &[u8],
) -> MngResult<()> {
  let format = buffer.format();
  let ct = format.color_type();
  let color_channels = match (jpeg_color, ct) {
    (ColorType::Y, ColorType::Y | ColorType::YA) => 1,
    (ColorType::RGB, ColorType::RGB | ColorType::RGBA) => 3,
    _ => return Err(MngPixelError::ContractViolation("JPEG color doesn't fit the image")),
  };
  let bits = format.bit_depth();
  if bits < 8 {
    return Err(MngPixelError::ContractViolation("JNG color needs 8 or 16 bit channels"));
  }
  let width = buffer.width() as usize;
  if samples.len() < width * color_channels {
    return Err(MngPixelError::RowOutOfBounds);
  }
  let sample_size = format.stored_sample_size();
  let row = buffer.row_mut(y)?;
  for (dst, src) in row.chunks_exact_mut(sample_size).zip(samples.chunks_exact(color_channels)) {
    for (c, v) in src.iter().enumerate() {
      let scaled = scale_sample(u16::from(*v), 8, bits, FillMethod::LeftBitReplicate);
      put_stored_channel(dst, bits, c, scaled);
    }
  }
  Ok(())
}

/// Stores one raw alpha row into the alpha channel of row `y`.
///
/// `alpha_bits` is the depth of the (packed) alpha samples: 1, 2, 4, 8, or 16.
/// Sub-byte alpha gets replicated up, and 16-bit alpha onto an 8-bit buffer
/// keeps its high byte.
pub fn store_jpeg_alpha_row(
  buffer: &mut ImageBuffer, y: u32, alpha_bits: u8, raw: &[u8],
) -> MngResult<()> {
  if !matches!(alpha_bits, 1 | 2 | 4 | 8 | 16) {
    return Err(MngPixelError::InvalidFormat {
      color_type: ColorType::Y as u8,
      bit_depth: alpha_bits,
    });
  }
  let format = buffer.format();
  if !format.color_type().has_alpha() {
    return Err(MngPixelError::ContractViolation("JNG alpha needs an image with alpha"));
  }
  let width = buffer.width() as usize;
  if raw.len() < (width * usize::from(alpha_bits)).div_ceil(8) {
    return Err(MngPixelError::RowOutOfBounds);
  }
  let bits = format.bit_depth();
  let alpha_channel = format.color_type().channel_count() - 1;
  let sample_size = format.stored_sample_size();
  let row = buffer.row_mut(y)?;
  for (i, dst) in row.chunks_exact_mut(sample_size).enumerate() {
    let a = raw_channel(raw, alpha_bits, i);
    let scaled = scale_sample(a, alpha_bits, bits, FillMethod::LeftBitReplicate);
    put_stored_channel(dst, bits, alpha_channel, scaled);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::RawFormat;

  #[test]
  fn test_store_rgb_then_alpha() {
    let mut buf = ImageBuffer::try_new(2, 1, RawFormat::RGBA8).unwrap();
    store_jpeg_row(&mut buf, 0, ColorType::RGB, &[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(buf.data(), &[1, 2, 3, 0, 4, 5, 6, 0]);
    store_jpeg_alpha_row(&mut buf, 0, 1, &[0b0100_0000]).unwrap();
    assert_eq!(buf.data(), &[1, 2, 3, 0, 4, 5, 6, 255]);
    store_jpeg_alpha_row(&mut buf, 0, 16, &[0x12, 0xFF, 0x80, 0x00]).unwrap();
    assert_eq!(buf.data(), &[1, 2, 3, 0x12, 4, 5, 6, 0x80]);
  }

  #[test]
  fn test_store_gray_into_sixteen_bit() {
    let mut buf = ImageBuffer::try_new(1, 1, RawFormat::YA16).unwrap();
    store_jpeg_row(&mut buf, 0, ColorType::Y, &[0xAB]).unwrap();
    store_jpeg_alpha_row(&mut buf, 0, 4, &[0x70]).unwrap();
    assert_eq!(buf.data(), &[0xAB, 0xAB, 0x77, 0x77]);
  }

  #[test]
  fn test_mismatches_are_rejected() {
    let mut buf = ImageBuffer::try_new(1, 1, RawFormat::RGB8).unwrap();
    assert!(store_jpeg_row(&mut buf, 0, ColorType::Y, &[0]).is_err());
    assert!(store_jpeg_alpha_row(&mut buf, 0, 8, &[0]).is_err());
    let err = store_jpeg_row(&mut buf, 0, ColorType::RGB, &[0, 0]);
    assert_eq!(err, Err(MngPixelError::RowOutOfBounds));
    let err = store_jpeg_row(&mut buf, 1, ColorType::RGB, &[0, 0, 0]);
    assert_eq!(err, Err(MngPixelError::RowOutOfBounds));
  }
}
