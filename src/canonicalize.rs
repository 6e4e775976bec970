#![forbid(unsafe_code)]

//! Turning native rows into canonical rows.
//!
//! There's two sources of native rows:
//! * Raw rows, straight from the filter stage, where samples below 8 bits are
//!   packed several to a byte. See [`canonicalize`].
//! * Stored rows of an [`ImageBuffer`], where every sample has its own byte.
//!   See [`retrieve_row`].
//!
//! Both use the same rules:
//! * Gray samples below 8 bits are scaled up by bit replication.
//! * A gray or RGB sample that exactly matches the transparency value becomes
//!   `(0, 0, 0, 0)`, everything else is opaque.
//! * Indexed samples look up their color in the palette and their alpha in
//!   the transparency list (missing alphas are opaque). An index past the end
//!   of the palette is an error.
//! * Gray + alpha and RGBA samples copy their alpha channel directly.

use crate::{
  be_u16, replicate_to_8, unpack_samples, CanonicalRow, ImageBuffer, MngPixelError, MngResult,
  RawFormat, Transparency, RGB8,
};

/// Converts `sample_count` pixels of a raw row into `out`.
///
/// The pixel data starts at `raw[pixel_offset]` (the bytes before that are
/// usually the filter type byte). Returns the row's opacity flag, which is
/// also stored in `out.is_opaque`.
///
/// ## Failure
/// * [`MngPixelError::PaletteIndex`] if an indexed sample is past the end of
///   the palette. The row is not usable in this case.
/// * [`MngPixelError::RowOutOfBounds`] if the row is too short for the sample
///   count.
pub fn canonicalize(
  raw: &[u8], pixel_offset: usize, sample_count: usize, format: RawFormat, palette: &[RGB8],
  transparency: &Transparency, out: &mut CanonicalRow,
) -> MngResult<bool> {
  let pixels = raw.get(pixel_offset..).ok_or(MngPixelError::RowOutOfBounds)?;
  if pixels.len() < format.raw_row_bytes(sample_count) {
    return Err(MngPixelError::RowOutOfBounds);
  }
  fill_canonical(Packing::Packed, pixels, sample_count, format, palette, transparency, out)
}

/// Converts row `y` of a stored image buffer into `out`.
///
/// Returns the row's opacity flag, see [`canonicalize`].
pub fn retrieve_row(buffer: &ImageBuffer, y: u32, out: &mut CanonicalRow) -> MngResult<bool> {
  let row = buffer.row(y)?;
  fill_canonical(
    Packing::Unpacked,
    row,
    buffer.width() as usize,
    buffer.format(),
    &buffer.palette,
    &buffer.transparency,
    out,
  )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packing {
  Packed,
  Unpacked,
}

fn fill_canonical(
  packing: Packing, data: &[u8], count: usize, format: RawFormat, palette: &[RGB8],
  transparency: &Transparency, out: &mut CanonicalRow,
) -> MngResult<bool> {
  let bits = format.bit_depth();
  match format {
    RawFormat::Y1 | RawFormat::Y2 | RawFormat::Y4 | RawFormat::Y8 => {
      let dst = out.reset_rgba8(count)?;
      let trns = transparency.gray();
      match packing {
        Packing::Packed => gray_into(unpack_samples(data, bits), bits, trns, dst),
        Packing::Unpacked => gray_into(data.iter().copied(), bits, trns, dst),
      }
    }
    RawFormat::I1 | RawFormat::I2 | RawFormat::I4 | RawFormat::I8 => {
      let dst = out.reset_rgba8(count)?;
      let alphas = transparency.alphas();
      match packing {
        Packing::Packed => indexed_into(unpack_samples(data, bits), palette, alphas, dst)?,
        Packing::Unpacked => indexed_into(data.iter().copied(), palette, alphas, dst)?,
      }
    }
    RawFormat::Y16 => {
      let dst = out.reset_rgba16(count)?;
      let trns = transparency.gray();
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(2)) {
        let y = be_u16(s, 0);
        *d = if trns == Some(y) { [0; 4] } else { [y, y, y, u16::MAX] };
      }
    }
    RawFormat::RGB8 => {
      let dst = out.reset_rgba8(count)?;
      let trns = transparency.rgb();
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(3)) {
        let rgb = [s[0], s[1], s[2]];
        *d = if trns == Some(rgb.map(u16::from)) { [0; 4] } else { [s[0], s[1], s[2], u8::MAX] };
      }
    }
    RawFormat::RGB16 => {
      let dst = out.reset_rgba16(count)?;
      let trns = transparency.rgb();
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(6)) {
        let rgb = [be_u16(s, 0), be_u16(s, 2), be_u16(s, 4)];
        *d = if trns == Some(rgb) { [0; 4] } else { [rgb[0], rgb[1], rgb[2], u16::MAX] };
      }
    }
    RawFormat::YA8 => {
      let dst = out.reset_rgba8(count)?;
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(2)) {
        *d = [s[0], s[0], s[0], s[1]];
      }
    }
    RawFormat::YA16 => {
      let dst = out.reset_rgba16(count)?;
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(4)) {
        let y = be_u16(s, 0);
        *d = [y, y, y, be_u16(s, 2)];
      }
    }
    RawFormat::RGBA8 => {
      let dst = out.reset_rgba8(count)?;
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(4)) {
        *d = [s[0], s[1], s[2], s[3]];
      }
    }
    RawFormat::RGBA16 => {
      let dst = out.reset_rgba16(count)?;
      for (d, s) in dst.iter_mut().zip(data.chunks_exact(8)) {
        *d = [be_u16(s, 0), be_u16(s, 2), be_u16(s, 4), be_u16(s, 6)];
      }
    }
  }
  Ok(out.update_opacity())
}

#[inline]
fn gray_into(
  samples: impl Iterator<Item = u8>, bits: u8, trns: Option<u16>, dst: &mut [[u8; 4]],
) {
  for (d, v) in dst.iter_mut().zip(samples) {
    *d = if trns == Some(u16::from(v)) {
      [0; 4]
    } else {
      let y = replicate_to_8(bits, v);
      [y, y, y, u8::MAX]
    };
  }
}

#[inline]
fn indexed_into(
  samples: impl Iterator<Item = u8>, palette: &[RGB8], alphas: &[u8], dst: &mut [[u8; 4]],
) -> MngResult<()> {
  for (d, index) in dst.iter_mut().zip(samples) {
    let i = usize::from(index);
    let RGB8 { r, g, b } = *palette
      .get(i)
      .ok_or(MngPixelError::PaletteIndex { index, palette_len: palette.len() })?;
    let a = alphas.get(i).copied().unwrap_or(u8::MAX);
    *d = [r, g, b, a];
  }
  Ok(())
}
