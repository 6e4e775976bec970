#![forbid(unsafe_code)]

//! Writing raw rows into persistent image buffers.

use crate::{packed_sample, ImageBuffer, MngPixelError, MngResult, RowPosition};

/// Stores `samples` pixels of a raw row into `buffer` at `pos`.
///
/// The raw row must be in the buffer's own format. Sub-byte samples get
/// unpacked to one byte each (indexed samples stay as raw indexes, they're not
/// looked up). Samples that would land past the right edge are dropped.
pub fn store_row(
  buffer: &mut ImageBuffer, raw: &[u8], samples: usize, pos: RowPosition,
) -> MngResult<()> {
  let format = buffer.format();
  if raw.len() < format.raw_row_bytes(samples) {
    return Err(MngPixelError::RowOutOfBounds);
  }
  let width = buffer.width() as usize;
  let sample_size = format.stored_sample_size();
  let bits = format.bit_depth();
  let col = pos.col as usize;
  let col_inc = pos.col_inc.max(1) as usize;
  let row = buffer.row_mut(pos.row)?;
  let columns = (col..width).step_by(col_inc).take(samples);
  if bits < 8 {
    for (i, x) in columns.enumerate() {
      row[x] = packed_sample(raw, bits, i);
    }
  } else {
    for (src, x) in raw.chunks_exact(sample_size).zip(columns) {
      row[x * sample_size..(x + 1) * sample_size].copy_from_slice(src);
    }
  }
  Ok(())
}
