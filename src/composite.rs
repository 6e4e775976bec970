#![forbid(unsafe_code)]

//! Drawing canonical rows onto canvases.
//!
//! Only the visible part of each row is drawn: the [`DisplayGeometry`] says
//! which part of the image is visible and where it lands on the canvas. Every
//! drawn row grows an [`UpdateRegion`] so the host knows what to repaint.
//!
//! A fully opaque row is copied (16-bit channels keep their high byte). Other
//! rows are composited over the existing canvas pixels, see [`crate::compose`].

use crate::{
  canvas::with_layout, compose_premultiplied, compose_straight, CanonicalRow, Canvas, CanvasLine,
  CanvasStyle, Channel, MngPixelError, MngResult, PixelLayout, RowPixels, RowPosition,
};

/// Which part of an image is visible, and where it goes on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DisplayGeometry {
  /// First visible image column.
  pub source_left: u32,
  /// One past the last visible image column.
  pub source_right: u32,
  /// First visible image row.
  pub source_top: u32,
  /// One past the last visible image row.
  pub source_bottom: u32,
  /// Canvas column that `source_left` lands on.
  pub dest_left: u32,
  /// Canvas row that `source_top` lands on.
  pub dest_top: u32,
}
impl DisplayGeometry {
  /// The whole image, drawn at the canvas origin.
  #[inline]
  #[must_use]
  pub const fn full(width: u32, height: u32) -> Self {
    Self {
      source_left: 0,
      source_right: width,
      source_top: 0,
      source_bottom: height,
      dest_left: 0,
      dest_top: 0,
    }
  }

  /// The whole image, with the top left corner at `(x, y)` on a canvas that's
  /// `canvas_width` by `canvas_height`. Parts that fall off the canvas are
  /// clipped away.
  #[must_use]
  pub fn placed(
    width: u32, height: u32, x: i32, y: i32, canvas_width: u32, canvas_height: u32,
  ) -> Self {
    let (source_left, dest_left, source_right) = clip_axis(width, x, canvas_width);
    let (source_top, dest_top, source_bottom) = clip_axis(height, y, canvas_height);
    Self { source_left, source_right, source_top, source_bottom, dest_left, dest_top }
  }

  /// If `row` is inside the visible rows.
  #[inline]
  #[must_use]
  pub const fn row_is_visible(&self, row: u32) -> bool {
    self.source_top <= row && row < self.source_bottom
  }

  /// One past the last canvas column that gets drawn.
  #[inline]
  #[must_use]
  pub const fn dest_right(&self) -> u32 {
    self.dest_left + self.source_right.saturating_sub(self.source_left)
  }
}

/// Returns `(source_start, dest_start, source_end)` along one axis.
fn clip_axis(len: u32, offset: i32, canvas_len: u32) -> (u32, u32, u32) {
  let len = i64::from(len);
  let offset = i64::from(offset);
  let canvas_len = i64::from(canvas_len);
  let source_start = (-offset).clamp(0, len);
  let dest_start = offset.max(0).min(canvas_len);
  let source_end = (canvas_len - offset).clamp(source_start, len);
  (source_start as u32, dest_start as u32, source_end as u32)
}

/// The canvas area touched since the last reset: `left..right` by
/// `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateRegion {
  /// Leftmost touched column.
  pub left: u32,
  /// One past the rightmost touched column.
  pub right: u32,
  /// Topmost touched row.
  pub top: u32,
  /// One past the bottom touched row.
  pub bottom: u32,
}
impl Default for UpdateRegion {
  #[inline]
  fn default() -> Self {
    Self::EMPTY
  }
}
impl UpdateRegion {
  /// Nothing touched.
  pub const EMPTY: Self = Self { left: u32::MAX, right: 0, top: u32::MAX, bottom: 0 };

  /// If nothing has been touched.
  #[inline]
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.left >= self.right || self.top >= self.bottom
  }

  /// Grows the region to include `left..right` of canvas row `row`.
  #[inline]
  pub fn include_row(&mut self, left: u32, right: u32, row: u32) {
    self.left = self.left.min(left);
    self.right = self.right.max(right);
    self.top = self.top.min(row);
    self.bottom = self.bottom.max(row.saturating_add(1));
  }

  /// Takes the current region, leaving this one empty.
  #[inline]
  pub fn take(&mut self) -> Self {
    core::mem::replace(self, Self::EMPTY)
  }
}

/// Draws the visible part of a canonical row onto a canvas.
///
/// * `pos` is where the row's samples sit in the full image (the row, the
///   first column, and the column step of the current interlace pass).
/// * Returns the canvas row that was drawn, or `None` if the row isn't
///   visible.
///
/// ## Failure
/// * [`MngPixelError::RowOutOfBounds`] if the canvas doesn't have the
///   destination row.
/// * [`MngPixelError::ContractViolation`] if the canvas style needs an alpha
///   plane and the canvas didn't provide one.
pub fn composite_row(
  row: &CanonicalRow, canvas: &mut dyn Canvas, geometry: &DisplayGeometry, pos: RowPosition,
  region: &mut UpdateRegion,
) -> MngResult<Option<u32>> {
  if !geometry.row_is_visible(pos.row) {
    return Ok(None);
  }
  let canvas_row = pos.row - geometry.source_top + geometry.dest_top;
  let style = canvas.style();
  let line = canvas.get_line(canvas_row).ok_or(MngPixelError::RowOutOfBounds)?;
  if style.has_alpha_plane() && line.alpha.is_none() {
    return Err(MngPixelError::ContractViolation("canvas style needs an alpha plane"));
  }
  let span = Span::new(geometry, pos);
  match row.pixels() {
    RowPixels::Rgba8(px) if style == CanvasStyle::RGBA8 && row.is_opaque && span.col_inc == 1 => {
      let src = px.get(span.src_start..).unwrap_or_default();
      let dst = line.pixels.get_mut(span.dst_start * 4..).unwrap_or_default();
      copy_rgba8_wide(src, dst, span.count)
    }
    RowPixels::Rgba8(px) => {
      with_layout!(style, L => draw_row::<L, u8>(px, row.is_opaque, line, span))
    }
    RowPixels::Rgba16(px) => {
      with_layout!(style, L => draw_row::<L, u16>(px, row.is_opaque, line, span))
    }
  }
  region.include_row(geometry.dest_left, geometry.dest_right(), canvas_row);
  Ok(Some(canvas_row))
}

/// The source and destination stepping for one row.
#[derive(Debug, Clone, Copy)]
struct Span {
  src_start: usize,
  dst_start: usize,
  col_inc: usize,
  count: usize,
}
impl Span {
  fn new(g: &DisplayGeometry, pos: RowPosition) -> Self {
    let col_inc = pos.col_inc.max(1) as usize;
    let first_x = g.source_left as usize + pos.col as usize;
    let count = (g.source_right as usize).saturating_sub(first_x).div_ceil(col_inc);
    Self {
      src_start: g.source_left as usize / col_inc,
      dst_start: pos.col as usize + g.dest_left as usize,
      col_inc,
      count,
    }
  }
}

fn draw_row<L: PixelLayout, C: Channel>(
  src: &[[C; 4]], opaque: bool, line: CanvasLine<'_>, span: Span,
) {
  let CanvasLine { pixels, mut alpha } = line;
  let dst = pixels.chunks_exact_mut(L::BYTES).skip(span.dst_start).step_by(span.col_inc);
  let src = src.iter().skip(span.src_start).take(span.count);
  for (i, (fg, px)) in src.zip(dst).enumerate() {
    let plane = alpha.as_deref_mut().and_then(|a| a.get_mut(span.dst_start + i * span.col_inc));
    if opaque {
      L::write_pixel(px, fg.map(C::to_canvas));
      if let Some(a) = plane {
        *a = u8::MAX;
      }
      continue;
    }
    if fg[3] == C::default() {
      continue;
    }
    let mut bg = L::read_pixel(px);
    if let Some(a) = plane.as_deref() {
      bg[3] = *a;
    }
    let bg = bg.map(C::from_canvas);
    let out =
      if L::PREMULTIPLIED { compose_premultiplied(*fg, bg) } else { compose_straight(*fg, bg) };
    let out = out.map(C::to_canvas);
    L::write_pixel(px, out);
    if let Some(a) = plane {
      *a = out[3];
    }
  }
}

/// Copies opaque 8-bit pixels into an `RGBA8` line as one bulk copy.
///
/// Gives the same bytes as the per-pixel path.
fn copy_rgba8_wide(src: &[[u8; 4]], dst: &mut [u8], count: usize) {
  let n = count.min(src.len()).min(dst.len() / 4);
  let bytes: &[u8] = bytemuck::cast_slice(&src[..n]);
  dst[..n * 4].copy_from_slice(bytes);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::VecCanvas;
  use alloc::vec;

  fn full_pos(row: u32) -> RowPosition {
    RowPosition { row, col: 0, col_inc: 1 }
  }

  #[test]
  fn test_opaque_row_onto_rgb8() {
    let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, 1, 1).unwrap();
    canvas.fill([1, 1, 1, 255]);
    let row = CanonicalRow::from_rgba8(vec![[10, 20, 30, 255]]);
    let mut region = UpdateRegion::default();
    let geometry = DisplayGeometry::full(1, 1);
    let drawn =
      composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(drawn, Some(0));
    assert_eq!(canvas.pixels(), &[10, 20, 30]);
    assert_eq!(region, UpdateRegion { left: 0, right: 1, top: 0, bottom: 1 });
  }

  #[test]
  fn test_half_alpha_over_opaque_green() {
    let mut canvas = VecCanvas::try_new(CanvasStyle::RGBA8, 1, 1).unwrap();
    canvas.fill([0, 255, 0, 255]);
    let row = CanonicalRow::from_rgba8(vec![[255, 0, 0, 128]]);
    let mut region = UpdateRegion::default();
    let geometry = DisplayGeometry::full(1, 1);
    composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(canvas.pixels(), &[128, 127, 0, 255]);
  }

  #[test]
  fn test_sixteen_bit_opaque_takes_high_byte() {
    let mut canvas = VecCanvas::try_new(CanvasStyle::BGRA8, 1, 1).unwrap();
    let row = CanonicalRow::from_rgba16(vec![[0x80FF, 0x12FF, 0x0001, 0xFFFF]]);
    let mut region = UpdateRegion::default();
    let geometry = DisplayGeometry::full(1, 1);
    composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(canvas.pixels(), &[0x00, 0x12, 0x80, 0xFF]);
  }

  #[test]
  fn test_invisible_row_is_skipped() {
    let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, 2, 2).unwrap();
    let row = CanonicalRow::from_rgba8(vec![[9, 9, 9, 255]; 2]);
    let geometry =
      DisplayGeometry { source_top: 1, source_bottom: 2, ..DisplayGeometry::full(2, 2) };
    let mut region = UpdateRegion::default();
    let drawn = composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(drawn, None);
    assert!(region.is_empty());
    assert!(canvas.pixels().iter().all(|b| *b == 0));
  }

  #[test]
  fn test_geometry_offsets_and_interlace_steps() {
    // a 4 wide image placed at x=1, y=1 on a 4x3 canvas: the last image column
    // falls off the right side.
    let geometry = DisplayGeometry::placed(4, 2, 1, 1, 4, 3);
    assert_eq!(
      geometry,
      DisplayGeometry {
        source_left: 0,
        source_right: 3,
        source_top: 0,
        source_bottom: 2,
        dest_left: 1,
        dest_top: 1,
      }
    );
    let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, 4, 3).unwrap();
    // pass 5 style row: starts at column 1, every other column
    let row = CanonicalRow::from_rgba8(vec![[1, 1, 1, 255], [2, 2, 2, 255]]);
    let mut region = UpdateRegion::default();
    let pos = RowPosition { row: 1, col: 1, col_inc: 2 };
    assert_eq!(composite_row(&row, &mut canvas, &geometry, pos, &mut region), Ok(Some(2)));
    let line = &canvas.pixels()[2 * 12..];
    assert_eq!(line, &[0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0]);
    assert_eq!(region, UpdateRegion { left: 1, right: 4, top: 2, bottom: 3 });
  }

  #[test]
  fn test_negative_placement_clips_left() {
    let geometry = DisplayGeometry::placed(4, 1, -2, 0, 4, 1);
    assert_eq!((geometry.source_left, geometry.source_right, geometry.dest_left), (2, 4, 0));
    let mut canvas = VecCanvas::try_new(CanvasStyle::BGR8, 4, 1).unwrap();
    let pixels = vec![[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]];
    let row = CanonicalRow::from_rgba8(pixels);
    let mut region = UpdateRegion::default();
    composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(canvas.pixels(), &[0, 0, 3, 0, 0, 4, 0, 0, 0, 0, 0, 0]);
  }

  #[test]
  fn test_alpha_plane_is_blended() {
    let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8_A8, 1, 1).unwrap();
    canvas.set_pixel(0, 0, [0, 255, 0, 128]);
    let row = CanonicalRow::from_rgba8(vec![[255, 0, 0, 128]]);
    let mut region = UpdateRegion::default();
    let geometry = DisplayGeometry::full(1, 1);
    composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(canvas.pixel(0, 0), Some([170, 84, 0, 192]));
  }

  #[test]
  fn test_premultiplied_canvas() {
    let mut canvas = VecCanvas::try_new(CanvasStyle::ARGB8_PM, 1, 1).unwrap();
    let row = CanonicalRow::from_rgba8(vec![[200, 100, 0, 128]]);
    let mut region = UpdateRegion::default();
    let geometry = DisplayGeometry::full(1, 1);
    composite_row(&row, &mut canvas, &geometry, full_pos(0), &mut region).unwrap();
    assert_eq!(canvas.pixels(), &[128, 100, 50, 0]);
  }

  #[test]
  fn test_wide_copy_matches_per_pixel_path() {
    let src: alloc::vec::Vec<[u8; 4]> =
      (0..37_u8).map(|i| [i, i.wrapping_mul(7), 255 - i, 255]).collect();
    let mut wide = vec![0_u8; 37 * 4];
    copy_rgba8_wide(&src, &mut wide, 37);
    let mut per_pixel = vec![0_u8; 37 * 4];
    let line = CanvasLine { pixels: &mut per_pixel, alpha: None };
    draw_row::<crate::canvas::Rgba8, u8>(
      &src,
      true,
      line,
      Span { src_start: 0, dst_start: 0, col_inc: 1, count: 37 },
    );
    assert_eq!(wide, per_pixel);
  }
}
