#![forbid(unsafe_code)]

//! The per-image row pipeline.
//!
//! A [`Session`] holds everything that lives across rows: the scratch rows,
//! the interlace state, the display geometry, and the repaint region. Make
//! one per decode, it can't be shared between decodes that run at the same
//! time.
//!
//! For each image:
//! 1. [`Session::begin_image`] with the header and what to do with the rows.
//!    The row handling is picked here, once.
//! 2. For every row: fill the working row (see [`Session::rows_mut`] or
//!    [`Session::feed_row`]), then call [`Session::process_row`] and
//!    [`Session::next_row`].
//! 3. [`Session::end_image`] releases the scratch rows.

use alloc::vec::Vec;

use crate::{
  canonicalize, composite_row, retrieve_row, store_row, CanonicalRow, Canvas, DisplayGeometry,
  ImageBuffer, MngPixelError, MngResult, PassState, RawFormat, RowPosition, UpdateRegion,
};
#[cfg(feature = "delta")]
use crate::{
  apply_delta_canonical, apply_delta_pixels, check_delta_target, scale_row, DeltaDescriptor,
  DeltaKind, Transparency,
};

/// The shape of the image whose rows are about to arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHeader {
  /// Width in pixels.
  pub width: u32,
  /// Height in pixels.
  pub height: u32,
  /// Format of the raw rows.
  pub format: RawFormat,
  /// If the rows come in Adam7 order.
  pub interlaced: bool,
}

/// What to do with each row of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PipelineMode {
  /// Draw rows onto the canvas without keeping them.
  ///
  /// The palette and transparency data come from the session's own
  /// "object zero" buffer, see [`Session::object_zero_mut`].
  #[default]
  DisplayOnly,
  /// Keep rows in the target buffer.
  Store,
  /// Keep rows in the target buffer and draw them.
  StoreAndDisplay,
  /// Apply rows as a delta onto the target buffer, drawing the changed rows
  /// of the target.
  #[cfg(feature = "delta")]
  Delta(DeltaDescriptor),
}

/// Sent to the row hook after each row that got drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowNotice {
  /// Image row that was drawn.
  pub image_row: u32,
  /// Canvas row it landed on.
  pub canvas_row: u32,
  /// Interlace pass, if any.
  pub pass: Option<u8>,
  /// Canvas area touched so far.
  pub region: UpdateRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStrategy {
  Display,
  Store,
  StoreDisplay,
  #[cfg(feature = "delta")]
  DeltaPixels { desc: DeltaDescriptor, scale_to: Option<u8> },
  #[cfg(feature = "delta")]
  DeltaChannels { desc: DeltaDescriptor },
  #[cfg(feature = "delta")]
  Skip,
}

/// The per-decode row pipeline state.
#[derive(Debug, Clone)]
pub struct Session {
  header: Option<ImageHeader>,
  strategy: RowStrategy,
  pass: PassState,
  work_row: Vec<u8>,
  prev_row: Vec<u8>,
  #[cfg(feature = "delta")]
  scaled_row: Vec<u8>,
  canonical: CanonicalRow,
  object_zero: ImageBuffer,
  geometry: DisplayGeometry,
  region: UpdateRegion,
  row_hook: Option<fn(&RowNotice)>,
}
impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}
impl Session {
  /// A session with no image started.
  #[must_use]
  pub fn new() -> Self {
    Self {
      header: None,
      strategy: RowStrategy::Display,
      pass: PassState::new(0, 0, false),
      work_row: Vec::new(),
      prev_row: Vec::new(),
      #[cfg(feature = "delta")]
      scaled_row: Vec::new(),
      canonical: CanonicalRow::default(),
      object_zero: ImageBuffer::metadata_only(0, 0, RawFormat::Y8),
      geometry: DisplayGeometry::default(),
      region: UpdateRegion::EMPTY,
      row_hook: None,
    }
  }

  /// Starts a new image.
  ///
  /// Allocates the scratch rows and picks how rows are handled. `target` is
  /// the persistent buffer that rows are stored into (or that a delta
  /// applies to). It's checked here against the header:
  /// * Storing needs a target with the same format and size as the header.
  /// * A delta needs a target that its kind can apply to. A whole image
  ///   replacement re-creates the target in the header's format when they
  ///   differ, keeping its palette and transparency.
  pub fn begin_image(
    &mut self, header: ImageHeader, mode: PipelineMode, geometry: DisplayGeometry,
    target: Option<&mut ImageBuffer>,
  ) -> MngResult<()> {
    if header.width == 0 || header.height == 0 {
      return Err(MngPixelError::WidthOrHeightZero);
    }
    let width = usize::try_from(header.width)?;
    let row_bytes =
      header.format.raw_row_bytes(width).checked_add(1).ok_or(MngPixelError::DimensionsTooLarge)?;
    let strategy = match Self::pick_strategy(&header, mode, target) {
      Ok(s) => s,
      Err(e) => {
        log::warn!("can't start {:?} image: {e}", header.format);
        return Err(e);
      }
    };
    zeroed_scratch(&mut self.work_row, row_bytes)?;
    zeroed_scratch(&mut self.prev_row, row_bytes)?;
    self.canonical = CanonicalRow::try_with_capacity(width, header.format.is_wide())?;
    let mut object_zero = ImageBuffer::metadata_only(header.width, header.height, header.format);
    object_zero.palette = core::mem::take(&mut self.object_zero.palette);
    object_zero.transparency = core::mem::take(&mut self.object_zero.transparency);
    self.object_zero = object_zero;
    self.pass = PassState::new(header.width, header.height, header.interlaced);
    self.geometry = geometry;
    self.region = UpdateRegion::EMPTY;
    self.strategy = strategy;
    self.header = Some(header);
    log::debug!(
      "{}x{} {:?} image (interlaced: {}), rows handled as {:?}",
      header.width,
      header.height,
      header.format,
      header.interlaced,
      strategy
    );
    Ok(())
  }

  fn pick_strategy(
    header: &ImageHeader, mode: PipelineMode, target: Option<&mut ImageBuffer>,
  ) -> MngResult<RowStrategy> {
    Ok(match mode {
      PipelineMode::DisplayOnly => RowStrategy::Display,
      PipelineMode::Store | PipelineMode::StoreAndDisplay => {
        let t = need_target(target)?;
        if t.format() != header.format || t.width() != header.width || t.height() != header.height {
          return Err(MngPixelError::ContractViolation(
            "target buffer doesn't match the image header",
          ));
        }
        if !t.has_pixels() {
          return Err(MngPixelError::ContractViolation("target buffer has no pixel storage"));
        }
        if mode == PipelineMode::Store {
          RowStrategy::Store
        } else {
          RowStrategy::StoreDisplay
        }
      }
      #[cfg(feature = "delta")]
      PipelineMode::Delta(desc) => {
        let t = need_target(target)?;
        check_delta_target(desc.kind, header.format, t.format())?;
        match desc.kind {
          DeltaKind::NoChange => RowStrategy::Skip,
          DeltaKind::Replace => {
            let same_shape = t.format() == header.format
              && t.width() == header.width
              && t.height() == header.height;
            if !same_shape || !t.has_pixels() {
              let mut fresh = ImageBuffer::try_new(header.width, header.height, header.format)?;
              fresh.palette = core::mem::take(&mut t.palette);
              fresh.transparency = core::mem::take(&mut t.transparency);
              fresh.is_viewable = t.is_viewable;
              *t = fresh;
            }
            RowStrategy::DeltaPixels { desc, scale_to: None }
          }
          _ if !t.has_pixels() => {
            return Err(MngPixelError::ContractViolation("target buffer has no pixel storage"));
          }
          kind if kind.is_pixel() => {
            let scale_to = (t.format() != header.format).then_some(t.format().bit_depth());
            RowStrategy::DeltaPixels { desc, scale_to }
          }
          _ => RowStrategy::DeltaChannels { desc },
        }
      }
    })
  }

  /// The header of the current image.
  #[inline]
  #[must_use]
  pub fn header(&self) -> Option<&ImageHeader> {
    self.header.as_ref()
  }

  /// The interlace state.
  #[inline]
  #[must_use]
  pub fn pass_state(&self) -> &PassState {
    &self.pass
  }

  /// The most recent canonical row.
  #[inline]
  #[must_use]
  pub fn canonical_row(&self) -> &CanonicalRow {
    &self.canonical
  }

  /// The metadata buffer used for rows that aren't stored anywhere.
  #[inline]
  #[must_use]
  pub fn object_zero(&self) -> &ImageBuffer {
    &self.object_zero
  }

  /// Lets the palette and transparency of "object zero" be set.
  #[inline]
  pub fn object_zero_mut(&mut self) -> &mut ImageBuffer {
    &mut self.object_zero
  }

  /// The display geometry.
  #[inline]
  #[must_use]
  pub fn geometry(&self) -> &DisplayGeometry {
    &self.geometry
  }

  /// Changes the display geometry.
  #[inline]
  pub fn set_geometry(&mut self, geometry: DisplayGeometry) {
    self.geometry = geometry;
  }

  /// Canvas area touched so far.
  #[inline]
  #[must_use]
  pub fn update_region(&self) -> UpdateRegion {
    self.region
  }

  /// Takes the touched area, resetting it to empty.
  #[inline]
  pub fn take_update_region(&mut self) -> UpdateRegion {
    self.region.take()
  }

  /// Sets a function to call after each row that gets drawn.
  #[inline]
  pub fn set_row_hook(&mut self, hook: fn(&RowNotice)) {
    self.row_hook = Some(hook);
  }

  /// Removes the row hook.
  #[inline]
  pub fn clear_row_hook(&mut self) {
    self.row_hook = None;
  }

  /// Byte length of the current row, including the leading filter type byte.
  #[inline]
  #[must_use]
  pub fn current_row_len(&self) -> usize {
    let samples = self.pass.samples() as usize;
    self.object_zero.format().raw_row_bytes(samples) + 1
  }

  /// Borrows the working row (to fill in) and the previous row (for filter
  /// reconstruction), both sized for the current pass.
  ///
  /// Byte 0 of each is the filter type byte, and pixel data follows it. The
  /// previous row is all zeroes for the first row of every pass.
  pub fn rows_mut(&mut self) -> (&mut [u8], &[u8]) {
    let len = self.current_row_len().min(self.work_row.len());
    (&mut self.work_row[..len], &self.prev_row[..len])
  }

  /// Copies already unfiltered pixel data into the working row.
  pub fn feed_row(&mut self, pixels: &[u8]) -> MngResult<()> {
    let len = self.current_row_len();
    let need = len - 1;
    let src = pixels.get(..need).ok_or(MngPixelError::RowOutOfBounds)?;
    let dst = self.work_row.get_mut(1..len).ok_or(MngPixelError::RowOutOfBounds)?;
    dst.copy_from_slice(src);
    Ok(())
  }

  /// Handles the current working row.
  ///
  /// `target` is the buffer given to `begin_image` (if the mode needs one),
  /// and `canvas` is where rows get drawn (drawing is skipped without one).
  ///
  /// A failed row logs a warning and returns the error. The session can
  /// still move on to the next row, deciding that is up to the caller.
  pub fn process_row(
    &mut self, target: Option<&mut ImageBuffer>, canvas: Option<&mut dyn Canvas>,
  ) -> MngResult<()> {
    let result = self.process_row_inner(target, canvas);
    if let Err(e) = &result {
      log::warn!("row {} (pass {:?}) failed: {e}", self.pass.row(), self.pass.pass());
    }
    result
  }

  fn process_row_inner(
    &mut self, target: Option<&mut ImageBuffer>, canvas: Option<&mut dyn Canvas>,
  ) -> MngResult<()> {
    if self.header.is_none() || self.pass.is_done() {
      return Err(MngPixelError::RowOutOfBounds);
    }
    let pos = self.pass.position();
    let samples = self.pass.samples() as usize;
    let len = self.current_row_len();
    let format = self.object_zero.format();
    let raw = self.work_row.get(1..len).ok_or(MngPixelError::RowOutOfBounds)?;
    match self.strategy {
      RowStrategy::Display => {
        if let Some(canvas) = canvas {
          let z = &self.object_zero;
          canonicalize(raw, 0, samples, format, &z.palette, &z.transparency, &mut self.canonical)?;
          self.draw(canvas, pos)?;
        }
      }
      RowStrategy::Store | RowStrategy::StoreDisplay => {
        let t = need_target(target)?;
        // a row with a bad palette index must not reach the buffer
        let (palette, trns) = (&t.palette, &t.transparency);
        canonicalize(raw, 0, samples, format, palette, trns, &mut self.canonical)?;
        store_row(t, raw, samples, pos)?;
        if let (RowStrategy::StoreDisplay, Some(canvas)) = (self.strategy, canvas) {
          self.draw(canvas, pos)?;
        }
      }
      #[cfg(feature = "delta")]
      RowStrategy::DeltaPixels { desc, scale_to } => {
        let t = need_target(target)?;
        let (data, data_format) = match scale_to {
          Some(bits) => {
            let f = scale_row(raw, samples, format, bits, &mut self.scaled_row)?;
            (self.scaled_row.as_slice(), f)
          }
          None => (raw, format),
        };
        let (bx, by) = (desc.block_x, desc.block_y);
        apply_delta_pixels(desc.kind, data, samples, data_format, t, pos, bx, by)?;
        self.show_target_row(t, canvas, pos.row.saturating_add(desc.block_y))?;
      }
      #[cfg(feature = "delta")]
      RowStrategy::DeltaChannels { desc } => {
        let t = need_target(target)?;
        canonicalize(raw, 0, samples, format, &[], &Transparency::None, &mut self.canonical)?;
        let delta_has_alpha = format.color_type().has_alpha();
        let (bx, by) = (desc.block_x, desc.block_y);
        apply_delta_canonical(desc.kind, &self.canonical, delta_has_alpha, t, pos, bx, by)?;
        self.show_target_row(t, canvas, pos.row.saturating_add(desc.block_y))?;
      }
      #[cfg(feature = "delta")]
      RowStrategy::Skip => (),
    }
    Ok(())
  }

  /// Draws the canonical row and fires the row hook.
  fn draw(&mut self, canvas: &mut dyn Canvas, pos: RowPosition) -> MngResult<Option<u32>> {
    let drawn = composite_row(&self.canonical, canvas, &self.geometry, pos, &mut self.region)?;
    if let (Some(canvas_row), Some(hook)) = (drawn, self.row_hook) {
      hook(&RowNotice {
        image_row: pos.row,
        canvas_row,
        pass: self.pass.pass(),
        region: self.region,
      });
    }
    Ok(drawn)
  }

  #[cfg(feature = "delta")]
  fn show_target_row(
    &mut self, target: &ImageBuffer, canvas: Option<&mut dyn Canvas>, y: u32,
  ) -> MngResult<()> {
    if let Some(canvas) = canvas {
      if y < target.height() {
        self.display_buffer_row(target, y, canvas)?;
      }
    }
    Ok(())
  }

  /// Draws row `y` of a stored buffer, using the current geometry.
  ///
  /// Returns the canvas row that was drawn, if the row is visible.
  pub fn display_buffer_row(
    &mut self, buffer: &ImageBuffer, y: u32, canvas: &mut dyn Canvas,
  ) -> MngResult<Option<u32>> {
    retrieve_row(buffer, y, &mut self.canonical)?;
    self.draw(canvas, RowPosition { row: y, col: 0, col_inc: 1 })
  }

  /// Moves on to the next row.
  ///
  /// The working row becomes the previous row. When a new interlace pass
  /// starts the previous row is zeroed instead. Returns `false` once every
  /// row has been seen.
  pub fn next_row(&mut self) -> bool {
    core::mem::swap(&mut self.work_row, &mut self.prev_row);
    if self.pass.advance() {
      self.prev_row.fill(0);
    }
    !self.pass.is_done()
  }

  /// If every row of the current image has been seen.
  #[inline]
  #[must_use]
  pub fn is_done(&self) -> bool {
    self.pass.is_done()
  }

  /// Finishes the image: frees the scratch rows and returns the touched
  /// area.
  pub fn end_image(&mut self) -> UpdateRegion {
    self.work_row = Vec::new();
    self.prev_row = Vec::new();
    #[cfg(feature = "delta")]
    {
      self.scaled_row = Vec::new();
    }
    self.canonical = CanonicalRow::default();
    self.header = None;
    self.region.take()
  }
}

#[inline]
fn need_target(target: Option<&mut ImageBuffer>) -> MngResult<&mut ImageBuffer> {
  target.ok_or(MngPixelError::ContractViolation("this row mode needs a target buffer"))
}

fn zeroed_scratch(v: &mut Vec<u8>, len: usize) -> MngResult<()> {
  v.clear();
  v.try_reserve(len)?;
  v.resize(len, 0);
  Ok(())
}
