use core::sync::atomic::{AtomicUsize, Ordering};

use mngpix::*;

/// Picks the current row's samples out of a full 8-bit image.
pub(crate) fn pass_row(image: &[u8], width: usize, bpp: usize, session: &Session) -> Vec<u8> {
  let pass = session.pass_state();
  let y = pass.row() as usize;
  let mut out = Vec::new();
  for k in 0..pass.samples() as usize {
    let x = pass.col() as usize + k * pass.col_inc() as usize;
    let i = (y * width + x) * bpp;
    out.extend_from_slice(&image[i..i + bpp]);
  }
  out
}

/// Feeds a whole image through the session, returning the number of rows.
pub(crate) fn run_image(
  session: &mut Session, image: &[u8], bpp: usize, mut target: Option<&mut ImageBuffer>,
  mut canvas: Option<&mut VecCanvas>,
) -> usize {
  let width = session.header().unwrap().width as usize;
  let mut rows = 0;
  loop {
    let row = pass_row(image, width, bpp, session);
    session.feed_row(&row).unwrap();
    session
      .process_row(target.as_deref_mut(), canvas.as_deref_mut().map(|c| c as &mut dyn Canvas))
      .unwrap();
    rows += 1;
    if !session.next_row() {
      break;
    }
  }
  rows
}

#[test]
fn test_store_and_display_interlaced_and_not() {
  let (width, height) = (5, 3);
  let image = super::rand_bytes(width * height * 3);
  for interlaced in [false, true] {
    let header = ImageHeader {
      width: width as u32,
      height: height as u32,
      format: RawFormat::RGB8,
      interlaced,
    };
    let mut target = ImageBuffer::try_new(header.width, header.height, header.format).unwrap();
    let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, header.width, header.height).unwrap();
    let mut session = Session::new();
    let geometry = DisplayGeometry::full(header.width, header.height);
    let mode = PipelineMode::StoreAndDisplay;
    session.begin_image(header, mode, geometry, Some(&mut target)).unwrap();
    let rows = run_image(&mut session, &image, 3, Some(&mut target), Some(&mut canvas));
    // Adam7 on 5x3 skips the pass that starts at row 4
    assert_eq!(rows, if interlaced { 1 + 1 + 1 + 1 + 2 + 1 } else { 3 });
    assert_eq!(target.data(), image.as_slice(), "interlaced: {interlaced}");
    assert_eq!(canvas.pixels(), image.as_slice(), "interlaced: {interlaced}");
    let region = session.end_image();
    assert_eq!(region, UpdateRegion { left: 0, right: 5, top: 0, bottom: 3 });
  }
}

#[test]
fn test_palette_index_error_aborts_the_row() {
  let mut session = Session::new();
  session.object_zero_mut().set_palette_bytes(&[0; 4 * 3]).unwrap();
  let header = ImageHeader { width: 2, height: 1, format: RawFormat::I8, interlaced: false };
  let geometry = DisplayGeometry::full(2, 1);
  session.begin_image(header, PipelineMode::DisplayOnly, geometry, None).unwrap();
  let mut canvas = VecCanvas::try_new(CanvasStyle::RGBA8, 2, 1).unwrap();
  canvas.fill([1, 2, 3, 4]);
  session.feed_row(&[1, 5]).unwrap();
  let err = session.process_row(None, Some(&mut canvas));
  assert_eq!(err, Err(MngPixelError::PaletteIndex { index: 5, palette_len: 4 }));
  // nothing was drawn
  assert!(canvas.pixels().chunks_exact(4).all(|px| px == [1, 2, 3, 4]));
  assert!(session.update_region().is_empty());
}

#[test]
fn test_bad_palette_row_is_not_stored() {
  let header = ImageHeader { width: 2, height: 1, format: RawFormat::I8, interlaced: false };
  let mut target = ImageBuffer::try_new(2, 1, RawFormat::I8).unwrap();
  target.set_palette_bytes(&[9; 4 * 3]).unwrap();
  target.data_mut().copy_from_slice(&[2, 3]);
  let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, 2, 1).unwrap();
  for mode in [PipelineMode::Store, PipelineMode::StoreAndDisplay] {
    let mut session = Session::new();
    let geometry = DisplayGeometry::full(2, 1);
    session.begin_image(header, mode, geometry, Some(&mut target)).unwrap();
    session.feed_row(&[1, 5]).unwrap();
    let err = session.process_row(Some(&mut target), Some(&mut canvas));
    assert_eq!(err, Err(MngPixelError::PaletteIndex { index: 5, palette_len: 4 }), "{mode:?}");
    assert_eq!(target.data(), &[2, 3], "{mode:?}");
    assert!(canvas.pixels().iter().all(|b| *b == 0), "{mode:?}");
  }
}

static ROWS_DRAWN: AtomicUsize = AtomicUsize::new(0);

fn count_drawn_rows(notice: &RowNotice) {
  assert!(!notice.region.is_empty());
  assert!(notice.region.bottom > notice.canvas_row);
  ROWS_DRAWN.fetch_add(1, Ordering::Relaxed);
}

#[test]
fn test_row_hook_sees_every_drawn_row() {
  let header = ImageHeader { width: 8, height: 8, format: RawFormat::Y8, interlaced: true };
  let image = super::rand_bytes(64);
  let mut session = Session::new();
  session.set_row_hook(count_drawn_rows);
  // placed partly off the bottom of a 10x10 canvas
  let geometry = DisplayGeometry::placed(8, 8, 2, 6, 10, 10);
  session.begin_image(header, PipelineMode::DisplayOnly, geometry, None).unwrap();
  let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, 10, 10).unwrap();
  let rows = run_image(&mut session, &image, 1, None, Some(&mut canvas));
  assert_eq!(rows, 15);
  // image rows 0..4 are visible, which are 1+1+0+1+1+2+2 of the Adam7 rows
  assert_eq!(ROWS_DRAWN.load(Ordering::Relaxed), 8);
  assert_eq!(session.take_update_region(), UpdateRegion { left: 2, right: 10, top: 6, bottom: 10 });
  // gray lands in all three channels
  let y = image[0];
  assert_eq!(canvas.pixel(2, 6), Some([y, y, y, 255]));
  assert_eq!(canvas.pixel(1, 6), Some([0, 0, 0, 255]));
}

#[test]
fn test_stored_sub_byte_image_reads_back() {
  let header = ImageHeader { width: 5, height: 2, format: RawFormat::I2, interlaced: false };
  let mut target = ImageBuffer::try_new(5, 2, RawFormat::I2).unwrap();
  target.set_palette_bytes(&[10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40]).unwrap();
  target.set_transparency_bytes(&[255, 0]).unwrap();
  let mut session = Session::new();
  let geometry = DisplayGeometry::full(5, 2);
  session.begin_image(header, PipelineMode::Store, geometry, Some(&mut target)).unwrap();
  // indexes 0 1 2 3 0, then 3 3 3 3 1
  for row in [[0b0001_1011, 0b0000_0000], [0b1111_1111, 0b0100_0000]] {
    session.feed_row(&row).unwrap();
    session.process_row(Some(&mut target), None).unwrap();
    session.next_row();
  }
  assert!(session.is_done());
  assert_eq!(target.data(), &[0, 1, 2, 3, 0, 3, 3, 3, 3, 1]);

  let bitmap = target.to_bitmap().unwrap();
  let rgba = |v: u8, a: u8| pixel_formats::r8g8b8a8_Srgb { r: v, g: v, b: v, a };
  assert_eq!(bitmap.get(0, 0), Some(&rgba(10, 255)));
  assert_eq!(bitmap.get(1, 0), Some(&rgba(20, 0)));
  assert_eq!(bitmap.get(4, 1), Some(&rgba(20, 0)));

  let mut canvas = VecCanvas::try_new(CanvasStyle::RGBA8, 5, 2).unwrap();
  canvas.fill([0, 0, 0, 255]);
  session.set_geometry(DisplayGeometry::full(5, 2));
  assert_eq!(session.display_buffer_row(&target, 1, &mut canvas), Ok(Some(1)));
  assert_eq!(canvas.pixel(0, 1), Some([40, 40, 40, 255]));
  // the transparent index leaves the canvas alone
  assert_eq!(canvas.pixel(4, 1), Some([0, 0, 0, 255]));
}

#[cfg(feature = "promote")]
#[test]
fn test_promoted_buffer_keeps_its_look() {
  let mut target = ImageBuffer::try_new(2, 1, RawFormat::Y4).unwrap();
  target.data_mut().copy_from_slice(&[0x3, 0xC]);
  target.transparency = Transparency::Y(0xC);
  promote_in_place(&mut target, RawFormat::RGBA16, FillMethod::LeftBitReplicate).unwrap();
  let bitmap = target.to_bitmap().unwrap();
  let px = |v: u8, a: u8| pixel_formats::r8g8b8a8_Srgb { r: v, g: v, b: v, a };
  assert_eq!(bitmap.pixels, vec![px(0x33, 255), px(0xCC, 0)]);
}
