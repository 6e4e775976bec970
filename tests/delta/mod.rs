use mngpix::*;

use crate::pipeline::run_image;

fn begin_delta(
  session: &mut Session, header: ImageHeader, desc: DeltaDescriptor, target: &mut ImageBuffer,
) -> MngResult<()> {
  let geometry = DisplayGeometry::full(target.width(), target.height());
  session.begin_image(header, PipelineMode::Delta(desc), geometry, Some(target))
}

fn header(width: u32, height: u32, format: RawFormat) -> ImageHeader {
  ImageHeader { width, height, format, interlaced: false }
}

#[test]
fn test_whole_replace_copies_payload() {
  let mut target = ImageBuffer::try_new(2, 2, RawFormat::Y8).unwrap();
  target.data_mut().copy_from_slice(&[1, 2, 3, 4]);
  let mut session = Session::new();
  let replace = DeltaDescriptor::replace();
  begin_delta(&mut session, header(2, 2, RawFormat::Y8), replace, &mut target).unwrap();
  let payload = [9, 8, 7, 6];
  run_image(&mut session, &payload, 1, Some(&mut target), None);
  assert_eq!(target.data(), &payload);
}

#[test]
fn test_whole_replace_can_change_format() {
  let mut target = ImageBuffer::try_new(4, 4, RawFormat::Y8).unwrap();
  let mut session = Session::new();
  let replace = DeltaDescriptor::replace();
  begin_delta(&mut session, header(2, 1, RawFormat::RGB8), replace, &mut target).unwrap();
  assert_eq!((target.width(), target.height(), target.format()), (2, 1, RawFormat::RGB8));
  let payload = [1, 2, 3, 4, 5, 6];
  run_image(&mut session, &payload, 3, Some(&mut target), None);
  assert_eq!(target.data(), &payload);
}

#[test]
fn test_pixel_add_scales_up_then_wraps() {
  let mut target = ImageBuffer::try_new(2, 1, RawFormat::Y8).unwrap();
  target.data_mut().copy_from_slice(&[0xF0, 0x10]);
  let mut session = Session::new();
  let desc = DeltaDescriptor { kind: DeltaKind::PixelAdd, block_x: 0, block_y: 0 };
  begin_delta(&mut session, header(2, 1, RawFormat::Y4), desc, &mut target).unwrap();
  session.feed_row(&[0x12]).unwrap();
  session.process_row(Some(&mut target), None).unwrap();
  // 0x1 and 0x2 become 0x11 and 0x22 before adding
  assert_eq!(target.data(), &[0x01, 0x32]);
}

#[test]
fn test_block_lands_at_its_origin_and_is_drawn() {
  let mut target = ImageBuffer::try_new(3, 3, RawFormat::Y8).unwrap();
  let mut canvas = VecCanvas::try_new(CanvasStyle::RGB8, 3, 3).unwrap();
  let mut session = Session::new();
  let desc = DeltaDescriptor { kind: DeltaKind::PixelReplace, block_x: 1, block_y: 1 };
  begin_delta(&mut session, header(1, 1, RawFormat::Y8), desc, &mut target).unwrap();
  session.feed_row(&[0x55]).unwrap();
  session.process_row(Some(&mut target), Some(&mut canvas)).unwrap();
  assert_eq!(target.data(), &[0, 0, 0, 0, 0x55, 0, 0, 0, 0]);
  assert_eq!(canvas.pixel(1, 1), Some([0x55, 0x55, 0x55, 255]));
  assert_eq!(session.take_update_region(), UpdateRegion { left: 0, right: 3, top: 1, bottom: 2 });
}

#[test]
fn test_alpha_replace_from_gray_delta() {
  let mut target = ImageBuffer::try_new(2, 1, RawFormat::RGBA8).unwrap();
  target.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
  let mut session = Session::new();
  let desc = DeltaDescriptor { kind: DeltaKind::AlphaReplace, block_x: 0, block_y: 0 };
  begin_delta(&mut session, header(2, 1, RawFormat::Y8), desc, &mut target).unwrap();
  session.feed_row(&[0x40, 0x41]).unwrap();
  session.process_row(Some(&mut target), None).unwrap();
  assert_eq!(target.data(), &[1, 2, 3, 0x40, 5, 6, 7, 0x41]);
}

#[test]
fn test_interlaced_pixel_replace_fills_target() {
  let image = super::rand_bytes(8 * 8);
  let mut target = ImageBuffer::try_new(8, 8, RawFormat::Y8).unwrap();
  let mut session = Session::new();
  let desc = DeltaDescriptor { kind: DeltaKind::PixelReplace, block_x: 0, block_y: 0 };
  let header = ImageHeader { width: 8, height: 8, format: RawFormat::Y8, interlaced: true };
  begin_delta(&mut session, header, desc, &mut target).unwrap();
  run_image(&mut session, &image, 1, Some(&mut target), None);
  assert_eq!(target.data(), image.as_slice());
}

#[test]
fn test_no_change_leaves_target_alone() {
  let mut target = ImageBuffer::try_new(2, 1, RawFormat::Y8).unwrap();
  target.data_mut().copy_from_slice(&[1, 2]);
  let mut session = Session::new();
  let desc = DeltaDescriptor { kind: DeltaKind::NoChange, block_x: 0, block_y: 0 };
  begin_delta(&mut session, header(2, 1, RawFormat::Y8), desc, &mut target).unwrap();
  run_image(&mut session, &[7, 7], 1, Some(&mut target), None);
  assert_eq!(target.data(), &[1, 2]);
}

#[test]
fn test_mismatched_delta_is_rejected() {
  let mut target = ImageBuffer::try_new(2, 1, RawFormat::I8).unwrap();
  let mut session = Session::new();
  let desc = DeltaDescriptor { kind: DeltaKind::ColorAdd, block_x: 0, block_y: 0 };
  let err = begin_delta(&mut session, header(2, 1, RawFormat::RGB8), desc, &mut target);
  assert!(matches!(err, Err(MngPixelError::ContractViolation(_))));
  let desc = DeltaDescriptor { kind: DeltaKind::PixelAdd, block_x: 0, block_y: 0 };
  let err = begin_delta(&mut session, header(2, 1, RawFormat::I4), desc, &mut target);
  assert!(matches!(err, Err(MngPixelError::ContractViolation(_))));
}
