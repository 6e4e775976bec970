use mngpix::*;

#[test]
fn test_over_is_associative_onto_opaque_backdrop() {
  // Integer truncation in the general blend weights compounds across two
  // blends, so the two orders can drift apart by a few units.
  const TOLERANCE: i32 = 3;
  let bytes = super::rand_bytes(11 * 4096);
  for chunk in bytes.chunks_exact(11) {
    let a = [chunk[0], chunk[1], chunk[2], chunk[3]];
    let b = [chunk[4], chunk[5], chunk[6], chunk[7]];
    let c = [chunk[8], chunk[9], chunk[10], 255];
    let one_pass = compose_straight(a, compose_straight(b, c));
    let pre_composed = compose_straight(compose_straight(a, b), c);
    for (x, y) in one_pass.iter().zip(pre_composed.iter()) {
      let diff = (i32::from(*x) - i32::from(*y)).abs();
      assert!(diff <= TOLERANCE, "a:{a:?} b:{b:?} c:{c:?} => {one_pass:?} vs {pre_composed:?}");
    }
  }
}

#[test]
fn test_transparent_and_opaque_foregrounds() {
  let bytes = super::rand_bytes(8 * 1024);
  for chunk in bytes.chunks_exact(8) {
    let bg = [chunk[0], chunk[1], chunk[2], chunk[3]];
    let fg = [chunk[4], chunk[5], chunk[6], 0];
    assert_eq!(compose_straight(fg, bg), bg);
    assert_eq!(compose_premultiplied(fg, bg), bg);
    let fg = [chunk[4], chunk[5], chunk[6], 255];
    assert_eq!(compose_straight(fg, bg), fg);
    assert_eq!(simple_composite(fg, bg), fg);
  }
}

#[test]
fn test_opaque_rows_copy_bytes() {
  let width = 37;
  let mut bytes = super::rand_bytes(width * 4);
  for px in bytes.chunks_exact_mut(4) {
    px[3] = 255;
  }
  let pixels: Vec<[u8; 4]> = bytes.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]).collect();
  let mut row = CanonicalRow::from_rgba8(pixels);
  assert!(row.update_opacity());
  let geometry = DisplayGeometry::full(width as u32, 1);
  let pos = RowPosition { row: 0, col: 0, col_inc: 1 };

  let mut canvas = VecCanvas::try_new(CanvasStyle::RGBA8, width as u32, 1).unwrap();
  canvas.fill([9, 9, 9, 9]);
  let mut region = UpdateRegion::EMPTY;
  composite_row(&row, &mut canvas, &geometry, pos, &mut region).unwrap();
  assert_eq!(canvas.pixels(), bytes.as_slice());
  assert_eq!(region, UpdateRegion { left: 0, right: width as u32, top: 0, bottom: 1 });

  let mut canvas = VecCanvas::try_new(CanvasStyle::BGRA8, width as u32, 1).unwrap();
  composite_row(&row, &mut canvas, &geometry, pos, &mut region).unwrap();
  for (x, px) in bytes.chunks_exact(4).enumerate() {
    assert_eq!(canvas.pixel(x as u32, 0), Some([px[0], px[1], px[2], px[3]]));
  }
}

#[test]
fn test_every_style_stores_an_opaque_pixel() {
  // these values survive 5 and 6 bit channels exactly
  let px = [0xF8, 0x80, 0x08, 0xFF];
  let row = CanonicalRow::from_rgba8(vec![px]);
  for style in CanvasStyle::ALL {
    let mut canvas = VecCanvas::try_new(style, 1, 1).unwrap();
    canvas.fill([0, 0, 0, 255]);
    let mut region = UpdateRegion::EMPTY;
    let pos = RowPosition { row: 0, col: 0, col_inc: 1 };
    let geometry = DisplayGeometry::full(1, 1);
    let drawn = composite_row(&row, &mut canvas, &geometry, pos, &mut region).unwrap();
    assert_eq!(drawn, Some(0));
    assert_eq!(canvas.pixel(0, 0), Some(px), "{style:?}");
  }
}

#[test]
fn test_half_alpha_over_opaque_green_in_byte_styles() {
  let row = CanonicalRow::from_rgba8(vec![[255, 0, 0, 128]]);
  for style in CanvasStyle::ALL {
    if matches!(
      style,
      CanvasStyle::RGB565
        | CanvasStyle::RGBA565
        | CanvasStyle::BGR565
        | CanvasStyle::BGRA565
        | CanvasStyle::BGR565_A8
        | CanvasStyle::RGB555
        | CanvasStyle::BGR555
    ) {
      continue;
    }
    let mut canvas = VecCanvas::try_new(style, 1, 1).unwrap();
    canvas.fill([0, 255, 0, 255]);
    let mut region = UpdateRegion::EMPTY;
    let pos = RowPosition { row: 0, col: 0, col_inc: 1 };
    composite_row(&row, &mut canvas, &DisplayGeometry::full(1, 1), pos, &mut region).unwrap();
    assert_eq!(canvas.pixel(0, 0), Some([128, 127, 0, 255]), "{style:?}");
  }
}
