#![forbid(unsafe_code)]

//! Host canvases and the byte layouts of their pixels.
//!
//! The host owns the canvas and picks its [`CanvasStyle`]. Each style is
//! backed by one [`PixelLayout`] type that knows how to read and write a
//! single pixel's bytes. Colors always pass through a layout as `[r, g, b, a]`
//! at 8 bits per channel. Layouts without alpha read alpha as 255 and ignore
//! it on write.
//!
//! Styles with a separate alpha plane (`RGB8_A8` and `BGR565_A8`) keep alpha in
//! a second buffer with one byte per pixel, see [`CanvasLine`].

use alloc::vec::Vec;

use crate::{MngPixelError, MngResult};

/// Runs `$body` with `$L` as the [`PixelLayout`] type of a [`CanvasStyle`].
macro_rules! with_layout {
  ($style:expr, $L:ident => $body:expr) => {
    match $style {
      $crate::CanvasStyle::RGB8 => {
        type $L = $crate::canvas::Rgb8;
        $body
      }
      $crate::CanvasStyle::RGBA8 => {
        type $L = $crate::canvas::Rgba8;
        $body
      }
      $crate::CanvasStyle::RGBA8_PM => {
        type $L = $crate::canvas::RgbaPm8;
        $body
      }
      $crate::CanvasStyle::ARGB8 => {
        type $L = $crate::canvas::Argb8;
        $body
      }
      $crate::CanvasStyle::ARGB8_PM => {
        type $L = $crate::canvas::ArgbPm8;
        $body
      }
      $crate::CanvasStyle::RGB8_A8 => {
        type $L = $crate::canvas::Rgb8A8;
        $body
      }
      $crate::CanvasStyle::BGR8 => {
        type $L = $crate::canvas::Bgr8;
        $body
      }
      $crate::CanvasStyle::BGRX8 => {
        type $L = $crate::canvas::Bgrx8;
        $body
      }
      $crate::CanvasStyle::BGRA8 => {
        type $L = $crate::canvas::Bgra8;
        $body
      }
      $crate::CanvasStyle::BGRA8_PM => {
        type $L = $crate::canvas::BgraPm8;
        $body
      }
      $crate::CanvasStyle::ABGR8 => {
        type $L = $crate::canvas::Abgr8;
        $body
      }
      $crate::CanvasStyle::ABGR8_PM => {
        type $L = $crate::canvas::AbgrPm8;
        $body
      }
      $crate::CanvasStyle::RGB565 => {
        type $L = $crate::canvas::Rgb565;
        $body
      }
      $crate::CanvasStyle::RGBA565 => {
        type $L = $crate::canvas::Rgba565;
        $body
      }
      $crate::CanvasStyle::BGR565 => {
        type $L = $crate::canvas::Bgr565;
        $body
      }
      $crate::CanvasStyle::BGRA565 => {
        type $L = $crate::canvas::Bgra565;
        $body
      }
      $crate::CanvasStyle::BGR565_A8 => {
        type $L = $crate::canvas::Bgr565A8;
        $body
      }
      $crate::CanvasStyle::RGB555 => {
        type $L = $crate::canvas::Rgb555;
        $body
      }
      $crate::CanvasStyle::BGR555 => {
        type $L = $crate::canvas::Bgr555;
        $body
      }
    }
  };
}
pub(crate) use with_layout;

/// The pixel layouts a host canvas can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
#[allow(missing_docs)]
pub enum CanvasStyle {
  RGB8,
  RGBA8,
  RGBA8_PM,
  ARGB8,
  ARGB8_PM,
  RGB8_A8,
  BGR8,
  BGRX8,
  BGRA8,
  BGRA8_PM,
  ABGR8,
  ABGR8_PM,
  RGB565,
  RGBA565,
  BGR565,
  BGRA565,
  BGR565_A8,
  RGB555,
  BGR555,
}
impl CanvasStyle {
  /// Every style, in code order.
  pub const ALL: [Self; 19] = [
    Self::RGB8,
    Self::RGBA8,
    Self::RGBA8_PM,
    Self::ARGB8,
    Self::ARGB8_PM,
    Self::RGB8_A8,
    Self::BGR8,
    Self::BGRX8,
    Self::BGRA8,
    Self::BGRA8_PM,
    Self::ABGR8,
    Self::ABGR8_PM,
    Self::RGB565,
    Self::RGBA565,
    Self::BGR565,
    Self::BGRA565,
    Self::BGR565_A8,
    Self::RGB555,
    Self::BGR555,
  ];

  /// Looks up a style by its MNG canvas code.
  ///
  /// ## Failure
  /// * Unknown codes, and the 16-bit canvas codes, give
  ///   [`MngPixelError::UnsupportedCanvas`].
  pub const fn from_code(code: u32) -> MngResult<Self> {
    let mut i = 0;
    while i < Self::ALL.len() {
      if Self::ALL[i].code() == code {
        return Ok(Self::ALL[i]);
      }
      i += 1;
    }
    Err(MngPixelError::UnsupportedCanvas(code))
  }

  /// The MNG canvas code for this style.
  #[inline]
  #[must_use]
  pub const fn code(self) -> u32 {
    match self {
      Self::RGB8 => 0x0000_0000,
      Self::RGBA8 => 0x0000_1000,
      Self::RGBA8_PM => 0x0000_9000,
      Self::ARGB8 => 0x0000_3000,
      Self::ARGB8_PM => 0x0000_B000,
      Self::RGB8_A8 => 0x0000_5000,
      Self::BGR8 => 0x0000_0001,
      Self::BGRX8 => 0x0001_0001,
      Self::BGRA8 => 0x0000_1001,
      Self::BGRA8_PM => 0x0000_9001,
      Self::ABGR8 => 0x0000_3001,
      Self::ABGR8_PM => 0x0000_B001,
      Self::RGB565 => 0x0000_0005,
      Self::RGBA565 => 0x0000_1005,
      Self::BGR565 => 0x0000_0006,
      Self::BGRA565 => 0x0000_1006,
      Self::BGR565_A8 => 0x0000_4006,
      Self::RGB555 => 0x0000_0007,
      Self::BGR555 => 0x0000_0008,
    }
  }

  /// Bytes per pixel in the main pixel buffer (not counting an alpha plane).
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    match self {
      Self::RGB8 | Self::RGB8_A8 | Self::BGR8 | Self::RGBA565 | Self::BGRA565 => 3,
      Self::RGB565 | Self::BGR565 | Self::BGR565_A8 | Self::RGB555 | Self::BGR555 => 2,
      _ => 4,
    }
  }

  /// If the canvas keeps alpha at all (interleaved or as a plane).
  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    !matches!(
      self,
      Self::RGB8
        | Self::BGR8
        | Self::BGRX8
        | Self::RGB565
        | Self::BGR565
        | Self::RGB555
        | Self::BGR555
    )
  }

  /// If alpha is kept in a separate plane, one byte per pixel.
  #[inline]
  #[must_use]
  pub const fn has_alpha_plane(self) -> bool {
    matches!(self, Self::RGB8_A8 | Self::BGR565_A8)
  }

  /// If stored colors are premultiplied by alpha.
  #[inline]
  #[must_use]
  pub const fn is_premultiplied(self) -> bool {
    matches!(self, Self::RGBA8_PM | Self::ARGB8_PM | Self::BGRA8_PM | Self::ABGR8_PM)
  }

  /// Reads one pixel of this style as `[r, g, b, a]`.
  ///
  /// Alpha planes aren't visible here, so plane styles read alpha as 255.
  #[inline]
  #[must_use]
  pub fn read_pixel(self, px: &[u8]) -> [u8; 4] {
    with_layout!(self, L => L::read_pixel(px))
  }

  /// Writes one pixel of this style from `[r, g, b, a]`.
  #[inline]
  pub fn write_pixel(self, px: &mut [u8], rgba: [u8; 4]) {
    with_layout!(self, L => L::write_pixel(px, rgba))
  }
}

/// How one pixel of a canvas style is laid out in bytes.
pub trait PixelLayout {
  /// Bytes per pixel in the main buffer.
  const BYTES: usize;
  /// If the stored color is premultiplied by alpha.
  const PREMULTIPLIED: bool = false;
  /// If alpha lives in a separate plane.
  const ALPHA_PLANE: bool = false;

  /// Reads `[r, g, b, a]` out of the first [`BYTES`](Self::BYTES) bytes of
  /// `px`.
  fn read_pixel(px: &[u8]) -> [u8; 4];

  /// Writes `[r, g, b, a]` into the first [`BYTES`](Self::BYTES) bytes of
  /// `px`.
  fn write_pixel(px: &mut [u8], rgba: [u8; 4]);
}

macro_rules! byte_layout {
  (
    $(#[$m:meta])*
    $name:ident {
      bytes: $n:literal, r: $r:literal, g: $g:literal, b: $b:literal, a: $a:literal, pm: $pm:literal
    }
  ) => {
    $(#[$m])*
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct $name;
    impl PixelLayout for $name {
      const BYTES: usize = $n;
      const PREMULTIPLIED: bool = $pm;
      #[inline]
      fn read_pixel(px: &[u8]) -> [u8; 4] {
        [px[$r], px[$g], px[$b], px[$a]]
      }
      #[inline]
      fn write_pixel(px: &mut [u8], [r, g, b, a]: [u8; 4]) {
        px[$r] = r;
        px[$g] = g;
        px[$b] = b;
        px[$a] = a;
      }
    }
  };
  (
    $(#[$m:meta])*
    $name:ident { bytes: $n:literal, r: $r:literal, g: $g:literal, b: $b:literal }
  ) => {
    $(#[$m])*
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct $name;
    impl PixelLayout for $name {
      const BYTES: usize = $n;
      #[inline]
      fn read_pixel(px: &[u8]) -> [u8; 4] {
        [px[$r], px[$g], px[$b], u8::MAX]
      }
      #[inline]
      fn write_pixel(px: &mut [u8], [r, g, b, _]: [u8; 4]) {
        px[$r] = r;
        px[$g] = g;
        px[$b] = b;
      }
    }
  };
}

byte_layout!(
  /// `RGB8`
  Rgb8 { bytes: 3, r: 0, g: 1, b: 2 }
);
byte_layout!(
  /// `RGBA8`
  Rgba8 { bytes: 4, r: 0, g: 1, b: 2, a: 3, pm: false }
);
byte_layout!(
  /// `RGBA8_PM`
  RgbaPm8 { bytes: 4, r: 0, g: 1, b: 2, a: 3, pm: true }
);
byte_layout!(
  /// `ARGB8`
  Argb8 { bytes: 4, r: 1, g: 2, b: 3, a: 0, pm: false }
);
byte_layout!(
  /// `ARGB8_PM`
  ArgbPm8 { bytes: 4, r: 1, g: 2, b: 3, a: 0, pm: true }
);
byte_layout!(
  /// `BGR8`
  Bgr8 { bytes: 3, r: 2, g: 1, b: 0 }
);
byte_layout!(
  /// `BGRA8`
  Bgra8 { bytes: 4, r: 2, g: 1, b: 0, a: 3, pm: false }
);
byte_layout!(
  /// `BGRA8_PM`
  BgraPm8 { bytes: 4, r: 2, g: 1, b: 0, a: 3, pm: true }
);
byte_layout!(
  /// `ABGR8`
  Abgr8 { bytes: 4, r: 3, g: 2, b: 1, a: 0, pm: false }
);
byte_layout!(
  /// `ABGR8_PM`
  AbgrPm8 { bytes: 4, r: 3, g: 2, b: 1, a: 0, pm: true }
);

/// `BGRX8`: the fourth byte is padding, always written as `0xFF`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bgrx8;
impl PixelLayout for Bgrx8 {
  const BYTES: usize = 4;
  #[inline]
  fn read_pixel(px: &[u8]) -> [u8; 4] {
    [px[2], px[1], px[0], u8::MAX]
  }
  #[inline]
  fn write_pixel(px: &mut [u8], [r, g, b, _]: [u8; 4]) {
    px[0] = b;
    px[1] = g;
    px[2] = r;
    px[3] = u8::MAX;
  }
}

/// `RGB8_A8`: RGB8 pixels with a separate alpha plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb8A8;
impl PixelLayout for Rgb8A8 {
  const BYTES: usize = 3;
  const ALPHA_PLANE: bool = true;
  #[inline]
  fn read_pixel(px: &[u8]) -> [u8; 4] {
    Rgb8::read_pixel(px)
  }
  #[inline]
  fn write_pixel(px: &mut [u8], rgba: [u8; 4]) {
    Rgb8::write_pixel(px, rgba)
  }
}

/// Packs 8-bit channels into a little-endian 5-6-5 value, with `hi` in the
/// top 5 bits.
#[inline]
#[must_use]
pub const fn pack_565(hi: u8, g: u8, lo: u8) -> [u8; 2] {
  let v = (((hi as u16) >> 3) << 11) | (((g as u16) >> 2) << 5) | ((lo as u16) >> 3);
  v.to_le_bytes()
}

/// Unpacks a little-endian 5-6-5 value as `[hi, g, lo]`, leaving the low
/// bits of each channel zero.
#[inline]
#[must_use]
pub const fn unpack_565(bytes: [u8; 2]) -> [u8; 3] {
  let [l, h] = bytes;
  [h & 0xF8, (h << 5) | ((l & 0xE0) >> 3), l << 3]
}

/// Packs 8-bit channels into a little-endian 5-5-5 value (top bit clear),
/// with `hi` in the top 5 bits.
#[inline]
#[must_use]
pub const fn pack_555(hi: u8, g: u8, lo: u8) -> [u8; 2] {
  let v = (((hi as u16) >> 3) << 10) | (((g as u16) >> 3) << 5) | ((lo as u16) >> 3);
  v.to_le_bytes()
}

/// Unpacks a little-endian 5-5-5 value as `[hi, g, lo]`.
#[inline]
#[must_use]
pub const fn unpack_555(bytes: [u8; 2]) -> [u8; 3] {
  let [l, h] = bytes;
  [(h & 0x7C) << 1, (h << 6) | ((l & 0xE0) >> 2), l << 3]
}

macro_rules! packed_layout {
  (
    $(#[$m:meta])*
    $name:ident {
      bytes: $n:literal, pack: $pack:ident, unpack: $unpack:ident,
      swap: $swap:literal, alpha: $alpha:literal, plane: $plane:literal
    }
  ) => {
    $(#[$m])*
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct $name;
    impl PixelLayout for $name {
      const BYTES: usize = $n;
      const ALPHA_PLANE: bool = $plane;
      #[inline]
      fn read_pixel(px: &[u8]) -> [u8; 4] {
        let [hi, g, lo] = $unpack([px[0], px[1]]);
        let a = if $alpha { px[2] } else { u8::MAX };
        if $swap {
          [lo, g, hi, a]
        } else {
          [hi, g, lo, a]
        }
      }
      #[inline]
      fn write_pixel(px: &mut [u8], [r, g, b, a]: [u8; 4]) {
        let [l, h] = if $swap { $pack(b, g, r) } else { $pack(r, g, b) };
        px[0] = l;
        px[1] = h;
        if $alpha {
          px[2] = a;
        }
      }
    }
  };
}

packed_layout!(
  /// `RGB565`: red in the top bits.
  Rgb565 { bytes: 2, pack: pack_565, unpack: unpack_565, swap: false, alpha: false, plane: false }
);
packed_layout!(
  /// `RGBA565`: `RGB565` then one alpha byte.
  Rgba565 { bytes: 3, pack: pack_565, unpack: unpack_565, swap: false, alpha: true, plane: false }
);
packed_layout!(
  /// `BGR565`: blue in the top bits.
  Bgr565 { bytes: 2, pack: pack_565, unpack: unpack_565, swap: true, alpha: false, plane: false }
);
packed_layout!(
  /// `BGRA565`: `BGR565` then one alpha byte.
  Bgra565 { bytes: 3, pack: pack_565, unpack: unpack_565, swap: true, alpha: true, plane: false }
);
packed_layout!(
  /// `BGR565_A8`: `BGR565` with a separate alpha plane.
  Bgr565A8 { bytes: 2, pack: pack_565, unpack: unpack_565, swap: true, alpha: false, plane: true }
);
packed_layout!(
  /// `RGB555`: red in the top bits.
  Rgb555 { bytes: 2, pack: pack_555, unpack: unpack_555, swap: false, alpha: false, plane: false }
);
packed_layout!(
  /// `BGR555`: blue in the top bits.
  Bgr555 { bytes: 2, pack: pack_555, unpack: unpack_555, swap: true, alpha: false, plane: false }
);

/// One borrowed row of a canvas.
#[derive(Debug)]
pub struct CanvasLine<'a> {
  /// The row's pixel bytes.
  pub pixels: &'a mut [u8],
  /// The row's alpha plane, for styles that have one.
  pub alpha: Option<&'a mut [u8]>,
}

/// A host-owned drawing surface.
pub trait Canvas {
  /// The pixel layout of every line.
  fn style(&self) -> CanvasStyle;

  /// Borrows one row of the canvas, or `None` if it doesn't exist.
  fn get_line(&mut self, row: u32) -> Option<CanvasLine<'_>>;
}

/// A canvas that keeps its pixels in a `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecCanvas {
  style: CanvasStyle,
  width: u32,
  height: u32,
  pixels: Vec<u8>,
  alpha: Vec<u8>,
}
impl VecCanvas {
  /// Allocates a zeroed canvas.
  pub fn try_new(style: CanvasStyle, width: u32, height: u32) -> MngResult<Self> {
    let count =
      usize::try_from(width)?
        .checked_mul(usize::try_from(height)?)
        .ok_or(MngPixelError::DimensionsTooLarge)?;
    let bytes =
      count.checked_mul(style.bytes_per_pixel()).ok_or(MngPixelError::DimensionsTooLarge)?;
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(bytes)?;
    pixels.resize(bytes, 0);
    let mut alpha = Vec::new();
    if style.has_alpha_plane() {
      alpha.try_reserve_exact(count)?;
      alpha.resize(count, 0);
    }
    Ok(Self { style, width, height, pixels, alpha })
  }

  /// Width in pixels.
  #[inline]
  #[must_use]
  pub fn width(&self) -> u32 {
    self.width
  }

  /// Height in pixels.
  #[inline]
  #[must_use]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// All pixel bytes.
  #[inline]
  #[must_use]
  pub fn pixels(&self) -> &[u8] {
    &self.pixels
  }

  /// All pixel bytes, mutably.
  #[inline]
  pub fn pixels_mut(&mut self) -> &mut [u8] {
    &mut self.pixels
  }

  /// The alpha plane (empty unless the style has one).
  #[inline]
  #[must_use]
  pub fn alpha_plane(&self) -> &[u8] {
    &self.alpha
  }

  /// Reads the pixel at `(x, y)` as `[r, g, b, a]`, including alpha plane
  /// data.
  #[must_use]
  pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= self.width || y >= self.height {
      return None;
    }
    let i = (y as usize) * (self.width as usize) + (x as usize);
    let bpp = self.style.bytes_per_pixel();
    let mut rgba = self.style.read_pixel(self.pixels.get(i * bpp..(i + 1) * bpp)?);
    if self.style.has_alpha_plane() {
      rgba[3] = *self.alpha.get(i)?;
    }
    Some(rgba)
  }

  /// Writes the pixel at `(x, y)`, including alpha plane data.
  pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
    if x >= self.width || y >= self.height {
      return;
    }
    let i = (y as usize) * (self.width as usize) + (x as usize);
    let bpp = self.style.bytes_per_pixel();
    if let Some(px) = self.pixels.get_mut(i * bpp..(i + 1) * bpp) {
      self.style.write_pixel(px, rgba);
    }
    if let Some(a) = self.alpha.get_mut(i) {
      *a = rgba[3];
    }
  }

  /// Sets every pixel to the same value.
  pub fn fill(&mut self, rgba: [u8; 4]) {
    let bpp = self.style.bytes_per_pixel();
    for px in self.pixels.chunks_exact_mut(bpp) {
      self.style.write_pixel(px, rgba);
    }
    self.alpha.fill(rgba[3]);
  }
}
impl Canvas for VecCanvas {
  #[inline]
  fn style(&self) -> CanvasStyle {
    self.style
  }
  fn get_line(&mut self, row: u32) -> Option<CanvasLine<'_>> {
    if row >= self.height {
      return None;
    }
    let w = self.width as usize;
    let stride = w * self.style.bytes_per_pixel();
    let start = row as usize * stride;
    let pixels = self.pixels.get_mut(start..start + stride)?;
    let alpha = if self.style.has_alpha_plane() {
      Some(self.alpha.get_mut(row as usize * w..(row as usize + 1) * w)?)
    } else {
      None
    };
    Some(CanvasLine { pixels, alpha })
  }
}

#[test]
fn test_canvas_codes_round_trip() {
  for style in CanvasStyle::ALL {
    assert_eq!(CanvasStyle::from_code(style.code()), Ok(style));
    assert_eq!(with_layout!(style, L => L::BYTES), style.bytes_per_pixel(), "{style:?}");
    assert_eq!(with_layout!(style, L => L::PREMULTIPLIED), style.is_premultiplied());
    assert_eq!(with_layout!(style, L => L::ALPHA_PLANE), style.has_alpha_plane());
  }
  // 16-bit RGBA isn't a supported canvas
  assert_eq!(CanvasStyle::from_code(0x0000_1010), Err(MngPixelError::UnsupportedCanvas(0x1010)));
}

#[test]
fn test_byte_orders() {
  let mut px = [0_u8; 4];
  Argb8::write_pixel(&mut px, [1, 2, 3, 4]);
  assert_eq!(px, [4, 1, 2, 3]);
  Abgr8::write_pixel(&mut px, [1, 2, 3, 4]);
  assert_eq!(px, [4, 3, 2, 1]);
  Bgra8::write_pixel(&mut px, [1, 2, 3, 4]);
  assert_eq!(px, [3, 2, 1, 4]);
  Bgrx8::write_pixel(&mut px, [1, 2, 3, 4]);
  assert_eq!(px, [3, 2, 1, 0xFF]);
  assert_eq!(Bgrx8::read_pixel(&px), [1, 2, 3, 0xFF]);
  let mut px = [9_u8; 3];
  Bgr8::write_pixel(&mut px, [1, 2, 3, 4]);
  assert_eq!(px, [3, 2, 1]);
  assert_eq!(Rgb8::read_pixel(&[5, 6, 7]), [5, 6, 7, 0xFF]);
}

#[test]
fn test_packed_layouts() {
  // pure red
  assert_eq!(pack_565(0xFF, 0, 0), [0x00, 0xF8]);
  assert_eq!(pack_555(0xFF, 0, 0), [0x00, 0x7C]);
  // pure green
  assert_eq!(pack_565(0, 0xFF, 0), [0xE0, 0x07]);
  assert_eq!(pack_555(0, 0xFF, 0), [0xE0, 0x03]);
  let mut px = [0_u8; 3];
  Bgra565::write_pixel(&mut px, [0xFF, 0, 0x08, 0x77]);
  assert_eq!(px, [0x1F, 0x08, 0x77]);
  assert_eq!(Bgra565::read_pixel(&px), [0xF8, 0, 0x08, 0x77]);
  let styles = [CanvasStyle::RGB565, CanvasStyle::BGR565, CanvasStyle::RGB555, CanvasStyle::BGR555];
  for style in styles {
    let mut px = [0_u8; 2];
    style.write_pixel(&mut px, [0xAB, 0xCD, 0xEF, 0x00]);
    let back = style.read_pixel(&px);
    // the low bits are lost, the high bits survive
    assert_eq!(back[0], 0xA8, "{style:?}");
    assert_eq!(back[2], 0xE8, "{style:?}");
    assert_eq!(back[3], 0xFF);
    let mut again = [0_u8; 2];
    style.write_pixel(&mut again, back);
    assert_eq!(again, px, "{style:?}");
  }
}

#[test]
fn test_vec_canvas_alpha_plane() {
  let mut c = VecCanvas::try_new(CanvasStyle::BGR565_A8, 2, 2).unwrap();
  c.set_pixel(1, 1, [0xF8, 0xFC, 0xF8, 0x40]);
  assert_eq!(c.pixel(1, 1), Some([0xF8, 0xFC, 0xF8, 0x40]));
  assert_eq!(c.alpha_plane(), &[0, 0, 0, 0x40]);
  let line = c.get_line(1).unwrap();
  assert_eq!(line.pixels.len(), 4);
  assert_eq!(line.alpha.map(|a| a.len()), Some(2));
  assert!(c.get_line(2).is_none());
  assert!(c.pixel(2, 0).is_none());
}
