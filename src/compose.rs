#![forbid(unsafe_code)]

//! The fixed-point alpha math.
//!
//! Everything here works on one RGBA pixel at a time, at either channel width.
//! Intermediate values are `u64`, so no product of two 16-bit channels (or of
//! a channel and a blend weight) can overflow.
//!
//! There's two kinds of destination:
//! * **Straight** alpha, where the stored color doesn't depend on alpha. Use
//!   [`compose_straight`].
//! * **Premultiplied** alpha, where the stored color has already been scaled by
//!   `alpha / max`. Use [`compose_premultiplied`].

use crate::Channel;

/// Foreground over an opaque background, for one channel.
///
/// `round_div_max(fg * fa + bg * (max - fa))`
#[inline]
#[must_use]
pub fn composite_channel<C: Channel>(fg: C, fa: C, bg: C) -> C {
  let max = C::max_u64();
  let fa = fa.to_u64();
  C::from_u64(C::round_div_max(fg.to_u64() * fa + bg.to_u64() * (max - fa)))
}

/// Foreground over an opaque background, for a whole pixel.
///
/// The output is always opaque.
#[inline]
#[must_use]
pub fn simple_composite<C: Channel>(fg: [C; 4], bg: [C; 4]) -> [C; 4] {
  let fa = fg[3];
  [
    composite_channel(fg[0], fa, bg[0]),
    composite_channel(fg[1], fa, bg[1]),
    composite_channel(fg[2], fa, bg[2]),
    C::MAX,
  ]
}

/// Foreground over a background when both are partly transparent.
///
/// The caller must ensure that both alphas are non-zero.
#[inline]
#[must_use]
pub fn general_blend<C: Channel>(fg: [C; 4], bg: [C; 4]) -> [C; 4] {
  let max = C::max_u64();
  let fa = fg[3].to_u64();
  let ba = bg[3].to_u64();
  let ac = max - (max - fa) * (max - ba) / max;
  // `s + t <= max`, so the channel result never exceeds `max`.
  let s = fa * max / ac;
  let t = (max - fa) * ba / ac;
  let mix = |f: C, b: C| C::from_u64(C::round_div_max(s * f.to_u64() + t * b.to_u64()));
  [mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2]), C::from_u64(ac)]
}

/// Foreground "over" a straight alpha background.
///
/// * Transparent foreground: the background is returned unchanged.
/// * Opaque foreground, or transparent background: the foreground is copied.
/// * Opaque background: [`simple_composite`].
/// * Otherwise: [`general_blend`].
#[inline]
#[must_use]
pub fn compose_straight<C: Channel>(fg: [C; 4], bg: [C; 4]) -> [C; 4] {
  let fa = fg[3];
  let ba = bg[3];
  if fa == C::default() {
    bg
  } else if fa == C::MAX || ba == C::default() {
    fg
  } else if ba == C::MAX {
    simple_composite(fg, bg)
  } else {
    general_blend(fg, bg)
  }
}

/// Scales a straight pixel's color channels by its alpha.
#[inline]
#[must_use]
pub fn premultiply<C: Channel>(px: [C; 4]) -> [C; 4] {
  let a = px[3].to_u64();
  let mul = |c: C| C::from_u64(C::round_div_max(c.to_u64() * a));
  [mul(px[0]), mul(px[1]), mul(px[2]), px[3]]
}

/// Foreground (straight) "over" a premultiplied background, giving a
/// premultiplied result.
///
/// * Color: `round_div_max(fc * fa + bc * (max - fa))`
/// * Alpha: `max - round_div_max((max - fa) * (max - ba))`
///
/// A transparent foreground leaves the background unchanged.
#[inline]
#[must_use]
pub fn compose_premultiplied<C: Channel>(fg: [C; 4], bg: [C; 4]) -> [C; 4] {
  let fa = fg[3];
  if fa == C::default() {
    return bg;
  }
  if fa == C::MAX {
    return fg;
  }
  let max = C::max_u64();
  let fa = fa.to_u64();
  let ba = bg[3].to_u64();
  let mix = |f: C, b: C| C::from_u64(C::round_div_max(f.to_u64() * fa + b.to_u64() * (max - fa)));
  let alpha = max - C::round_div_max((max - fa) * (max - ba));
  [mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2]), C::from_u64(alpha)]
}

#[test]
fn test_simple_composite_hand_values() {
  assert_eq!(simple_composite([255_u8, 0, 0, 128], [0, 255, 0, 255]), [128, 127, 0, 255]);
  assert_eq!(composite_channel(200_u8, 255, 17), 200);
  assert_eq!(composite_channel(200_u8, 0, 17), 17);
  assert_eq!(composite_channel(100_u8, 51, 200), 180);
  assert_eq!(composite_channel(0xFFFF_u16, 0x8000, 0), 0x8000);
}

#[test]
fn test_compose_straight_branches() {
  let bg = [9_u8, 8, 7, 100];
  assert_eq!(compose_straight([1, 2, 3, 0], bg), bg);
  assert_eq!(compose_straight([1, 2, 3, 255], bg), [1, 2, 3, 255]);
  assert_eq!(compose_straight([1_u8, 2, 3, 40], [9, 8, 7, 0]), [1, 2, 3, 40]);
  assert_eq!(
    compose_straight([1_u8, 2, 3, 40], [9, 8, 7, 255]),
    simple_composite([1_u8, 2, 3, 40], [9, 8, 7, 255])
  );
}

#[test]
fn test_general_blend_hand_values() {
  // Ac = 255 - 127*127/255 = 192, s = 128*255/192 = 170, t = 127*128/192 = 84
  // R = round((170*255) / 255) = 170, G = round((84*255) / 255) = 84
  assert_eq!(general_blend([255_u8, 0, 0, 128], [0, 255, 0, 128]), [170, 84, 0, 192]);
  // mixing equal colors keeps the color
  let out = general_blend([90_u8, 90, 90, 77], [90, 90, 90, 200]);
  assert!(out[..3].iter().all(|c| c.abs_diff(90) <= 1), "{out:?}");
}

#[test]
fn test_compose_premultiplied_hand_values() {
  // fully covers an empty background
  assert_eq!(compose_premultiplied([200_u8, 100, 0, 128], [0, 0, 0, 0]), [100, 50, 0, 128]);
  assert_eq!(premultiply([200_u8, 100, 0, 128]), [100, 50, 0, 128]);
  // over an opaque background the alpha stays opaque
  assert_eq!(compose_premultiplied([255_u8, 0, 0, 128], [0, 255, 0, 255]), [128, 127, 0, 255]);
  // transparent foreground changes nothing
  assert_eq!(compose_premultiplied([255_u8, 0, 0, 0], [1, 2, 3, 4]), [1, 2, 3, 4]);
  // alpha: 65535 - round(32767 * 32767 / 65535) = 65535 - 16383 = 49152
  let out = compose_premultiplied([0_u16, 0, 0, 0x8000], [0, 0, 0, 0x8000]);
  assert_eq!(out[3], 49152);
}
