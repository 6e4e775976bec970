#![forbid(unsafe_code)]

//! Reading and writing individual samples of raw and stored rows.

/// Gets sample `i` out of a packed row of `bits`-deep samples (1, 2, 4, or 8).
///
/// The high bits of each byte are the leftmost sample.
#[inline]
#[must_use]
pub fn packed_sample(row: &[u8], bits: u8, i: usize) -> u8 {
  match bits {
    1 => (row[i >> 3] >> (7 - (i & 7))) & 0b1,
    2 => (row[i >> 2] >> (6 - 2 * (i & 3))) & 0b11,
    4 => (row[i >> 1] >> (4 - 4 * (i & 1))) & 0b1111,
    _ => row[i],
  }
}

/// Sets sample `i` within a packed row of `bits`-deep samples (1, 2, 4, or 8).
///
/// Bits of `value` above the sample depth are ignored.
#[inline]
pub fn set_packed_sample(row: &mut [u8], bits: u8, i: usize, value: u8) {
  let (byte, shift, mask): (usize, u32, u8) = match bits {
    1 => (i >> 3, 7 - (i & 7) as u32, 0b1),
    2 => (i >> 2, 6 - 2 * (i & 3) as u32, 0b11),
    4 => (i >> 1, 4 - 4 * (i & 1) as u32, 0b1111),
    _ => {
      row[i] = value;
      return;
    }
  };
  let b = &mut row[byte];
  *b = (*b & !(mask << shift)) | ((value & mask) << shift);
}

/// Unpacks a row of `bits`-deep samples, one sample per output item.
///
/// Padding bits in the final byte come out as extra samples, so callers
/// should `take` the number they actually want.
#[inline]
pub fn unpack_samples(row: &[u8], bits: u8) -> impl Iterator<Item = u8> + '_ {
  let per_byte = 8 / u32::from(bits.clamp(1, 8));
  let bits = 8 / per_byte;
  let mask = ((1_u16 << bits) - 1) as u8;
  row.iter().copied().flat_map(move |byte| {
    (0..per_byte).map(move |k| (byte >> (8 - bits * (k + 1))) & mask)
  })
}

/// Reads the big-endian 16-bit value starting at `bytes[at]`.
#[inline]
#[must_use]
pub fn be_u16(bytes: &[u8], at: usize) -> u16 {
  u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Writes a big-endian 16-bit value starting at `bytes[at]`.
#[inline]
pub fn put_be_u16(bytes: &mut [u8], at: usize, value: u16) {
  let [hi, lo] = value.to_be_bytes();
  bytes[at] = hi;
  bytes[at + 1] = lo;
}

/// Reads channel `c` of a native pixel whose channels are `bits` deep.
///
/// `pixel` is one stored pixel: one byte per channel, or two big-endian
/// bytes per channel when `bits` is 16.
#[inline]
#[must_use]
pub fn stored_channel(pixel: &[u8], bits: u8, c: usize) -> u16 {
  if bits == 16 {
    be_u16(pixel, c * 2)
  } else {
    u16::from(pixel[c])
  }
}

/// Writes channel `c` of a stored native pixel, see [`stored_channel`].
#[inline]
pub fn put_stored_channel(pixel: &mut [u8], bits: u8, c: usize, value: u16) {
  if bits == 16 {
    put_be_u16(pixel, c * 2, value)
  } else {
    pixel[c] = value as u8;
  }
}

/// Reads channel sample `i` of a raw (packed) row, counting every channel of
/// every pixel.
#[inline]
#[must_use]
pub fn raw_channel(row: &[u8], bits: u8, i: usize) -> u16 {
  match bits {
    16 => be_u16(row, i * 2),
    _ => u16::from(packed_sample(row, bits, i)),
  }
}

/// Writes channel sample `i` of a raw (packed) row, see [`raw_channel`].
#[inline]
pub fn put_raw_channel(row: &mut [u8], bits: u8, i: usize, value: u16) {
  match bits {
    16 => put_be_u16(row, i * 2, value),
    _ => set_packed_sample(row, bits, i, value as u8),
  }
}

#[test]
fn test_raw_channels() {
  let row = [0x12, 0x34, 0xAB, 0xCD];
  assert_eq!(raw_channel(&row, 16, 1), 0xABCD);
  assert_eq!(raw_channel(&row, 8, 2), 0xAB);
  assert_eq!(raw_channel(&row, 4, 1), 0x2);
  let mut out = [0_u8; 4];
  put_raw_channel(&mut out, 16, 0, 0xBEEF);
  put_raw_channel(&mut out, 4, 5, 0x7);
  assert_eq!(out, [0xBE, 0xEF, 0x07, 0]);
}

#[test]
fn test_packed_samples() {
  let row = [0b1011_0010_u8, 0b0100_0000];
  assert_eq!(packed_sample(&row, 1, 0), 1);
  assert_eq!(packed_sample(&row, 1, 1), 0);
  assert_eq!(packed_sample(&row, 1, 9), 1);
  assert_eq!(packed_sample(&row, 2, 0), 0b10);
  assert_eq!(packed_sample(&row, 2, 3), 0b10);
  assert_eq!(packed_sample(&row, 4, 1), 0b0010);
  assert_eq!(packed_sample(&row, 4, 2), 0b0100);
  let unpacked: alloc::vec::Vec<u8> = unpack_samples(&row, 2).take(5).collect();
  assert_eq!(unpacked, [0b10, 0b11, 0b00, 0b10, 0b01]);
  for (i, v) in unpack_samples(&row, 1).enumerate() {
    assert_eq!(v, packed_sample(&row, 1, i));
  }
}

#[test]
fn test_set_packed_sample() {
  let mut row = [0_u8; 2];
  set_packed_sample(&mut row, 1, 9, 1);
  assert_eq!(row, [0, 0b0100_0000]);
  set_packed_sample(&mut row, 4, 0, 0xF);
  set_packed_sample(&mut row, 4, 0, 0x5);
  assert_eq!(row[0], 0x50);
  set_packed_sample(&mut row, 2, 3, 0b11);
  assert_eq!(row[0], 0x53);
  let mut be = [0_u8; 4];
  put_be_u16(&mut be, 2, 0xABCD);
  assert_eq!(be_u16(&be, 2), 0xABCD);
}
