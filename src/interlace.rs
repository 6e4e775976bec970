#![forbid(unsafe_code)]

//! Row and column stepping, including Adam7 interlacing.
//!
//! An Adam7 image is sent as 7 reduced images ("passes"). Every pass covers
//! a fixed subset of the full image's pixels:
//!
//! ```txt
//! 0 5 3 5 1 5 3 5
//! 6 6 6 6 6 6 6 6
//! 4 5 4 5 4 5 4 5
//! 6 6 6 6 6 6 6 6
//! 2 5 3 5 2 5 3 5
//! 6 6 6 6 6 6 6 6
//! 4 5 4 5 4 5 4 5
//! 6 6 6 6 6 6 6 6
//! ```
//!
//! Passes that would contain no pixels at all are skipped entirely.

/// The first row of each pass.
pub const ADAM7_ROW_START: [u32; 7] = [0, 0, 4, 0, 2, 0, 1];
/// The row step of each pass.
pub const ADAM7_ROW_SKIP: [u32; 7] = [8, 8, 8, 4, 4, 2, 2];
/// The first column of each pass.
pub const ADAM7_COL_START: [u32; 7] = [0, 4, 0, 2, 0, 1, 0];
/// The column step of each pass.
pub const ADAM7_COL_SKIP: [u32; 7] = [8, 8, 4, 4, 2, 2, 1];
/// Added to the remaining width before dividing, so partial steps round up.
pub const ADAM7_ROUNDOFF: [u32; 7] = [7, 7, 3, 3, 1, 1, 0];
/// The remaining width is shifted right by this to get the samples per row.
pub const ADAM7_DIVIDER: [u32; 7] = [3, 3, 2, 2, 1, 1, 0];

/// Where the current row's samples go within the full image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RowPosition {
  /// Full image row.
  pub row: u32,
  /// Full image column of the first sample.
  pub col: u32,
  /// Full image columns between one sample and the next.
  pub col_inc: u32,
}

/// The `(width, height)` of each pass's reduced image.
///
/// A pass with a 0 in either dimension has no pixels and is never sent.
#[must_use]
pub const fn adam7_pass_dimensions(full_width: u32, full_height: u32) -> [(u32, u32); 7] {
  let mut out = [(0, 0); 7];
  let mut pass = 0;
  while pass < 7 {
    out[pass] = (
      steps_within(full_width, ADAM7_COL_START[pass], ADAM7_COL_SKIP[pass]),
      steps_within(full_height, ADAM7_ROW_START[pass], ADAM7_ROW_SKIP[pass]),
    );
    pass += 1;
  }
  out
}

#[inline]
const fn steps_within(full: u32, start: u32, skip: u32) -> u32 {
  if full > start {
    (full - start + skip - 1) / skip
  } else {
    0
  }
}

/// Tracks which row of which pass is current.
///
/// For non-interlaced images there's only one "pass", with every row and
/// column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PassState {
  width: u32,
  height: u32,
  interlaced: bool,
  pass: u8,
  row: u32,
  row_inc: u32,
  col: u32,
  col_inc: u32,
  samples: u32,
}
impl PassState {
  /// Starts at the first row of the first non-empty pass.
  #[must_use]
  pub fn new(width: u32, height: u32, interlaced: bool) -> Self {
    let mut s = Self {
      width,
      height,
      interlaced,
      pass: 0,
      row: 0,
      row_inc: 1,
      col: 0,
      col_inc: 1,
      samples: width,
    };
    if interlaced {
      s.enter_pass(0);
      s.skip_empty_passes();
    }
    s
  }

  fn enter_pass(&mut self, pass: u8) {
    self.pass = pass;
    let p = usize::from(pass);
    if p < 7 {
      self.row = ADAM7_ROW_START[p];
      self.row_inc = ADAM7_ROW_SKIP[p];
      self.col = ADAM7_COL_START[p];
      self.col_inc = ADAM7_COL_SKIP[p];
      self.samples = if self.col < self.width {
        (self.width - self.col + ADAM7_ROUNDOFF[p]) >> ADAM7_DIVIDER[p]
      } else {
        0
      };
    }
  }

  fn skip_empty_passes(&mut self) {
    while self.pass < 7 && (self.row >= self.height || self.col >= self.width) {
      self.enter_pass(self.pass + 1);
    }
  }

  /// Moves to the next row.
  ///
  /// Returns `true` when this started a new pass that has rows to process.
  /// The caller must zero its previous-row buffer in that case, since the
  /// first row of a pass has no row above it.
  pub fn advance(&mut self) -> bool {
    self.row = self.row.saturating_add(self.row_inc);
    if !self.interlaced || self.row < self.height {
      return false;
    }
    let old_pass = self.pass;
    self.enter_pass(self.pass + 1);
    self.skip_empty_passes();
    if self.pass < 7 {
      log::trace!("interlace pass {old_pass} -> {}, {} samples per row", self.pass, self.samples);
      true
    } else {
      false
    }
  }

  /// If every row of every pass has been processed.
  #[inline]
  #[must_use]
  pub fn is_done(&self) -> bool {
    if self.interlaced {
      self.pass >= 7
    } else {
      self.row >= self.height
    }
  }

  /// The current pass (0 through 6), or `None` for non-interlaced images.
  #[inline]
  #[must_use]
  pub fn pass(&self) -> Option<u8> {
    if self.interlaced {
      Some(self.pass)
    } else {
      None
    }
  }

  /// Full image row of the current row.
  #[inline]
  #[must_use]
  pub fn row(&self) -> u32 {
    self.row
  }

  /// Full image rows between this pass's rows.
  #[inline]
  #[must_use]
  pub fn row_inc(&self) -> u32 {
    self.row_inc
  }

  /// Full image column of the first sample of each row.
  #[inline]
  #[must_use]
  pub fn col(&self) -> u32 {
    self.col
  }

  /// Full image columns between samples.
  #[inline]
  #[must_use]
  pub fn col_inc(&self) -> u32 {
    self.col_inc
  }

  /// Samples in each row of the current pass.
  #[inline]
  #[must_use]
  pub fn samples(&self) -> u32 {
    self.samples
  }

  /// The current row's placement.
  #[inline]
  #[must_use]
  pub fn position(&self) -> RowPosition {
    RowPosition { row: self.row, col: self.col, col_inc: self.col_inc }
  }

  /// How many rows will be delivered in total, across all passes.
  #[must_use]
  pub fn total_rows(&self) -> u64 {
    if self.interlaced {
      adam7_pass_dimensions(self.width, self.height)
        .iter()
        .filter(|(w, _)| *w > 0)
        .map(|(_, h)| u64::from(*h))
        .sum()
    } else {
      u64::from(self.height)
    }
  }
}

#[test]
fn test_adam7_pass_dimensions() {
  assert_eq!(adam7_pass_dimensions(0, 0), [(0, 0); 7]);
  let widths: [[u32; 8]; 7] = [
    [1, 1, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 2, 2, 2, 2],
    [0, 0, 1, 1, 1, 1, 2, 2],
    [1, 1, 2, 2, 3, 3, 4, 4],
    [0, 1, 1, 2, 2, 3, 3, 4],
    [1, 2, 3, 4, 5, 6, 7, 8],
  ];
  let heights: [[u32; 8]; 7] = [
    [1, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 2, 2, 2, 2],
    [0, 0, 1, 1, 1, 1, 2, 2],
    [1, 1, 2, 2, 3, 3, 4, 4],
    [0, 1, 1, 2, 2, 3, 3, 4],
  ];
  for pass in 0..7 {
    for n in 1..=8_u32 {
      let ex_w = widths[pass][n as usize - 1];
      let ex_h = heights[pass][n as usize - 1];
      assert_eq!(adam7_pass_dimensions(n, 0)[pass].0, ex_w, "pass:{pass} w:{n}");
      assert_eq!(adam7_pass_dimensions(0, n)[pass].1, ex_h, "pass:{pass} h:{n}");
    }
  }
  assert_eq!(adam7_pass_dimensions(17, 9)[6], (17, 4));
}

#[test]
fn test_samples_match_pass_dimensions() {
  for (w, h) in [(1, 1), (3, 2), (8, 8), (13, 5), (33, 17)] {
    let dims = adam7_pass_dimensions(w, h);
    let mut state = PassState::new(w, h, true);
    let mut rows_seen = 0;
    while !state.is_done() {
      let p = usize::from(state.pass().unwrap());
      assert_eq!(state.samples(), dims[p].0, "w:{w} h:{h} pass:{p}");
      assert!(state.row() < h);
      rows_seen += 1;
      state.advance();
    }
    assert_eq!(rows_seen, PassState::new(w, h, true).total_rows());
  }
}

#[test]
fn test_pass_sequence_small_image() {
  // 1x1: only pass 0 has pixels
  let mut s = PassState::new(1, 1, true);
  assert_eq!(s.pass(), Some(0));
  assert!(!s.advance());
  assert!(s.is_done());
  // 5x2: passes 0, 1, 3, 5, and 6 have pixels
  let mut s = PassState::new(5, 2, true);
  let mut passes = alloc::vec::Vec::new();
  while !s.is_done() {
    passes.push((s.pass().unwrap(), s.row(), s.col(), s.samples()));
    s.advance();
  }
  assert_eq!(passes, [(0, 0, 0, 1), (1, 0, 4, 1), (3, 0, 2, 1), (5, 0, 1, 2), (6, 1, 0, 5)]);
}

#[test]
fn test_non_interlaced_rows() {
  let mut s = PassState::new(4, 3, false);
  assert_eq!(s.pass(), None);
  assert_eq!(s.position(), RowPosition { row: 0, col: 0, col_inc: 1 });
  assert_eq!(s.samples(), 4);
  assert!(!s.advance());
  assert!(!s.advance());
  assert!(!s.is_done());
  assert!(!s.advance());
  assert!(s.is_done());
  assert_eq!(s.total_rows(), 3);
}
