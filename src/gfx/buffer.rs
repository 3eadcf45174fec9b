//! Point buffers.
//!
//! A [`PointBuffer`] is a rectangular grid of [`Texel`]s in row-major order.
//! Surfaces keep two of them: one for what callers have drawn and one for what
//! the backend is currently showing. [`PointBuffer::changed_runs()`] diffs the
//! two so that only the cells that actually changed are sent to the backend.

use std::ops::Range;

use crate::gfx::texel::Texel;

/// A grid of texels.
// Invariant: self.cells.len() == self.cols * self.rows
#[derive(Clone, PartialEq, Debug)]
pub struct PointBuffer {
  cols: usize,
  rows: usize,
  cells: Box<[Texel]>,
}

/// A horizontal run of cells that differ between two buffers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Run {
  pub row: usize,
  pub cols: (usize, usize),
}

impl Run {
  /// Returns the columns covered by this run as a range.
  pub fn range(self) -> Range<usize> {
    self.cols.0..self.cols.1
  }
}

impl PointBuffer {
  /// Creates a new buffer of the given dimensions, filled with `val`.
  pub fn new(cols: usize, rows: usize, val: Texel) -> Self {
    Self {
      cols,
      rows,
      cells: vec![val; cols * rows].into_boxed_slice(),
    }
  }

  /// Creates a new buffer of the given dimensions, filled with blanks.
  pub fn blank(cols: usize, rows: usize) -> Self {
    Self::new(cols, rows, Texel::blank())
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  /// Returns this buffer's data as a linear slice.
  pub fn data(&self) -> &[Texel] {
    &self.cells
  }

  /// Returns row `row` as a slice.
  ///
  /// # Panics
  ///
  /// Panics if `row` is out of bounds.
  pub fn row(&self, row: usize) -> &[Texel] {
    &self.cells[row * self.cols..(row + 1) * self.cols]
  }

  /// Returns row `row` as a mutable slice.
  ///
  /// # Panics
  ///
  /// Panics if `row` is out of bounds.
  pub fn row_mut(&mut self, row: usize) -> &mut [Texel] {
    &mut self.cells[row * self.cols..(row + 1) * self.cols]
  }

  /// Gets the texel at `(col, row)`, or `None` if it is out-of-bounds.
  pub fn get(&self, col: usize, row: usize) -> Option<&Texel> {
    if col >= self.cols || row >= self.rows {
      return None;
    }
    self.cells.get(row * self.cols + col)
  }

  /// Gets the texel at `(col, row)` mutably, or `None` if it is
  /// out-of-bounds.
  pub fn get_mut(&mut self, col: usize, row: usize) -> Option<&mut Texel> {
    if col >= self.cols || row >= self.rows {
      return None;
    }
    self.cells.get_mut(row * self.cols + col)
  }

  /// Overwrites every cell with `val`.
  pub fn fill(&mut self, val: Texel) {
    for tx in self.cells.iter_mut() {
      *tx = val;
    }
  }

  /// Resizes this buffer, keeping the overlapping upper-left content and
  /// filling any new cells with `val`.
  pub fn resize(&mut self, cols: usize, rows: usize, val: Texel) {
    if cols == self.cols && rows == self.rows {
      return;
    }
    let mut new = Self::new(cols, rows, val);
    let keep_cols = cols.min(self.cols);
    for row in 0..rows.min(self.rows) {
      new.row_mut(row)[..keep_cols].copy_from_slice(&self.row(row)[..keep_cols]);
    }
    *self = new;
  }

  /// Copies a `cols` by `rows` block from `src` to `dst` within this buffer.
  ///
  /// The block is clipped to the buffer; overlapping source and destination
  /// are handled correctly.
  pub fn copy_within(
    &mut self,
    dst: (usize, usize),
    src: (usize, usize),
    cols: usize,
    rows: usize,
  ) {
    let cols = cols
      .min(self.cols.saturating_sub(dst.0))
      .min(self.cols.saturating_sub(src.0));
    let rows = rows
      .min(self.rows.saturating_sub(dst.1))
      .min(self.rows.saturating_sub(src.1));
    if cols == 0 || rows == 0 {
      return;
    }

    // Copy rows in the order that doesn't clobber unread source rows.
    let order: Box<dyn Iterator<Item = usize>> = if dst.1 > src.1 {
      Box::new((0..rows).rev())
    } else {
      Box::new(0..rows)
    };
    for i in order {
      let from = (src.1 + i) * self.cols + src.0;
      let to = (dst.1 + i) * self.cols + dst.0;
      self.cells.copy_within(from..from + cols, to);
    }
  }

  /// Computes the runs of cells in which `self` differs from `other`.
  ///
  /// Both buffers must have the same dimensions. Runs never span rows; two
  /// changed cells separated by at most `gap` unchanged cells are merged
  /// into one run, which trades a few redundant cells for fewer backend
  /// calls.
  pub fn changed_runs(&self, other: &PointBuffer, gap: usize) -> Vec<Run> {
    assert_eq!(
      (self.cols, self.rows),
      (other.cols, other.rows),
      "diffing buffers of different sizes"
    );

    let mut runs = Vec::new();
    for row in 0..self.rows {
      let new = self.row(row);
      let old = other.row(row);
      let mut current: Option<(usize, usize)> = None;
      for col in 0..self.cols {
        if new[col] == old[col] {
          continue;
        }
        current = match current {
          Some((start, end)) if col - end <= gap => Some((start, col + 1)),
          Some(cols) => {
            runs.push(Run { row, cols });
            Some((col, col + 1))
          }
          None => Some((col, col + 1)),
        };
      }
      if let Some(cols) = current {
        runs.push(Run { row, cols });
      }
    }
    runs
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn runs_split_and_merge() {
    let old = PointBuffer::blank(10, 2);
    let mut new = old.clone();
    new.row_mut(0)[1] = Texel::new('a');
    new.row_mut(0)[2] = Texel::new('b');
    new.row_mut(0)[7] = Texel::new('c');
    new.row_mut(1)[9] = Texel::new('d');

    assert_eq!(
      new.changed_runs(&old, 0),
      vec![
        Run { row: 0, cols: (1, 3) },
        Run { row: 0, cols: (7, 8) },
        Run { row: 1, cols: (9, 10) },
      ]
    );
    assert_eq!(
      new.changed_runs(&old, 4),
      vec![Run { row: 0, cols: (1, 8) }, Run { row: 1, cols: (9, 10) }]
    );
  }

  #[test]
  fn resize_keeps_upper_left() {
    let mut buf = PointBuffer::blank(3, 3);
    *buf.get_mut(1, 1).unwrap() = Texel::new('x');
    *buf.get_mut(2, 2).unwrap() = Texel::new('y');
    buf.resize(2, 4, Texel::new('.'));
    assert_eq!(buf.get(1, 1).unwrap().visible_glyph(), 'x');
    assert_eq!(buf.get(1, 3).unwrap().visible_glyph(), '.');
    assert_eq!(buf.get(2, 2), None);
  }

  #[test]
  fn overlapping_copy_scrolls_up() {
    let mut buf = PointBuffer::blank(2, 3);
    for row in 0..3 {
      let glyph = (b'0' + row as u8) as char;
      buf.row_mut(row).fill(Texel::new(glyph));
    }
    buf.copy_within((0, 0), (0, 1), 2, 2);
    let glyphs: String = (0..3)
      .map(|r| buf.row(r)[0].visible_glyph())
      .collect();
    assert_eq!(glyphs, "122");
  }
}
