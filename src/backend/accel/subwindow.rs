//! Subwindows: surfaces realized inside a window.
//!
//! A docked [`Subwindow`] binds a permanent surface to a pixel rectangle in
//! one window; a [`Floating`] subwindow realizes a transient surface. Either
//! way, the rectangle holds a whole number of font cells plus the border.

use crate::backend::accel::device::FontMetrics;
use crate::backend::accel::device::Layer;
use crate::backend::accel::device::TextureId;
use crate::backend::accel::layout::SubwindowConfig;
use crate::backend::Cursor;
use crate::backend::SurfaceId;
use crate::catalogue::SurfaceKind;
use crate::config::FontSpec;
use crate::geo::Point;
use crate::geo::Rect;
use crate::gfx::texel::colors;
use crate::gfx::Color;

/// The result of fitting a cell grid into a rectangle.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Fit {
  pub cols: i32,
  pub rows: i32,
  /// Whether the minimum size could be met.
  pub ok: bool,
}

/// Fits a `cols` by `rows` grid with a `border` into `avail`, shrinking it
/// as needed but never below `min`.
pub fn fit(
  (cols, rows): (i32, i32),
  min: (i32, i32),
  metrics: FontMetrics,
  border: i32,
  avail: Rect,
) -> Fit {
  let (max_cols, max_rows) =
    metrics.cells_in(avail.width() - 2 * border, avail.height() - 2 * border);
  Fit {
    cols: cols.min(max_cols).max(min.0),
    rows: rows.min(max_rows).max(min.1),
    ok: max_cols >= min.0 && max_rows >= min.1,
  }
}

/// Returns the pixel rectangle holding a `cols` by `rows` grid at `corner`.
pub fn grid_rect(corner: Point, cols: i32, rows: i32, metrics: FontMetrics, border: i32) -> Rect {
  let (w, h) = metrics.grid(cols, rows);
  Rect::at(corner, w + 2 * border, h + 2 * border)
}

/// A permanent surface's place in a window.
#[derive(Clone, Debug)]
pub struct Subwindow {
  kind: SurfaceKind,
  pub(crate) config: SubwindowConfig,
  metrics: FontMetrics,
  cols: i32,
  rows: i32,
  pub(crate) texture: Option<TextureId>,
  pub(crate) id: Option<SurfaceId>,
  pub(crate) cursor: Cursor,
  in_error: bool,
}

impl Subwindow {
  /// Creates a subwindow from saved settings, fitting as many cells into
  /// its rectangle as it will hold.
  pub fn new(kind: SurfaceKind, config: SubwindowConfig, metrics: FontMetrics) -> Self {
    let border = config.borders as i32;
    let r = config.full_rect;
    let (cols, rows) = metrics.cells_in(r.width() - 2 * border, r.height() - 2 * border);
    let d = kind.descriptor();
    Self {
      kind,
      config,
      metrics,
      cols,
      rows,
      texture: None,
      id: None,
      cursor: Cursor::default(),
      in_error: cols < d.min_cols() || rows < d.min_rows(),
    }
  }

  pub fn kind(&self) -> SurfaceKind {
    self.kind
  }

  pub fn config(&self) -> &SubwindowConfig {
    &self.config
  }

  /// Returns the pixel rectangle, border included, in window coordinates.
  pub fn rect(&self) -> Rect {
    self.config.full_rect
  }

  /// Returns the rectangle inside the border.
  pub fn content(&self) -> Rect {
    self.rect().inset(self.border())
  }

  pub fn border(&self) -> i32 {
    self.config.borders as i32
  }

  pub fn metrics(&self) -> FontMetrics {
    self.metrics
  }

  pub fn cells(&self) -> (i32, i32) {
    (self.cols, self.rows)
  }

  /// Returns whether this subwindow couldn't be fit into its window.
  pub fn in_error(&self) -> bool {
    self.in_error
  }

  /// Returns whether the surface stack has a surface bound to this.
  pub fn is_bound(&self) -> bool {
    self.id.is_some()
  }

  /// The z-order bucket: plain, then top, then always-on-top, then both.
  pub fn bucket(&self) -> u8 {
    (self.config.always_top as u8) << 1 | self.config.top as u8
  }

  /// Returns the smallest pixel size this subwindow may be resized to.
  pub fn min_size(&self) -> (i32, i32) {
    let d = self.kind.descriptor();
    let (w, h) = self.metrics.grid(d.min_cols(), d.min_rows());
    (w + 2 * self.border(), h + 2 * self.border())
  }

  /// Returns the largest pixel size this subwindow may be resized to.
  pub fn max_size(&self) -> (i32, i32) {
    let d = self.kind.descriptor();
    let (w, h) = self.metrics.grid(d.max.0, d.max.1);
    (w + 2 * self.border(), h + 2 * self.border())
  }

  /// Moves the subwindow without resizing it.
  pub fn move_to(&mut self, corner: Point) {
    self.config.full_rect = self.config.full_rect.moved_to(corner);
  }

  /// Sets the rectangle outright, as a drag does while in progress. The
  /// cell grid isn't touched until [`Subwindow::commit()`].
  pub fn set_rect(&mut self, rect: Rect) {
    self.config.full_rect = rect;
  }

  /// Snaps the rectangle to a whole number of cells, keeping the right edge
  /// fixed if `keep_right` and likewise the bottom edge if `keep_bottom`.
  ///
  /// Returns whether the cell grid changed.
  pub fn commit(&mut self, keep_right: bool, keep_bottom: bool) -> bool {
    let r = self.rect();
    let b = self.border();
    let d = self.kind.descriptor();
    let (cols, rows) = self.metrics.cells_in(r.width() - 2 * b, r.height() - 2 * b);
    let cols = cols.clamp(d.min_cols(), d.max.0);
    let rows = rows.clamp(d.min_rows(), d.max.1);
    let snapped = grid_rect(r.upper_left(), cols, rows, self.metrics, b);
    let x = if keep_right { r.right() - snapped.width() } else { r.x() };
    let y = if keep_bottom { r.bottom() - snapped.height() } else { r.y() };
    self.config.full_rect = snapped.moved_to(Point::new(x, y));
    self.set_cells(cols, rows)
  }

  /// Fits this subwindow back into `inner` after its window changed size.
  ///
  /// The cell grid is kept if it still fits, otherwise shrunk to the largest
  /// that does; the rectangle is then shifted to lie inside `inner`. If even
  /// the minimum grid can't fit, the subwindow is flagged as in error and
  /// pinned to the corner of `inner` at its minimum size.
  ///
  /// Returns whether the cell grid changed.
  pub fn refit(&mut self, inner: Rect) -> bool {
    let d = self.kind.descriptor();
    let b = self.border();
    let fit = fit((self.cols, self.rows), d.min, self.metrics, b, inner);
    let rect = grid_rect(self.rect().upper_left(), fit.cols, fit.rows, self.metrics, b);
    if fit.ok {
      self.config.full_rect = rect.clamp_within(inner);
      self.in_error = false;
    } else {
      if !self.in_error {
        tracing::warn!(kind = %self.kind, ?inner, "subwindow no longer fits its window");
      }
      self.config.full_rect = rect.moved_to(inner.upper_left());
      self.in_error = true;
    }
    self.set_cells(fit.cols, fit.rows)
  }

  fn set_cells(&mut self, cols: i32, rows: i32) -> bool {
    let changed = (cols, rows) != (self.cols, self.rows);
    self.cols = cols;
    self.rows = rows;
    changed
  }

  /// Converts a window pixel position into a cell of this subwindow.
  pub fn cell_at(&self, p: Point) -> Option<Point> {
    cell_at(self.content(), self.metrics, p)
  }

  pub(crate) fn layer(&self) -> Option<Layer> {
    let border_color = if self.in_error {
      Some(Color::Rgb(colors::RED))
    } else if self.config.borders {
      Some(Color::Rgb(colors::GRAY))
    } else {
      None
    };
    Some(Layer {
      texture: self.texture?,
      rect: self.rect(),
      border: self.border(),
      border_color,
      alpha: self.config.alpha,
      cursor: self.cursor.visible.then(|| Point::new(self.cursor.col, self.cursor.row)),
    })
  }
}

/// A transient surface's place in a window.
///
/// Floating subwindows always use their window's game font.
#[derive(Clone, Debug)]
pub struct Floating {
  pub(crate) id: SurfaceId,
  pub(crate) slot: usize,
  pub(crate) rect: Rect,
  pub(crate) cols: i32,
  pub(crate) rows: i32,
  pub(crate) min: (i32, i32),
  pub(crate) font: FontSpec,
  pub(crate) metrics: FontMetrics,
  pub(crate) texture: TextureId,
  pub(crate) cursor: Cursor,
}

impl Floating {
  pub const BORDER: i32 = 1;

  pub fn content(&self) -> Rect {
    self.rect.inset(Self::BORDER)
  }

  /// Like [`Subwindow::refit()`]; floating subwindows that can't fit simply
  /// keep their minimum size.
  pub fn refit(&mut self, inner: Rect) -> bool {
    let fit = fit((self.cols, self.rows), self.min, self.metrics, Self::BORDER, inner);
    let rect = grid_rect(self.rect.upper_left(), fit.cols, fit.rows, self.metrics, Self::BORDER);
    self.rect = if fit.ok {
      rect.clamp_within(inner)
    } else {
      rect.moved_to(inner.upper_left())
    };
    let changed = (fit.cols, fit.rows) != (self.cols, self.rows);
    self.cols = fit.cols;
    self.rows = fit.rows;
    changed
  }

  pub fn cell_at(&self, p: Point) -> Option<Point> {
    cell_at(self.content(), self.metrics, p)
  }

  pub(crate) fn layer(&self) -> Layer {
    Layer {
      texture: self.texture,
      rect: self.rect,
      border: Self::BORDER,
      border_color: Some(Color::Rgb(colors::WHITE)),
      alpha: 255,
      cursor: self.cursor.visible.then(|| Point::new(self.cursor.col, self.cursor.row)),
    }
  }
}

fn cell_at(content: Rect, metrics: FontMetrics, p: Point) -> Option<Point> {
  if !content.contains(p) {
    return None;
  }
  let off = p - content.upper_left();
  Some(Point::new(off.x() / metrics.cell_width, off.y() / metrics.cell_height))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::FontSpec;

  fn sub(kind: SurfaceKind, rect: Rect) -> Subwindow {
    let config = SubwindowConfig {
      window: 0,
      full_rect: rect,
      font: FontSpec::new("10x10.fon", 10),
      borders: true,
      top: false,
      always_top: false,
      alpha: 255,
    };
    Subwindow::new(kind, config, FontMetrics::new(10, 10))
  }

  #[test]
  fn shrinking_window_keeps_grid_that_fits() {
    // 20x14 cells of 10px plus a 1px border.
    let mut s = sub(SurfaceKind::Sidebar, Rect::new(10, 30, 202, 142));
    assert_eq!(s.cells(), (20, 14));

    assert!(!s.refit(Rect::new(0, 20, 300, 460)));
    assert_eq!(s.rect(), Rect::new(10, 30, 202, 142));

    assert!(s.refit(Rect::new(0, 20, 150, 460)));
    assert_eq!(s.cells(), (14, 14));
    assert_eq!(s.rect(), Rect::new(8, 30, 142, 142));
    assert!(!s.in_error());
  }

  #[test]
  fn hopeless_fit_is_flagged() {
    let mut s = sub(SurfaceKind::Map, Rect::new(0, 20, 402, 122));
    assert!(!s.in_error());
    s.refit(Rect::new(0, 20, 300, 460));
    assert!(s.in_error());
    let d = SurfaceKind::Map.descriptor();
    assert_eq!(s.cells(), (d.min_cols(), 12));
  }

  #[test]
  fn commit_keeps_anchored_edges() {
    let mut s = sub(SurfaceKind::Sidebar, Rect::new(10, 30, 202, 142));
    // Dragged out to the left by a bit over two cells.
    s.set_rect(Rect::new(-13, 30, 225, 142));
    assert!(s.commit(true, false));
    assert_eq!(s.cells(), (22, 14));
    assert_eq!(s.rect(), Rect::new(-10, 30, 222, 142));
  }
}
