//! Placement of transient surfaces.
//!
//! A transient surface is requested with [`Hints`]: a desired size, a minimum
//! size, a [`Placement`] strategy, and a [`Purpose`] tag. Backends turn hints
//! into a concrete rectangle with [`place()`], in whatever units they measure
//! their hosting area in (cells, for both backends in this crate).

use crate::error::Error;
use crate::error::Result;
use crate::geo::Point;
use crate::geo::Rect;

/// Where to put a new transient surface.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Placement {
  /// Against the upper-left corner of the map surface.
  TopLeftOfMap,
  /// Centered on the whole hosting area.
  CenterScreen,
  /// Centered on whichever surface is currently on top.
  CenterOnTop,
  /// At a fixed offset from the upper-left corner of the surface on top.
  OffsetFromTop { dx: i32, dy: i32 },
  /// Covering the entire hosting area, without a frame.
  FullScreen,
}

/// What a transient surface is for.
///
/// Backends may style surfaces differently by purpose; the stack itself does
/// not care.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[allow(missing_docs)]
pub enum Purpose {
  Menu,
  Dialog,
  Prompt,
  Popup,
  Overlay,
}

/// A request for a transient surface.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Hints {
  pub cols: i32,
  pub rows: i32,
  pub min_cols: i32,
  pub min_rows: i32,
  pub placement: Placement,
  pub purpose: Purpose,
}

impl Hints {
  /// Creates hints for a `cols` by `rows` centered pop-up that may not be
  /// shrunk.
  pub fn new(cols: i32, rows: i32) -> Self {
    Self {
      cols,
      rows,
      min_cols: cols,
      min_rows: rows,
      placement: Placement::CenterScreen,
      purpose: Purpose::Popup,
    }
  }

  /// Allows the surface to shrink down to `cols` by `rows`.
  pub fn shrink_to(mut self, cols: i32, rows: i32) -> Self {
    self.min_cols = cols.min(self.cols);
    self.min_rows = rows.min(self.rows);
    self
  }

  pub fn placement(mut self, placement: Placement) -> Self {
    self.placement = placement;
    self
  }

  pub fn purpose(mut self, purpose: Purpose) -> Self {
    self.purpose = purpose;
    self
  }
}

/// The rectangles a placement is computed relative to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Anchors {
  /// The whole hosting area.
  pub area: Rect,
  /// The map surface, if it is realized in this area.
  pub map: Option<Rect>,
  /// The surface currently on top, if it is realized in this area.
  pub top: Option<Rect>,
}

impl Anchors {
  /// Anchors for an area with nothing else in it.
  pub fn bare(area: Rect) -> Self {
    Self {
      area,
      map: None,
      top: None,
    }
  }
}

/// Computes the content rectangle of a new transient surface.
///
/// `frame` is the thickness of the border the backend will draw around the
/// content; the frame counts against the hosting area, but not against the
/// requested size. Full-screen surfaces never get a frame.
///
/// The requested size is shrunk as far as the hints allow to fit; if even the
/// minimum size can't fit, this returns [`Error::Placement`].
pub fn place(hints: &Hints, anchors: &Anchors, frame: i32) -> Result<Rect> {
  let area = anchors.area;
  let too_small = || {
    Error::placement(
      (hints.min_cols, hints.min_rows),
      (area.width(), area.height()),
    )
  };

  if hints.placement == Placement::FullScreen {
    if area.width() < hints.min_cols || area.height() < hints.min_rows {
      return Err(too_small());
    }
    return Ok(area);
  }

  let avail = area.inset(frame);
  let cols = hints.cols.min(avail.width());
  let rows = hints.rows.min(avail.height());
  if cols < hints.min_cols || rows < hints.min_rows || cols <= 0 || rows <= 0 {
    return Err(too_small());
  }

  let outer = Rect::with_dims(cols + 2 * frame, rows + 2 * frame);
  let outer = match hints.placement {
    Placement::TopLeftOfMap => {
      outer.moved_to(anchors.map.unwrap_or(area).upper_left())
    }
    Placement::CenterScreen => outer.centered_in(area),
    Placement::CenterOnTop => outer.centered_in(anchors.top.unwrap_or(area)),
    Placement::OffsetFromTop { dx, dy } => {
      let base = anchors.top.unwrap_or(area).upper_left();
      outer.moved_to(base + Point::new(dx, dy))
    }
    Placement::FullScreen => unreachable!(),
  };

  Ok(outer.clamp_within(area).inset(frame))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn centered_line_in_seventy_columns() {
    let hints = Hints::new(40, 1);
    let r = place(&hints, &Anchors::bare(Rect::with_dims(70, 20)), 0).unwrap();
    assert_eq!(r, Rect::new(15, 9, 40, 1));

    // A frame moves the box, but not the content.
    let r = place(&hints, &Anchors::bare(Rect::with_dims(70, 20)), 1).unwrap();
    assert_eq!(r.x(), 15);
  }

  #[test]
  fn shrinks_down_to_minimum() {
    let area = Rect::with_dims(30, 10);
    let hints = Hints::new(50, 20).shrink_to(20, 5);
    let r = place(&hints, &Anchors::bare(area), 1).unwrap();
    assert_eq!((r.width(), r.height()), (28, 8));

    let hints = Hints::new(50, 20).shrink_to(29, 5);
    assert!(matches!(
      place(&hints, &Anchors::bare(area), 1),
      Err(Error::Placement { .. })
    ));
  }

  #[test]
  fn offsets_clamp_to_area() {
    let anchors = Anchors {
      area: Rect::with_dims(80, 24),
      map: Some(Rect::new(0, 1, 80, 22)),
      top: Some(Rect::new(60, 10, 10, 5)),
    };
    let hints = Hints::new(20, 5).placement(Placement::OffsetFromTop { dx: 5, dy: 2 });
    let r = place(&hints, &anchors, 0).unwrap();
    assert_eq!(r, Rect::new(60, 12, 20, 5));

    let hints = Hints::new(20, 5).placement(Placement::TopLeftOfMap);
    assert_eq!(place(&hints, &anchors, 0).unwrap(), Rect::new(0, 1, 20, 5));

    let hints = Hints::new(4, 1).placement(Placement::FullScreen);
    assert_eq!(place(&hints, &anchors, 1).unwrap(), Rect::with_dims(80, 24));
  }
}
