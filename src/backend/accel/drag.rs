//! Dragging subwindows around.
//!
//! A [`Drag`] lives from the pointer press that starts it to the release
//! that ends it. Every intermediate rectangle is computed from where the drag
//! started plus the total pointer delta, never incrementally, so replaying a
//! delta always lands in the same place.

use crate::catalogue::SurfaceKind;
use crate::geo::Point;
use crate::geo::Rect;

/// What a drag does to its subwindow.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Grab {
  Move,
  /// Resize by the corner in the grabbed quadrant; the opposite edges stay
  /// put.
  Resize { left: bool, top: bool },
}

/// An in-progress move or resize.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Drag {
  pub kind: SurfaceKind,
  pub window: usize,
  pub origin: Point,
  pub start: Rect,
  pub grab: Grab,
}

impl Drag {
  pub fn moving(kind: SurfaceKind, window: usize, origin: Point, start: Rect) -> Self {
    Self {
      kind,
      window,
      origin,
      start,
      grab: Grab::Move,
    }
  }

  /// Starts a resize, grabbing whichever corner is in the same quadrant as
  /// `origin`.
  pub fn resizing(kind: SurfaceKind, window: usize, origin: Point, start: Rect) -> Self {
    let off = origin - start.center();
    Self {
      kind,
      window,
      origin,
      start,
      grab: Grab::Resize {
        left: off.x() < 0,
        top: off.y() < 0,
      },
    }
  }
}

/// Returns `start` translated by `delta`, snapped to `others` and kept
/// within `inner`.
pub fn moved(start: Rect, delta: Point, others: &[Rect], inner: Rect, tolerance: i32) -> Rect {
  snap(start + delta, others, tolerance).clamp_within(inner)
}

/// Snaps `rect` into edge contact with the nearest of `others`.
///
/// An edge snaps if it is within `tolerance` of a facing edge of another
/// rectangle that overlaps it on the perpendicular axis; this pulls a
/// nearby rectangle in and pushes a slightly overlapping one out. Each axis
/// snaps independently, to its nearest candidate.
pub fn snap(rect: Rect, others: &[Rect], tolerance: i32) -> Rect {
  let mut dx: Option<i32> = None;
  let mut dy: Option<i32> = None;
  let consider = |best: &mut Option<i32>, d: i32| {
    if d.abs() <= tolerance && best.map_or(true, |b| d.abs() < b.abs()) {
      *best = Some(d);
    }
  };

  for o in others {
    if rect.overlaps_y(*o) {
      consider(&mut dx, o.right() - rect.x());
      consider(&mut dx, o.x() - rect.right());
    }
    if rect.overlaps_x(*o) {
      consider(&mut dy, o.bottom() - rect.y());
      consider(&mut dy, o.y() - rect.bottom());
    }
  }
  rect + Point::new(dx.unwrap_or(0), dy.unwrap_or(0))
}

/// Returns `start` with the grabbed corner moved by `delta`, capped at `max`
/// and clipped to `inner`, or `None` if that would make it smaller than
/// `min`.
///
/// The edges opposite the grabbed corner never move.
pub fn resized(
  start: Rect,
  delta: Point,
  (left, top): (bool, bool),
  (min, max): ((i32, i32), (i32, i32)),
  inner: Rect,
) -> Option<Rect> {
  let (mut x0, mut y0) = (start.x(), start.y());
  let (mut x1, mut y1) = (start.right(), start.bottom());
  if left {
    x0 = (x0 + delta.x()).max(x1 - max.0);
  } else {
    x1 = (x1 + delta.x()).min(x0 + max.0);
  }
  if top {
    y0 = (y0 + delta.y()).max(y1 - max.1);
  } else {
    y1 = (y1 + delta.y()).min(y0 + max.1);
  }
  let r = Rect::new(x0, y0, x1 - x0, y1 - y0).intersect(inner)?;
  (r.width() >= min.0 && r.height() >= min.1).then(|| r)
}

/// Moves `items[index]` to the end of its z-order bucket.
///
/// The list is stably partitioned by `bucket`, lowest first, with the moved
/// item placed after everything else in its bucket.
pub fn raise<T>(items: &mut Vec<T>, index: usize, bucket: impl Fn(&T) -> u8) {
  let item = items.remove(index);
  items.push(item);
  items.sort_by_key(|t| bucket(t));
}
