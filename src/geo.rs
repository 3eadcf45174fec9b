//! Geometry library.
//!
//! All geometry in this crate, whether measured in terminal cells or in
//! pixels, is expressed as [`Rect`] values. Rectangles are never mutated in
//! place; every operation returns a new one.
//!
//! We use the following convention for coordinates: x increases to the right
//! direction, and y in the downwards direction.

use std::ops::Add;
use std::ops::AddAssign;
use std::ops::Neg;
use std::ops::Sub;

use num::Integer;

/// A two-dimensional point.
///
/// `Point` values may be added and subtracted componentwise.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct Point {
  x: i32,
  y: i32,
}

impl Point {
  /// Creates a new `Point` with the given coordinates.
  #[inline]
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  /// Creates a new `Point` representing the origin.
  #[inline]
  pub const fn zero() -> Self {
    Self::new(0, 0)
  }

  /// Returns the `x` coordinate.
  #[inline]
  pub fn x(self) -> i32 {
    self.x
  }

  /// Returns the `y` coordinate.
  #[inline]
  pub fn y(self) -> i32 {
    self.y
  }
}

impl From<(i32, i32)> for Point {
  #[inline]
  fn from((x, y): (i32, i32)) -> Self {
    Self::new(x, y)
  }
}

impl Add for Point {
  type Output = Point;
  #[inline]
  fn add(self, other: Point) -> Point {
    Point::new(self.x + other.x, self.y + other.y)
  }
}

impl AddAssign for Point {
  #[inline]
  fn add_assign(&mut self, other: Point) {
    *self = *self + other;
  }
}

impl Sub for Point {
  type Output = Point;
  #[inline]
  fn sub(self, other: Point) -> Point {
    Point::new(self.x - other.x, self.y - other.y)
  }
}

impl Neg for Point {
  type Output = Point;
  #[inline]
  fn neg(self) -> Point {
    Point::new(-self.x, -self.y)
  }
}

/// A rectangle: an upper-left corner plus a width and a height.
///
/// Note that the points in a rectangle form an "exclusive" range; points
/// colinear with the right or bottom edge are *not* part of the rectangle.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct Rect {
  x: i32,
  y: i32,
  w: i32,
  h: i32,
}

impl Rect {
  /// Creates a new `Rect` from its upper-left corner and dimensions.
  #[inline]
  pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
    Self { x, y, w, h }
  }

  /// Creates a new `Rect` of the given dimensions with one corner at the
  /// origin.
  #[inline]
  pub const fn with_dims(w: i32, h: i32) -> Self {
    Self::new(0, 0, w, h)
  }

  /// Creates a new `Rect` of the given dimensions at `corner`.
  #[inline]
  pub fn at(corner: Point, w: i32, h: i32) -> Self {
    Self::new(corner.x(), corner.y(), w, h)
  }

  #[inline]
  pub fn x(self) -> i32 {
    self.x
  }

  #[inline]
  pub fn y(self) -> i32 {
    self.y
  }

  #[inline]
  pub fn width(self) -> i32 {
    self.w
  }

  #[inline]
  pub fn height(self) -> i32 {
    self.h
  }

  /// Returns the x coordinate one past the right edge.
  #[inline]
  pub fn right(self) -> i32 {
    self.x + self.w
  }

  /// Returns the y coordinate one past the bottom edge.
  #[inline]
  pub fn bottom(self) -> i32 {
    self.y + self.h
  }

  /// Returns the upper-left corner of this `Rect`.
  #[inline]
  pub fn upper_left(self) -> Point {
    Point::new(self.x, self.y)
  }

  /// Returns the (exclusive) lower-right corner of this `Rect`.
  #[inline]
  pub fn lower_right(self) -> Point {
    Point::new(self.right(), self.bottom())
  }

  /// Returns the area of this `Rect`.
  #[inline]
  pub fn area(self) -> i32 {
    self.w * self.h
  }

  /// Returns the center of this `Rect`, rounded towards the upper left.
  #[inline]
  pub fn center(self) -> Point {
    Point::new(
      self.x + Integer::div_floor(&self.w, &2),
      self.y + Integer::div_floor(&self.h, &2),
    )
  }

  /// Returns whether this `Rect` is empty.
  ///
  /// A `Rect` is considered empty if either dimension is non-positive.
  #[inline]
  pub fn is_empty(self) -> bool {
    self.w <= 0 || self.h <= 0
  }

  /// Returns whether this `Rect` contains a given point.
  #[inline]
  pub fn contains(self, p: Point) -> bool {
    (self.x..self.right()).contains(&p.x())
      && (self.y..self.bottom()).contains(&p.y())
  }

  /// Returns whether `other` lies entirely inside this `Rect`.
  #[inline]
  pub fn contains_rect(self, other: Rect) -> bool {
    other.x >= self.x
      && other.y >= self.y
      && other.right() <= self.right()
      && other.bottom() <= self.bottom()
  }

  /// Returns whether the horizontal extents of `self` and `other` overlap.
  #[inline]
  pub fn overlaps_x(self, other: Rect) -> bool {
    self.x < other.right() && other.x < self.right()
  }

  /// Returns whether the vertical extents of `self` and `other` overlap.
  #[inline]
  pub fn overlaps_y(self, other: Rect) -> bool {
    self.y < other.bottom() && other.y < self.bottom()
  }

  /// Computes the intersection of this `Rect` with `other`.
  ///
  /// Returns `None` if they do not intersect at all.
  pub fn intersect(self, other: Rect) -> Option<Rect> {
    let x1 = self.x.max(other.x);
    let y1 = self.y.max(other.y);
    let x2 = self.right().min(other.right());
    let y2 = self.bottom().min(other.bottom());
    if x1 >= x2 || y1 >= y2 {
      return None;
    }
    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
  }

  /// Returns this `Rect` with its upper-left corner moved to `corner`.
  #[inline]
  pub fn moved_to(self, corner: Point) -> Rect {
    Rect::at(corner, self.w, self.h)
  }

  /// Returns this `Rect` with the same corner and new dimensions.
  #[inline]
  pub fn with_size(self, w: i32, h: i32) -> Rect {
    Rect::new(self.x, self.y, w, h)
  }

  /// Shrinks every side of this `Rect` by `n`.
  ///
  /// The result may be empty.
  #[inline]
  pub fn inset(self, n: i32) -> Rect {
    Rect::new(self.x + n, self.y + n, self.w - 2 * n, self.h - 2 * n)
  }

  /// Centers this `Rect` inside `outer`.
  ///
  /// When the leftover space is odd, the extra unit goes to the right and
  /// bottom, i.e., ties round towards `outer`'s upper-left corner.
  pub fn centered_in(self, outer: Rect) -> Rect {
    let x = outer.x + Integer::div_floor(&(outer.w - self.w), &2);
    let y = outer.y + Integer::div_floor(&(outer.h - self.h), &2);
    Rect::new(x, y, self.w, self.h)
  }

  /// Forces this `Rect` inside `outer`.
  ///
  /// The rectangle is first shrunk to be no larger than `outer`, then shifted
  /// the minimum amount needed to lie entirely within it.
  pub fn clamp_within(self, outer: Rect) -> Rect {
    let w = self.w.min(outer.w);
    let h = self.h.min(outer.h);
    let x = num::clamp(self.x, outer.x, outer.right() - w);
    let y = num::clamp(self.y, outer.y, outer.bottom() - h);
    Rect::new(x, y, w, h)
  }

  /// Returns an iterator over all points in this rectangle.
  ///
  /// Points are traversed in row-major order.
  pub fn points(self) -> impl Iterator<Item = Point> {
    (self.y..self.bottom())
      .flat_map(move |y| (self.x..self.right()).map(move |x| Point::new(x, y)))
  }
}

impl Add<Point> for Rect {
  type Output = Rect;
  #[inline]
  fn add(self, offset: Point) -> Rect {
    self.moved_to(self.upper_left() + offset)
  }
}

impl Sub<Point> for Rect {
  type Output = Rect;
  #[inline]
  fn sub(self, offset: Point) -> Rect {
    self + -offset
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn intersection_is_exclusive() {
    let a = Rect::new(0, 0, 10, 10);
    let b = Rect::new(10, 0, 5, 5);
    assert_eq!(a.intersect(b), None);

    let c = Rect::new(5, 5, 10, 10);
    assert_eq!(a.intersect(c), Some(Rect::new(5, 5, 5, 5)));
  }

  #[test]
  fn centering_rounds_towards_upper_left() {
    let area = Rect::with_dims(70, 20);
    let r = Rect::with_dims(40, 1).centered_in(area);
    assert_eq!(r.x(), 15);
    assert_eq!(r.y(), 9);

    let r = Rect::with_dims(40, 1).centered_in(Rect::with_dims(71, 20));
    assert_eq!(r.x(), 15);
  }

  #[test]
  fn clamping_shrinks_then_shifts() {
    let outer = Rect::new(0, 20, 300, 460);
    let r = Rect::new(250, 10, 200, 150).clamp_within(outer);
    assert_eq!(r, Rect::new(100, 20, 200, 150));

    let r = Rect::new(-50, 400, 500, 150).clamp_within(outer);
    assert_eq!(r, Rect::new(0, 330, 300, 150));
  }

  #[test]
  fn points_are_row_major() {
    let pts: Vec<_> = Rect::new(1, 1, 2, 2).points().collect();
    assert_eq!(
      pts,
      vec![
        Point::new(1, 1),
        Point::new(2, 1),
        Point::new(1, 2),
        Point::new(2, 2)
      ]
    );
  }
}
