//! The status bar across the top of every window.
//!
//! The bar is one row of system-font cells holding an "Arrange" toggle,
//! which switches the window between normal input and moving/resizing
//! subwindows, followed by whatever tabs have been added to surfaces in the
//! window.

use crate::backend::accel::device::FontMetrics;
use crate::backend::SurfaceId;
use crate::event::Key;
use crate::geo::Point;
use crate::geo::Rect;
use crate::gfx::texel::colors;
use crate::gfx::texel::Flags;
use crate::gfx::Color;
use crate::gfx::Texel;

/// Pixels above and below the text.
const PADDING: i32 = 2;

/// What clicking a status bar button does.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
  Arrange,
  Tab(Key),
}

#[derive(Clone, Debug)]
struct Button {
  label: String,
  action: Action,
  /// The surface a tab belongs to; the Arrange toggle has none.
  owner: Option<SurfaceId>,
  fg: Color,
  bg: Color,
  /// Where the button is, in cells; `None` if it didn't fit.
  cols: Option<(i32, i32)>,
}

/// A window's status bar.
#[derive(Clone, Debug)]
pub struct StatusBar {
  metrics: FontMetrics,
  width: i32,
  buttons: Vec<Button>,
  arranging: bool,
}

impl StatusBar {
  /// Returns the height of a bar using a font with these metrics.
  pub fn height_for(metrics: FontMetrics) -> i32 {
    metrics.cell_height + 2 * PADDING
  }

  pub fn new(metrics: FontMetrics, width: i32) -> Self {
    let mut bar = Self {
      metrics,
      width,
      buttons: vec![Button {
        label: "Arrange".to_string(),
        action: Action::Arrange,
        owner: None,
        fg: Color::Rgb(colors::WHITE),
        bg: Color::Rgb(colors::DIMGRAY),
        cols: None,
      }],
      arranging: false,
    };
    bar.reflow();
    bar
  }

  pub fn height(&self) -> i32 {
    Self::height_for(self.metrics)
  }

  /// Returns the bar's rectangle in window coordinates.
  pub fn rect(&self) -> Rect {
    Rect::with_dims(self.width, self.height())
  }

  pub fn arranging(&self) -> bool {
    self.arranging
  }

  pub fn set_arranging(&mut self, arranging: bool) {
    self.arranging = arranging;
  }

  pub fn resize(&mut self, width: i32) {
    self.width = width;
    self.reflow();
  }

  /// Adds a tab for surface `owner`, after any existing ones.
  pub fn add_tab(&mut self, owner: SurfaceId, code: Key, label: &str, fg: Color, bg: Color) {
    self.buttons.push(Button {
      label: label.to_string(),
      action: Action::Tab(code),
      owner: Some(owner),
      fg,
      bg,
      cols: None,
    });
    self.reflow();
  }

  /// Drops every tab belonging to `owner`, letting later tabs move left.
  pub fn remove_tabs(&mut self, owner: SurfaceId) {
    let before = self.buttons.len();
    self.buttons.retain(|b| b.owner != Some(owner));
    if self.buttons.len() != before {
      self.reflow();
    }
  }

  fn reflow(&mut self) {
    let cols = self.width / self.metrics.cell_width;
    let mut at = 1;
    for b in &mut self.buttons {
      let len = b.label.chars().count() as i32 + 2;
      if at + len > cols {
        b.cols = None;
        continue;
      }
      b.cols = Some((at, at + len));
      at += len + 1;
    }
  }

  /// Returns the button under `p`, in window coordinates.
  pub fn hit(&self, p: Point) -> Option<Action> {
    if !self.rect().contains(p) {
      return None;
    }
    let col = p.x() / self.metrics.cell_width;
    self
      .buttons
      .iter()
      .find(|b| matches!(b.cols, Some((a, z)) if (a..z).contains(&col)))
      .map(|b| b.action)
  }

  /// Renders the bar as a row of cells.
  pub fn render(&self) -> Vec<Texel> {
    let cols = (self.width / self.metrics.cell_width).max(0) as usize;
    let mut row = vec![Texel::blank(); cols];
    for b in &self.buttons {
      let (a, _) = match b.cols {
        Some(span) => span,
        None => continue,
      };
      let mut flags = Flags::empty();
      if b.action == Action::Arrange && self.arranging {
        flags |= Flags::REVERSE;
      }
      let text = format!(" {} ", b.label);
      for (cell, c) in row[a as usize..].iter_mut().zip(text.chars()) {
        *cell = Texel::new(c).with_fg(b.fg).with_bg(' ', b.bg).with_flags(flags);
      }
    }
    row
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buttons_flow_left_to_right() {
    let mut bar = StatusBar::new(FontMetrics::new(10, 16), 200);
    assert_eq!(bar.height(), 20);
    bar.add_tab(SurfaceId(1), Key::Char('i'), "Inv", Color::Reset, Color::Reset);
    bar.add_tab(SurfaceId(2), Key::Char('z'), "Too long to fit", Color::Reset, Color::Reset);

    // " Arrange " covers columns 1..10, " Inv " 11..16.
    assert_eq!(bar.hit(Point::new(15, 5)), Some(Action::Arrange));
    assert_eq!(bar.hit(Point::new(125, 5)), Some(Action::Tab(Key::Char('i'))));
    assert_eq!(bar.hit(Point::new(175, 5)), None);
    assert_eq!(bar.hit(Point::new(125, 25)), None);

    let text: String = bar.render().iter().map(|t| t.visible_glyph()).collect();
    assert_eq!(text, "  Arrange   Inv     ");
  }

  #[test]
  fn removing_a_surfaces_tabs_reflows_the_rest() {
    let mut bar = StatusBar::new(FontMetrics::new(10, 16), 300);
    bar.add_tab(SurfaceId(1), Key::Char('i'), "Inv", Color::Reset, Color::Reset);
    bar.add_tab(SurfaceId(2), Key::Char('e'), "Eq", Color::Reset, Color::Reset);
    bar.add_tab(SurfaceId(1), Key::Char('d'), "Drop", Color::Reset, Color::Reset);

    bar.remove_tabs(SurfaceId(1));
    assert_eq!(bar.hit(Point::new(125, 5)), Some(Action::Tab(Key::Char('e'))));
    assert_eq!(bar.hit(Point::new(165, 5)), None);

    // Arrange belongs to no surface and stays put.
    bar.remove_tabs(SurfaceId(2));
    assert_eq!(bar.hit(Point::new(15, 5)), Some(Action::Arrange));
    assert_eq!(bar.hit(Point::new(125, 5)), None);
  }
}
