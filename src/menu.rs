//! Menus.
//!
//! A [`Menu`] is a cursor over a list of rows, some of which may be
//! disabled. It knows nothing about drawing beyond the surface stack's own
//! contract: [`Menu::run()`] pushes a surface, draws into it, reads input
//! from it, and pops it again.
//!
//! [`PanelChain`] holds nested side-by-side panels, such as a menu and the
//! submenus it opened.

use std::fmt;
use std::time::Duration;
use std::time::Instant;

use crate::error::Error;
use crate::error::Result;
use crate::event::Event;
use crate::event::Key;
use crate::event::Mods;
use crate::event::Target;
use crate::gfx::texel::colors;
use crate::gfx::texel::Flags;
use crate::gfx::Texel;
use crate::placement::Hints;
use crate::placement::Placement;
use crate::placement::Purpose;
use crate::stack::Display;

/// How close together two activations of the same row must be to count as a
/// double activation.
pub const DOUBLE_ACTIVATION: Duration = Duration::from_millis(400);

/// What an input event means to a menu.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
  /// The cursor moved to this row.
  Moved(usize),
  /// This row was chosen.
  Selected(usize),
  /// The menu should close without a choice.
  Escaped,
  /// The user wants a neighboring menu; carries the direction key.
  Switched(Key),
  /// The event means nothing to this menu.
  Ignored,
}

struct Row {
  label: String,
  tag: Option<char>,
}

/// A list of rows with a cursor.
pub struct Menu {
  title: Option<String>,
  rows: Vec<Row>,
  cursor: usize,
  valid: Box<dyn Fn(usize) -> bool>,
  double: Duration,
  last: Option<(usize, Instant)>,
}

impl fmt::Debug for Menu {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Menu")
      .field("title", &self.title)
      .field("rows", &self.rows.len())
      .field("cursor", &self.cursor)
      .finish()
  }
}

impl Menu {
  /// Creates a menu with one row per label, tagged `a`, `b`, `c`, and so on.
  pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
    let rows = labels
      .into_iter()
      .enumerate()
      .map(|(i, label)| Row {
        label: label.into(),
        tag: (i < 26).then(|| (b'a' + i as u8) as char),
      })
      .collect();
    Self {
      title: None,
      rows,
      cursor: 0,
      valid: Box::new(|_| true),
      double: DOUBLE_ACTIVATION,
      last: None,
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  /// Disables every row for which `valid` returns false.
  pub fn with_validity(mut self, valid: impl Fn(usize) -> bool + 'static) -> Self {
    self.valid = Box::new(valid);
    self.cursor = self.step(0, 0).unwrap_or(0);
    self
  }

  pub fn with_double_activation(mut self, window: Duration) -> Self {
    self.double = window;
    self
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn is_valid(&self, row: usize) -> bool {
    row < self.rows.len() && (self.valid)(row)
  }

  /// Finds the first valid row at or after `from`, stepping by `dir` and
  /// wrapping around. A `dir` of zero steps forward.
  fn step(&self, from: usize, dir: i32) -> Option<usize> {
    let n = self.rows.len() as i32;
    if n == 0 {
      return None;
    }
    let dir = if dir < 0 { -1 } else { 1 };
    (0..n)
      .map(|i| (from as i32 + dir * i).rem_euclid(n) as usize)
      .find(|&row| self.is_valid(row))
  }

  fn row_of_tag(&self, c: char) -> Option<usize> {
    self.rows.iter().position(|r| r.tag == Some(c))
  }

  /// Registers an activation of `row`, returning whether it is the second
  /// one in a row within the double-activation window.
  fn activate(&mut self, row: usize, now: Instant) -> bool {
    let double = matches!(self.last, Some((r, t)) if r == row && now.duration_since(t) <= self.double);
    self.last = if double { None } else { Some((row, now)) };
    double
  }

  /// Interprets an input event, updating the cursor.
  ///
  /// `target` is the surface the menu is drawn on; pointer events elsewhere
  /// are ignored. `header` is how many rows of the surface precede the first
  /// menu row.
  pub fn classify(&mut self, event: &Event, target: Target, header: i32, now: Instant) -> Outcome {
    let moved = |menu: &mut Self, row: Option<usize>| match row {
      Some(row) => {
        menu.cursor = row;
        Outcome::Moved(row)
      }
      None => Outcome::Ignored,
    };

    match *event {
      Event::Key(k) => {
        let keypad = k.mods.contains(Mods::KEYPAD);
        match k.code {
          Key::Up => moved(self, self.step(self.cursor.wrapping_sub(1), -1)),
          Key::Down => moved(self, self.step(self.cursor + 1, 1)),
          Key::Char('8') if keypad => moved(self, self.step(self.cursor.wrapping_sub(1), -1)),
          Key::Char('2') if keypad => moved(self, self.step(self.cursor + 1, 1)),
          Key::Home | Key::PageUp => moved(self, self.step(0, 1)),
          Key::End | Key::PageDown => moved(self, self.step(self.rows.len().wrapping_sub(1), -1)),
          Key::Left | Key::Right => Outcome::Switched(k.code),
          Key::Char('4') if keypad => Outcome::Switched(Key::Left),
          Key::Char('6') if keypad => Outcome::Switched(Key::Right),
          Key::Escape => Outcome::Escaped,
          Key::Enter | Key::Char(' ') if self.is_valid(self.cursor) => {
            Outcome::Selected(self.cursor)
          }
          Key::Char(c) => match self.row_of_tag(c) {
            Some(row) if self.is_valid(row) => {
              self.cursor = row;
              Outcome::Selected(row)
            }
            _ => Outcome::Ignored,
          },
          _ => Outcome::Ignored,
        }
      }
      Event::Pointer(p) => {
        if p.target != target {
          return Outcome::Ignored;
        }
        if p.button != 1 {
          return Outcome::Escaped;
        }
        let row = p.y - header;
        if row < 0 || !self.is_valid(row as usize) {
          return Outcome::Ignored;
        }
        let row = row as usize;
        // The first click moves the cursor; a quick second click chooses.
        if self.activate(row, now) {
          Outcome::Selected(row)
        } else {
          self.cursor = row;
          Outcome::Moved(row)
        }
      }
    }
  }

  /// Returns the hints for a surface big enough to show this menu.
  pub fn hints(&self) -> Hints {
    let width = self
      .rows
      .iter()
      .map(|r| r.label.chars().count() + 3)
      .chain(self.title.iter().map(|t| t.chars().count()))
      .max()
      .unwrap_or(1) as i32;
    let height = self.rows.len() as i32 + self.header();
    Hints::new(width, height)
      .shrink_to(width.min(8), height.min(self.header() + 1))
      .placement(Placement::CenterScreen)
      .purpose(Purpose::Menu)
  }

  fn header(&self) -> i32 {
    self.title.is_some() as i32
  }

  /// Draws the menu into the display's draw target.
  pub fn render(&self, display: &mut Display) {
    let (cols, rows) = match display.size(display.draw_target()) {
      Some(size) => size,
      None => return,
    };
    display.erase_all();
    let header = self.header();
    if let Some(title) = &self.title {
      display.print(0, 0, title, colors::YELLOW.into());
    }

    // Scroll just far enough to keep the cursor on screen.
    let visible = (rows - header).max(0) as usize;
    let first = (self.cursor + 1).saturating_sub(visible);
    for (screen_row, i) in (first..self.rows.len()).take(visible).enumerate() {
      let row = &self.rows[i];
      let text = match row.tag {
        Some(tag) => format!("{}) {}", tag, row.label),
        None => format!("   {}", row.label),
      };
      let mut tx = Texel::blank().with_fg(if self.is_valid(i) {
        colors::WHITE
      } else {
        colors::GRAY
      });
      if i == self.cursor {
        tx = tx.with_flags(Flags::REVERSE);
      }
      let run: Vec<Texel> = text
        .chars()
        .take(cols.max(0) as usize)
        .map(|c| tx.with_glyph(c))
        .collect();
      display.draw(header + screen_row as i32, 0, &run);
    }
    display.set_cursor(false, 0, 0);
  }

  /// Shows the menu in its own surface until the user picks a row or backs
  /// out.
  ///
  /// Returns the outcome that closed the menu: [`Outcome::Selected`],
  /// [`Outcome::Escaped`] or [`Outcome::Switched`]. If no surface big enough
  /// for the menu can be opened, that error is returned and nothing is shown.
  pub fn run(&mut self, display: &mut Display) -> Result<Outcome> {
    let handle = display.push(self.hints())?;
    let target = handle.target();
    let result = self.interact(display, target);
    display.pop(handle);
    result
  }

  fn interact(&mut self, display: &mut Display, target: Target) -> Result<Outcome> {
    loop {
      self.render(display);
      display.flush();
      let event = match display.read_event(true)? {
        Some(event) => event,
        None => continue,
      };
      match self.classify(&event, target, self.header(), Instant::now()) {
        Outcome::Moved(_) | Outcome::Ignored => {}
        done => return Ok(done),
      }
    }
  }
}

/// One panel in a [`PanelChain`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Panel {
  pub title: String,
  pub lines: Vec<String>,
  next: Option<Box<Panel>>,
}

impl Panel {
  pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
    Self {
      title: title.into(),
      lines,
      next: None,
    }
  }

  fn width(&self) -> usize {
    self
      .lines
      .iter()
      .map(|l| l.chars().count())
      .chain(Some(self.title.chars().count()))
      .max()
      .unwrap_or(0)
  }
}

/// A chain of panels, each owning the next, with a fixed maximum length.
///
/// Nothing about the chain recurses, so its length is bounded only by its
/// capacity.
#[derive(Debug)]
pub struct PanelChain {
  head: Option<Box<Panel>>,
  len: usize,
  capacity: usize,
}

impl PanelChain {
  pub fn new(capacity: usize) -> Self {
    Self {
      head: None,
      len: 0,
      capacity,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Appends a panel, failing with [`Error::StackFull`] at capacity.
  pub fn push(&mut self, panel: Panel) -> Result<()> {
    if self.len >= self.capacity {
      return Err(Error::StackFull { depth: self.len });
    }
    let mut slot = &mut self.head;
    while let Some(node) = slot {
      slot = &mut node.next;
    }
    *slot = Some(Box::new(panel));
    self.len += 1;
    Ok(())
  }

  /// Removes the last panel.
  pub fn pop(&mut self) -> Option<Panel> {
    let mut slot = &mut self.head;
    for _ in 1..self.len {
      match slot {
        Some(node) => slot = &mut node.next,
        None => break,
      }
    }
    let last = slot.take()?;
    self.len -= 1;
    Some(*last)
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      next: self.head.as_deref(),
    }
  }

  /// Draws the panels side by side into the display's draw target, stopping
  /// at the first that doesn't fit.
  pub fn render(&self, display: &mut Display) {
    let (cols, rows) = match display.size(display.draw_target()) {
      Some(size) => size,
      None => return,
    };
    let mut x = 0;
    for panel in self.iter() {
      let width = panel.width() as i32;
      if x + width > cols {
        break;
      }
      display.print(0, x, &panel.title, colors::YELLOW.into());
      for (i, line) in panel.lines.iter().enumerate().take((rows - 1).max(0) as usize) {
        display.print(i as i32 + 1, x, line, colors::WHITE.into());
      }
      x += width + 1;
    }
  }
}

impl Drop for PanelChain {
  fn drop(&mut self) {
    let mut next = self.head.take();
    while let Some(mut panel) = next {
      next = panel.next.take();
    }
  }
}

/// Iterator over the panels of a [`PanelChain`], first to last.
pub struct Iter<'a> {
  next: Option<&'a Panel>,
}

impl<'a> Iterator for Iter<'a> {
  type Item = &'a Panel;

  fn next(&mut self) -> Option<&'a Panel> {
    let panel = self.next?;
    self.next = panel.next.as_deref();
    Some(panel)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::KeyEvent;
  use crate::event::PointerEvent;

  fn key(k: Key) -> Event {
    Event::Key(KeyEvent::new(k))
  }

  #[test]
  fn cursor_skips_invalid_rows() {
    let mut menu = Menu::new(["a", "b", "c", "d"]).with_validity(|i| i != 1);
    let t = Target::Transient(0);
    let now = Instant::now();
    assert_eq!(menu.cursor(), 0);
    assert_eq!(menu.classify(&key(Key::Down), t, 0, now), Outcome::Moved(2));
    assert_eq!(menu.classify(&key(Key::Up), t, 0, now), Outcome::Moved(0));
    assert_eq!(menu.classify(&key(Key::Up), t, 0, now), Outcome::Moved(3));
    assert_eq!(menu.classify(&key(Key::Char('b')), t, 0, now), Outcome::Ignored);
    assert_eq!(menu.classify(&key(Key::Char('c')), t, 0, now), Outcome::Selected(2));
    assert_eq!(menu.classify(&key(Key::Escape), t, 0, now), Outcome::Escaped);
    assert_eq!(
      menu.classify(&key(Key::Right), t, 0, now),
      Outcome::Switched(Key::Right)
    );
  }

  #[test]
  fn double_click_selects() {
    let mut menu = Menu::new(["a", "b", "c"]).with_title("Pick");
    let t = Target::Transient(2);
    let click = Event::Pointer(PointerEvent {
      x: 3,
      y: 2,
      button: 1,
      mods: Mods::empty(),
      target: t,
    });
    let start = Instant::now();
    assert_eq!(menu.classify(&click, t, 1, start), Outcome::Moved(1));
    assert_eq!(
      menu.classify(&click, t, 1, start + Duration::from_millis(100)),
      Outcome::Selected(1)
    );

    // Too slow: the second click only moves.
    assert_eq!(menu.classify(&click, t, 1, start), Outcome::Moved(1));
    assert_eq!(
      menu.classify(&click, t, 1, start + Duration::from_millis(900)),
      Outcome::Moved(1)
    );

    // Clicks on other surfaces are none of our business.
    assert_eq!(
      menu.classify(&click, Target::Transient(0), 1, start),
      Outcome::Ignored
    );
  }

  #[test]
  fn chains_push_and_pop_in_order() {
    let mut chain = PanelChain::new(2);
    chain.push(Panel::new("one", vec![])).unwrap();
    chain.push(Panel::new("two", vec![])).unwrap();
    assert!(matches!(
      chain.push(Panel::new("three", vec![])),
      Err(Error::StackFull { depth: 2 })
    ));
    let titles: Vec<_> = chain.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["one", "two"]);
    assert_eq!(chain.pop().map(|p| p.title), Some("two".to_string()));
    assert_eq!(chain.len(), 1);
  }

  #[test]
  fn long_chains_drop_without_recursing() {
    let mut chain = PanelChain::new(100_000);
    let mut tail = &mut chain.head;
    for _ in 0..100_000 {
      let node = tail.insert(Box::new(Panel::new("", vec![])));
      tail = &mut node.next;
    }
    chain.len = 100_000;
    drop(chain);
  }
}
