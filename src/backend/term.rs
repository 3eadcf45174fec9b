//! The character-cell terminal backend.
//!
//! Permanent surfaces are fixed regions of the terminal, computed by
//! [`Layout`]. Transient surfaces are boxed panels drawn over them; the
//! backend remembers what each panel covers and puts it back when the panel
//! goes away. Drawing to a surface that is partly hidden under a panel updates
//! that saved copy instead of the screen.
//!
//! All output goes through crossterm. The backend keeps a shadow copy of the
//! screen so that it never re-sends a cell that is already showing.
//!
//! Write errors can't be reported from the drawing calls themselves; the first
//! one is held and returned from the next [`Backend::handle_event()`].

use std::collections::VecDeque;
use std::io;
use std::io::IsTerminal;
use std::thread;
use std::time::Duration;

use crossterm::event as ct;

use crate::backend::Backend;
use crate::backend::Candidate;
use crate::backend::CreateRequest;
use crate::backend::Cursor;
use crate::backend::Origin;
use crate::backend::Signal;
use crate::backend::SurfaceId;
use crate::backend::SurfaceInfo;
use crate::catalogue::SurfaceKind;
use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::event::Event;
use crate::event::Key;
use crate::event::KeyEvent;
use crate::event::Mods;
use crate::event::PointerEvent;
use crate::event::Target;
use crate::geo::Point;
use crate::geo::Rect;
use crate::gfx::texel::Flags;
use crate::gfx::Color;
use crate::gfx::PointBuffer;
use crate::gfx::Texel;
use crate::placement;
use crate::placement::Anchors;
use crate::placement::Placement;
use crate::region::Layout;

/// Box-drawing glyphs: corners clockwise from the upper left, then
/// horizontal and vertical edges.
const BOX: [char; 6] = ['┌', '┐', '┘', '└', '─', '│'];

/// Lets the terminal backend be picked by [`crate::backend::select()`].
pub const CANDIDATE: Candidate = Candidate {
  name: "term",
  init: factory,
};

fn factory(_: &Config) -> Result<Box<dyn Backend>> {
  Ok(Box::new(Curses::init()?))
}

/// Looks up a `TERM_*` region override by variable name.
pub type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Where input comes from.
enum Source {
  /// The real terminal.
  Terminal,
  /// Events queued by whoever owns the backend.
  Queue(VecDeque<ct::Event>),
}

struct Tab {
  code: Key,
  span: Rect,
}

/// A transient surface: a boxed panel over whatever was on screen.
struct Panel {
  id: SurfaceId,
  frame: Rect,
  content: Rect,
  /// What the panel covers, in `frame`-relative coordinates.
  under: PointBuffer,
  tabs: Vec<Tab>,
}

/// A crossterm-driven terminal context.
pub struct Curses<W: io::Write = io::Stdout> {
  w: W,
  /// Whether this context put the terminal into raw mode, and so must take
  /// it back out.
  owns_terminal: bool,
  source: Source,
  lookup: Lookup,
  screen: Rect,
  layout: Layout,
  shadow: PointBuffer,
  permanents: Vec<(SurfaceId, SurfaceKind)>,
  panels: Vec<Panel>,
  cursors: Vec<(SurfaceId, Cursor)>,
  pending: VecDeque<Signal>,
  error: Option<io::Error>,
}

impl Curses {
  /// Takes over the terminal on stdout.
  ///
  /// Region overrides are read from the process environment.
  pub fn init() -> Result<Curses> {
    if !io::stdout().is_terminal() {
      return Err(Error::BackendInit {
        name: "term".to_string(),
        reason: "stdout is not a terminal".to_string(),
      });
    }
    let (cols, rows) = crossterm::terminal::size()?;
    let lookup: Lookup = Box::new(|var| std::env::var(var).ok());
    let mut curses = Curses::with(io::stdout(), cols as i32, rows as i32, lookup)?;

    crossterm::execute!(
      curses.w,
      crossterm::terminal::EnterAlternateScreen,
      crossterm::cursor::Hide,
      crossterm::terminal::DisableLineWrap,
      crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
      ct::EnableMouseCapture,
    )?;
    crossterm::terminal::enable_raw_mode()?;
    curses.owns_terminal = true;
    curses.source = Source::Terminal;

    tracing::info!(cols, rows, "terminal backend up");
    Ok(curses)
  }
}

impl<W: io::Write> Curses<W> {
  /// Creates a context that writes to `w` as if it were a `cols` by `rows`
  /// terminal, without touching any real terminal state.
  ///
  /// Input comes from [`Curses::push_input()`].
  pub fn with(w: W, cols: i32, rows: i32, lookup: Lookup) -> Result<Self> {
    let screen = Rect::with_dims(cols, rows);
    let layout = Layout::compute(screen, &lookup)?;
    Ok(Self {
      w,
      owns_terminal: false,
      source: Source::Queue(VecDeque::new()),
      lookup,
      screen,
      layout,
      shadow: PointBuffer::blank(cols.max(0) as usize, rows.max(0) as usize),
      permanents: Vec::new(),
      panels: Vec::new(),
      cursors: Vec::new(),
      pending: VecDeque::new(),
      error: None,
    })
  }

  /// Queues a raw terminal event, as if the user had produced it.
  pub fn push_input(&mut self, event: ct::Event) {
    match &mut self.source {
      Source::Queue(q) => q.push_back(event),
      Source::Terminal => tracing::warn!("ignoring synthetic input on a real terminal"),
    }
  }

  /// Returns what this backend believes is on screen.
  pub fn screen(&self) -> &PointBuffer {
    &self.shadow
  }

  /// Returns the screen row `row` as plain text.
  pub fn screen_line(&self, row: usize) -> String {
    self.shadow.row(row).iter().map(|t| t.visible_glyph()).collect()
  }

  /// Returns the underlying writer.
  pub fn writer(&self) -> &W {
    &self.w
  }

  fn note(&mut self, r: io::Result<()>) {
    if let Err(e) = r {
      if self.error.is_none() {
        tracing::error!(error = %e, "terminal write failed");
        self.error = Some(e);
      }
    }
  }

  /// Finds a surface, returning its content rectangle and the index of the
  /// first panel above it.
  fn locate(&self, id: SurfaceId) -> Option<(Rect, usize)> {
    if let Some((_, kind)) = self.permanents.iter().find(|(i, _)| *i == id) {
      return self.layout.get(*kind).map(|r| (r, 0));
    }
    self
      .panels
      .iter()
      .position(|p| p.id == id)
      .map(|i| (self.panels[i].content, i + 1))
  }

  /// Writes `tx` at `p`, unless a panel from `above` up covers it, in which
  /// case the lowest such panel's saved copy is updated instead.
  fn put(&mut self, above: usize, p: Point, tx: Texel) {
    if !self.screen.contains(p) {
      return;
    }
    let n = self.panels.len();
    let covering = self.panels[above.min(n)..]
      .iter_mut()
      .find(|panel| panel.frame.contains(p));
    if let Some(panel) = covering {
      let local = p - panel.frame.upper_left();
      if let Some(cell) = panel.under.get_mut(local.x() as usize, local.y() as usize) {
        *cell = tx;
      }
      return;
    }
    self.show(p, tx);
  }

  /// Writes `tx` at `p` on screen.
  fn show(&mut self, p: Point, tx: Texel) {
    match self.shadow.get_mut(p.x() as usize, p.y() as usize) {
      Some(cell) => {
        if *cell == tx {
          return;
        }
        *cell = tx;
      }
      _ => return,
    }
    if tx.flags().contains(Flags::PADDING) {
      return;
    }

    use crossterm::style::Attribute;
    use crossterm::style::Colors;
    let mut r = crossterm::queue!(
      self.w,
      crossterm::cursor::MoveTo(p.x() as u16, p.y() as u16),
      crossterm::style::SetAttribute(Attribute::Reset),
      crossterm::style::SetColors(Colors {
        foreground: Some(to_crossterm(tx.fg().color)),
        background: Some(to_crossterm(tx.fill_color())),
      }),
    );
    for (flag, attr) in [
      (Flags::BOLD, Attribute::Bold),
      (Flags::DIM, Attribute::Dim),
      (Flags::UNDERLINE, Attribute::Underlined),
      (Flags::REVERSE, Attribute::Reverse),
    ] {
      if r.is_ok() && tx.flags().contains(flag) {
        r = crossterm::queue!(self.w, crossterm::style::SetAttribute(attr));
      }
    }
    if r.is_ok() {
      r = crossterm::queue!(self.w, crossterm::style::Print(tx.visible_glyph()));
    }
    self.note(r);
  }

  fn draw_box(&mut self, frame: Rect, color: Color) {
    let [ul, ur, lr, ll, h, v] = BOX;
    let edge = |c: char| Texel::new(c).with_fg(color);
    let (x0, y0) = (frame.x(), frame.y());
    let (x1, y1) = (frame.right() - 1, frame.bottom() - 1);
    for x in x0 + 1..x1 {
      self.show(Point::new(x, y0), edge(h));
      self.show(Point::new(x, y1), edge(h));
    }
    for y in y0 + 1..y1 {
      self.show(Point::new(x0, y), edge(v));
      self.show(Point::new(x1, y), edge(v));
    }
    self.show(Point::new(x0, y0), edge(ul));
    self.show(Point::new(x1, y0), edge(ur));
    self.show(Point::new(x1, y1), edge(lr));
    self.show(Point::new(x0, y1), edge(ll));
  }

  /// Recomputes the layout for a new terminal size, queuing resize signals
  /// for every surface that changed.
  fn relayout(&mut self, cols: i32, rows: i32) {
    let screen = Rect::with_dims(cols, rows);
    let layout = match Layout::compute(screen, &self.lookup) {
      Ok(layout) => layout,
      Err(e) => {
        tracing::warn!(error = %e, cols, rows, "cannot lay out resized terminal; keeping old layout");
        return;
      }
    };
    if let Some((_, kind)) = self
      .permanents
      .iter()
      .find(|(_, kind)| layout.get(*kind).is_none())
    {
      tracing::warn!(%kind, cols, rows, "surface no longer fits; keeping old layout");
      return;
    }

    for (id, kind) in &self.permanents {
      let (old, new) = match (self.layout.get(*kind), layout.get(*kind)) {
        (Some(old), Some(new)) => (old, new),
        _ => continue,
      };
      if (old.width(), old.height()) != (new.width(), new.height()) {
        self.pending.push_back(Signal::Resize {
          id: *id,
          cols: new.width(),
          rows: new.height(),
        });
      }
    }

    self.screen = screen;
    self.layout = layout;
    self.shadow = PointBuffer::blank(cols as usize, rows as usize);
    let r = crossterm::queue!(
      self.w,
      crossterm::style::ResetColor,
      crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
    );
    self.note(r);

    // Panels keep their place; whatever they covered is gone, and everything
    // needs to be drawn again.
    for i in 0..self.panels.len() {
      let frame = self.panels[i].frame;
      self.panels[i].under.fill(Texel::blank());
      if frame != self.panels[i].content {
        self.draw_box(frame, Color::Reset);
      }
    }
    let ids: Vec<SurfaceId> = self
      .permanents
      .iter()
      .map(|(id, _)| *id)
      .chain(self.panels.iter().map(|p| p.id))
      .collect();
    self.pending.extend(ids.into_iter().map(Signal::Invalidate));
    tracing::debug!(cols, rows, "terminal resized");
  }

  fn pointer(&self, m: ct::MouseEvent) -> Option<Event> {
    let button = match m.kind {
      ct::MouseEventKind::Down(ct::MouseButton::Left) => 1,
      ct::MouseEventKind::Down(ct::MouseButton::Middle) => 2,
      ct::MouseEventKind::Down(ct::MouseButton::Right) => 3,
      _ => return None,
    };
    let p = Point::new(m.column as i32, m.row as i32);
    let mods = to_mods(m.modifiers);

    for (slot, panel) in self.panels.iter().enumerate().rev() {
      if let Some(tab) = panel.tabs.iter().find(|t| t.span.contains(p)) {
        return Some(Event::Key(KeyEvent { code: tab.code, mods }));
      }
      if !panel.frame.contains(p) {
        continue;
      }
      if !panel.content.contains(p) {
        return None;
      }
      let local = p - panel.content.upper_left();
      return Some(Event::Pointer(PointerEvent {
        x: local.x(),
        y: local.y(),
        button,
        mods,
        target: Target::Transient(slot),
      }));
    }

    self.permanents.iter().find_map(|(_, kind)| {
      let region = self.layout.get(*kind)?;
      if !region.contains(p) {
        return None;
      }
      let local = p - region.upper_left();
      Some(Event::Pointer(PointerEvent {
        x: local.x(),
        y: local.y(),
        button,
        mods,
        target: Target::Permanent(*kind),
      }))
    })
  }

  fn translate(&mut self, event: ct::Event) -> Option<Signal> {
    match event {
      ct::Event::Key(k) => to_key(k).map(|k| Signal::Input(Event::Key(k))),
      ct::Event::Mouse(m) => self.pointer(m).map(Signal::Input),
      ct::Event::Resize(cols, rows) => {
        self.relayout(cols as i32, rows as i32);
        self.pending.pop_front()
      }
      _ => None,
    }
  }

  fn next_raw(&mut self, wait: Option<Duration>) -> io::Result<Option<ct::Event>> {
    match &mut self.source {
      Source::Queue(q) => Ok(q.pop_front()),
      Source::Terminal => {
        if ct::poll(wait.unwrap_or_default())? {
          ct::read().map(Some)
        } else {
          Ok(None)
        }
      }
    }
  }

  /// Hands the terminal back the way it was found.
  fn cleanup(&mut self) {
    if !self.owns_terminal {
      return;
    }
    self.owns_terminal = false;
    let _ = crossterm::execute!(
      self.w,
      ct::DisableMouseCapture,
      crossterm::style::ResetColor,
      crossterm::terminal::LeaveAlternateScreen,
      crossterm::cursor::Show,
      crossterm::terminal::EnableLineWrap,
    );
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = self.w.flush();
  }
}

impl<W: io::Write> Backend for Curses<W> {
  fn name(&self) -> &'static str {
    "term"
  }

  fn on_create(&mut self, req: &CreateRequest) -> Result<SurfaceInfo> {
    match req.origin {
      Origin::Permanent(kind) => {
        let region = self.layout.get(kind).ok_or_else(|| {
          let d = kind.descriptor();
          Error::placement(d.min, (self.screen.width(), self.screen.height()))
        })?;
        self.permanents.push((req.id, kind));
        Ok(SurfaceInfo {
          cols: region.width(),
          rows: region.height(),
        })
      }
      Origin::Transient { slot, hints } => {
        debug_assert_eq!(slot, self.panels.len());
        let map = self
          .permanents
          .iter()
          .find(|(_, k)| *k == SurfaceKind::Map)
          .and_then(|_| self.layout.get(SurfaceKind::Map));
        let anchors = Anchors {
          area: self.screen,
          map,
          top: req.top.and_then(|id| self.locate(id)).map(|(r, _)| r),
        };
        let frame_width = match hints.placement {
          Placement::FullScreen => 0,
          _ => 1,
        };
        let content = placement::place(&hints, &anchors, frame_width)?;
        let frame = content.inset(-frame_width);

        let mut under = PointBuffer::blank(frame.width() as usize, frame.height() as usize);
        for p in frame.points() {
          let local = p - frame.upper_left();
          if let (Some(src), Some(dst)) = (
            self.shadow.get(p.x() as usize, p.y() as usize),
            under.get_mut(local.x() as usize, local.y() as usize),
          ) {
            *dst = *src;
          }
        }
        self.panels.push(Panel {
          id: req.id,
          frame,
          content,
          under,
          tabs: Vec::new(),
        });

        if frame_width > 0 {
          self.draw_box(frame, Color::Reset);
        }
        for p in content.points() {
          self.show(p, Texel::blank());
        }
        tracing::debug!(?frame, purpose = ?hints.purpose, "opened panel");
        Ok(SurfaceInfo {
          cols: content.width(),
          rows: content.height(),
        })
      }
    }
  }

  fn on_destroy(&mut self, id: SurfaceId) {
    self.cursors.retain(|(i, _)| *i != id);
    if let Some(i) = self.permanents.iter().position(|(i, _)| *i == id) {
      self.permanents.remove(i);
      return;
    }
    let i = match self.panels.iter().position(|p| p.id == id) {
      Some(i) => i,
      None => return,
    };
    debug_assert_eq!(i + 1, self.panels.len(), "panels must close in order");
    let panel = self.panels.remove(i);
    for p in panel.frame.points() {
      let local = p - panel.frame.upper_left();
      if let Some(tx) = panel.under.get(local.x() as usize, local.y() as usize) {
        self.put(i, p, *tx);
      }
    }
  }

  fn draw_points(&mut self, id: SurfaceId, col: i32, row: i32, points: &[Texel]) {
    let (content, above) = match self.locate(id) {
      Some(found) => found,
      None => return,
    };
    for (i, tx) in points.iter().enumerate() {
      let p = content.upper_left() + Point::new(col + i as i32, row);
      if content.contains(p) {
        self.put(above, p, *tx);
      }
    }
  }

  fn move_region(&mut self, _: SurfaceId, _: Point, _: Point, _: i32, _: i32) -> bool {
    false
  }

  fn set_cursor(&mut self, id: SurfaceId, cursor: Cursor) {
    match self.cursors.iter_mut().find(|(i, _)| *i == id) {
      Some(entry) => entry.1 = cursor,
      None => self.cursors.push((id, cursor)),
    }
  }

  fn redraw(&mut self, _: SurfaceId, delay: Duration) {
    // Only the cursor of the surface on top is ever shown.
    let top = match self.panels.last() {
      Some(panel) => Some(panel.id),
      None => self
        .permanents
        .iter()
        .find(|(_, k)| *k == SurfaceKind::Map)
        .map(|(id, _)| *id),
    };
    let cursor = top.and_then(|id| {
      let (content, _) = self.locate(id)?;
      let (_, c) = self.cursors.iter().find(|(i, _)| *i == id)?;
      let p = content.upper_left() + Point::new(c.col, c.row);
      (c.visible && content.contains(p)).then(|| p)
    });

    let r = match cursor {
      Some(p) => crossterm::queue!(
        self.w,
        crossterm::cursor::MoveTo(p.x() as u16, p.y() as u16),
        crossterm::cursor::Show,
      ),
      None => crossterm::queue!(self.w, crossterm::cursor::Hide),
    };
    let r = r.and_then(|_| self.w.flush());
    self.note(r);

    if !delay.is_zero() {
      thread::sleep(delay);
    }
  }

  fn handle_event(&mut self, wait: Option<Duration>) -> Result<Option<Signal>> {
    if let Some(e) = self.error.take() {
      return Err(e.into());
    }
    if let Some(signal) = self.pending.pop_front() {
      return Ok(Some(signal));
    }
    // Skip over events that mean nothing here, but only wait for the first.
    let mut wait = wait;
    while let Some(event) = self.next_raw(wait)? {
      if let Some(signal) = self.translate(event) {
        return Ok(Some(signal));
      }
      wait = None;
    }
    Ok(None)
  }

  fn flush_events(&mut self) {
    loop {
      match self.next_raw(None) {
        Ok(Some(ct::Event::Resize(cols, rows))) => self.relayout(cols as i32, rows as i32),
        Ok(Some(_)) => continue,
        Ok(None) => break,
        Err(e) => {
          self.note(Err(e));
          break;
        }
      }
    }
    self.pending.retain(|s| !matches!(s, Signal::Input(_)));
  }

  fn erase(&mut self, id: SurfaceId) {
    let (content, above) = match self.locate(id) {
      Some(found) => found,
      None => return,
    };
    for p in content.points() {
      self.put(above, p, Texel::blank());
    }
  }

  fn add_tab(&mut self, id: SurfaceId, code: Key, label: &str, fg: Color, bg: Color) {
    let i = match self.panels.iter().position(|p| p.id == id) {
      Some(i) if self.panels[i].frame != self.panels[i].content => i,
      _ => {
        tracing::debug!(?id, label, "surface has no border to put a tab on");
        return;
      }
    };

    let frame = self.panels[i].frame;
    let x = self.panels[i]
      .tabs
      .last()
      .map(|t| t.span.right() + 1)
      .unwrap_or(frame.x() + 2);
    let text = format!(" {} ", label);
    let width = text.chars().count() as i32;
    if x + width > frame.right() - 2 {
      tracing::debug!(label, "no room left on the border for tab");
      return;
    }

    let span = Rect::new(x, frame.y(), width, 1);
    self.panels[i].tabs.push(Tab { code, span });
    for (p, c) in span.points().zip(text.chars()) {
      let tx = Texel::new(c).with_fg(fg).with_bg(' ', bg);
      self.put(i + 1, p, tx);
    }
  }
}

impl<W: io::Write> Drop for Curses<W> {
  fn drop(&mut self) {
    self.cleanup();
  }
}

fn to_crossterm(color: Color) -> crossterm::style::Color {
  match color {
    Color::Rgb(rgb) => crossterm::style::Color::Rgb {
      r: rgb.red,
      g: rgb.green,
      b: rgb.blue,
    },
    Color::Reset => crossterm::style::Color::Reset,
  }
}

fn to_mods(m: ct::KeyModifiers) -> Mods {
  let mut mods = Mods::empty();
  for (from, to) in [
    (ct::KeyModifiers::SHIFT, Mods::SHIFT),
    (ct::KeyModifiers::CONTROL, Mods::CONTROL),
    (ct::KeyModifiers::ALT, Mods::ALT),
    (ct::KeyModifiers::META, Mods::META),
    (ct::KeyModifiers::SUPER, Mods::META),
  ] {
    if m.contains(from) {
      mods |= to;
    }
  }
  mods
}

fn to_key(k: ct::KeyEvent) -> Option<KeyEvent> {
  if k.kind == ct::KeyEventKind::Release {
    return None;
  }
  let mut mods = to_mods(k.modifiers);
  if k.state.contains(ct::KeyEventState::KEYPAD) {
    mods |= Mods::KEYPAD;
  }
  let code = match k.code {
    ct::KeyCode::Char(c) => Key::Char(c),
    ct::KeyCode::Enter => Key::Enter,
    ct::KeyCode::Esc => Key::Escape,
    ct::KeyCode::Backspace => Key::Backspace,
    ct::KeyCode::Tab => Key::Tab,
    ct::KeyCode::BackTab => {
      mods |= Mods::SHIFT;
      Key::Tab
    }
    ct::KeyCode::Up => Key::Up,
    ct::KeyCode::Down => Key::Down,
    ct::KeyCode::Left => Key::Left,
    ct::KeyCode::Right => Key::Right,
    ct::KeyCode::Home => Key::Home,
    ct::KeyCode::End => Key::End,
    ct::KeyCode::PageUp => Key::PageUp,
    ct::KeyCode::PageDown => Key::PageDown,
    ct::KeyCode::Insert => Key::Insert,
    ct::KeyCode::Delete => Key::Delete,
    ct::KeyCode::F(n) => Key::F(n),
    _ => return None,
  };
  Some(KeyEvent { code, mods })
}
