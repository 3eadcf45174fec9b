//! The accelerated windowing backend.
//!
//! [`Accel`] realizes each permanent surface as a docked subwindow inside
//! one of several OS windows, and each transient surface as a floating
//! subwindow in whichever window hosts the surface below it. Each
//! subwindow's cells live in a texture owned by its window; frames are
//! composed from those textures by the [`Device`].
//!
//! Clicking "Arrange" in a window's status bar switches it into arrange mode,
//! where button 1 drags subwindows around and button 3 resizes them.
//! Outside arrange mode, pointer presses go to the surface under the pointer.
//!
//! Window and subwindow geometry can be saved to and restored from a
//! [`LayoutFile`].

pub mod device;
pub mod drag;
pub mod headless;
pub mod layout;
pub mod status;
pub mod subwindow;
pub mod window;

use std::collections::VecDeque;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::backend::Backend;
use crate::backend::CreateRequest;
use crate::backend::Cursor;
use crate::backend::Origin;
use crate::backend::Signal;
use crate::backend::SurfaceId;
use crate::backend::SurfaceInfo;
use crate::catalogue::SurfaceKind;
use crate::config::Config;
use crate::config::FontSpec;
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
use crate::gfx::Color;
use crate::gfx::Texel;
use crate::placement;
use crate::placement::Anchors;

pub use device::Device;
pub use device::FontMetrics;
pub use device::RawEvent;
pub use device::WindowHandle;
pub use drag::Drag;
pub use drag::Grab;
pub use headless::Headless;
pub use layout::LayoutFile;
pub use subwindow::Subwindow;
pub use window::Window;

use status::Action;
use subwindow::Floating;

/// Where a surface lives.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Loc {
  Docked { window: usize, index: usize },
  Floating { window: usize, index: usize },
}

impl Loc {
  fn window(self) -> usize {
    match self {
      Self::Docked { window, .. } | Self::Floating { window, .. } => window,
    }
  }
}

/// A windowed backend driving some [`Device`].
pub struct Accel<D: Device> {
  device: D,
  config: Config,
  windows: Vec<Window>,
  drag: Option<Drag>,
  pending: VecDeque<Signal>,
}

impl<D: Device> Accel<D> {
  /// Opens the windows of the saved layout named by `config`, or of the
  /// default layout if there is none or it can't be loaded.
  pub fn new(mut device: D, config: &Config) -> Result<Self> {
    let system = usable_metrics(&mut device, &config.fonts.system)?;
    let game = usable_metrics(&mut device, &config.fonts.game)?;
    let default = || {
      let bar = status::StatusBar::height_for(system);
      LayoutFile::default_for(config, game, bar)
    };

    let file = match &config.layout_file {
      Some(path) if path.exists() => match LayoutFile::load(path, config) {
        Ok(file) => match file.missing_required() {
          None => file,
          Some(kind) => {
            tracing::warn!(path = %path.display(), %kind, "layout has no place for a required surface; using default layout");
            default()
          }
        },
        Err(e) => {
          tracing::warn!(path = %path.display(), error = %e, "bad layout file; using default layout");
          default()
        }
      },
      _ => default(),
    };

    let mut accel = Self {
      device,
      config: config.clone(),
      windows: Vec::new(),
      drag: None,
      pending: VecDeque::new(),
    };
    accel.apply(file)?;
    Ok(accel)
  }

  fn apply(&mut self, file: LayoutFile) -> Result<()> {
    for (i, wc) in file.windows.into_iter().enumerate() {
      let handle = self
        .device
        .open_window(wc.display, wc.full_rect, wc.fullscreen)?;
      let system = load_metrics(&mut self.device, &[&wc.system_font, &self.config.fonts.system])?;
      let game = load_metrics(&mut self.device, &[&wc.game_font, &self.config.fonts.game])?;
      self.windows.push(Window::new(i, wc, handle, system, game)?);
    }

    for (i, sc) in file.subwindows.into_iter().enumerate() {
      let (kind, sc) = match (SurfaceKind::from_index(i), sc) {
        (Some(kind), Some(sc)) => (kind, sc),
        _ => continue,
      };
      let w = match self.windows.get(sc.window) {
        Some(w) => w,
        None => {
          tracing::warn!(%kind, window = sc.window, "subwindow in a missing window; dropped");
          continue;
        }
      };
      let inner = w.inner_rect();
      let metrics = load_metrics(
        &mut self.device,
        &[&sc.font, &w.config.game_font, &self.config.fonts.game],
      )?;
      let window = sc.window;
      let mut sub = Subwindow::new(kind, sc, metrics);
      if sub.in_error() || !inner.contains_rect(sub.rect()) {
        sub.refit(inner);
      }
      self.windows[window].dock(sub);
    }
    Ok(())
  }

  pub fn device(&self) -> &D {
    &self.device
  }

  pub fn device_mut(&mut self) -> &mut D {
    &mut self.device
  }

  pub fn windows(&self) -> &[Window] {
    &self.windows
  }

  /// Returns the docked subwindow for `kind`, wherever it is.
  pub fn subwindow(&self, kind: SurfaceKind) -> Option<&Subwindow> {
    let (w, i) = self.find_docked(kind)?;
    Some(&self.windows[w].docked[i])
  }

  /// Returns the drag in progress, if any.
  pub fn drag(&self) -> Option<&Drag> {
    self.drag.as_ref()
  }

  fn find_docked(&self, kind: SurfaceKind) -> Option<(usize, usize)> {
    self
      .windows
      .iter()
      .enumerate()
      .find_map(|(w, win)| win.docked_index(kind).map(|i| (w, i)))
  }

  fn find(&self, id: SurfaceId) -> Option<Loc> {
    self.windows.iter().enumerate().find_map(|(window, w)| {
      if let Some(index) = w.docked.iter().position(|s| s.id == Some(id)) {
        return Some(Loc::Docked { window, index });
      }
      let index = w.floating.iter().position(|f| f.id == id)?;
      Some(Loc::Floating { window, index })
    })
  }

  fn window_of(&self, handle: WindowHandle) -> Option<usize> {
    self.windows.iter().position(|w| w.handle == handle)
  }

  fn content_of(&self, loc: Loc) -> Rect {
    match loc {
      Loc::Docked { window, index } => self.windows[window].docked[index].content(),
      Loc::Floating { window, index } => self.windows[window].floating[index].content(),
    }
  }

  fn present(&mut self, window: usize) {
    let w = &self.windows[window];
    let frame = w.frame();
    self.device.present(w.handle, &frame);
  }

  /// Moves the subwindow for `kind` into another window.
  ///
  /// Its texture can't follow it, so it is destroyed through the old window
  /// and recreated through the new one; the surface stack is told to redraw
  /// it (and to resize it, if it had to shrink to fit).
  ///
  /// # Panics
  ///
  /// Panics if there is no such window or subwindow.
  pub fn reparent(&mut self, kind: SurfaceKind, to: usize) -> Result<()> {
    assert!(to < self.windows.len(), "no window {}", to);
    let (from, i) = self
      .find_docked(kind)
      .unwrap_or_else(|| panic!("no subwindow for {}", kind));
    if from == to {
      return Ok(());
    }

    let old = &mut self.windows[from];
    let mut sub = old.docked.remove(i);
    if let Some(tex) = sub.texture.take() {
      self.device.destroy_texture(old.handle, tex);
    }
    sub.config.window = to;
    let resized = sub.refit(self.windows[to].inner_rect());
    self.windows[to].dock(sub);
    self.windows[to].bring_to_top(kind);
    tracing::debug!(%kind, from, to, "reparented subwindow");

    let new = &mut self.windows[to];
    if let Some(index) = new.docked_index(kind) {
      let sub = &mut new.docked[index];
      if let Some(id) = sub.id {
        let (cols, rows) = sub.cells();
        sub.texture = Some(self.device.create_texture(new.handle, cols, rows, &sub.config.font)?);
        self.pending.push_back(if resized {
          Signal::Resize { id, cols, rows }
        } else {
          Signal::Invalidate(id)
        });
      }
    }
    self.present(from);
    self.present(to);
    Ok(())
  }

  /// Recreates the texture of a surface whose grid changed, and tells the
  /// surface stack about it.
  fn rebuild(&mut self, loc: Loc) -> Result<()> {
    let w = &mut self.windows[loc.window()];
    let handle = w.handle;
    let (id, cols, rows) = match loc {
      Loc::Docked { index, .. } => {
        let s = &mut w.docked[index];
        let id = match s.id {
          Some(id) => id,
          None => return Ok(()),
        };
        let (cols, rows) = s.cells();
        let tex = self.device.create_texture(handle, cols, rows, &s.config.font)?;
        if let Some(old) = s.texture.replace(tex) {
          self.device.destroy_texture(handle, old);
        }
        (id, cols, rows)
      }
      Loc::Floating { index, .. } => {
        let f = &mut w.floating[index];
        let tex = self.device.create_texture(handle, f.cols, f.rows, &f.font)?;
        let old = std::mem::replace(&mut f.texture, tex);
        self.device.destroy_texture(handle, old);
        (f.id, f.cols, f.rows)
      }
    };
    self.pending.push_back(Signal::Resize { id, cols, rows });
    Ok(())
  }

  /// Returns the layout as it stands now.
  pub fn layout(&self) -> LayoutFile {
    let mut subwindows = vec![None; SurfaceKind::COUNT];
    for (w, window) in self.windows.iter().enumerate() {
      for sub in &window.docked {
        let mut config = sub.config().clone();
        config.window = w;
        subwindows[sub.kind().index()] = Some(config);
      }
    }
    LayoutFile {
      windows: self.windows.iter().map(|w| w.config().clone()).collect(),
      subwindows,
    }
  }

  /// Saves the current layout to `path`.
  pub fn save_layout(&self, path: &Path) -> Result<()> {
    self.layout().save(path)
  }

  fn translate(&mut self, raw: RawEvent) -> Result<Option<Signal>> {
    match raw {
      RawEvent::Key(k) => Ok(Some(Signal::Input(Event::Key(k)))),
      RawEvent::PointerDown {
        window,
        at,
        button,
        mods,
      } => match self.window_of(window) {
        Some(w) => Ok(self.pointer_down(w, at, button, mods)),
        None => Ok(None),
      },
      RawEvent::PointerMove { at, .. } => {
        self.drag_to(at);
        Ok(None)
      }
      RawEvent::PointerUp { at, .. } => {
        self.drag_to(at);
        self.end_drag()?;
        Ok(None)
      }
      RawEvent::Resized {
        window,
        width,
        height,
      } => {
        if let Some(w) = self.window_of(window) {
          self.window_resized(w, width, height)?;
        }
        Ok(None)
      }
      RawEvent::Exposed { window } => {
        if let Some(w) = self.window_of(window) {
          let win = &self.windows[w];
          let ids: Vec<SurfaceId> = win
            .docked
            .iter()
            .filter_map(|s| s.id)
            .chain(win.floating.iter().map(|f| f.id))
            .collect();
          self.pending.extend(ids.into_iter().map(Signal::Invalidate));
          self.present(w);
        }
        Ok(None)
      }
    }
  }

  fn pointer_down(&mut self, w: usize, at: Point, button: u8, mods: Mods) -> Option<Signal> {
    let window = &mut self.windows[w];
    match window.status.hit(at) {
      Some(Action::Arrange) => {
        let arranging = !window.status.arranging();
        window.status.set_arranging(arranging);
        if !arranging {
          self.drag = None;
        }
        tracing::debug!(window = w, arranging, "toggled arrange mode");
        self.present(w);
        return None;
      }
      Some(Action::Tab(code)) => {
        return Some(Signal::Input(Event::Key(KeyEvent { code, mods })));
      }
      None => {}
    }

    if window.status.arranging() && (button == 1 || button == 3) {
      let i = window.docked_at(at)?;
      let sub = &window.docked[i];
      let (kind, rect) = (sub.kind(), sub.rect());
      window.bring_to_top(kind);
      self.drag = Some(if button == 1 {
        Drag::moving(kind, w, at, rect)
      } else {
        Drag::resizing(kind, w, at, rect)
      });
      self.present(w);
      return None;
    }

    if let Some(i) = window.floating_at(at) {
      let f = &window.floating[i];
      let cell = f.cell_at(at)?;
      return Some(pointer(cell, button, mods, Target::Transient(f.slot)));
    }
    let i = window.docked_at(at)?;
    let sub = &window.docked[i];
    let cell = sub.cell_at(at)?;
    Some(pointer(cell, button, mods, Target::Permanent(sub.kind())))
  }

  fn drag_to(&mut self, at: Point) {
    let d = match self.drag {
      Some(d) => d,
      None => return,
    };
    let window = &mut self.windows[d.window];
    let i = match window.docked_index(d.kind) {
      Some(i) => i,
      None => return,
    };
    let inner = window.inner_rect();
    let delta = at - d.origin;
    let rect = match d.grab {
      Grab::Move => {
        let others: Vec<Rect> = window
          .docked
          .iter()
          .enumerate()
          .filter(|(j, s)| *j != i && s.is_bound())
          .map(|(_, s)| s.rect())
          .collect();
        drag::moved(d.start, delta, &others, inner, self.config.snap_tolerance)
      }
      Grab::Resize { left, top } => {
        let sub = &window.docked[i];
        let limits = (sub.min_size(), sub.max_size());
        match drag::resized(d.start, delta, (left, top), limits, inner) {
          Some(r) => r,
          None => return,
        }
      }
    };
    window.docked[i].set_rect(rect);
    self.present(d.window);
  }

  fn end_drag(&mut self) -> Result<()> {
    let d = match self.drag.take() {
      Some(d) => d,
      None => return Ok(()),
    };
    let window = &mut self.windows[d.window];
    let index = match window.docked_index(d.kind) {
      Some(i) => i,
      None => return Ok(()),
    };
    if let Grab::Resize { left, top } = d.grab {
      let sub = &mut window.docked[index];
      let changed = sub.commit(left, top);
      let inner = window.inner_rect();
      let sub = &mut window.docked[index];
      if !inner.contains_rect(sub.rect()) {
        sub.refit(inner);
      }
      if changed {
        tracing::debug!(kind = %d.kind, cells = ?sub.cells(), "resized subwindow");
        self.rebuild(Loc::Docked {
          window: d.window,
          index,
        })?;
      }
    }
    self.present(d.window);
    Ok(())
  }

  fn window_resized(&mut self, w: usize, width: i32, height: i32) -> Result<()> {
    self.windows[w].resize(width, height)?;
    let inner = self.windows[w].inner_rect();

    // Front to back, so the subwindows on top keep the most cells.
    for index in (0..self.windows[w].docked.len()).rev() {
      if self.windows[w].docked[index].refit(inner) {
        self.rebuild(Loc::Docked { window: w, index })?;
      }
    }
    for index in (0..self.windows[w].floating.len()).rev() {
      if self.windows[w].floating[index].refit(inner) {
        self.rebuild(Loc::Floating { window: w, index })?;
      }
    }
    self.present(w);
    Ok(())
  }
}

/// Loads the first usable font of `fonts`, which must not be empty.
fn load_metrics<D: Device>(device: &mut D, fonts: &[&FontSpec]) -> Result<FontMetrics> {
  let mut last = None;
  for font in fonts {
    match usable_metrics(device, font) {
      Ok(m) => return Ok(m),
      Err(e) => {
        tracing::warn!(font = %font.name, error = %e, "font unavailable; trying fallback");
        last = Some(e);
      }
    }
  }
  Err(last.unwrap_or_else(|| Error::BackendInit {
    name: device.name().to_string(),
    reason: "no font to load".to_string(),
  }))
}

/// Loads `font`, rejecting fonts whose cells have no area.
fn usable_metrics<D: Device>(device: &mut D, font: &FontSpec) -> Result<FontMetrics> {
  let m = device.font_metrics(font)?;
  if !m.is_usable() {
    return Err(Error::BackendInit {
      name: device.name().to_string(),
      reason: format!("font {:?} has a {}x{} cell", font.name, m.cell_width, m.cell_height),
    });
  }
  Ok(m)
}

fn pointer(cell: Point, button: u8, mods: Mods, target: Target) -> Signal {
  Signal::Input(Event::Pointer(PointerEvent {
    x: cell.x(),
    y: cell.y(),
    button,
    mods,
    target,
  }))
}

impl<D: Device> Backend for Accel<D> {
  fn name(&self) -> &'static str {
    self.device.name()
  }

  fn on_create(&mut self, req: &CreateRequest) -> Result<SurfaceInfo> {
    match req.origin {
      Origin::Permanent(kind) => {
        let d = kind.descriptor();
        let (w, i) = self
          .find_docked(kind)
          .ok_or_else(|| Error::placement(d.min, (0, 0)))?;
        let window = &mut self.windows[w];
        let inner = window.inner_rect();
        let sub = &mut window.docked[i];
        let (cols, rows) = sub.cells();
        if sub.in_error() {
          let avail = sub.metrics().cells_in(inner.width(), inner.height());
          return Err(Error::placement(d.min, avail));
        }
        sub.texture = Some(self.device.create_texture(window.handle, cols, rows, &sub.config.font)?);
        sub.id = Some(req.id);
        tracing::debug!(%kind, window = w, cols, rows, "docked surface");
        self.present(w);
        Ok(SurfaceInfo { cols, rows })
      }
      Origin::Transient { slot, hints } => {
        let top = req.top.and_then(|id| self.find(id));
        let w = top
          .map(Loc::window)
          .or_else(|| self.find_docked(SurfaceKind::Map).map(|(w, _)| w))
          .unwrap_or(0);
        let to_cells = {
          let window = &self.windows[w];
          let inner = window.inner_rect();
          let m = window.game;
          move |r: Rect| {
            let off = r.upper_left() - inner.upper_left();
            let (cols, rows) = m.cells_in(r.width(), r.height());
            Rect::new(off.x() / m.cell_width, off.y() / m.cell_height, cols, rows)
          }
        };
        let window = &self.windows[w];
        let inner = window.inner_rect();
        let m = window.game;
        let border = Floating::BORDER;
        let area = inner.inset(border);
        let (cols, rows) = m.cells_in(area.width(), area.height());
        let map = window
          .docked_index(SurfaceKind::Map)
          .map(|i| &window.docked[i])
          .filter(|s| s.is_bound())
          .map(|s| to_cells(s.content()));
        let anchors = Anchors {
          area: Rect::with_dims(cols, rows),
          map,
          top: top
            .filter(|loc| loc.window() == w)
            .map(|loc| to_cells(self.content_of(loc))),
        };
        let cells = placement::place(&hints, &anchors, 0)?;
        let (pw, ph) = m.grid(cells.width(), cells.height());
        let corner = area.upper_left() + Point::new(cells.x() * m.cell_width, cells.y() * m.cell_height);
        let rect = Rect::at(corner - Point::new(border, border), pw + 2 * border, ph + 2 * border)
          .clamp_within(inner);

        let font = window.config.game_font.clone();
        let texture = self
          .device
          .create_texture(window.handle, cells.width(), cells.height(), &font)?;
        self.windows[w].floating.push(Floating {
          id: req.id,
          slot,
          rect,
          cols: cells.width(),
          rows: cells.height(),
          min: (hints.min_cols, hints.min_rows),
          font,
          metrics: m,
          texture,
          cursor: Cursor::default(),
        });
        tracing::debug!(slot, window = w, ?rect, "opened floating subwindow");
        self.present(w);
        Ok(SurfaceInfo {
          cols: cells.width(),
          rows: cells.height(),
        })
      }
    }
  }

  fn on_destroy(&mut self, id: SurfaceId) {
    let loc = match self.find(id) {
      Some(loc) => loc,
      None => return,
    };
    let window = &mut self.windows[loc.window()];
    match loc {
      Loc::Docked { index, .. } => {
        let sub = &mut window.docked[index];
        if let Some(tex) = sub.texture.take() {
          self.device.destroy_texture(window.handle, tex);
        }
        sub.id = None;
        sub.cursor = Cursor::default();
      }
      Loc::Floating { index, .. } => {
        let f = window.floating.remove(index);
        self.device.destroy_texture(window.handle, f.texture);
      }
    }
    window.status.remove_tabs(id);
    self.present(loc.window());
  }

  fn draw_points(&mut self, id: SurfaceId, col: i32, row: i32, points: &[Texel]) {
    let (texture, cols) = match self.find(id) {
      Some(Loc::Docked { window, index }) => {
        let s = &self.windows[window].docked[index];
        match s.texture {
          Some(t) => (t, s.cells().0),
          None => return,
        }
      }
      Some(Loc::Floating { window, index }) => {
        let f = &self.windows[window].floating[index];
        (f.texture, f.cols)
      }
      None => return,
    };
    let room = (cols - col).max(0) as usize;
    let points = &points[..points.len().min(room)];
    self.device.draw_cells(texture, col, row, points);
  }

  fn move_region(&mut self, id: SurfaceId, dst: Point, src: Point, cols: i32, rows: i32) -> bool {
    let texture = match self.find(id) {
      Some(Loc::Docked { window, index }) => self.windows[window].docked[index].texture,
      Some(Loc::Floating { window, index }) => Some(self.windows[window].floating[index].texture),
      None => None,
    };
    match texture {
      Some(t) => self.device.copy_cells(t, dst, src, cols, rows),
      None => false,
    }
  }

  fn set_cursor(&mut self, id: SurfaceId, cursor: Cursor) {
    match self.find(id) {
      Some(Loc::Docked { window, index }) => self.windows[window].docked[index].cursor = cursor,
      Some(Loc::Floating { window, index }) => {
        self.windows[window].floating[index].cursor = cursor
      }
      None => {}
    }
  }

  fn redraw(&mut self, id: SurfaceId, delay: Duration) {
    if let Some(loc) = self.find(id) {
      self.present(loc.window());
    }
    if !delay.is_zero() {
      thread::sleep(delay);
    }
  }

  fn handle_event(&mut self, wait: Option<Duration>) -> Result<Option<Signal>> {
    if let Some(signal) = self.pending.pop_front() {
      return Ok(Some(signal));
    }
    let mut wait = wait;
    while let Some(raw) = self.device.poll_event(wait)? {
      if let Some(signal) = self.translate(raw)? {
        return Ok(Some(signal));
      }
      if let Some(signal) = self.pending.pop_front() {
        return Ok(Some(signal));
      }
      wait = None;
    }
    Ok(None)
  }

  fn flush_events(&mut self) {
    loop {
      match self.device.poll_event(None) {
        Ok(Some(RawEvent::Key(_))) | Ok(Some(RawEvent::PointerDown { .. })) => continue,
        Ok(Some(raw)) => {
          if let Err(e) = self.translate(raw) {
            tracing::error!(error = %e, "event failed while flushing input");
          }
        }
        Ok(None) => break,
        Err(e) => {
          tracing::error!(error = %e, "cannot poll device");
          break;
        }
      }
    }
    self.pending.retain(|s| !matches!(s, Signal::Input(_)));
  }

  fn erase(&mut self, id: SurfaceId) {
    let texture = match self.find(id) {
      Some(Loc::Docked { window, index }) => self.windows[window].docked[index].texture,
      Some(Loc::Floating { window, index }) => Some(self.windows[window].floating[index].texture),
      None => None,
    };
    if let Some(t) = texture {
      self.device.clear(t);
    }
  }

  fn add_tab(&mut self, id: SurfaceId, code: Key, label: &str, fg: Color, bg: Color) {
    if let Some(loc) = self.find(id) {
      self.windows[loc.window()].status.add_tab(id, code, label, fg, bg);
      self.present(loc.window());
    }
  }
}

impl<D: Device> Drop for Accel<D> {
  fn drop(&mut self) {
    for window in &mut self.windows {
      for sub in &mut window.docked {
        if let Some(tex) = sub.texture.take() {
          self.device.destroy_texture(window.handle, tex);
        }
      }
      for f in window.floating.drain(..) {
        self.device.destroy_texture(window.handle, f.texture);
      }
      self.device.close_window(window.handle);
    }
  }
}
