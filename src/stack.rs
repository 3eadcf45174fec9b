//! The surface stack.
//!
//! [`Display`] is the only thing callers talk to. It owns the permanent
//! surfaces, one per [`SurfaceKind`] that fit on the screen, and a bounded
//! LIFO stack of transient surfaces (menus, prompts, pop-ups) that always sit
//! in front of them. Drawing and input go to whichever surface is on top,
//! unless a caller has explicitly selected another surface to draw on.
//!
//! Each surface keeps two [`PointBuffer`]s: the back buffer that callers draw
//! into, and the front buffer recording what the backend has been sent.
//! [`Display::flush()`] diffs the two and sends only what changed.
//!
//! The push/pop discipline is strict: pops must exactly mirror pushes.
//! Violating it is a bug in the caller and panics.

use std::fmt;
use std::time::Duration;

use crate::backend::Backend;
use crate::backend::CreateRequest;
use crate::backend::Cursor;
use crate::backend::Origin;
use crate::backend::Signal;
use crate::backend::SurfaceId;
use crate::catalogue::SurfaceKind;
use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::event::Event;
use crate::event::Key;
use crate::event::Target;
use crate::geo::Point;
use crate::gfx::Color;
use crate::gfx::PointBuffer;
use crate::gfx::Texel;
use crate::placement::Hints;

/// Changed cells at most this far apart are sent to the backend as one run.
const RUN_GAP: usize = 2;

/// Called while a blocking read waits for input.
pub type IdleHook = Box<dyn FnMut(&mut Display)>;

/// Proof of a successful [`Display::push()`], to be handed back to
/// [`Display::pop()`].
#[must_use = "a pushed surface must be popped"]
#[derive(Debug, PartialEq, Eq)]
pub struct Handle {
  slot: usize,
  serial: u64,
}

impl Handle {
  /// The stack slot the surface occupies.
  pub fn slot(&self) -> usize {
    self.slot
  }

  /// The target naming this surface.
  pub fn target(&self) -> Target {
    Target::Transient(self.slot)
  }
}

struct Surface {
  id: SurfaceId,
  serial: u64,
  min: (i32, i32),
  back: PointBuffer,
  front: PointBuffer,
  // When set, the front buffer is meaningless and everything must be resent.
  stale: bool,
  cursor: Cursor,
  shown_cursor: Option<Cursor>,
}

impl Surface {
  fn new(id: SurfaceId, serial: u64, cols: i32, rows: i32, min: (i32, i32)) -> Self {
    let cols = cols.max(min.0) as usize;
    let rows = rows.max(min.1) as usize;
    Self {
      id,
      serial,
      min,
      back: PointBuffer::blank(cols, rows),
      front: PointBuffer::blank(cols, rows),
      stale: false,
      cursor: Cursor::default(),
      shown_cursor: None,
    }
  }

  fn dims(&self) -> (i32, i32) {
    (self.back.cols() as i32, self.back.rows() as i32)
  }

  fn resize(&mut self, cols: i32, rows: i32) {
    let cols = cols.max(self.min.0) as usize;
    let rows = rows.max(self.min.1) as usize;
    self.back.resize(cols, rows, Texel::blank());
    self.front.resize(cols, rows, Texel::blank());
    self.stale = true;
  }
}

/// The display: every surface, plus the backend realizing them.
pub struct Display {
  backend: Box<dyn Backend>,
  permanents: Vec<Option<Surface>>,
  transients: Vec<Surface>,
  max_depth: usize,
  next_id: u32,
  next_serial: u64,
  selected: Option<Target>,
  idle: Option<IdleHook>,
  poll: Duration,
}

impl fmt::Debug for Display {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Display")
      .field("backend", &self.backend.name())
      .field("depth", &self.transients.len())
      .field("selected", &self.selected)
      .finish()
  }
}

impl Display {
  /// Brings up every permanent surface on `backend`.
  ///
  /// Optional surfaces that don't fit are skipped, and are treated as
  /// inactive from then on. A required surface that doesn't fit is a fatal
  /// [`Error::ScreenTooSmall`].
  pub fn init(backend: Box<dyn Backend>, config: &Config) -> Result<Self> {
    let mut display = Self {
      backend,
      permanents: Vec::with_capacity(SurfaceKind::COUNT),
      transients: Vec::new(),
      max_depth: config.max_transients,
      next_id: 0,
      next_serial: 0,
      selected: None,
      idle: None,
      poll: config.idle_poll(),
    };

    for kind in SurfaceKind::ALL.iter().copied() {
      let d = kind.descriptor();
      let id = display.alloc_id();
      let req = CreateRequest {
        id,
        origin: Origin::Permanent(kind),
        top: None,
      };
      match display.backend.on_create(&req) {
        Ok(info) => {
          tracing::debug!(%kind, cols = info.cols, rows = info.rows, "created surface");
          let serial = display.alloc_serial();
          display
            .permanents
            .push(Some(Surface::new(id, serial, info.cols, info.rows, d.min)));
        }
        Err(Error::Placement { .. }) if !d.required => {
          tracing::debug!(%kind, "optional surface does not fit; skipping");
          display.permanents.push(None);
        }
        Err(e) => {
          let e = match e {
            Error::Placement { .. } => Error::ScreenTooSmall {
              kind,
              min_cols: d.min_cols(),
              min_rows: d.min_rows(),
            },
            e => e,
          };
          display.teardown();
          return Err(e);
        }
      }
    }

    Ok(display)
  }

  /// Destroys every surface, transients first, permanents in reverse
  /// catalogue order.
  pub fn teardown(mut self) {
    while let Some(surface) = self.transients.pop() {
      tracing::warn!(slot = self.transients.len(), "transient surface still open at teardown");
      self.backend.on_destroy(surface.id);
    }
    while let Some(surface) = self.permanents.pop() {
      if let Some(surface) = surface {
        self.backend.on_destroy(surface.id);
      }
    }
  }

  fn alloc_id(&mut self) -> SurfaceId {
    let id = SurfaceId(self.next_id);
    self.next_id += 1;
    id
  }

  fn alloc_serial(&mut self) -> u64 {
    self.next_serial += 1;
    self.next_serial
  }

  /// Returns the name of the backend in use.
  pub fn backend_name(&self) -> &'static str {
    self.backend.name()
  }

  /// Returns whether `kind` was realized.
  pub fn is_active(&self, kind: SurfaceKind) -> bool {
    self.permanents[kind.index()].is_some()
  }

  /// Returns the number of transient surfaces on the stack.
  pub fn depth(&self) -> usize {
    self.transients.len()
  }

  /// Returns the surface on top of everything: the input target.
  ///
  /// With no transient surfaces open, this is the map.
  pub fn top(&self) -> Target {
    match self.transients.len() {
      0 => Target::Permanent(SurfaceKind::Map),
      n => Target::Transient(n - 1),
    }
  }

  /// Returns the surface drawing calls currently go to.
  pub fn draw_target(&self) -> Target {
    self.selected.unwrap_or_else(|| self.top())
  }

  /// Returns the dimensions of `target`, or `None` if it isn't realized.
  pub fn size(&self, target: Target) -> Option<(i32, i32)> {
    self.surface(target).map(Surface::dims)
  }

  /// Returns a snapshot of what has been drawn into `target`.
  pub fn contents(&self, target: Target) -> Option<&PointBuffer> {
    self.surface(target).map(|s| &s.back)
  }

  fn surface(&self, target: Target) -> Option<&Surface> {
    match target {
      Target::Permanent(kind) => self.permanents[kind.index()].as_ref(),
      Target::Transient(slot) => self.transients.get(slot),
    }
  }

  fn surface_mut(&mut self, target: Target) -> Option<&mut Surface> {
    match target {
      Target::Permanent(kind) => self.permanents[kind.index()].as_mut(),
      Target::Transient(slot) => self.transients.get_mut(slot),
    }
  }

  fn surface_by_id(&mut self, id: SurfaceId) -> Option<&mut Surface> {
    self
      .permanents
      .iter_mut()
      .flatten()
      .chain(self.transients.iter_mut())
      .find(|s| s.id == id)
  }

  /// Directs drawing at `target` without changing the input target.
  ///
  /// Selecting an inactive permanent surface is allowed; drawing to it does
  /// nothing.
  ///
  /// # Panics
  ///
  /// Panics if `target` names a transient slot that isn't on the stack.
  pub fn select(&mut self, target: Target) {
    if let Target::Transient(slot) = target {
      assert!(slot < self.transients.len(), "selected transient slot {} is not open", slot);
    }
    self.selected = Some(target);
  }

  /// Undoes [`Display::select()`]; drawing goes to the top surface again.
  pub fn deselect(&mut self) {
    self.selected = None;
  }

  /// Opens a new transient surface on top of the stack.
  ///
  /// Fails with [`Error::StackFull`] if the stack is at capacity, or with
  /// [`Error::Placement`] if the backend can't fit the hinted minimum size;
  /// either way nothing changes and the caller should fall back to something
  /// else.
  pub fn push(&mut self, hints: Hints) -> Result<Handle> {
    let slot = self.transients.len();
    if slot >= self.max_depth {
      return Err(Error::StackFull { depth: slot });
    }

    let top = self.surface(self.top()).map(|s| s.id);
    let id = self.alloc_id();
    let req = CreateRequest {
      id,
      origin: Origin::Transient { slot, hints },
      top,
    };
    let info = self.backend.on_create(&req)?;
    let serial = self.alloc_serial();
    self.transients.push(Surface::new(
      id,
      serial,
      info.cols,
      info.rows,
      (hints.min_cols, hints.min_rows),
    ));

    tracing::debug!(slot, cols = info.cols, rows = info.rows, purpose = ?hints.purpose, "pushed surface");
    Ok(Handle { slot, serial })
  }

  /// Closes the transient surface on top of the stack.
  ///
  /// # Panics
  ///
  /// Panics if the stack is empty, or if `handle` is not for the surface on
  /// top.
  pub fn pop(&mut self, handle: Handle) {
    let top = self
      .transients
      .last()
      .expect("popped a surface with no transient surface open");
    assert!(
      handle.slot + 1 == self.transients.len() && handle.serial == top.serial,
      "popped transient slot {} but slot {} is on top",
      handle.slot,
      self.transients.len() - 1,
    );

    if let Some(surface) = self.transients.pop() {
      self.backend.on_destroy(surface.id);
    }
    if self.selected == Some(handle.target()) {
      self.selected = None;
    }
    tracing::debug!(slot = handle.slot, "popped surface");

    if let Some(id) = self.surface(self.top()).map(|s| s.id) {
      self.backend.redraw(id, Duration::ZERO);
    }
  }

  /// Replaces a horizontal run of cells in the draw target, starting at
  /// `(col, row)`.
  ///
  /// Runs never wrap. Drawing to an inactive surface does nothing.
  ///
  /// # Panics
  ///
  /// Panics if the run doesn't fit in the surface.
  pub fn draw(&mut self, row: i32, col: i32, run: &[Texel]) {
    let target = self.draw_target();
    let surface = match self.surface_mut(target) {
      Some(s) => s,
      None => return,
    };
    let (cols, rows) = surface.dims();
    assert!(
      row >= 0 && row < rows && col >= 0 && col + run.len() as i32 <= cols,
      "run of {} at ({}, {}) overflows {:?} ({}x{})",
      run.len(),
      col,
      row,
      target,
      cols,
      rows,
    );
    let col = col as usize;
    surface.back.row_mut(row as usize)[col..col + run.len()].copy_from_slice(run);
  }

  /// Draws `text` at `(col, row)` in `color`, truncating it at the edge of
  /// the surface. Text starting past the right edge is dropped.
  pub fn print(&mut self, row: i32, col: i32, text: &str, color: Color) {
    let cols = match self.size(self.draw_target()) {
      Some((cols, _)) if col < cols => cols,
      _ => return,
    };
    let room = (cols - col) as usize;
    let run: Vec<Texel> = text
      .chars()
      .take(room)
      .map(|c| Texel::new(c).with_fg(color))
      .collect();
    self.draw(row, col, &run);
  }

  /// Sets the draw target's cursor. It takes effect on the next flush.
  pub fn set_cursor(&mut self, visible: bool, col: i32, row: i32) {
    let target = self.draw_target();
    if let Some(surface) = self.surface_mut(target) {
      surface.cursor = Cursor { visible, col, row };
    }
  }

  /// Clears the draw target, immediately.
  pub fn erase_all(&mut self) {
    let target = self.draw_target();
    if let Some(surface) = self.surface_mut(target) {
      surface.back.fill(Texel::blank());
      surface.front.fill(Texel::blank());
      surface.stale = false;
      let id = surface.id;
      self.backend.erase(id);
    }
  }

  /// Sends everything drawn into the draw target since the last flush to the
  /// backend.
  pub fn flush(&mut self) {
    self.redraw(Duration::ZERO)
  }

  /// Like [`Display::flush()`], but then pauses for `delay` to pace
  /// animation.
  pub fn redraw(&mut self, delay: Duration) {
    let target = self.draw_target();
    if let Some(id) = self.sync(target) {
      self.backend.redraw(id, delay);
    }
  }

  /// Flushes every active surface, bottom to top.
  pub fn flush_all(&mut self) {
    let targets: Vec<Target> = SurfaceKind::ALL
      .iter()
      .map(|k| Target::Permanent(*k))
      .chain((0..self.transients.len()).map(Target::Transient))
      .collect();
    let mut last = None;
    for target in targets {
      last = self.sync(target).or(last);
    }
    if let Some(id) = last {
      self.backend.redraw(id, Duration::ZERO);
    }
  }

  // Sends the diff for one surface to the backend, returning its id.
  fn sync(&mut self, target: Target) -> Option<SurfaceId> {
    let backend = &mut self.backend;
    let surface = match target {
      Target::Permanent(kind) => self.permanents[kind.index()].as_mut(),
      Target::Transient(slot) => self.transients.get_mut(slot),
    }?;

    let runs = if surface.stale {
      (0..surface.back.rows())
        .map(|row| crate::gfx::buffer::Run {
          row,
          cols: (0, surface.back.cols()),
        })
        .collect()
    } else {
      surface.back.changed_runs(&surface.front, RUN_GAP)
    };
    for run in runs {
      let cells = &surface.back.row(run.row)[run.range()];
      backend.draw_points(surface.id, run.cols.0 as i32, run.row as i32, cells);
      surface.front.row_mut(run.row)[run.range()].copy_from_slice(cells);
    }
    surface.stale = false;

    if surface.shown_cursor != Some(surface.cursor) {
      backend.set_cursor(surface.id, surface.cursor);
      surface.shown_cursor = Some(surface.cursor);
    }
    Some(surface.id)
  }

  /// Changes the logical size of the draw target, keeping whatever content
  /// still fits.
  ///
  /// Backends clip anything drawn outside the area they realized.
  ///
  /// # Panics
  ///
  /// Panics if the new size is below the surface's minimum.
  pub fn resize(&mut self, cols: i32, rows: i32) {
    let target = self.draw_target();
    if let Some(surface) = self.surface_mut(target) {
      assert!(
        cols >= surface.min.0 && rows >= surface.min.1,
        "resized {:?} to {}x{}, below its {}x{} minimum",
        target,
        cols,
        rows,
        surface.min.0,
        surface.min.1,
      );
      surface.resize(cols, rows);
    }
  }

  /// Moves a `cols` by `rows` block of the draw target from `src` to `dst`.
  ///
  /// If the backend can move the block itself, nothing needs redrawing;
  /// otherwise the moved cells go out with the next flush.
  pub fn move_region(&mut self, dst: Point, src: Point, cols: i32, rows: i32) {
    let target = self.draw_target();
    let backend = &mut self.backend;
    let surface = match target {
      Target::Permanent(kind) => self.permanents[kind.index()].as_mut(),
      Target::Transient(slot) => self.transients.get_mut(slot),
    };
    let surface = match surface {
      Some(s) => s,
      None => return,
    };
    if cols <= 0 || rows <= 0 || [dst, src].iter().any(|p| p.x() < 0 || p.y() < 0) {
      return;
    }
    let to = (dst.x() as usize, dst.y() as usize);
    let from = (src.x() as usize, src.y() as usize);
    surface.back.copy_within(to, from, cols as usize, rows as usize);
    if !surface.stale && backend.move_region(surface.id, dst, src, cols, rows) {
      surface.front.copy_within(to, from, cols as usize, rows as usize);
    }
  }

  /// Attaches a clickable tab to the draw target.
  pub fn add_tab(&mut self, code: Key, label: &str, fg: Color, bg: Color) {
    let target = self.draw_target();
    if let Some(id) = self.surface(target).map(|s| s.id) {
      self.backend.add_tab(id, code, label, fg, bg);
    }
  }

  /// Installs the hook run while [`Display::read_event()`] waits.
  pub fn set_idle_hook(&mut self, hook: impl FnMut(&mut Display) + 'static) {
    self.idle = Some(Box::new(hook));
  }

  /// Removes the idle hook.
  pub fn clear_idle_hook(&mut self) {
    self.idle = None;
  }

  fn run_idle(&mut self) {
    if let Some(mut hook) = self.idle.take() {
      hook(self);
      // The hook may have installed a replacement for itself.
      if self.idle.is_none() {
        self.idle = Some(hook);
      }
    }
  }

  /// Discards all pending input.
  pub fn flush_events(&mut self) {
    self.backend.flush_events();
  }

  /// Reads one input event.
  ///
  /// If `blocking` is false and nothing is pending, returns `Ok(None)`.
  /// Otherwise waits, polling the backend at the configured period and
  /// running the idle hook each time nothing has arrived. Resizes reported
  /// by the backend are applied along the way.
  pub fn read_event(&mut self, blocking: bool) -> Result<Option<Event>> {
    loop {
      while let Some(signal) = self.backend.handle_event(None)? {
        if let Some(event) = self.dispatch(signal) {
          return Ok(Some(event));
        }
      }
      if !blocking {
        return Ok(None);
      }

      self.run_idle();
      if let Some(signal) = self.backend.handle_event(Some(self.poll))? {
        if let Some(event) = self.dispatch(signal) {
          return Ok(Some(event));
        }
      }
    }
  }

  fn dispatch(&mut self, signal: Signal) -> Option<Event> {
    match signal {
      Signal::Input(Event::Pointer(p)) => match p.target {
        Target::Transient(slot) if slot >= self.transients.len() => {
          tracing::debug!(slot, "dropping pointer event for a closed surface");
          None
        }
        _ => Some(Event::Pointer(p)),
      },
      Signal::Input(event) => Some(event),
      Signal::Resize { id, cols, rows } => {
        if let Some(surface) = self.surface_by_id(id) {
          tracing::debug!(?id, cols, rows, "backend resized surface");
          surface.resize(cols, rows);
        }
        None
      }
      Signal::Invalidate(id) => {
        if let Some(surface) = self.surface_by_id(id) {
          surface.stale = true;
        }
        None
      }
    }
  }
}
