//! The backend binding contract.
//!
//! A [`Backend`] realizes surfaces on some concrete output: a terminal, or a
//! set of OS windows. The surface stack only ever talks to a backend through
//! this trait, and only ever identifies surfaces to it by an opaque
//! [`SurfaceId`]; backend resource types never leak out.
//!
//! Two backends ship with this crate: [`term::Curses`] for character-cell
//! terminals and [`accel::Accel`] for windowed, texture-based output.

use std::time::Duration;

use crate::catalogue::SurfaceKind;
use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::event::Event;
use crate::event::Key;
use crate::geo::Point;
use crate::gfx::Color;
use crate::gfx::Texel;
use crate::placement::Hints;

pub mod accel;
pub mod term;

/// An opaque handle the surface stack uses to name a surface to a backend.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct SurfaceId(pub u32);

/// What kind of surface is being created.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Origin {
  Permanent(SurfaceKind),
  /// A transient surface going into stack slot `slot`.
  Transient { slot: usize, hints: Hints },
}

/// Arguments for [`Backend::on_create()`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CreateRequest {
  pub id: SurfaceId,
  pub origin: Origin,
  /// The surface currently on top, which some placements are relative to.
  pub top: Option<SurfaceId>,
}

/// What a backend reports back about a surface it created.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SurfaceInfo {
  pub cols: i32,
  pub rows: i32,
}

/// Cursor state for a surface.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Cursor {
  pub visible: bool,
  pub col: i32,
  pub row: i32,
}

/// Something a backend wants the surface stack to know about.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Signal {
  /// User input, to be handed to the caller.
  Input(Event),
  /// A surface's logical size changed; its contents should be preserved
  /// where they overlap and everything redrawn.
  Resize { id: SurfaceId, cols: i32, rows: i32 },
  /// The backend lost a surface's contents; everything must be redrawn.
  Invalidate(SurfaceId),
}

/// A concrete rendering and input implementation.
pub trait Backend {
  /// The name this backend is selected by.
  fn name(&self) -> &'static str;

  /// Materializes a new surface.
  ///
  /// Returns [`Error::Placement`] if the surface's minimum size can't be
  /// satisfied; any other error is passed through to the caller as-is.
  fn on_create(&mut self, req: &CreateRequest) -> Result<SurfaceInfo>;

  /// Destroys a surface, releasing whatever the backend held for it.
  fn on_destroy(&mut self, id: SurfaceId);

  /// Draws a horizontal run of points starting at `(col, row)`.
  fn draw_points(&mut self, id: SurfaceId, col: i32, row: i32, points: &[Texel]);

  /// Moves a `cols` by `rows` block from `src` to `dst`.
  ///
  /// Returns `false` if the backend has no fast path for this, in which case
  /// the caller must redraw the destination itself.
  fn move_region(
    &mut self,
    id: SurfaceId,
    dst: Point,
    src: Point,
    cols: i32,
    rows: i32,
  ) -> bool;

  fn set_cursor(&mut self, id: SurfaceId, cursor: Cursor);

  /// Pushes everything drawn so far to the screen, then sleeps for `delay`.
  fn redraw(&mut self, id: SurfaceId, delay: Duration);

  /// Handles at most one pending backend event.
  ///
  /// If `wait` is `Some`, blocks for up to that long for an event to arrive.
  fn handle_event(&mut self, wait: Option<Duration>) -> Result<Option<Signal>>;

  /// Throws away any pending input.
  fn flush_events(&mut self);

  /// Clears a surface to blanks.
  fn erase(&mut self, id: SurfaceId);

  /// Attaches a clickable tab to a surface; clicking it produces `code`.
  fn add_tab(&mut self, id: SurfaceId, code: Key, label: &str, fg: Color, bg: Color);
}

/// Constructor for a compiled-in backend.
pub type Factory = fn(&Config) -> Result<Box<dyn Backend>>;

/// A compiled-in backend.
#[derive(Copy, Clone)]
pub struct Candidate {
  pub name: &'static str,
  pub init: Factory,
}

/// Brings up a backend.
///
/// If the config names a backend, that backend is started and any failure is
/// returned. Otherwise the candidates are tried in the order given by
/// `config.backends` (falling back to the order of `candidates`), and the
/// first that initializes wins. A candidate that fails with anything other
/// than [`Error::BackendInit`] or an I/O error aborts the search, since such
/// errors (like a malformed region override) would not go away by trying a
/// different backend.
pub fn select(
  config: &Config,
  candidates: &[Candidate],
) -> Result<Box<dyn Backend>> {
  if let Some(name) = &config.backend {
    let candidate = candidates.iter().find(|c| c.name == name.as_str()).ok_or_else(|| {
      Error::BackendInit {
        name: name.clone(),
        reason: "not compiled in".to_string(),
      }
    })?;
    return (candidate.init)(config).map_err(|e| match e {
      Error::Io(e) => Error::BackendInit {
        name: name.clone(),
        reason: e.to_string(),
      },
      e => e,
    });
  }

  let mut order: Vec<&Candidate> = config
    .backends
    .iter()
    .filter_map(|name| {
      let found = candidates.iter().find(|c| c.name == name.as_str());
      if found.is_none() {
        tracing::warn!(backend = %name, "configured backend is not compiled in");
      }
      found
    })
    .collect();
  if order.is_empty() {
    order = candidates.iter().collect();
  }

  let mut tried = Vec::new();
  for candidate in order {
    tried.push(candidate.name);
    match (candidate.init)(config) {
      Ok(backend) => {
        tracing::info!(backend = candidate.name, "selected display backend");
        return Ok(backend);
      }
      Err(e @ Error::BackendInit { .. }) | Err(e @ Error::Io(_)) => {
        tracing::warn!(backend = candidate.name, error = %e, "backend unavailable");
      }
      Err(e) => return Err(e),
    }
  }

  Err(Error::NoBackend {
    tried: tried.join(", "),
  })
}
