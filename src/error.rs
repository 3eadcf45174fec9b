//! Error types.
//!
//! Errors fall into four groups. *Fatal* errors mean that a precondition for
//! any further drawing is gone (the screen can't hold a required surface, an
//! environment override is malformed, a window collapsed); the host process is
//! expected to tear down and exit. *Recoverable* errors are returned to
//! whoever asked for a surface, who then picks a fallback. *Soft* errors come
//! from layout persistence and are usually logged and replaced with defaults.
//!
//! Misuse of the push/pop discipline is not an error at all: it panics.

use std::io;

use crate::catalogue::SurfaceKind;
use crate::geo::Rect;

/// Shorthand for results carrying an [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A required surface can't be given even its minimum size.
  #[error("screen is too small for required surface `{kind}` (needs {min_cols}x{min_rows})")]
  ScreenTooSmall {
    kind: SurfaceKind,
    min_cols: i32,
    min_rows: i32,
  },

  /// A `TERM_*` override was malformed or violated its constraints.
  #[error("bad override {var}={value:?}: {reason}")]
  BadOverride {
    var: String,
    value: String,
    reason: String,
  },

  /// A window was resized so far that nothing fits below its status bar.
  #[error("window {window} has no usable area left (inner rect {inner:?})")]
  InnerCollapsed { window: usize, inner: Rect },

  /// A backend failed to come up.
  #[error("backend `{name}` failed to initialize: {reason}")]
  BackendInit { name: String, reason: String },

  /// No backend in the candidate list initialized.
  #[error("no usable display backend (tried: {tried})")]
  NoBackend { tried: String },

  /// A surface's minimum size doesn't fit in the space available to it.
  #[error("no room for a {min_cols}x{min_rows} surface in a {avail_cols}x{avail_rows} area")]
  Placement {
    min_cols: i32,
    min_rows: i32,
    avail_cols: i32,
    avail_rows: i32,
  },

  /// The transient stack is at capacity.
  #[error("transient surface stack is full ({depth} surfaces)")]
  StackFull { depth: usize },

  /// A persisted layout record couldn't be understood.
  #[error("layout line {line}: {reason}")]
  Layout { line: usize, reason: String },

  #[error(transparent)]
  Io(#[from] io::Error),

  #[error("config: {0}")]
  Config(#[from] toml::de::Error),
}

impl Error {
  /// Returns whether this error should bring the process down.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      Self::ScreenTooSmall { .. }
        | Self::BadOverride { .. }
        | Self::InnerCollapsed { .. }
        | Self::BackendInit { .. }
        | Self::NoBackend { .. }
    )
  }

  pub(crate) fn placement(min: (i32, i32), avail: (i32, i32)) -> Self {
    Self::Placement {
      min_cols: min.0,
      min_rows: min.1,
      avail_cols: avail.0,
      avail_rows: avail.1,
    }
  }

  pub(crate) fn layout(line: usize, reason: impl Into<String>) -> Self {
    Self::Layout {
      line,
      reason: reason.into(),
    }
  }
}
