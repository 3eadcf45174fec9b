//! OS windows.
//!
//! A [`Window`] owns its docked subwindows, kept in z-order (back to front),
//! the floating subwindows of any transient surfaces opened in it, and a
//! status bar. Everything inside a window is positioned in window pixel
//! coordinates; the usable area is everything below the status bar.

use crate::backend::accel::device::FontMetrics;
use crate::backend::accel::device::Frame;
use crate::backend::accel::device::WindowHandle;
use crate::backend::accel::drag;
use crate::backend::accel::layout::WindowConfig;
use crate::backend::accel::status::StatusBar;
use crate::backend::accel::subwindow::Floating;
use crate::backend::accel::subwindow::Subwindow;
use crate::catalogue::SurfaceKind;
use crate::error::Error;
use crate::error::Result;
use crate::geo::Point;
use crate::geo::Rect;

/// An open window and everything in it.
#[derive(Debug)]
pub struct Window {
  index: usize,
  pub(crate) config: WindowConfig,
  pub(crate) handle: WindowHandle,
  /// Cell size of the window's game font, used for floating subwindows.
  pub(crate) game: FontMetrics,
  pub(crate) status: StatusBar,
  inner: Rect,
  pub(crate) docked: Vec<Subwindow>,
  pub(crate) floating: Vec<Floating>,
}

impl Window {
  /// Sets up a freshly opened window.
  ///
  /// Fails with [`Error::InnerCollapsed`] if the status bar leaves no room.
  pub fn new(
    index: usize,
    config: WindowConfig,
    handle: WindowHandle,
    system: FontMetrics,
    game: FontMetrics,
  ) -> Result<Self> {
    let full = config.full_rect;
    let status = StatusBar::new(system, full.width());
    let inner = inner_rect(index, full, status.height())?;
    Ok(Self {
      index,
      config,
      handle,
      game,
      status,
      inner,
      docked: Vec::new(),
      floating: Vec::new(),
    })
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn handle(&self) -> WindowHandle {
    self.handle
  }

  pub fn config(&self) -> &WindowConfig {
    &self.config
  }

  /// Returns the window's rectangle on its display.
  pub fn full_rect(&self) -> Rect {
    self.config.full_rect
  }

  /// Returns the area below the status bar, in window coordinates.
  pub fn inner_rect(&self) -> Rect {
    self.inner
  }

  pub fn status(&self) -> &StatusBar {
    &self.status
  }

  /// Returns the docked subwindows, back to front.
  pub fn docked(&self) -> &[Subwindow] {
    &self.docked
  }

  /// Returns the floating subwindows, bottom of the stack first.
  pub fn floating(&self) -> &[Floating] {
    &self.floating
  }

  /// Adopts a new size, recomputing the status bar and inner rectangle.
  ///
  /// Subwindows are not touched; they must be refit by the caller.
  pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
    let full = self.config.full_rect.with_size(width, height);
    self.status.resize(width);
    self.inner = inner_rect(self.index, full, self.status.height())?;
    self.config.full_rect = full;
    tracing::debug!(window = self.index, inner = ?self.inner, "window resized");
    Ok(())
  }

  pub fn docked_index(&self, kind: SurfaceKind) -> Option<usize> {
    self.docked.iter().position(|s| s.kind() == kind)
  }

  /// Adds a subwindow, keeping z-order.
  pub fn dock(&mut self, sub: Subwindow) {
    self.docked.push(sub);
    let last = self.docked.len() - 1;
    drag::raise(&mut self.docked, last, Subwindow::bucket);
  }

  /// Brings a subwindow to the top of its z-order bucket.
  pub fn bring_to_top(&mut self, kind: SurfaceKind) {
    if let Some(i) = self.docked_index(kind) {
      drag::raise(&mut self.docked, i, Subwindow::bucket);
    }
  }

  /// Returns the topmost realized docked subwindow under `p`.
  pub fn docked_at(&self, p: Point) -> Option<usize> {
    self
      .docked
      .iter()
      .rposition(|s| s.is_bound() && s.rect().contains(p))
  }

  /// Returns the topmost floating subwindow under `p`.
  pub fn floating_at(&self, p: Point) -> Option<usize> {
    self.floating.iter().rposition(|f| f.rect.contains(p))
  }

  /// Describes everything the window should show.
  pub fn frame(&self) -> Frame {
    Frame {
      bar: self.status.render(),
      bar_height: self.status.height(),
      layers: self
        .docked
        .iter()
        .filter_map(Subwindow::layer)
        .chain(self.floating.iter().map(Floating::layer))
        .collect(),
    }
  }
}

fn inner_rect(window: usize, full: Rect, bar: i32) -> Result<Rect> {
  let inner = Rect::new(0, bar, full.width(), full.height() - bar);
  if inner.width() <= 0 || inner.height() <= 0 {
    return Err(Error::InnerCollapsed { window, inner });
  }
  Ok(inner)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::accel::layout::SubwindowConfig;
  use crate::config::Config;
  use crate::config::FontSpec;

  fn window(w: i32, h: i32) -> Window {
    let mut config = WindowConfig::new(&Config::default());
    config.full_rect = Rect::with_dims(w, h);
    let cell = FontMetrics::new(10, 16);
    Window::new(0, config, WindowHandle(0), cell, cell).unwrap()
  }

  fn sub(kind: SurfaceKind, top: bool, always_top: bool) -> Subwindow {
    let config = SubwindowConfig {
      window: 0,
      full_rect: Rect::new(0, 20, 500, 300),
      font: FontSpec::new("10x16.fon", 16),
      borders: true,
      top,
      always_top,
      alpha: 255,
    };
    Subwindow::new(kind, config, FontMetrics::new(10, 16))
  }

  #[test]
  fn inner_is_below_the_bar() {
    let mut w = window(640, 480);
    assert_eq!(w.inner_rect(), Rect::new(0, 20, 640, 460));
    w.resize(300, 480).unwrap();
    assert_eq!(w.inner_rect(), Rect::new(0, 20, 300, 460));
    assert!(matches!(
      w.resize(300, 20),
      Err(Error::InnerCollapsed { window: 0, .. })
    ));
  }

  #[test]
  fn docking_respects_buckets() {
    let mut w = window(640, 480);
    w.dock(sub(SurfaceKind::Map, false, true));
    w.dock(sub(SurfaceKind::Message, false, false));
    w.dock(sub(SurfaceKind::Status, true, false));
    w.dock(sub(SurfaceKind::Sidebar, false, false));
    w.bring_to_top(SurfaceKind::Message);
    let kinds: Vec<_> = w.docked().iter().map(|s| s.kind()).collect();
    assert_eq!(
      kinds,
      vec![
        SurfaceKind::Sidebar,
        SurfaceKind::Message,
        SurfaceKind::Status,
        SurfaceKind::Map
      ]
    );
  }
}
