//! A windowing device with no screen.
//!
//! [`Headless`] keeps every window and texture in memory and records each
//! presented frame, which makes it the device of choice for tests and for
//! hosts with no display. Input comes from a script of queued events.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::backend::accel::device::Device;
use crate::backend::accel::device::FontMetrics;
use crate::backend::accel::device::Frame;
use crate::backend::accel::device::RawEvent;
use crate::backend::accel::device::TextureId;
use crate::backend::accel::device::WindowHandle;
use crate::config::FontSpec;
use crate::error::Error;
use crate::error::Result;
use crate::geo::Point;
use crate::geo::Rect;
use crate::gfx::PointBuffer;
use crate::gfx::Texel;

struct Texture {
  window: WindowHandle,
  cells: PointBuffer,
}

struct Window {
  rect: Rect,
  frame: Option<Frame>,
  presents: usize,
}

/// An in-memory [`Device`].
#[derive(Default)]
pub struct Headless {
  windows: BTreeMap<WindowHandle, Window>,
  textures: BTreeMap<TextureId, Texture>,
  next_window: u32,
  next_texture: u32,
  script: VecDeque<RawEvent>,
  /// Whether to actually sleep when asked to wait for an empty script.
  sleep: bool,
}

impl Headless {
  /// Creates a device with nothing queued that never sleeps.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a device that replays `script`, then idles in real time.
  pub fn scripted(script: impl IntoIterator<Item = RawEvent>) -> Self {
    Self {
      script: script.into_iter().collect(),
      sleep: true,
      ..Self::default()
    }
  }

  /// Queues an event.
  pub fn push_event(&mut self, event: RawEvent) {
    self.script.push_back(event);
  }

  /// Returns the handles of every open window.
  pub fn windows(&self) -> Vec<WindowHandle> {
    self.windows.keys().copied().collect()
  }

  /// Returns where a window is.
  pub fn window_rect(&self, window: WindowHandle) -> Option<Rect> {
    self.windows.get(&window).map(|w| w.rect)
  }

  /// Returns the last frame presented to a window.
  pub fn frame(&self, window: WindowHandle) -> Option<&Frame> {
    self.windows.get(&window)?.frame.as_ref()
  }

  /// Returns how many times a window has been presented.
  pub fn presents(&self, window: WindowHandle) -> usize {
    self.windows.get(&window).map(|w| w.presents).unwrap_or(0)
  }

  /// Returns the contents of a texture.
  pub fn texture(&self, texture: TextureId) -> Option<&PointBuffer> {
    self.textures.get(&texture).map(|t| &t.cells)
  }

  /// Returns a texture's row as plain text.
  pub fn texture_line(&self, texture: TextureId, row: usize) -> Option<String> {
    let cells = self.texture(texture)?;
    (row < cells.rows()).then(|| cells.row(row).iter().map(|t| t.visible_glyph()).collect())
  }

  /// Returns the textures created through `window` and not yet destroyed.
  pub fn textures_of(&self, window: WindowHandle) -> Vec<TextureId> {
    self
      .textures
      .iter()
      .filter(|(_, t)| t.window == window)
      .map(|(id, _)| *id)
      .collect()
  }
}

/// Guesses a font's cell size from a name like `8x13x.fon`, falling back on
/// its point size.
fn metrics_for(font: &FontSpec) -> Option<FontMetrics> {
  let mut dims = font.name.split(|c: char| !c.is_ascii_digit()).filter(|s| !s.is_empty());
  let named = font
    .name
    .starts_with(|c: char| c.is_ascii_digit())
    .then(|| {
      let w = dims.next()?.parse().ok()?;
      let h = dims.next()?.parse().ok()?;
      Some(FontMetrics::new(w, h))
    })
    .flatten()
    .filter(|m| m.is_usable());
  named.or_else(|| {
    let size = font.size as i32;
    (size > 0).then(|| FontMetrics::new((size * 3 / 5).max(1), size))
  })
}

impl Device for Headless {
  fn name(&self) -> &'static str {
    "headless"
  }

  fn open_window(&mut self, display: usize, rect: Rect, fullscreen: bool) -> Result<WindowHandle> {
    let handle = WindowHandle(self.next_window);
    self.next_window += 1;
    let display_index = display;
    tracing::debug!(?handle, display_index, ?rect, fullscreen, "opened headless window");
    self.windows.insert(
      handle,
      Window {
        rect,
        frame: None,
        presents: 0,
      },
    );
    Ok(handle)
  }

  fn close_window(&mut self, window: WindowHandle) {
    assert!(
      self.textures.values().all(|t| t.window != window),
      "closed {:?} with live textures",
      window
    );
    self.windows.remove(&window);
  }

  fn font_metrics(&mut self, font: &FontSpec) -> Result<FontMetrics> {
    metrics_for(font).ok_or_else(|| Error::BackendInit {
      name: self.name().to_string(),
      reason: format!("cannot load font {:?} at size {}", font.name, font.size),
    })
  }

  fn create_texture(
    &mut self,
    window: WindowHandle,
    cols: i32,
    rows: i32,
    _: &FontSpec,
  ) -> Result<TextureId> {
    assert!(self.windows.contains_key(&window), "texture for unknown {:?}", window);
    let id = TextureId(self.next_texture);
    self.next_texture += 1;
    self.textures.insert(
      id,
      Texture {
        window,
        cells: PointBuffer::blank(cols.max(0) as usize, rows.max(0) as usize),
      },
    );
    Ok(id)
  }

  fn destroy_texture(&mut self, window: WindowHandle, texture: TextureId) {
    let owner = self.textures.get(&texture).map(|t| t.window);
    assert_eq!(
      owner,
      Some(window),
      "{:?} destroyed through {:?}, which did not create it",
      texture,
      window
    );
    self.textures.remove(&texture);
  }

  fn draw_cells(&mut self, texture: TextureId, col: i32, row: i32, cells: &[Texel]) {
    let buf = match self.textures.get_mut(&texture) {
      Some(t) => &mut t.cells,
      None => return,
    };
    if row < 0 || col < 0 {
      return;
    }
    for (i, tx) in cells.iter().enumerate() {
      if let Some(cell) = buf.get_mut(col as usize + i, row as usize) {
        *cell = *tx;
      }
    }
  }

  fn copy_cells(&mut self, texture: TextureId, dst: Point, src: Point, cols: i32, rows: i32) -> bool {
    let buf = match self.textures.get_mut(&texture) {
      Some(t) => &mut t.cells,
      None => return false,
    };
    if [dst.x(), dst.y(), src.x(), src.y(), cols, rows].iter().any(|n| *n < 0) {
      return false;
    }
    buf.copy_within(
      (dst.x() as usize, dst.y() as usize),
      (src.x() as usize, src.y() as usize),
      cols as usize,
      rows as usize,
    );
    true
  }

  fn clear(&mut self, texture: TextureId) {
    if let Some(t) = self.textures.get_mut(&texture) {
      t.cells.fill(Texel::blank());
    }
  }

  fn present(&mut self, window: WindowHandle, frame: &Frame) {
    if let Some(w) = self.windows.get_mut(&window) {
      w.frame = Some(frame.clone());
      w.presents += 1;
    }
  }

  fn poll_event(&mut self, wait: Option<Duration>) -> Result<Option<RawEvent>> {
    if let Some(event) = self.script.pop_front() {
      if let RawEvent::Resized {
        window,
        width,
        height,
      } = event
      {
        if let Some(w) = self.windows.get_mut(&window) {
          w.rect = w.rect.with_size(width, height);
        }
      }
      return Ok(Some(event));
    }
    if let (true, Some(wait)) = (self.sleep, wait) {
      thread::sleep(wait);
    }
    Ok(None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn metrics_from_names() {
    assert_eq!(
      metrics_for(&FontSpec::new("8x13x.fon", 13)),
      Some(FontMetrics::new(8, 13))
    );
    assert_eq!(
      metrics_for(&FontSpec::new("DejaVuSansMono.ttf", 20)),
      Some(FontMetrics::new(12, 20))
    );
    assert_eq!(metrics_for(&FontSpec::new("mystery.ttf", 0)), None);

    // A zero cell size in the name falls back on the point size.
    assert_eq!(
      metrics_for(&FontSpec::new("0x10.fon", 10)),
      Some(FontMetrics::new(6, 10))
    );
    assert_eq!(metrics_for(&FontSpec::new("0x10.fon", 0)), None);
  }

  #[test]
  #[should_panic(expected = "did not create it")]
  fn textures_stay_with_their_window() {
    let mut dev = Headless::new();
    let a = dev.open_window(0, Rect::with_dims(100, 100), false).unwrap();
    let b = dev.open_window(0, Rect::with_dims(100, 100), false).unwrap();
    let font = FontSpec::new("8x13x.fon", 13);
    let tex = dev.create_texture(a, 4, 4, &font).unwrap();
    dev.destroy_texture(b, tex);
  }
}
