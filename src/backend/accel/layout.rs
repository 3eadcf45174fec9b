//! Layout persistence.
//!
//! A layout is saved as text, one `key:index:field:...` record per line:
//!
//! ```text
//! window-display:0:0
//! window-full-rect:0:0:0:1024:768
//! window-system-font:0:10:6x10x.fon
//! subwindow-window:0:0
//! subwindow-full-rect:0:98:32:642:288
//! subwindow-top:0:0:1
//! ```
//!
//! Window records are indexed by window number; a record for window `k`
//! creates it if it is the next unseen window. Subwindow records are indexed
//! by surface catalogue index, and a `subwindow-window` record must come
//! first, naming a window that already exists. Fonts and paths are always
//! the last field, so they may contain `:`. Blank lines and lines starting
//! with `#` are ignored; anything else that doesn't parse rejects the whole
//! file.

use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::backend::accel::device::FontMetrics;
use crate::catalogue::SurfaceKind;
use crate::config::Config;
use crate::config::FontSpec;
use crate::error::Error;
use crate::error::Result;
use crate::geo::Rect;

/// How a window's contents are rendered.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Renderer {
  Hardware,
  Software,
}

/// How a wallpaper fills a window.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum WallpaperMode {
  None,
  Tiled,
  Centered,
  Scaled,
}

macro_rules! keyword_enum {
  ($ty:ident { $($variant:ident => $word:literal,)* }) => {
    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { $(Self::$variant => $word,)* })
      }
    }

    impl FromStr for $ty {
      type Err = ();
      fn from_str(s: &str) -> Result<Self, ()> {
        match s { $($word => Ok(Self::$variant),)* _ => Err(()) }
      }
    }
  };
}

keyword_enum!(Renderer {
  Hardware => "hardware",
  Software => "software",
});

keyword_enum!(WallpaperMode {
  None => "none",
  Tiled => "tiled",
  Centered => "centered",
  Scaled => "scaled",
});

/// Everything saved about a window.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WindowConfig {
  pub display: usize,
  pub fullscreen: bool,
  pub full_rect: Rect,
  pub renderer: Renderer,
  pub wallpaper_path: String,
  pub wallpaper_mode: WallpaperMode,
  pub system_font: FontSpec,
  pub game_font: FontSpec,
  pub graphics_id: u32,
}

impl WindowConfig {
  /// A 1024x768 window on the first display.
  pub fn new(config: &Config) -> Self {
    Self {
      display: 0,
      fullscreen: false,
      full_rect: Rect::with_dims(1024, 768),
      renderer: Renderer::Hardware,
      wallpaper_path: String::new(),
      wallpaper_mode: WallpaperMode::None,
      system_font: config.fonts.system.clone(),
      game_font: config.fonts.game.clone(),
      graphics_id: 0,
    }
  }
}

/// Everything saved about a docked subwindow.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubwindowConfig {
  pub window: usize,
  pub full_rect: Rect,
  pub font: FontSpec,
  pub borders: bool,
  pub top: bool,
  pub always_top: bool,
  pub alpha: u8,
}

/// A complete saved layout.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LayoutFile {
  pub windows: Vec<WindowConfig>,
  /// Subwindows, by surface catalogue index.
  pub subwindows: Vec<Option<SubwindowConfig>>,
}

impl LayoutFile {
  /// Returns the layout used when there is no saved one: a single window
  /// with the message line on top, the sidebar and map side by side, and the
  /// status line below.
  pub fn default_for(config: &Config, cell: FontMetrics, bar_height: i32) -> Self {
    let window = WindowConfig::new(config);
    let mut subwindows = vec![None; SurfaceKind::COUNT];
    let border = 1;
    let mut place = |kind: SurfaceKind, x: i32, y: i32, cols: i32, rows: i32| {
      let (w, h) = cell.grid(cols, rows);
      let rect = Rect::new(x, y, w + 2 * border, h + 2 * border);
      subwindows[kind.index()] = Some(SubwindowConfig {
        window: 0,
        full_rect: rect,
        font: config.fonts.game.clone(),
        borders: true,
        top: false,
        always_top: false,
        alpha: 255,
      });
      rect
    };

    let msg = place(SurfaceKind::Message, 0, bar_height, 80, 1);
    let side = place(SurfaceKind::Sidebar, 0, msg.bottom(), 12, 22);
    let map = place(SurfaceKind::Map, side.right(), msg.bottom(), 80, 22);
    place(SurfaceKind::Status, 0, map.bottom(), 80, 1);

    Self {
      windows: vec![window],
      subwindows,
    }
  }

  /// Parses a layout.
  pub fn parse(text: &str, config: &Config) -> Result<Self> {
    let mut layout = Self {
      windows: Vec::new(),
      subwindows: vec![None; SurfaceKind::COUNT],
    };
    for (i, line) in text.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      layout.record(i + 1, line, config)?;
    }
    if layout.windows.is_empty() {
      return Err(Error::layout(0, "no windows"));
    }
    Ok(layout)
  }

  fn record(&mut self, line: usize, text: &str, config: &Config) -> Result<()> {
    let err = |reason: &str| Error::layout(line, reason);
    let mut parts = text.splitn(3, ':');
    let key = parts.next().unwrap_or_default();
    let index: usize = parts
      .next()
      .and_then(|i| i.parse().ok())
      .ok_or_else(|| err("missing or bad index"))?;
    let fields = parts.next().ok_or_else(|| err("missing fields"))?;

    if let Some(key) = key.strip_prefix("window-") {
      let window = match index {
        i if i < self.windows.len() => &mut self.windows[i],
        i if i == self.windows.len() => {
          self.windows.push(WindowConfig::new(config));
          &mut self.windows[i]
        }
        _ => return Err(err("window records out of order")),
      };
      match key {
        "display" => window.display = one(fields).ok_or_else(|| err("bad display"))?,
        "fullscreen" => window.fullscreen = flag(fields).ok_or_else(|| err("bad flag"))?,
        "full-rect" => window.full_rect = rect(fields).ok_or_else(|| err("bad rect"))?,
        "renderer" => window.renderer = fields.parse().map_err(|_| err("bad renderer"))?,
        "wallpaper-path" => window.wallpaper_path = fields.to_string(),
        "wallpaper-mode" => {
          window.wallpaper_mode = fields.parse().map_err(|_| err("bad wallpaper mode"))?
        }
        "system-font" => window.system_font = font(fields).ok_or_else(|| err("bad font"))?,
        "game-font" => window.game_font = font(fields).ok_or_else(|| err("bad font"))?,
        "graphics-id" => window.graphics_id = one(fields).ok_or_else(|| err("bad id"))?,
        _ => return Err(err("unknown window record")),
      }
      return Ok(());
    }

    let key = key
      .strip_prefix("subwindow-")
      .ok_or_else(|| err("unknown record"))?;
    if index >= self.subwindows.len() {
      return Err(err("no such surface"));
    }
    if key == "window" {
      let window: usize = one(fields).ok_or_else(|| err("bad window index"))?;
      let parent = self
        .windows
        .get(window)
        .ok_or_else(|| err("subwindow names a window that doesn't exist yet"))?;
      self.subwindows[index] = Some(SubwindowConfig {
        window,
        full_rect: Rect::with_dims(0, 0),
        font: parent.game_font.clone(),
        borders: true,
        top: false,
        always_top: false,
        alpha: 255,
      });
      return Ok(());
    }

    let sub = self.subwindows[index]
      .as_mut()
      .ok_or_else(|| err("subwindow record before its subwindow-window"))?;
    match key {
      "full-rect" => sub.full_rect = rect(fields).ok_or_else(|| err("bad rect"))?,
      "font" => sub.font = font(fields).ok_or_else(|| err("bad font"))?,
      "borders" => sub.borders = flag(fields).ok_or_else(|| err("bad flag"))?,
      "top" => {
        let (top, always) = fields
          .split_once(':')
          .and_then(|(a, b)| Some((flag(a)?, flag(b)?)))
          .ok_or_else(|| err("bad top flags"))?;
        sub.top = top;
        sub.always_top = always;
      }
      "alpha" => sub.alpha = one(fields).ok_or_else(|| err("bad alpha"))?,
      _ => return Err(err("unknown subwindow record")),
    }
    Ok(())
  }

  /// Renders this layout in the text format.
  pub fn dump(&self) -> String {
    let mut out = String::new();
    // Writing to a String can't fail.
    let _ = self.write_to(&mut out);
    out
  }

  fn write_to(&self, out: &mut String) -> fmt::Result {
    for (i, w) in self.windows.iter().enumerate() {
      let r = w.full_rect;
      writeln!(out, "window-display:{}:{}", i, w.display)?;
      writeln!(out, "window-fullscreen:{}:{}", i, w.fullscreen as u8)?;
      writeln!(out, "window-full-rect:{}:{}:{}:{}:{}", i, r.x(), r.y(), r.width(), r.height())?;
      writeln!(out, "window-renderer:{}:{}", i, w.renderer)?;
      writeln!(out, "window-wallpaper-path:{}:{}", i, w.wallpaper_path)?;
      writeln!(out, "window-wallpaper-mode:{}:{}", i, w.wallpaper_mode)?;
      writeln!(out, "window-system-font:{}:{}:{}", i, w.system_font.size, w.system_font.name)?;
      writeln!(out, "window-game-font:{}:{}:{}", i, w.game_font.size, w.game_font.name)?;
      writeln!(out, "window-graphics-id:{}:{}", i, w.graphics_id)?;
      writeln!(out)?;
    }
    for (i, s) in self.subwindows.iter().enumerate() {
      let s = match s {
        Some(s) => s,
        None => continue,
      };
      let r = s.full_rect;
      writeln!(out, "subwindow-window:{}:{}", i, s.window)?;
      writeln!(out, "subwindow-full-rect:{}:{}:{}:{}:{}", i, r.x(), r.y(), r.width(), r.height())?;
      writeln!(out, "subwindow-font:{}:{}:{}", i, s.font.size, s.font.name)?;
      writeln!(out, "subwindow-borders:{}:{}", i, s.borders as u8)?;
      writeln!(out, "subwindow-top:{}:{}:{}", i, s.top as u8, s.always_top as u8)?;
      writeln!(out, "subwindow-alpha:{}:{}", i, s.alpha)?;
      writeln!(out)?;
    }
    Ok(())
  }

  /// Returns a required surface this layout has no subwindow for, if any.
  ///
  /// Such a layout parses, but no display can be brought up on it.
  pub fn missing_required(&self) -> Option<SurfaceKind> {
    SurfaceKind::ALL.iter().copied().find(|kind| {
      kind.descriptor().required && self.subwindows[kind.index()].is_none()
    })
  }

  /// Loads a layout from `path`.
  pub fn load(path: &Path, config: &Config) -> Result<Self> {
    let text = fs::read_to_string(path)?;
    let layout = Self::parse(&text, config)?;
    tracing::info!(path = %path.display(), "loaded window layout");
    Ok(layout)
  }

  /// Writes this layout to `path`.
  pub fn save(&self, path: &Path) -> Result<()> {
    fs::write(path, self.dump())?;
    tracing::info!(path = %path.display(), "saved window layout");
    Ok(())
  }
}

fn one<T: FromStr>(field: &str) -> Option<T> {
  field.trim().parse().ok()
}

fn flag(field: &str) -> Option<bool> {
  match field.trim() {
    "0" => Some(false),
    "1" => Some(true),
    _ => None,
  }
}

fn rect(fields: &str) -> Option<Rect> {
  let mut nums = fields.split(':').map(|f| f.trim().parse::<i32>());
  let mut next = || nums.next()?.ok();
  let r = Rect::new(next()?, next()?, next()?, next()?);
  if nums.next().is_some() || r.width() < 0 || r.height() < 0 {
    return None;
  }
  Some(r)
}

fn font(fields: &str) -> Option<FontSpec> {
  let (size, name) = fields.split_once(':')?;
  if name.is_empty() {
    return None;
  }
  Some(FontSpec::new(name, size.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subwindows_need_their_window_first() {
    let config = Config::default();
    let err = LayoutFile::parse("subwindow-window:0:0\nwindow-display:0:0\n", &config);
    assert!(matches!(err, Err(Error::Layout { line: 1, .. })));

    let ok = LayoutFile::parse(
      "# saved\nwindow-display:0:1\n\nsubwindow-window:0:0\nsubwindow-alpha:0:128\n",
      &config,
    )
    .unwrap();
    assert_eq!(ok.windows[0].display, 1);
    assert_eq!(ok.subwindows[0].as_ref().unwrap().alpha, 128);
    assert_eq!(ok.missing_required(), None);
  }

  #[test]
  fn layouts_without_a_map_are_incomplete() {
    let config = Config::default();
    let layout = LayoutFile::parse(
      "window-display:0:0\nwindow-full-rect:0:0:0:1024:768\nsubwindow-window:3:0\n",
      &config,
    )
    .unwrap();
    assert_eq!(layout.missing_required(), Some(SurfaceKind::Map));
  }

  #[test]
  fn fonts_and_paths_may_contain_colons() {
    let config = Config::default();
    let layout = LayoutFile::parse(
      "window-wallpaper-path:0:C:\\art\\wall.png\nwindow-game-font:0:16:C:\\fonts\\a.ttf\n",
      &config,
    )
    .unwrap();
    assert_eq!(layout.windows[0].wallpaper_path, "C:\\art\\wall.png");
    assert_eq!(layout.windows[0].game_font, FontSpec::new("C:\\fonts\\a.ttf", 16));
  }

  #[test]
  fn malformed_records_are_rejected() {
    let config = Config::default();
    for bad in [
      "window-display:0",
      "window-display:x:0",
      "window-full-rect:0:1:2:3",
      "window-display:1:0",
      "window-bogus:0:0",
      "window-fullscreen:0:yes",
      "mystery:0:0",
      "window-display:0:0\nsubwindow-window:99:0",
      "window-display:0:0\nsubwindow-top:0:1:1",
    ] {
      assert!(LayoutFile::parse(bad, &config).is_err(), "{:?}", bad);
    }
  }

  #[test]
  fn default_layout_round_trips() {
    let config = Config::default();
    let layout = LayoutFile::default_for(&config, FontMetrics::new(8, 13), 17);
    assert_eq!(
      layout.subwindows[SurfaceKind::Map.index()].as_ref().unwrap().full_rect,
      Rect::new(98, 32, 642, 288)
    );
    assert_eq!(LayoutFile::parse(&layout.dump(), &config).unwrap(), layout);
  }
}
