//! The windowing device seam.
//!
//! The accelerated backend manages windows and subwindows; a [`Device`] does
//! the actual work of opening OS windows, rasterizing fonts into textures,
//! and compositing them to the screen. Textures belong to the window they
//! were created through, and must be destroyed through it too.

use std::time::Duration;

use crate::config::FontSpec;
use crate::error::Result;
use crate::event::KeyEvent;
use crate::event::Mods;
use crate::geo::Point;
use crate::geo::Rect;
use crate::gfx::Color;
use crate::gfx::Texel;

/// An OS window opened by a [`Device`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct WindowHandle(pub u32);

/// A cell grid texture, owned by the window that created it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TextureId(pub u32);

/// The pixel size of one cell of a font.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct FontMetrics {
  pub cell_width: i32,
  pub cell_height: i32,
}

impl FontMetrics {
  pub const fn new(cell_width: i32, cell_height: i32) -> Self {
    Self {
      cell_width,
      cell_height,
    }
  }

  /// Returns whether cells have a positive size in both directions.
  pub fn is_usable(self) -> bool {
    self.cell_width > 0 && self.cell_height > 0
  }

  /// Returns the pixel size of a `cols` by `rows` grid.
  pub fn grid(self, cols: i32, rows: i32) -> (i32, i32) {
    (cols * self.cell_width, rows * self.cell_height)
  }

  /// Returns how many whole cells fit in `width` by `height` pixels.
  pub fn cells_in(self, width: i32, height: i32) -> (i32, i32) {
    (
      (width / self.cell_width).max(0),
      (height / self.cell_height).max(0),
    )
  }
}

/// One textured rectangle of a composed frame.
#[derive(Clone, PartialEq, Debug)]
pub struct Layer {
  pub texture: TextureId,
  /// Where the texture goes, in window pixels, including any border.
  pub rect: Rect,
  pub border: i32,
  pub border_color: Option<Color>,
  pub alpha: u8,
  /// The cursor, as a cell position in the texture.
  pub cursor: Option<Point>,
}

/// Everything a window shows.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Frame {
  /// The status bar's cells, drawn across the top in the system font.
  pub bar: Vec<Texel>,
  pub bar_height: i32,
  /// Subwindows, back to front.
  pub layers: Vec<Layer>,
}

/// Input as the device sees it: per window, in pixels, including drags.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RawEvent {
  Key(KeyEvent),
  PointerDown {
    window: WindowHandle,
    at: Point,
    button: u8,
    mods: Mods,
  },
  PointerMove {
    window: WindowHandle,
    at: Point,
  },
  PointerUp {
    window: WindowHandle,
    at: Point,
    button: u8,
  },
  /// The user or OS resized a window.
  Resized {
    window: WindowHandle,
    width: i32,
    height: i32,
  },
  /// A window's contents were lost and must be redrawn.
  Exposed { window: WindowHandle },
}

/// A windowing system.
pub trait Device {
  fn name(&self) -> &'static str;

  /// Opens a window on display `display` covering `rect`.
  fn open_window(
    &mut self,
    display: usize,
    rect: Rect,
    fullscreen: bool,
  ) -> Result<WindowHandle>;

  /// Closes a window. All of its textures must already be destroyed.
  fn close_window(&mut self, window: WindowHandle);

  /// Loads a font and reports its cell size.
  fn font_metrics(&mut self, font: &FontSpec) -> Result<FontMetrics>;

  /// Creates a blank `cols` by `rows` cell texture for `window`.
  fn create_texture(
    &mut self,
    window: WindowHandle,
    cols: i32,
    rows: i32,
    font: &FontSpec,
  ) -> Result<TextureId>;

  /// Destroys a texture; `window` must be the window that created it.
  fn destroy_texture(&mut self, window: WindowHandle, texture: TextureId);

  /// Renders a horizontal run of cells into a texture.
  fn draw_cells(&mut self, texture: TextureId, col: i32, row: i32, cells: &[Texel]);

  /// Copies a block of cells within a texture, returning whether the device
  /// could do so.
  fn copy_cells(
    &mut self,
    texture: TextureId,
    dst: Point,
    src: Point,
    cols: i32,
    rows: i32,
  ) -> bool;

  /// Clears a texture to blanks.
  fn clear(&mut self, texture: TextureId);

  /// Composes and shows a window.
  fn present(&mut self, window: WindowHandle, frame: &Frame);

  /// Returns the next raw event, waiting up to `wait` for one.
  fn poll_event(&mut self, wait: Option<Duration>) -> Result<Option<RawEvent>>;
}
