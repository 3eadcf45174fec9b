//! Texels, surface elements.
//!
//! A *texel* is the unit of all drawing: one cell of a surface. It is not
//! *quite* a terminal cell, because it carries a foreground layer and a
//! background layer (each a glyph plus a color), a terrain tint, and a handful
//! of flag bits. See the [`Texel`] type for more info.

pub use palette::named as colors;

/// An RGB value used by a [`Texel`].
pub type Rgb = palette::Srgb<u8>;

/// A foreground, background, or tint color for a [`Texel`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Color {
  /// A solid RGB value.
  Rgb(Rgb),

  /// The "default" value, i.e., whatever the backend's default colors are.
  Reset,
}

impl From<Rgb> for Color {
  fn from(rgb: Rgb) -> Self {
    Self::Rgb(rgb)
  }
}

impl Default for Color {
  fn default() -> Self {
    Self::Reset
  }
}

bitflags::bitflags! {
  /// Per-texel rendering flags.
  #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
  pub struct Flags: u8 {
    const BOLD = 1 << 0;
    const DIM = 1 << 1;
    const UNDERLINE = 1 << 2;
    const REVERSE = 1 << 3;
    /// The glyph names a tile rather than a character.
    const TILE = 1 << 4;
    /// Right half of a double-width glyph; backends draw nothing here.
    const PADDING = 1 << 5;
  }
}

/// One layer of a [`Texel`]: a glyph and the color to draw it in.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Layer {
  pub glyph: char,
  pub color: Color,
}

impl Layer {
  const BLANK: Layer = Layer {
    glyph: ' ',
    color: Color::Reset,
  };
}

/// A "surface element", analogous to a pixel or voxel.
///
/// A texel consists of a foreground [`Layer`] drawn over a background
/// [`Layer`], a terrain tint that backends may use to shade the background,
/// and [`Flags`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Texel {
  fg: Layer,
  bg: Layer,
  tint: Color,
  flags: Flags,
}

impl Default for Texel {
  fn default() -> Self {
    Self::blank()
  }
}

impl Texel {
  /// The blank texel: every backend must render this as empty space.
  #[inline]
  pub const fn blank() -> Self {
    Self {
      fg: Layer::BLANK,
      bg: Layer::BLANK,
      tint: Color::Reset,
      flags: Flags::empty(),
    }
  }

  /// Creates a new colorless texel with the given foreground glyph.
  #[inline]
  pub fn new(glyph: char) -> Self {
    Self::blank().with_glyph(glyph)
  }

  /// Returns whether this is the blank texel.
  #[inline]
  pub fn is_blank(self) -> bool {
    self == Self::blank()
  }

  /// Returns the foreground layer.
  #[inline]
  pub fn fg(self) -> Layer {
    self.fg
  }

  /// Returns the background layer.
  #[inline]
  pub fn bg(self) -> Layer {
    self.bg
  }

  #[inline]
  pub fn tint(self) -> Color {
    self.tint
  }

  #[inline]
  pub fn flags(self) -> Flags {
    self.flags
  }

  /// Returns a copy of this texel with the given foreground glyph.
  #[inline]
  pub fn with_glyph(mut self, glyph: char) -> Self {
    self.fg.glyph = glyph;
    self
  }

  /// Returns a copy of this texel with the given foreground color.
  #[inline]
  pub fn with_fg(mut self, color: impl Into<Color>) -> Self {
    self.fg.color = color.into();
    self
  }

  /// Returns a copy of this texel with the given background layer.
  #[inline]
  pub fn with_bg(mut self, glyph: char, color: impl Into<Color>) -> Self {
    self.bg = Layer {
      glyph,
      color: color.into(),
    };
    self
  }

  /// Returns a copy of this texel with the given terrain tint.
  #[inline]
  pub fn with_tint(mut self, tint: impl Into<Color>) -> Self {
    self.tint = tint.into();
    self
  }

  /// Returns a copy of this texel with `flags` added.
  #[inline]
  pub fn with_flags(mut self, flags: Flags) -> Self {
    self.flags |= flags;
    self
  }

  /// Returns the glyph a single-layer backend should print.
  ///
  /// This is the foreground glyph, unless it is a space, in which case the
  /// background glyph shows through.
  #[inline]
  pub fn visible_glyph(self) -> char {
    if self.fg.glyph == ' ' {
      self.bg.glyph
    } else {
      self.fg.glyph
    }
  }

  /// Returns the color a single-layer backend should fill the cell with.
  ///
  /// The background color wins; failing that, the terrain tint.
  #[inline]
  pub fn fill_color(self) -> Color {
    match self.bg.color {
      Color::Reset => self.tint,
      c => c,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn background_shows_through_spaces() {
    let tx = Texel::blank().with_bg('.', colors::GRAY);
    assert_eq!(tx.visible_glyph(), '.');
    assert_eq!(tx.with_glyph('@').visible_glyph(), '@');
  }

  #[test]
  fn tint_fills_when_background_is_default() {
    let tx = Texel::new('#').with_tint(colors::DARKGREEN);
    assert_eq!(tx.fill_color(), Color::Rgb(colors::DARKGREEN));
    let tx = tx.with_bg(' ', colors::NAVY);
    assert_eq!(tx.fill_color(), Color::Rgb(colors::NAVY));
  }

  #[test]
  fn blank_is_blank() {
    assert!(Texel::blank().is_blank());
    assert!(Texel::default().is_blank());
    assert!(!Texel::new('x').is_blank());
    assert!(!Texel::blank().with_flags(Flags::BOLD).is_blank());
  }
}
