//! Screen regions for the character-cell backend.
//!
//! A character-cell screen is carved into one fixed region per permanent
//! surface. The default carving puts the message line on top, the status line
//! at the bottom, a sidebar on the left, the map in the middle, and stacks the
//! list surfaces in a column on the right if the screen is wide enough.
//!
//! Any surface's region can be overridden through the environment variable
//! named by [`SurfaceKind::env_var()`], with the syntax
//! `LEFTxTOPxWIDTHxHEIGHT`. A malformed or out-of-bounds override is fatal.

use crate::catalogue::SurfaceKind;
use crate::error::Error;
use crate::error::Result;
use crate::geo::Rect;

/// Surfaces stacked in the right-hand column, top to bottom.
const COLUMN: [SurfaceKind; 5] = [
  SurfaceKind::Inventory,
  SurfaceKind::Equipment,
  SurfaceKind::MonsterList,
  SurfaceKind::ObjectList,
  SurfaceKind::MessageLog,
];

/// The region assigned to each permanent surface.
///
/// A missing region means the surface doesn't fit and won't be realized.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Layout {
  regions: [Option<Rect>; SurfaceKind::COUNT],
}

impl Layout {
  /// Computes the layout for `screen`, consulting `lookup` for overrides.
  ///
  /// `lookup` maps an environment variable name to its value; pass
  /// `|v| std::env::var(v).ok()` to read the real environment.
  pub fn compute(
    screen: Rect,
    lookup: impl Fn(&str) -> Option<String>,
  ) -> Result<Self> {
    let mut layout = Self::default_for(screen);
    for kind in SurfaceKind::ALL.iter().copied() {
      let var = kind.env_var();
      if let Some(value) = lookup(&var) {
        let rect = parse_override(&var, &value)?;
        validate(kind, &var, &value, rect, screen)?;
        tracing::debug!(%kind, ?rect, "region override");
        layout.regions[kind.index()] = Some(rect);
      }
    }
    Ok(layout)
  }

  /// Computes the default layout for `screen`, ignoring overrides.
  pub fn default_for(screen: Rect) -> Self {
    let mut layout = Self::default();
    let cols = screen.width();
    let rows = screen.height();
    let map = SurfaceKind::Map.descriptor();

    let spare_rows = rows - map.min_rows();
    let mut top = screen.y();
    let mut bottom = screen.bottom();
    if spare_rows >= 1 {
      layout.regions[SurfaceKind::Message.index()] =
        Some(Rect::new(screen.x(), top, cols, 1));
      top += 1;
    }
    if spare_rows >= 2 {
      bottom -= 1;
      layout.regions[SurfaceKind::Status.index()] =
        Some(Rect::new(screen.x(), bottom, cols, 1));
    }
    let height = bottom - top;

    let sidebar = SurfaceKind::Sidebar.descriptor();
    let mut left = screen.x();
    if cols - sidebar.default.0 >= map.min_cols() && height >= sidebar.min_rows()
    {
      layout.regions[SurfaceKind::Sidebar.index()] =
        Some(Rect::new(left, top, sidebar.default.0, height));
      left += sidebar.default.0;
    }

    // Whatever is left of the map's default width, minus a one-column gutter,
    // goes to the right-hand column.
    let column_width = screen.right() - left - map.default.0 - 1;
    let min_column = COLUMN
      .iter()
      .map(|k| k.descriptor().min_cols())
      .min()
      .unwrap_or(0);
    let map_width = if column_width >= min_column {
      map.default.0
    } else {
      screen.right() - left
    };
    if map_width >= map.min_cols() && height >= map.min_rows() {
      layout.regions[SurfaceKind::Map.index()] =
        Some(Rect::new(left, top, map_width, height));
    }

    if column_width >= min_column {
      let x = left + map_width + 1;
      let mut y = top;
      for kind in COLUMN.iter().copied() {
        let d = kind.descriptor();
        let w = column_width.min(d.max.0);
        let h = d.default.1.min(bottom - y);
        if w < d.min_cols() || h < d.min_rows() {
          continue;
        }
        layout.regions[kind.index()] = Some(Rect::new(x, y, w, h));
        y += h;
      }
    }

    layout
  }

  /// Returns the region for `kind`, if it has one.
  pub fn get(&self, kind: SurfaceKind) -> Option<Rect> {
    self.regions[kind.index()]
  }
}

/// Parses an override of the form `LEFTxTOPxWIDTHxHEIGHT`.
pub fn parse_override(var: &str, value: &str) -> Result<Rect> {
  let bad = |reason: &str| Error::BadOverride {
    var: var.to_string(),
    value: value.to_string(),
    reason: reason.to_string(),
  };

  let mut nums = [0i32; 4];
  let mut parts = value.trim().split(|c| c == 'x' || c == 'X');
  for n in nums.iter_mut() {
    let part = parts
      .next()
      .ok_or_else(|| bad("expected LEFTxTOPxWIDTHxHEIGHT"))?;
    *n = part
      .trim()
      .parse()
      .map_err(|_| bad("fields must be integers"))?;
  }
  if parts.next().is_some() {
    return Err(bad("expected exactly four fields"));
  }

  let [x, y, w, h] = nums;
  Ok(Rect::new(x, y, w, h))
}

fn validate(
  kind: SurfaceKind,
  var: &str,
  value: &str,
  rect: Rect,
  screen: Rect,
) -> Result<()> {
  let d = kind.descriptor();
  let reason = if rect.width() < d.min_cols() || rect.height() < d.min_rows() {
    format!(
      "{} needs at least {}x{}",
      kind,
      d.min_cols(),
      d.min_rows()
    )
  } else if rect.width() > screen.width() || rect.height() > screen.height() {
    format!(
      "larger than the {}x{} screen",
      screen.width(),
      screen.height()
    )
  } else if !screen.contains_rect(rect) {
    "region extends off-screen".to_string()
  } else {
    return Ok(());
  };

  Err(Error::BadOverride {
    var: var.to_string(),
    value: value.to_string(),
    reason,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn parses_overrides() {
    assert_eq!(
      parse_override("TERM_MAP", "1x2x40x12").unwrap(),
      Rect::new(1, 2, 40, 12)
    );
    assert!(parse_override("TERM_MAP", "1x2x40").is_err());
    assert!(parse_override("TERM_MAP", "1x2x40x12x5").is_err());
    assert!(parse_override("TERM_MAP", "1x2xfortyx12").is_err());
  }

  #[test]
  fn default_layout_on_a_classic_terminal() {
    let layout = Layout::compute(Rect::with_dims(80, 24), no_env).unwrap();
    assert_eq!(layout.get(SurfaceKind::Message), Some(Rect::new(0, 0, 80, 1)));
    assert_eq!(layout.get(SurfaceKind::Status), Some(Rect::new(0, 23, 80, 1)));
    assert_eq!(layout.get(SurfaceKind::Sidebar), Some(Rect::new(0, 1, 12, 22)));
    assert_eq!(layout.get(SurfaceKind::Map), Some(Rect::new(12, 1, 68, 22)));
    assert_eq!(layout.get(SurfaceKind::Inventory), None);
  }

  #[test]
  fn wide_terminals_get_a_column() {
    let layout = Layout::compute(Rect::with_dims(140, 40), no_env).unwrap();
    assert_eq!(layout.get(SurfaceKind::Map), Some(Rect::new(12, 1, 80, 38)));
    assert_eq!(
      layout.get(SurfaceKind::Inventory),
      Some(Rect::new(93, 1, 47, 23))
    );
    assert_eq!(
      layout.get(SurfaceKind::Equipment),
      Some(Rect::new(93, 24, 47, 12))
    );
    // Only three rows remain, which is exactly the monster list's minimum.
    assert_eq!(
      layout.get(SurfaceKind::MonsterList),
      Some(Rect::new(93, 36, 47, 3))
    );
  }

  #[test]
  fn too_small_for_the_map() {
    let layout = Layout::compute(Rect::with_dims(30, 10), no_env).unwrap();
    assert_eq!(layout.get(SurfaceKind::Map), None);
  }

  #[test]
  fn overrides_are_validated() {
    let screen = Rect::with_dims(80, 24);
    let env = |v: &str| {
      (v == "TERM_INVENTORY").then(|| "50x2x30x10".to_string())
    };
    let layout = Layout::compute(screen, env).unwrap();
    assert_eq!(
      layout.get(SurfaceKind::Inventory),
      Some(Rect::new(50, 2, 30, 10))
    );

    for bad in ["60x2x30x10", "0x0x10x10", "0x0x90x10", "-1x0x30x10"] {
      let env = |v: &str| (v == "TERM_INVENTORY").then(|| bad.to_string());
      let err = Layout::compute(screen, env).unwrap_err();
      assert!(err.is_fatal(), "{}", bad);
    }
  }
}
