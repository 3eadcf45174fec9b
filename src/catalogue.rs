//! The surface catalogue.
//!
//! Permanent surfaces come from a small, closed set known at compile time.
//! Each one has a [`Descriptor`] giving its name, its size constraints (in
//! cells), and whether the game can run without it.

use std::fmt;

/// One of the permanent surfaces.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum SurfaceKind {
  /// The dungeon map; the implicit input target when nothing else is open.
  Map,
  Message,
  Status,
  Sidebar,
  Inventory,
  Equipment,
  MonsterList,
  ObjectList,
  MessageLog,
}

/// Static facts about a [`SurfaceKind`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Descriptor {
  pub name: &'static str,
  pub abbrev: &'static str,
  pub min: (i32, i32),
  pub default: (i32, i32),
  pub max: (i32, i32),
  pub required: bool,
}

impl Descriptor {
  pub fn min_cols(&self) -> i32 {
    self.min.0
  }

  pub fn min_rows(&self) -> i32 {
    self.min.1
  }
}

#[rustfmt::skip]
const DESCRIPTORS: [Descriptor; SurfaceKind::COUNT] = [
  Descriptor { name: "map", abbrev: "MAP", min: (40, 12), default: (80, 24), max: (255, 255), required: true },
  Descriptor { name: "message", abbrev: "MSG", min: (20, 1), default: (80, 1), max: (255, 3), required: false },
  Descriptor { name: "status", abbrev: "STA", min: (20, 1), default: (80, 1), max: (255, 2), required: false },
  Descriptor { name: "sidebar", abbrev: "SID", min: (12, 10), default: (12, 22), max: (20, 255), required: false },
  Descriptor { name: "inventory", abbrev: "INV", min: (20, 5), default: (40, 23), max: (80, 255), required: false },
  Descriptor { name: "equipment", abbrev: "EQU", min: (20, 5), default: (40, 12), max: (80, 255), required: false },
  Descriptor { name: "monsters", abbrev: "MON", min: (16, 3), default: (30, 10), max: (80, 255), required: false },
  Descriptor { name: "objects", abbrev: "OBJ", min: (16, 3), default: (30, 10), max: (80, 255), required: false },
  Descriptor { name: "messages", abbrev: "LOG", min: (20, 3), default: (80, 10), max: (255, 255), required: false },
];

impl SurfaceKind {
  /// The number of permanent surfaces.
  pub const COUNT: usize = 9;

  /// Every permanent surface, in catalogue order.
  #[rustfmt::skip]
  pub const ALL: [SurfaceKind; Self::COUNT] = [
    Self::Map, Self::Message, Self::Status, Self::Sidebar, Self::Inventory,
    Self::Equipment, Self::MonsterList, Self::ObjectList, Self::MessageLog,
  ];

  /// Returns this surface's position in [`SurfaceKind::ALL`].
  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }

  /// Looks a surface up by its catalogue index.
  pub fn from_index(index: usize) -> Option<Self> {
    Self::ALL.get(index).copied()
  }

  /// Looks a surface up by its name or abbreviation, case-insensitively.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|k| {
      let d = k.descriptor();
      d.name.eq_ignore_ascii_case(name) || d.abbrev.eq_ignore_ascii_case(name)
    })
  }

  /// Returns this surface's descriptor.
  #[inline]
  pub fn descriptor(self) -> &'static Descriptor {
    &DESCRIPTORS[self.index()]
  }

  /// Returns the name of the environment variable that overrides this
  /// surface's screen region, e.g., `TERM_INVENTORY`.
  pub fn env_var(self) -> String {
    format!("TERM_{}", self.descriptor().name.to_ascii_uppercase())
  }
}

impl fmt::Display for SurfaceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.descriptor().name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalogue_is_consistent() {
    for (i, kind) in SurfaceKind::ALL.iter().enumerate() {
      assert_eq!(kind.index(), i);
      let d = kind.descriptor();
      assert!(d.min.0 <= d.default.0 && d.default.0 <= d.max.0, "{}", kind);
      assert!(d.min.1 <= d.default.1 && d.default.1 <= d.max.1, "{}", kind);
      assert_eq!(SurfaceKind::from_name(d.abbrev), Some(*kind));
    }
    assert_eq!(SurfaceKind::Inventory.env_var(), "TERM_INVENTORY");
  }
}
