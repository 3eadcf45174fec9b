//! Input events.
//!
//! Only two kinds of events ever reach callers: key presses and pointer
//! presses. Everything else a backend sees (window resizes, drags, status bar
//! clicks) is handled internally.

use crate::catalogue::SurfaceKind;

bitflags::bitflags! {
  /// Modifier keys held during an event.
  #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
  pub struct Mods: u8 {
    const SHIFT = 1 << 0;
    const CONTROL = 1 << 1;
    const ALT = 1 << 2;
    const META = 1 << 3;
    /// The key came from the numeric keypad.
    const KEYPAD = 1 << 4;
  }
}

/// A key code.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[allow(missing_docs)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  Up,
  Down,
  Left,
  Right,
  Home,
  End,
  PageUp,
  PageDown,
  Insert,
  Delete,
  F(u8),
}

/// A key press.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct KeyEvent {
  pub code: Key,
  pub mods: Mods,
}

impl KeyEvent {
  /// Creates an unmodified key event.
  pub fn new(code: Key) -> Self {
    Self {
      code,
      mods: Mods::empty(),
    }
  }
}

/// The surface a pointer event landed on.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Target {
  Permanent(SurfaceKind),
  /// A transient surface, by stack slot (0 is the bottom of the stack).
  Transient(usize),
}

impl Target {
  /// Encodes this target as a single integer: permanent surfaces are their
  /// catalogue index, transient slot `k` is `-(k + 1)`.
  pub fn encode(self) -> i32 {
    match self {
      Self::Permanent(kind) => kind.index() as i32,
      Self::Transient(slot) => -(slot as i32) - 1,
    }
  }

  /// Inverse of [`Target::encode()`].
  pub fn decode(code: i32) -> Option<Self> {
    if code < 0 {
      Some(Self::Transient((-code - 1) as usize))
    } else {
      SurfaceKind::from_index(code as usize).map(Self::Permanent)
    }
  }
}

/// A pointer press, in cell coordinates relative to `target`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct PointerEvent {
  pub x: i32,
  pub y: i32,
  pub button: u8,
  pub mods: Mods,
  pub target: Target,
}

/// An input event.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Event {
  Key(KeyEvent),
  Pointer(PointerEvent),
}

impl From<KeyEvent> for Event {
  fn from(e: KeyEvent) -> Self {
    Self::Key(e)
  }
}

impl From<Key> for Event {
  fn from(k: Key) -> Self {
    Self::Key(KeyEvent::new(k))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn targets_encode_transients_negatively() {
    for t in [
      Target::Permanent(SurfaceKind::Map),
      Target::Permanent(SurfaceKind::MessageLog),
      Target::Transient(0),
      Target::Transient(7),
    ] {
      assert_eq!(Target::decode(t.encode()), Some(t));
    }
    assert_eq!(Target::Transient(0).encode(), -1);
    assert_eq!(Target::decode(99), None);
  }
}
