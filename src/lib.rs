//! Display surface multiplexing for roguelikes.
//!
//! A game draws into named, fixed *permanent* surfaces (the map, the message
//! line, the sidebar, ...) and a LIFO stack of *transient* surfaces (menus,
//! prompts, pop-ups). [`Display`] owns all of them and hands drawing and
//! input through a [`backend::Backend`]: either a character terminal or a set
//! of windows with draggable, dockable subwindows.

pub mod backend;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod event;
pub mod geo;
pub mod gfx;
pub mod menu;
pub mod placement;
pub mod region;
pub mod stack;

pub use catalogue::SurfaceKind;
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use event::Event;
pub use event::Key;
pub use event::Target;
pub use placement::Hints;
pub use placement::Placement;
pub use stack::Display;
pub use stack::Handle;
