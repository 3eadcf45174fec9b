//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use termplex::backend::Backend;
use termplex::backend::CreateRequest;
use termplex::backend::Cursor;
use termplex::backend::Origin;
use termplex::backend::Signal;
use termplex::backend::SurfaceId;
use termplex::backend::SurfaceInfo;
use termplex::event::Key;
use termplex::geo::Point;
use termplex::geo::Rect;
use termplex::gfx::Color;
use termplex::gfx::Texel;
use termplex::placement;
use termplex::placement::Anchors;
use termplex::Error;
use termplex::Result;
use termplex::SurfaceKind;

/// A backend the test keeps a handle to after giving it to a display.
pub struct Shared<B>(pub Rc<RefCell<B>>);

/// Boxes `backend` for a display, returning a handle for inspecting it.
pub fn share<B: Backend + 'static>(backend: B) -> (Box<dyn Backend>, Rc<RefCell<B>>) {
  let rc = Rc::new(RefCell::new(backend));
  (Box::new(Shared(Rc::clone(&rc))), rc)
}

impl<B: Backend> Backend for Shared<B> {
  fn name(&self) -> &'static str {
    self.0.borrow().name()
  }
  fn on_create(&mut self, req: &CreateRequest) -> Result<SurfaceInfo> {
    self.0.borrow_mut().on_create(req)
  }
  fn on_destroy(&mut self, id: SurfaceId) {
    self.0.borrow_mut().on_destroy(id)
  }
  fn draw_points(&mut self, id: SurfaceId, col: i32, row: i32, points: &[Texel]) {
    self.0.borrow_mut().draw_points(id, col, row, points)
  }
  fn move_region(&mut self, id: SurfaceId, dst: Point, src: Point, cols: i32, rows: i32) -> bool {
    self.0.borrow_mut().move_region(id, dst, src, cols, rows)
  }
  fn set_cursor(&mut self, id: SurfaceId, cursor: Cursor) {
    self.0.borrow_mut().set_cursor(id, cursor)
  }
  fn redraw(&mut self, id: SurfaceId, delay: Duration) {
    self.0.borrow_mut().redraw(id, delay)
  }
  fn handle_event(&mut self, wait: Option<Duration>) -> Result<Option<Signal>> {
    self.0.borrow_mut().handle_event(wait)
  }
  fn flush_events(&mut self) {
    self.0.borrow_mut().flush_events()
  }
  fn erase(&mut self, id: SurfaceId) {
    self.0.borrow_mut().erase(id)
  }
  fn add_tab(&mut self, id: SurfaceId, code: Key, label: &str, fg: Color, bg: Color) {
    self.0.borrow_mut().add_tab(id, code, label, fg, bg)
  }
}

/// One call to [`Backend::draw_points()`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Draw {
  pub id: SurfaceId,
  pub col: i32,
  pub row: i32,
  pub text: String,
}

/// A backend that realizes nothing and records everything.
///
/// Permanent surfaces get their default size unless listed in `reject`;
/// transient surfaces are placed in a `screen`-sized area.
pub struct Recorder {
  pub screen: Rect,
  pub reject: Vec<SurfaceKind>,
  pub created: Vec<(SurfaceId, Origin)>,
  pub destroyed: Vec<SurfaceId>,
  pub draws: Vec<Draw>,
  pub redraws: Vec<(SurfaceId, Duration)>,
  pub input: VecDeque<Signal>,
  /// How many times the display waited for input.
  pub waits: usize,
  pub tabs: Vec<(SurfaceId, Key)>,
}

impl Recorder {
  pub fn new() -> Self {
    Self {
      screen: Rect::with_dims(80, 24),
      reject: Vec::new(),
      created: Vec::new(),
      destroyed: Vec::new(),
      draws: Vec::new(),
      redraws: Vec::new(),
      input: VecDeque::new(),
      waits: 0,
      tabs: Vec::new(),
    }
  }

  pub fn rejecting(kinds: &[SurfaceKind]) -> Self {
    Self {
      reject: kinds.to_vec(),
      ..Self::new()
    }
  }

  pub fn id_of(&self, kind: SurfaceKind) -> Option<SurfaceId> {
    self
      .created
      .iter()
      .find(|(_, o)| *o == Origin::Permanent(kind))
      .map(|(id, _)| *id)
  }

  pub fn live(&self) -> Vec<SurfaceId> {
    self
      .created
      .iter()
      .map(|(id, _)| *id)
      .filter(|id| !self.destroyed.contains(id))
      .collect()
  }
}

impl Backend for Recorder {
  fn name(&self) -> &'static str {
    "recorder"
  }

  fn on_create(&mut self, req: &CreateRequest) -> Result<SurfaceInfo> {
    let (cols, rows) = match req.origin {
      Origin::Permanent(kind) => {
        let d = kind.descriptor();
        if self.reject.contains(&kind) {
          return Err(Error::Placement {
            min_cols: d.min.0,
            min_rows: d.min.1,
            avail_cols: 0,
            avail_rows: 0,
          });
        }
        d.default
      }
      Origin::Transient { hints, .. } => {
        let r = placement::place(&hints, &Anchors::bare(self.screen), 0)?;
        (r.width(), r.height())
      }
    };
    self.created.push((req.id, req.origin));
    Ok(SurfaceInfo { cols, rows })
  }

  fn on_destroy(&mut self, id: SurfaceId) {
    self.destroyed.push(id);
  }

  fn draw_points(&mut self, id: SurfaceId, col: i32, row: i32, points: &[Texel]) {
    self.draws.push(Draw {
      id,
      col,
      row,
      text: points.iter().map(|t| t.visible_glyph()).collect(),
    });
  }

  fn move_region(&mut self, _: SurfaceId, _: Point, _: Point, _: i32, _: i32) -> bool {
    false
  }

  fn set_cursor(&mut self, _: SurfaceId, _: Cursor) {}

  fn redraw(&mut self, id: SurfaceId, delay: Duration) {
    self.redraws.push((id, delay));
  }

  fn handle_event(&mut self, wait: Option<Duration>) -> Result<Option<Signal>> {
    if wait.is_some() {
      self.waits += 1;
    }
    Ok(self.input.pop_front())
  }

  fn flush_events(&mut self) {
    self.input.clear();
  }

  fn erase(&mut self, _: SurfaceId) {}

  fn add_tab(&mut self, id: SurfaceId, code: Key, _: &str, _: Color, _: Color) {
    self.tabs.push((id, code));
  }
}

/// A key press as the display would receive it.
pub fn key(k: Key) -> Signal {
  Signal::Input(k.into())
}
