use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;

use termplex::backend::Signal;
use termplex::event::Mods;
use termplex::event::PointerEvent;
use termplex::gfx::Color;
use termplex::gfx::Texel;
use termplex::menu::Menu;
use termplex::menu::Outcome;
use termplex::Config;
use termplex::Display;
use termplex::Error;
use termplex::Event;
use termplex::Hints;
use termplex::Key;
use termplex::SurfaceKind;
use termplex::Target;

mod common;
use common::Draw;
use common::Recorder;

const MAP: Target = Target::Permanent(SurfaceKind::Map);

fn texels(s: &str) -> Vec<Texel> {
  s.chars().map(Texel::new).collect()
}

#[test]
fn optional_surfaces_that_dont_fit_are_skipped() {
  let (backend, rec) = common::share(Recorder::rejecting(&[SurfaceKind::Sidebar]));
  let mut display = Display::init(backend, &Config::default()).unwrap();
  assert!(!display.is_active(SurfaceKind::Sidebar));
  assert!(display.is_active(SurfaceKind::MessageLog));
  assert_eq!(display.size(Target::Permanent(SurfaceKind::Sidebar)), None);

  // Drawing to it is harmless.
  display.select(Target::Permanent(SurfaceKind::Sidebar));
  display.print(0, 0, "ignored", Color::Reset);
  display.flush();
  display.deselect();
  assert!(rec.borrow().draws.is_empty());

  display.teardown();
  assert!(rec.borrow().live().is_empty());
}

#[test]
fn a_required_surface_that_doesnt_fit_is_fatal() {
  let (backend, rec) = common::share(Recorder::rejecting(&[SurfaceKind::Map]));
  let err = Display::init(backend, &Config::default()).unwrap_err();
  assert!(matches!(
    err,
    Error::ScreenTooSmall {
      kind: SurfaceKind::Map,
      min_cols: 40,
      min_rows: 12
    }
  ));
  assert!(err.is_fatal());
  assert!(rec.borrow().live().is_empty());
}

#[test]
fn teardown_destroys_in_reverse_order() {
  let (backend, rec) = common::share(Recorder::new());
  let display = Display::init(backend, &Config::default()).unwrap();
  display.teardown();
  let rec = rec.borrow();
  let mut created: Vec<_> = rec.created.iter().map(|(id, _)| *id).collect();
  created.reverse();
  assert_eq!(rec.destroyed, created);
}

#[test]
fn flush_sends_only_what_changed() {
  let (backend, rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  let map = rec.borrow().id_of(SurfaceKind::Map).unwrap();

  display.draw(0, 0, &texels("hello"));
  display.flush();
  assert_eq!(
    rec.borrow().draws,
    vec![Draw {
      id: map,
      col: 0,
      row: 0,
      text: "hello".to_string()
    }]
  );

  // Nothing changed: nothing sent.
  rec.borrow_mut().draws.clear();
  display.flush();
  assert!(rec.borrow().draws.is_empty());

  // Nearby changes merge; distant ones don't.
  display.draw(0, 1, &texels("x"));
  display.draw(0, 3, &texels("y"));
  display.draw(0, 20, &texels("z"));
  display.flush();
  let runs: Vec<_> = rec
    .borrow()
    .draws
    .iter()
    .map(|d| (d.col, d.text.clone()))
    .collect();
  assert_eq!(runs, vec![(1, "xly".to_string()), (20, "z".to_string())]);
  display.teardown();
}

#[test]
fn resizes_keep_content_and_resend_everything() {
  let (backend, rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  let map = rec.borrow().id_of(SurfaceKind::Map).unwrap();

  display.draw(0, 0, &texels("hello"));
  display.flush();
  rec.borrow_mut().draws.clear();

  rec.borrow_mut().input.push_back(Signal::Resize {
    id: map,
    cols: 100,
    rows: 30,
  });
  assert_eq!(display.read_event(false).unwrap(), None);
  assert_eq!(display.size(MAP), Some((100, 30)));
  let line: String = display.contents(MAP).unwrap().row(0)[..5]
    .iter()
    .map(|t| t.visible_glyph())
    .collect();
  assert_eq!(line, "hello");

  display.flush();
  assert_eq!(rec.borrow().draws.len(), 30);

  // Shrinking never goes below the minimum.
  rec.borrow_mut().input.push_back(Signal::Resize {
    id: map,
    cols: 10,
    rows: 5,
  });
  display.read_event(false).unwrap();
  assert_eq!(display.size(MAP), Some((40, 12)));
  display.teardown();
}

#[test]
fn the_idle_hook_runs_while_waiting() {
  let (backend, rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();

  // Non-blocking reads never idle.
  assert_eq!(display.read_event(false).unwrap(), None);

  let calls = Rc::new(Cell::new(0));
  let hook_calls = Rc::clone(&calls);
  let hook_rec = Rc::clone(&rec);
  display.set_idle_hook(move |display| {
    hook_calls.set(hook_calls.get() + 1);
    assert_eq!(display.depth(), 0);
    if hook_calls.get() == 3 {
      hook_rec.borrow_mut().input.push_back(common::key(Key::Char('a')));
    }
  });

  let event = display.read_event(true).unwrap();
  assert_eq!(event, Some(Event::from(Key::Char('a'))));
  assert_eq!(calls.get(), 3);
  assert_eq!(rec.borrow().waits, 3);

  display.clear_idle_hook();
  display.teardown();
}

#[test]
fn pointer_events_for_closed_surfaces_are_dropped() {
  let (backend, rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();

  let handle = display.push(Hints::new(10, 5)).unwrap();
  display.pop(handle);

  let stale = Event::Pointer(PointerEvent {
    x: 1,
    y: 1,
    button: 1,
    mods: Mods::empty(),
    target: Target::Transient(0),
  });
  rec.borrow_mut().input.push_back(Signal::Input(stale));
  rec.borrow_mut().input.push_back(common::key(Key::Enter));
  assert_eq!(
    display.read_event(false).unwrap(),
    Some(Event::from(Key::Enter))
  );
  display.teardown();
}

#[test]
fn drawing_follows_the_top_of_the_stack() {
  let (backend, rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  assert_eq!(display.top(), MAP);

  let handle = display.push(Hints::new(10, 3)).unwrap();
  assert_eq!(display.top(), Target::Transient(0));
  assert_eq!(display.draw_target(), Target::Transient(0));
  display.print(1, 2, "menu", Color::Reset);

  // Selecting another surface redirects drawing, not input.
  display.select(MAP);
  display.print(0, 0, "map", Color::Reset);
  assert_eq!(display.top(), Target::Transient(0));
  display.deselect();

  display.flush_all();
  let texts: Vec<_> = rec.borrow().draws.iter().map(|d| d.text.clone()).collect();
  assert_eq!(texts, vec!["map".to_string(), "menu".to_string()]);

  display.add_tab(Key::Char('i'), "Inv", Color::Reset, Color::Reset);
  let transient = rec.borrow().created.last().unwrap().0;
  assert_eq!(rec.borrow().tabs, vec![(transient, Key::Char('i'))]);

  display.pop(handle);
  assert_eq!(display.draw_target(), MAP);
  display.teardown();
}

#[test]
#[should_panic(expected = "is on top")]
fn popping_out_of_order_panics() {
  let (backend, _rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  let first = display.push(Hints::new(10, 3)).unwrap();
  let _second = display.push(Hints::new(10, 3)).unwrap();
  display.pop(first);
}

#[test]
fn printing_truncates_at_the_edge() {
  let (backend, _rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  let handle = display.push(Hints::new(4, 1)).unwrap();
  let top = display.top();

  display.print(0, 2, "abc", Color::Reset);
  display.print(0, 4, "past the edge", Color::Reset);
  display.print(0, 9, "far past it", Color::Reset);
  let row = display.contents(top).unwrap().row(0);
  let line: String = row.iter().map(|t| t.visible_glyph()).collect();
  assert_eq!(line, "  ab");

  display.pop(handle);
  display.teardown();
}

#[test]
#[should_panic(expected = "overflows")]
fn overlong_runs_panic() {
  let (backend, _rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  let handle = display.push(Hints::new(4, 1)).unwrap();
  display.draw(0, 2, &texels("abc"));
  display.pop(handle);
}

#[test]
fn menus_open_and_close_their_own_surface() {
  let (backend, rec) = common::share(Recorder::new());
  let mut display = Display::init(backend, &Config::default()).unwrap();
  rec.borrow_mut().input.extend([
    common::key(Key::Down),
    common::key(Key::Down),
    common::key(Key::Enter),
  ]);

  let mut menu = Menu::new(["one", "two", "three"]).with_validity(|i| i != 1);
  assert_eq!(menu.run(&mut display).unwrap(), Outcome::Selected(0));
  assert_eq!(display.depth(), 0);
  let live = rec.borrow().live().len();
  assert_eq!(live, SurfaceKind::COUNT);
  display.teardown();
}

#[test]
fn menus_that_dont_fit_leave_the_stack_alone() {
  let mut recorder = Recorder::new();
  recorder.screen = termplex::geo::Rect::with_dims(6, 2);
  let (backend, _rec) = common::share(recorder);
  let mut display = Display::init(backend, &Config::default()).unwrap();

  let mut menu = Menu::new(["a long row", "another long row", "more"]).with_title("Title");
  assert!(matches!(menu.run(&mut display), Err(Error::Placement { .. })));
  assert_eq!(display.depth(), 0);
  display.teardown();
}

#[derive(Copy, Clone, Debug)]
enum Op {
  Push(i32, i32),
  Pop,
  Draw,
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    (1..30i32, 1..10i32).prop_map(|(c, r)| Op::Push(c, r)),
    Just(Op::Pop),
    Just(Op::Draw),
  ]
}

proptest! {
  #[test]
  fn the_stack_is_lifo(ops in prop::collection::vec(op(), 0..60)) {
    let config = Config { max_transients: 4, ..Config::default() };
    let (backend, rec) = common::share(Recorder::new());
    let mut display = Display::init(backend, &config).unwrap();
    let mut handles = Vec::new();

    for op in ops {
      match op {
        Op::Push(c, r) => match display.push(Hints::new(c, r)) {
          Ok(h) => handles.push(h),
          Err(Error::StackFull { depth }) => prop_assert_eq!(depth, 4),
          Err(e) => panic!("unexpected error: {}", e),
        },
        Op::Pop => {
          if let Some(h) = handles.pop() {
            display.pop(h);
          }
        }
        Op::Draw => {
          display.print(0, 0, "x", Color::Reset);
          display.flush();
        }
      }

      prop_assert_eq!(display.depth(), handles.len());
      prop_assert_eq!(
        display.top(),
        handles.last().map(|h| h.target()).unwrap_or(MAP)
      );
      prop_assert_eq!(rec.borrow().live().len(), SurfaceKind::COUNT + handles.len());
    }

    while let Some(h) = handles.pop() {
      display.pop(h);
    }
    display.teardown();
    prop_assert!(rec.borrow().live().is_empty());
  }
}
