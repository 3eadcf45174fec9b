//! A small demo: a walled room with flickering monsters, a message line,
//! and a menu on `m`. `q` quits.
//!
//! Runs in the terminal if there is one, and otherwise on a headless window
//! device that plays a short script of keys.

#![deny(unused)]

use std::env;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context as _;
use rand::Rng as _;
use tracing_appender::non_blocking::WorkerGuard;

use termplex::backend;
use termplex::backend::accel::Accel;
use termplex::backend::accel::Headless;
use termplex::backend::accel::RawEvent;
use termplex::backend::term;
use termplex::backend::Backend;
use termplex::backend::Candidate;
use termplex::config::DEFAULT_PATH;
use termplex::event::KeyEvent;
use termplex::geo::Point;
use termplex::gfx::texel::colors;
use termplex::gfx::Texel;
use termplex::menu::Menu;
use termplex::menu::Outcome;
use termplex::Config;
use termplex::Display;
use termplex::Error;
use termplex::Event;
use termplex::Key;
use termplex::SurfaceKind;
use termplex::Target;

const HEADLESS: Candidate = Candidate {
  name: "headless",
  init: headless,
};

fn headless(config: &Config) -> termplex::Result<Box<dyn Backend>> {
  let script = [
    Key::Char('m'),
    Key::Down,
    Key::Enter,
    Key::Char('m'),
    Key::Escape,
    Key::Char('q'),
  ]
  .into_iter()
  .map(|k| RawEvent::Key(KeyEvent::new(k)));
  Ok(Box::new(Accel::new(Headless::scripted(script), config)?))
}

fn main() {
  let path = env::args()
    .nth(1)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
  let _guard = init_logging();
  if let Err(e) = run(&path) {
    eprintln!("termplex-demo: {:#}", e);
    std::process::exit(1);
  }
}

/// Logs to `termplex.log`, since the terminal belongs to the display.
fn init_logging() -> Option<WorkerGuard> {
  let file = tracing_appender::rolling::never(".", "termplex.log");
  let (writer, guard) = tracing_appender::non_blocking(file);
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .ok()
    .map(|_| guard)
}

fn run(path: &Path) -> anyhow::Result<()> {
  let config = Config::load(path)
    .with_context(|| format!("reading config from {}", path.display()))?;
  let backend = backend::select(&config, &[term::CANDIDATE, HEADLESS])?;
  let mut display = Display::init(backend, &config).context("starting the display")?;
  let backend_name = display.backend_name();
  tracing::info!(backend = backend_name, "display up");

  // The display must always be torn down, even if the game loop fails.
  let result = play(&mut display, &config);
  display.teardown();
  result
}

fn play(display: &mut Display, config: &Config) -> anyhow::Result<()> {
  let monsters = vec![Point::new(3, 2), Point::new(12, 5), Point::new(7, 8)];
  let mut player = Point::new(5, 5);

  let delay = config.redraw_delay();
  let flicker = monsters.clone();
  let mut rng = rand::thread_rng();
  display.set_idle_hook(move |display| {
    if display.depth() > 0 {
      return;
    }
    let i = rng.gen_range(0..flicker.len());
    let color = [colors::RED, colors::ORANGE, colors::YELLOW][rng.gen_range(0..3)];
    let p = flicker[i];
    let map = Target::Permanent(SurfaceKind::Map);
    if !matches!(display.size(map), Some((cols, rows)) if p.x() < cols && p.y() < rows) {
      return;
    }
    display.select(map);
    display.draw(p.y(), p.x(), &[Texel::new('k').with_fg(color)]);
    display.redraw(delay);
    display.deselect();
  });

  let mut message = String::from("Arrow keys move; m opens a menu; q quits.");
  loop {
    draw_map(display, &monsters, player);
    draw_message(display, &message);

    let event = match display.read_event(true)? {
      Some(event) => event,
      None => continue,
    };
    let key = match event {
      Event::Key(k) => k.code,
      Event::Pointer(_) => continue,
    };
    match key {
      Key::Char('q') => return Ok(()),
      Key::Char('m') => {
        let mut menu = Menu::new(["Rest", "Search", "Quaff (nothing to drink)", "Look"])
          .with_title("Actions")
          .with_validity(|i| i != 2);
        message = match menu.run(display) {
          Ok(Outcome::Selected(i)) => format!("You chose option {}.", i + 1),
          Ok(_) => "Never mind.".to_string(),
          Err(e @ (Error::Placement { .. } | Error::StackFull { .. })) => {
            format!("No room for a menu: {}", e)
          }
          Err(e) => return Err(e.into()),
        };
      }
      Key::Up | Key::Down | Key::Left | Key::Right => {
        let step = match key {
          Key::Up => Point::new(0, -1),
          Key::Down => Point::new(0, 1),
          Key::Left => Point::new(-1, 0),
          _ => Point::new(1, 0),
        };
        let next = player + step;
        if next.x() > 0 && next.y() > 0 && next.x() < 19 && next.y() < 11 {
          player = next;
        }
      }
      _ => {}
    }
  }
}

fn draw_map(display: &mut Display, monsters: &[Point], player: Point) {
  let map = Target::Permanent(SurfaceKind::Map);
  let (cols, rows) = match display.size(map) {
    Some(size) => size,
    None => return,
  };
  display.select(map);
  for y in 0..rows.min(12) {
    let row: Vec<Texel> = (0..cols.min(20))
      .map(|x| {
        let wall = x == 0 || y == 0 || x == 19 || y == 11;
        let p = Point::new(x, y);
        if p == player {
          Texel::new('@').with_fg(colors::WHITE)
        } else if monsters.contains(&p) {
          Texel::new('k').with_fg(colors::RED)
        } else if wall {
          Texel::new('#').with_fg(colors::GRAY)
        } else {
          Texel::new('.').with_fg(colors::DIMGRAY)
        }
      })
      .collect();
    display.draw(y, 0, &row);
  }
  display.set_cursor(true, player.x(), player.y());
  display.flush();
  display.deselect();
}

fn draw_message(display: &mut Display, message: &str) {
  let line = Target::Permanent(SurfaceKind::Message);
  if display.size(line).is_none() {
    return;
  }
  display.select(line);
  display.erase_all();
  display.print(0, 0, message, colors::WHITE.into());
  display.flush();
  display.deselect();
}
