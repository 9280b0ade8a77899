mod display;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use tracing_subscriber::EnvFilter;

use display::Overlay;
use star_raider::entities::GameStatus;
use star_raider::input::{DigitalAxes, InputIntent};
use star_raider::player::{FirePattern, ShipClass};
use star_raider::{Effect, SimConfig, World};

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// Frames a key stays "down" after its last press or repeat event.  Terminals
/// without release events rely on auto-repeat to keep refreshing it.
const HOLD_WINDOW: u64 = 4;

#[derive(Parser, Debug)]
#[command(name = "star_raider", about = "Side-scrolling space shooter in the terminal")]
struct Cli {
    /// JSON file with simulation settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Ship class (standard, swift, freighter); skips the menu choice.
    #[arg(long)]
    ship: Option<ShipClass>,

    /// Fan shots around the aim direction instead of parallel streams.
    #[arg(long)]
    aimed: bool,

    /// Where tracing output goes (defaults to ~/.star_raider.log).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Whether `key` is still inside its hold window.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Home-directory files ──────────────────────────────────────────────────────

fn home_file(name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(name)
}

fn load_high_score() -> u64 {
    std::fs::read_to_string(home_file(".star_raider_score"))
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn save_high_score(score: u64) {
    if let Err(err) = std::fs::write(home_file(".star_raider_score"), score.to_string()) {
        tracing::warn!(%err, "could not save high score");
    }
}

/// Tracing goes to a file; the terminal belongs to the game.
fn init_logging(path: Option<PathBuf>) {
    let path = path.unwrap_or_else(|| home_file(".star_raider.log"));
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start(ShipClass),
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    high_score: u64,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  STAR  RAIDER  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(7),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    if high_score > 0 {
        let hs_str = format!("Best Score: {}", high_score);
        out.queue(cursor::MoveTo(
            cx.saturating_sub(hs_str.chars().count() as u16 / 2),
            cy.saturating_sub(6),
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&hs_str))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy.saturating_sub(4)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Select your ship:"))?;

    let options: &[(&str, &str, Color, &str)] = &[
        ("1", "Standard ", Color::Green, "Balanced handling and fuel"),
        ("2", "Swift    ", Color::Yellow, "Faster, same tank"),
        ("3", "Freighter", Color::Red, "Slow burner, 150 fuel"),
    ];

    for (i, (key, label, color, desc)) in options.iter().enumerate() {
        let row = cy.saturating_sub(2) + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(14), row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", key)))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*label))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!(" — {}", desc)))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy + 2))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("Power-ups (fly through drifting planets):"))?;

    let bonus_info: &[(&str, Color, &str)] = &[
        ("(F)", Color::Yellow, " Fuel       — +50 fuel"),
        ("(S)", Color::Cyan, " Shield     — 10s invincibility"),
        ("(W)", Color::Magenta, " Weapon     — one more stream"),
        ("(R)", Color::Red, " RapidFire  — triple fire rate for 10s"),
    ];
    for (i, (sym, color, desc)) in bonus_info.iter().enumerate() {
        let row = cy + 3 + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(14), row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(sym))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(*desc))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy + 8))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("↑↓←→ / WASD : Move   SPACE : Shoot   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Wait for a ship choice
    loop {
        let ev = match rx.recv() {
            Ok(ev) => ev,
            Err(_) => return Ok(MenuResult::Quit),
        };
        if let Event::Key(KeyEvent { code, .. }) = ev {
            match code {
                KeyCode::Char('1') => return Ok(MenuResult::Start(ShipClass::Standard)),
                KeyCode::Char('2') => return Ok(MenuResult::Start(ShipClass::Swift)),
                KeyCode::Char('3') => return Ok(MenuResult::Start(ShipClass::Freighter)),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs one game.  `Ok(true)` means quit, `Ok(false)` means play again.
///
/// Input model: a `key_frame` map records the frame number of the last
/// press/repeat event for every key.  Each frame the keys still "fresh"
/// (within `HOLD_WINDOW` frames) become one `InputIntent`, so Space and the
/// arrows can be held together.
fn game_loop<W: Write>(
    out: &mut W,
    world: &mut World,
    overlay: &mut Overlay,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<bool> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // Input
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(true);
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(true);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if world.status() == GameStatus::GameOver =>
                        {
                            return Ok(false);
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let axes = DigitalAxes {
            up: any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame),
            down: any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame),
            left: any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame),
            right: any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame),
        };
        let firing = is_held(&key_frame, &KeyCode::Char(' '), frame);

        let now = Instant::now();
        let delta_ms = now.duration_since(last_tick).as_secs_f64() * 1000.0;
        last_tick = now;

        world.update(&InputIntent::digital(axes, firing), delta_ms);
        overlay.absorb(world.effects());

        display::render(out, world, overlay)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone());

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.aimed {
        config.fire_pattern = FirePattern::Aimed;
    }

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Release events where the terminal supports them; the hold window covers the rest.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking reads live on their own thread; the frame loop only polls the channel.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, config, cli.ship);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    mut config: SimConfig,
    fixed_ship: Option<ShipClass>,
) -> Result<()> {
    let mut high_score = load_high_score();

    loop {
        let ship = match fixed_ship {
            Some(ship) => ship,
            None => match show_menu(out, rx, high_score)? {
                MenuResult::Quit => break,
                MenuResult::Start(ship) => ship,
            },
        };
        config.ship = ship;
        tracing::info!(ship = ship.name(), seed = ?config.seed, "starting game");

        let mut world = World::new(config.clone()).context("building world")?;
        world.subscribe(|effect: &Effect| {
            if matches!(effect, Effect::GameOver | Effect::BossDefeated) {
                tracing::info!(?effect, "milestone");
            }
        });
        let mut overlay = Overlay::new(high_score);
        let quit = game_loop(out, &mut world, &mut overlay, rx)?;

        // Persist new high score if beaten
        if world.score() > high_score {
            high_score = world.score();
            save_high_score(high_score);
        }

        if quit {
            break;
        }
        // Otherwise loop back to the menu (or straight into a new run)
    }
    Ok(())
}
