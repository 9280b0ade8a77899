//! Rendering layer: all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! world.  No game logic is performed; this module only translates state
//! (in world pixels) into terminal cells.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use star_raider::boss::Boss;
use star_raider::effects::Effect;
use star_raider::entities::{
    Enemy, EnemyKind, GameStatus, Meteor, MeteorSize, Pickup, PickupKind, Projectile,
    ProjectileKind,
};
use star_raider::World;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_FUEL: Color = Color::DarkYellow;
const C_HUD_FUEL_LOW: Color = Color::Red;
const C_PLAYER: Color = Color::White;
const C_SHIELD: Color = Color::Cyan;
const C_STAR: Color = Color::DarkGrey;
const C_METEOR: Color = Color::Grey;
const C_BOSS: Color = Color::DarkRed;
const C_CANNON: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

/// Frames an explosion marker stays on screen.
const EXPLOSION_FRAMES: u32 = 6;

/// A brief explosion marker, fed from the world's `Explosion` effects.
#[derive(Clone, Debug)]
pub struct Explosion {
    pub x: f64,
    pub y: f64,
    pub big: bool,
    pub tint: Color,
    /// Remaining frames to display.
    pub frames: u32,
}

/// Presentation-only state that outlives a single frame.
#[derive(Debug, Default)]
pub struct Overlay {
    pub explosions: Vec<Explosion>,
    pub high_score: u64,
}

impl Overlay {
    pub fn new(high_score: u64) -> Self {
        Self {
            explosions: Vec::new(),
            high_score,
        }
    }

    /// Age existing markers and pick up the latest tick's explosions.
    pub fn absorb(&mut self, effects: &[Effect]) {
        for e in &mut self.explosions {
            e.frames = e.frames.saturating_sub(1);
        }
        self.explosions.retain(|e| e.frames > 0);

        for effect in effects {
            match *effect {
                Effect::Explosion { x, y, intensity, color } if intensity >= 5 => {
                    let (r, g, b) = color.rgb();
                    self.explosions.push(Explosion {
                        x,
                        y,
                        big: intensity >= 30,
                        tint: Color::Rgb { r, g, b },
                        frames: EXPLOSION_FRAMES,
                    });
                }
                Effect::Celebration { x, y } => {
                    self.explosions.push(Explosion {
                        x,
                        y,
                        big: true,
                        tint: Color::Yellow,
                        frames: EXPLOSION_FRAMES * 4,
                    });
                }
                _ => {}
            }
        }
    }
}

/// Maps world pixels onto the play area between the border rows/columns.
struct Viewport {
    cols: u16,
    rows: u16,
    sx: f64,
    sy: f64,
}

impl Viewport {
    fn new(world: &World, cols: u16, rows: u16) -> Self {
        let inner_w = cols.saturating_sub(2).max(1);
        let inner_h = rows.saturating_sub(4).max(1);
        let cfg = world.config();
        Self {
            cols,
            rows,
            sx: f64::from(inner_w) / cfg.width,
            sy: f64::from(inner_h) / cfg.height,
        }
    }

    /// Cell for a world point, or `None` when it falls outside the play area.
    fn cell(&self, x: f64, y: f64) -> Option<(u16, u16)> {
        let col = (x * self.sx).floor() + 1.0;
        let row = (y * self.sy).floor() + 2.0;
        let in_cols = col >= 1.0 && col <= f64::from(self.cols.saturating_sub(2));
        let in_rows = row >= 2.0 && row <= f64::from(self.rows.saturating_sub(3));
        (in_cols && in_rows).then_some((col as u16, row as u16))
    }

    fn put<W: Write>(&self, out: &mut W, x: f64, y: f64, color: Color, text: &str) -> std::io::Result<()> {
        if let Some((col, row)) = self.cell(x, y) {
            // Clip to the right wall.
            let room = usize::from(self.cols.saturating_sub(1).saturating_sub(col));
            let clipped: String = text.chars().take(room).collect();
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(style::SetForegroundColor(color))?;
            out.queue(Print(clipped))?;
        }
        Ok(())
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, world: &World, overlay: &Overlay) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let view = Viewport::new(world, cols, rows);

    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, &view)?;
    draw_hud(out, world, overlay, &view)?;

    for star in &world.stars {
        view.put(out, star.pos.x, star.pos.y, C_STAR, ".")?;
    }
    for pickup in &world.pickups {
        draw_pickup(out, pickup, &view)?;
    }
    for meteor in &world.meteors {
        draw_meteor(out, meteor, &view)?;
    }
    for enemy in &world.enemies {
        draw_enemy(out, enemy, &view)?;
    }
    if let Some(boss) = &world.boss {
        draw_boss(out, boss, &view)?;
    }
    for projectile in &world.projectiles {
        draw_projectile(out, projectile, &view)?;
    }
    for explosion in &overlay.explosions {
        let glyph = if explosion.big { "✺" } else { "*" };
        view.put(out, explosion.x, explosion.y, explosion.tint, glyph)?;
    }

    if world.status() == GameStatus::Playing {
        draw_player(out, world, &view)?;
    }
    draw_controls_hint(out, &view)?;

    if world.status() == GameStatus::GameOver {
        draw_game_over(out, world, overlay, &view)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    world: &World,
    overlay: &Overlay,
    view: &Viewport,
) -> std::io::Result<()> {
    let hud = world.hud();

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    let best = overlay.high_score.max(hud.score);
    out.queue(Print(format!("Score:{:>7}  Hi:{:>7}  W{}", hud.score, best, hud.weapon_level)))?;

    // Fuel gauge, or the boss bar while a boss is up
    let centre = match hud.boss_health_percent {
        Some(pct) => (format!("BOSS [{}]", gauge(pct, 12)), Color::Red),
        None => {
            let color = if hud.fuel_percent < 20.0 { C_HUD_FUEL_LOW } else { C_HUD_FUEL };
            (format!("FUEL [{}]", gauge(hud.fuel_percent, 12)), color)
        }
    };
    let cx = (view.cols / 2).saturating_sub(centre.0.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(cx, 0))?;
    out.queue(style::SetForegroundColor(centre.1))?;
    out.queue(Print(&centre.0))?;

    let mut tags = String::new();
    if world.player.shield_active {
        tags.push_str(&format!("[SHIELD {:>2}s] ", (world.player.shield_timer / 1000.0).ceil()));
    }
    if world.player.rapid_fire_active {
        tags.push_str(&format!("[RAPID {:>2}s] ", (world.player.rapid_fire_timer / 1000.0).ceil()));
    }
    let hearts = "♥".repeat(hud.lives as usize);
    let lives_str = format!("Lives:{}", if hearts.is_empty() { "✕".to_string() } else { hearts });
    let right = format!("{tags}{lives_str}");

    let rx = view.cols.saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    if !tags.is_empty() {
        out.queue(style::SetForegroundColor(C_SHIELD))?;
        out.queue(Print(&tags))?;
    }
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&lives_str))?;

    Ok(())
}

fn gauge(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_player<W: Write>(out: &mut W, world: &World, view: &Viewport) -> std::io::Result<()> {
    let p = &world.player;
    if !p.visible() {
        return Ok(());
    }
    let color = if p.shield_active { C_SHIELD } else { C_PLAYER };
    let c = p.center();
    let sprite = if p.shield_active { "(≡►)" } else { "≡►" };
    view.put(out, p.pos.x, c.y, color, sprite)
}

fn draw_enemy<W: Write>(out: &mut W, enemy: &Enemy, view: &Viewport) -> std::io::Result<()> {
    let c = enemy.bounds().center();
    let (sprite, color) = match enemy.kind {
        EnemyKind::Drone => ("|o|", Color::Green),
        EnemyKind::Interceptor => ("<x>", Color::DarkYellow),
        EnemyKind::Tank => ("[#]", Color::Red),
    };
    view.put(out, enemy.pos.x, c.y, color, sprite)
}

fn draw_meteor<W: Write>(out: &mut W, meteor: &Meteor, view: &Viewport) -> std::io::Result<()> {
    let sprite = match meteor.size {
        MeteorSize::Large => "(@@)",
        MeteorSize::Medium => "(@)",
        MeteorSize::Small => "@",
    };
    view.put(out, meteor.pos.x - meteor.radius, meteor.pos.y, C_METEOR, sprite)
}

fn draw_boss<W: Write>(out: &mut W, boss: &Boss, view: &Viewport) -> std::io::Result<()> {
    let top = boss.pos.y;
    let rows = ((boss.height * view.sy).round() as usize).max(1);
    let cols = ((boss.width * view.sx).round() as usize).max(3);
    for r in 0..rows {
        let y = top + r as f64 / view.sy;
        view.put(out, boss.pos.x, y, C_BOSS, &"▓".repeat(cols))?;
    }
    for cannon in &boss.cannons {
        let b = cannon.bounds(boss.pos);
        let glyph = if cannon.active { "◄■" } else { "x" };
        view.put(out, b.x, b.y, C_CANNON, glyph)?;
    }
    Ok(())
}

fn draw_projectile<W: Write>(out: &mut W, p: &Projectile, view: &Viewport) -> std::io::Result<()> {
    let (glyph, color) = match p.kind {
        ProjectileKind::Player => ("-", Color::Green),
        ProjectileKind::Power => ("=", Color::Cyan),
        ProjectileKind::Enemy => ("~", Color::Magenta),
    };
    view.put(out, p.pos.x, p.pos.y, color, glyph)
}

/// Pickup symbols: F fuel, S shield, W weapon, R rapid fire, blank when spent.
fn draw_pickup<W: Write>(out: &mut W, pickup: &Pickup, view: &Viewport) -> std::io::Result<()> {
    let (glyph, color) = match pickup.kind {
        PickupKind::Fuel => ("(F)", Color::Yellow),
        PickupKind::Shield => ("(S)", Color::Cyan),
        PickupKind::Weapon => ("(W)", Color::Magenta),
        PickupKind::RapidFire => ("(R)", Color::Red),
        PickupKind::None => ("( )", Color::DarkGrey),
    };
    view.put(out, pickup.pos.x, pickup.pos.y, color, glyph)
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("↑↓←→ / WASD : Move   SPACE : Shoot   Q : Quit"))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    world: &World,
    overlay: &Overlay,
    view: &Viewport,
) -> std::io::Result<()> {
    let score = world.score();
    let new_best = score > overlay.high_score;
    let score_line = format!("Final Score: {:>7}", score);
    let best_line = if new_best {
        format!("★ NEW BEST: {:>7} ★", score)
    } else {
        format!("Best Score:  {:>7}", overlay.high_score)
    };

    let boxed = [
        "╔════════════════════╗",
        "║    GAME  OVER      ║",
        "╚════════════════════╝",
    ];
    let hint = "R - Play Again  Q - Quit";

    let lines: Vec<(&str, Color)> = boxed
        .iter()
        .map(|l| (*l, Color::Red))
        .chain([
            (score_line.as_str(), Color::Yellow),
            (best_line.as_str(), if new_best { Color::Yellow } else { Color::DarkGrey }),
            (hint, Color::White),
        ])
        .collect();

    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}
