//! The player craft: movement, fuel, power-up timers, lives and weapons.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::effects::{Effect, MusicMode};
use crate::entities::{Projectile, ProjectileKind};
use crate::error::ConfigError;
use crate::input::{InputIntent, MoveMode};
use crate::utils::{clamp, frames, lerp, Rect, Vec2};

pub const PLAYER_WIDTH: f64 = 50.0;
pub const PLAYER_HEIGHT: f64 = 30.0;
pub const PLAYER_START_X: f64 = 100.0;
pub const MAX_WEAPON_LEVEL: u8 = 5;
pub const RESPAWN_DURATION_MS: f64 = 3000.0;
pub const SHOOT_INTERVAL_MS: f64 = 200.0;

const FUEL_BURN_PER_MS: f64 = 0.002;
const LOW_FUEL_LEVEL: f64 = 25.0;
const LOW_FUEL_REPEAT_MS: f64 = 1000.0;
const FRICTION: f64 = 0.9;
const POINTER_SMOOTHING: f64 = 0.1;
const ANALOG_GAIN: f64 = 2.0;
const SHOT_SPEED: f64 = 15.0;
const SHOT_SPACING: f64 = 5.0;
/// Radians between neighbouring streams in the aimed pattern.
const AIM_SPREAD: f64 = 0.1;
const BLINK_PERIOD_MS: f64 = 100.0;

// ── Ship selection ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipClass {
    /// Balanced all-rounder.
    #[default]
    Standard,
    /// Faster handling.
    Swift,
    /// Bigger fuel tank.
    Freighter,
}

impl ShipClass {
    pub fn speed(self) -> f64 {
        match self {
            ShipClass::Swift => 7.0,
            ShipClass::Standard | ShipClass::Freighter => 5.0,
        }
    }

    pub fn max_fuel(self) -> f64 {
        match self {
            ShipClass::Freighter => 150.0,
            ShipClass::Standard | ShipClass::Swift => 100.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShipClass::Standard => "standard",
            ShipClass::Swift => "swift",
            ShipClass::Freighter => "freighter",
        }
    }
}

impl FromStr for ShipClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(ShipClass::Standard),
            "swift" => Ok(ShipClass::Swift),
            "freighter" => Ok(ShipClass::Freighter),
            _ => Err(ConfigError::UnknownShip { name: s.to_string() }),
        }
    }
}

/// How a volley is laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirePattern {
    /// Parallel horizontal streams; aim input is ignored.
    #[default]
    Forward,
    /// Streams fan out by angle around the aim stick direction.
    Aimed,
}

impl FromStr for FirePattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(FirePattern::Forward),
            "aimed" => Ok(FirePattern::Aimed),
            _ => Err(ConfigError::UnknownFirePattern { name: s.to_string() }),
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PlayerState {
    Normal,
    Shielded,
    Respawning,
    Dead,
}

/// Result of a frame of player upkeep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerStatus {
    Alive,
    OutOfFuel,
}

/// What a damaging collision did to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOutcome {
    /// Shield or respawn invincibility soaked it up.
    Absorbed,
    /// A life was lost and the ship respawned.
    Respawned,
    /// The last life was lost.
    Destroyed,
}

#[derive(Clone, Debug)]
pub struct Player {
    /// Top-left corner.
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f64,
    pub height: f64,
    pub ship: ShipClass,
    pub speed: f64,
    pub lives: u32,
    pub fuel: f64,
    pub max_fuel: f64,
    pub weapon_level: u8,
    pub shield_active: bool,
    pub shield_timer: f64,
    pub rapid_fire_active: bool,
    pub rapid_fire_timer: f64,
    pub is_respawning: bool,
    pub respawn_timer: f64,
    pub blink_timer: f64,
    pub shoot_interval: f64,
    pub last_shot: Option<f64>,
    last_low_fuel: Option<f64>,
}

impl Player {
    pub fn new(ship: ShipClass, lives: u32, field_height: f64) -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, field_height / 2.0),
            vel: Vec2::default(),
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            ship,
            speed: ship.speed(),
            lives,
            fuel: ship.max_fuel(),
            max_fuel: ship.max_fuel(),
            weapon_level: 1,
            shield_active: false,
            shield_timer: 0.0,
            rapid_fire_active: false,
            rapid_fire_timer: 0.0,
            is_respawning: false,
            respawn_timer: 0.0,
            blink_timer: 0.0,
            shoot_interval: SHOOT_INTERVAL_MS,
            last_shot: None,
            last_low_fuel: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        if self.lives == 0 {
            PlayerState::Dead
        } else if self.is_respawning {
            PlayerState::Respawning
        } else if self.shield_active {
            PlayerState::Shielded
        } else {
            PlayerState::Normal
        }
    }

    pub fn invulnerable(&self) -> bool {
        self.shield_active || self.is_respawning
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    pub fn fuel_percent(&self) -> f64 {
        clamp(self.fuel / self.max_fuel * 100.0, 0.0, 100.0)
    }

    /// Blinks while respawning; purely cosmetic.
    pub fn visible(&self) -> bool {
        !(self.is_respawning && (self.blink_timer / BLINK_PERIOD_MS).floor() as i64 % 2 == 0)
    }

    // ── Per-frame upkeep ─────────────────────────────────────────────────────

    /// Burn fuel, run down timers and move.  `delta_ms` must already be
    /// sanitised.  Returns `OutOfFuel` the moment the tank runs dry, before
    /// anything else is touched.
    pub fn update(
        &mut self,
        input: &InputIntent,
        delta_ms: f64,
        now_ms: f64,
        field_width: f64,
        field_height: f64,
        effects: &mut Vec<Effect>,
    ) -> PlayerStatus {
        self.fuel -= delta_ms * FUEL_BURN_PER_MS;
        if self.fuel <= 0.0 {
            self.fuel = 0.0;
            return PlayerStatus::OutOfFuel;
        }

        if self.fuel < LOW_FUEL_LEVEL
            && self
                .last_low_fuel
                .map_or(true, |t| now_ms - t > LOW_FUEL_REPEAT_MS)
        {
            effects.push(Effect::LowFuel);
            self.last_low_fuel = Some(now_ms);
        }

        if self.shield_active {
            self.shield_timer = (self.shield_timer - delta_ms).max(0.0);
            if self.shield_timer <= 0.0 {
                self.shield_active = false;
                effects.push(Effect::Music(MusicMode::Normal));
            }
        }

        if self.rapid_fire_active {
            self.rapid_fire_timer = (self.rapid_fire_timer - delta_ms).max(0.0);
            if self.rapid_fire_timer <= 0.0 {
                self.rapid_fire_active = false;
            }
        }

        if self.is_respawning {
            self.respawn_timer = (self.respawn_timer - delta_ms).max(0.0);
            self.blink_timer += delta_ms;
            if self.respawn_timer <= 0.0 {
                self.is_respawning = false;
                self.blink_timer = 0.0;
            }
        }

        self.steer(input, delta_ms, field_width, field_height);
        PlayerStatus::Alive
    }

    fn steer(&mut self, input: &InputIntent, delta_ms: f64, field_width: f64, field_height: f64) {
        let f = frames(delta_ms);
        let max_x = (field_width - self.width).max(0.0);
        let max_y = (field_height - self.height).max(0.0);

        if let Some(stick) = input.active_stick() {
            self.vel = Vec2::new(axis(stick.x), axis(stick.y));
        } else {
            match input.move_mode {
                MoveMode::Pointer => {
                    if let Some(target) = input.pointer_target.filter(|t| t.is_finite()) {
                        let t = 1.0 - (1.0 - POINTER_SMOOTHING).powf(f);
                        self.pos.x = lerp(self.pos.x, clamp(target.x, 0.0, max_x), t);
                        self.pos.y = lerp(self.pos.y, clamp(target.y, 0.0, max_y), t);
                    }
                    self.vel = Vec2::default();
                    return;
                }
                MoveMode::Digital | MoveMode::Analog => {
                    let axes = input.digital;
                    if axes.up {
                        self.vel.y -= f;
                    }
                    if axes.down {
                        self.vel.y += f;
                    }
                    if axes.left {
                        self.vel.x -= f;
                    }
                    if axes.right {
                        self.vel.x += f;
                    }
                    let damping = FRICTION.powf(f);
                    self.vel.x *= damping;
                    self.vel.y *= damping;
                }
            }
        }

        self.pos.x += self.vel.x * self.speed * f;
        self.pos.y += self.vel.y * self.speed * f;

        // Walls stop the ship dead rather than bouncing it.
        if !(0.0..=max_x).contains(&self.pos.x) {
            self.pos.x = clamp(self.pos.x, 0.0, max_x);
            self.vel.x = 0.0;
        }
        if !(0.0..=max_y).contains(&self.pos.y) {
            self.pos.y = clamp(self.pos.y, 0.0, max_y);
            self.vel.y = 0.0;
        }
    }

    // ── Weapons ──────────────────────────────────────────────────────────────

    pub fn effective_interval(&self) -> f64 {
        if self.rapid_fire_active {
            self.shoot_interval / 3.0
        } else {
            self.shoot_interval
        }
    }

    pub fn can_fire(&self, now_ms: f64) -> bool {
        self.last_shot
            .map_or(true, |last| now_ms - last > self.effective_interval())
    }

    /// Fire if the weapon has cooled down.
    pub fn try_fire(
        &mut self,
        now_ms: f64,
        pattern: FirePattern,
        aim: Option<Vec2>,
    ) -> Option<Vec<Projectile>> {
        if !self.can_fire(now_ms) {
            return None;
        }
        self.last_shot = Some(now_ms);
        Some(self.volley(pattern, aim))
    }

    /// Forward volley for the current weapon level.
    pub fn shoot(&self) -> Vec<Projectile> {
        self.volley(FirePattern::Forward, None)
    }

    pub fn volley(&self, pattern: FirePattern, aim: Option<Vec2>) -> Vec<Projectile> {
        let origin = self.center();
        let heading = match (pattern, aim) {
            (FirePattern::Aimed, Some(a)) if a.length() > 0.0 => a.y.atan2(a.x),
            _ => 0.0,
        };

        volley_layout(self.weapon_level)
            .iter()
            .map(|&(offset, kind, boost)| {
                let speed = SHOT_SPEED * boost;
                match pattern {
                    FirePattern::Forward => Projectile::new(
                        origin.x,
                        origin.y + offset * SHOT_SPACING,
                        speed,
                        0.0,
                        kind,
                    ),
                    FirePattern::Aimed => {
                        let angle = heading + offset * AIM_SPREAD;
                        Projectile::new(
                            origin.x,
                            origin.y,
                            angle.cos() * speed,
                            angle.sin() * speed,
                            kind,
                        )
                    }
                }
            })
            .collect()
    }

    // ── Resources & power-ups ────────────────────────────────────────────────

    pub fn refuel(&mut self, amount: f64) {
        self.fuel = (self.fuel + amount.max(0.0)).min(self.max_fuel);
    }

    pub fn activate_shield(&mut self, duration_ms: f64) {
        self.shield_active = true;
        self.shield_timer = duration_ms.max(0.0);
    }

    pub fn activate_rapid_fire(&mut self, duration_ms: f64) {
        self.rapid_fire_active = true;
        self.rapid_fire_timer = duration_ms.max(0.0);
    }

    /// Raise the weapon one level up to `cap`.  Returns whether it changed.
    pub fn upgrade_weapon(&mut self, cap: u8) -> bool {
        if self.weapon_level < cap.min(MAX_WEAPON_LEVEL) {
            self.weapon_level += 1;
            true
        } else {
            false
        }
    }

    // ── Damage ───────────────────────────────────────────────────────────────

    /// A damaging collision.  Lives only drop outside invincibility.
    pub fn take_hit(&mut self) -> HitOutcome {
        if self.invulnerable() {
            return HitOutcome::Absorbed;
        }
        self.lose_life()
    }

    pub fn lose_life(&mut self) -> HitOutcome {
        self.lives = self.lives.saturating_sub(1);
        self.rapid_fire_active = false;
        self.rapid_fire_timer = 0.0;
        self.weapon_level = self.weapon_level.saturating_sub(1).max(1);

        if self.lives > 0 {
            self.respawn();
            HitOutcome::Respawned
        } else {
            HitOutcome::Destroyed
        }
    }

    pub fn respawn(&mut self) {
        self.weapon_level = 1;
        self.fuel = self.max_fuel;
        self.is_respawning = true;
        self.respawn_timer = RESPAWN_DURATION_MS;
        self.blink_timer = 0.0;
    }
}

/// Stick deflection beyond the deadzone becomes velocity.
fn axis(value: f64) -> f64 {
    if value.abs() > crate::input::ANALOG_DEADZONE {
        value * ANALOG_GAIN
    } else {
        0.0
    }
}

/// (vertical offset in stream spacings, kind, speed multiplier) per stream.
fn volley_layout(level: u8) -> &'static [(f64, ProjectileKind, f64)] {
    use ProjectileKind::{Player as N, Power as P};
    match level {
        0 | 1 => &[(0.0, N, 1.0)],
        2 => &[(-1.0, N, 1.0), (1.0, N, 1.0)],
        3 => &[(0.0, P, 1.0), (-1.0, N, 1.0), (1.0, N, 1.0)],
        4 => &[(-1.5, P, 1.0), (-0.5, N, 1.0), (0.5, N, 1.0), (1.5, P, 1.0)],
        _ => &[
            (0.0, P, 1.5),
            (-2.0, P, 1.0),
            (-1.0, N, 1.0),
            (1.0, N, 1.0),
            (2.0, P, 1.0),
        ],
    }
}
