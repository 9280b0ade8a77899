//! The periodic boss: a compound target with destructible cannons.
//!
//! Lifecycle is `Entering` then `Fighting`.  Defeat is not a state here; the
//! world checks `is_defeated` after collisions and removes the boss.

use rand::Rng;
use serde::Serialize;

use crate::effects::{Color, Effect};
use crate::entities::{Projectile, ProjectileKind};
use crate::utils::{clamp, frames, Rect, Vec2};

pub const BOSS_WIDTH: f64 = 200.0;
pub const BOSS_HEIGHT: f64 = 120.0;
pub const CANNON_HEALTH: i32 = 100;

const ENTRY_OFFSET: f64 = 100.0;
const FIGHT_X_FROM_RIGHT: f64 = 300.0;
const HOVER_MARGIN: f64 = 50.0;
const PATTERN_CHANGE_MS: f64 = 3000.0;
const CANNON_SHOT_SPEED: f64 = 10.0;
const RAPID_SHOT_SPEED: f64 = 12.0;
const BODY_SHOT_SPEED: f64 = 8.0;
const SPREAD_ANGLE: f64 = 0.2;
const RAPID_JITTER: f64 = 0.5;
/// Chance the hull fires on a shoot tick once every cannon is gone.
const BODY_FIRE_CHANCE: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BossState {
    Entering,
    Fighting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AttackPattern {
    /// One aimed shot per live cannon.
    Single,
    /// Three-way spread per live cannon.
    Spread,
    /// One fast jittered shot from a random live cannon.
    Rapid,
}

impl AttackPattern {
    pub fn next(self) -> Self {
        match self {
            AttackPattern::Single => AttackPattern::Spread,
            AttackPattern::Spread => AttackPattern::Rapid,
            AttackPattern::Rapid => AttackPattern::Single,
        }
    }
}

/// A destructible sub-target.  `offset` is relative to the boss's corner.
#[derive(Clone, Debug)]
pub struct Cannon {
    pub offset: Vec2,
    pub width: f64,
    pub height: f64,
    pub health: i32,
    pub max_health: i32,
    pub active: bool,
}

impl Cannon {
    fn new(x: f64, y: f64) -> Self {
        Self {
            offset: Vec2::new(x, y),
            width: 30.0,
            height: 15.0,
            health: CANNON_HEALTH,
            max_health: CANNON_HEALTH,
            active: true,
        }
    }

    pub fn bounds(&self, boss_pos: Vec2) -> Rect {
        Rect::new(
            boss_pos.x + self.offset.x,
            boss_pos.y + self.offset.y,
            self.width,
            self.height,
        )
    }

    /// Where this cannon's shots leave from.
    fn muzzle(&self, boss_pos: Vec2) -> Vec2 {
        Vec2::new(
            boss_pos.x + self.offset.x,
            boss_pos.y + self.offset.y + self.height / 2.0,
        )
    }
}

/// Which part of the boss absorbed a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BossHit {
    Cannon { index: usize, destroyed: bool },
    Body,
}

#[derive(Clone, Debug)]
pub struct Boss {
    /// Top-left corner.
    pub pos: Vec2,
    pub width: f64,
    pub height: f64,
    pub level: u32,
    pub speed_x: f64,
    pub speed_y: f64,
    pub health: i32,
    pub max_health: i32,
    pub state: BossState,
    pub target_x: f64,
    pub attack_pattern: AttackPattern,
    pub cannons: [Cannon; 2],
    shoot_timer: f64,
    shoot_interval: f64,
    attack_timer: f64,
    angle: f64,
}

impl Boss {
    pub fn new(level: u32, field_width: f64, field_height: f64) -> Self {
        let lvl = f64::from(level);
        let health = 500 + 200 * level as i32;
        Self {
            pos: Vec2::new(
                field_width + ENTRY_OFFSET,
                field_height / 2.0 - BOSS_HEIGHT / 2.0,
            ),
            width: BOSS_WIDTH,
            height: BOSS_HEIGHT,
            level,
            speed_x: 2.0 + lvl * 0.5,
            speed_y: 2.0 + lvl * 0.2,
            health,
            max_health: health,
            state: BossState::Entering,
            target_x: field_width - FIGHT_X_FROM_RIGHT,
            attack_pattern: AttackPattern::Single,
            cannons: [
                Cannon::new(40.0, 20.0),
                Cannon::new(40.0, BOSS_HEIGHT - 35.0),
            ],
            shoot_timer: 0.0,
            shoot_interval: (100.0 - lvl * 10.0).max(20.0),
            attack_timer: 0.0,
            angle: 0.0,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    pub fn health_percent(&self) -> f64 {
        clamp(f64::from(self.health) / f64::from(self.max_health) * 100.0, 0.0, 100.0)
    }

    pub fn active_cannons(&self) -> usize {
        self.cannons.iter().filter(|c| c.active).count()
    }

    /// Advance movement and attack timers.  Returns any shots fired.
    pub fn update(
        &mut self,
        delta_ms: f64,
        player_center: Vec2,
        field_height: f64,
        rng: &mut impl Rng,
    ) -> Vec<Projectile> {
        let f = frames(delta_ms);
        match self.state {
            BossState::Entering => {
                if self.pos.x > self.target_x {
                    self.pos.x = (self.pos.x - self.speed_x * f).max(self.target_x);
                } else {
                    self.state = BossState::Fighting;
                }
                Vec::new()
            }
            BossState::Fighting => {
                self.angle += (0.02 + f64::from(self.level) * 0.005) * f;
                self.pos.y += self.angle.sin() * self.speed_y * f;
                let max_y = (field_height - self.height - HOVER_MARGIN).max(HOVER_MARGIN);
                self.pos.y = clamp(self.pos.y, HOVER_MARGIN, max_y);

                self.attack_timer += delta_ms;
                if self.attack_timer > PATTERN_CHANGE_MS {
                    self.attack_pattern = self.attack_pattern.next();
                    self.attack_timer = 0.0;
                }

                self.shoot_timer += delta_ms;
                if self.shoot_timer > self.shoot_interval {
                    self.shoot_timer = 0.0;
                    return self.fire(player_center, rng);
                }
                Vec::new()
            }
        }
    }

    fn fire(&self, target: Vec2, rng: &mut impl Rng) -> Vec<Projectile> {
        let muzzles: Vec<Vec2> = self
            .cannons
            .iter()
            .filter(|c| c.active)
            .map(|c| c.muzzle(self.pos))
            .collect();

        if muzzles.is_empty() {
            if rng.gen_bool(BODY_FIRE_CHANCE) {
                let from = Vec2::new(self.pos.x, self.pos.y + self.height / 2.0);
                return vec![aimed_shot(from, target, 0.0, BODY_SHOT_SPEED)];
            }
            return Vec::new();
        }

        match self.attack_pattern {
            AttackPattern::Single => muzzles
                .iter()
                .map(|&m| aimed_shot(m, target, 0.0, CANNON_SHOT_SPEED))
                .collect(),
            AttackPattern::Spread => muzzles
                .iter()
                .flat_map(|&m| {
                    [0.0, -SPREAD_ANGLE, SPREAD_ANGLE]
                        .into_iter()
                        .map(move |offset| aimed_shot(m, target, offset, CANNON_SHOT_SPEED))
                })
                .collect(),
            AttackPattern::Rapid => {
                let m = muzzles[rng.gen_range(0..muzzles.len())];
                let jitter = (rng.gen::<f64>() - 0.5) * RAPID_JITTER;
                vec![aimed_shot(m, target, jitter, RAPID_SHOT_SPEED)]
            }
        }
    }

    /// Resolve one player projectile against the boss.  Live cannons are
    /// tested first and the first one overlapping takes the hit; the hull is
    /// only tested when no cannon was struck.  At most one part is credited.
    pub fn resolve_hit(&mut self, projectile: &Projectile, effects: &mut Vec<Effect>) -> Option<BossHit> {
        let shot = projectile.bounds();
        let pos = self.pos;

        for (index, cannon) in self.cannons.iter_mut().enumerate() {
            if !cannon.active {
                continue;
            }
            let region = cannon.bounds(pos);
            if !shot.overlaps(&region) {
                continue;
            }
            cannon.health = (cannon.health - projectile.damage).max(0);
            let destroyed = cannon.health == 0;
            if destroyed {
                cannon.active = false;
                let c = region.center();
                effects.push(Effect::Explosion {
                    x: c.x,
                    y: c.y,
                    intensity: 15,
                    color: Color::AMBER,
                });
                tracing::debug!(level = self.level, cannon = index, "boss cannon destroyed");
            } else {
                effects.push(Effect::Explosion {
                    x: projectile.pos.x,
                    y: projectile.pos.y,
                    intensity: 3,
                    color: Color::AMBER,
                });
            }
            return Some(BossHit::Cannon { index, destroyed });
        }

        if shot.overlaps(&self.bounds()) {
            self.health = (self.health - projectile.damage).max(0);
            effects.push(Effect::Explosion {
                x: projectile.pos.x,
                y: projectile.pos.y,
                intensity: 5,
                color: Color::RED,
            });
            return Some(BossHit::Body);
        }
        None
    }
}

fn aimed_shot(from: Vec2, target: Vec2, angle_offset: f64, speed: f64) -> Projectile {
    let angle = (target.y - from.y).atan2(target.x - from.x) + angle_offset;
    Projectile::new(
        from.x,
        from.y,
        angle.cos() * speed,
        angle.sin() * speed,
        ProjectileKind::Enemy,
    )
}
