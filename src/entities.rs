//! Free-flying entity types and their local update rules.
//!
//! None of these know about collision resolution; the world decides who hit
//! whom and flips `marked_for_deletion`.  Sub-types are plain enums with one
//! `match` per rule so every table lives in one place.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::effects::Color;
use crate::utils::{chance_over, frames, random_range, Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    GameOver,
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Standard player shot.
    Player,
    /// Heavy player shot: larger and three times the damage.
    Power,
    /// Fired by enemies and the boss; only hurts the player.
    Enemy,
}

impl ProjectileKind {
    pub fn size(self) -> (f64, f64) {
        match self {
            ProjectileKind::Player => (10.0, 4.0),
            ProjectileKind::Power => (20.0, 6.0),
            ProjectileKind::Enemy => (10.0, 4.0),
        }
    }

    pub fn damage(self) -> i32 {
        match self {
            ProjectileKind::Player => 1,
            ProjectileKind::Power => 3,
            ProjectileKind::Enemy => 10,
        }
    }

    pub fn color(self) -> Color {
        match self {
            ProjectileKind::Player => Color::PLAYER_SHOT,
            ProjectileKind::Power => Color::POWER_SHOT,
            ProjectileKind::Enemy => Color::ENEMY_SHOT,
        }
    }

    pub fn is_hostile(self) -> bool {
        self == ProjectileKind::Enemy
    }
}

#[derive(Clone, Debug)]
pub struct Projectile {
    /// Top-left corner.
    pub pos: Vec2,
    /// Velocity per reference frame.
    pub vel: Vec2,
    pub width: f64,
    pub height: f64,
    pub damage: i32,
    pub kind: ProjectileKind,
    pub marked_for_deletion: bool,
}

impl Projectile {
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, kind: ProjectileKind) -> Self {
        let (width, height) = kind.size();
        Self {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            width,
            height,
            damage: kind.damage(),
            kind,
            marked_for_deletion: false,
        }
    }

    pub fn update(&mut self, delta_ms: f64) {
        let f = frames(delta_ms);
        self.pos.x += self.vel.x * f;
        self.pos.y += self.vel.y * f;
        if !self.pos.is_finite() {
            self.marked_for_deletion = true;
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    /// True once the projectile has left the play field on any side.
    pub fn out_of_field(&self, width: f64, height: f64) -> bool {
        self.pos.x > width || self.pos.x < 0.0 || self.pos.y > height || self.pos.y < 0.0
    }
}

// ── Meteors ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeteorSize {
    Large,
    Medium,
    Small,
}

impl MeteorSize {
    fn radius_range(self) -> (f64, f64) {
        match self {
            MeteorSize::Large => (40.0, 60.0),
            MeteorSize::Medium => (25.0, 35.0),
            MeteorSize::Small => (15.0, 20.0),
        }
    }

    pub fn health(self) -> i32 {
        match self {
            MeteorSize::Large => 3,
            MeteorSize::Medium => 2,
            MeteorSize::Small => 1,
        }
    }

    /// Contact damage rating.  Player hits are binary (one life), so this is
    /// informational for presentation.
    pub fn damage(self) -> i32 {
        match self {
            MeteorSize::Large => 20,
            MeteorSize::Medium => 15,
            MeteorSize::Small => 10,
        }
    }

    /// Score for shooting one down.
    pub fn score(self) -> u64 {
        match self {
            MeteorSize::Large => 50,
            MeteorSize::Medium => 30,
            MeteorSize::Small => 20,
        }
    }

    /// Size of the two fragments left behind, if it breaks apart at all.
    pub fn fragment_size(self) -> Option<MeteorSize> {
        match self {
            MeteorSize::Large => Some(MeteorSize::Medium),
            MeteorSize::Medium => Some(MeteorSize::Small),
            MeteorSize::Small => None,
        }
    }
}

pub const METEOR_FRAGMENTS: usize = 2;

#[derive(Clone, Debug)]
pub struct Meteor {
    /// Center point.
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f64,
    pub size: MeteorSize,
    pub health: i32,
    pub max_health: i32,
    pub marked_for_deletion: bool,
}

impl Meteor {
    /// A new meteor of `size`.  Without an explicit position it enters just
    /// past the right edge at a random height.
    pub fn spawn(
        rng: &mut impl Rng,
        size: MeteorSize,
        at: Option<Vec2>,
        field_width: f64,
        field_height: f64,
    ) -> Self {
        let (r_min, r_max) = size.radius_range();
        let radius = random_range(rng, r_min, r_max);
        let pos = match at {
            Some(p) => p,
            None => Vec2::new(field_width + radius, random_range(rng, 0.0, field_height)),
        };
        let vel = Vec2::new(random_range(rng, -4.0, -8.0), random_range(rng, -2.0, 2.0));
        Self {
            pos,
            vel,
            radius,
            size,
            health: size.health(),
            max_health: size.health(),
            marked_for_deletion: false,
        }
    }

    pub fn update(&mut self, delta_ms: f64) {
        let f = frames(delta_ms);
        self.pos.x += self.vel.x * f;
        self.pos.y += self.vel.y * f;
        if !self.pos.is_finite() || self.pos.x + self.radius < 0.0 {
            self.marked_for_deletion = true;
        }
    }

    /// Full square around the rock, used against projectiles.
    pub fn hit_bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius, 1.0)
    }

    /// Tighter square used against the player's body.
    pub fn body_bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius, 0.8)
    }

    /// Apply damage; returns true if this blow destroyed the meteor.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health = (self.health - amount.max(1)).max(0);
        if self.health == 0 {
            self.marked_for_deletion = true;
            return true;
        }
        false
    }

    /// Pieces left behind after destruction, all at the meteor's position
    /// with independent random velocities.
    pub fn fragment(&self, rng: &mut impl Rng, field_width: f64, field_height: f64) -> Vec<Meteor> {
        match self.size.fragment_size() {
            Some(next) => (0..METEOR_FRAGMENTS)
                .map(|_| Meteor::spawn(rng, next, Some(self.pos), field_width, field_height))
                .collect(),
            None => Vec::new(),
        }
    }
}

// ── Enemies ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Common fighter drifting on a sine wave.
    Drone,
    /// Fast, fragile, steers toward the player's height.
    Interceptor,
    /// Slow and armoured.
    Tank,
}

/// Per-frame chance that any enemy on screen fires.
const ENEMY_FIRE_CHANCE: f64 = 0.005;
const ENEMY_SHOT_SPEED: f64 = -10.0;
const INTERCEPTOR_STEER: f64 = 0.1;
const INTERCEPTOR_MAX_VY: f64 = 2.0;

impl EnemyKind {
    /// 80% drones, 15% interceptors, 5% tanks.
    pub fn roll(rng: &mut impl Rng) -> Self {
        let r: f64 = rng.gen();
        if r < 0.80 {
            EnemyKind::Drone
        } else if r < 0.95 {
            EnemyKind::Interceptor
        } else {
            EnemyKind::Tank
        }
    }

    pub fn size(self) -> (f64, f64) {
        match self {
            EnemyKind::Drone => (40.0, 40.0),
            EnemyKind::Interceptor => (30.0, 20.0),
            EnemyKind::Tank => (60.0, 60.0),
        }
    }

    pub fn health(self) -> i32 {
        match self {
            EnemyKind::Drone => 1,
            EnemyKind::Interceptor => 2,
            EnemyKind::Tank => 5,
        }
    }

    pub fn score(self) -> u64 {
        match self {
            EnemyKind::Drone => 100,
            EnemyKind::Interceptor => 200,
            EnemyKind::Tank => 500,
        }
    }

    pub fn color(self) -> Color {
        match self {
            EnemyKind::Drone => Color(0xff0055),
            EnemyKind::Interceptor => Color(0xffaa00),
            EnemyKind::Tank => Color::RED,
        }
    }

    /// Horizontal speed; drones pick theirs at random.
    fn speed(self, rng: &mut impl Rng) -> f64 {
        match self {
            EnemyKind::Drone => random_range(rng, -3.0, -6.0),
            EnemyKind::Interceptor => -8.0,
            EnemyKind::Tank => -2.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    /// Top-left corner.
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f64,
    pub height: f64,
    pub kind: EnemyKind,
    pub health: i32,
    pub score_value: u64,
    pub marked_for_deletion: bool,
}

impl Enemy {
    pub fn new(kind: EnemyKind, x: f64, y: f64, vx: f64, vy: f64) -> Self {
        let (width, height) = kind.size();
        Self {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            width,
            height,
            kind,
            health: kind.health(),
            score_value: kind.score(),
            marked_for_deletion: false,
        }
    }

    /// Random enemy entering at the right edge.
    pub fn spawn(rng: &mut impl Rng, field_width: f64, field_height: f64) -> Self {
        let kind = EnemyKind::roll(rng);
        let (_, height) = kind.size();
        let y = random_range(rng, 0.0, (field_height - height).max(0.0));
        let vx = kind.speed(rng);
        let vy = random_range(rng, -1.0, 1.0);
        Enemy::new(kind, field_width, y, vx, vy)
    }

    /// Move and steer; may return a shot for the world to adopt.
    pub fn update(
        &mut self,
        delta_ms: f64,
        player_center_y: f64,
        field_width: f64,
        rng: &mut impl Rng,
    ) -> Option<Projectile> {
        let f = frames(delta_ms);
        self.pos.x += self.vel.x * f;
        self.pos.y += self.vel.y * f;

        match self.kind {
            EnemyKind::Drone => {
                self.pos.y += (self.pos.x * 0.01).sin() * 2.0 * f;
            }
            EnemyKind::Interceptor => {
                let center_y = self.pos.y + self.height / 2.0;
                let steer = if player_center_y > center_y {
                    INTERCEPTOR_STEER
                } else {
                    -INTERCEPTOR_STEER
                };
                self.vel.y = (self.vel.y + steer * f).clamp(-INTERCEPTOR_MAX_VY, INTERCEPTOR_MAX_VY);
            }
            EnemyKind::Tank => {}
        }

        if !self.pos.is_finite() || self.pos.x + self.width < 0.0 {
            self.marked_for_deletion = true;
            return None;
        }

        let on_screen = self.pos.x > 0.0 && self.pos.x < field_width;
        if on_screen && rng.gen_bool(chance_over(ENEMY_FIRE_CHANCE, delta_ms)) {
            return Some(Projectile::new(
                self.pos.x,
                self.pos.y + self.height / 2.0,
                ENEMY_SHOT_SPEED,
                0.0,
                ProjectileKind::Enemy,
            ));
        }
        None
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    /// Apply damage; returns true if the enemy died from it.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.marked_for_deletion = true;
            return true;
        }
        false
    }
}

// ── Pickups ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Fuel,
    Shield,
    Weapon,
    RapidFire,
    /// Inert: either rolled empty or already consumed.
    None,
}

impl PickupKind {
    /// Weighted roll: fuel 35%, shield 20%, weapon 25%, rapid-fire 15%,
    /// nothing 5%.  A starving player always gets fuel.
    pub fn roll(rng: &mut impl Rng, fuel_low: bool) -> Self {
        if fuel_low {
            return PickupKind::Fuel;
        }
        let r: f64 = rng.gen();
        if r < 0.35 {
            PickupKind::Fuel
        } else if r < 0.55 {
            PickupKind::Shield
        } else if r < 0.80 {
            PickupKind::Weapon
        } else if r < 0.95 {
            PickupKind::RapidFire
        } else {
            PickupKind::None
        }
    }
}

/// Drift speed of pickups relative to the world speed.
const PICKUP_DRIFT: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct Pickup {
    /// Center point.
    pub pos: Vec2,
    pub radius: f64,
    pub kind: PickupKind,
    pub marked_for_deletion: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2, radius: f64) -> Self {
        Self {
            pos,
            radius,
            kind,
            marked_for_deletion: false,
        }
    }

    pub fn spawn(rng: &mut impl Rng, kind: PickupKind, field_width: f64, field_height: f64) -> Self {
        let radius = random_range(rng, 50.0, 150.0);
        let y = random_range(rng, radius, field_height - radius);
        Pickup::new(kind, Vec2::new(field_width + radius, y), radius)
    }

    pub fn update(&mut self, delta_ms: f64, world_speed: f64) {
        self.pos.x -= world_speed * PICKUP_DRIFT * frames(delta_ms);
        if !self.pos.is_finite() || self.pos.x + self.radius < 0.0 {
            self.marked_for_deletion = true;
        }
    }

    /// True when `point` lies within `radius + reach` of the center.
    pub fn reaches(&self, point: Vec2, reach: f64) -> bool {
        let dx = point.x - self.pos.x;
        let dy = point.y - self.pos.y;
        dx.hypot(dy) < self.radius + reach
    }

    /// Take the effect out of the pickup, leaving it inert.
    pub fn consume(&mut self) -> Option<PickupKind> {
        match self.kind {
            PickupKind::None => None,
            kind => {
                self.kind = PickupKind::None;
                Some(kind)
            }
        }
    }
}

// ── Background ────────────────────────────────────────────────────────────────

/// Decorative parallax star.  Not involved in gameplay.
#[derive(Clone, Debug)]
pub struct Star {
    pub pos: Vec2,
    pub size: f64,
    pub speed: f64,
    pub brightness: f64,
}

impl Star {
    pub fn spawn(rng: &mut impl Rng, field_width: f64, field_height: f64) -> Self {
        Self {
            pos: Vec2::new(
                random_range(rng, 0.0, field_width),
                random_range(rng, 0.0, field_height),
            ),
            size: random_range(rng, 0.5, 2.5),
            speed: random_range(rng, 0.5, 2.5),
            brightness: random_range(rng, 0.0, 0.5),
        }
    }

    pub fn update(
        &mut self,
        delta_ms: f64,
        world_speed: f64,
        field_width: f64,
        field_height: f64,
        rng: &mut impl Rng,
    ) {
        self.pos.x -= world_speed * self.speed * 0.1 * frames(delta_ms);
        if self.pos.x < 0.0 || !self.pos.is_finite() {
            self.pos.x = field_width;
            self.pos.y = random_range(rng, 0.0, field_height);
        }
    }
}
