//! The world: owns every entity, advances them, resolves collisions and
//! schedules spawns.
//!
//! One `update` call is one frame.  The order inside a frame is fixed:
//! player upkeep, background, pickups, boss lifecycle, spawning, entity
//! movement, then the collision passes, then the sweep.  Removal is
//! mark-then-sweep: passes only flip `marked_for_deletion`, and every pairwise
//! test skips anything already marked, so nothing is credited twice.
//!
//! All randomness comes from the world's own seeded RNG so a fixed seed
//! replays the same game.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::boss::Boss;
use crate::config::SimConfig;
use crate::effects::{Color, Effect, EffectSink, MusicMode};
use crate::entities::{Enemy, GameStatus, Meteor, MeteorSize, Pickup, PickupKind, Projectile, Star};
use crate::error::ConfigError;
use crate::input::InputIntent;
use crate::player::{HitOutcome, Player, PlayerStatus, MAX_WEAPON_LEVEL};
use crate::utils::{random_range, sanitize_delta};

/// Kills only ever upgrade the weapon up to this level.
pub const KILL_UPGRADE_CAP: u8 = 3;
/// A kill upgrades the weapon when a uniform draw exceeds this.
pub const KILL_UPGRADE_THRESHOLD: f64 = 0.9;

/// Player hitbox insets (horizontal, vertical) per threat.
const METEOR_INSET: (f64, f64) = (10.0, 10.0);
const SHOT_INSET: (f64, f64) = (10.0, 5.0);
const RAM_INSET: (f64, f64) = (5.0, 5.0);

/// Presentation-facing summary of the world.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub lives: u32,
    pub fuel_percent: f64,
    pub weapon_level: u8,
    pub boss_active: bool,
    pub boss_health_percent: Option<f64>,
    pub status: GameStatus,
}

pub struct World {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub meteors: Vec<Meteor>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub boss: Option<Boss>,
    pub stars: Vec<Star>,
    pub score: u64,
    /// Global scroll and difficulty multiplier.
    pub speed: f64,
    pub boss_level: u32,
    pub next_boss_score: u64,
    pub enemy_interval: f64,
    pub meteor_interval: f64,
    status: GameStatus,
    enemy_timer: f64,
    meteor_timer: f64,
    pickup_timer: f64,
    clock_ms: f64,
    config: SimConfig,
    rng: StdRng,
    effects: Vec<Effect>,
    sinks: Vec<Box<dyn EffectSink>>,
}

impl World {
    /// Build a world from a validated config, seeding from `config.seed` or
    /// from entropy.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::with_rng(config, rng))
    }

    /// Build a world with an explicit RNG.  The config is trusted as-is.
    pub fn with_rng(config: SimConfig, mut rng: StdRng) -> Self {
        let stars = (0..config.star_count)
            .map(|_| Star::spawn(&mut rng, config.width, config.height))
            .collect();
        let mut world = Self {
            player: Player::new(config.ship, config.starting_lives, config.height),
            enemies: Vec::new(),
            meteors: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            boss: None,
            stars,
            score: 0,
            speed: config.initial_speed,
            boss_level: 1,
            next_boss_score: config.first_boss_score,
            enemy_interval: config.enemy_interval_ms,
            meteor_interval: config.meteor_interval_ms,
            status: GameStatus::Playing,
            enemy_timer: 0.0,
            meteor_timer: 0.0,
            pickup_timer: 0.0,
            clock_ms: 0.0,
            config,
            rng,
            effects: Vec::new(),
            sinks: Vec::new(),
        };
        world.effects.push(Effect::Music(MusicMode::Normal));
        world
    }

    /// Put everything back to the start of a game.  Subscribers and the RNG
    /// stream are kept.
    pub fn reset(&mut self) {
        self.player = Player::new(self.config.ship, self.config.starting_lives, self.config.height);
        self.enemies.clear();
        self.meteors.clear();
        self.projectiles.clear();
        self.pickups.clear();
        self.boss = None;
        self.score = 0;
        self.speed = self.config.initial_speed;
        self.boss_level = 1;
        self.next_boss_score = self.config.first_boss_score;
        self.enemy_interval = self.config.enemy_interval_ms;
        self.meteor_interval = self.config.meteor_interval_ms;
        self.status = GameStatus::Playing;
        self.enemy_timer = 0.0;
        self.meteor_timer = 0.0;
        self.pickup_timer = 0.0;
        self.clock_ms = 0.0;
        self.effects.clear();
        self.emit(Effect::Music(MusicMode::Normal));
        self.flush_effects();
        tracing::info!("world reset");
    }

    pub fn subscribe(&mut self, sink: impl EffectSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Hand a projectile to the world.  Used by the player, enemies and boss.
    pub fn add_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    // ── Readable state ───────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.player.lives
    }

    pub fn fuel_percent(&self) -> f64 {
        self.player.fuel_percent()
    }

    pub fn boss_active(&self) -> bool {
        self.boss.is_some()
    }

    pub fn boss_health_percent(&self) -> Option<f64> {
        self.boss.as_ref().map(Boss::health_percent)
    }

    /// Simulation time accumulated since the last reset.
    pub fn elapsed_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Effects raised during the most recent tick.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            lives: self.player.lives,
            fuel_percent: self.fuel_percent(),
            weapon_level: self.player.weapon_level,
            boss_active: self.boss_active(),
            boss_health_percent: self.boss_health_percent(),
            status: self.status,
        }
    }

    // ── Per-frame tick ───────────────────────────────────────────────────────

    /// Advance the simulation by one frame.  Inert once the game is over.
    pub fn update(&mut self, input: &InputIntent, delta_ms: f64) {
        if self.status == GameStatus::GameOver {
            return;
        }
        self.effects.clear();

        let dt = sanitize_delta(delta_ms);
        if dt != delta_ms && delta_ms != 0.0 {
            tracing::warn!(delta_ms, "invalid timestep clamped to zero");
        }
        self.clock_ms += dt;

        let status = self.player.update(
            input,
            dt,
            self.clock_ms,
            self.config.width,
            self.config.height,
            &mut self.effects,
        );
        if status == PlayerStatus::OutOfFuel {
            tracing::info!(score = self.score, "fuel exhausted");
            self.game_over();
            self.flush_effects();
            return;
        }
        if input.wants_fire() {
            let volley = self
                .player
                .try_fire(self.clock_ms, self.config.fire_pattern, input.active_aim());
            if let Some(volley) = volley {
                self.projectiles.extend(volley);
                self.emit(Effect::Shoot);
            }
        }

        self.advance_background(dt);
        self.advance_pickups(dt);
        self.advance_boss(dt);
        if self.boss.is_none() {
            self.advance_spawns(dt);
        }
        self.advance_entities(dt);

        self.collide_meteors_with_player();
        self.intercept_projectiles();
        self.collide_hostile_shots_with_player();
        self.collide_shots_with_enemies();
        self.collide_shots_with_boss();
        self.collide_shots_with_meteors();
        self.collide_enemies_with_player();
        self.sweep();

        self.flush_effects();
    }

    fn advance_background(&mut self, dt: f64) {
        let (w, h, speed) = (self.config.width, self.config.height, self.speed);
        for star in &mut self.stars {
            star.update(dt, speed, w, h, &mut self.rng);
        }
    }

    fn advance_pickups(&mut self, dt: f64) {
        let (w, h) = (self.config.width, self.config.height);
        self.pickup_timer += dt;

        let fuel_low = self.player.fuel_percent() < self.config.low_fuel_percent;
        let fuel_on_field = self
            .pickups
            .iter()
            .any(|p| p.kind == PickupKind::Fuel && !p.marked_for_deletion);
        if fuel_low && !fuel_on_field && self.pickup_timer > self.config.fuel_rescue_delay_ms {
            self.pickups.push(Pickup::spawn(&mut self.rng, PickupKind::Fuel, w, h));
            self.pickup_timer = 0.0;
        }
        if self.pickup_timer > self.config.pickup_interval_ms {
            let kind = PickupKind::roll(&mut self.rng, fuel_low);
            self.pickups.push(Pickup::spawn(&mut self.rng, kind, w, h));
            self.pickup_timer = 0.0;
        }

        let center = self.player.center();
        let reach = self.player.width;
        let mut collected = Vec::new();
        for pickup in &mut self.pickups {
            pickup.update(dt, self.speed);
            if pickup.marked_for_deletion || !pickup.reaches(center, reach) {
                continue;
            }
            if let Some(kind) = pickup.consume() {
                collected.push(kind);
            }
        }
        for kind in collected {
            self.apply_pickup(kind);
        }
    }

    fn apply_pickup(&mut self, kind: PickupKind) {
        match kind {
            PickupKind::Fuel => {
                self.player.refuel(self.config.refuel_amount);
                self.emit(Effect::Refuel);
            }
            PickupKind::Shield => {
                self.player.activate_shield(self.config.shield_duration_ms);
                self.emit(Effect::Music(MusicMode::Shield));
            }
            PickupKind::Weapon => {
                if !self.player.upgrade_weapon(MAX_WEAPON_LEVEL) {
                    return;
                }
            }
            PickupKind::RapidFire => {
                self.player.activate_rapid_fire(self.config.rapid_fire_duration_ms);
            }
            PickupKind::None => return,
        }
        tracing::debug!(?kind, "pickup collected");
        self.emit(Effect::Collect);
    }

    fn advance_boss(&mut self, dt: f64) {
        if self.boss.is_none() && self.score >= self.next_boss_score {
            self.boss = Some(Boss::new(self.boss_level, self.config.width, self.config.height));
            for enemy in &mut self.enemies {
                enemy.marked_for_deletion = true;
            }
            self.emit(Effect::Music(MusicMode::Boss));
            tracing::info!(level = self.boss_level, score = self.score, "boss incoming");
        }

        let target = self.player.center();
        let shots = match self.boss.as_mut() {
            Some(boss) => boss.update(dt, target, self.config.height, &mut self.rng),
            None => return,
        };
        self.projectiles.extend(shots);
    }

    fn advance_spawns(&mut self, dt: f64) {
        let (w, h) = (self.config.width, self.config.height);

        self.enemy_timer += dt;
        if self.enemy_timer > self.enemy_interval {
            self.enemies.push(Enemy::spawn(&mut self.rng, w, h));
            self.enemy_timer = 0.0;
            if self.enemy_interval > self.config.enemy_interval_floor_ms {
                self.enemy_interval = (self.enemy_interval - self.config.enemy_interval_step_ms)
                    .max(self.config.enemy_interval_floor_ms);
            }
            self.speed = (self.speed + self.config.speed_step_per_spawn).min(self.config.max_speed);
            tracing::debug!(
                enemy_interval = self.enemy_interval,
                speed = self.speed,
                "difficulty raised"
            );
        }

        self.meteor_timer += dt;
        if self.meteor_timer > self.meteor_interval {
            self.meteors
                .push(Meteor::spawn(&mut self.rng, MeteorSize::Large, None, w, h));
            self.meteor_timer = 0.0;
            self.meteor_interval = random_range(
                &mut self.rng,
                self.config.meteor_interval_min_ms,
                self.config.meteor_interval_max_ms,
            );
        }
    }

    fn advance_entities(&mut self, dt: f64) {
        let (w, h) = (self.config.width, self.config.height);
        let player_y = self.player.center().y;

        let mut shots = Vec::new();
        for enemy in self.enemies.iter_mut().filter(|e| !e.marked_for_deletion) {
            if let Some(shot) = enemy.update(dt, player_y, w, &mut self.rng) {
                shots.push(shot);
            }
        }
        self.projectiles.extend(shots);

        for meteor in self.meteors.iter_mut().filter(|m| !m.marked_for_deletion) {
            meteor.update(dt);
        }
        for projectile in self.projectiles.iter_mut().filter(|p| !p.marked_for_deletion) {
            projectile.update(dt);
            if projectile.out_of_field(w, h) {
                projectile.marked_for_deletion = true;
            }
        }
        self.sweep();
    }

    // ── Collision passes ─────────────────────────────────────────────────────

    fn collide_meteors_with_player(&mut self) {
        let body = self.player.bounds().inset(METEOR_INSET.0, METEOR_INSET.1);
        for i in 0..self.meteors.len() {
            let meteor = &mut self.meteors[i];
            if meteor.marked_for_deletion || !meteor.body_bounds().overlaps(&body) {
                continue;
            }
            meteor.marked_for_deletion = true;
            let (x, y) = (meteor.pos.x, meteor.pos.y);
            self.emit(Effect::Explosion {
                x,
                y,
                intensity: 30,
                color: Color::ORANGE,
            });
            self.hit_player();
        }
    }

    /// Player shots and hostile shots that touch cancel each other out.
    fn intercept_projectiles(&mut self) {
        let n = self.projectiles.len();
        for i in 0..n {
            if self.projectiles[i].marked_for_deletion || self.projectiles[i].kind.is_hostile() {
                continue;
            }
            let ours = self.projectiles[i].bounds();
            for j in 0..n {
                let theirs = &self.projectiles[j];
                if i == j || theirs.marked_for_deletion || !theirs.kind.is_hostile() {
                    continue;
                }
                if ours.overlaps(&theirs.bounds()) {
                    self.projectiles[i].marked_for_deletion = true;
                    self.projectiles[j].marked_for_deletion = true;
                    self.emit(Effect::Explosion {
                        x: ours.x,
                        y: ours.y,
                        intensity: 3,
                        color: Color::AMBER,
                    });
                    break;
                }
            }
        }
    }

    fn collide_hostile_shots_with_player(&mut self) {
        let body = self.player.bounds().inset(SHOT_INSET.0, SHOT_INSET.1);
        for i in 0..self.projectiles.len() {
            let shot = &mut self.projectiles[i];
            if shot.marked_for_deletion || !shot.kind.is_hostile() || !shot.bounds().overlaps(&body) {
                continue;
            }
            shot.marked_for_deletion = true;
            let effect = Effect::Explosion {
                x: shot.pos.x,
                y: shot.pos.y,
                intensity: 5,
                color: shot.kind.color(),
            };
            self.emit(effect);
            self.hit_player();
        }
    }

    fn collide_shots_with_enemies(&mut self) {
        for i in 0..self.projectiles.len() {
            let shot = &self.projectiles[i];
            if shot.marked_for_deletion || shot.kind.is_hostile() {
                continue;
            }
            let (bounds, damage, pos, color) = (shot.bounds(), shot.damage, shot.pos, shot.kind.color());

            let Some(j) = self
                .enemies
                .iter()
                .position(|e| !e.marked_for_deletion && bounds.overlaps(&e.bounds()))
            else {
                continue;
            };

            self.projectiles[i].marked_for_deletion = true;
            self.emit(Effect::Explosion {
                x: pos.x,
                y: pos.y,
                intensity: 5,
                color,
            });

            let enemy = &mut self.enemies[j];
            if enemy.take_damage(damage) {
                let (center, value, color) = (enemy.bounds().center(), enemy.score_value, enemy.kind.color());
                self.score += value;
                self.emit(Effect::Explosion {
                    x: center.x,
                    y: center.y,
                    intensity: 20,
                    color,
                });
                if self.rng.gen::<f64>() > KILL_UPGRADE_THRESHOLD
                    && self.player.upgrade_weapon(KILL_UPGRADE_CAP)
                {
                    tracing::debug!(level = self.player.weapon_level, "weapon upgraded by kill");
                }
            }
        }
    }

    fn collide_shots_with_boss(&mut self) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        for shot in self.projectiles.iter_mut() {
            if boss.is_defeated() {
                break;
            }
            if shot.marked_for_deletion || shot.kind.is_hostile() {
                continue;
            }
            if boss.resolve_hit(shot, &mut self.effects).is_some() {
                shot.marked_for_deletion = true;
            }
        }
        if boss.is_defeated() {
            self.defeat_boss();
        }
    }

    fn defeat_boss(&mut self) {
        let Some(boss) = self.boss.take() else {
            return;
        };
        let c = boss.bounds().center();
        self.emit(Effect::Explosion {
            x: c.x,
            y: c.y,
            intensity: 100,
            color: Color::RED,
        });

        self.score += self.config.boss_reward * u64::from(boss.level);
        self.boss_level += 1;
        self.next_boss_score += self.config.boss_score_step;
        self.speed = (self.speed + self.config.speed_step_per_boss).min(self.config.max_speed);
        self.enemy_interval = (self.enemy_interval - self.config.post_boss_interval_step_ms)
            .max(self.config.post_boss_interval_floor_ms);

        self.emit(Effect::Celebration { x: c.x, y: c.y });
        self.emit(Effect::Music(MusicMode::Normal));
        self.emit(Effect::BossDefeated);
        tracing::info!(
            level = boss.level,
            score = self.score,
            next_boss_score = self.next_boss_score,
            speed = self.speed,
            "boss defeated"
        );
    }

    fn collide_shots_with_meteors(&mut self) {
        let (w, h) = (self.config.width, self.config.height);
        let mut fragments = Vec::new();

        for i in 0..self.projectiles.len() {
            let shot = &self.projectiles[i];
            if shot.marked_for_deletion || shot.kind.is_hostile() {
                continue;
            }
            let (bounds, pos) = (shot.bounds(), shot.pos);

            let Some(k) = self
                .meteors
                .iter()
                .position(|m| !m.marked_for_deletion && bounds.overlaps(&m.hit_bounds()))
            else {
                continue;
            };

            self.projectiles[i].marked_for_deletion = true;
            let meteor = &mut self.meteors[k];
            if meteor.take_damage(1) {
                self.score += meteor.size.score();
                fragments.extend(meteor.fragment(&mut self.rng, w, h));
                let (x, y) = (meteor.pos.x, meteor.pos.y);
                self.emit(Effect::Explosion {
                    x,
                    y,
                    intensity: 20,
                    color: Color::ORANGE,
                });
            } else {
                self.emit(Effect::Explosion {
                    x: pos.x,
                    y: pos.y,
                    intensity: 5,
                    color: Color::GREY,
                });
            }
        }

        // Fragments join after the pass so they cannot be hit this frame.
        self.meteors.extend(fragments);
    }

    /// Ramming: at most one enemy per frame can collide with the player.
    fn collide_enemies_with_player(&mut self) {
        let body = self.player.bounds().inset(RAM_INSET.0, RAM_INSET.1);
        let Some(enemy) = self
            .enemies
            .iter_mut()
            .find(|e| !e.marked_for_deletion && e.bounds().overlaps(&body))
        else {
            return;
        };
        enemy.marked_for_deletion = true;
        let (x, y) = (enemy.pos.x, enemy.pos.y);
        self.emit(Effect::Explosion {
            x,
            y,
            intensity: 20,
            color: Color::RED,
        });
        self.hit_player();
    }

    // ── Outcomes ─────────────────────────────────────────────────────────────

    fn hit_player(&mut self) {
        if self.status == GameStatus::GameOver {
            return;
        }
        match self.player.take_hit() {
            HitOutcome::Absorbed => {}
            HitOutcome::Respawned => {
                tracing::debug!(lives = self.player.lives, "player lost a life");
                self.emit(Effect::Hit);
            }
            HitOutcome::Destroyed => {
                self.emit(Effect::Hit);
                tracing::info!(score = self.score, "last life lost");
                self.game_over();
            }
        }
    }

    fn game_over(&mut self) {
        if self.status == GameStatus::GameOver {
            return;
        }
        self.status = GameStatus::GameOver;
        self.emit(Effect::GameOver);
    }

    fn sweep(&mut self) {
        let runaway = self.enemies.iter().filter(|e| !e.pos.is_finite()).count()
            + self.meteors.iter().filter(|m| !m.pos.is_finite()).count()
            + self.projectiles.iter().filter(|p| !p.pos.is_finite()).count();
        if runaway > 0 {
            tracing::warn!(runaway, "swept entities with non-finite positions");
        }
        self.enemies.retain(|e| !e.marked_for_deletion);
        self.meteors.retain(|m| !m.marked_for_deletion);
        self.projectiles.retain(|p| !p.marked_for_deletion);
        self.pickups.retain(|p| !p.marked_for_deletion);
    }

    fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn flush_effects(&mut self) {
        for sink in &mut self.sinks {
            for effect in &self.effects {
                sink.on_effect(effect);
            }
        }
    }
}
