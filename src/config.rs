//! Tunable simulation settings, loadable from JSON.
//!
//! Every field has a default matching the stock game balance, so a config
//! file only needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::player::{FirePattern, ShipClass};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Play-field size in pixels.
    pub width: f64,
    pub height: f64,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub ship: ShipClass,
    pub fire_pattern: FirePattern,
    pub starting_lives: u32,

    // ── Boss progression ──
    pub first_boss_score: u64,
    pub boss_score_step: u64,
    /// Score per boss level awarded on defeat.
    pub boss_reward: u64,

    // ── Spawning ──
    pub enemy_interval_ms: f64,
    pub enemy_interval_floor_ms: f64,
    pub enemy_interval_step_ms: f64,
    pub post_boss_interval_floor_ms: f64,
    pub post_boss_interval_step_ms: f64,
    pub meteor_interval_ms: f64,
    pub meteor_interval_min_ms: f64,
    pub meteor_interval_max_ms: f64,

    // ── Scroll speed ──
    pub initial_speed: f64,
    pub speed_step_per_spawn: f64,
    pub speed_step_per_boss: f64,
    pub max_speed: f64,

    // ── Pickups ──
    pub pickup_interval_ms: f64,
    pub fuel_rescue_delay_ms: f64,
    /// Fuel percentage under which rescue fuel pickups appear.
    pub low_fuel_percent: f64,
    pub refuel_amount: f64,
    pub shield_duration_ms: f64,
    pub rapid_fire_duration_ms: f64,

    pub star_count: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            seed: None,
            ship: ShipClass::Standard,
            fire_pattern: FirePattern::Forward,
            starting_lives: 3,
            first_boss_score: 10_000,
            boss_score_step: 3_000,
            boss_reward: 5_000,
            enemy_interval_ms: 1500.0,
            enemy_interval_floor_ms: 500.0,
            enemy_interval_step_ms: 20.0,
            post_boss_interval_floor_ms: 200.0,
            post_boss_interval_step_ms: 100.0,
            meteor_interval_ms: 2000.0,
            meteor_interval_min_ms: 1000.0,
            meteor_interval_max_ms: 3000.0,
            initial_speed: 5.0,
            speed_step_per_spawn: 0.005,
            speed_step_per_boss: 1.0,
            max_speed: 30.0,
            pickup_interval_ms: 10_000.0,
            fuel_rescue_delay_ms: 1000.0,
            low_fuel_percent: 30.0,
            refuel_amount: 50.0,
            shield_duration_ms: 10_000.0,
            rapid_fire_duration_ms: 10_000.0,
            star_count: 300,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        if self.starting_lives == 0 {
            return Err(ConfigError::invalid("starting_lives", "must be at least 1"));
        }
        if self.boss_score_step == 0 {
            return Err(ConfigError::invalid("boss_score_step", "must be at least 1"));
        }

        positive("enemy_interval_ms", self.enemy_interval_ms)?;
        positive("enemy_interval_floor_ms", self.enemy_interval_floor_ms)?;
        positive("post_boss_interval_floor_ms", self.post_boss_interval_floor_ms)?;
        non_negative("enemy_interval_step_ms", self.enemy_interval_step_ms)?;
        non_negative("post_boss_interval_step_ms", self.post_boss_interval_step_ms)?;
        not_above(
            "enemy_interval_floor_ms",
            self.enemy_interval_floor_ms,
            self.enemy_interval_ms,
        )?;

        positive("meteor_interval_ms", self.meteor_interval_ms)?;
        positive("meteor_interval_min_ms", self.meteor_interval_min_ms)?;
        not_above(
            "meteor_interval_min_ms",
            self.meteor_interval_min_ms,
            self.meteor_interval_max_ms,
        )?;

        positive("initial_speed", self.initial_speed)?;
        non_negative("speed_step_per_spawn", self.speed_step_per_spawn)?;
        non_negative("speed_step_per_boss", self.speed_step_per_boss)?;
        not_above("initial_speed", self.initial_speed, self.max_speed)?;

        positive("pickup_interval_ms", self.pickup_interval_ms)?;
        non_negative("fuel_rescue_delay_ms", self.fuel_rescue_delay_ms)?;
        if !(0.0..=100.0).contains(&self.low_fuel_percent) {
            return Err(ConfigError::invalid("low_fuel_percent", "must lie in 0..=100"));
        }
        positive("refuel_amount", self.refuel_amount)?;
        positive("shield_duration_ms", self.shield_duration_ms)?;
        positive("rapid_fire_duration_ms", self.rapid_fire_duration_ms)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be zero or more, got {value}")))
    }
}

fn not_above(field: &'static str, value: f64, limit: f64) -> Result<(), ConfigError> {
    if value <= limit {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} exceeds its upper bound {limit}")))
    }
}
