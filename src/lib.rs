//! Simulation core for a side-scrolling arcade shooter.
//!
//! The library owns every gameplay rule: entity movement, collisions, the
//! player and boss life cycles, and difficulty progression.  Rendering, audio,
//! raw input and persistence belong to the caller; the core consumes an
//! `InputIntent` per frame and reports what happened as `Effect`s.

pub mod boss;
pub mod config;
pub mod effects;
pub mod entities;
pub mod error;
pub mod input;
pub mod player;
pub mod utils;
pub mod world;

pub use config::SimConfig;
pub use effects::{Effect, EffectSink};
pub use error::ConfigError;
pub use input::InputIntent;
pub use world::World;
