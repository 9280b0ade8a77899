//! Fire-and-forget notifications for the rendering and audio collaborators.
//!
//! The core never draws or plays anything.  It records what happened as
//! `Effect` values; the world keeps the current tick's effects readable and
//! forwards each one to every subscribed `EffectSink`.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// 24-bit RGB colour hint for explosion effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Color(pub u32);

impl Color {
    pub const ORANGE: Color = Color(0xff8800);
    pub const AMBER: Color = Color(0xffaa00);
    pub const RED: Color = Color(0xff0000);
    pub const GREY: Color = Color(0xaaaaaa);
    pub const PLAYER_SHOT: Color = Color(0x00ff41);
    pub const POWER_SHOT: Color = Color(0x00d9ff);
    pub const ENEMY_SHOT: Color = Color(0xff0033);

    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        )
    }
}

/// Background music the audio collaborator should switch to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MusicMode {
    Normal,
    Boss,
    Shield,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Effect {
    Explosion {
        x: f64,
        y: f64,
        intensity: u32,
        color: Color,
    },
    Celebration {
        x: f64,
        y: f64,
    },
    Shoot,
    Collect,
    Refuel,
    LowFuel,
    Hit,
    GameOver,
    BossDefeated,
    Music(MusicMode),
}

/// Receiver of simulation effects.
pub trait EffectSink {
    fn on_effect(&mut self, effect: &Effect);
}

impl<F: FnMut(&Effect)> EffectSink for F {
    fn on_effect(&mut self, effect: &Effect) {
        self(effect)
    }
}

/// Sink that keeps every effect it receives.  Cloning shares the same log,
/// so one handle can be subscribed while another is inspected.
#[derive(Clone, Debug, Default)]
pub struct EffectLog {
    inner: Rc<RefCell<Vec<Effect>>>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Effect> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    pub fn count(&self, pred: impl Fn(&Effect) -> bool) -> usize {
        self.inner.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl EffectSink for EffectLog {
    fn on_effect(&mut self, effect: &Effect) {
        self.inner.borrow_mut().push(effect.clone());
    }
}
