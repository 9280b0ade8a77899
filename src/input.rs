//! Normalised per-tick input intent.  Raw device polling happens outside the
//! core; whoever owns the keyboard, mouse or gamepad fills one of these in.

use serde::{Deserialize, Serialize};

use crate::utils::Vec2;

/// Analog sticks below this magnitude on both axes are treated as idle.
pub const ANALOG_DEADZONE: f64 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveMode {
    /// Follow an absolute pointer target with exponential smoothing.
    Pointer,
    /// Accelerate from direction flags, damped by friction.
    #[default]
    Digital,
    /// Gamepad stick velocity.
    Analog,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalAxes {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputIntent {
    pub move_mode: MoveMode,
    pub pointer_target: Option<Vec2>,
    pub digital: DigitalAxes,
    pub analog_move: Option<Vec2>,
    pub analog_aim: Option<Vec2>,
    pub firing: bool,
}

impl InputIntent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn digital(axes: DigitalAxes, firing: bool) -> Self {
        Self {
            move_mode: MoveMode::Digital,
            digital: axes,
            firing,
            ..Self::default()
        }
    }

    pub fn pointer(target: Vec2, firing: bool) -> Self {
        Self {
            move_mode: MoveMode::Pointer,
            pointer_target: Some(target),
            firing,
            ..Self::default()
        }
    }

    pub fn analog(stick: Vec2, firing: bool) -> Self {
        Self {
            move_mode: MoveMode::Analog,
            analog_move: Some(stick),
            firing,
            ..Self::default()
        }
    }

    /// Analog movement outside the deadzone, if any.  It overrides whichever
    /// mode was requested for this tick.
    pub fn active_stick(&self) -> Option<Vec2> {
        self.analog_move.filter(|s| outside_deadzone(*s))
    }

    /// Aim stick outside the deadzone, if any.
    pub fn active_aim(&self) -> Option<Vec2> {
        self.analog_aim.filter(|s| outside_deadzone(*s))
    }

    /// Pushing the aim stick counts as pulling the trigger.
    pub fn wants_fire(&self) -> bool {
        self.firing || self.active_aim().is_some()
    }
}

fn outside_deadzone(stick: Vec2) -> bool {
    stick.is_finite() && (stick.x.abs() > ANALOG_DEADZONE || stick.y.abs() > ANALOG_DEADZONE)
}
