//! Motion state machine.
//!
//! Three states, evaluated once per tick:
//!
//! | From            | To              | Guard                             |
//! |-----------------|-----------------|-----------------------------------|
//! | Idle            | Moving          | `position != target`, normal move |
//! | Idle            | HighSpeedMoving | `position != target`, fast move   |
//! | Moving          | Idle            | `position == target`              |
//! | HighSpeedMoving | Idle            | `position == target`              |
//!
//! Entry into `Moving` starts the ramp at `initial_speed`; entry into
//! `HighSpeedMoving` jumps straight to `high_speed`. Leaving either moving
//! state zeroes `current_speed`.

use super::axis::{AxisState, approach_linear};
use std::fmt;
use tracing::{info, trace};

/// Motion state of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    /// Normal move, speed ramps up by `acceleration` each tick.
    Moving,
    /// Fast move, constant `high_speed`.
    HighSpeedMoving,
}

impl MotionState {
    #[inline]
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Moving | Self::HighSpeedMoving)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::HighSpeedMoving => "high_speed_moving",
        }
    }

    /// First satisfied transition out of this state, if any.
    pub fn next(self, axis: &AxisState) -> Option<MotionState> {
        match self {
            Self::Idle if !axis.at_target() => Some(if axis.fast_move_requested {
                Self::HighSpeedMoving
            } else {
                Self::Moving
            }),
            Self::Moving | Self::HighSpeedMoving if axis.at_target() => Some(Self::Idle),
            _ => None,
        }
    }

    pub fn on_entry(self, axis: &mut AxisState) {
        match self {
            Self::Idle => {}
            Self::Moving => axis.current_speed = axis.initial_speed,
            Self::HighSpeedMoving => axis.current_speed = axis.high_speed,
        }
    }

    pub fn on_exit(self, axis: &mut AxisState) {
        if self.is_moving() {
            axis.current_speed = 0.0;
        }
    }

    /// Per-tick evaluation while in this state.
    pub fn in_state(self, axis: &mut AxisState, dt: f64) {
        match self {
            Self::Idle => {}
            Self::Moving => advance(axis, dt, true),
            Self::HighSpeedMoving => advance(axis, dt, false),
        }
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rest the axis if it sits on a tripped limit and the target lies beyond it.
///
/// Returns `true` when the move was cancelled this tick.
fn hold_at_tripped_limit(axis: &mut AxisState) -> bool {
    let blocked = (axis.positive_limit_tripped && axis.target >= axis.positive_limit)
        || (axis.negative_limit_tripped && axis.target <= axis.negative_limit);
    if blocked {
        info!(
            "Limit tripped at {}, discarding target {}",
            axis.position, axis.target
        );
        axis.target = axis.position;
    }
    blocked
}

fn advance(axis: &mut AxisState, dt: f64, ramp: bool) {
    if hold_at_tripped_limit(axis) {
        return;
    }

    if ramp {
        axis.current_speed = (axis.current_speed + axis.acceleration).min(axis.high_speed);
    }

    let old_position = axis.position;
    axis.position = approach_linear(old_position, axis.target, axis.current_speed, dt);
    axis.refresh_limits();

    trace!(
        "Moved position ({} -> {}), target={}, speed={}",
        old_position, axis.position, axis.target, axis.current_speed
    );
}
