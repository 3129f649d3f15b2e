//! Axis state record.
//!
//! `AxisState` is the plain mutable record behind the emulated axis. The
//! motion engine and the protocol commands mutate it; nothing here decides
//! when to move.

use huber_common::config::AxisDefaults;

/// Mutable state of the single emulated axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    /// Current coordinate
    pub position: f64,
    /// Commanded destination
    pub target: f64,
    /// Speed applied on the current tick
    pub current_speed: f64,
    /// Speed a normal move starts its ramp from
    pub initial_speed: f64,
    /// Ramp ceiling, and the constant speed of fast moves
    pub high_speed: f64,
    /// Speed increment per tick
    pub acceleration: f64,
    /// Upper soft limit
    pub positive_limit: f64,
    /// Lower soft limit
    pub negative_limit: f64,
    /// Position at or beyond the upper soft limit
    pub positive_limit_tripped: bool,
    /// Position at or beyond the lower soft limit
    pub negative_limit_tripped: bool,
    /// Next move out of idle runs at high speed without a ramp
    pub fast_move_requested: bool,
    /// Position adopted after a completed reference search
    pub reference_point: f64,
    /// Reported through the status word only
    pub program_executing: bool,
    /// Closed loop (encoder feedback) enabled
    pub closed_loop: bool,
    /// Axis count reported by the controller
    pub number_axis: u32,
}

impl AxisState {
    /// Create an axis at rest at the origin.
    pub fn new(defaults: &AxisDefaults) -> Self {
        let mut axis = Self {
            position: 0.0,
            target: 0.0,
            current_speed: 0.0,
            initial_speed: defaults.initial_speed,
            high_speed: defaults.high_speed,
            acceleration: defaults.acceleration,
            positive_limit: defaults.positive_limit,
            negative_limit: defaults.negative_limit,
            positive_limit_tripped: false,
            negative_limit_tripped: false,
            fast_move_requested: false,
            reference_point: defaults.reference_point,
            program_executing: false,
            closed_loop: true,
            number_axis: defaults.number_axis,
        };
        axis.refresh_limits();
        axis
    }

    /// Recompute both tripped flags from the current position.
    pub fn refresh_limits(&mut self) {
        self.positive_limit_tripped = self.position >= self.positive_limit;
        self.negative_limit_tripped = self.position <= self.negative_limit;
    }

    /// Whether the axis rests exactly on its target.
    ///
    /// Bit-exact comparison: `approach_linear` lands on the target value
    /// itself, so no tolerance is needed for moves the engine completes.
    #[inline]
    pub fn at_target(&self) -> bool {
        self.position == self.target
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new(&AxisDefaults::default())
    }
}

/// Advance `from` toward `to` by `speed * dt` without overshooting.
///
/// When the remaining distance fits in one step the result is `to` itself,
/// which keeps the final position bit-identical to the commanded target.
pub fn approach_linear(from: f64, to: f64, speed: f64, dt: f64) -> f64 {
    let step = speed * dt;
    let distance = to - from;
    if distance.abs() <= step {
        to
    } else {
        from + distance.signum() * step
    }
}
