//! Emulated Huber SMC axis controller.
//!
//! `HuberDevice` combines the axis record, the motion state machine and the
//! reference search, and exposes the operations the protocol adapter calls.
//! None of the operations validate their arguments: nonsensical values such
//! as a negative acceleration simply produce degenerate motion.

use super::Direction;
use super::axis::AxisState;
use super::motion::MotionState;
use super::referencing::{REFERENCE_MARK, ReferenceSearch};
use huber_common::config::AxisDefaults;
use huber_common::status::StatusWord;
use tracing::{debug, info};

/// Single-axis controller emulator.
#[derive(Debug, Clone)]
pub struct HuberDevice {
    axis: AxisState,
    state: MotionState,
    referencing: ReferenceSearch,
}

impl HuberDevice {
    /// Create a device at rest at the origin.
    pub fn new(defaults: &AxisDefaults) -> Self {
        Self {
            axis: AxisState::new(defaults),
            state: MotionState::Idle,
            referencing: ReferenceSearch::new(),
        }
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// The first satisfied transition fires (exit, then entry), after which
    /// the active state is evaluated within the same tick.
    pub fn tick(&mut self, dt: f64) {
        if let Some(next) = self.state.next(&self.axis) {
            debug!("Motion state {} -> {}", self.state, next);
            self.state.on_exit(&mut self.axis);
            self.state = next;
            self.state.on_entry(&mut self.axis);
        }

        self.state.in_state(&mut self.axis, dt);

        let idle = self.state == MotionState::Idle;
        if self.referencing.update(idle, self.axis.position) {
            self.on_referencing_complete();
        }
    }

    /// Adopt the reference point as the coordinate of the reference mark.
    fn on_referencing_complete(&mut self) {
        let reference_point = self.axis.reference_point;
        self.axis.position = reference_point;
        self.axis.target = reference_point;
        self.axis.fast_move_requested = false;
        self.axis.refresh_limits();
        info!(
            "Reference search complete, position set to reference point {}",
            reference_point
        );
    }

    /// Set the commanded destination. An active reference search is
    /// abandoned.
    pub fn set_target(&mut self, target: f64) {
        self.referencing.abort();
        self.axis.target = target;
    }

    pub fn set_high_speed(&mut self, speed: f64) {
        self.axis.high_speed = speed;
    }

    pub fn set_acceleration(&mut self, acceleration: f64) {
        self.axis.acceleration = acceleration;
    }

    /// Stop at the current position. Returns `(target, position)`.
    ///
    /// The engine reports idle on the next tick.
    pub fn stop(&mut self) -> (f64, f64) {
        self.referencing.abort();
        self.axis.target = self.axis.position;
        info!("Stopping movement after user request.");
        (self.axis.target, self.axis.position)
    }

    /// Normal move relative to the current position.
    pub fn move_by(&mut self, distance: f64) {
        self.axis.fast_move_requested = false;
        self.set_target(self.axis.position + distance);
    }

    /// Normal move to an absolute position.
    pub fn goto(&mut self, position: f64) {
        self.axis.fast_move_requested = false;
        self.set_target(position);
    }

    /// High speed move to the soft limit in `direction`.
    pub fn move_fast(&mut self, direction: Direction) {
        self.axis.fast_move_requested = true;
        let limit = match direction {
            Direction::Positive => self.axis.positive_limit,
            Direction::Negative => self.axis.negative_limit,
        };
        self.set_target(limit);
    }

    /// Start a high speed search for the reference mark.
    pub fn home_reference(&mut self, direction: Direction) {
        self.axis.fast_move_requested = true;
        self.referencing.start(direction);
        self.axis.target = REFERENCE_MARK;
    }

    /// Redefine the current coordinate without moving. Like any new target,
    /// this abandons an active reference search.
    pub fn set_position(&mut self, position: f64) {
        self.axis.position = position;
        self.set_target(position);
        self.axis.refresh_limits();
    }

    pub fn set_closed_loop(&mut self, closed_loop: bool) {
        self.axis.closed_loop = closed_loop;
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.axis.position
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.axis.target
    }

    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[inline]
    pub fn axis(&self) -> &AxisState {
        &self.axis
    }

    /// Direct access for backdoor property injection.
    #[inline]
    pub fn axis_mut(&mut self) -> &mut AxisState {
        &mut self.axis
    }

    #[inline]
    pub fn is_referenced(&self) -> bool {
        self.referencing.is_referenced()
    }

    pub fn set_referenced(&mut self, referenced: bool) {
        self.referencing.set_referenced(referenced);
    }

    /// Build the status word reported by `?s`.
    pub fn status_word(&self) -> StatusWord {
        let idle = self.state == MotionState::Idle;
        let mut word = StatusWord::ENCODER_REFERENCE;
        word.set(StatusWord::AXIS_READY, idle);
        word.set(StatusWord::CONTROLLER_READY, idle);
        word.set(StatusWord::REFERENCE_INSTALLED, self.is_referenced());
        word.set(StatusWord::NEGATIVE_LIMIT, self.axis.negative_limit_tripped);
        word.set(StatusWord::POSITIVE_LIMIT, self.axis.positive_limit_tripped);
        word.set(StatusWord::PROGRAM_EXECUTING, self.axis.program_executing);
        word
    }
}

impl Default for HuberDevice {
    fn default() -> Self {
        Self::new(&AxisDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_device() -> HuberDevice {
        let defaults = AxisDefaults {
            initial_speed: 2.0,
            high_speed: 5.0,
            acceleration: 1.0,
            positive_limit: 1000.0,
            negative_limit: -1000.0,
            ..Default::default()
        };
        HuberDevice::new(&defaults)
    }

    fn tick_until_idle(device: &mut HuberDevice, max_ticks: usize) -> usize {
        for n in 1..=max_ticks {
            device.tick(1.0);
            if device.state() == MotionState::Idle && device.position() == device.target() {
                return n;
            }
        }
        panic!("axis still moving after {max_ticks} ticks");
    }

    #[test]
    fn test_speed_ramp_follows_acceleration() {
        let mut device = make_device();
        device.goto(10_000.0);

        for k in 1..=6 {
            device.tick(1.0);
            assert_eq!(device.state(), MotionState::Moving);
            let expected = (2.0 + k as f64).min(5.0);
            assert_eq!(device.axis().current_speed, expected, "tick {k}");
        }
    }

    #[test]
    fn test_motion_is_monotonic_without_overshoot() {
        let mut device = make_device();
        device.goto(-37.25);

        let mut last = device.position();
        while device.state() != MotionState::Idle || device.position() != device.target() {
            device.tick(1.0);
            assert!(device.position() <= last);
            assert!(device.position() >= -37.25);
            last = device.position();
        }
        assert_eq!(device.position(), -37.25);
    }

    #[test]
    fn test_goto_lands_exactly() {
        let mut device = make_device();
        device.goto(100.0);
        tick_until_idle(&mut device, 100);
        assert_eq!(device.position(), 100.0);
        assert_eq!(device.axis().current_speed, 0.0);
    }

    #[test]
    fn test_move_by_is_relative() {
        let mut device = make_device();
        device.set_position(40.0);
        device.move_by(-15.5);
        assert_eq!(device.target(), 24.5);
        tick_until_idle(&mut device, 100);
        assert_eq!(device.position(), 24.5);
    }

    #[test]
    fn test_stop_then_one_tick_is_idle() {
        let mut device = make_device();
        device.goto(500.0);
        for _ in 0..5 {
            device.tick(1.0);
        }
        let (target, position) = device.stop();
        assert_eq!(target, position);

        device.tick(1.0);
        assert_eq!(device.state(), MotionState::Idle);
        assert_eq!(device.position(), position);
        assert_eq!(device.axis().current_speed, 0.0);
    }

    #[test]
    fn test_fast_move_enters_at_high_speed() {
        let mut device = make_device();
        device.set_high_speed(10.0);
        device.move_fast(Direction::Positive);

        device.tick(1.0);
        assert_eq!(device.state(), MotionState::HighSpeedMoving);
        assert_eq!(device.axis().current_speed, 10.0);
        assert_eq!(device.position(), 10.0);

        tick_until_idle(&mut device, 200);
        assert_eq!(device.position(), 1000.0);
        assert!(device.axis().positive_limit_tripped);
        assert!(device.status_word().contains(StatusWord::POSITIVE_LIMIT));
    }

    #[test]
    fn test_goto_clears_fast_request() {
        let mut device = make_device();
        device.move_fast(Direction::Negative);
        device.goto(3.0);
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::Moving);
    }

    #[test]
    fn test_limit_pins_axis_until_target_retreats() {
        let mut device = make_device();
        device.axis_mut().positive_limit = 100.0;
        device.goto(100.0);
        tick_until_idle(&mut device, 100);
        assert!(device.axis().positive_limit_tripped);

        device.goto(150.0);
        for _ in 0..3 {
            device.tick(1.0);
            assert_eq!(device.position(), 100.0);
        }
        assert_eq!(device.state(), MotionState::Idle);

        device.goto(90.0);
        tick_until_idle(&mut device, 100);
        assert_eq!(device.position(), 90.0);
        assert!(!device.axis().positive_limit_tripped);
    }

    #[test]
    fn test_negative_limit_trips() {
        let mut device = make_device();
        device.axis_mut().negative_limit = -100.0;
        device.goto(-100.0);
        tick_until_idle(&mut device, 100);
        assert!(device.axis().negative_limit_tripped);
        assert!(device.status_word().contains(StatusWord::NEGATIVE_LIMIT));

        device.goto(-120.0);
        device.tick(1.0);
        device.tick(1.0);
        assert_eq!(device.position(), -100.0);
    }

    #[test]
    fn test_overshooting_limit_stops_past_it() {
        let mut device = make_device();
        device.axis_mut().positive_limit = 100.0;
        device.goto(2000.0);
        tick_until_idle(&mut device, 200);
        assert!(device.position() >= 100.0);
        assert!(device.position() < 106.0);
        assert!(device.axis().positive_limit_tripped);
    }

    #[test]
    fn test_homing_sequence_adopts_reference_point() {
        let mut device = make_device();
        device.axis_mut().reference_point = -42.0;
        device.set_high_speed(50.0);

        device.move_fast(Direction::Positive);
        tick_until_idle(&mut device, 100);
        assert_eq!(device.position(), 1000.0);

        device.home_reference(Direction::Negative);
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::HighSpeedMoving);
        assert!(!device.status_word().contains(StatusWord::REFERENCE_INSTALLED));

        tick_until_idle(&mut device, 100);
        assert_eq!(device.position(), -42.0);
        assert_eq!(device.target(), -42.0);
        assert!(device.is_referenced());
        assert!(!device.axis().fast_move_requested);
        assert!(device.status_word().contains(StatusWord::REFERENCE_INSTALLED));

        device.set_position(0.0);
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::Idle);
        assert_eq!(device.position(), 0.0);
    }

    #[test]
    fn test_set_position_abandons_homing() {
        let mut device = make_device();
        device.axis_mut().reference_point = -42.0;
        device.set_position(300.0);
        device.home_reference(Direction::Negative);
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::HighSpeedMoving);

        device.set_position(0.0);
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::Idle);
        assert_eq!(device.position(), 0.0);
        assert!(!device.is_referenced());

        device.tick(1.0);
        assert_eq!(device.position(), 0.0);
    }

    #[test]
    fn test_set_target_abandons_homing() {
        let mut device = make_device();
        device.axis_mut().reference_point = 9.0;
        device.set_position(20.0);
        device.home_reference(Direction::Negative);
        device.set_target(0.0);
        tick_until_idle(&mut device, 100);
        assert_eq!(device.position(), 0.0);
        assert!(!device.is_referenced());
    }

    #[test]
    fn test_fast_move_negative_lands_on_limit() {
        let mut device = make_device();
        device.set_high_speed(7.0);
        device.set_position(3.5);
        device.move_fast(Direction::Negative);
        assert_eq!(device.target(), -1000.0);

        tick_until_idle(&mut device, 300);
        assert_eq!(device.position(), -1000.0);
        assert!(device.axis().negative_limit_tripped);
        assert!(!device.axis().positive_limit_tripped);
        assert!(device.status_word().contains(StatusWord::NEGATIVE_LIMIT));
    }

    #[test]
    fn test_homing_at_mark_completes_on_next_tick() {
        let mut device = make_device();
        device.axis_mut().reference_point = 7.0;
        device.home_reference(Direction::Positive);
        device.tick(1.0);
        assert!(device.is_referenced());
        assert_eq!(device.position(), 7.0);
    }

    #[test]
    fn test_stop_aborts_homing() {
        let mut device = make_device();
        device.set_position(300.0);
        device.home_reference(Direction::Negative);
        device.tick(1.0);
        device.stop();
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::Idle);
        assert!(!device.is_referenced());
        assert_ne!(device.position(), 0.0);
    }

    #[test]
    fn test_status_word_values() {
        let mut device = make_device();
        assert_eq!(device.status_word().bits(), 1153);

        device.goto(50.0);
        device.tick(1.0);
        assert_eq!(device.status_word().bits(), 1024);

        device.axis_mut().program_executing = true;
        assert!(device.status_word().contains(StatusWord::PROGRAM_EXECUTING));
    }

    #[test]
    fn test_degenerate_values_are_accepted() {
        let mut device = make_device();
        device.set_acceleration(-1.0);
        device.set_high_speed(0.0);
        device.goto(10.0);
        device.tick(1.0);
        device.tick(1.0);
        assert_eq!(device.state(), MotionState::Moving);
    }
}
