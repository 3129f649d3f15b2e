//! Emulator context and tick loop.
//!
//! `EmulatorContext` is the single shared object: the device plus the
//! simulation controls. The servers and the tick loop each hold an
//! `Arc<Mutex<EmulatorContext>>`, so command handling and tick evaluation
//! never interleave.

use crate::device::{HuberDevice, PropertyValue, property_names};
use crate::error::BackdoorError;
use huber_common::config::EmulatorConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Prefix of simulation properties on the backdoor.
const SIMULATION_PREFIX: &str = "simulation.";

/// Runtime simulation controls.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationControl {
    /// Multiplier applied to the elapsed time of each tick
    pub speed: f64,
    /// Ticks are skipped while paused
    pub paused: bool,
}

impl Default for SimulationControl {
    fn default() -> Self {
        Self {
            speed: 1.0,
            paused: false,
        }
    }
}

/// Device and simulation state shared by the servers and the tick loop.
#[derive(Debug, Clone, Default)]
pub struct EmulatorContext {
    pub device: HuberDevice,
    pub simulation: SimulationControl,
}

/// Shared handle to the context.
pub type SharedContext = Arc<Mutex<EmulatorContext>>;

impl EmulatorContext {
    /// Build the initial context from configuration.
    pub fn from_config(config: &EmulatorConfig) -> Self {
        Self {
            device: HuberDevice::new(&config.axis),
            simulation: SimulationControl {
                speed: config.simulation.speed,
                paused: false,
            },
        }
    }

    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    /// Advance the device by `dt` wall-clock seconds, honouring pause and
    /// speed.
    pub fn tick(&mut self, dt: f64) {
        if !self.simulation.paused {
            self.device.tick(dt * self.simulation.speed);
        }
    }

    /// Names reachable through [`get_property`](Self::get_property).
    pub fn property_names() -> Vec<String> {
        property_names()
            .iter()
            .map(|name| name.to_string())
            .chain(["speed", "paused"].map(|name| format!("{SIMULATION_PREFIX}{name}")))
            .collect()
    }

    /// Read a device or `simulation.*` property.
    pub fn get_property(&self, name: &str) -> Result<PropertyValue, BackdoorError> {
        match name.strip_prefix(SIMULATION_PREFIX) {
            Some("speed") => Ok(self.simulation.speed.into()),
            Some("paused") => Ok(self.simulation.paused.into()),
            Some(_) => Err(BackdoorError::UnknownProperty(name.to_string())),
            None => self.device.get_property(name),
        }
    }

    /// Write a device or `simulation.*` property.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), BackdoorError> {
        match name.strip_prefix(SIMULATION_PREFIX) {
            Some("speed") => {
                self.simulation.speed = value
                    .as_f64()
                    .ok_or_else(|| BackdoorError::TypeMismatch(name.to_string(), "number"))?;
                Ok(())
            }
            Some("paused") => {
                self.simulation.paused = value
                    .as_bool()
                    .ok_or_else(|| BackdoorError::TypeMismatch(name.to_string(), "boolean"))?;
                Ok(())
            }
            Some(_) => Err(BackdoorError::UnknownProperty(name.to_string())),
            None => self.device.set_property(name, value),
        }
    }
}

/// Lock the shared context.
///
/// A panic in another holder cannot leave the context half-updated in a way
/// that matters to an emulator, so a poisoned lock is recovered.
pub fn lock_context(context: &SharedContext) -> MutexGuard<'_, EmulatorContext> {
    context.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Timing statistics for tick loop monitoring.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimingStats {
    /// Number of ticks executed
    pub cycle_count: u64,
    /// Ticks whose processing exceeded the cycle time
    pub timing_violations: u64,
    /// Longest observed tick processing time
    pub max_cycle_time_us: u64,
}

/// Drives the device at a fixed cadence.
pub struct EmulatorCore {
    context: SharedContext,
    running: Arc<AtomicBool>,
    cycle_time: Duration,
    stats: TimingStats,
}

impl EmulatorCore {
    pub fn new(context: SharedContext, cycle_time: Duration) -> Self {
        Self {
            context,
            running: Arc::new(AtomicBool::new(true)),
            cycle_time,
            stats: TimingStats::default(),
        }
    }

    /// Perform one tick of `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        lock_context(&self.context).tick(dt);
        self.stats.cycle_count += 1;
    }

    /// Run the tick loop until [`shutdown`](Self::shutdown) or the running
    /// flag is cleared. The flag starts out set, so servers sharing it can be
    /// started before the loop.
    pub fn run(&mut self) {
        info!(
            "Starting tick loop (cycle_time={}us)",
            self.cycle_time.as_micros()
        );

        let mut last_cycle = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let dt = cycle_start.duration_since(last_cycle);
            last_cycle = cycle_start;

            self.step(dt.as_secs_f64());

            let elapsed = cycle_start.elapsed();
            let cycle_time_us = elapsed.as_micros() as u64;
            self.stats.max_cycle_time_us = self.stats.max_cycle_time_us.max(cycle_time_us);

            if elapsed > self.cycle_time {
                self.stats.timing_violations += 1;
                if self.stats.timing_violations <= 10 || self.stats.timing_violations % 1000 == 0 {
                    warn!(
                        "Timing violation #{}: tick took {}us (target {}us)",
                        self.stats.timing_violations,
                        cycle_time_us,
                        self.cycle_time.as_micros()
                    );
                }
            } else {
                std::thread::sleep(self.cycle_time - elapsed);
            }

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    "Tick loop: {} cycles, max={}us, violations={}",
                    self.stats.cycle_count,
                    self.stats.max_cycle_time_us,
                    self.stats.timing_violations
                );
            }
        }

        info!(
            "Tick loop stopped after {} cycles (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
    }

    /// Request the loop to stop.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Running flag, shared with signal handlers and servers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn context(&self) -> SharedContext {
        Arc::clone(&self.context)
    }

    pub fn stats(&self) -> TimingStats {
        self.stats
    }
}
