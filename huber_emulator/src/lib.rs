//! # Huber Motor Emulator
//!
//! Software stand-in for a Huber SMC stepper motor controller, for testing
//! control software without hardware.
//!
//! # Module Structure
//!
//! - [`device`] - Motion engine: axis state, motion states, reference search
//! - [`protocol`] - Command grammar, line framing, reply formatting
//! - [`server`] - TCP servers for the command protocol and the backdoor
//! - [`core`] - Shared emulator context and the tick loop
//! - [`error`] - Error types
//!
//! # Architecture
//!
//! ```text
//!  client ──TCP──► StreamServer ──► protocol::handle_line ─┐
//!                                                         ▼
//!  harness ─TCP──► BackdoorServer ──────────────► EmulatorContext
//!                                                         ▲
//!                   EmulatorCore (tick loop) ─────────────┘
//! ```

#![deny(warnings)]

pub mod core;
pub mod device;
pub mod error;
pub mod protocol;
pub mod server;

pub use crate::core::{EmulatorContext, EmulatorCore, SharedContext, SimulationControl};
pub use crate::device::{Direction, HuberDevice, MotionState};
pub use crate::error::{BackdoorError, EmulatorError, ProtocolError};
pub use crate::server::{BackdoorServer, StreamServer};
