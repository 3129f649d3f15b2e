//! Prelude module for common re-exports.
//!
//! ```rust
//! use huber_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AxisDefaults, ConfigError, ConfigLoader, EmulatorConfig, ServerConfig, SharedConfig,
    SimulationConfig,
};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::consts::{IN_TERMINATOR, MAX_COMMAND_LEN, OUT_TERMINATOR};
pub use crate::status::StatusWord;
