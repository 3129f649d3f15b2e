//! Huber Common Library
//!
//! Shared constants, configuration loading and the controller status word
//! used by the Huber SMC axis emulator.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and emulator configuration
//! - [`consts`] - Protocol terminators, default ports and axis defaults
//! - [`status`] - Status word reported by the `?s` query
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use huber_common::prelude::*;
//!
//! let config = EmulatorConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod status;
