//! Error types for the emulator.
//!
//! The motion engine never fails. Errors only arise at the edges: malformed
//! protocol lines, bad backdoor requests, and startup (config, sockets,
//! signal handler).

use huber_common::config::ConfigError;
use thiserror::Error;

/// Error raised while decoding a wire protocol line.
///
/// Logged by the stream server; the connection stays open and no reply is
/// sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// No registered command pattern matches the line.
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    /// A command prefix matched but its arguments did not.
    #[error("Malformed arguments for {command}: {line:?}")]
    MalformedArguments {
        /// Name of the matched command
        command: &'static str,
        /// Offending line
        line: String,
    },

    /// The line exceeded the framing buffer and was discarded.
    #[error("Command line longer than {limit} bytes")]
    LineTooLong {
        /// Buffer capacity in bytes
        limit: usize,
    },

    /// The line is not valid ASCII/UTF-8.
    #[error("Command line is not valid text")]
    InvalidEncoding,
}

/// Error raised by a backdoor request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackdoorError {
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Property is read-only: {0}")]
    ReadOnly(String),

    /// Value has the wrong type (property, expected type).
    #[error("Property {0} expects a {1}")]
    TypeMismatch(String, &'static str),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

/// Error raised while starting or running the emulator process.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// A server thread panicked.
    #[error("Thread {0} terminated abnormally")]
    ThreadPanicked(&'static str),
}
