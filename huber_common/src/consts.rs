//! Protocol and emulator constants.

/// Canonical service name (used for logging when none is configured).
pub const SERVICE_NAME: &str = "huber";

/// Terminator of incoming command lines.
pub const IN_TERMINATOR: u8 = b'\r';

/// Terminator appended to every reply line.
pub const OUT_TERMINATOR: &str = "\r\n";

/// Terminator of backdoor JSON requests and replies.
pub const BACKDOOR_TERMINATOR: u8 = b'\n';

/// Longest command line accepted by the stream interface, in bytes.
pub const MAX_COMMAND_LEN: usize = 128;

/// Default bind address for both servers.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default port of the wire protocol.
pub const DEFAULT_PORT: u16 = 9999;

/// Default port of the backdoor.
pub const DEFAULT_BACKDOOR_PORT: u16 = 10000;

/// Default tick period in microseconds (0.1 s).
pub const DEFAULT_CYCLE_TIME_US: u32 = 100_000;

/// Default initial (ramp start) speed.
pub const DEFAULT_INITIAL_SPEED: f64 = 2.0;

/// Default high (ceiling) speed.
pub const DEFAULT_HIGH_SPEED: f64 = 5.0;

/// Default acceleration per tick.
pub const DEFAULT_ACCELERATION: f64 = 1.0;

/// Default soft limit magnitude, `2^63 - 1` like an unbounded controller.
pub const DEFAULT_LIMIT: f64 = i64::MAX as f64;

/// Number of axes the emulated controller reports.
pub const DEFAULT_NUMBER_AXIS: u32 = 3;
