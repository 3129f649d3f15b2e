//! Stream interface: executes commands against the device and formats
//! replies.
//!
//! Action commands produce no reply. Queries answer `<axis>:<value>`; the
//! caller appends the `\r\n` terminator. The axis index is echoed verbatim,
//! the single emulated axis serves every index.

use super::command::{self, Command};
use crate::device::HuberDevice;
use crate::error::ProtocolError;
use tracing::debug;

/// Parse and execute one command line.
pub fn handle_line(device: &mut HuberDevice, line: &str) -> Result<Option<String>, ProtocolError> {
    let command = command::parse(line)?;
    debug!("Executing {:?}", command);
    Ok(execute(device, command))
}

/// Execute a decoded command, returning the reply for queries.
pub fn execute(device: &mut HuberDevice, command: Command) -> Option<String> {
    match command {
        Command::SetHighSpeed { speed, .. } => device.set_high_speed(speed),
        Command::FastMove { direction, .. } => device.move_fast(direction),
        Command::SetAcceleration { acceleration, .. } => device.set_acceleration(acceleration),
        Command::MoveRelative { distance, .. } => device.move_by(distance),
        Command::MoveAbsolute { position, .. } => device.goto(position),
        Command::QueryMotorPosition { axis } | Command::QueryEncoderPosition { axis } => {
            return Some(format!("{axis}:{}", format_float(device.position())));
        }
        Command::QueryStatus { axis } => {
            return Some(format!("{axis}:{}", device.status_word().bits()));
        }
        Command::Stop { .. } => {
            device.stop();
        }
        Command::SeekReference { direction, .. } => device.home_reference(direction),
        Command::SetPosition { position, .. } => device.set_position(position),
        Command::SetClosedLoop { value, .. } => device.set_closed_loop(value == 0),
    }
    None
}

/// Shortest round-trip text of `value`, always with a decimal point or an
/// exponent (`1000.0`, `0.1`, `1e16`).
///
/// Exponents carry no `+` and no zero padding (`1e16`, `1e-5`), unlike
/// `%g`-style `1e+16`/`1e-05`. Both spellings read back through `atof`.
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}
