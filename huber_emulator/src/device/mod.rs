//! Motion engine.
//!
//! Models one Huber SMC axis: acceleration ramps, high speed moves, soft
//! limit tripping and reference searches, advanced in discrete ticks.

mod axis;
pub mod backdoor;
mod controller;
mod motion;
mod referencing;

pub use axis::{AxisState, approach_linear};
pub use backdoor::{PropertyValue, property_names};
pub use controller::HuberDevice;
pub use motion::MotionState;
pub use referencing::{REFERENCE_MARK, ReferenceSearch, ReferencingState};

/// Direction of a fast move or reference search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// Parse the `+`/`-` suffix used by the `fast` and `eref` commands.
    pub fn from_sign(sign: char) -> Option<Self> {
        match sign {
            '+' => Some(Self::Positive),
            '-' => Some(Self::Negative),
            _ => None,
        }
    }
}
