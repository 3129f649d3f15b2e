//! Controller status word.
//!
//! The `?s<axis>` query answers with `<axis>:<word>` where `<word>` is the
//! decimal value of this bit field. Drivers decode it arithmetically
//! (`word % 2` for "done", `(word / 8) % 2` for the high limit, ...), so bit
//! `n` carries the weight `2^n`.

use bitflags::bitflags;

bitflags! {
    /// Status bits of one axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusWord: u16 {
        /// Axis ready (stopped).
        const AXIS_READY = 1 << 0;
        /// Reference installed by a completed homing.
        const REFERENCE_INSTALLED = 1 << 1;
        /// Negative limit switch active.
        const NEGATIVE_LIMIT = 1 << 2;
        /// Positive limit switch active.
        const POSITIVE_LIMIT = 1 << 3;
        /// Program execution in progress.
        const PROGRAM_EXECUTING = 1 << 6;
        /// Controller ready (idle).
        const CONTROLLER_READY = 1 << 7;
        /// Oscillation in progress.
        const OSCILLATING = 1 << 8;
        /// Oscillation positioning error.
        const OSCILLATION_ERROR = 1 << 9;
        /// Encoder reference installed.
        const ENCODER_REFERENCE = 1 << 10;
    }
}
