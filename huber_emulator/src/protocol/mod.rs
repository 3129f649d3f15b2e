//! Protocol adapter.
//!
//! Fixed-grammar ASCII commands terminated by `\r`, replies terminated by
//! `\r\n`. Unrecognised or malformed lines are reported as
//! [`ProtocolError`](crate::error::ProtocolError) and never answered.

pub mod command;
mod framing;
pub mod interface;

pub use command::{Command, parse};
pub use framing::LineFramer;
pub use interface::{execute, format_float, handle_line};
