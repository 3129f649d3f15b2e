//! Command grammar.
//!
//! Every command is a literal prefix, an axis index, and an optional
//! argument whose shape depends on the command:
//!
//! | Command    | Pattern                 |
//! |------------|-------------------------|
//! | ffast      | `ffast<axis>:<float>`   |
//! | fast       | `fast<axis><+/->`       |
//! | acc        | `acc<axis>:<float>`     |
//! | move       | `move<axis>:<float>`    |
//! | goto       | `goto<axis>:<float>`    |
//! | ?p         | `?p<axis>`              |
//! | ?e         | `?e<axis>`              |
//! | ?s         | `?s<axis>`              |
//! | q          | `q<axis>`               |
//! | eref       | `eref<axis><+/->`       |
//! | pos        | `pos<axis>:<float>`     |
//! | ecl        | `ecl<axis>:<int>`       |
//!
//! Patterns are tried top to bottom and the first full match wins.

use crate::device::Direction;
use crate::error::ProtocolError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A decoded protocol command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetHighSpeed { axis: u32, speed: f64 },
    FastMove { axis: u32, direction: Direction },
    SetAcceleration { axis: u32, acceleration: f64 },
    MoveRelative { axis: u32, distance: f64 },
    MoveAbsolute { axis: u32, position: f64 },
    QueryMotorPosition { axis: u32 },
    QueryEncoderPosition { axis: u32 },
    QueryStatus { axis: u32 },
    Stop { axis: u32 },
    SeekReference { axis: u32, direction: Direction },
    SetPosition { axis: u32, position: f64 },
    /// `ecl<axis>:0` closes the loop, any other value opens it.
    SetClosedLoop { axis: u32, value: i64 },
}

impl Command {
    /// Axis index the command addresses.
    pub fn axis(&self) -> u32 {
        match *self {
            Self::SetHighSpeed { axis, .. }
            | Self::FastMove { axis, .. }
            | Self::SetAcceleration { axis, .. }
            | Self::MoveRelative { axis, .. }
            | Self::MoveAbsolute { axis, .. }
            | Self::QueryMotorPosition { axis }
            | Self::QueryEncoderPosition { axis }
            | Self::QueryStatus { axis }
            | Self::Stop { axis }
            | Self::SeekReference { axis, .. }
            | Self::SetPosition { axis, .. }
            | Self::SetClosedLoop { axis, .. } => axis,
        }
    }
}

/// Argument shape of a pattern, carrying the constructor for that shape.
#[derive(Clone, Copy)]
enum Builder {
    Bare(fn(u32) -> Command),
    Float(fn(u32, f64) -> Command),
    Integer(fn(u32, i64) -> Command),
    Sign(fn(u32, Direction) -> Command),
}

struct CommandPattern {
    prefix: &'static str,
    builder: Builder,
}

/// Registered commands, in match order. `ffast` precedes `fast`.
const COMMANDS: &[CommandPattern] = &[
    CommandPattern {
        prefix: "ffast",
        builder: Builder::Float(|axis, speed| Command::SetHighSpeed { axis, speed }),
    },
    CommandPattern {
        prefix: "fast",
        builder: Builder::Sign(|axis, direction| Command::FastMove { axis, direction }),
    },
    CommandPattern {
        prefix: "acc",
        builder: Builder::Float(|axis, acceleration| Command::SetAcceleration {
            axis,
            acceleration,
        }),
    },
    CommandPattern {
        prefix: "move",
        builder: Builder::Float(|axis, distance| Command::MoveRelative { axis, distance }),
    },
    CommandPattern {
        prefix: "goto",
        builder: Builder::Float(|axis, position| Command::MoveAbsolute { axis, position }),
    },
    CommandPattern {
        prefix: "?p",
        builder: Builder::Bare(|axis| Command::QueryMotorPosition { axis }),
    },
    CommandPattern {
        prefix: "?e",
        builder: Builder::Bare(|axis| Command::QueryEncoderPosition { axis }),
    },
    CommandPattern {
        prefix: "?s",
        builder: Builder::Bare(|axis| Command::QueryStatus { axis }),
    },
    CommandPattern {
        prefix: "q",
        builder: Builder::Bare(|axis| Command::Stop { axis }),
    },
    CommandPattern {
        prefix: "eref",
        builder: Builder::Sign(|axis, direction| Command::SeekReference { axis, direction }),
    },
    CommandPattern {
        prefix: "pos",
        builder: Builder::Float(|axis, position| Command::SetPosition { axis, position }),
    },
    CommandPattern {
        prefix: "ecl",
        builder: Builder::Integer(|axis, value| Command::SetClosedLoop { axis, value }),
    },
];

/// Argument patterns, each a single capture group following the axis.
const FLOAT_ARGUMENT: &str = r":([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)";
const INTEGER_ARGUMENT: &str = r":([+-]?[0-9]+)";
const SIGN_ARGUMENT: &str = r"([+-])";

/// Compiled full-line matchers, index-aligned with [`COMMANDS`].
static MATCHERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    COMMANDS
        .iter()
        .map(|pattern| Regex::new(&pattern.regex()).expect("Invalid command regex"))
        .collect()
});

impl CommandPattern {
    /// `^<prefix><axis><argument>$`
    fn regex(&self) -> String {
        let argument = match self.builder {
            Builder::Bare(_) => "",
            Builder::Float(_) => FLOAT_ARGUMENT,
            Builder::Integer(_) => INTEGER_ARGUMENT,
            Builder::Sign(_) => SIGN_ARGUMENT,
        };
        format!("^{}([0-9]+){}$", regex::escape(self.prefix), argument)
    }

    /// Build the command from a full-line match, or `None` if a value does
    /// not convert (axis overflow, non-finite float).
    fn decode(&self, captures: &Captures<'_>) -> Option<Command> {
        let axis = captures.get(1)?.as_str().parse().ok()?;
        let argument = captures.get(2).map(|m| m.as_str());
        match self.builder {
            Builder::Bare(build) => Some(build(axis)),
            Builder::Float(build) => parse_float(argument?).map(|v| build(axis, v)),
            Builder::Integer(build) => argument?.parse().ok().map(|v| build(axis, v)),
            Builder::Sign(build) => {
                let sign = argument?.chars().next()?;
                Direction::from_sign(sign).map(|direction| build(axis, direction))
            }
        }
    }
}

/// Parse one command line (without terminator).
pub fn parse(line: &str) -> Result<Command, ProtocolError> {
    let mut malformed = None;
    for (pattern, matcher) in COMMANDS.iter().zip(MATCHERS.iter()) {
        if !line.starts_with(pattern.prefix) {
            continue;
        }
        match matcher
            .captures(line)
            .and_then(|captures| pattern.decode(&captures))
        {
            Some(command) => return Ok(command),
            None => {
                malformed.get_or_insert(pattern.prefix);
            }
        }
    }

    Err(match malformed {
        Some(command) => ProtocolError::MalformedArguments {
            command,
            line: line.to_string(),
        },
        None => ProtocolError::UnknownCommand(line.to_string()),
    })
}

/// Convert a float argument the grammar already accepted. Values that
/// overflow to infinity are rejected.
fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|value| value.is_finite())
}
