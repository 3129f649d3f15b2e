//! Backdoor property access.
//!
//! Test harnesses seed scenarios and read back state by property name
//! without going through the wire protocol. Names match the `AxisState`
//! fields; `state` and `status_word` are read-only.

use super::controller::HuberDevice;
use crate::error::BackdoorError;
use serde::{Deserialize, Serialize};

/// Property names, in the order `list` reports them.
const PROPERTIES: &[&str] = &[
    "state",
    "status_word",
    "position",
    "target",
    "current_speed",
    "initial_speed",
    "high_speed",
    "acceleration",
    "positive_limit",
    "negative_limit",
    "positive_limit_tripped",
    "negative_limit_tripped",
    "fast_move_requested",
    "reference_point",
    "referenced",
    "program_executing",
    "closed_loop",
    "number_axis",
];

/// All device property names.
pub fn property_names() -> &'static [&'static str] {
    PROPERTIES
}

/// Dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(value) => Some(value),
            Self::Integer(value) => Some(value as f64),
            _ => None,
        }
    }

    /// Boolean view; `0` and `1` are accepted for convenience.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(value) => Some(value),
            Self::Integer(0) => Some(false),
            Self::Integer(1) => Some(true),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::Integer(value) => u32::try_from(value).ok(),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

fn float(name: &str, value: &PropertyValue) -> Result<f64, BackdoorError> {
    value
        .as_f64()
        .ok_or_else(|| BackdoorError::TypeMismatch(name.to_string(), "number"))
}

fn flag(name: &str, value: &PropertyValue) -> Result<bool, BackdoorError> {
    value
        .as_bool()
        .ok_or_else(|| BackdoorError::TypeMismatch(name.to_string(), "boolean"))
}

impl HuberDevice {
    /// Read a property by name.
    pub fn get_property(&self, name: &str) -> Result<PropertyValue, BackdoorError> {
        let axis = self.axis();
        let value = match name {
            "state" => PropertyValue::Text(self.state().as_str().to_string()),
            "status_word" => PropertyValue::Integer(i64::from(self.status_word().bits())),
            "position" => axis.position.into(),
            "target" => axis.target.into(),
            "current_speed" => axis.current_speed.into(),
            "initial_speed" => axis.initial_speed.into(),
            "high_speed" => axis.high_speed.into(),
            "acceleration" => axis.acceleration.into(),
            "positive_limit" => axis.positive_limit.into(),
            "negative_limit" => axis.negative_limit.into(),
            "positive_limit_tripped" => axis.positive_limit_tripped.into(),
            "negative_limit_tripped" => axis.negative_limit_tripped.into(),
            "fast_move_requested" => axis.fast_move_requested.into(),
            "reference_point" => axis.reference_point.into(),
            "referenced" => self.is_referenced().into(),
            "program_executing" => axis.program_executing.into(),
            "closed_loop" => axis.closed_loop.into(),
            "number_axis" => PropertyValue::Integer(i64::from(axis.number_axis)),
            _ => return Err(BackdoorError::UnknownProperty(name.to_string())),
        };
        Ok(value)
    }

    /// Write a property by name.
    ///
    /// Forcing `position` or a limit recomputes the tripped flags; writing
    /// `target` behaves like a protocol target change.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), BackdoorError> {
        match name {
            "state" | "status_word" => return Err(BackdoorError::ReadOnly(name.to_string())),
            "position" => {
                let position = float(name, value)?;
                let axis = self.axis_mut();
                axis.position = position;
                axis.refresh_limits();
            }
            "target" => {
                let target = float(name, value)?;
                self.set_target(target);
            }
            "current_speed" => self.axis_mut().current_speed = float(name, value)?,
            "initial_speed" => self.axis_mut().initial_speed = float(name, value)?,
            "high_speed" => self.set_high_speed(float(name, value)?),
            "acceleration" => self.set_acceleration(float(name, value)?),
            "positive_limit" => {
                let limit = float(name, value)?;
                let axis = self.axis_mut();
                axis.positive_limit = limit;
                axis.refresh_limits();
            }
            "negative_limit" => {
                let limit = float(name, value)?;
                let axis = self.axis_mut();
                axis.negative_limit = limit;
                axis.refresh_limits();
            }
            "positive_limit_tripped" => self.axis_mut().positive_limit_tripped = flag(name, value)?,
            "negative_limit_tripped" => self.axis_mut().negative_limit_tripped = flag(name, value)?,
            "fast_move_requested" => self.axis_mut().fast_move_requested = flag(name, value)?,
            "reference_point" => self.axis_mut().reference_point = float(name, value)?,
            "referenced" => {
                let referenced = flag(name, value)?;
                self.set_referenced(referenced);
            }
            "program_executing" => self.axis_mut().program_executing = flag(name, value)?,
            "closed_loop" => self.set_closed_loop(flag(name, value)?),
            "number_axis" => {
                self.axis_mut().number_axis = value.as_u32().ok_or_else(|| {
                    BackdoorError::TypeMismatch(name.to_string(), "unsigned integer")
                })?;
            }
            _ => return Err(BackdoorError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
