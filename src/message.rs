//! # Messages
//!
//! Everything the poller and the coordinator say to each other.
//!
//! Each direction has its own enum and its own channel. Both also have a
//! named wire form, `{"name": "...", "data": ...}`, so they can cross a
//! transport that only moves JSON.

use serde_json::{json, Value};

use crate::error::{CrestLoggerError, Result};
use crate::telemetry::NormalizedRecord;

/// Coordinator to poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Resolve settings and get ready to poll
    Load,
    /// Start the poll loop
    Fetch,
}

/// Poller to coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    LoadComplete,
    /// Only sent if the poll loop ever returns
    FetchComplete,
    /// Whether this poll produced a valid snapshot
    IsConnected(bool),
    /// `true` while the game is not in a loggable state
    Idle(bool),
    /// The session state changed
    New,
    Data(NormalizedRecord),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load => "load",
            Command::Fetch => "fetch",
        }
    }

    pub fn to_wire(&self) -> Value {
        wire(self.name(), Value::Null)
    }

    pub fn from_wire(message: &Value) -> Result<Self> {
        let (name, _) = split_wire(message)?;
        match name {
            "load" => Ok(Command::Load),
            "fetch" => Ok(Command::Fetch),
            other => Err(CrestLoggerError::UnknownMessage(other.to_string())),
        }
    }
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::LoadComplete => "loadcomplete",
            Event::FetchComplete => "fetchcomplete",
            Event::IsConnected(_) => "isConnected",
            Event::Idle(_) => "idle",
            Event::New => "new",
            Event::Data(_) => "data",
        }
    }

    pub fn to_wire(&self) -> Result<Value> {
        let data = match self {
            Event::IsConnected(connected) => Value::Bool(*connected),
            Event::Idle(idle) => Value::Bool(*idle),
            Event::Data(record) => serde_json::to_value(record)?,
            Event::LoadComplete | Event::FetchComplete | Event::New => Value::Null,
        };
        Ok(wire(self.name(), data))
    }

    pub fn from_wire(message: &Value) -> Result<Self> {
        let (name, data) = split_wire(message)?;
        match name {
            "loadcomplete" => Ok(Event::LoadComplete),
            "fetchcomplete" => Ok(Event::FetchComplete),
            "new" => Ok(Event::New),
            "isConnected" => bool_payload(name, data).map(Event::IsConnected),
            "idle" => bool_payload(name, data).map(Event::Idle),
            "data" => {
                let record = serde_json::from_value(data.clone()).map_err(|e| {
                    CrestLoggerError::InvalidMessage(format!("data payload: {}", e))
                })?;
                Ok(Event::Data(record))
            }
            other => Err(CrestLoggerError::UnknownMessage(other.to_string())),
        }
    }
}

fn wire(name: &str, data: Value) -> Value {
    json!({ "name": name, "data": data })
}

/// Name and payload of a wire message; a missing payload reads as `null`
fn split_wire(message: &Value) -> Result<(&str, &Value)> {
    let name = message
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CrestLoggerError::InvalidMessage(format!("no message name in {}", message))
        })?;
    Ok((name, message.get("data").unwrap_or(&Value::Null)))
}

fn bool_payload(name: &str, data: &Value) -> Result<bool> {
    data.as_bool().ok_or_else(|| {
        CrestLoggerError::InvalidMessage(format!("{} expects a boolean, got {}", name, data))
    })
}
