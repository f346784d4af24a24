//! Gateway operation codes
//!
//! Encoded on the wire as a bare integer in the frame's `op` field.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OpCode {
    /// Server event; `t` names it and `s` orders it per connection
    Dispatch,
    Heartbeat,
    Identify,
    /// First frame on every socket
    Hello,
    HeartbeatAck,
}

const WIRE: [(OpCode, u8); 5] = [
    (OpCode::Dispatch, 0),
    (OpCode::Heartbeat, 1),
    (OpCode::Identify, 2),
    (OpCode::Hello, 10),
    (OpCode::HeartbeatAck, 11),
];

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        WIRE.iter()
            .find_map(|&(known, value)| (known == op).then_some(value))
            .unwrap_or_default()
    }
}

impl TryFrom<u8> for OpCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        WIRE.iter()
            .find_map(|&(op, known)| (known == value).then_some(op))
            .ok_or_else(|| format!("unknown op code {value}"))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}={}", u8::from(*self))
    }
}
