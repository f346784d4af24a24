//! Gateway message format

use super::{CloseCode, GatewayEventType, HelloPayload, IdentifyPayload, OpCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One frame on the socket, in either direction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: OpCode,

    /// Event name (dispatch only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Per-connection sequence number (dispatch only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    #[must_use]
    pub fn dispatch(event: GatewayEventType, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    /// Parse the Identify payload (op=2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// The dispatch event this frame carries, if it is a known one
    pub fn event(&self) -> Option<GatewayEventType> {
        self.t.as_deref().and_then(GatewayEventType::from_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Code and reason for a close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, &'static str) {
        (code.as_u16(), code.reason())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.t, self.s) {
            (Some(t), Some(s)) => write!(f, "GatewayMessage(op={}, t={t}, s={s})", self.op),
            (Some(t), None) => write!(f, "GatewayMessage(op={}, t={t})", self.op),
            _ => write!(f, "GatewayMessage(op={})", self.op),
        }
    }
}
