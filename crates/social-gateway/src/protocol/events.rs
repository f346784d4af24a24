//! Dispatch event names

use std::fmt;

/// Names carried in the `t` field of dispatch frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    /// Sent once after a successful Identify
    Ready,
    /// The full set of online user ids, sent on every presence transition
    OnlineUsers,
}

impl GatewayEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::OnlineUsers => "ONLINE_USERS",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "READY" => Some(Self::Ready),
            "ONLINE_USERS" => Some(Self::OnlineUsers),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GatewayEventType> for String {
    fn from(event: GatewayEventType) -> Self {
        event.as_str().to_string()
    }
}
