//! Close codes the gateway ends a socket with

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    UnknownError,
    /// Op code the client may not send
    UnknownOpcode,
    /// Not JSON, wrong shape, or a binary frame
    DecodeError,
    /// No Identify within the heartbeat interval
    NotAuthenticated,
    /// Token invalid, expired or pointing at a missing user
    AuthenticationFailed,
    AlreadyAuthenticated,
    /// Heartbeat window missed
    SessionTimeout,
}

impl CloseCode {
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::UnknownError => 4000,
            Self::UnknownOpcode => 4001,
            Self::DecodeError => 4002,
            Self::NotAuthenticated => 4003,
            Self::AuthenticationFailed => 4004,
            Self::AlreadyAuthenticated => 4005,
            Self::SessionTimeout => 4009,
        }
    }

    /// Reason text for the close frame
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::UnknownError => "unknown error",
            Self::UnknownOpcode => "op code not allowed",
            Self::DecodeError => "could not decode frame",
            Self::NotAuthenticated => "identify first",
            Self::AuthenticationFailed => "authentication failed",
            Self::AlreadyAuthenticated => "already identified",
            Self::SessionTimeout => "heartbeat timed out",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}
