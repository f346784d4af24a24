//! Gateway wire protocol
//!
//! JSON frames of the form `{ "op": u8, "d": any, "s": u64?, "t": string? }`.

mod close_codes;
mod events;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use events::GatewayEventType;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{HelloPayload, IdentifyPayload, OnlineUsersPayload, ReadyPayload};
