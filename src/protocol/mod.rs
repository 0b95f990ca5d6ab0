//! Real-time session protocol
//!
//! Maps connection lifecycle and client messages onto `SessionStore`
//! operations and room broadcasts:
//! - `joinSession` - join a session and receive its playback snapshot
//! - `videoControl` - relay play/pause/seek to the other members
//! - disconnect - leave every joined session
//!
//! Delivery is abstracted behind the `Transport` trait.

mod handler;
pub mod messages;
mod transport;

pub use handler::SessionProtocol;
pub use messages::{
    AckFrame, ClientFrame, ClientMessage, JoinReply, JoinSnapshot, MembershipUpdate, RelayedControl,
    ServerEvent, VideoControl,
};
pub use transport::Transport;
