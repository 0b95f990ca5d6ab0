//! Relay coordinator
//!
//! A single task owns the `SessionProtocol` and the outbound queues of every
//! live connection. Socket events and HTTP requests reach it as commands on
//! one FIFO queue, so store mutations never interleave.

mod coordinator;
mod registry;

pub use coordinator::{Relay, RelayCommand, RelayHandle, RelayStats, SessionInfo};
pub use registry::{ConnectionRegistry, Outbox};
