pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod relay;
pub mod session;

pub use config::{Config, CorsConfig, RelayConfig};
pub use error::ProtocolError;
pub use http::{create_router, AppState};
pub use protocol::{SessionProtocol, Transport};
pub use relay::{Relay, RelayHandle, RelayStats};
pub use session::{ConnectionId, CreateOutcome, PlaybackAction, PlaybackEvent, SessionStore};
