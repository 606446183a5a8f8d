// Core building blocks
pub mod config;
pub mod error;
pub mod frame;
pub mod source;

// HTTP serving core
pub mod server;

// Re-export common types at the crate root
pub use config::{RelayConfig, ServerConfig, StreamConfig};
pub use error::{RelayError, Result, ServerError};
pub use frame::{ExposedFrame, BLANK_HEIGHT, BLANK_JPEG, BLANK_WIDTH};
pub use server::{BoundRelay, RelayServer, RelayServerBuilder, RelayState, BOUNDARY};
pub use source::{ConsumeOutcome, StreamSource};
