mod conn;
mod handlers;
mod push;
mod refresh;
mod registry;
mod server;
mod state;

pub use push::BOUNDARY;
pub use registry::ClientRegistry;
pub use server::{BoundRelay, RelayServer, RelayServerBuilder};
pub use state::{FrameSnapshot, RelayState};
