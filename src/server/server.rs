use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::state::RelayState;
use super::{conn, refresh};
use crate::config::RelayConfig;
use crate::error::{Result, ServerError};
use crate::source::StreamSource;

/// MJPEG relay server: one listener, one refresh scheduler, many clients.
pub struct RelayServer {
    config: RelayConfig,
    state: Arc<RelayState>,
}

impl RelayServer {
    /// Create a server consuming frames from the given source.
    pub fn new(config: RelayConfig, source: Arc<StreamSource>) -> Self {
        Self {
            config,
            state: Arc::new(RelayState::new(source)),
        }
    }

    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Shared state handle, for embedders that want to inspect the relay.
    pub fn state(&self) -> Arc<RelayState> {
        Arc::clone(&self.state)
    }

    /// Bind the listener. Bind failure is configuration-fatal.
    pub async fn bind(self) -> Result<BoundRelay> {
        let address = format!("{}:{}", self.config.server.host, self.config.server.port);

        info!("Starting MJPEG relay on {}", address);

        let listener =
            TcpListener::bind(&address)
                .await
                .map_err(|e| ServerError::BindFailed {
                    address: address.clone(),
                    source: e,
                })?;
        let local_addr = listener.local_addr()?;

        info!("MJPEG relay listening on {}", local_addr);

        Ok(BoundRelay {
            listener,
            local_addr,
            config: self.config,
            state: self.state,
        })
    }
}

/// A relay with its listener bound, ready to serve.
pub struct BoundRelay {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: RelayConfig,
    state: Arc<RelayState>,
}

impl BoundRelay {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> Arc<RelayState> {
        Arc::clone(&self.state)
    }

    /// Serve until the token is cancelled, then drain the client registry.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let refresh_task = tokio::spawn(refresh::run(
            Arc::clone(&self.state),
            self.config.refresh_interval(),
            shutdown.clone(),
        ));
        let request_timeout = self.config.timeout();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        tokio::spawn(conn::handle_connection(
                            socket,
                            peer,
                            Arc::clone(&self.state),
                            request_timeout,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => warn!("Accept failed: {}", e),
                },
            }
        }

        // Drop every client sender; connection tasks close their sockets.
        // TCP close is the goodbye, no final frame is sent.
        self.state.registry().lock().clear();
        let _ = refresh_task.await;

        info!("MJPEG relay stopped");
        Ok(())
    }
}

/// Relay server builder for configuration
pub struct RelayServerBuilder {
    config: Option<RelayConfig>,
    source: Option<Arc<StreamSource>>,
}

impl RelayServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            source: None,
        }
    }

    /// Set the relay configuration
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the shared frame source
    pub fn source(mut self, source: Arc<StreamSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the relay server
    pub fn build(self) -> Result<RelayServer> {
        let config = self.config.ok_or_else(|| ServerError::StartupFailed {
            details: "Relay configuration is required".to_string(),
        })?;

        let source = self.source.ok_or_else(|| ServerError::StartupFailed {
            details: "Stream source is required".to_string(),
        })?;

        Ok(RelayServer::new(config, source))
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
