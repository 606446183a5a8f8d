use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// HTTP server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to {address}: {source}")]
    BindFailed {
        address: String,
        source: std::io::Error,
    },

    #[error("Server startup failed: {details}")]
    StartupFailed { details: String },
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let bind_error = RelayError::Server(ServerError::BindFailed {
            address: "localhost:8080".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        });
        assert_eq!(
            bind_error.to_string(),
            "Server error: Failed to bind to localhost:8080: address in use"
        );

        let startup_error = RelayError::Server(ServerError::StartupFailed {
            details: "missing source".to_string(),
        });
        assert_eq!(
            startup_error.to_string(),
            "Server error: Server startup failed: missing source"
        );
    }

    #[test]
    fn test_error_source_chains() {
        use std::error::Error;

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let relay_error = RelayError::Io(io_error);

        assert!(relay_error.source().is_some());
        assert_eq!(relay_error.source().unwrap().to_string(), "File not found");
    }
}
