//! Application error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors raised while starting or running the service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] ProviderError),

    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("HTTP server error: {0}")]
    Serve(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AppError::Bind {
            addr: "127.0.0.1:80".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to bind 127.0.0.1:80: denied");

        let err = AppError::HttpClient(ProviderError::HttpClient("no tls".to_string()));
        assert!(err.to_string().starts_with("Failed to create HTTP client"));
    }
}
