//! Failures of the process-level plumbing: storage, sockets, logging and settings.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("database error: {message}")]
    Database { message: String },
    /// The media root for post images could not be created or opened.
    #[error("uploads directory `{}` is unusable: {source}", path.display())]
    Uploads {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot listen on {addr}: {source}")]
    Listener {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn uploads(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Uploads {
            path: path.into(),
            source,
        }
    }

    pub fn listener(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Listener { addr, source }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io;

    use super::*;

    #[test]
    fn uploads_error_names_the_directory() {
        let err = InfraError::uploads(
            "/srv/blogicum/media",
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert_eq!(
            err.to_string(),
            "uploads directory `/srv/blogicum/media` is unusable: permission denied"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn listener_error_names_the_address() {
        let addr: SocketAddr = "127.0.0.1:3001".parse().expect("addr");
        let err = InfraError::listener(addr, io::Error::from(io::ErrorKind::AddrInUse));
        assert!(err.to_string().starts_with("cannot listen on 127.0.0.1:3001: "));
    }
}
