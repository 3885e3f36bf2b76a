// src/error.rs
use std::net::IpAddr;
use std::time::Duration;

/// Failure talking to the remote control plane. Always surfaced unchanged,
/// never retried.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{operation}: transport error: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: control plane returned HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation}: undecodable response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl RemoteError {
    pub fn status(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            operation,
            status,
            body: body.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("the internal IP address for docker host {0} couldn't be found")]
    UnresolvedAddress(IpAddr),

    #[error("load balancer {id} not visible after {waited:?}")]
    ConvergenceTimeout { id: String, waited: Duration },

    #[error("directory traversal limit exceeded: {0}")]
    DirectoryLimit(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True when the caller supplied something unusable, as opposed to the
    /// control plane misbehaving.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnresolvedAddress(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
