use thiserror::Error;

/// Failure issuing a command against one node.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PeerListError {
    #[error("could not build peer list: {0}")]
    Request(#[from] CommandError),

    #[error("could not build peer list: {0}")]
    InvalidPeer(#[from] NodeAddrError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeAddrError {
    #[error("invalid node address '{0}', expected host:port")]
    Format(String),

    #[error("invalid port in '{0}'")]
    Port(String),

    #[error("unsupported scheme '{0}'")]
    Scheme(String),
}
