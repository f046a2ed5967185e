use super::error::NodeAddrError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

impl FromStr for Scheme {
    type Err = NodeAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(NodeAddrError::Scheme(s.to_string())),
        }
    }
}

/// A cluster node reachable at `scheme://host:port`.
///
/// Equality and hashing use only `host:port`; the same node reached over a
/// different scheme is still the same peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAddr {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    /// Parses `host:port`, using `scheme` unless the input carries its own.
    pub fn parse_with_scheme(s: &str, scheme: Scheme) -> Result<Self, NodeAddrError> {
        let trimmed = s.trim().trim_end_matches('/');
        let (scheme, rest) = match trimmed.split_once("://") {
            Some((prefix, rest)) => (prefix.parse()?, rest),
            None => (scheme, trimmed),
        };

        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| NodeAddrError::Format(s.to_string()))?;
        if host.is_empty() {
            return Err(NodeAddrError::Format(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| NodeAddrError::Port(s.to_string()))?;

        Ok(Self::new(scheme, host, port))
    }

    pub fn host_and_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URL for `path` on this node, e.g. `http://host:8001/agents`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}://{}:{}/{}",
            self.scheme,
            self.host,
            self.port,
            path.trim_start_matches('/')
        )
    }
}

impl PartialEq for NodeAddr {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for NodeAddr {}

impl Hash for NodeAddr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddr {
    type Err = NodeAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_scheme(s, Scheme::default())
    }
}
