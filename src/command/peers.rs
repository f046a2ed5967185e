//! Peer discovery for cluster fan-out.

use super::client::get_json;
use super::error::PeerListError;
use super::node::NodeAddr;
use crate::server::protocol::{PEERS_ENDPOINT, PeersResponse};

use async_trait::async_trait;

/// Supplies the peers a command fans out to.
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Peers of `own`, in a stable order, never including `own` itself.
    async fn peers(&self, own: &NodeAddr) -> Result<Vec<NodeAddr>, PeerListError>;
}

/// Fixed peer list, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPeerDirectory {
    peers: Vec<NodeAddr>,
}

impl StaticPeerDirectory {
    pub fn new(peers: Vec<NodeAddr>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl PeerDirectory for StaticPeerDirectory {
    async fn peers(&self, own: &NodeAddr) -> Result<Vec<NodeAddr>, PeerListError> {
        Ok(distinct_peers(self.peers.iter().cloned(), own))
    }
}

/// Asks the target node for the peers it knows about.
#[derive(Debug, Clone)]
pub struct HttpPeerDirectory {
    client: reqwest::Client,
}

impl HttpPeerDirectory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PeerDirectory for HttpPeerDirectory {
    async fn peers(&self, own: &NodeAddr) -> Result<Vec<NodeAddr>, PeerListError> {
        let response: PeersResponse = get_json(&self.client, &own.endpoint(PEERS_ENDPOINT)).await?;

        let peers = response
            .peers
            .iter()
            .map(|peer| NodeAddr::parse_with_scheme(peer, own.scheme))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("{} reported {} peers", own, peers.len());
        Ok(distinct_peers(peers.into_iter(), own))
    }
}

/// Drops `own` and duplicates, keeping first-seen order.
fn distinct_peers(peers: impl Iterator<Item = NodeAddr>, own: &NodeAddr) -> Vec<NodeAddr> {
    let mut distinct: Vec<NodeAddr> = Vec::new();
    for peer in peers {
        if &peer != own && !distinct.contains(&peer) {
            distinct.push(peer);
        }
    }
    distinct
}
