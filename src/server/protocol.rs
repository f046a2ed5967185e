//! Network Protocol Definitions
//!
//! Endpoint paths served by every node and the DTOs exchanged on them.

use crate::agents::types::AgentSnapshot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AGENTS_ENDPOINT: &str = "/agents";
pub const PEERS_ENDPOINT: &str = "/peers";
pub const PAUSE_ENDPOINT: &str = "/pause";
pub const UNPAUSE_ENDPOINT: &str = "/unpause";
pub const SHUTDOWN_ENDPOINT: &str = "/shutdown";
pub const SUBMIT_ENDPOINT: &str = "/submit";

pub const PAUSED_MESSAGE: &str = "server paused";
pub const UNPAUSED_MESSAGE: &str = "server unpaused";
pub const SHUTDOWN_MESSAGE: &str = "Shutdown initiated. Come again soon!";

pub const PAUSE_ERROR: &str = "error trying to pause";
pub const UNPAUSE_ERROR: &str = "error trying to unpause";
pub const SHUTDOWN_ERROR: &str = "Error trying to initiate shutdown";

/// Agent listing keyed by node `host:port`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentsResponse {
    pub nodes: BTreeMap<String, Vec<AgentSnapshot>>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl AgentsResponse {
    pub fn for_node(node: impl Into<String>, agents: Vec<AgentSnapshot>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(node.into(), agents);
        Self {
            nodes,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeersResponse {
    pub local: String,
    pub peers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub filename: String,
    pub forms: Vec<String>,
    pub content: String,
    #[serde(default)]
    pub classification: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub internal_id: String,
}
