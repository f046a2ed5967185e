//! `agents` command: list the processing agents of a node or the whole cluster.

use super::client::get_json;
use super::error::CommandError;
use super::node::NodeAddr;
use super::types::{AggregateResponse, Command};
use crate::server::protocol::{AGENTS_ENDPOINT, AgentsResponse};

use async_trait::async_trait;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentsCommand;

#[async_trait]
impl Command for AgentsCommand {
    type Response = AgentsResponse;

    fn name(&self) -> &'static str {
        "agents"
    }

    fn target_endpoint(&self) -> &'static str {
        AGENTS_ENDPOINT
    }

    async fn send_request(
        &self,
        client: &reqwest::Client,
        node: &NodeAddr,
    ) -> Result<AgentsResponse, CommandError> {
        let response: AgentsResponse =
            get_json(client, &node.endpoint(self.target_endpoint())).await?;
        Ok(response.relabel(node.host_and_port()))
    }
}

impl AgentsResponse {
    /// Files every agent listed in this response under `node`.
    ///
    /// A node labels itself with the address it was started on, which is not
    /// unique across the cluster (`0.0.0.0:8001`, `localhost:8001`). The
    /// contacted address is.
    pub fn relabel(self, node: impl Into<String>) -> Self {
        let agents = self.nodes.into_values().flatten().collect();
        let mut relabeled = AgentsResponse::for_node(node, agents);
        relabeled.errors = self.errors;
        relabeled
    }
}

impl AggregateResponse for AgentsResponse {
    fn append(&mut self, other: Self) {
        for (node, agents) in other.nodes {
            self.nodes.entry(node).or_default().extend(agents);
        }
        self.errors.extend(other.errors);
    }

    fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (node, agents) in &self.nodes {
            let _ = writeln!(out, "{}", node);
            for agent in agents {
                let _ = writeln!(out, "  {}", agent);
            }
        }
        out
    }
}
