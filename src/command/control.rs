//! Control commands: pause, unpause and shut down nodes.
//!
//! Each node only acts on itself. Cluster-wide control goes through the
//! same fan-out as any other command.

use super::client::post_text;
use super::error::CommandError;
use super::node::NodeAddr;
use super::types::{AggregateResponse, Command};
use crate::server::protocol::{PAUSE_ENDPOINT, SHUTDOWN_ENDPOINT, UNPAUSE_ENDPOINT};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Pause,
    Unpause,
    Shutdown,
}

impl ControlAction {
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Unpause => "unpause",
            ControlAction::Shutdown => "shutdown",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            ControlAction::Pause => PAUSE_ENDPOINT,
            ControlAction::Unpause => UNPAUSE_ENDPOINT,
            ControlAction::Shutdown => SHUTDOWN_ENDPOINT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControlCommand {
    action: ControlAction,
}

impl ControlCommand {
    pub fn new(action: ControlAction) -> Self {
        Self { action }
    }

    pub fn pause() -> Self {
        Self::new(ControlAction::Pause)
    }

    pub fn unpause() -> Self {
        Self::new(ControlAction::Unpause)
    }

    pub fn shutdown() -> Self {
        Self::new(ControlAction::Shutdown)
    }

    pub fn action(&self) -> ControlAction {
        self.action
    }
}

/// Acknowledgement text per node `host:port`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlResponse {
    pub outcomes: BTreeMap<String, String>,
    pub errors: Vec<String>,
}

#[async_trait]
impl Command for ControlCommand {
    type Response = ControlResponse;

    fn name(&self) -> &'static str {
        self.action.name()
    }

    fn target_endpoint(&self) -> &'static str {
        self.action.endpoint()
    }

    async fn send_request(
        &self,
        client: &reqwest::Client,
        node: &NodeAddr,
    ) -> Result<ControlResponse, CommandError> {
        let body = post_text(client, &node.endpoint(self.target_endpoint())).await?;

        let mut outcomes = BTreeMap::new();
        outcomes.insert(node.host_and_port(), body);
        Ok(ControlResponse {
            outcomes,
            errors: Vec::new(),
        })
    }
}

impl AggregateResponse for ControlResponse {
    fn append(&mut self, other: Self) {
        for (node, outcome) in other.outcomes {
            match self.outcomes.get_mut(&node) {
                Some(existing) => {
                    existing.push_str("; ");
                    existing.push_str(&outcome);
                }
                None => {
                    self.outcomes.insert(node, outcome);
                }
            }
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
        for (node, outcome) in &self.outcomes {
            let _ = writeln!(out, "{}: {}", node, outcome);
        }
        out
    }
}
